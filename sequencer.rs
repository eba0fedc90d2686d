//! Transceiver reset/training sequencer.
//!
//! Drives the vendor bring-up order: hold reset, wait for the PLL, release
//! reset and raise user-ready, wait for reset-done, pulse the delay-aligner
//! reset, wait for it, wait for phase alignment. Any step that does not
//! complete within the configured timeout restarts the whole procedure;
//! with the default configuration this retries forever.

/// Status lines from the transceiver, sampled every system-clock tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransceiverStatus {
    pub pll_locked: bool,
    pub reset_done: bool,
    pub delay_reset_done: bool,
    pub phase_align_done: bool,
}

/// Control lines to the transceiver. `delay_reset` and `bit_slip` are
/// single-tick pulses, the rest are levels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransceiverControl {
    pub reset: bool,
    pub user_ready: bool,
    pub delay_reset: bool,
    pub bit_slip: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequencerState {
    Idle,
    ResetAsserted { held: u32 },
    WaitPll { timeout: u32 },
    WaitResetDone { timeout: u32 },
    WaitDelayReset { timeout: u32 },
    WaitPhaseAlign { timeout: u32 },
    Ready,
    Failed,
}

#[derive(Debug, Clone, Copy)]
pub struct SequencerConfig {
    /// Cycles to keep the transceiver reset asserted before waiting on the
    /// PLL (electrical settle time).
    pub reset_hold: u32,
    /// Cycles allowed in each wait state before the bring-up restarts.
    pub timeout: u32,
    /// Consecutive timed-out bring-up attempts tolerated before entering
    /// `Failed`. `None` retries forever and never surfaces a failure.
    pub max_retries: Option<u32>,
}

impl SequencerConfig {
    pub fn new(sys_clk_freq: u32) -> SequencerConfig {
        SequencerConfig {
            // 500 ns, rounded up
            reset_hold: (sys_clk_freq as u64 * 500 / 1_000_000_000) as u32 + 1,
            // 10 ms
            timeout: sys_clk_freq / 100,
            max_retries: None,
        }
    }
}

#[derive(Debug)]
pub struct Sequencer {
    config: SequencerConfig,
    state: SequencerState,
    retries: u32,
}

impl Sequencer {
    pub fn new(config: SequencerConfig) -> Sequencer {
        Sequencer {
            config: config,
            state: SequencerState::Idle,
            retries: 0,
        }
    }

    pub fn state(&self) -> SequencerState {
        self.state
    }

    /// True only while the whole bring-up sequence has completed.
    pub fn done(&self) -> bool {
        self.state == SequencerState::Ready
    }

    fn enter_reset(&mut self) {
        self.state = SequencerState::ResetAsserted { held: 0 };
    }

    fn timed_out(&mut self, waiting_for: &str) -> SequencerState {
        self.retries += 1;
        match self.config.max_retries {
            Some(max) if self.retries > max => {
                error!("bring-up gave up waiting for {} after {} attempts",
                       waiting_for, self.retries);
                SequencerState::Failed
            }
            _ => {
                warn!("timeout waiting for {}, restarting bring-up", waiting_for);
                SequencerState::ResetAsserted { held: 0 }
            }
        }
    }

    /// Advance one system-clock tick. `restart` is a synchronized one-tick
    /// pulse; asserting it while already in `ResetAsserted` has no effect.
    pub fn tick(&mut self, status: &TransceiverStatus, restart: bool) -> TransceiverControl {
        use self::SequencerState::*;

        if restart {
            match self.state {
                ResetAsserted { .. } => (),
                _ => {
                    info!("bring-up restart requested");
                    self.enter_reset();
                }
            }
        }

        let mut control = TransceiverControl::default();

        let state = self.state;
        self.state = match state {
            Idle => ResetAsserted { held: 0 },
            ResetAsserted { held } => {
                if held + 1 >= self.config.reset_hold {
                    WaitPll { timeout: self.config.timeout }
                } else {
                    ResetAsserted { held: held + 1 }
                }
            }
            WaitPll { timeout } => {
                if status.pll_locked {
                    WaitResetDone { timeout: self.config.timeout }
                } else if timeout == 0 {
                    self.timed_out("PLL lock")
                } else {
                    WaitPll { timeout: timeout - 1 }
                }
            }
            WaitResetDone { timeout } => {
                if status.reset_done {
                    control.delay_reset = true;
                    WaitDelayReset { timeout: self.config.timeout }
                } else if timeout == 0 {
                    self.timed_out("reset done")
                } else {
                    WaitResetDone { timeout: timeout - 1 }
                }
            }
            WaitDelayReset { timeout } => {
                if status.delay_reset_done {
                    WaitPhaseAlign { timeout: self.config.timeout }
                } else if timeout == 0 {
                    self.timed_out("delay-aligner reset")
                } else {
                    WaitDelayReset { timeout: timeout - 1 }
                }
            }
            WaitPhaseAlign { timeout } => {
                if status.phase_align_done {
                    info!("transceiver bring-up complete");
                    self.retries = 0;
                    Ready
                } else if timeout == 0 {
                    self.timed_out("phase alignment")
                } else {
                    WaitPhaseAlign { timeout: timeout - 1 }
                }
            }
            Ready => Ready,
            Failed => Failed,
        };

        match self.state {
            Idle | ResetAsserted { .. } | WaitPll { .. } | Failed => control.reset = true,
            WaitResetDone { .. } | WaitDelayReset { .. } | WaitPhaseAlign { .. } | Ready =>
                control.user_ready = true,
        }

        control
    }
}
