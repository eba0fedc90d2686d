//! Brute-force comma alignment.
//!
//! The transceiver delivers 20-bit words with no defined symbol boundary.
//! Once the sequencer reports done, the aligner watches the low symbol lane
//! for the comma (either polarity, the wire pair may be inverted) and slips
//! the sampling point one bit at a time until the comma sits at offset
//! zero. Each completed sweep of all offsets restarts the whole bring-up,
//! which re-seeds the recovered-clock phase; the search itself never
//! terminates on its own.

use crate::line_coding::K28_5_NEG;

/// Bit positions per captured word (two interleaved 10-bit lanes).
pub const WIRE_WIDTH: u32 = 20;

#[derive(Debug, Clone, Copy)]
pub struct AlignerConfig {
    /// Comma pattern in capture order; the complement is matched too.
    pub comma: u16,
    /// Consecutive comma hits required before declaring lock.
    pub lock_threshold: u32,
    /// Ticks to wait for a comma at one bit offset before slipping.
    pub dwell: u32,
    /// Consecutive comma-free ticks tolerated while locked.
    pub loss_tolerance: u32,
}

impl AlignerConfig {
    pub fn new(rx_clk_freq: u32) -> AlignerConfig {
        AlignerConfig {
            comma: K28_5_NEG,
            lock_threshold: 4,
            // 100 us per offset; the idle stream is solid commas during
            // bring-up, so a real boundary is found well before this.
            dwell: rx_clk_freq / 10_000,
            // 6 ms without any comma means the link is gone.
            loss_tolerance: rx_clk_freq / 1_000 * 6,
        }
    }
}

/// Combinational outputs of one aligner tick.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlignerOut {
    /// Both symbol lanes of the captured word, once locked.
    pub symbols: Option<[u16; 2]>,
    /// Pulse: advance the transceiver sampling point by one bit.
    pub bit_slip: bool,
    /// Pulse: request a full bring-up restart.
    pub restart: bool,
}

#[derive(Debug)]
pub struct Aligner {
    config: AlignerConfig,
    locked: bool,
    bit_slip_count: u32,
    matches: u32,
    dwell_count: u32,
    miss_count: u32,
}

impl Aligner {
    pub fn new(config: AlignerConfig) -> Aligner {
        Aligner {
            config: config,
            locked: false,
            bit_slip_count: 0,
            matches: 0,
            dwell_count: 0,
            miss_count: 0,
        }
    }

    pub fn locked(&self) -> bool {
        self.locked
    }

    /// Total bit-slip pulses issued since the last restart.
    pub fn bit_slip_count(&self) -> u32 {
        self.bit_slip_count
    }

    fn clear(&mut self) {
        self.locked = false;
        self.bit_slip_count = 0;
        self.matches = 0;
        self.dwell_count = 0;
        self.miss_count = 0;
    }

    /// Advance one recovered-clock tick. `done` is the synchronized
    /// sequencer status; while it is low the aligner holds in reset.
    pub fn tick(&mut self, rxdata: u32, done: bool) -> AlignerOut {
        let mut out = AlignerOut::default();

        if !done {
            self.clear();
            return out;
        }

        let window = (rxdata & 0x3ff) as u16;
        let hit = window == self.config.comma || window == !self.config.comma & 0x3ff;

        if self.locked {
            out.symbols = Some([window, (rxdata >> 10 & 0x3ff) as u16]);
            if hit {
                self.miss_count = 0;
            } else {
                self.miss_count += 1;
                if self.miss_count > self.config.loss_tolerance {
                    warn!("comma lost, restarting bring-up");
                    self.clear();
                    out.symbols = None;
                    out.restart = true;
                }
            }
            return out;
        }

        if hit {
            self.matches += 1;
            if self.matches >= self.config.lock_threshold {
                info!("comma aligned after {} bit slips", self.bit_slip_count);
                self.locked = true;
                self.dwell_count = 0;
                self.miss_count = 0;
                out.symbols = Some([window, (rxdata >> 10 & 0x3ff) as u16]);
            }
        } else {
            self.matches = 0;
        }

        if !self.locked {
            self.dwell_count += 1;
            if self.dwell_count >= self.config.dwell {
                self.dwell_count = 0;
                self.matches = 0;
                self.bit_slip_count += 1;
                out.bit_slip = true;
                if self.bit_slip_count % WIRE_WIDTH == 0 {
                    // Every offset tried: re-run the bring-up to land the
                    // clock recovery on a different phase, keep searching.
                    info!("alignment sweep exhausted, restarting bring-up");
                    out.restart = true;
                }
            }
        }

        out
    }
}
