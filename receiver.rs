//! Receive-path composition.
//!
//! Ties the sequencer (system clock domain) to the aligner and the two
//! symbol-lane decoders (recovered clock domain). The only signals crossing
//! the domain boundary are the aligner's restart request and the
//! sequencer's done status, both carried through explicit synchronizers.

use crate::aligner::{Aligner, AlignerConfig, AlignerOut};
use crate::cdc::{MultiReg, PulseSynchronizer};
use crate::line_coding::{Decoder, Token};
use crate::sequencer::{Sequencer, SequencerConfig, TransceiverControl, TransceiverStatus};

/// Recovered-domain outputs of one tick: the decoded pair when the link is
/// aligned, and the bit-slip control pulse for the transceiver.
#[derive(Debug, Clone, Copy, Default)]
pub struct RxOut {
    pub tokens: Option<[Token; 2]>,
    pub bit_slip: bool,
}

#[derive(Debug)]
pub struct Receiver {
    sequencer: Sequencer,
    aligner: Aligner,
    decoders: [Decoder; 2],
    restart_sync: PulseSynchronizer, // rx -> sys
    done_sync: MultiReg<bool>,       // sys -> rx
    was_locked: bool,
}

impl Receiver {
    pub fn new(sys_clk_freq: u32, rx_clk_freq: u32) -> Receiver {
        Receiver::with_configs(SequencerConfig::new(sys_clk_freq),
                               AlignerConfig::new(rx_clk_freq))
    }

    pub fn with_configs(sequencer: SequencerConfig, aligner: AlignerConfig) -> Receiver {
        Receiver {
            sequencer: Sequencer::new(sequencer),
            aligner: Aligner::new(aligner),
            decoders: [Decoder::new(), Decoder::new()],
            restart_sync: PulseSynchronizer::new(),
            done_sync: MultiReg::new(),
            was_locked: false,
        }
    }

    pub fn done(&self) -> bool {
        self.sequencer.done()
    }

    pub fn locked(&self) -> bool {
        self.aligner.locked()
    }

    /// One system-clock tick: run the sequencer against the sampled
    /// transceiver status, folding in any synchronized restart request.
    pub fn tick_sys(&mut self, status: &TransceiverStatus) -> TransceiverControl {
        let restart = self.restart_sync.tick();
        self.sequencer.tick(status, restart)
    }

    /// One recovered-clock tick over a captured 20-bit word.
    pub fn tick_rx(&mut self, rxdata: u32) -> RxOut {
        let done = self.done_sync.tick(self.sequencer.done());
        let AlignerOut { symbols, bit_slip, restart } = self.aligner.tick(rxdata, done);
        if restart {
            self.restart_sync.trigger();
        }

        // running disparity starts fresh on every newly acquired lock
        let locked = self.aligner.locked();
        if locked && !self.was_locked {
            self.decoders[0].reset();
            self.decoders[1].reset();
        }
        self.was_locked = locked;

        let tokens = symbols.map(|lanes| {
            [self.decoders[0].decode(lanes[0]), self.decoders[1].decode(lanes[1])]
        });
        RxOut {
            tokens: tokens,
            bit_slip: bit_slip,
        }
    }
}
