//! Clock-domain crossing primitives.
//!
//! Two signals cross between the system and recovered-clock domains:
//! `restart` (rx→sys) and `done` (sys→rx). Both must be re-registered at
//! the consuming domain; these types make the double latching explicit so
//! it cannot be optimized away by refactoring.

/// Two-flop synchronizer. `tick` runs in the *consuming* clock domain.
#[derive(Debug, Clone, Copy, Default)]
pub struct MultiReg<T: Copy + Default> {
    stage0: T,
    stage1: T,
}

impl<T: Copy + Default> MultiReg<T> {
    pub fn new() -> MultiReg<T> {
        MultiReg::default()
    }

    /// Sample `input` (driven by the other domain) and return the
    /// synchronized value, two consumer ticks old.
    pub fn tick(&mut self, input: T) -> T {
        let out = self.stage1;
        self.stage1 = self.stage0;
        self.stage0 = input;
        out
    }
}

/// Carries single-tick pulses across a domain boundary: the producer
/// toggles a level, the consumer double-latches it and converts each edge
/// back into a pulse. Pulses closer together than the synchronization
/// latency merge, which is acceptable for restart requests.
#[derive(Debug, Clone, Copy, Default)]
pub struct PulseSynchronizer {
    toggle: bool,
    sync: MultiReg<bool>,
    last: bool,
}

impl PulseSynchronizer {
    pub fn new() -> PulseSynchronizer {
        PulseSynchronizer::default()
    }

    /// Producer domain: register a pulse.
    pub fn trigger(&mut self) {
        self.toggle = !self.toggle;
    }

    /// Consumer domain: returns true for one tick per registered pulse.
    pub fn tick(&mut self) -> bool {
        let level = self.sync.tick(self.toggle);
        let pulse = level != self.last;
        self.last = level;
        pulse
    }
}
