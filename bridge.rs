//! Streaming bridge: frames the byte transport into Wishbone transactions.
//!
//! The transport is always-acknowledge in both directions: a byte offered
//! on `rx` is consumed in the same tick, and a byte returned from `tick` is
//! accepted by the transport in the same tick. Malformed input carries no
//! error signal; anything that is not a command byte is ignored in place,
//! and a frame that stalls for longer than the configured timeout is
//! silently dropped so the next command byte starts clean.

use crate::bridge_proto::{CMD_READ, CMD_WRITE};

/// Wishbone master request lines, driven by the bridge. `cyc`/`stb` are
/// held until the slave acknowledges.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Wishbone {
    pub adr: u32,
    pub dat_w: u32,
    pub we: bool,
    pub cyc: bool,
    pub stb: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct BridgeConfig {
    /// Ticks without transport or bus activity before a partial frame is
    /// discarded.
    pub timeout: u32,
}

impl BridgeConfig {
    pub fn new(clk_freq: u32) -> BridgeConfig {
        // 100 ms, enough for the slowest plausible host pacing
        BridgeConfig { timeout: clk_freq / 10 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    RecvLength,
    RecvAddress,
    RecvData,
    WriteData,
    ReadData,
    SendData,
}

#[derive(Debug)]
pub struct Bridge {
    config: BridgeConfig,
    state: State,
    write: bool,
    count: u8,
    address: u32,
    shift: u32,
    bytes: u8,
    idle_time: u32,
    pub wishbone: Wishbone,
}

impl Bridge {
    pub fn new(config: BridgeConfig) -> Bridge {
        Bridge {
            config: config,
            state: State::Idle,
            write: false,
            count: 0,
            address: 0,
            shift: 0,
            bytes: 0,
            idle_time: 0,
            wishbone: Wishbone::default(),
        }
    }

    /// True while a frame is in flight.
    pub fn busy(&self) -> bool {
        self.state != State::Idle
    }

    fn resync(&mut self) {
        self.state = State::Idle;
        self.wishbone = Wishbone::default();
        self.idle_time = 0;
    }

    fn start_bus(&mut self, we: bool) {
        self.wishbone.adr = self.address;
        self.wishbone.dat_w = self.shift;
        self.wishbone.we = we;
        self.wishbone.cyc = true;
        self.wishbone.stb = true;
    }

    // next word of the burst, or frame complete
    fn word_done(&mut self) -> State {
        self.wishbone = Wishbone::default();
        self.count -= 1;
        self.address = self.address.wrapping_add(1);
        if self.count == 0 {
            State::Idle
        } else if self.write {
            self.bytes = 4;
            self.shift = 0;
            State::RecvData
        } else {
            self.start_bus(false);
            State::ReadData
        }
    }

    /// Advance one tick. `rx` is the transport byte offered this tick,
    /// `ack`/`dat_r` are the Wishbone slave lines; the return value is the
    /// byte driven back onto the transport, if any.
    pub fn tick(&mut self, rx: Option<u8>, ack: bool, dat_r: u32) -> Option<u8> {
        let mut tx = None;

        let state = self.state;
        self.state = match state {
            State::Idle => match rx {
                Some(CMD_WRITE) => {
                    self.write = true;
                    State::RecvLength
                }
                Some(CMD_READ) => {
                    self.write = false;
                    State::RecvLength
                }
                _ => State::Idle,
            },
            State::RecvLength => match rx {
                Some(byte) => {
                    self.count = byte;
                    self.shift = 0;
                    self.bytes = 4;
                    State::RecvAddress
                }
                None => State::RecvLength,
            },
            State::RecvAddress => match rx {
                Some(byte) => {
                    self.shift = self.shift << 8 | byte as u32;
                    self.bytes -= 1;
                    if self.bytes > 0 {
                        State::RecvAddress
                    } else {
                        self.address = self.shift;
                        if self.count == 0 {
                            State::Idle
                        } else if self.write {
                            self.shift = 0;
                            self.bytes = 4;
                            State::RecvData
                        } else {
                            self.start_bus(false);
                            State::ReadData
                        }
                    }
                }
                None => State::RecvAddress,
            },
            State::RecvData => match rx {
                Some(byte) => {
                    self.shift = self.shift << 8 | byte as u32;
                    self.bytes -= 1;
                    if self.bytes > 0 {
                        State::RecvData
                    } else {
                        self.start_bus(true);
                        State::WriteData
                    }
                }
                None => State::RecvData,
            },
            State::WriteData => {
                if ack {
                    self.word_done()
                } else {
                    State::WriteData
                }
            }
            State::ReadData => {
                if ack {
                    self.wishbone = Wishbone::default();
                    self.shift = dat_r;
                    self.bytes = 4;
                    State::SendData
                } else {
                    State::ReadData
                }
            }
            State::SendData => {
                tx = Some((self.shift >> 24) as u8);
                self.shift <<= 8;
                self.bytes -= 1;
                if self.bytes > 0 {
                    State::SendData
                } else {
                    self.word_done()
                }
            }
        };

        // inactivity watchdog on partial frames
        if self.state == State::Idle {
            self.idle_time = 0;
        } else if rx.is_some() || ack || tx.is_some() {
            self.idle_time = 0;
        } else {
            self.idle_time += 1;
            if self.idle_time >= self.config.timeout {
                debug!("partial frame stalled, resynchronizing");
                self.resync();
            }
        }

        tx
    }
}
