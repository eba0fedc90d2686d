#![no_std]

//! Bring-up and framing core for a multi-gigabit serial receiver.
//!
//! The transceiver itself (PLL, differential receiver, clock buffers) is
//! external; this crate only drives its control lines and consumes its
//! status lines and raw 20-bit capture. Data path: raw words → [`aligner`] →
//! two 10-bit symbol lanes → [`line_coding`] decoders → bytes. An
//! independent byte transport is framed into Wishbone transactions by
//! [`bridge`].

extern crate byteorder;
#[macro_use]
extern crate log;

#[cfg(test)]
#[macro_use]
extern crate std;

pub mod cdc;
pub mod sequencer;
pub mod aligner;
pub mod line_coding;
pub mod io;
pub mod bridge_proto;
pub mod bridge;
pub mod receiver;

pub use crate::sequencer::{Sequencer, SequencerConfig, TransceiverControl, TransceiverStatus};
pub use crate::aligner::{Aligner, AlignerConfig};
pub use crate::line_coding::{Decoder, Encoder, Token};
pub use crate::bridge::{Bridge, BridgeConfig, Wishbone};
pub use crate::receiver::Receiver;
