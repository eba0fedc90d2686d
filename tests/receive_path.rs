//! Full receive-path test against a behavioral transceiver model.
//!
//! The model implements the status-line handshake of the bring-up sequence
//! and a serializer with a programmable initial bit offset that honors
//! bit-slip pulses, so the whole chain is exercised: reset sequencing,
//! comma search, lane decoding, payload recovery, loss and recovery.

use std::collections::VecDeque;

use rxlink::aligner::AlignerConfig;
use rxlink::line_coding::{Encoder, Token, K28_5, K28_5_NEG};
use rxlink::sequencer::{SequencerConfig, TransceiverControl, TransceiverStatus};
use rxlink::{Bridge, BridgeConfig, Receiver};

const PLL_DELAY: u32 = 5;
const RESET_DONE_DELAY: u32 = 3;
const DELAY_RESET_DELAY: u32 = 4;
const PHASE_ALIGN_DELAY: u32 = 6;

struct TransceiverModel {
    status: TransceiverStatus,
    in_reset: bool,
    reset_held: u32,
    ready_held: u32,
    delay_count: Option<u32>,
    phase_count: u32,
    // one encoder per symbol lane, as in the transmit datapath
    encoders: [Encoder; 2],
    tx_queue: VecDeque<(u8, bool)>,
    bits: VecDeque<bool>,
    pending_slips: u32,
    // when set, the serializer output is replaced with silence
    corrupt: bool,
}

impl TransceiverModel {
    fn new(offset: u32) -> TransceiverModel {
        let mut model = TransceiverModel {
            status: TransceiverStatus::default(),
            in_reset: true,
            reset_held: 0,
            ready_held: 0,
            delay_count: None,
            phase_count: 0,
            encoders: [Encoder::new(), Encoder::new()],
            tx_queue: VecDeque::new(),
            bits: VecDeque::new(),
            pending_slips: offset,
            corrupt: false,
        };
        model.refill();
        model
    }

    fn refill(&mut self) {
        while self.bits.len() < 64 {
            for lane in 0..2 {
                let (data, k) = self.tx_queue.pop_front().unwrap_or((K28_5, true));
                let symbol = self.encoders[lane].encode(data, k).unwrap();
                for bit in 0..10 {
                    self.bits.push_back(symbol >> bit & 1 != 0);
                }
            }
        }
    }

    fn send(&mut self, data: u8) {
        self.tx_queue.push_back((data, false));
    }

    fn sys_tick(&mut self, control: &TransceiverControl) {
        if control.reset {
            if !self.in_reset {
                self.in_reset = true;
                self.reset_held = 0;
                self.ready_held = 0;
                self.delay_count = None;
                self.phase_count = 0;
                self.status = TransceiverStatus::default();
            }
            self.reset_held += 1;
            if self.reset_held >= PLL_DELAY {
                self.status.pll_locked = true;
            }
            return;
        }
        self.in_reset = false;

        if control.user_ready && self.status.pll_locked {
            self.ready_held += 1;
            if self.ready_held >= RESET_DONE_DELAY {
                self.status.reset_done = true;
            }
        }
        if control.delay_reset && self.status.reset_done {
            self.delay_count = Some(0);
            self.status.delay_reset_done = false;
            self.status.phase_align_done = false;
            self.phase_count = 0;
        }
        if let Some(count) = self.delay_count {
            if count >= DELAY_RESET_DELAY {
                self.status.delay_reset_done = true;
            } else {
                self.delay_count = Some(count + 1);
            }
        }
        if self.status.delay_reset_done {
            self.phase_count += 1;
            if self.phase_count >= PHASE_ALIGN_DELAY {
                self.status.phase_align_done = true;
            }
        }
    }

    fn bit_slip(&mut self) {
        self.pending_slips += 1;
    }

    fn rx_word(&mut self) -> u32 {
        if !self.status.reset_done || self.corrupt {
            return 0;
        }
        while self.pending_slips > 0 {
            self.refill();
            self.bits.pop_front();
            self.pending_slips -= 1;
        }
        self.refill();
        let mut word = 0;
        for bit in 0..20 {
            if self.bits.pop_front().unwrap() {
                word |= 1 << bit;
            }
        }
        word
    }
}

fn receiver() -> Receiver {
    Receiver::with_configs(
        SequencerConfig { reset_hold: 2, timeout: 64, max_retries: None },
        AlignerConfig {
            comma: K28_5_NEG,
            lock_threshold: 4,
            dwell: 8,
            loss_tolerance: 32,
        },
    )
}

fn step(rec: &mut Receiver, model: &mut TransceiverModel) -> Option<[Token; 2]> {
    let status = model.status;
    let control = rec.tick_sys(&status);
    model.sys_tick(&control);
    let word = model.rx_word();
    let out = rec.tick_rx(word);
    if out.bit_slip {
        model.bit_slip();
    }
    out.tokens
}

fn run_until_locked(rec: &mut Receiver, model: &mut TransceiverModel, bound: u32) -> u32 {
    for tick in 0..bound {
        step(rec, model);
        if rec.locked() {
            return tick;
        }
    }
    panic!("no lock within {} ticks", bound);
}

#[test]
fn locks_from_every_initial_offset() {
    for offset in 0..20 {
        let mut rec = receiver();
        let mut model = TransceiverModel::new(offset);
        let ticks = run_until_locked(&mut rec, &mut model, 2000);
        assert!(rec.done(), "offset {}", offset);
        // bring-up plus at most a full sweep of the 20-bit word at
        // dwell x lock_threshold ticks per offset
        assert!(ticks < 20 * 8 * 4 + 100, "offset {} took {} ticks", offset, ticks);
    }
}

#[test]
fn idle_stream_decodes_as_commas() {
    let mut rec = receiver();
    let mut model = TransceiverModel::new(7);
    run_until_locked(&mut rec, &mut model, 2000);

    let mut pairs = Vec::new();
    for _ in 0..32 {
        pairs.extend(step(&mut rec, &mut model));
    }
    assert!(pairs.len() >= 16);
    // the lock-tick pair may catch the disparity chain mid-stream
    for tokens in pairs[1..].iter() {
        for token in tokens.iter() {
            assert!(!token.invalid);
            assert!(token.k);
            assert_eq!(token.data, K28_5);
        }
    }
}

#[test]
fn payload_survives_the_whole_path() {
    let mut rec = receiver();
    let mut model = TransceiverModel::new(13);
    run_until_locked(&mut rec, &mut model, 2000);
    for _ in 0..8 {
        step(&mut rec, &mut model);
    }

    let payload: Vec<u8> = (1..=32).collect();
    // the serializer holds a few words of encoded idles; queue everything
    // and let it drain
    for &byte in payload.iter() {
        model.send(byte);
    }

    let mut received = Vec::new();
    for _ in 0..128 {
        if let Some(tokens) = step(&mut rec, &mut model) {
            for token in tokens.iter() {
                assert!(!token.invalid);
                if !token.k {
                    received.push(token.data);
                }
            }
        }
    }
    assert_eq!(received, payload);
}

#[test]
fn loss_restarts_bring_up_and_recovers() {
    let mut rec = receiver();
    let mut model = TransceiverModel::new(3);
    run_until_locked(&mut rec, &mut model, 2000);

    model.corrupt = true;
    let mut done_dropped = false;
    for _ in 0..500 {
        step(&mut rec, &mut model);
        if !rec.done() {
            done_dropped = true;
            break;
        }
    }
    assert!(done_dropped, "loss never restarted the bring-up");
    assert!(!rec.locked());

    model.corrupt = false;
    run_until_locked(&mut rec, &mut model, 4000);
    assert!(rec.done());
}

// The demo wiring: the bridge answers reads with the last captured word,
// with the acknowledge tied back to the strobe.
#[test]
fn bridge_serves_captured_words() {
    let mut rec = receiver();
    let mut model = TransceiverModel::new(0);
    let mut bridge = Bridge::new(BridgeConfig { timeout: 256 });
    run_until_locked(&mut rec, &mut model, 2000);

    let frame = [0x02u8, 0x01, 0x00, 0x00, 0x00, 0x00];
    let mut bytes = frame.iter();
    let mut captured = 0u32;
    let mut reply = Vec::new();
    for tick in 0..256 {
        let status = model.status;
        let control = rec.tick_sys(&status);
        model.sys_tick(&control);
        let word = model.rx_word();
        let out = rec.tick_rx(word);
        if out.bit_slip {
            model.bit_slip();
        }

        let rx = if tick % 4 == 0 { bytes.next().cloned() } else { None };
        let ack = bridge.wishbone.stb;
        reply.extend(bridge.tick(rx, ack, captured));
        captured = word;
    }
    // one word, network byte order, matching a captured idle pair
    assert_eq!(reply.len(), 4);
    let word = (reply[0] as u32) << 24 | (reply[1] as u32) << 16
               | (reply[2] as u32) << 8 | reply[3] as u32;
    let lanes = [word & 0x3ff, word >> 10 & 0x3ff];
    for lane in lanes.iter() {
        assert!(*lane == K28_5_NEG as u32 || *lane == (!K28_5_NEG as u32) & 0x3ff);
    }
}
