//! Incremental parsing of raw, undelimited MIDI byte streams, presumably from a cable.
//!
//! Handles all of the quirks specific to MIDI streams:
//!
//! - Running status: data bytes without a preceding status byte reuse the last channel status.
//! - System realtime bytes (`0xF8..=0xFF`) may appear anywhere, even in the middle of another
//!   message, and are emitted immediately without disturbing the interrupted message.
//! - An unterminated sysex is dropped when any other non-realtime status byte arrives.
//!
//! The parser never fails: malformed input either degrades to `unknown` messages or is
//! discarded.

use crate::{
    message::{data_len, is_channel_status, Message, MidiMessage},
    prelude::*,
};
use tracing::{trace, warn};

/// Tunables for a [`Parser`](struct.Parser.html).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ParserConfig {
    /// The largest sysex payload that will be buffered.
    /// Longer sysex messages are dropped entirely.
    pub max_sysex_len: usize,
}
impl Default for ParserConfig {
    fn default() -> ParserConfig {
        ParserConfig {
            max_sysex_len: 256 * 1024,
        }
    }
}
impl ParserConfig {
    pub fn with_max_sysex_len(mut self, max_sysex_len: usize) -> ParserConfig {
        self.max_sysex_len = max_sysex_len;
        self
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum State {
    /// Expecting a status byte, or a data byte that continues the running status.
    AwaitingStatus,
    /// Collecting the fixed amount of data bytes for the status at the start of the buffer.
    Accumulating { len: usize },
    /// Collecting sysex bytes until `0xF7`.
    InSysex,
    /// Skipping the rest of a sysex that grew beyond the configured limit.
    Overflowed,
}

/// A streaming MIDI parser, taking raw bytes and producing a FIFO of decoded messages.
///
/// Feeding bytes in many small slices is equivalent to feeding them in one large slice, and
/// feeding the same bytes into a fresh parser always produces the same messages.
///
/// All messages produced have a time of 0.
#[derive(Clone, Debug)]
pub struct Parser {
    config: ParserConfig,
    state: State,
    buf: Vec<u8>,
    running_status: Option<u8>,
    queue: VecDeque<Message>,
}
impl Default for Parser {
    fn default() -> Parser {
        Parser::new()
    }
}
impl Parser {
    /// Create a fresh parser with the default configuration.
    #[inline]
    pub fn new() -> Parser {
        Parser::with_config(ParserConfig::default())
    }

    #[inline]
    pub fn with_config(config: ParserConfig) -> Parser {
        Parser {
            config,
            state: State::AwaitingStatus,
            buf: Vec::with_capacity(3),
            running_status: None,
            queue: VecDeque::new(),
        }
    }

    fn emit(&mut self, msg: MidiMessage) {
        trace!(kind = %msg.kind(), "decoded midi message");
        self.queue.push_back(Message::from_midi(msg));
    }

    /// Decode the buffered message and reset the buffer.
    fn finish(&mut self) {
        let msg = MidiMessage::decode(&self.buf);
        self.buf.clear();
        self.state = State::AwaitingStatus;
        self.emit(msg);
    }

    /// Start accumulating a message with the given status.
    fn begin(&mut self, status: u8, len: usize) {
        self.buf.clear();
        self.buf.push(status);
        if len == 0 {
            self.finish();
        } else {
            self.state = State::Accumulating { len };
        }
    }

    /// Feed a single byte into the parser.
    pub fn feed_byte(&mut self, byte: u8) {
        match byte {
            0xF8..=0xFF => {
                // System Realtime
                // These are invisible to other messages: they neither alter running status nor
                // disturb the message being accumulated.
                self.emit(MidiMessage::decode(&[byte]));
            }
            0xF7 => match self.state {
                State::InSysex => {
                    self.buf.push(byte);
                    self.finish();
                }
                State::Overflowed => self.state = State::AwaitingStatus,
                _ => trace!("discarding stray end of sysex"),
            },
            0x80..=0xF6 => {
                match self.state {
                    State::InSysex | State::Overflowed => {
                        trace!("dropping sysex interrupted by status {:#04X}", byte);
                        self.buf.clear();
                        self.state = State::AwaitingStatus;
                    }
                    State::Accumulating { .. } if data_len(byte) == Some(0) => {
                        // Single-byte system common: emit in place, leaving the accumulation
                        // intact.
                        self.emit(MidiMessage::decode(&[byte]));
                        return;
                    }
                    State::Accumulating { .. } => {
                        trace!("dropping incomplete message interrupted by {:#04X}", byte);
                    }
                    State::AwaitingStatus => {}
                }
                if is_channel_status(byte) {
                    self.running_status = Some(byte);
                }
                match data_len(byte) {
                    Some(len) => self.begin(byte, len),
                    None => {
                        // 0xF0
                        self.buf.clear();
                        self.buf.push(byte);
                        self.state = State::InSysex;
                    }
                }
            }
            0x00..=0x7F => match self.state {
                State::Accumulating { len } => {
                    self.buf.push(byte);
                    if self.buf.len() > len {
                        self.finish();
                    }
                }
                State::InSysex => {
                    if self.buf.len() > self.config.max_sysex_len {
                        warn!(
                            limit = self.config.max_sysex_len,
                            "dropping oversized sysex message"
                        );
                        self.buf.clear();
                        self.state = State::Overflowed;
                    } else {
                        self.buf.push(byte);
                    }
                }
                State::Overflowed => {}
                State::AwaitingStatus => match self.running_status {
                    Some(status) => {
                        let len = data_len(status).unwrap_or(0);
                        self.begin(status, len);
                        self.feed_byte(byte);
                    }
                    None => trace!("discarding data byte without status"),
                },
            },
        }
    }

    /// Feed a slice of bytes into the parser.
    ///
    /// Some calls to `feed` might produce no messages, and others may produce as many as the
    /// amount of bytes fed in.
    pub fn feed(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.feed_byte(byte);
        }
    }

    /// The number of fully decoded messages waiting to be pulled.
    #[inline]
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Remove and return the oldest decoded message, if any.
    #[inline]
    pub fn pull(&mut self) -> Option<Message> {
        self.queue.pop_front()
    }

    /// Remove every decoded message, oldest first.
    ///
    /// Partially accumulated input and running status are kept.
    pub fn drain(&mut self) -> impl Iterator<Item = Message> + '_ {
        self.queue.drain(..)
    }

    /// Forget all partial input, running status and pending messages.
    pub fn reset(&mut self) {
        self.state = State::AwaitingStatus;
        self.buf.clear();
        self.running_status = None;
        self.queue.clear();
    }
}

/// Parse the first complete message out of `bytes`, if any.
pub fn parse(bytes: &[u8]) -> Option<Message> {
    let mut parser = Parser::new();
    parser.feed(bytes);
    parser.pull()
}

/// Parse every complete message out of `bytes`, in order.
pub fn parse_all(bytes: &[u8]) -> Vec<Message> {
    let mut parser = Parser::new();
    parser.feed(bytes);
    parser.drain().collect()
}
