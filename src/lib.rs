//! # Overview
//!
//! `midio` models MIDI messages as typed, validated values, decodes them out of raw byte
//! streams, converts between musical ticks and wall-clock seconds, and moves them through a
//! uniform port abstraction.
//!
//! Building and encoding a message is as simple as:
//!
//! ```rust
//! use midio::{Attr, Message, MessageType};
//!
//! let msg = Message::build(MessageType::NoteOn, &[(Attr::Note, 60), (Attr::Velocity, 64)]).unwrap();
//! assert_eq!(msg.to_bytes(), [0x90, 60, 64]);
//! assert_eq!(msg.to_string(), "note_on channel=0 note=60 velocity=64 time=0");
//! ```
//!
//! # Validation
//!
//! Every integer attribute has a range (`channel` is `0..=15`, `note` is `0..=127`, `pitch` is
//! `-8192..=8191`, and so on). Out-of-range values are rejected with an
//! [`ErrorKind::Validation`](enum.ErrorKind.html) error under the default
//! [`Policy::Strict`](enum.Policy.html), or clamped to the nearest bound under `Policy::Clip`.
//! A message that exists is always encodable.
//!
//! # Parsing raw MIDI streams
//!
//! A MIDI cable carries undelimited bytes, with running status and realtime bytes that may
//! interrupt any other message. The [`Parser`](struct.Parser.html) handles these quirks
//! incrementally:
//!
//! ```rust
//! use midio::{MessageType, Parser};
//!
//! let mut parser = Parser::new();
//! parser.feed(&[0x90, 0x3C]);
//! assert_eq!(parser.pending(), 0);
//! parser.feed(&[0xF8, 0x40, 0x3E, 0x40]);
//! let kinds: Vec<_> = parser.drain().map(|msg| msg.kind()).collect();
//! assert_eq!(kinds, [MessageType::Clock, MessageType::NoteOn, MessageType::NoteOn]);
//! ```
//!
//! # Timing
//!
//! The [`timing`](timing/index.html) module converts between ticks and seconds and merges
//! several tracks into one chronological stream.
//!
//! # Ports
//!
//! The [`ports`](ports/index.html) module describes inputs and outputs through the
//! [`Input`](ports/trait.Input.html) and [`Output`](ports/trait.Output.html) traits, with
//! in-process loopback ports, ports over byte streams, and multiplexing.
//!
//! # About features
//!
//! - The `parallel` feature
//!
//!   Enabled by default. Merging very large track sets accumulates per-track times using
//!   multiple threads, through the `rayon` dependency. Small inputs are always merged on the
//!   calling thread.

macro_rules! bail {
    ($err:expr) => {{
        return Err($err.into());
    }};
}
macro_rules! ensure {
    ($cond:expr, $err:expr) => {{
        if !$cond {
            bail!($err)
        }
    }};
}

/// All of the errors this crate produces.
#[macro_use]
mod error;

mod prelude {
    pub(crate) use crate::{
        error::{Error, Result},
        primitive::{u14, u24, u3, u4, u7, Policy},
    };
    pub(crate) use std::{collections::VecDeque, fmt, time::Duration};
}

pub mod message;
mod parser;
pub mod ports;
mod primitive;
pub mod timing;

pub use crate::{
    error::{Error, ErrorKind, Result},
    message::{
        Attr, FrozenMessage, Key, Latin1, Message, MessageClass, MessageType, MidiMessage,
        TextDecoder, TimeSignature, Utf8Lossy,
    },
    parser::{parse, parse_all, Parser, ParserConfig},
    primitive::{Fps, PitchBend, Policy, SmpteTime},
    timing::{merge_tracks, TempoMap},
};

/// Exotically-sized integers used by the MIDI standard.
pub mod num {
    pub use crate::primitive::{u14, u24, u3, u4, u7};
}

#[cfg(test)]
mod test;
