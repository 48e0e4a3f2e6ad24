//! Typed payloads of meta messages, and their encoding as `(type byte, data)` pairs.

use crate::{
    message::MidiMessage,
    prelude::*,
    primitive::{check_range, SmpteTime},
};
use std::str::FromStr;

/// A key signature: a count of sharps (positive) or flats (negative) plus a mode.
///
/// Only the 30 standard keys are representable, from `Cb` (7 flats) to `C#` (7 sharps) in major
/// mode and `Abm` to `A#m` in minor mode.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash, Default)]
pub struct Key {
    sharps: i8,
    minor: bool,
}

const MAJOR_KEYS: [&str; 15] = [
    "Cb", "Gb", "Db", "Ab", "Eb", "Bb", "F", "C", "G", "D", "A", "E", "B", "F#", "C#",
];
const MINOR_KEYS: [&str; 15] = [
    "Abm", "Ebm", "Bbm", "Fm", "Cm", "Gm", "Dm", "Am", "Em", "Bm", "F#m", "C#m", "G#m", "D#m",
    "A#m",
];

impl Key {
    /// C major, no sharps or flats.
    pub const C: Key = Key {
        sharps: 0,
        minor: false,
    };

    /// Create a key from its sharp count (negative for flats) and mode.
    ///
    /// Returns `None` if `sharps` is outside `-7..=7`.
    #[inline]
    pub fn new(sharps: i8, minor: bool) -> Option<Key> {
        if (-7..=7).contains(&sharps) {
            Some(Key { sharps, minor })
        } else {
            None
        }
    }

    /// The number of sharps in the key, or minus the number of flats.
    #[inline]
    pub fn sharps(&self) -> i8 {
        self.sharps
    }

    #[inline]
    pub fn is_minor(&self) -> bool {
        self.minor
    }

    /// The standard name of this key, such as `"F#"` or `"Bbm"`.
    pub fn as_str(&self) -> &'static str {
        let table = if self.minor { &MINOR_KEYS } else { &MAJOR_KEYS };
        table[(self.sharps + 7) as usize]
    }

    fn decode(data: &[u8]) -> Option<Key> {
        match *data {
            [sf, mi @ (0 | 1)] => Key::new(sf as i8, mi == 1),
            _ => None,
        }
    }

    fn encode(&self) -> [u8; 2] {
        [self.sharps as u8, self.minor as u8]
    }
}
impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
impl FromStr for Key {
    type Err = Error;
    fn from_str(s: &str) -> Result<Key> {
        let find = |table: &[&str; 15]| table.iter().position(|&name| name == s);
        if let Some(idx) = find(&MAJOR_KEYS) {
            Ok(Key {
                sharps: idx as i8 - 7,
                minor: false,
            })
        } else if let Some(idx) = find(&MINOR_KEYS) {
            Ok(Key {
                sharps: idx as i8 - 7,
                minor: true,
            })
        } else {
            Err(Error::InvalidValue {
                field: "key",
                reason: "unknown key signature",
            })
        }
    }
}

/// The payload of a `time_signature` meta message.
///
/// The denominator is always a power of two between 1 and 128, since it is stored as an exponent
/// on the wire.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub struct TimeSignature {
    numerator: u8,
    denominator_log2: u8,
    clocks_per_click: u8,
    notated_32nd_notes_per_beat: u8,
}
impl Default for TimeSignature {
    fn default() -> TimeSignature {
        TimeSignature {
            numerator: 4,
            denominator_log2: 2,
            clocks_per_click: 24,
            notated_32nd_notes_per_beat: 8,
        }
    }
}
impl TimeSignature {
    pub fn new(
        numerator: u8,
        denominator: u8,
        clocks_per_click: u8,
        notated_32nd_notes_per_beat: u8,
    ) -> Result<TimeSignature> {
        ensure!(
            denominator.is_power_of_two(),
            Error::InvalidValue {
                field: "denominator",
                reason: "must be a power of two",
            }
        );
        Ok(TimeSignature {
            numerator,
            denominator_log2: denominator.trailing_zeros() as u8,
            clocks_per_click,
            notated_32nd_notes_per_beat,
        })
    }

    #[inline]
    pub fn numerator(&self) -> u8 {
        self.numerator
    }

    #[inline]
    pub fn denominator(&self) -> u8 {
        1 << self.denominator_log2
    }

    #[inline]
    pub fn clocks_per_click(&self) -> u8 {
        self.clocks_per_click
    }

    #[inline]
    pub fn notated_32nd_notes_per_beat(&self) -> u8 {
        self.notated_32nd_notes_per_beat
    }

    /// Replace the denominator, which must be a power of two.
    ///
    /// Under the `Clip` policy the value is clamped into `1..=128` and rounded down to a power
    /// of two.
    pub(crate) fn set_denominator(&mut self, value: i64, policy: Policy) -> Result<()> {
        let value = check_range("denominator", value, 1, 128, policy)? as u8;
        if !value.is_power_of_two() {
            ensure!(
                policy == Policy::Clip,
                Error::InvalidValue {
                    field: "denominator",
                    reason: "must be a power of two",
                }
            );
        }
        self.denominator_log2 = (u8::BITS - 1 - value.leading_zeros()) as u8;
        Ok(())
    }

    pub(crate) fn set_numerator(&mut self, value: u8) {
        self.numerator = value;
    }

    pub(crate) fn set_clocks_per_click(&mut self, value: u8) {
        self.clocks_per_click = value;
    }

    pub(crate) fn set_notated_32nd_notes_per_beat(&mut self, value: u8) {
        self.notated_32nd_notes_per_beat = value;
    }

    fn decode(data: &[u8]) -> Option<TimeSignature> {
        match *data {
            [numerator, denominator_log2 @ 0..=7, clocks_per_click, notated_32nd_notes_per_beat] => {
                Some(TimeSignature {
                    numerator,
                    denominator_log2,
                    clocks_per_click,
                    notated_32nd_notes_per_beat,
                })
            }
            _ => None,
        }
    }

    fn encode(&self) -> [u8; 4] {
        [
            self.numerator,
            self.denominator_log2,
            self.clocks_per_click,
            self.notated_32nd_notes_per_beat,
        ]
    }
}

/// Decodes a meta message from its type byte and payload.
///
/// Payloads that do not have the exact shape expected for their type are kept verbatim as
/// `UnknownMeta`, so that re-encoding always reproduces the original bytes.
pub(crate) fn decode(type_byte: u8, data: &[u8]) -> MidiMessage {
    use self::MidiMessage as M;
    let text = || data.to_vec();
    let decoded = match (type_byte, data) {
        (0x00, &[hi, lo]) => Some(M::SequenceNumber {
            number: u16::from_be_bytes([hi, lo]),
        }),
        (0x01, _) => Some(M::Text { text: text() }),
        (0x02, _) => Some(M::Copyright { text: text() }),
        (0x03, _) => Some(M::TrackName { name: text() }),
        (0x04, _) => Some(M::InstrumentName { name: text() }),
        (0x05, _) => Some(M::Lyrics { text: text() }),
        (0x06, _) => Some(M::Marker { text: text() }),
        (0x07, _) => Some(M::CueMarker { text: text() }),
        (0x09, _) => Some(M::DeviceName { name: text() }),
        (0x20, &[channel]) => u4::try_from(channel).map(|channel| M::ChannelPrefix { channel }),
        (0x21, &[port]) => Some(M::MidiPort { port }),
        (0x2F, &[]) => Some(M::EndOfTrack),
        (0x51, &[a, b, c]) => Some(M::SetTempo {
            tempo: u24::from_int_lossy(u32::from_be_bytes([0, a, b, c])),
        }),
        (0x54, _) => SmpteTime::decode(data).map(|time| M::SmpteOffset { time }),
        (0x58, _) => TimeSignature::decode(data).map(|signature| M::TimeSignature { signature }),
        (0x59, _) => Key::decode(data).map(|key| M::KeySignature { key }),
        (0x7F, _) => Some(M::SequencerSpecific { data: text() }),
        _ => None,
    };
    decoded.unwrap_or_else(|| M::UnknownMeta {
        type_byte,
        data: data.to_vec(),
    })
}

/// Encodes a meta message as its type byte and payload, or `None` if it is not a meta message.
pub(crate) fn encode(msg: &MidiMessage) -> Option<(u8, Vec<u8>)> {
    use self::MidiMessage as M;
    Some(match msg {
        M::SequenceNumber { number } => (0x00, number.to_be_bytes().to_vec()),
        M::Text { text } => (0x01, text.clone()),
        M::Copyright { text } => (0x02, text.clone()),
        M::TrackName { name } => (0x03, name.clone()),
        M::InstrumentName { name } => (0x04, name.clone()),
        M::Lyrics { text } => (0x05, text.clone()),
        M::Marker { text } => (0x06, text.clone()),
        M::CueMarker { text } => (0x07, text.clone()),
        M::DeviceName { name } => (0x09, name.clone()),
        M::ChannelPrefix { channel } => (0x20, vec![channel.as_int()]),
        M::MidiPort { port } => (0x21, vec![*port]),
        M::EndOfTrack => (0x2F, Vec::new()),
        M::SetTempo { tempo } => (0x51, tempo.as_int().to_be_bytes()[1..].to_vec()),
        M::SmpteOffset { time } => (0x54, time.encode().to_vec()),
        M::TimeSignature { signature } => (0x58, signature.encode().to_vec()),
        M::KeySignature { key } => (0x59, key.encode().to_vec()),
        M::SequencerSpecific { data } => (0x7F, data.clone()),
        M::UnknownMeta { type_byte, data } => (*type_byte, data.clone()),
        _ => return None,
    })
}
