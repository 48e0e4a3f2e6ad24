//! The flat payload enum for every MIDI message kind, and its wire codec.

use crate::{
    message::meta::{self, Key, TimeSignature},
    prelude::*,
    primitive::{check_range, read_varlen_slice, write_varlen_slice, Fps, PitchBend, SmpteTime},
};
use std::str::FromStr;

/// The payload of a MIDI message: one variant per message kind, with typed fields.
///
/// Every field type upholds its own range invariant, so any value of this enum can be encoded.
/// Fields that are plain `u8`/`u16` accept their full range.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MidiMessage {
    /// Stop playing a note.
    NoteOff { channel: u4, note: u7, velocity: u7 },
    /// Start playing a note.
    NoteOn { channel: u4, note: u7, velocity: u7 },
    /// Change the pressure on a single note.
    PolyTouch { channel: u4, note: u7, value: u7 },
    /// Change the value of a controller.
    ControlChange { channel: u4, control: u7, value: u7 },
    /// Change the program (instrument) of a channel.
    ProgramChange { channel: u4, program: u7 },
    /// Change the pressure on a whole channel.
    Aftertouch { channel: u4, value: u7 },
    /// Bend the pitch of a whole channel.
    PitchWheel { channel: u4, pitch: PitchBend },

    /// A system exclusive message, without its `0xF0`/`0xF7` framing.
    SysEx { data: Vec<u7> },
    /// A MIDI time code quarter frame.
    QuarterFrame { frame_type: u3, frame_value: u4 },
    /// Song position pointer, in MIDI beats.
    SongPosition { pos: u14 },
    SongSelect { song: u7 },
    TuneRequest,
    Clock,
    Start,
    Continue,
    Stop,
    ActiveSensing,
    Reset,
    /// An undefined system status byte: `0xF4`, `0xF5`, `0xF9` or `0xFD`.
    ///
    /// These statuses take no data bytes, so `data` is empty for every message that passed
    /// through [`Message`](struct.Message.html) construction.
    Unknown { status: u8, data: Vec<u8> },

    SequenceNumber { number: u16 },
    Text { text: Vec<u8> },
    Copyright { text: Vec<u8> },
    TrackName { name: Vec<u8> },
    InstrumentName { name: Vec<u8> },
    Lyrics { text: Vec<u8> },
    Marker { text: Vec<u8> },
    CueMarker { text: Vec<u8> },
    DeviceName { name: Vec<u8> },
    /// The MIDI channel that subsequent meta messages in the track refer to.
    ChannelPrefix { channel: u4 },
    MidiPort { port: u8 },
    EndOfTrack,
    /// Microseconds per beat.
    SetTempo { tempo: u24 },
    SmpteOffset { time: SmpteTime },
    TimeSignature { signature: TimeSignature },
    KeySignature { key: Key },
    SequencerSpecific { data: Vec<u8> },
    /// A meta message whose type is not recognized, or whose payload is malformed for its type.
    /// Both the type byte and the data are kept verbatim.
    ///
    /// The type byte is below `0x80`, and the pair never decodes as one of the typed variants.
    UnknownMeta { type_byte: u8, data: Vec<u8> },
}

/// The number of data bytes following a status byte, or `None` for the variable-length
/// `0xF0` and the stray `0xF7`.
pub(crate) fn data_len(status: u8) -> Option<usize> {
    Some(match status {
        0x80..=0xBF | 0xE0..=0xEF | 0xF2 => 2,
        0xC0..=0xDF | 0xF1 | 0xF3 => 1,
        0xF4..=0xF6 | 0xF8..=0xFF => 0,
        _ => return None,
    })
}

/// Status bytes with no defined meaning, which decode as `Unknown`.
#[inline]
fn is_undefined_status(status: u8) -> bool {
    matches!(status, 0xF4 | 0xF5 | 0xF9 | 0xFD)
}

/// Returns `true` for status bytes of channel voice and mode messages.
#[inline]
pub(crate) fn is_channel_status(status: u8) -> bool {
    (0x80..0xF0).contains(&status)
}

impl MidiMessage {
    /// Decode exactly one complete message from `data`.
    ///
    /// Meta messages are read in their file form: `0xFF`, the type byte, a variable-length
    /// payload size and the payload. A lone `0xFF` is a system reset.
    pub fn try_decode(data: &[u8]) -> Result<MidiMessage> {
        let (&status, payload) = data
            .split_first()
            .ok_or(err_parse!("empty byte sequence"))?;
        ensure!(status >= 0x80, err_parse!("first byte is not a status byte"));
        match status {
            0xFF if !payload.is_empty() => {
                let (&type_byte, rest) = payload
                    .split_first()
                    .ok_or(err_parse!("missing meta type byte"))?;
                ensure!(type_byte < 0x80, err_parse!("meta type byte with top bit set"));
                Ok(meta::decode(type_byte, read_varlen_slice(rest)?))
            }
            0xF0 => {
                let (&end, inner) = payload
                    .split_last()
                    .ok_or(err_parse!("sysex without end byte"))?;
                ensure!(end == 0xF7, err_parse!("sysex without end byte"));
                let data = u7::slice_try_from_int(inner)
                    .ok_or(err_parse!("sysex data byte with top bit set"))?;
                Ok(MidiMessage::SysEx {
                    data: data.to_vec(),
                })
            }
            _ => {
                let len = data_len(status).ok_or(err_parse!("sysex end without start"))?;
                ensure!(
                    payload.iter().all(|&byte| byte < 0x80),
                    err_parse!("data byte with top bit set")
                );
                ensure!(
                    payload.len() == len,
                    err_parse!("wrong number of data bytes for status")
                );
                Ok(Self::from_parts(status, payload))
            }
        }
    }

    /// Decode a message, falling back to `Unknown` with the raw bytes if it is malformed.
    pub(crate) fn decode(data: &[u8]) -> MidiMessage {
        Self::try_decode(data).unwrap_or_else(|_| match data.split_first() {
            Some((&status, rest)) => MidiMessage::Unknown {
                status,
                data: rest.to_vec(),
            },
            None => MidiMessage::Unknown {
                status: 0,
                data: Vec::new(),
            },
        })
    }

    /// Check the invariants of `Unknown` and `UnknownMeta`, which their plain field types do not
    /// enforce.
    ///
    /// Every other variant is valid by construction.
    pub(crate) fn validate(&self) -> Result<()> {
        match self {
            MidiMessage::Unknown { status, data } => {
                ensure!(
                    is_undefined_status(*status),
                    Error::InvalidValue {
                        field: "status",
                        reason: "must be one of 0xF4, 0xF5, 0xF9 or 0xFD",
                    }
                );
                ensure!(
                    data.is_empty(),
                    Error::InvalidValue {
                        field: "data",
                        reason: "undefined status bytes carry no data",
                    }
                );
            }
            MidiMessage::UnknownMeta { type_byte, data } => {
                ensure!(
                    *type_byte < 0x80,
                    Error::InvalidValue {
                        field: "type_byte",
                        reason: "meta type bytes are 7-bit",
                    }
                );
                ensure!(
                    matches!(meta::decode(*type_byte, data), MidiMessage::UnknownMeta { .. }),
                    Error::InvalidValue {
                        field: "type_byte",
                        reason: "type and data decode as a recognized meta message",
                    }
                );
            }
            _ => {}
        }
        Ok(())
    }

    /// Builds a non-sysex, non-meta message. `payload` must hold exactly `data_len(status)` data
    /// bytes.
    fn from_parts(status: u8, payload: &[u8]) -> MidiMessage {
        use self::MidiMessage as M;
        let channel = u4::from_int_lossy(status);
        let byte = |i: usize| u7::from_int_lossy(payload.get(i).copied().unwrap_or(0));
        let wide = || u14::join(byte(0).as_int(), byte(1).as_int());
        match status >> 4 {
            0x8 => M::NoteOff {
                channel,
                note: byte(0),
                velocity: byte(1),
            },
            0x9 => M::NoteOn {
                channel,
                note: byte(0),
                velocity: byte(1),
            },
            0xA => M::PolyTouch {
                channel,
                note: byte(0),
                value: byte(1),
            },
            0xB => M::ControlChange {
                channel,
                control: byte(0),
                value: byte(1),
            },
            0xC => M::ProgramChange {
                channel,
                program: byte(0),
            },
            0xD => M::Aftertouch {
                channel,
                value: byte(0),
            },
            0xE => M::PitchWheel {
                channel,
                pitch: PitchBend::from_u14(wide()),
            },
            _ => match status {
                0xF1 => M::QuarterFrame {
                    frame_type: u3::from_int_lossy(byte(0).as_int() >> 4),
                    frame_value: u4::from_int_lossy(byte(0).as_int()),
                },
                0xF2 => M::SongPosition { pos: wide() },
                0xF3 => M::SongSelect { song: byte(0) },
                0xF6 => M::TuneRequest,
                0xF8 => M::Clock,
                0xFA => M::Start,
                0xFB => M::Continue,
                0xFC => M::Stop,
                0xFE => M::ActiveSensing,
                0xFF => M::Reset,
                _ => M::Unknown {
                    status,
                    data: payload.to_vec(),
                },
            },
        }
    }

    /// Append the wire encoding of this message to `out`.
    pub fn encode(&self, out: &mut Vec<u8>) {
        use self::MidiMessage as M;
        let status = |family: u8, channel: &u4| family | channel.as_int();
        match self {
            M::NoteOff {
                channel,
                note,
                velocity,
            } => out.extend_from_slice(&[status(0x80, channel), note.as_int(), velocity.as_int()]),
            M::NoteOn {
                channel,
                note,
                velocity,
            } => out.extend_from_slice(&[status(0x90, channel), note.as_int(), velocity.as_int()]),
            M::PolyTouch {
                channel,
                note,
                value,
            } => out.extend_from_slice(&[status(0xA0, channel), note.as_int(), value.as_int()]),
            M::ControlChange {
                channel,
                control,
                value,
            } => out.extend_from_slice(&[status(0xB0, channel), control.as_int(), value.as_int()]),
            M::ProgramChange { channel, program } => {
                out.extend_from_slice(&[status(0xC0, channel), program.as_int()])
            }
            M::Aftertouch { channel, value } => {
                out.extend_from_slice(&[status(0xD0, channel), value.as_int()])
            }
            M::PitchWheel { channel, pitch } => {
                let [lsb, msb] = u14::from_int_lossy(pitch.as_u16()).split();
                out.extend_from_slice(&[status(0xE0, channel), lsb, msb]);
            }
            M::SysEx { data } => {
                out.push(0xF0);
                out.extend_from_slice(u7::slice_as_int(data));
                out.push(0xF7);
            }
            M::QuarterFrame {
                frame_type,
                frame_value,
            } => out.extend_from_slice(&[0xF1, frame_type.as_int() << 4 | frame_value.as_int()]),
            M::SongPosition { pos } => {
                let [lsb, msb] = pos.split();
                out.extend_from_slice(&[0xF2, lsb, msb]);
            }
            M::SongSelect { song } => out.extend_from_slice(&[0xF3, song.as_int()]),
            M::TuneRequest => out.push(0xF6),
            M::Clock => out.push(0xF8),
            M::Start => out.push(0xFA),
            M::Continue => out.push(0xFB),
            M::Stop => out.push(0xFC),
            M::ActiveSensing => out.push(0xFE),
            M::Reset => out.push(0xFF),
            M::Unknown { status, data } => {
                out.push(*status);
                out.extend_from_slice(data);
            }
            meta_msg => {
                if let Some((type_byte, body)) = meta::encode(meta_msg) {
                    out.extend_from_slice(&[0xFF, type_byte]);
                    write_varlen_slice(&body, out);
                }
            }
        }
    }

    /// The fieldless kind of this message.
    pub fn kind(&self) -> MessageType {
        use self::{MessageType as T, MidiMessage as M};
        match self {
            M::NoteOff { .. } => T::NoteOff,
            M::NoteOn { .. } => T::NoteOn,
            M::PolyTouch { .. } => T::PolyTouch,
            M::ControlChange { .. } => T::ControlChange,
            M::ProgramChange { .. } => T::ProgramChange,
            M::Aftertouch { .. } => T::Aftertouch,
            M::PitchWheel { .. } => T::PitchWheel,
            M::SysEx { .. } => T::SysEx,
            M::QuarterFrame { .. } => T::QuarterFrame,
            M::SongPosition { .. } => T::SongPosition,
            M::SongSelect { .. } => T::SongSelect,
            M::TuneRequest => T::TuneRequest,
            M::Clock => T::Clock,
            M::Start => T::Start,
            M::Continue => T::Continue,
            M::Stop => T::Stop,
            M::ActiveSensing => T::ActiveSensing,
            M::Reset => T::Reset,
            M::Unknown { .. } => T::Unknown,
            M::SequenceNumber { .. } => T::SequenceNumber,
            M::Text { .. } => T::Text,
            M::Copyright { .. } => T::Copyright,
            M::TrackName { .. } => T::TrackName,
            M::InstrumentName { .. } => T::InstrumentName,
            M::Lyrics { .. } => T::Lyrics,
            M::Marker { .. } => T::Marker,
            M::CueMarker { .. } => T::CueMarker,
            M::DeviceName { .. } => T::DeviceName,
            M::ChannelPrefix { .. } => T::ChannelPrefix,
            M::MidiPort { .. } => T::MidiPort,
            M::EndOfTrack => T::EndOfTrack,
            M::SetTempo { .. } => T::SetTempo,
            M::SmpteOffset { .. } => T::SmpteOffset,
            M::TimeSignature { .. } => T::TimeSignature,
            M::KeySignature { .. } => T::KeySignature,
            M::SequencerSpecific { .. } => T::SequencerSpecific,
            M::UnknownMeta { .. } => T::UnknownMeta,
        }
    }

    /// Classifies `self` into channel, system common, system realtime or meta.
    pub fn class(&self) -> MessageClass {
        match self {
            MidiMessage::Unknown { status, .. } => match status {
                0x80..=0xEF => MessageClass::Channel,
                0xF0..=0xF7 => MessageClass::SystemCommon,
                _ => MessageClass::SystemRealtime,
            },
            other => other.kind().class(),
        }
    }

    /// Read an integer attribute, or `None` if this kind of message does not have it.
    pub fn get(&self, attr: Attr) -> Option<i64> {
        use self::{Attr as A, MidiMessage as M};
        Some(match (self, attr) {
            (
                M::NoteOff { channel, .. }
                | M::NoteOn { channel, .. }
                | M::PolyTouch { channel, .. }
                | M::ControlChange { channel, .. }
                | M::ProgramChange { channel, .. }
                | M::Aftertouch { channel, .. }
                | M::PitchWheel { channel, .. }
                | M::ChannelPrefix { channel },
                A::Channel,
            ) => channel.as_int() as i64,
            (
                M::NoteOff { note, .. } | M::NoteOn { note, .. } | M::PolyTouch { note, .. },
                A::Note,
            ) => note.as_int() as i64,
            (M::NoteOff { velocity, .. } | M::NoteOn { velocity, .. }, A::Velocity) => {
                velocity.as_int() as i64
            }
            (
                M::PolyTouch { value, .. }
                | M::ControlChange { value, .. }
                | M::Aftertouch { value, .. },
                A::Value,
            ) => value.as_int() as i64,
            (M::ControlChange { control, .. }, A::Control) => control.as_int() as i64,
            (M::ProgramChange { program, .. }, A::Program) => program.as_int() as i64,
            (M::PitchWheel { pitch, .. }, A::Pitch) => pitch.as_i16() as i64,
            (M::QuarterFrame { frame_type, .. }, A::FrameType) => frame_type.as_int() as i64,
            (M::QuarterFrame { frame_value, .. }, A::FrameValue) => frame_value.as_int() as i64,
            (M::SongPosition { pos }, A::Pos) => pos.as_int() as i64,
            (M::SongSelect { song }, A::Song) => song.as_int() as i64,
            (M::SequenceNumber { number }, A::Number) => *number as i64,
            (M::MidiPort { port }, A::Port) => *port as i64,
            (M::SetTempo { tempo }, A::Tempo) => tempo.as_int() as i64,
            (M::TimeSignature { signature }, A::Numerator) => signature.numerator() as i64,
            (M::TimeSignature { signature }, A::Denominator) => signature.denominator() as i64,
            (M::TimeSignature { signature }, A::ClocksPerClick) => {
                signature.clocks_per_click() as i64
            }
            (M::TimeSignature { signature }, A::Notated32ndNotesPerBeat) => {
                signature.notated_32nd_notes_per_beat() as i64
            }
            (M::SmpteOffset { time }, A::FrameRate) => time.fps().as_int() as i64,
            (M::SmpteOffset { time }, A::Hours) => time.hour() as i64,
            (M::SmpteOffset { time }, A::Minutes) => time.minute() as i64,
            (M::SmpteOffset { time }, A::Seconds) => time.second() as i64,
            (M::SmpteOffset { time }, A::Frames) => time.frame() as i64,
            (M::SmpteOffset { time }, A::SubFrames) => time.subframe() as i64,
            _ => return None,
        })
    }

    /// Replace an integer attribute, validating it under the given policy.
    ///
    /// On error the message is left untouched.
    pub fn set(&mut self, attr: Attr, value: i64, policy: Policy) -> Result<()> {
        use self::{Attr as A, MidiMessage as M};
        let field = attr.name();
        let byte = |value: i64| check_range(field, value, 0, 0xFF, policy).map(|v| v as u8);
        match (self, attr) {
            (
                M::NoteOff { channel, .. }
                | M::NoteOn { channel, .. }
                | M::PolyTouch { channel, .. }
                | M::ControlChange { channel, .. }
                | M::ProgramChange { channel, .. }
                | M::Aftertouch { channel, .. }
                | M::PitchWheel { channel, .. }
                | M::ChannelPrefix { channel },
                A::Channel,
            ) => *channel = u4::check(field, value, policy)?,
            (
                M::NoteOff { note, .. } | M::NoteOn { note, .. } | M::PolyTouch { note, .. },
                A::Note,
            ) => *note = u7::check(field, value, policy)?,
            (M::NoteOff { velocity, .. } | M::NoteOn { velocity, .. }, A::Velocity) => {
                *velocity = u7::check(field, value, policy)?
            }
            (
                M::PolyTouch { value: slot, .. }
                | M::ControlChange { value: slot, .. }
                | M::Aftertouch { value: slot, .. },
                A::Value,
            ) => *slot = u7::check(field, value, policy)?,
            (M::ControlChange { control, .. }, A::Control) => {
                *control = u7::check(field, value, policy)?
            }
            (M::ProgramChange { program, .. }, A::Program) => {
                *program = u7::check(field, value, policy)?
            }
            (M::PitchWheel { pitch, .. }, A::Pitch) => {
                *pitch = PitchBend::check(field, value, policy)?
            }
            (M::QuarterFrame { frame_type, .. }, A::FrameType) => {
                *frame_type = u3::check(field, value, policy)?
            }
            (M::QuarterFrame { frame_value, .. }, A::FrameValue) => {
                *frame_value = u4::check(field, value, policy)?
            }
            (M::SongPosition { pos }, A::Pos) => *pos = u14::check(field, value, policy)?,
            (M::SongSelect { song }, A::Song) => *song = u7::check(field, value, policy)?,
            (M::SequenceNumber { number }, A::Number) => {
                *number = check_range(field, value, 0, 0xFFFF, policy)? as u16
            }
            (M::MidiPort { port }, A::Port) => *port = byte(value)?,
            (M::SetTempo { tempo }, A::Tempo) => *tempo = u24::check(field, value, policy)?,
            (M::TimeSignature { signature }, A::Numerator) => {
                signature.set_numerator(byte(value)?)
            }
            (M::TimeSignature { signature }, A::Denominator) => {
                signature.set_denominator(value, policy)?
            }
            (M::TimeSignature { signature }, A::ClocksPerClick) => {
                signature.set_clocks_per_click(byte(value)?)
            }
            (M::TimeSignature { signature }, A::Notated32ndNotesPerBeat) => {
                signature.set_notated_32nd_notes_per_beat(byte(value)?)
            }
            (M::SmpteOffset { time }, attr) => *time = set_smpte(*time, attr, value, policy)?,
            _ => bail!(Error::no_such_attr(field)),
        }
        Ok(())
    }

    /// The raw byte payload of sysex, text-like meta, sequencer-specific and unknown messages.
    pub fn data(&self) -> Option<&[u8]> {
        use self::MidiMessage as M;
        match self {
            M::SysEx { data } => Some(u7::slice_as_int(data)),
            M::Text { text }
            | M::Copyright { text }
            | M::Lyrics { text }
            | M::Marker { text }
            | M::CueMarker { text } => Some(text.as_slice()),
            M::TrackName { name } | M::InstrumentName { name } | M::DeviceName { name } => {
                Some(name.as_slice())
            }
            M::SequencerSpecific { data } | M::Unknown { data, .. } | M::UnknownMeta { data, .. } => {
                Some(data.as_slice())
            }
            _ => None,
        }
    }

    /// Replace the raw byte payload. Sysex bytes must be 7-bit, or are clamped under `Clip`.
    ///
    /// `Unknown` messages take no data: it is rejected, or dropped under `Clip`. `UnknownMeta`
    /// data is rejected if it would turn the message into a recognized meta message.
    /// On error the message is left untouched.
    pub fn set_data(&mut self, bytes: &[u8], policy: Policy) -> Result<()> {
        use self::MidiMessage as M;
        match self {
            M::Unknown { data, .. } => {
                ensure!(
                    bytes.is_empty() || policy == Policy::Clip,
                    Error::InvalidValue {
                        field: "data",
                        reason: "undefined status bytes carry no data",
                    }
                );
                data.clear();
            }
            M::UnknownMeta { type_byte, data } => {
                let candidate = M::UnknownMeta {
                    type_byte: *type_byte,
                    data: bytes.to_vec(),
                };
                candidate.validate()?;
                *data = bytes.to_vec();
            }
            M::SysEx { data } => {
                *data = bytes
                    .iter()
                    .map(|&b| u7::check("data", b as i64, policy))
                    .collect::<Result<Vec<u7>>>()?;
            }
            M::Text { text }
            | M::Copyright { text }
            | M::Lyrics { text }
            | M::Marker { text }
            | M::CueMarker { text } => *text = bytes.to_vec(),
            M::TrackName { name } | M::InstrumentName { name } | M::DeviceName { name } => {
                *name = bytes.to_vec()
            }
            M::SequencerSpecific { data } => *data = bytes.to_vec(),
            _ => bail!(Error::no_such_attr("data")),
        }
        Ok(())
    }

    /// Replace the status byte of an `Unknown` message or the type byte of an `UnknownMeta`
    /// message, together with its data.
    ///
    /// Both are validated as a pair, so that the result never decodes as a different kind.
    /// On error the message is left untouched.
    pub fn set_unknown(&mut self, head: u8, bytes: &[u8]) -> Result<()> {
        use self::MidiMessage as M;
        let candidate = match self {
            M::Unknown { .. } => M::Unknown {
                status: head,
                data: bytes.to_vec(),
            },
            M::UnknownMeta { .. } => M::UnknownMeta {
                type_byte: head,
                data: bytes.to_vec(),
            },
            _ => bail!(Error::no_such_attr("status")),
        };
        candidate.validate()?;
        *self = candidate;
        Ok(())
    }

    /// The status byte of an `Unknown` message, or the type byte of an `UnknownMeta` message.
    pub fn unknown_head(&self) -> Option<u8> {
        match self {
            MidiMessage::Unknown { status, .. } => Some(*status),
            MidiMessage::UnknownMeta { type_byte, .. } => Some(*type_byte),
            _ => None,
        }
    }
}

fn set_smpte(time: SmpteTime, attr: Attr, value: i64, policy: Policy) -> Result<SmpteTime> {
    use self::Attr as A;
    let field = attr.name();
    let (mut hour, mut minute, mut second, mut frame, mut subframe, mut fps) = (
        time.hour(),
        time.minute(),
        time.second(),
        time.frame(),
        time.subframe(),
        time.fps(),
    );
    let clip = policy == Policy::Clip;
    match attr {
        A::FrameRate => {
            fps = match u8::try_from(value).ok().and_then(Fps::from_int) {
                Some(fps) => fps,
                None if clip => match value {
                    i64::MIN..=24 => Fps::Fps24,
                    25..=28 => Fps::Fps25,
                    29 => Fps::Fps29,
                    _ => Fps::Fps30,
                },
                None => bail!(Error::InvalidValue {
                    field,
                    reason: "must be one of 24, 25, 29 or 30",
                }),
            };
            if clip {
                frame = frame.min(fps.as_int() - 1);
            }
        }
        A::Hours => hour = check_range(field, value, 0, 23, policy)? as u8,
        A::Minutes => minute = check_range(field, value, 0, 59, policy)? as u8,
        A::Seconds => second = check_range(field, value, 0, 59, policy)? as u8,
        A::Frames => frame = check_range(field, value, 0, fps.as_int() as i64 - 1, policy)? as u8,
        A::SubFrames => subframe = check_range(field, value, 0, 99, policy)? as u8,
        _ => bail!(Error::no_such_attr(field)),
    }
    SmpteTime::new(hour, minute, second, frame, subframe, fps).ok_or(Error::InvalidValue {
        field: "frames",
        reason: "frame does not exist at this frame rate",
    })
}

/// The broad class of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageClass {
    /// A channel voice or mode message, associated to a particular MIDI channel.
    Channel,
    /// A System Common message, including sysex.
    SystemCommon,
    /// A single-byte System Realtime message.
    SystemRealtime,
    /// A meta message, only meaningful inside tracks.
    Meta,
}

/// A named integer attribute of a message, such as `channel` or `velocity`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attr {
    Channel,
    Note,
    Velocity,
    Value,
    Control,
    Program,
    Pitch,
    FrameType,
    FrameValue,
    Pos,
    Song,
    Number,
    Port,
    Tempo,
    Numerator,
    Denominator,
    ClocksPerClick,
    Notated32ndNotesPerBeat,
    FrameRate,
    Hours,
    Minutes,
    Seconds,
    Frames,
    SubFrames,
}

const ALL_ATTRS: [Attr; 24] = {
    use self::Attr::*;
    [
        Channel,
        Note,
        Velocity,
        Value,
        Control,
        Program,
        Pitch,
        FrameType,
        FrameValue,
        Pos,
        Song,
        Number,
        Port,
        Tempo,
        Numerator,
        Denominator,
        ClocksPerClick,
        Notated32ndNotesPerBeat,
        FrameRate,
        Hours,
        Minutes,
        Seconds,
        Frames,
        SubFrames,
    ]
};

impl Attr {
    /// The attribute name as used in the text format.
    pub fn name(self) -> &'static str {
        use self::Attr::*;
        match self {
            Channel => "channel",
            Note => "note",
            Velocity => "velocity",
            Value => "value",
            Control => "control",
            Program => "program",
            Pitch => "pitch",
            FrameType => "frame_type",
            FrameValue => "frame_value",
            Pos => "pos",
            Song => "song",
            Number => "number",
            Port => "port",
            Tempo => "tempo",
            Numerator => "numerator",
            Denominator => "denominator",
            ClocksPerClick => "clocks_per_click",
            Notated32ndNotesPerBeat => "notated_32nd_notes_per_beat",
            FrameRate => "frame_rate",
            Hours => "hours",
            Minutes => "minutes",
            Seconds => "seconds",
            Frames => "frames",
            SubFrames => "sub_frames",
        }
    }

    /// Look an attribute up by its text-format name.
    pub fn from_name(name: &str) -> Option<Attr> {
        ALL_ATTRS.iter().copied().find(|attr| attr.name() == name)
    }
}
impl fmt::Display for Attr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

macro_rules! message_types {
    {$( $variant:ident => $name:literal, $class:ident, [$($attr:ident),*] ),* $(,)?} => {
        /// The kind of a message, without any of its payload.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum MessageType {
            $( $variant, )*
        }

        const ALL_TYPES: &[MessageType] = &[$( MessageType::$variant, )*];

        impl MessageType {
            /// Every message type, in declaration order.
            pub fn all() -> &'static [MessageType] {
                ALL_TYPES
            }

            /// The type name as used in the text format, such as `"note_on"`.
            pub fn as_str(self) -> &'static str {
                match self {
                    $( MessageType::$variant => $name, )*
                }
            }

            /// The class every message of this type belongs to.
            pub fn class(self) -> MessageClass {
                match self {
                    $( MessageType::$variant => MessageClass::$class, )*
                }
            }

            /// The integer attributes of this message type, in text-format order.
            pub fn attrs(self) -> &'static [Attr] {
                match self {
                    $( MessageType::$variant => &[$( Attr::$attr ),*], )*
                }
            }
        }
    };
}
message_types! {
    NoteOff => "note_off", Channel, [Channel, Note, Velocity],
    NoteOn => "note_on", Channel, [Channel, Note, Velocity],
    PolyTouch => "polytouch", Channel, [Channel, Note, Value],
    ControlChange => "control_change", Channel, [Channel, Control, Value],
    ProgramChange => "program_change", Channel, [Channel, Program],
    Aftertouch => "aftertouch", Channel, [Channel, Value],
    PitchWheel => "pitchwheel", Channel, [Channel, Pitch],
    SysEx => "sysex", SystemCommon, [],
    QuarterFrame => "quarter_frame", SystemCommon, [FrameType, FrameValue],
    SongPosition => "songpos", SystemCommon, [Pos],
    SongSelect => "song_select", SystemCommon, [Song],
    TuneRequest => "tune_request", SystemCommon, [],
    Clock => "clock", SystemRealtime, [],
    Start => "start", SystemRealtime, [],
    Continue => "continue", SystemRealtime, [],
    Stop => "stop", SystemRealtime, [],
    ActiveSensing => "active_sensing", SystemRealtime, [],
    Reset => "reset", SystemRealtime, [],
    Unknown => "unknown", SystemCommon, [],
    SequenceNumber => "sequence_number", Meta, [Number],
    Text => "text", Meta, [],
    Copyright => "copyright", Meta, [],
    TrackName => "track_name", Meta, [],
    InstrumentName => "instrument_name", Meta, [],
    Lyrics => "lyrics", Meta, [],
    Marker => "marker", Meta, [],
    CueMarker => "cue_marker", Meta, [],
    DeviceName => "device_name", Meta, [],
    ChannelPrefix => "channel_prefix", Meta, [Channel],
    MidiPort => "midi_port", Meta, [Port],
    EndOfTrack => "end_of_track", Meta, [],
    SetTempo => "set_tempo", Meta, [Tempo],
    SmpteOffset => "smpte_offset", Meta, [FrameRate, Hours, Minutes, Seconds, Frames, SubFrames],
    TimeSignature => "time_signature", Meta, [Numerator, Denominator, ClocksPerClick, Notated32ndNotesPerBeat],
    KeySignature => "key_signature", Meta, [],
    SequencerSpecific => "sequencer_specific", Meta, [],
    UnknownMeta => "unknown_meta", Meta, [],
}

impl MessageType {
    #[inline]
    pub fn is_meta(self) -> bool {
        self.class() == MessageClass::Meta
    }

    /// A message of this type with every attribute at its default.
    ///
    /// Attributes default to zero, except for `velocity` (64), tempo (500000 microseconds per
    /// beat), time signatures (4/4 with 24 clocks per click and 8 notated 32nd notes per beat),
    /// the key (C major) and SMPTE frame rate (24 fps).
    pub fn default_message(self) -> MidiMessage {
        use self::{MessageType as T, MidiMessage as M};
        let channel = u4::from_int_lossy(0);
        let zero = u7::from_int_lossy(0);
        let velocity = u7::from_int_lossy(64);
        match self {
            T::NoteOff => M::NoteOff {
                channel,
                note: zero,
                velocity,
            },
            T::NoteOn => M::NoteOn {
                channel,
                note: zero,
                velocity,
            },
            T::PolyTouch => M::PolyTouch {
                channel,
                note: zero,
                value: zero,
            },
            T::ControlChange => M::ControlChange {
                channel,
                control: zero,
                value: zero,
            },
            T::ProgramChange => M::ProgramChange {
                channel,
                program: zero,
            },
            T::Aftertouch => M::Aftertouch {
                channel,
                value: zero,
            },
            T::PitchWheel => M::PitchWheel {
                channel,
                pitch: PitchBend::default(),
            },
            T::SysEx => M::SysEx { data: Vec::new() },
            T::QuarterFrame => M::QuarterFrame {
                frame_type: u3::default(),
                frame_value: u4::default(),
            },
            T::SongPosition => M::SongPosition {
                pos: u14::default(),
            },
            T::SongSelect => M::SongSelect { song: zero },
            T::TuneRequest => M::TuneRequest,
            T::Clock => M::Clock,
            T::Start => M::Start,
            T::Continue => M::Continue,
            T::Stop => M::Stop,
            T::ActiveSensing => M::ActiveSensing,
            T::Reset => M::Reset,
            T::Unknown => M::Unknown {
                status: 0xF4,
                data: Vec::new(),
            },
            T::SequenceNumber => M::SequenceNumber { number: 0 },
            T::Text => M::Text { text: Vec::new() },
            T::Copyright => M::Copyright { text: Vec::new() },
            T::TrackName => M::TrackName { name: Vec::new() },
            T::InstrumentName => M::InstrumentName { name: Vec::new() },
            T::Lyrics => M::Lyrics { text: Vec::new() },
            T::Marker => M::Marker { text: Vec::new() },
            T::CueMarker => M::CueMarker { text: Vec::new() },
            T::DeviceName => M::DeviceName { name: Vec::new() },
            T::ChannelPrefix => M::ChannelPrefix { channel },
            T::MidiPort => M::MidiPort { port: 0 },
            T::EndOfTrack => M::EndOfTrack,
            T::SetTempo => M::SetTempo {
                tempo: u24::from_int_lossy(crate::timing::DEFAULT_TEMPO),
            },
            T::SmpteOffset => M::SmpteOffset {
                time: SmpteTime::default(),
            },
            T::TimeSignature => M::TimeSignature {
                signature: TimeSignature::default(),
            },
            T::KeySignature => M::KeySignature { key: Key::C },
            T::SequencerSpecific => M::SequencerSpecific { data: Vec::new() },
            T::UnknownMeta => M::UnknownMeta {
                type_byte: 0x60,
                data: Vec::new(),
            },
        }
    }
}
impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
impl FromStr for MessageType {
    type Err = Error;
    fn from_str(s: &str) -> Result<MessageType> {
        ALL_TYPES
            .iter()
            .copied()
            .find(|ty| ty.as_str() == s)
            .ok_or(Error::InvalidValue {
                field: "type",
                reason: "unknown message type",
            })
    }
}
