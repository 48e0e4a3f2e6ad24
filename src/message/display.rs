//! The text format of messages: `note_on channel=0 note=60 velocity=64 time=0`.

use crate::{
    message::{Attr, Key, Latin1, Message, MessageType, MidiMessage, TextDecoder},
    prelude::*,
};
use std::str::FromStr;

struct Bytes<'a>(&'a [u8]);
impl fmt::Display for Bytes<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("(")?;
        for (i, byte) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}", byte)?;
        }
        f.write_str(")")
    }
}

fn parse_bytes(raw: &str) -> Result<Vec<u8>> {
    let inner = raw
        .strip_prefix('(')
        .and_then(|raw| raw.strip_suffix(')'))
        .ok_or(err_parse!("byte data must be written as (a,b,c)"))?;
    inner
        .split(',')
        .map(str::trim)
        .filter(|tok| !tok.is_empty())
        .map(|tok| {
            tok.parse::<u8>()
                .map_err(|_| err_parse!("byte data must hold integers in 0..=255"))
        })
        .collect()
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let kind = self.kind();
        f.write_str(kind.as_str())?;
        for &attr in kind.attrs() {
            if let Some(value) = self.get(attr) {
                write!(f, " {}={}", attr, value)?;
            }
        }
        match self.midi() {
            MidiMessage::SysEx { .. } | MidiMessage::SequencerSpecific { .. } => {
                write!(f, " data={}", Bytes(self.data().unwrap_or_default()))?
            }
            MidiMessage::Unknown { status, .. } => write!(f, " status={}", status)?,
            MidiMessage::UnknownMeta { type_byte, data } => {
                write!(f, " type_byte={} data={}", type_byte, Bytes(data))?
            }
            MidiMessage::KeySignature { key } => write!(f, " key={}", key)?,
            MidiMessage::TrackName { name }
            | MidiMessage::InstrumentName { name }
            | MidiMessage::DeviceName { name } => write!(f, " name={:?}", Latin1.decode(name))?,
            other => {
                if let Some(text) = other.data() {
                    write!(f, " text={:?}", Latin1.decode(text))?
                }
            }
        }
        write!(f, " time={}", self.time())
    }
}

impl FromStr for Message {
    type Err = Error;

    /// Parse the text format written by `Display`.
    ///
    /// Quoted text attributes of meta messages are not supported.
    /// The status (or type byte) and data of unknown messages are validated together once every
    /// attribute has been read.
    fn from_str(s: &str) -> Result<Message> {
        let mut tokens = s.split_whitespace();
        let kind: MessageType = tokens
            .next()
            .ok_or(err_parse!("missing message type"))?
            .parse()?;
        let mut msg = Message::new(kind);
        let mut head = msg.midi().unknown_head();
        let mut raw_data = None;
        for token in tokens {
            let (name, value) = token
                .split_once('=')
                .ok_or(err_parse!("attributes must be written as name=value"))?;
            match name {
                "time" => msg.set_time(
                    value
                        .parse::<f64>()
                        .map_err(|_| err_parse!("time must be a number"))?,
                )?,
                "data" if head.is_some() => raw_data = Some(parse_bytes(value)?),
                "data" => msg.set_data(&parse_bytes(value)?)?,
                "key" => msg.set_key(value.parse::<Key>()?)?,
                "status" | "type_byte" => {
                    let byte = value
                        .parse::<u8>()
                        .map_err(|_| err_parse!("status must be an integer in 0..=255"))?;
                    let applies = match kind {
                        MessageType::Unknown => name == "status",
                        MessageType::UnknownMeta => name == "type_byte",
                        _ => false,
                    };
                    ensure!(
                        applies,
                        err_parse!("attribute does not apply to this message type")
                    );
                    head = Some(byte);
                }
                "text" | "name" => bail!(err_parse!("text attributes cannot be parsed")),
                _ => {
                    let attr = Attr::from_name(name).ok_or(err_parse!("unknown attribute name"))?;
                    let value = value
                        .parse::<i64>()
                        .map_err(|_| err_parse!("attribute values must be integers"))?;
                    msg.set(attr, value)?;
                }
            }
        }
        if let Some(head) = head {
            msg.set_unknown(head, raw_data.as_deref().unwrap_or_default())?;
        }
        Ok(msg)
    }
}
