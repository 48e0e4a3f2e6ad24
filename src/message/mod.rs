//! Typed, validated MIDI messages.
//!
//! A [`Message`](struct.Message.html) pairs a [`MidiMessage`](enum.MidiMessage.html) payload with
//! a `time` value whose meaning depends on context: delta ticks inside a track, seconds during
//! playback, or anything else the caller decides.
//!
//! Messages are mutable and can be converted to a [`FrozenMessage`](struct.FrozenMessage.html),
//! which is immutable, hashable and can be used as a map key. Both conversions copy.

use crate::prelude::*;
use std::{
    hash::{Hash, Hasher},
    ops::Deref,
};

mod kind;
mod meta;
mod display;
mod text;

pub use self::{
    kind::{Attr, MessageClass, MessageType, MidiMessage},
    meta::{Key, TimeSignature},
    text::{Latin1, TextDecoder, Utf8Lossy},
};
pub(crate) use self::kind::{data_len, is_channel_status};

/// A MIDI message together with its time.
///
/// Integer attributes are range-checked on construction and on every mutation, either rejecting
/// out-of-range values or clamping them depending on the [`Policy`](../enum.Policy.html).
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    msg: MidiMessage,
    time: f64,
}

fn check_time(time: f64) -> Result<f64> {
    ensure!(
        time.is_finite(),
        Error::InvalidValue {
            field: "time",
            reason: "must be a finite number",
        }
    );
    Ok(time)
}

impl Message {
    /// Create a message of the given type with every attribute at its default and a time of 0.
    pub fn new(ty: MessageType) -> Message {
        Message::from_midi(ty.default_message())
    }

    /// Create a message of the given type, setting the listed attributes.
    ///
    /// Fails with a validation error naming the first offending attribute.
    pub fn build(ty: MessageType, attrs: &[(Attr, i64)]) -> Result<Message> {
        Message::build_with(ty, attrs, Policy::Strict)
    }

    /// Like `build`, but with an explicit out-of-range policy.
    pub fn build_with(ty: MessageType, attrs: &[(Attr, i64)], policy: Policy) -> Result<Message> {
        let mut msg = Message::new(ty);
        for &(attr, value) in attrs {
            msg.msg.set(attr, value, policy)?;
        }
        Ok(msg)
    }

    /// Create a message out of a payload and a time.
    ///
    /// Fails if the time is not finite, or if an `Unknown`/`UnknownMeta` payload would not
    /// decode back to itself.
    pub fn with_time(msg: MidiMessage, time: f64) -> Result<Message> {
        msg.validate()?;
        Ok(Message {
            msg,
            time: check_time(time)?,
        })
    }

    /// Wrap a payload that is known to be valid, with a time of 0.
    #[inline]
    pub(crate) fn from_midi(msg: MidiMessage) -> Message {
        Message { msg, time: 0.0 }
    }

    #[inline]
    pub fn kind(&self) -> MessageType {
        self.msg.kind()
    }

    #[inline]
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Replace the time. It must be a finite number.
    pub fn set_time(&mut self, time: f64) -> Result<()> {
        self.time = check_time(time)?;
        Ok(())
    }

    /// Set the time without validation, for internal arithmetic on already-finite values.
    #[inline]
    pub(crate) fn set_time_unchecked(&mut self, time: f64) {
        self.time = time;
    }

    /// The typed payload.
    #[inline]
    pub fn midi(&self) -> &MidiMessage {
        &self.msg
    }

    #[inline]
    pub fn into_midi(self) -> MidiMessage {
        self.msg
    }

    /// Read an integer attribute, or `None` if this message type does not have it.
    #[inline]
    pub fn get(&self, attr: Attr) -> Option<i64> {
        self.msg.get(attr)
    }

    /// Replace an integer attribute, rejecting out-of-range values.
    #[inline]
    pub fn set(&mut self, attr: Attr, value: i64) -> Result<()> {
        self.msg.set(attr, value, Policy::Strict)
    }

    /// Replace an integer attribute with an explicit out-of-range policy.
    #[inline]
    pub fn set_with(&mut self, attr: Attr, value: i64, policy: Policy) -> Result<()> {
        self.msg.set(attr, value, policy)
    }

    #[inline]
    pub fn data(&self) -> Option<&[u8]> {
        self.msg.data()
    }

    /// Replace the byte payload of sysex, text-like meta and unknown messages.
    pub fn set_data(&mut self, data: &[u8]) -> Result<()> {
        self.msg.set_data(data, Policy::Strict)
    }

    #[inline]
    pub fn set_data_with(&mut self, data: &[u8], policy: Policy) -> Result<()> {
        self.msg.set_data(data, policy)
    }

    /// Replace the status byte of an `unknown` message or the type byte of an `unknown_meta`
    /// message, along with its data.
    #[inline]
    pub fn set_unknown(&mut self, head: u8, data: &[u8]) -> Result<()> {
        self.msg.set_unknown(head, data)
    }

    pub fn key(&self) -> Option<Key> {
        match self.msg {
            MidiMessage::KeySignature { key } => Some(key),
            _ => None,
        }
    }

    pub fn set_key(&mut self, new_key: Key) -> Result<()> {
        match &mut self.msg {
            MidiMessage::KeySignature { key } => {
                *key = new_key;
                Ok(())
            }
            _ => Err(Error::no_such_attr("key")),
        }
    }

    /// Return a copy of this message with the given attributes replaced and re-validated.
    ///
    /// `self` is never modified, even if an override fails validation.
    pub fn copy(&self, overrides: &[(Attr, i64)]) -> Result<Message> {
        self.copy_with(overrides, Policy::Strict)
    }

    pub fn copy_with(&self, overrides: &[(Attr, i64)], policy: Policy) -> Result<Message> {
        let mut copy = self.clone();
        for &(attr, value) in overrides {
            copy.msg.set(attr, value, policy)?;
        }
        Ok(copy)
    }

    /// Encode the message into its wire bytes. The time is not encoded.
    ///
    /// Meta messages are encoded in their file form, `0xFF type length data`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(3);
        self.msg.encode(&mut out);
        out
    }

    /// Decode exactly one complete message from its wire bytes, with a time of 0.
    pub fn from_bytes(bytes: &[u8]) -> Result<Message> {
        MidiMessage::try_decode(bytes).map(Message::from_midi)
    }

    /// The wire bytes as space-separated uppercase hex, such as `"90 3C 40"`.
    pub fn to_hex(&self) -> String {
        let bytes = self.to_bytes();
        let mut out = String::with_capacity(bytes.len() * 3);
        for (i, byte) in bytes.iter().enumerate() {
            if i > 0 {
                out.push(' ');
            }
            out.push_str(&format!("{:02X}", byte));
        }
        out
    }

    /// Decode a message from whitespace-separated hex bytes.
    pub fn from_hex(hex: &str) -> Result<Message> {
        let bytes = hex
            .split_whitespace()
            .map(|tok| u8::from_str_radix(tok, 16).map_err(|_| err_parse!("invalid hex byte")))
            .collect::<Result<Vec<u8>>>()?;
        Message::from_bytes(&bytes)
    }

    /// The number of bytes in the wire encoding.
    pub fn len(&self) -> usize {
        self.to_bytes().len()
    }

    #[inline]
    pub fn class(&self) -> MessageClass {
        self.msg.class()
    }

    #[inline]
    pub fn is_meta(&self) -> bool {
        self.class() == MessageClass::Meta
    }

    #[inline]
    pub fn is_realtime(&self) -> bool {
        self.class() == MessageClass::SystemRealtime
    }

    /// Returns `true` for control change messages, optionally only for the given controller.
    pub fn is_cc(&self, control: Option<u8>) -> bool {
        match (&self.msg, control) {
            (MidiMessage::ControlChange { .. }, None) => true,
            (MidiMessage::ControlChange { control: actual, .. }, Some(wanted)) => *actual == wanted,
            _ => false,
        }
    }

    /// Decode the text payload of a text-like meta message with the given character set.
    pub fn decode_text(&self, decoder: &dyn TextDecoder) -> Option<String> {
        match self.msg.kind() {
            MessageType::Text
            | MessageType::Copyright
            | MessageType::TrackName
            | MessageType::InstrumentName
            | MessageType::Lyrics
            | MessageType::Marker
            | MessageType::CueMarker
            | MessageType::DeviceName => {
                self.data().map(|bytes| decoder.decode(bytes).into_owned())
            }
            _ => None,
        }
    }

    /// Make an immutable, hashable copy of this message.
    #[inline]
    pub fn freeze(&self) -> FrozenMessage {
        FrozenMessage(self.clone())
    }
}
impl TryFrom<MidiMessage> for Message {
    type Error = Error;
    #[inline]
    fn try_from(msg: MidiMessage) -> Result<Message> {
        Message::with_time(msg, 0.0)
    }
}

/// An immutable message, usable as a hash map key.
///
/// Equality and hashing are structural over the payload and the time.
/// All read accessors of `Message` are available through `Deref`; there is no way to mutate a
/// frozen message in place, so `thaw()` it to get an independent mutable copy.
#[derive(Debug, Clone)]
pub struct FrozenMessage(Message);

impl FrozenMessage {
    /// Make an independent mutable copy of this message.
    #[inline]
    pub fn thaw(&self) -> Message {
        self.0.clone()
    }

    /// Take the message out, consuming the frozen wrapper.
    #[inline]
    pub fn into_inner(self) -> Message {
        self.0
    }

    /// The time normalized for hashing, so that `0.0` and `-0.0` hash alike as they compare
    /// equal.
    fn time_bits(&self) -> u64 {
        if self.0.time == 0.0 {
            0
        } else {
            self.0.time.to_bits()
        }
    }
}
impl Deref for FrozenMessage {
    type Target = Message;
    #[inline]
    fn deref(&self) -> &Message {
        &self.0
    }
}
impl PartialEq for FrozenMessage {
    fn eq(&self, rhs: &FrozenMessage) -> bool {
        self.0 == rhs.0
    }
}
// Times are always finite, so equality is reflexive.
impl Eq for FrozenMessage {}
impl Hash for FrozenMessage {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.msg.hash(state);
        self.time_bits().hash(state);
    }
}
impl From<Message> for FrozenMessage {
    #[inline]
    fn from(msg: Message) -> FrozenMessage {
        FrozenMessage(msg)
    }
}
impl From<FrozenMessage> for Message {
    #[inline]
    fn from(frozen: FrozenMessage) -> Message {
        frozen.0
    }
}
impl PartialEq<Message> for FrozenMessage {
    fn eq(&self, rhs: &Message) -> bool {
        self.0 == *rhs
    }
}

#[cfg(test)]
mod test;
