//! Decoding of meta message text payloads.
//!
//! Meta text is stored as opaque bytes; a `TextDecoder` chooses the character set when the text
//! is needed as a string.

use std::borrow::Cow;

/// Converts raw meta message text bytes into a string using some character set.
pub trait TextDecoder {
    fn decode<'a>(&self, bytes: &'a [u8]) -> Cow<'a, str>;
}

/// ISO-8859-1, where every byte maps to the code point of the same value.
///
/// This is the usual encoding of text in MIDI files and never fails.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Latin1;

impl TextDecoder for Latin1 {
    fn decode<'a>(&self, bytes: &'a [u8]) -> Cow<'a, str> {
        if bytes.is_ascii() {
            // ASCII is valid UTF-8 with the same meaning
            Cow::Borrowed(std::str::from_utf8(bytes).unwrap_or_default())
        } else {
            Cow::Owned(bytes.iter().map(|&b| b as char).collect())
        }
    }
}

/// UTF-8, replacing invalid sequences with `U+FFFD`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Utf8Lossy;

impl TextDecoder for Utf8Lossy {
    fn decode<'a>(&self, bytes: &'a [u8]) -> Cow<'a, str> {
        String::from_utf8_lossy(bytes)
    }
}

impl<F> TextDecoder for F
where
    F: Fn(&[u8]) -> String,
{
    fn decode<'a>(&self, bytes: &'a [u8]) -> Cow<'a, str> {
        Cow::Owned(self(bytes))
    }
}
