use std::{fmt, io};
use thiserror::Error;

/// Represents an error produced while building, decoding or transporting MIDI messages.
///
/// Errors are broadly categorized through [`ErrorKind`](enum.ErrorKind.html), which is what
/// most callers want to match on.
/// The variants themselves carry the details needed to produce a useful message.
///
/// Note that the streaming [`Parser`](struct.Parser.html) never produces errors: malformed input
/// degrades to `unknown` messages or is discarded.
#[derive(Error, Debug)]
pub enum Error {
    /// An attribute was outside its declared range and the `Strict` policy was in effect.
    #[error("{field} must be in range {min}..={max}, got {value}")]
    Validation {
        field: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },

    /// An attribute had a value that is not representable for reasons other than its range,
    /// or the attribute does not exist for the given message type.
    #[error("invalid {field}: {reason}")]
    InvalidValue {
        field: &'static str,
        reason: &'static str,
    },

    /// A byte sequence (or text) did not encode exactly one complete message.
    #[error("invalid midi: {0}")]
    Parse(&'static str),

    /// The port is closed, or was closed while a blocking call was waiting on it.
    #[error("port is closed")]
    PortClosed,

    /// The byte source or sink backing a port failed.
    #[error("port i/o error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// The broad category of this error.
    #[inline]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Validation { .. } | Error::InvalidValue { .. } => ErrorKind::Validation,
            Error::Parse(_) => ErrorKind::Parse,
            Error::PortClosed => ErrorKind::PortClosed,
            Error::Io(_) => ErrorKind::Io,
        }
    }

    pub(crate) fn no_such_attr(field: &'static str) -> Error {
        Error::InvalidValue {
            field,
            reason: "not an attribute of this message type",
        }
    }
}

/// The category of an [`Error`](enum.Error.html).
///
/// All of these are recoverable: nothing in this crate retries internally, so the caller decides
/// what to do next.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// An attribute was out of range or otherwise not representable.
    Validation,
    /// A byte sequence did not decode into exactly one message.
    Parse,
    /// A blocking operation was attempted on (or interrupted by) a closed port.
    PortClosed,
    /// The underlying byte source or sink failed.
    Io,
}
impl fmt::Display for ErrorKind {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            ErrorKind::Validation => "validation error",
            ErrorKind::Parse => "parse error",
            ErrorKind::PortClosed => "port closed",
            ErrorKind::Io => "i/o error",
        })
    }
}

macro_rules! err_parse {
    ($msg:expr) => {{
        crate::error::Error::Parse($msg)
    }};
}

/// The result type used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
