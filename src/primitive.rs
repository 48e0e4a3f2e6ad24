//! Exotically-sized integers and other small value types used by MIDI messages.
//!
//! All of these types uphold their range invariant at construction, so a message built out of
//! them can always be encoded.

use crate::prelude::*;

/// How out-of-range attribute values are handled when building or mutating a message.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash, Default)]
pub enum Policy {
    /// Out-of-range values are rejected with a validation error.
    #[default]
    Strict,
    /// Out-of-range values are clamped to the nearest bound.
    Clip,
}

/// Checks an integer against an inclusive range, applying the given policy.
pub(crate) fn check_range(
    field: &'static str,
    value: i64,
    min: i64,
    max: i64,
    policy: Policy,
) -> Result<i64> {
    if (min..=max).contains(&value) {
        Ok(value)
    } else if policy == Policy::Clip {
        Ok(value.clamp(min, max))
    } else {
        Err(Error::Validation {
            field,
            value,
            min,
            max,
        })
    }
}

macro_rules! restricted_int {
    {$(#[$attr:meta])* $name:ident : $inner:tt => $bits:expr} => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Hash, Default)]
        #[repr(transparent)]
        #[allow(non_camel_case_types)]
        pub struct $name($inner);
        impl From<$name> for $inner {
            #[inline]
            fn from(restricted: $name) -> $inner {restricted.0}
        }
        impl fmt::Display for $name {
            #[inline]
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }
        impl $name {
            const MASK: $inner = (1 << $bits) - 1;

            /// The maximum value that this restricted integer can hold.
            #[inline]
            pub const fn max_value() -> $name {
                $name (Self::MASK)
            }

            /// Creates a restricted int from its non-restricted counterpart by masking off the
            /// extra bits.
            #[inline]
            pub const fn from_int_lossy(raw: $inner) -> $name {
                $name (raw & Self::MASK)
            }

            /// Returns `Some` if the raw integer is within range of the restricted integer, and
            /// `None` otherwise.
            #[inline]
            pub fn try_from(raw: $inner) -> Option<$name> {
                if raw <= Self::MASK {
                    Some($name(raw))
                }else{
                    None
                }
            }

            /// Creates a restricted int by clamping an arbitrary integer into range.
            #[inline]
            pub fn clip(raw: i64) -> $name {
                $name (raw.clamp(0, Self::MASK as i64) as $inner)
            }

            /// Get the inner integer out of the wrapper.
            /// The inner integer is guaranteed to be in range of the restricted wrapper.
            #[inline]
            pub fn as_int(self) -> $inner {
                Into::into(self)
            }

            /// Cast a slice of raw integers to a slice of restricted integers, only if there are
            /// no out-of-range integers.
            #[inline]
            pub fn slice_try_from_int(raw: &[$inner]) -> Option<&[$name]> {
                if raw.iter().any(|&int| int > Self::MASK) {
                    return None;
                }
                // SAFETY: `$name` is `repr(transparent)` over `$inner` and every element was
                // just checked to be in range.
                unsafe {
                    Some(&*( raw as *const [$inner] as *const [$name] ))
                }
            }

            /// Cast a slice of restricted integers to the corresponding raw integers.
            #[inline]
            pub fn slice_as_int(slice: &[$name]) -> &[$inner] {
                // SAFETY: `$name` is `repr(transparent)` over `$inner`.
                unsafe { &*(slice as *const [$name] as *const [$inner]) }
            }

            /// Validates an attribute value under the given policy.
            #[inline]
            pub(crate) fn check(field: &'static str, raw: i64, policy: Policy) -> Result<$name> {
                check_range(field, raw, 0, Self::MASK as i64, policy).map(|v| $name(v as $inner))
            }
        }
        impl PartialEq<$inner> for $name {
            fn eq(&self, rhs: &$inner) -> bool {
                self.as_int() == *rhs
            }
        }
        impl PartialOrd<$inner> for $name {
            fn partial_cmp(&self, rhs: &$inner) -> Option<std::cmp::Ordering> {
                Some(self.as_int().cmp(rhs))
            }
        }
        impl PartialEq<$name> for $inner {
            fn eq(&self, rhs: &$name) -> bool {
                *self == rhs.as_int()
            }
        }
    };
}
restricted_int! {
    /// A 24-bit integer type, used for tempos.
    ///
    /// Wraps the `u32` type and ensures that the top 8 bits are always zero.
    u24: u32 => 24
}
restricted_int! {
    /// A 14-bit integer type, used for song positions.
    ///
    /// Wraps the `u16` type and ensures that the top two bits are always zero.
    u14: u16 => 14
}
restricted_int! {
    /// A 7-bit integer type.
    ///
    /// Wraps the `u8` type and ensures that the top bit is always zero.
    u7: u8 => 7
}
restricted_int! {
    /// A 4-bit integer type, used for channels and quarter-frame values.
    ///
    /// Wraps the `u8` type and ensures that the top 4 bits are always zero.
    u4: u8 => 4
}
restricted_int! {
    /// A 3-bit integer type, used for quarter-frame types.
    ///
    /// Wraps the `u8` type and ensures that the top 5 bits are always zero.
    u3: u8 => 3
}

impl u14 {
    /// Split into the (least significant, most significant) 7-bit halves, in wire order.
    #[inline]
    pub(crate) fn split(self) -> [u8; 2] {
        [(self.0 & 0x7F) as u8, (self.0 >> 7) as u8]
    }

    #[inline]
    pub(crate) fn join(lsb: u8, msb: u8) -> u14 {
        u14::from_int_lossy((lsb & 0x7F) as u16 | ((msb & 0x7F) as u16) << 7)
    }
}

/// A pitch-wheel value, stored as a signed value in the range
/// `PitchBend::MIN ..= PitchBend::MAX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct PitchBend(i16);
impl PitchBend {
    /// The minimum pitch-bend value, indicating full bend downwards.
    pub const MIN: i16 = -0x2000;
    /// The middle/zero pitch-bend value, indicating no bend.
    pub const MID: i16 = 0;
    /// The maximum pitch-bend value, indicating full bend upwards.
    pub const MAX: i16 = 0x1FFF;

    /// Convert the pitchbend value as an unsigned integer in the range `0..=0x3FFF`, where `0x2000`
    /// is the middle value.
    #[inline]
    pub const fn as_u16(&self) -> u16 {
        self.0.wrapping_sub(Self::MIN) as u16
    }

    /// Cast the pitchbend value as a signed integer in the range `-0x2000..=0x1FFF`.
    #[inline]
    pub const fn as_i16(&self) -> i16 {
        self.0
    }

    /// Cast the pitchbend value as a floating-point value in the range `-1.0 ..= 1.0`.
    #[inline]
    pub fn as_f64(&self) -> f64 {
        self.as_i16() as f64 * (-1. / Self::MIN as f64)
    }

    /// Convert from a 14-bit unsigned integer, where `0x2000` is the middle value.
    #[inline]
    pub const fn from_u14(uint: u14) -> PitchBend {
        Self((uint.0 as i16).wrapping_add(Self::MIN))
    }

    /// Convert from a signed integer, returning `None` if it is out of range.
    #[inline]
    pub fn try_from_i16(int: i16) -> Option<PitchBend> {
        if (Self::MIN..=Self::MAX).contains(&int) {
            Some(Self(int))
        } else {
            None
        }
    }

    /// Convert from a floating-point value in the range `-1.0 ..= 1.0`, saturating outside of it.
    #[inline]
    pub fn from_f64(float: f64) -> PitchBend {
        Self(((float * (-Self::MIN as f64)) as i16).clamp(Self::MIN, Self::MAX))
    }

    pub(crate) fn check(field: &'static str, raw: i64, policy: Policy) -> Result<PitchBend> {
        check_range(field, raw, Self::MIN as i64, Self::MAX as i64, policy)
            .map(|v| PitchBend(v as i16))
    }
}

/// One of the four FPS values available for SMPTE times, as defined by the MIDI standard.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash, Default)]
pub enum Fps {
    /// 24 frames per second.
    #[default]
    Fps24,
    /// 25 frames per second.
    Fps25,
    /// Actually `29.97 = 30 / 1.001` frames per second.
    Fps29,
    /// 30 frames per second.
    Fps30,
}
impl Fps {
    /// Does the conversion from a 2-bit fps code to an `Fps` value.
    #[inline]
    pub(crate) fn from_code(code: u8) -> Fps {
        match code & 0b11 {
            0 => Fps::Fps24,
            1 => Fps::Fps25,
            2 => Fps::Fps29,
            _ => Fps::Fps30,
        }
    }

    /// Does the conversion to a 2-bit fps code.
    #[inline]
    pub(crate) fn as_code(self) -> u8 {
        match self {
            Fps::Fps24 => 0,
            Fps::Fps25 => 1,
            Fps::Fps29 => 2,
            Fps::Fps30 => 3,
        }
    }

    /// Converts an integer representing the semantic fps to an `Fps` value (ie. `24` ->
    /// `Fps24`).
    ///
    /// `29` stands for the drop-frame `29.97` rate.
    #[inline]
    pub fn from_int(raw: u8) -> Option<Fps> {
        Some(match raw {
            24 => Fps::Fps24,
            25 => Fps::Fps25,
            29 => Fps::Fps29,
            30 => Fps::Fps30,
            _ => return None,
        })
    }

    /// Get the integral frame rate, with `29` standing for `29.97`.
    #[inline]
    pub fn as_int(self) -> u8 {
        match self {
            Fps::Fps24 => 24,
            Fps::Fps25 => 25,
            Fps::Fps29 => 29,
            Fps::Fps30 => 30,
        }
    }

    /// Get the actual `f32` fps out.
    #[inline]
    pub fn as_f32(self) -> f32 {
        match self {
            Fps::Fps29 => 30.0 / 1.001,
            other => other.as_int() as f32,
        }
    }
}

/// A timestamp encoding an SMPTE time of the day, as carried by `smpte_offset` meta messages.
///
/// Enforces several guarantees:
///
/// - `hour` is inside [0, 23]
/// - `minute` is inside [0, 59]
/// - `second` is inside [0, 59]
/// - `frame` is inside [0, fps - 1]
/// - `subframe` is inside [0, 99]
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash, Default)]
pub struct SmpteTime {
    hour: u8,
    minute: u8,
    second: u8,
    frame: u8,
    subframe: u8,
    fps: Fps,
}
impl SmpteTime {
    /// Create a new SMPTE timestamp with the given information.
    #[inline]
    pub fn new(
        hour: u8,
        minute: u8,
        second: u8,
        frame: u8,
        subframe: u8,
        fps: Fps,
    ) -> Option<SmpteTime> {
        macro_rules! check {
            ($cond:expr) => {{
                if !{ $cond } {
                    return None;
                }
            }};
        }
        check!(hour < 24);
        check!(minute < 60);
        check!(second < 60);
        check!(frame < fps.as_int());
        check!(subframe < 100);
        Some(SmpteTime {
            hour,
            minute,
            second,
            frame,
            subframe,
            fps,
        })
    }

    #[inline]
    pub fn hour(&self) -> u8 {
        self.hour
    }

    #[inline]
    pub fn minute(&self) -> u8 {
        self.minute
    }

    #[inline]
    pub fn second(&self) -> u8 {
        self.second
    }

    /// The meaning of this value depends on the value of `fps`.
    #[inline]
    pub fn frame(&self) -> u8 {
        self.frame
    }

    /// Hundredths of a frame.
    #[inline]
    pub fn subframe(&self) -> u8 {
        self.subframe
    }

    #[inline]
    pub fn fps(&self) -> Fps {
        self.fps
    }

    /// Convert the second + frame + subframe components of this timestamp into a single
    /// floating-point number of seconds.
    /// Note that this does not include the hour and minute components.
    #[inline]
    pub fn second_f32(&self) -> f32 {
        self.second as f32
            + ((self.frame as f32 + self.subframe as f32 / 100.0) / self.fps.as_f32())
    }

    pub(crate) fn decode(data: &[u8]) -> Option<SmpteTime> {
        match *data {
            [hour_fps, minute, second, frame, subframe] => {
                if hour_fps & 0x80 != 0 {
                    return None;
                }
                let fps = Fps::from_code(hour_fps >> 5);
                SmpteTime::new(hour_fps & 0x1F, minute, second, frame, subframe, fps)
            }
            _ => None,
        }
    }

    pub(crate) fn encode(&self) -> [u8; 5] {
        [
            self.hour | self.fps.as_code() << 5,
            self.minute,
            self.second,
            self.frame,
            self.subframe,
        ]
    }
}

/// Write a varlen-prefixed slice: the length as a big-endian base-128 integer, then the bytes.
pub(crate) fn write_varlen_slice(slice: &[u8], out: &mut Vec<u8>) {
    let len = slice.len() as u64;
    let mut skipping = true;
    for i in (0..5).rev() {
        let byte = ((len >> (i * 7)) & 0x7F) as u8;
        if skipping && byte == 0 && i != 0 {
            //Skip these leading zeros
        } else {
            skipping = false;
            out.push(if i == 0 { byte } else { byte | 0x80 });
        }
    }
    out.extend_from_slice(slice);
}

/// Reads a varlen length followed by exactly that many bytes, which must be the whole input.
pub(crate) fn read_varlen_slice(mut raw: &[u8]) -> Result<&[u8]> {
    let mut len: u64 = 0;
    for i in 0.. {
        ensure!(i < 4, err_parse!("varlen integer larger than 4 bytes"));
        let (&byte, rest) = raw
            .split_first()
            .ok_or(err_parse!("unexpected end while reading varlen length"))?;
        raw = rest;
        len = len << 7 | (byte & 0x7F) as u64;
        if byte & 0x80 == 0 {
            break;
        }
    }
    ensure!(
        raw.len() as u64 == len,
        err_parse!("meta payload does not match its declared length")
    );
    Ok(raw)
}
