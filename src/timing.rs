//! Conversions between ticks and seconds, and chronological merging of tracks.
//!
//! Tracks are sequences of messages whose `time` is a delta in ticks from the previous message
//! of the same track. The conversion functions are pure arithmetic; tempo changes are tracked by
//! [`TimedIter`](struct.TimedIter.html) or by the caller.

use crate::{
    message::{Message, MessageType, MidiMessage},
    prelude::*,
};

/// The tempo in effect when a track does not set one: 500000 microseconds per beat, that is,
/// 120 beats per minute.
pub const DEFAULT_TEMPO: u32 = 500_000;

/// Above this many messages in total, `merge_tracks` accumulates per-track times in parallel.
#[cfg(feature = "parallel")]
const PARALLEL_ENABLE_THRESHOLD: usize = 16 * 1024;

/// Convert a tick count to seconds at the given resolution and tempo (microseconds per beat).
///
/// `ticks_per_beat` must be non-zero.
#[inline]
pub fn ticks_to_seconds(ticks: f64, ticks_per_beat: u16, tempo: u32) -> f64 {
    ticks * tempo as f64 / (ticks_per_beat as f64 * 1_000_000.0)
}

/// Convert seconds to the nearest tick count at the given resolution and tempo.
///
/// Ties round half away from zero. This is not an exact inverse of `ticks_to_seconds` for
/// fractional tick counts.
#[inline]
pub fn seconds_to_ticks(seconds: f64, ticks_per_beat: u16, tempo: u32) -> i64 {
    (seconds * ticks_per_beat as f64 * 1_000_000.0 / tempo as f64).round() as i64
}

/// Convert beats per minute to a tempo in microseconds per beat.
///
/// The beat is the denominator of the given `(numerator, denominator)` time signature, so that
/// `bpm_to_tempo(120.0, (4, 4)) == 500000` while `bpm_to_tempo(120.0, (6, 8)) == 1000000`.
pub fn bpm_to_tempo(bpm: f64, time_signature: (u8, u8)) -> u32 {
    (60_000_000.0 / bpm * time_signature.1 as f64 / 4.0).round() as u32
}

/// Convert a tempo in microseconds per beat to beats per minute, relative to the time
/// signature's denominator.
pub fn tempo_to_bpm(tempo: u32, time_signature: (u8, u8)) -> f64 {
    60_000_000.0 / tempo as f64 * time_signature.1 as f64 / 4.0
}

/// The timing context of a track: its resolution and the tempo currently in effect.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct TempoMap {
    ticks_per_beat: u16,
    tempo: u32,
}
impl TempoMap {
    /// Create a timing context at the default tempo.
    pub fn new(ticks_per_beat: u16) -> Result<TempoMap> {
        ensure!(
            ticks_per_beat > 0,
            Error::Validation {
                field: "ticks_per_beat",
                value: 0,
                min: 1,
                max: u16::MAX as i64,
            }
        );
        Ok(TempoMap {
            ticks_per_beat,
            tempo: DEFAULT_TEMPO,
        })
    }

    /// The same context with another tempo.
    pub fn with_tempo(self, tempo: u32) -> Result<TempoMap> {
        let tempo = crate::primitive::check_range(
            "tempo",
            tempo as i64,
            1,
            u24::max_value().as_int() as i64,
            Policy::Strict,
        )?;
        Ok(TempoMap {
            tempo: tempo as u32,
            ..self
        })
    }

    #[inline]
    pub fn ticks_per_beat(&self) -> u16 {
        self.ticks_per_beat
    }

    #[inline]
    pub fn tempo(&self) -> u32 {
        self.tempo
    }

    #[inline]
    pub fn ticks_to_seconds(&self, ticks: f64) -> f64 {
        ticks_to_seconds(ticks, self.ticks_per_beat, self.tempo)
    }

    #[inline]
    pub fn seconds_to_ticks(&self, seconds: f64) -> i64 {
        seconds_to_ticks(seconds, self.ticks_per_beat, self.tempo)
    }
}

fn absolute_times(track: &[Message]) -> Vec<f64> {
    let mut now = 0.0;
    track
        .iter()
        .map(|msg| {
            now += msg.time();
            now
        })
        .collect()
}

#[cfg_attr(not(feature = "parallel"), allow(unused_variables))]
fn all_absolute_times<T>(tracks: &[T], total: usize) -> Vec<Vec<f64>>
where
    T: AsRef<[Message]> + Sync,
{
    #[cfg(feature = "parallel")]
    {
        if total >= PARALLEL_ENABLE_THRESHOLD {
            use rayon::prelude::*;

            return tracks
                .par_iter()
                .map(|track| absolute_times(track.as_ref()))
                .collect();
        }
    }
    tracks
        .iter()
        .map(|track| absolute_times(track.as_ref()))
        .collect()
}

/// Merge several delta-timed tracks into a single delta-timed track in chronological order.
///
/// Messages at equal absolute times keep their relative order within a track, and across tracks
/// the earlier track goes first. The input tracks are not modified.
pub fn merge_tracks<T>(tracks: &[T]) -> Vec<Message>
where
    T: AsRef<[Message]> + Sync,
{
    let total: usize = tracks.iter().map(|track| track.as_ref().len()).sum();
    let times = all_absolute_times(tracks, total);

    let mut timeline: Vec<(f64, &Message)> = Vec::with_capacity(total);
    for (track, times) in tracks.iter().zip(&times) {
        timeline.extend(times.iter().copied().zip(track.as_ref()));
    }
    // `sort_by` is stable, which gives the tie-break
    timeline.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut last = 0.0;
    timeline
        .into_iter()
        .map(|(abs, msg)| {
            let mut msg = msg.clone();
            msg.set_time_unchecked(abs - last);
            last = abs;
            msg
        })
        .collect()
}

/// Remove every `end_of_track` from a track, carrying their delta times over to the following
/// message, and append a single `end_of_track` at the very end.
pub fn fix_end_of_track(track: &[Message]) -> Vec<Message> {
    let mut out = Vec::with_capacity(track.len() + 1);
    let mut carried = 0.0;
    for msg in track {
        if msg.kind() == MessageType::EndOfTrack {
            carried += msg.time();
        } else {
            let mut msg = msg.clone();
            if carried != 0.0 {
                msg.set_time_unchecked(carried + msg.time());
                carried = 0.0;
            }
            out.push(msg);
        }
    }
    let mut end = Message::from_midi(MidiMessage::EndOfTrack);
    end.set_time_unchecked(carried);
    out.push(end);
    out
}

/// Converts a delta-tick track into a delta-seconds track, following `set_tempo` messages.
///
/// A tempo change applies to the messages after it.
#[derive(Clone, Debug)]
pub struct TimedIter<I> {
    inner: I,
    map: TempoMap,
}
impl<I: Iterator<Item = Message>> TimedIter<I> {
    pub fn new<T>(track: T, map: TempoMap) -> TimedIter<I>
    where
        T: IntoIterator<IntoIter = I>,
    {
        TimedIter {
            inner: track.into_iter(),
            map,
        }
    }

    /// The timing context that applies to the next message.
    #[inline]
    pub fn tempo_map(&self) -> TempoMap {
        self.map
    }
}
impl<I: Iterator<Item = Message>> Iterator for TimedIter<I> {
    type Item = Message;
    fn next(&mut self) -> Option<Message> {
        let mut msg = self.inner.next()?;
        let seconds = if msg.time() > 0.0 {
            self.map.ticks_to_seconds(msg.time())
        } else {
            0.0
        };
        msg.set_time_unchecked(seconds);
        if let MidiMessage::SetTempo { tempo } = msg.midi() {
            if tempo.as_int() > 0 {
                self.map.tempo = tempo.as_int();
            }
        }
        Some(msg)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

/// The total playing time in seconds of a set of delta-tick tracks.
pub fn total_seconds<T>(tracks: &[T], map: TempoMap) -> f64
where
    T: AsRef<[Message]> + Sync,
{
    TimedIter::new(merge_tracks(tracks), map)
        .map(|msg| msg.time())
        .sum()
}
