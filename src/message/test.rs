use super::*;
use crate::{ErrorKind, Fps, PitchBend};
use proptest::prelude::*;
use std::collections::HashSet;

fn note_on(channel: i64, note: i64, velocity: i64) -> Message {
    Message::build(
        MessageType::NoteOn,
        &[
            (Attr::Channel, channel),
            (Attr::Note, note),
            (Attr::Velocity, velocity),
        ],
    )
    .unwrap()
}

#[test]
fn defaults() {
    let msg = Message::new(MessageType::NoteOn);
    assert_eq!(msg.get(Attr::Channel), Some(0));
    assert_eq!(msg.get(Attr::Note), Some(0));
    assert_eq!(msg.get(Attr::Velocity), Some(64));
    assert_eq!(msg.time(), 0.0);
    assert_eq!(Message::new(MessageType::SetTempo).get(Attr::Tempo), Some(500_000));
    let sig = Message::new(MessageType::TimeSignature);
    assert_eq!(sig.get(Attr::Numerator), Some(4));
    assert_eq!(sig.get(Attr::Denominator), Some(4));
    assert_eq!(Message::new(MessageType::KeySignature).key(), Some(Key::C));
}

#[test]
fn strict_validation() {
    let err = Message::build(MessageType::NoteOn, &[(Attr::Note, 128)]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(err.to_string(), "note must be in range 0..=127, got 128");

    let err = Message::build(MessageType::ControlChange, &[(Attr::Channel, 16)]).unwrap_err();
    assert!(matches!(err, Error::Validation { field: "channel", .. }));

    assert!(Message::build(MessageType::PitchWheel, &[(Attr::Pitch, 8192)]).is_err());
    assert!(Message::build(MessageType::PitchWheel, &[(Attr::Pitch, -8192)]).is_ok());
    assert!(Message::build(MessageType::SongPosition, &[(Attr::Pos, 16384)]).is_err());
    assert!(Message::build(MessageType::SetTempo, &[(Attr::Tempo, 1 << 24)]).is_err());
    assert!(Message::build(MessageType::QuarterFrame, &[(Attr::FrameType, 8)]).is_err());
}

#[test]
fn clip_policy() {
    let msg = Message::build_with(
        MessageType::NoteOn,
        &[(Attr::Note, 200), (Attr::Velocity, -5), (Attr::Channel, 99)],
        Policy::Clip,
    )
    .unwrap();
    assert_eq!(msg.to_bytes(), [0x9F, 127, 0]);

    let msg = Message::build_with(MessageType::PitchWheel, &[(Attr::Pitch, -9000)], Policy::Clip)
        .unwrap();
    assert_eq!(msg.get(Attr::Pitch), Some(PitchBend::MIN as i64));

    let mut sig = Message::new(MessageType::TimeSignature);
    assert!(sig.set(Attr::Denominator, 6).is_err());
    sig.set_with(Attr::Denominator, 6, Policy::Clip).unwrap();
    assert_eq!(sig.get(Attr::Denominator), Some(4));
    sig.set_with(Attr::Denominator, 1000, Policy::Clip).unwrap();
    assert_eq!(sig.get(Attr::Denominator), Some(128));
}

#[test]
fn missing_attributes() {
    let mut msg = Message::new(MessageType::Clock);
    assert_eq!(msg.get(Attr::Channel), None);
    let err = msg.set(Attr::Channel, 1).unwrap_err();
    assert!(matches!(err, Error::InvalidValue { field: "channel", .. }));
    assert!(msg.set_data(&[1]).is_err());
    assert!(msg.set_key(Key::C).is_err());
}

#[test]
fn failed_mutation_leaves_message_intact() {
    let mut msg = note_on(2, 60, 100);
    assert!(msg.set(Attr::Velocity, 128).is_err());
    assert_eq!(msg, note_on(2, 60, 100));
    assert!(msg.set_time(f64::NAN).is_err());
    assert!(msg.set_time(f64::INFINITY).is_err());
    assert_eq!(msg.time(), 0.0);
}

#[test]
fn copy_with_overrides() {
    let msg = note_on(0, 60, 64);
    let copy = msg.copy(&[(Attr::Note, 62), (Attr::Channel, 9)]).unwrap();
    assert_eq!(copy.get(Attr::Note), Some(62));
    assert_eq!(copy.get(Attr::Channel), Some(9));
    assert_eq!(copy.get(Attr::Velocity), Some(64));
    assert_eq!(msg.get(Attr::Note), Some(60));

    assert!(msg.copy(&[(Attr::Note, 62), (Attr::Note, 300)]).is_err());
    assert_eq!(msg.get(Attr::Note), Some(60));
    let clipped = msg.copy_with(&[(Attr::Note, 300)], Policy::Clip).unwrap();
    assert_eq!(clipped.get(Attr::Note), Some(127));
}

#[test]
fn channel_encoding() {
    assert_eq!(note_on(3, 60, 64).to_bytes(), [0x93, 0x3C, 0x40]);
    assert_eq!(note_on(3, 60, 64).to_hex(), "93 3C 40");
    let pitch = |value| {
        Message::build(MessageType::PitchWheel, &[(Attr::Pitch, value)])
            .unwrap()
            .to_bytes()
    };
    assert_eq!(pitch(0), [0xE0, 0x00, 0x40]);
    assert_eq!(pitch(-8192), [0xE0, 0x00, 0x00]);
    assert_eq!(pitch(8191), [0xE0, 0x7F, 0x7F]);
    let program = Message::build(MessageType::ProgramChange, &[(Attr::Program, 5)]).unwrap();
    assert_eq!(program.to_bytes(), [0xC0, 5]);
    assert_eq!(program.len(), 2);
}

#[test]
fn system_encoding() {
    let qf = Message::build(
        MessageType::QuarterFrame,
        &[(Attr::FrameType, 3), (Attr::FrameValue, 5)],
    )
    .unwrap();
    assert_eq!(qf.to_bytes(), [0xF1, 0x35]);
    let pos = Message::build(MessageType::SongPosition, &[(Attr::Pos, 1000)]).unwrap();
    assert_eq!(pos.to_bytes(), [0xF2, 0x68, 0x07]);
    assert_eq!(Message::new(MessageType::Clock).to_bytes(), [0xF8]);

    let mut sysex = Message::new(MessageType::SysEx);
    sysex.set_data(&[1, 2, 3]).unwrap();
    assert_eq!(sysex.to_bytes(), [0xF0, 1, 2, 3, 0xF7]);
    assert!(sysex.set_data(&[0x80]).is_err());
    assert_eq!(sysex.data(), Some(&[1, 2, 3][..]));
}

#[test]
fn meta_encoding() {
    let tempo = Message::new(MessageType::SetTempo);
    assert_eq!(tempo.to_bytes(), [0xFF, 0x51, 0x03, 0x07, 0xA1, 0x20]);
    assert_eq!(Message::from_bytes(&tempo.to_bytes()).unwrap(), tempo);
    assert_eq!(
        Message::new(MessageType::EndOfTrack).to_bytes(),
        [0xFF, 0x2F, 0x00]
    );
    assert_eq!(
        Message::new(MessageType::TimeSignature).to_bytes(),
        [0xFF, 0x58, 0x04, 0x04, 0x02, 0x18, 0x08]
    );

    let mut key = Message::new(MessageType::KeySignature);
    key.set_key("Bbm".parse().unwrap()).unwrap();
    assert_eq!(key.to_bytes(), [0xFF, 0x59, 0x02, 0xFB, 0x01]);

    let mut smpte = Message::new(MessageType::SmpteOffset);
    smpte.set(Attr::FrameRate, 30).unwrap();
    smpte.set(Attr::Hours, 1).unwrap();
    smpte.set(Attr::Frames, 29).unwrap();
    assert!(smpte.set(Attr::FrameRate, 27).is_err());
    assert_eq!(smpte.to_bytes(), [0xFF, 0x54, 0x05, 0x61, 0, 0, 29, 0]);
    // Lowering the frame rate would invalidate the frame count
    assert!(smpte.set(Attr::FrameRate, 24).is_err());
    smpte.set_with(Attr::FrameRate, 24, Policy::Clip).unwrap();
    assert_eq!(smpte.get(Attr::Frames), Some(23));
}

#[test]
fn malformed_meta_stays_lossless() {
    // A tempo with the wrong payload length
    let raw = [0xFF, 0x51, 0x02, 0x07, 0xA1];
    let msg = Message::from_bytes(&raw).unwrap();
    assert_eq!(msg.kind(), MessageType::UnknownMeta);
    assert_eq!(msg.to_bytes(), raw);
    assert!(msg.is_meta());
}

#[test]
fn unknown_messages_stay_unknown() {
    let kind = |text: &str| text.parse::<Message>().unwrap_err().kind();
    assert_eq!(kind("unknown status=244 data=(1)"), ErrorKind::Validation);
    assert_eq!(kind("unknown status=0"), ErrorKind::Validation);
    assert_eq!(kind("unknown status=144"), ErrorKind::Validation);
    assert_eq!(kind("unknown_meta type_byte=81 data=(7,161,32)"), ErrorKind::Validation);
    assert_eq!(kind("unknown_meta type_byte=200"), ErrorKind::Validation);
    assert_eq!(kind("note_on status=244"), ErrorKind::Parse);

    let mut unknown = Message::new(MessageType::Unknown);
    assert!(unknown.set_data(&[0x90, 0xFF]).is_err());
    assert_eq!(unknown.to_bytes(), [0xF4]);
    unknown.set_data_with(&[1, 2], Policy::Clip).unwrap();
    assert_eq!(unknown.to_bytes(), [0xF4]);
    assert!(unknown.set_unknown(0xF8, &[]).is_err());
    unknown.set_unknown(0xF5, &[]).unwrap();
    assert_eq!(Message::from_bytes(&unknown.to_bytes()).unwrap(), unknown);

    let mut meta = Message::new(MessageType::UnknownMeta);
    assert!(meta.set_unknown(0x51, &[7, 161, 32]).is_err());
    assert!(meta.set_unknown(0x01, &[]).is_err());
    meta.set_unknown(0x51, &[7, 161]).unwrap();
    // Completing the tempo would change the kind
    assert!(meta.set_data(&[7, 161, 32]).is_err());
    assert_eq!(meta.data(), Some(&[7, 161][..]));
    assert_eq!(Message::from_bytes(&meta.to_bytes()).unwrap(), meta);

    let err = Message::with_time(
        MidiMessage::Unknown {
            status: 0x90,
            data: vec![60, 64],
        },
        0.0,
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(Message::try_from(MidiMessage::UnknownMeta {
        type_byte: 0x2F,
        data: Vec::new(),
    })
    .is_err());
}

#[test]
fn decoding_errors() {
    let parse_err = |bytes: &[u8]| Message::from_bytes(bytes).unwrap_err().kind();
    assert_eq!(parse_err(&[]), ErrorKind::Parse);
    assert_eq!(parse_err(&[0x90, 60]), ErrorKind::Parse);
    assert_eq!(parse_err(&[0x90, 60, 64, 0]), ErrorKind::Parse);
    assert_eq!(parse_err(&[0x3C]), ErrorKind::Parse);
    assert_eq!(parse_err(&[0x90, 0x80, 64]), ErrorKind::Parse);
    assert_eq!(parse_err(&[0xF7]), ErrorKind::Parse);
    assert_eq!(parse_err(&[0xF0, 1, 2]), ErrorKind::Parse);
    assert_eq!(parse_err(&[0xFF, 0x51, 0x05, 0, 0, 0]), ErrorKind::Parse);
    assert_eq!(parse_err(&[0xFF, 0x90, 0x00]), ErrorKind::Parse);
    assert_eq!(
        Message::from_bytes(&[0xFF]).unwrap().kind(),
        MessageType::Reset
    );
    assert_eq!(Message::from_hex("90 3c 40").unwrap(), note_on(0, 60, 64));
    assert_eq!(Message::from_hex("90 zz 40").unwrap_err().kind(), ErrorKind::Parse);
}

#[test]
fn classification() {
    let cc = Message::build(MessageType::ControlChange, &[(Attr::Control, 7)]).unwrap();
    assert_eq!(cc.class(), MessageClass::Channel);
    assert!(cc.is_cc(None));
    assert!(cc.is_cc(Some(7)));
    assert!(!cc.is_cc(Some(64)));
    assert!(!note_on(0, 60, 64).is_cc(None));
    assert!(Message::new(MessageType::Stop).is_realtime());
    assert_eq!(
        Message::new(MessageType::SongSelect).class(),
        MessageClass::SystemCommon
    );
    assert!(Message::new(MessageType::Marker).is_meta());
    assert!(MessageType::Lyrics.is_meta());
    assert!(!MessageType::SysEx.is_meta());
}

#[test]
fn freeze_and_thaw() {
    let msg = note_on(0, 60, 64);
    let frozen = msg.freeze();
    assert_eq!(frozen, msg);
    assert_eq!(frozen.get(Attr::Note), Some(60));

    let mut thawed = frozen.thaw();
    thawed.set(Attr::Note, 61).unwrap();
    assert_eq!(frozen.get(Attr::Note), Some(60));
    assert_eq!(msg.get(Attr::Note), Some(60));

    let mut set = HashSet::new();
    set.insert(frozen.clone());
    set.insert(msg.freeze());
    set.insert(thawed.freeze());
    assert_eq!(set.len(), 2);
    assert!(set.contains(&frozen));
}

#[test]
fn frozen_negative_zero() {
    let a = Message::with_time(MidiMessage::Clock, 0.0).unwrap().freeze();
    let b = Message::with_time(MidiMessage::Clock, -0.0).unwrap().freeze();
    assert_eq!(a, b);
    let set: HashSet<_> = [a, b].into_iter().collect();
    assert_eq!(set.len(), 1);
}

#[test]
fn text_format() {
    let mut msg = note_on(1, 60, 100);
    msg.set_time(0.5).unwrap();
    let text = msg.to_string();
    assert_eq!(text, "note_on channel=1 note=60 velocity=100 time=0.5");
    assert_eq!(text.parse::<Message>().unwrap(), msg);

    let mut sysex = Message::new(MessageType::SysEx);
    sysex.set_data(&[1, 2, 3]).unwrap();
    assert_eq!(sysex.to_string(), "sysex data=(1,2,3) time=0");
    assert_eq!("sysex data=(1,2,3) time=0".parse::<Message>().unwrap(), sysex);

    let key: Message = "key_signature key=F#m time=0".parse().unwrap();
    assert_eq!(key.to_bytes(), [0xFF, 0x59, 0x02, 0x03, 0x01]);
    assert_eq!(key.to_string(), "key_signature key=F#m time=0");

    let unknown: Message = "unknown status=253 time=0".parse().unwrap();
    assert_eq!(unknown.to_bytes(), [0xFD]);
    assert_eq!(unknown.to_string(), "unknown status=253 time=0");

    // The type byte only makes sense together with the data that follows it
    let raw = [0xFF, 0x2F, 0x01, 0x05];
    let odd_end = Message::from_bytes(&raw).unwrap();
    assert_eq!(odd_end.to_string(), "unknown_meta type_byte=47 data=(5) time=0");
    let parsed: Message = odd_end.to_string().parse().unwrap();
    assert_eq!(parsed.to_bytes(), raw);

    let mut name = Message::new(MessageType::TrackName);
    name.set_data(b"Piano").unwrap();
    assert_eq!(name.to_string(), "track_name name=\"Piano\" time=0");
}

#[test]
fn text_format_errors() {
    let kind = |text: &str| text.parse::<Message>().unwrap_err().kind();
    assert_eq!(kind(""), ErrorKind::Parse);
    assert_eq!(kind("note_on note"), ErrorKind::Parse);
    assert_eq!(kind("note_on pitch=3"), ErrorKind::Validation);
    assert_eq!(kind("note_on note=128"), ErrorKind::Validation);
    assert_eq!(kind("note_on bogus=1"), ErrorKind::Parse);
    assert_eq!(kind("no_such_type"), ErrorKind::Validation);
    assert_eq!(kind("note_on time=nan"), ErrorKind::Validation);
}

#[test]
fn keys() {
    assert_eq!("C".parse::<Key>().unwrap(), Key::C);
    let key: Key = "Eb".parse().unwrap();
    assert_eq!(key.sharps(), -3);
    assert!(!key.is_minor());
    assert_eq!(Key::new(7, true).unwrap().to_string(), "A#m");
    assert_eq!(Key::new(-7, false).unwrap().as_str(), "Cb");
    assert!(Key::new(8, false).is_none());
    assert!("H".parse::<Key>().is_err());
}

#[test]
fn text_decoding() {
    let mut msg = Message::new(MessageType::Lyrics);
    msg.set_data(&[b'c', b'a', b'f', 0xE9]).unwrap();
    assert_eq!(msg.decode_text(&Latin1).unwrap(), "café");
    assert_eq!(msg.decode_text(&Utf8Lossy).unwrap(), "caf\u{FFFD}");
    let upper = |bytes: &[u8]| String::from_utf8_lossy(bytes).to_uppercase();
    assert_eq!(msg.decode_text(&upper).unwrap(), "CAF\u{FFFD}");
    assert_eq!(note_on(0, 60, 64).decode_text(&Latin1), None);
}

#[test]
fn smpte_time() {
    assert!(crate::SmpteTime::new(23, 59, 59, 29, 99, Fps::Fps30).is_some());
    assert!(crate::SmpteTime::new(24, 0, 0, 0, 0, Fps::Fps30).is_none());
    assert!(crate::SmpteTime::new(0, 0, 0, 24, 0, Fps::Fps24).is_none());

    // The top bit of the hour byte is reserved
    let raw = [0xFF, 0x54, 0x05, 0x80, 0, 0, 0, 0];
    let msg = Message::from_bytes(&raw).unwrap();
    assert_eq!(msg.kind(), MessageType::UnknownMeta);
    assert_eq!(msg.to_bytes(), raw);
    let msg = Message::from_bytes(&[0xFF, 0x54, 0x05, 0x61, 0, 0, 29, 0]).unwrap();
    assert_eq!(msg.get(Attr::FrameRate), Some(30));
    assert_eq!(msg.get(Attr::Hours), Some(1));
}

#[test]
fn type_names() {
    for name in ["note_off", "polytouch", "pitchwheel", "songpos", "sysex", "end_of_track"] {
        let ty: MessageType = name.parse().unwrap();
        assert_eq!(ty.to_string(), name);
    }
    assert_eq!(Attr::from_name("sub_frames"), Some(Attr::SubFrames));
    assert_eq!(Attr::from_name("nope"), None);
}

proptest! {
    #[test]
    fn channel_messages_survive_decoding(status in 0x80u8..0xF0, d1 in 0u8..0x80, d2 in 0u8..0x80) {
        let bytes = if (0xC0..0xE0).contains(&status) {
            vec![status, d1]
        } else {
            vec![status, d1, d2]
        };
        let msg = Message::from_bytes(&bytes).unwrap();
        prop_assert_eq!(msg.class(), MessageClass::Channel);
        prop_assert_eq!(msg.to_bytes(), bytes);
    }

    #[test]
    fn every_message_type_survives_decoding(
        ty in prop::sample::select(MessageType::all().to_vec()),
        values in prop::collection::vec(any::<i64>(), 6),
        data in prop::collection::vec(any::<u8>(), 0..8),
        head in any::<u8>(),
        sharps in -7i8..=7,
        minor in any::<bool>(),
    ) {
        let mut msg = Message::new(ty);
        for (&attr, &value) in ty.attrs().iter().zip(&values) {
            msg.set_with(attr, value, Policy::Clip).unwrap();
        }
        match ty {
            MessageType::Unknown => {
                let status = [0xF4, 0xF5, 0xF9, 0xFD][head as usize % 4];
                msg.set_unknown(status, &[]).unwrap();
            }
            MessageType::UnknownMeta => {
                // Pairs that decode as a recognized meta message are refused
                let _ = msg.set_unknown(head & 0x7F, &data);
            }
            MessageType::KeySignature => msg.set_key(Key::new(sharps, minor).unwrap()).unwrap(),
            _ if msg.data().is_some() => msg.set_data_with(&data, Policy::Clip).unwrap(),
            _ => {}
        }
        prop_assert_eq!(msg.kind(), ty);
        prop_assert_eq!(Message::from_bytes(&msg.to_bytes()).unwrap(), msg);
    }

    #[test]
    fn clipping_always_lands_in_range(value in any::<i64>()) {
        let msg = Message::build_with(
            MessageType::PitchWheel,
            &[(Attr::Pitch, value), (Attr::Channel, value)],
            Policy::Clip,
        ).unwrap();
        let pitch = msg.get(Attr::Pitch).unwrap();
        prop_assert!((-8192..=8191).contains(&pitch));
        prop_assert!((0..=15).contains(&msg.get(Attr::Channel).unwrap()));
    }
}
