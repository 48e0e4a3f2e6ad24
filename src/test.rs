use crate::{
    message::{Message, MessageType, MidiMessage},
    num::{u4, u7},
    parse, parse_all, Attr, Parser, ParserConfig,
};

/// Shorthand for building a message out of attributes, with a time in ticks.
macro_rules! msg {
    ($ty:ident $(, $attr:ident = $val:expr)* ; $time:expr) => {{
        let mut msg = Message::build(MessageType::$ty, &[$((Attr::$attr, $val)),*]).unwrap();
        msg.set_time($time as f64).unwrap();
        msg
    }};
}

fn kinds(msgs: &[Message]) -> Vec<MessageType> {
    msgs.iter().map(|msg| msg.kind()).collect()
}

fn note_on(note: u8, velocity: u8) -> MidiMessage {
    MidiMessage::NoteOn {
        channel: u4::from_int_lossy(0),
        note: u7::from_int_lossy(note),
        velocity: u7::from_int_lossy(velocity),
    }
}

mod parser {
    use super::*;

    fn run(bytes: &[u8]) -> Vec<MidiMessage> {
        parse_all(bytes).into_iter().map(Message::into_midi).collect()
    }

    #[test]
    fn running_status() {
        assert_eq!(
            run(&[0x90, 60, 64, 62, 64, 64, 0]),
            [note_on(60, 64), note_on(62, 64), note_on(64, 0)]
        );
    }

    #[test]
    fn incomplete_message_is_held_back() {
        let mut parser = Parser::new();
        parser.feed(&[0x90, 60]);
        assert_eq!(parser.pending(), 0);
        assert!(parser.pull().is_none());
        parser.feed(&[64]);
        assert_eq!(parser.pending(), 1);
        assert_eq!(parser.pull().unwrap().into_midi(), note_on(60, 64));
        assert_eq!(parser.pending(), 0);
    }

    #[test]
    fn realtime_interleaves_without_disturbing() {
        assert_eq!(
            run(&[0x90, 0xF8, 60, 0xFA, 64, 62, 0xFC, 64]),
            [
                MidiMessage::Clock,
                MidiMessage::Start,
                note_on(60, 64),
                MidiMessage::Stop,
                note_on(62, 64),
            ]
        );
    }

    #[test]
    fn sysex_with_realtime_inside() {
        let msgs = run(&[0xF0, 1, 2, 0xF8, 3, 0xF7]);
        assert_eq!(msgs.len(), 2);
        assert_eq!(msgs[0], MidiMessage::Clock);
        assert_eq!(msgs[1].data(), Some(&[1, 2, 3][..]));
    }

    #[test]
    fn sysex_truncated_by_status() {
        assert_eq!(run(&[0xF0, 1, 2, 0x90, 60, 64]), [note_on(60, 64)]);
        assert_eq!(run(&[0xF0, 1, 2, 0xF0, 3, 0xF7]).len(), 1);
    }

    #[test]
    fn oversized_sysex_is_dropped() {
        let mut parser = Parser::with_config(ParserConfig::default().with_max_sysex_len(4));
        parser.feed(&[0xF0, 1, 2, 3, 4, 0xF7]);
        assert_eq!(parser.pull().unwrap().data(), Some(&[1, 2, 3, 4][..]));
        parser.feed(&[0xF0, 1, 2, 3, 4, 5, 6, 0xF7, 0xF8]);
        assert_eq!(kinds(&parser.drain().collect::<Vec<_>>()), [MessageType::Clock]);
    }

    #[test]
    fn stray_bytes_are_discarded() {
        assert!(run(&[60, 64, 0xF7, 10]).is_empty());
    }

    #[test]
    fn single_byte_common_inside_message() {
        assert_eq!(
            run(&[0x90, 60, 0xF6, 64]),
            [MidiMessage::TuneRequest, note_on(60, 64)]
        );
    }

    #[test]
    fn undefined_status_bytes() {
        let msgs = parse_all(&[0xF4, 0xF9, 0xFD]);
        assert_eq!(
            kinds(&msgs),
            [MessageType::Unknown, MessageType::Unknown, MessageType::Unknown]
        );
        assert!(!msgs[0].is_realtime());
        assert!(msgs[1].is_realtime());
        assert_eq!(msgs[2].to_bytes(), [0xFD]);
    }

    #[test]
    fn system_common_messages() {
        let msgs = parse_all(&[0xF1, 0x35, 0xF2, 0x68, 0x07, 0xF3, 5]);
        assert_eq!(msgs[0].get(Attr::FrameType), Some(3));
        assert_eq!(msgs[0].get(Attr::FrameValue), Some(5));
        assert_eq!(msgs[1].get(Attr::Pos), Some(1000));
        assert_eq!(msgs[2].get(Attr::Song), Some(5));
    }

    #[test]
    fn pitchwheel_decoding() {
        let msgs = parse_all(&[0xE0, 0, 0x40, 0xE0, 0, 0, 0xE0, 0x7F, 0x7F]);
        let pitches: Vec<_> = msgs.iter().map(|msg| msg.get(Attr::Pitch)).collect();
        assert_eq!(pitches, [Some(0), Some(-8192), Some(8191)]);
    }

    #[test]
    fn chunking_does_not_matter() {
        let stream = [
            0xB1, 7, 100, 0xF8, 10, 20, 0xF0, 0x41, 0x10, 0xF7, 0xC2, 5, 6, 0xE3, 0, 0x40, 0xFE,
        ];
        let whole = parse_all(&stream);
        assert_eq!(whole.len(), 8);
        for chunk in 1..stream.len() {
            let mut parser = Parser::new();
            for piece in stream.chunks(chunk) {
                parser.feed(piece);
            }
            assert_eq!(parser.drain().collect::<Vec<_>>(), whole, "chunk size {}", chunk);
        }
    }

    #[test]
    fn reset_forgets_everything() {
        let mut parser = Parser::new();
        parser.feed(&[0x90, 60, 64, 0x90, 62]);
        assert_eq!(parser.pending(), 1);
        parser.reset();
        assert_eq!(parser.pending(), 0);
        parser.feed(&[64, 64]);
        assert_eq!(parser.pending(), 0);
    }

    #[test]
    fn parse_first() {
        assert_eq!(parse(&[0x90, 60]), None);
        assert_eq!(parse(&[0x90, 60, 64, 0x80, 60, 0]).unwrap().into_midi(), note_on(60, 64));
    }
}

mod timing {
    use super::*;
    use crate::timing::{
        bpm_to_tempo, fix_end_of_track, merge_tracks, seconds_to_ticks, tempo_to_bpm,
        ticks_to_seconds, total_seconds, TempoMap, TimedIter, DEFAULT_TEMPO,
    };
    use crate::ErrorKind;
    use approx::assert_relative_eq;

    fn times(track: &[Message]) -> Vec<f64> {
        track.iter().map(|msg| msg.time()).collect()
    }

    #[test]
    fn tick_conversion() {
        assert_relative_eq!(ticks_to_seconds(480.0, 480, DEFAULT_TEMPO), 0.5);
        assert_relative_eq!(ticks_to_seconds(0.0, 96, 1), 0.0);
        assert_relative_eq!(ticks_to_seconds(96.0, 96, 1_000_000), 1.0);
        assert_eq!(seconds_to_ticks(0.5, 480, DEFAULT_TEMPO), 480);
        assert_eq!(seconds_to_ticks(1.0, 96, 250_000), 384);
        for ticks in [0, 1, 7, 479, 480, 12345] {
            let seconds = ticks_to_seconds(ticks as f64, 480, 612_345);
            assert_eq!(seconds_to_ticks(seconds, 480, 612_345), ticks);
        }
    }

    #[test]
    fn bpm_conversion() {
        assert_eq!(bpm_to_tempo(120.0, (4, 4)), 500_000);
        assert_eq!(bpm_to_tempo(120.0, (6, 8)), 1_000_000);
        assert_relative_eq!(tempo_to_bpm(500_000, (4, 4)), 120.0);
        assert_relative_eq!(tempo_to_bpm(bpm_to_tempo(93.0, (3, 4)), (3, 4)), 93.0, epsilon = 1e-3);
    }

    #[test]
    fn tempo_map_validation() {
        assert_eq!(TempoMap::new(0).unwrap_err().kind(), ErrorKind::Validation);
        let map = TempoMap::new(480).unwrap();
        assert_eq!(map.tempo(), DEFAULT_TEMPO);
        assert!(map.with_tempo(0).is_err());
        assert!(map.with_tempo(1 << 24).is_err());
        assert_relative_eq!(map.with_tempo(250_000).unwrap().ticks_to_seconds(480.0), 0.25);
    }

    #[test]
    fn merge_interleaves() {
        let a = vec![msg!(NoteOn, Note = 60; 0), msg!(NoteOff, Note = 60; 10)];
        let b = vec![msg!(NoteOn, Note = 64; 5)];
        let merged = merge_tracks(&[&a[..], &b[..]]);
        assert_eq!(times(&merged), [0.0, 5.0, 5.0]);
        assert_eq!(merged[1].get(Attr::Note), Some(64));
        assert_eq!(merged[2].kind(), MessageType::NoteOff);
        // Inputs are left alone
        assert_eq!(times(&a), [0.0, 10.0]);
    }

    #[test]
    fn merge_ties_follow_track_order() {
        let a = vec![msg!(ControlChange, Value = 1; 5), msg!(ControlChange, Value = 2; 0)];
        let b = vec![msg!(ControlChange, Value = 3; 5)];
        let c = vec![msg!(ControlChange, Value = 4; 2), msg!(ControlChange, Value = 5; 3)];
        let merged = merge_tracks(&[a, b, c]);
        let values: Vec<_> = merged.iter().map(|msg| msg.get(Attr::Value)).collect();
        assert_eq!(values, [Some(4), Some(1), Some(2), Some(3), Some(5)]);
        assert_eq!(times(&merged), [2.0, 3.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn merge_nothing() {
        let empty: [Vec<Message>; 0] = [];
        assert!(merge_tracks(&empty).is_empty());
        assert!(merge_tracks(&[Vec::<Message>::new(), Vec::new()]).is_empty());
    }

    #[test]
    fn merge_large() {
        // Large enough to take the parallel path when it is enabled
        let track = |note: i64| -> Vec<Message> {
            (0..10_000)
                .map(|i| msg!(NoteOn, Note = note; if i == 0 { 0 } else { 1 }))
                .collect()
        };
        let merged = merge_tracks(&[track(1), track(2)]);
        assert_eq!(merged.len(), 20_000);
        for pair in merged.chunks(2) {
            assert_eq!(pair[0].get(Attr::Note), Some(1));
            assert_eq!(pair[1].get(Attr::Note), Some(2));
            assert_eq!(pair[1].time(), 0.0);
        }
        assert_eq!(merged.iter().map(|msg| msg.time()).sum::<f64>(), 9_999.0);
    }

    #[test]
    fn end_of_track_fixup() {
        let track = vec![
            msg!(NoteOn; 0),
            msg!(EndOfTrack; 3),
            msg!(NoteOff; 2),
            msg!(EndOfTrack; 4),
        ];
        let fixed = fix_end_of_track(&track);
        assert_eq!(
            kinds(&fixed),
            [MessageType::NoteOn, MessageType::NoteOff, MessageType::EndOfTrack]
        );
        assert_eq!(times(&fixed), [0.0, 5.0, 4.0]);

        let fixed = fix_end_of_track(&[]);
        assert_eq!(kinds(&fixed), [MessageType::EndOfTrack]);
        assert_eq!(fixed[0].time(), 0.0);
    }

    #[test]
    fn timed_iter_follows_tempo() {
        let track = vec![
            msg!(NoteOn; 480),
            msg!(SetTempo, Tempo = 250_000; 0),
            msg!(NoteOff; 480),
            msg!(NoteOn; 960),
        ];
        let map = TempoMap::new(480).unwrap();
        let mut iter = TimedIter::new(track.clone(), map);
        assert_relative_eq!(iter.next().unwrap().time(), 0.5);
        assert_eq!(iter.next().unwrap().kind(), MessageType::SetTempo);
        assert_eq!(iter.tempo_map().tempo(), 250_000);
        assert_relative_eq!(iter.next().unwrap().time(), 0.25);
        assert_relative_eq!(iter.next().unwrap().time(), 0.5);
        assert!(iter.next().is_none());

        assert_relative_eq!(total_seconds(&[track], map), 1.25);
    }
}
