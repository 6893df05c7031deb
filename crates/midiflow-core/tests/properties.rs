//! Property tests for the classifier and combinators.

use midiflow_core::prelude::*;
use proptest::prelude::*;

fn channel_status() -> impl Strategy<Value = u8> {
    0x80u8..=0xEF
}

fn data_byte() -> impl Strategy<Value = u8> {
    0u8..=0x7F
}

fn channel_event() -> impl Strategy<Value = MidiEvent> {
    (channel_status(), data_byte(), data_byte(), any::<Option<u32>>()).prop_map(
        |(status, d1, d2, stamp)| {
            let mut event = MidiEvent::from_bytes(&[status, d1, d2]);
            event.time_stamp = stamp.map(f64::from);
            event
        },
    )
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

fn apply<S: Stage>(stage: &S, event: MidiEvent) -> Vec<MidiEvent> {
    let mut out = Vec::new();
    stage.apply(event, &mut |e| out.push(e));
    out
}

proptest! {
    #[test]
    fn note_on_and_off_are_decided_by_status_nibble(channel in 0u8..16, d1 in any::<u8>(), d2 in any::<u8>()) {
        let on = MidiEvent::from_bytes(&[0x90 | channel, d1, d2]);
        prop_assert!(is_note_on(&on));
        prop_assert!(!is_note_off(&on));

        let off = MidiEvent::from_bytes(&[0x80 | channel, d1, d2]);
        prop_assert!(is_note_off(&off));
        prop_assert!(!is_note_on(&off));
    }

    #[test]
    fn channel_mode_and_voice_are_exclusive_for_control_change(channel in 0u8..16, d1 in data_byte(), d2 in data_byte()) {
        let event = MidiEvent::from_bytes(&[0xB0 | channel, d1, d2]);
        prop_assert!(is_channel_mode(&event) != is_channel_voice(&event));
        prop_assert!(is_channel_message(&event));
    }

    #[test]
    fn every_channel_status_is_a_channel_message(event in channel_event()) {
        prop_assert!(is_channel_message(&event));
        prop_assert_eq!(classify(&event).is_channel_voice(), is_channel_voice(&event));
    }

    #[test]
    fn force_channel_is_idempotent(event in channel_event(), channel in 0u8..16) {
        let stage = force_channel(channel);
        let once = apply(&stage, event);
        prop_assert_eq!(once.len(), 1);
        let twice = apply(&stage, once[0].clone());
        prop_assert_eq!(&once, &twice);
        prop_assert_eq!(once[0].channel(), Some(channel));
    }

    #[test]
    fn map_channel_round_trip(event in channel_event()) {
        let there = apply(&map_channel(0, 5), event.clone()).remove(0);
        let back = apply(&map_channel(5, 0), there.clone()).remove(0);
        match event.channel() {
            Some(0) => {
                prop_assert_eq!(back, event);
            }
            Some(5) => {
                prop_assert_eq!(there, event);
            }
            _ => {
                prop_assert_eq!(&there, &event);
                prop_assert_eq!(back, event);
            }
        }
    }

    #[test]
    fn map_channels_cardinality(event in channel_event()) {
        let out = apply(&map_channels([0, 1], [2, 3, 4]), event.clone());
        if matches!(event.channel(), Some(0 | 1)) {
            prop_assert_eq!(out.len(), 3);
            for (copy, channel) in out.iter().zip([2u8, 3, 4]) {
                prop_assert_eq!(copy.channel(), Some(channel));
                prop_assert_eq!(&copy.data[1..], &event.data[1..]);
                prop_assert_eq!(copy.time_stamp, event.time_stamp);
            }
        } else {
            prop_assert_eq!(out, vec![event]);
        }
    }

    #[test]
    fn transpose_touches_only_note_carriers(event in channel_event(), interval in -24i8..=24) {
        let out = apply(&transpose(interval), event.clone()).remove(0);
        if has_note(&event) {
            prop_assert_eq!(out.data[1], event.data[1].wrapping_add_signed(interval));
            prop_assert_eq!(out.data[0], event.data[0]);
            prop_assert_eq!(out.data[2], event.data[2]);
        } else {
            prop_assert_eq!(out, event);
        }
    }

    #[test]
    fn map_controller_touches_only_matching_control_changes(event in channel_event()) {
        let out = apply(&map_controller(7, 10), event.clone()).remove(0);
        if is_control_change(&event) && event.data[1] == 7 {
            prop_assert_eq!(out.as_bytes(), &[event.data[0], 10, event.data[2]][..]);
        } else {
            prop_assert_eq!(out, event);
        }
    }

    #[test]
    fn classifier_never_panics(bytes in prop::collection::vec(any::<u8>(), 0..6)) {
        let event = MidiEvent::from_bytes(&bytes);
        let _ = classify(&event);
        let _ = is_channel_message(&event);
        let pipeline = Pipeline::builder()
            .stage(transpose(3))
            .stage(map_controller(1, 2))
            .stage(map_channels([0], [1, 2]))
            .build()
            .unwrap();
        let _ = pipeline.process_to_vec(event);
    }
}

#[test]
fn strict_pipeline_drops_notes_pushed_out_of_range() {
    init_tracing();
    let pipeline = Pipeline::builder()
        .strict()
        .stage(transpose(100))
        .build()
        .unwrap();

    assert!(pipeline.process_to_vec(MidiEvent::note_on(0, 60, 1)).is_empty());
    let kept = pipeline.process_to_vec(MidiEvent::note_on(0, 20, 1));
    assert_eq!(kept.len(), 1);
    assert_eq!(kept[0].note(), Some(120));
    // Non-note traffic is untouched and still valid.
    assert_eq!(
        pipeline.process_to_vec(MidiEvent::control_change(0, 7, 1)).len(),
        1
    );
}
