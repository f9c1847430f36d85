mod common;

use c3d_crop::{
    Document, Error, ParameterValue, Result, crop, crop::frame_window, crop_file, cropped_path,
    decode, encode,
};
use common::{DEC, Fixture, MIPS, analog_raw};

fn trial() -> Document {
    decode(&Fixture::default().build()).unwrap()
}

#[test]
fn crop_keeps_frames_covering_window() -> Result<()> {
    let original = trial();
    let cropped = crop(&original, 5.1, 6.2)?;

    // floor(510) - 1 = 509 .. ceil(620) - 1 + 1 = 620
    assert_eq!(cropped.points().frame_count(), 111);
    assert_eq!(cropped.analogs().frame_count(), 1110);
    assert_eq!(cropped.points().marker_count(), 3);
    assert_eq!(cropped.analogs().channel_count(), 2);

    for frame in [0, 50, 110] {
        assert_eq!(
            cropped.points().frame(frame),
            original.points().frame(509 + frame)
        );
    }
    for analog_frame in [0, 9, 1109] {
        assert_eq!(
            cropped.analogs().get(1, analog_frame),
            Some(analog_raw(1, 5090 + analog_frame) as f32)
        );
    }
    Ok(())
}

#[test]
fn crop_renumbers_header_and_parameters() -> Result<()> {
    let cropped = crop(&trial(), 5.1, 6.2)?;
    let header = cropped.header();
    assert_eq!((header.first_frame, header.last_frame), (1, 111));
    assert_eq!(
        (header.analog_first_frame, header.analog_last_frame),
        (1, 1110)
    );
    assert_eq!(cropped.parameters().number("POINT", "FRAMES"), Some(111.0));
    assert!(cropped.parameters().get("POINT", "LONG_FRAMES").is_none());

    // 509 + 1 + 2 and 620 + 1 + 1
    assert_eq!(
        cropped
            .parameters()
            .get("TRIAL", "ACTUAL_START_FIELD")
            .unwrap()
            .value,
        ParameterValue::Integer(vec![512, 0])
    );
    assert_eq!(
        cropped
            .parameters()
            .get("TRIAL", "ACTUAL_END_FIELD")
            .unwrap()
            .value,
        ParameterValue::Integer(vec![622, 0])
    );
    Ok(())
}

#[test]
fn crop_leaves_input_untouched() -> Result<()> {
    let original = trial();
    let before = original.clone();
    crop(&original, 5.1, 6.2)?;
    assert_eq!(original, before);
    Ok(())
}

#[test]
fn partial_frames_are_kept() -> Result<()> {
    let doc = trial();
    // 510.5 rounds down, 619.5 rounds up
    let window = frame_window(&doc, 5.105, 6.195)?;
    assert_eq!((window.start, window.end), (509, 620));

    let single = crop(&doc, 5.11, 5.11)?;
    assert_eq!(single.points().frame_count(), 1);
    assert_eq!(single.points().frame(0), doc.points().frame(510));
    Ok(())
}

#[test]
fn window_is_relative_to_first_frame() -> Result<()> {
    let fixture = Fixture {
        first_frame: 101,
        ..Fixture::default()
    };
    let doc = decode(&fixture.build())?;
    // floor(510) - 101 = 409 .. ceil(620) - 101 + 1 = 520
    let window = frame_window(&doc, 5.1, 6.2)?;
    assert_eq!((window.start, window.end), (409, 520));

    let cropped = crop(&doc, 5.1, 6.2)?;
    assert_eq!(cropped.header().first_frame, 1);
    assert_eq!(
        cropped
            .parameters()
            .get("TRIAL", "ACTUAL_START_FIELD")
            .unwrap()
            .value,
        ParameterValue::Integer(vec![512, 0])
    );
    Ok(())
}

#[test]
fn cropped_document_can_be_cropped_again() -> Result<()> {
    let doc = trial();
    let first = crop(&doc, 5.1, 6.2)?;
    let reread = decode(&encode(&first)?)?;
    let second = crop(&reread, 0.1, 0.5)?;

    // floor(10) - 1 = 9 .. ceil(50) - 1 + 1 = 50
    assert_eq!(second.points().frame_count(), 41);
    assert_eq!(second.points().frame(0), doc.points().frame(509 + 9));
    assert_eq!(second.analogs().frame_count(), 410);
    Ok(())
}

#[test]
fn cropped_document_round_trips() -> Result<()> {
    for fixture in [
        Fixture::default(),
        Fixture::default().float(),
        Fixture::default().processor(DEC),
        Fixture::default().processor(MIPS),
    ] {
        let cropped = crop(&decode(&fixture.build())?, 5.1, 6.2)?;
        let reread = decode(&encode(&cropped)?)?;
        assert_eq!(reread.processor(), cropped.processor());
        assert_eq!(reread.points(), cropped.points());
        assert_eq!(reread.analogs(), cropped.analogs());
        assert_eq!(reread.parameters(), cropped.parameters());
        assert_eq!(reread.header().last_frame, 111);
        assert_eq!(reread.header().events, cropped.header().events);
    }
    Ok(())
}

#[test]
fn analog_units_are_emptied() -> Result<()> {
    let cropped = crop(&trial(), 5.1, 6.2)?;
    let units = cropped.parameters().get("ANALOG", "UNITS").unwrap();
    assert!(units.strings().is_empty());
    assert_eq!(units.dimensions.get(1), Some(&0));

    let reread = decode(&encode(&cropped)?)?;
    assert!(
        reread
            .parameters()
            .get("ANALOG", "UNITS")
            .unwrap()
            .strings()
            .is_empty()
    );
    Ok(())
}

#[test]
fn analog_units_are_created_when_missing() -> Result<()> {
    let fixture = Fixture {
        analog_units: false,
        ..Fixture::default()
    };
    let cropped = crop(&decode(&fixture.build())?, 5.1, 6.2)?;
    let units = cropped.parameters().get("ANALOG", "UNITS").unwrap();
    assert!(units.strings().is_empty());
    Ok(())
}

#[test]
fn labels2_dropped_when_labels_not_full() -> Result<()> {
    let fixture = Fixture {
        marker_count: 40,
        frame_count: 100,
        stray_labels2: true,
        ..Fixture::default()
    };
    let doc = decode(&fixture.build())?;
    assert!(doc.parameters().get("POINT", "LABELS2").is_some());

    let cropped = crop(&doc, 0.1, 0.5)?;
    assert!(cropped.parameters().get("POINT", "LABELS2").is_none());
    assert_eq!(cropped.point_labels().len(), 40);
    Ok(())
}

#[test]
fn labels2_kept_when_labels_full() -> Result<()> {
    let fixture = Fixture {
        marker_count: 300,
        channel_count: 0,
        samples_per_frame: 0,
        frame_count: 100,
        ..Fixture::default()
    };
    let doc = decode(&fixture.build())?;
    assert_eq!(doc.point_labels(), fixture.point_labels());

    let cropped = crop(&doc, 0.1, 0.5)?;
    assert_eq!(
        cropped
            .parameters()
            .get("POINT", "LABELS2")
            .unwrap()
            .string_count(),
        45
    );
    assert_eq!(cropped.point_labels(), fixture.point_labels());
    Ok(())
}

#[test]
fn missing_trial_fields_are_skipped() -> Result<()> {
    let fixture = Fixture {
        trial_fields: false,
        ..Fixture::default()
    };
    let cropped = crop(&decode(&fixture.build())?, 5.1, 6.2)?;
    assert!(cropped.parameters().group("TRIAL").is_none());
    assert_eq!(cropped.points().frame_count(), 111);
    Ok(())
}

#[test]
fn files_without_analog_channels_crop() -> Result<()> {
    let fixture = Fixture {
        channel_count: 0,
        samples_per_frame: 0,
        analog_rate: 0.0,
        ..Fixture::default()
    };
    let cropped = crop(&decode(&fixture.build())?, 5.1, 6.2)?;
    assert_eq!(cropped.points().frame_count(), 111);
    assert_eq!(cropped.analogs().frame_count(), 0);
    let reread = decode(&encode(&cropped)?)?;
    assert_eq!(reread.points(), cropped.points());
    Ok(())
}

#[test]
fn non_integer_rate_ratio_is_rejected() {
    let fixture = Fixture {
        point_rate: 100.0,
        analog_rate: 150.0,
        samples_per_frame: 1,
        ..Fixture::default()
    };
    let doc = decode(&fixture.build()).unwrap();
    assert!(matches!(
        crop(&doc, 5.1, 6.2),
        Err(Error::UnsupportedRateRatio { analog_rate, point_rate })
            if analog_rate == 150.0 && point_rate == 100.0
    ));
}

#[test]
fn window_outside_recording_is_rejected() {
    let doc = trial();
    assert!(matches!(
        crop(&doc, 5.0, 20.0),
        Err(Error::RangeOutOfBounds {
            frame_count: 1000,
            ..
        })
    ));
    // 0.0 s lies before the first frame
    assert!(matches!(
        crop(&doc, 0.0, 1.0),
        Err(Error::RangeOutOfBounds { start: -1, .. })
    ));
}

#[test]
fn extreme_times_are_out_of_bounds() {
    let fixture = Fixture {
        first_frame: 0,
        ..Fixture::default()
    };
    let doc = decode(&fixture.build()).unwrap();
    assert!(matches!(
        crop(&doc, 5.1, 1e300),
        Err(Error::RangeOutOfBounds {
            start: 510,
            end: i64::MAX,
            frame_count: 1000,
        })
    ));
    assert!(matches!(
        crop(&doc, -1e300, 6.2),
        Err(Error::RangeOutOfBounds {
            start: i64::MIN,
            ..
        })
    ));
}

#[test]
fn reversed_window_is_rejected() {
    assert!(matches!(
        crop(&trial(), 6.0, 5.0),
        Err(Error::EmptyRange { .. })
    ));
}

#[test]
fn missing_point_rate_is_reported() {
    let mut doc = trial();
    doc.parameters_mut().remove("POINT", "RATE");
    assert!(matches!(
        crop(&doc, 5.1, 6.2),
        Err(Error::ParameterNotFound { group, name }) if group == "POINT" && name == "RATE"
    ));
}

#[test]
fn crop_file_writes_cropped_copy() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let input = dir.path().join("walk.c3d");
    std::fs::write(&input, Fixture::default().build())?;

    let output = cropped_path(&input);
    assert_eq!(output, dir.path().join("walk_cropped.c3d"));
    crop_file(&input, &output, 5.1, 6.2)?;

    let cropped = Document::from_file(&output)?;
    assert_eq!(cropped.points().frame_count(), 111);
    assert_eq!(cropped.analogs().frame_count(), 1110);
    assert_eq!(Document::from_file(&input)?.points().frame_count(), 1000);
    Ok(())
}

#[test]
fn failed_crop_writes_nothing() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let input = dir.path().join("walk.c3d");
    std::fs::write(&input, Fixture::default().build())?;
    let output = cropped_path(&input);

    assert!(crop_file(&input, &output, 50.0, 60.0).is_err());
    assert!(!output.exists());
    Ok(())
}
