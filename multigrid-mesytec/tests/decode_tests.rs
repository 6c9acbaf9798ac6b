#![allow(
    clippy::cast_lossless,
    clippy::cast_possible_truncation,
    clippy::unreadable_literal
)]
use multigrid_calib::{Calibration, CalibrationInput, DelimiterRow};
use multigrid_core::hist::{brightest_grid_pairs, channel_spectrum, tof_spectrum};
use multigrid_core::{Geometry, Quantity};
use multigrid_mesytec::{decode_words, DecoderConfig, EventClusterer};

// Helper to build a frame header word
fn make_header(module: u8) -> u32 {
    0x4000_0000 | (u32::from(module) << 16)
}

// Helper to build a data word
fn make_data(channel: u8, adc: u16) -> u32 {
    (u32::from(channel) << 16) | u32::from(adc & 0x3FFF)
}

// Helper to build an end-of-event word
fn make_eoe(time_of_flight: u32) -> u32 {
    0xC000_0000 | (time_of_flight & 0x3FFF_FFFF)
}

// Calibration covering the full 12-bit ADC range for both geometries:
// wires in four spans of 1024 counts, grids in one span of 1200.
fn full_calibration() -> Calibration {
    let mut inputs = Vec::new();
    for geometry in Geometry::ALL {
        let mut input = CalibrationInput::new(geometry);
        input.rows = vec![
            DelimiterRow::wires(0.0, 1024.0).with_grids(0.0, 1200.0),
            DelimiterRow::wires(1024.0, 2048.0),
            DelimiterRow::wires(2048.0, 3072.0),
            DelimiterRow::wires(3072.0, 4096.0),
        ];
        input.wire_assignments = (0..geometry.wire_channels() as i16).collect();
        input.grid_assignments = (0..12).collect();
        inputs.push(input);
    }
    Calibration::build(&inputs).unwrap()
}

#[test]
fn test_full_pipeline_from_json_config() {
    let config = DecoderConfig::from_json(
        r#"{
            "decoder": {
                "layout": "dual_geometry",
                "framing": "header_delimited",
                "binning": {"tof_bins": 10},
                "filter": {"wire_adc_m1": [100, 4095]}
            }
        }"#,
    )
    .unwrap();
    let calibration = full_calibration();

    let mut words = Vec::new();

    // Frame A: a clean 16-layer event with both grid multiplicities.
    words.push(make_header(1));
    words.push(make_data(0, 600)); // 16-layer wire charge m1
    words.push(make_data(2, 100)); // 16-layer wire position m1 -> channel 1
    words.push(make_data(8, 400)); // grid charge m1
    words.push(make_data(9, 100)); // grid charge m2
    words.push(make_data(10, 150)); // grid position m1 -> channel 1
    words.push(make_data(11, 450)); // grid position m2 -> channel 4
    words.push(make_eoe(1000));

    // Frame B: a weak event that the filter later removes.
    words.push(make_header(1));
    words.push(make_data(0, 50));
    words.push(make_data(2, 200)); // -> channel 3
    words.push(make_eoe(2000));

    // Frame C: a 20-layer event; its 16-layer wire columns stay zero.
    words.push(make_header(2));
    words.push(make_data(4, 700)); // 20-layer wire charge m1
    words.push(make_data(6, 70)); // 20-layer wire position m1 -> channel 1
    words.push(make_eoe(3000));

    // Frame D: truncated by the end of the buffer.
    words.push(make_header(3));
    words.push(make_data(0, 999));

    let output = decode_words(&config, &calibration, &words).unwrap();

    assert_eq!(output.table.len(), 3);
    assert_eq!(output.diagnostics.frames, 3);
    assert_eq!(output.diagnostics.truncated_words, 2);
    assert_eq!(output.diagnostics.framing_errors, 0);
    assert_eq!(output.diagnostics.words, words.len() as u64);

    // Row-aligned projections of the one combined table.
    let sixteen = output.table.view(Geometry::SixteenLayer);
    let twenty = output.table.view(Geometry::TwentyLayer);
    assert_eq!(sixteen.len(), 3);
    assert_eq!(twenty.len(), 3);
    assert_eq!(sixteen.time_of_flight, &[1000, 2000, 3000]);
    assert_eq!(twenty.time_of_flight, &[1000, 2000, 3000]);

    assert_eq!(sixteen.wires.adc_m1, &[600, 50, 0]);
    assert_eq!(sixteen.wires.channel_m1, &[1, 3, 0]);
    assert_eq!(twenty.wires.adc_m1, &[0, 0, 700]);
    assert_eq!(twenty.wires.channel_m1, &[0, 0, 1]);
    assert_eq!(output.table.module, &[1, 1, 2]);

    // Grid charge is shared; frame A picks the first multiplicity as
    // brightest, the empty frames tie and fall through to the second.
    let pairs = brightest_grid_pairs(&sixteen);
    assert_eq!(pairs[0], (1, 1));

    // The filter keeps only frame A when applied through the 16-layer
    // view, and stays row aligned across both geometries.
    let kept = config.filter.apply(&output.table, Geometry::SixteenLayer);
    assert_eq!(kept.len(), 1);
    assert_eq!(kept.time_of_flight, vec![1000]);
    assert_eq!(kept.wires_20.adc_m1, vec![0]);

    // Summary spectra built from the configured binning.
    let tof = tof_spectrum(&sixteen, config.binning.tof_bins);
    assert_eq!(tof.bins(), 10);
    assert_eq!(tof.total(), 3);

    let wires = channel_spectrum(&sixteen, Quantity::Wires);
    assert_eq!(wires.bins(), 64);
    // Frames A and B hit wire channels 1 and 3; frame C left channel 0.
    assert_eq!(wires.counts()[1], 1);
    assert_eq!(wires.counts()[3], 1);
    assert_eq!(wires.counts()[0], 1);
}

#[test]
fn test_streaming_matches_one_shot_decode() {
    let config = DecoderConfig::dual_geometry();
    let calibration = full_calibration();

    let mut words = Vec::new();
    for frame in 0u32..20 {
        words.push(make_header((frame % 3) as u8));
        words.push(make_data(0, (200 + frame * 13) as u16));
        words.push(make_data(2, (frame * 97 % 4096) as u16));
        words.push(make_eoe(frame * 10));
    }

    let one_shot = decode_words(&config, &calibration, &words).unwrap();

    // Feeding the stream word by word, even split across calls, produces
    // the same table.
    let mut clusterer = EventClusterer::new(&config, &calibration).unwrap();
    let (head, tail) = words.split_at(words.len() / 2);
    clusterer.process_words(head);
    for &word in tail {
        clusterer.process_word(word);
    }
    let streamed = clusterer.finish();

    assert_eq!(streamed, one_shot);
    assert_eq!(streamed.table.len(), 20);
}

#[test]
fn test_corrupted_stream_recovers_at_next_header() {
    let config = DecoderConfig::dual_geometry();
    let calibration = full_calibration();

    let words = [
        make_header(1),
        make_data(0, 500),
        // The closing word is lost; the next header abandons the frame.
        make_header(1),
        make_data(0, 600),
        make_eoe(100),
        // A stray close and an unknown word between frames.
        make_eoe(200),
        0x8000_0000,
        make_header(2),
        make_data(0, 700),
        make_eoe(300),
    ];
    let output = decode_words(&config, &calibration, &words).unwrap();

    assert_eq!(output.table.len(), 2);
    assert_eq!(output.table.time_of_flight, vec![100, 300]);
    assert_eq!(output.table.wires_16.adc_m1, vec![600, 700]);
    assert_eq!(output.diagnostics.framing_errors, 2);
    assert_eq!(output.diagnostics.unknown_words, 1);
    assert_eq!(output.diagnostics.frames, 2);
}
