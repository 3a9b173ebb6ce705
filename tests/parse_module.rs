mod common;

use common::{cell, effect, ModBuilder, SampleDef};
use mod_replayer::{FormatError, ModParser, ReplayerError, Signature};

#[test]
fn test_signatures_set_channel_count_and_pattern_size() {
    let cases: [(&[u8; 4], usize); 8] = [
        (b"M.K.", 4),
        (b"M!K!", 4),
        (b"4CHN", 4),
        (b"FLT4", 4),
        (b"6CHN", 6),
        (b"8CHN", 8),
        (b"FLT8", 8),
        (b"28CH", 28),
    ];

    for (tag, channels) in cases {
        let data = ModBuilder::new(tag, channels)
            .cell(0, 63, channels - 1, effect(0x0C, 0x20))
            .build();
        assert_eq!(data.len(), 1084 + 64 * 4 * channels);

        let module = ModParser::parse_module(&data).unwrap();
        assert_eq!(module.channels(), channels);
        assert_eq!(module.signature.tag().as_bytes(), tag);
        let last = module.cell_at(0, 63, channels - 1);
        assert_eq!((last.command, last.param), (0x0C, 0x20));
    }
}

#[test]
fn test_unknown_signature_is_rejected() {
    for tag in [b"2CHN", b"CD81", b"    "] {
        let data = ModBuilder::new(tag, 4).build();
        match ModParser::parse_module(&data) {
            Err(ReplayerError::Format(FormatError::UnsupportedSignature { tag: found })) => {
                assert_eq!(found.as_bytes(), tag);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}

#[test]
fn test_truncated_sections() {
    let data = ModBuilder::mk()
        .sample(SampleDef::one_shot(&[1, 2, 3, 4]))
        .build();

    let cases = [(1000, "header"), (1084 + 100, "pattern data"), (data.len() - 1, "sample data")];
    for (len, expected) in cases {
        match ModParser::parse_module(&data[..len]) {
            Err(ReplayerError::Format(FormatError::Truncated { section, available, .. })) => {
                assert_eq!(section, expected);
                assert_eq!(available, len);
            }
            other => panic!("unexpected for {expected}: {other:?}"),
        }
    }
    assert!(ModParser::parse_module(&data).is_ok());
}

#[test]
fn test_header_fields() {
    let data = ModBuilder::mk()
        .title("space\u{1}debris")
        .order(&[0, 2, 1])
        .repeat_byte(1)
        .build();
    let module = ModParser::parse_module(&data).unwrap();

    assert_eq!(module.signature, Signature::MK);
    assert_eq!(module.title, "space debris");
    assert_eq!(module.song_length, 3);
    assert_eq!(module.repeat_position, Some(1));
    assert_eq!(module.patterns.len(), 3);
    assert_eq!(&module.order[..4], &[0, 2, 1, 0]);

    let data = ModBuilder::mk().build();
    assert_eq!(ModParser::parse_module(&data).unwrap().repeat_position, None);
}

#[test]
fn test_sample_headers_are_normalized() {
    let data = ModBuilder::mk()
        .sample(SampleDef {
            name: "bass",
            data: vec![0; 16],
            finetune: 0x0F,
            volume: 80,
            loop_start_words: 2,
            loop_length_words: 1,
            ..Default::default()
        })
        .sample(SampleDef {
            name: "lead",
            data: vec![0; 16],
            finetune: 0x07,
            volume: 40,
            loop_start_words: 20,
            loop_length_words: 4,
            ..Default::default()
        })
        .sample(SampleDef {
            name: "pad",
            data: vec![0; 16],
            volume: 64,
            loop_start_words: 4,
            loop_length_words: 100,
            ..Default::default()
        })
        .build();
    let module = ModParser::parse_module(&data).unwrap();

    let bass = &module.samples[0];
    assert_eq!(bass.name, "bass");
    assert_eq!(bass.finetune, -1);
    assert_eq!(bass.volume, 64);
    assert!(!bass.has_loop());

    let lead = &module.samples[1];
    assert_eq!(lead.finetune, 7);
    assert_eq!((lead.loop_start, lead.loop_length), (0, 0));

    let pad = &module.samples[2];
    assert_eq!((pad.loop_start, pad.loop_length), (8, 8));
    assert_eq!(pad.loop_end(), pad.length);

    assert_eq!(module.used_samples().count(), 3);
}

#[test]
fn test_sample_data_follows_patterns_in_header_order() {
    let data = ModBuilder::mk()
        .order(&[1])
        .sample(SampleDef::one_shot(&[0x80, 0xC0, 0x40, 0x00]))
        .sample(SampleDef::one_shot(&[0x7F, 0xFF]))
        .build();
    let module = ModParser::parse_module(&data).unwrap();

    assert_eq!(module.patterns.len(), 2);
    assert_eq!(module.samples[0].data, vec![-1.0, -0.5, 0.5, 0.0]);
    assert_eq!(module.samples[1].data, vec![127.0 / 128.0, -1.0 / 128.0]);
}

#[test]
fn test_cells_decode_sample_period_and_effect() {
    let data = ModBuilder::mk()
        .cell(0, 5, 2, cell(428, 0x1F, 0x0A, 0x0F))
        .build();
    let module = ModParser::parse_module(&data).unwrap();

    let c = module.cell_at(0, 5, 2);
    assert_eq!(c.period, 428);
    assert_eq!(c.note, Some(12));
    assert_eq!(c.sample, 0x1F);
    assert_eq!((c.command, c.param), (0x0A, 0x0F));
}

#[test]
fn test_filter_from_first_row() {
    let on = ModBuilder::mk().cell(0, 0, 1, effect(0x0E, 0x00)).build();
    assert!(ModParser::parse_module(&on).unwrap().filter);

    let off = ModBuilder::mk()
        .cell(0, 0, 0, effect(0x0E, 0x00))
        .cell(0, 0, 3, effect(0x0E, 0x01))
        .build();
    assert!(!ModParser::parse_module(&off).unwrap().filter);

    let later = ModBuilder::mk().cell(0, 1, 0, effect(0x0E, 0x00)).build();
    assert!(!ModParser::parse_module(&later).unwrap().filter);
}

#[test]
fn test_filter_ignored_on_multichannel_modules() {
    let data = ModBuilder::new(b"8CHN", 8).cell(0, 0, 5, effect(0x0E, 0x00)).build();
    assert!(!ModParser::parse_module(&data).unwrap().filter);
}
