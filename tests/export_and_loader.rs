mod common;

use common::{cell, effect, ModBuilder, SampleDef, RATE};
use mod_replayer::export::{export_to_wav_with_config, ExportConfig};
use mod_replayer::replayer::measure_duration;
use mod_replayer::{LoadOptions, ModFileLoader, ReplayerError};
use std::time::Duration;

/// Two rows of a looping drone, then the song ends.
fn short_song() -> Vec<u8> {
    ModBuilder::mk()
        .title("short")
        .cell(0, 0, 0, cell(428, 1, 0, 0))
        .cell(0, 1, 3, effect(0x0D, 0x00))
        .sample(SampleDef::drone(0x40, 64))
        .build()
}

#[test]
fn test_load_by_extension_and_prefix() {
    let dir = tempfile::tempdir().unwrap();
    for name in ["short.mod", "mod.short"] {
        let path = dir.path().join(name);
        std::fs::write(&path, short_song()).unwrap();

        let module = ModFileLoader::load(&path).unwrap();
        assert_eq!(module.title, "short");
        assert_eq!(module.channels(), 4);
        assert_eq!(mod_replayer::loader::load_file(&path).unwrap(), module);
    }
}

#[test]
fn test_load_reports_parse_errors() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.mod");
    std::fs::write(&path, &short_song()[..500]).unwrap();
    assert!(matches!(
        ModFileLoader::load(&path),
        Err(ReplayerError::Format(_))
    ));
}

#[test]
fn test_load_player_applies_options() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("short.mod");
    std::fs::write(&path, short_song()).unwrap();

    let options = LoadOptions::default().repeat(true).sample_rate(22_050);
    let (player, summary) = ModFileLoader::load_player(&path, options).unwrap();
    assert!(player.repeat());
    assert_eq!(player.sample_rate(), 22_050);
    assert_eq!(summary.sample_rate, 22_050);
    assert_eq!(summary.title, "short");
    assert_eq!(summary.song_length, 1);
}

#[test]
fn test_measure_duration() {
    let module = mod_replayer::ModParser::parse_module(&short_song()).unwrap();
    let duration = measure_duration(&module, RATE, Duration::from_secs(60)).unwrap();
    // two rows of six ticks at 125 BPM
    let expected = 12.0 * 0.02;
    assert!((duration.as_secs_f32() - expected).abs() < 0.02, "{duration:?}");

    let endless = ModBuilder::mk().cell(0, 0, 0, effect(0x0B, 0x00)).build();
    let module = mod_replayer::ModParser::parse_module(&endless).unwrap();
    assert_eq!(measure_duration(&module, RATE, Duration::from_secs(2)), None);
}

#[test]
fn test_export_wav_until_song_ends() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("short.mod");
    let out = dir.path().join("short.wav");
    std::fs::write(&src, short_song()).unwrap();

    let (mut player, _) = ModFileLoader::load_player(&src, LoadOptions::default()).unwrap();
    let config = ExportConfig::stereo().normalize(false);
    let frames = export_to_wav_with_config(&mut player, &out, config).unwrap();
    assert!(frames > 10_000 && frames < 11_000, "{frames}");

    let mut reader = hound::WavReader::open(&out).unwrap();
    assert_eq!(reader.spec().channels, 2);
    assert_eq!(reader.spec().sample_rate, RATE);
    assert_eq!(reader.len() as usize, frames * 2);

    let samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
    // channel 0 is panned hard left at half scale
    assert_eq!(samples[100], (0.5 * i16::MAX as f32) as i16);
    assert_eq!(samples[101], 0);
}

#[test]
fn test_export_mono_with_cap_and_fade() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("short.mod");
    let out = dir.path().join("capped.wav");
    std::fs::write(&src, short_song()).unwrap();

    let options = LoadOptions::default().repeat(true);
    let (mut player, _) = ModFileLoader::load_player(&src, options).unwrap();
    let config = ExportConfig::mono()
        .normalize(false)
        .fade_out(0.1)
        .max_duration(1.0);
    let frames = export_to_wav_with_config(&mut player, &out, config).unwrap();
    assert_eq!(frames, RATE as usize);

    let mut reader = hound::WavReader::open(&out).unwrap();
    assert_eq!(reader.spec().channels, 1);
    let samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
    assert_eq!(samples.len(), frames);
    assert_eq!(samples[1000], (0.25 * i16::MAX as f32) as i16);
    assert!(samples[frames - 1].abs() < 100);
}
