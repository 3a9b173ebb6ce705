//! WAV file export functionality

use super::{apply_fade_out, normalize_samples, render_song, stereo_to_mono, ExportConfig};
use crate::replayer::ModPlayer;
use crate::{ReplayerError, Result};
use std::path::Path;

/// Export module playback to a WAV file
///
/// Renders the song from the start with the default configuration and
/// returns the number of frames written.
///
/// # Examples
///
/// ```no_run
/// use mod_replayer::export::export_to_wav;
/// use mod_replayer::replayer::LoadOptions;
/// use mod_replayer::load_song;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let data = std::fs::read("song.mod")?;
/// let (mut player, _) = load_song(&data, LoadOptions::default())?;
///
/// export_to_wav(&mut player, "output.wav")?;
/// # Ok(())
/// # }
/// ```
pub fn export_to_wav<P: AsRef<Path>>(player: &mut ModPlayer, output_path: P) -> Result<usize> {
    export_to_wav_with_config(player, output_path, ExportConfig::default())
}

/// Export module playback to a WAV file with custom configuration
///
/// # Arguments
///
/// * `player` - Player with a loaded module (rewound before rendering)
/// * `output_path` - Path where the WAV file will be written
/// * `config` - Export configuration (sample rate, channels, normalization, etc.)
pub fn export_to_wav_with_config<P: AsRef<Path>>(
    player: &mut ModPlayer,
    output_path: P,
    config: ExportConfig,
) -> Result<usize> {
    let mut samples = render_song(player, &config)?;

    if config.normalize {
        tracing::debug!("normalizing audio");
        normalize_samples(&mut samples);
    }

    if config.fade_out_duration > 0.0 {
        tracing::debug!(seconds = config.fade_out_duration, "applying fade out");
        apply_fade_out(&mut samples, 2, config.fade_out_duration, config.sample_rate);
    }

    let (final_samples, channels) = if config.channels == 1 {
        (stereo_to_mono(&samples), 1)
    } else {
        (samples, 2)
    };
    let frames = final_samples.len() / channels as usize;

    tracing::info!(path = %output_path.as_ref().display(), frames, "writing WAV file");
    write_wav_file(
        output_path.as_ref(),
        &final_samples,
        config.sample_rate,
        channels,
    )?;

    Ok(frames)
}

/// Write samples to WAV file
fn write_wav_file(path: &Path, samples: &[f32], sample_rate: u32, channels: u16) -> Result<()> {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec)
        .map_err(|e| ReplayerError::Export(format!("Failed to create WAV file: {}", e)))?;

    // Convert f32 samples to i16
    for &sample in samples {
        let sample_i16 = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
        writer
            .write_sample(sample_i16)
            .map_err(|e| ReplayerError::Export(format!("Failed to write sample: {}", e)))?;
    }

    writer
        .finalize()
        .map_err(|e| ReplayerError::Export(format!("Failed to finalize WAV file: {}", e)))?;

    Ok(())
}
