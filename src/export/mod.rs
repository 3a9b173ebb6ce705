//! Offline rendering of module playback
//!
//! # Examples
//!
//! ```no_run
//! use mod_replayer::export::{export_to_wav_with_config, ExportConfig};
//! use mod_replayer::replayer::LoadOptions;
//! use mod_replayer::load_song;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let data = std::fs::read("song.mod")?;
//! let (mut player, _) = load_song(&data, LoadOptions::default())?;
//!
//! let config = ExportConfig::stereo()
//!     .normalize(true)
//!     .fade_out(2.0);
//!
//! export_to_wav_with_config(&mut player, "output.wav", config)?;
//! # Ok(())
//! # }
//! ```

mod wav;
pub use wav::*;

use crate::replayer::{ModPlayer, PlaybackController};
use crate::Result;

/// Frames rendered per mix call while exporting.
const RENDER_CHUNK: usize = 4096;

/// Export configuration options
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Sample rate for export (default: 44100 Hz)
    pub sample_rate: u32,
    /// Number of audio channels (1 = mono downmix, 2 = stereo)
    pub channels: u16,
    /// Whether to normalize audio to prevent clipping
    pub normalize: bool,
    /// Fade out duration in seconds (0 = no fade)
    pub fade_out_duration: f32,
    /// Stop rendering after this many seconds even if the song goes on
    pub max_duration: f32,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44_100,
            channels: 2,
            normalize: true,
            fade_out_duration: 0.0,
            max_duration: 600.0,
        }
    }
}

impl ExportConfig {
    /// Create config for stereo export
    pub fn stereo() -> Self {
        Self::default()
    }

    /// Create config for a mono downmix
    pub fn mono() -> Self {
        Self {
            channels: 1,
            ..Default::default()
        }
    }

    /// Create config with custom sample rate
    pub fn with_sample_rate(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            ..Default::default()
        }
    }

    /// Enable normalization to prevent clipping
    pub fn normalize(mut self, enable: bool) -> Self {
        self.normalize = enable;
        self
    }

    /// Add fade out at the end
    pub fn fade_out(mut self, duration_seconds: f32) -> Self {
        self.fade_out_duration = duration_seconds;
        self
    }

    /// Cap the rendered length
    pub fn max_duration(mut self, duration_seconds: f32) -> Self {
        self.max_duration = duration_seconds;
        self
    }
}

/// Play the song from the start until it ends or `max_duration` is reached.
///
/// Returns interleaved stereo frames.
pub fn render_song(player: &mut ModPlayer, config: &ExportConfig) -> Result<Vec<f32>> {
    player.set_sample_rate(config.sample_rate);
    player.stop()?;
    player.play()?;

    let max_frames = (config.max_duration.max(0.0) * config.sample_rate as f32) as usize;
    let mut left = vec![0.0f32; RENDER_CHUNK];
    let mut right = vec![0.0f32; RENDER_CHUNK];
    let mut interleaved = Vec::with_capacity(max_frames.min(RENDER_CHUNK * 64) * 2);

    let mut frames = 0;
    while frames < max_frames && !player.is_finished() {
        let n = RENDER_CHUNK.min(max_frames - frames);
        let played = player.mix(&mut left[..n], &mut right[..n])?;
        for (&l, &r) in left[..played].iter().zip(&right[..played]) {
            interleaved.push(l);
            interleaved.push(r);
        }
        frames += played;
    }

    tracing::info!(
        frames,
        seconds = frames as f32 / config.sample_rate as f32,
        finished = player.is_finished(),
        "rendered song"
    );
    Ok(interleaved)
}

/// Apply normalization to audio samples
fn normalize_samples(samples: &mut [f32]) {
    if samples.is_empty() {
        return;
    }

    // Find peak amplitude
    let peak = samples.iter().map(|s| s.abs()).fold(0.0f32, f32::max);

    // Normalize if peak > 0.95 (leave some headroom)
    if peak > 0.95 {
        let scale = 0.95 / peak;
        for sample in samples.iter_mut() {
            *sample *= scale;
        }
    }
}

/// Apply fade out to the end of interleaved audio frames
fn apply_fade_out(samples: &mut [f32], channels: usize, fade_duration: f32, sample_rate: u32) {
    if fade_duration <= 0.0 || samples.is_empty() || channels == 0 {
        return;
    }

    let frames = samples.len() / channels;
    let fade_frames = ((fade_duration * sample_rate as f32) as usize).max(1);
    let start_fade = frames.saturating_sub(fade_frames);

    for (i, frame) in samples.chunks_exact_mut(channels).enumerate().skip(start_fade) {
        let progress = (i - start_fade) as f32 / fade_frames as f32;
        let fade_factor = 1.0 - progress;
        frame.iter_mut().for_each(|s| *s *= fade_factor);
    }
}

/// Average interleaved stereo frames down to mono
fn stereo_to_mono(stereo: &[f32]) -> Vec<f32> {
    stereo
        .chunks_exact(2)
        .map(|frame| (frame[0] + frame[1]) * 0.5)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_samples() {
        let mut samples = vec![0.5, 1.5, -1.2, 0.8];
        normalize_samples(&mut samples);

        let peak = samples.iter().map(|s| s.abs()).fold(0.0f32, f32::max);
        assert!(peak <= 0.96);
    }

    #[test]
    fn test_quiet_audio_is_not_normalized() {
        let mut samples = vec![0.1, -0.2];
        normalize_samples(&mut samples);
        assert_eq!(samples, vec![0.1, -0.2]);
    }

    #[test]
    fn test_fade_out_stereo() {
        let mut samples = vec![1.0; 2000];
        apply_fade_out(&mut samples, 2, 0.01, 44100); // 441 frames

        assert_eq!(samples[0], 1.0);
        assert_eq!(samples[1], 1.0);
        assert!(samples[1998].abs() < 0.01);
        assert_eq!(samples[1998], samples[1999]);
    }

    #[test]
    fn test_stereo_to_mono() {
        let mono = stereo_to_mono(&[0.2, 0.4, -1.0, 1.0]);
        assert_eq!(mono.len(), 2);
        assert!((mono[0] - 0.3).abs() < 1e-6);
        assert_eq!(mono[1], 0.0);
    }

    #[test]
    fn test_export_config_builder() {
        let config = ExportConfig::mono().normalize(false).fade_out(2.0).max_duration(30.0);

        assert_eq!(config.channels, 1);
        assert!(!config.normalize);
        assert_eq!(config.fade_out_duration, 2.0);
        assert_eq!(config.max_duration, 30.0);
        assert_eq!(ExportConfig::with_sample_rate(22_050).channels, 2);
    }
}
