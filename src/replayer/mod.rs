//! MOD Music Playback Engine
//!
//! Handles playback of parsed modules: tick/row sequencing, effect
//! processing and sample mixing.

pub mod channel;
pub mod effects;
mod player;
pub mod sequencer;
mod shared;
pub mod sync;

pub use channel::{ChannelFlags, ChannelState};
pub use effects::{Effect, ExtendedEffect};
pub use player::{ModPlayer, DEFAULT_SAMPLE_RATE};
pub use sequencer::{AdvanceResult, Sequencer, SequencerFlags};
pub use shared::SharedPlayer;
pub use sync::SyncQueue;

use crate::format::{Module, Signature};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// Stopped
    Stopped,
    /// Currently playing
    Playing,
    /// Paused
    Paused,
}

/// Simple playback controller trait
pub trait PlaybackController {
    /// Start playback
    fn play(&mut self) -> Result<()>;

    /// Pause playback
    fn pause(&mut self) -> Result<()>;

    /// Stop playback and rewind to the start of the song
    fn stop(&mut self) -> Result<()>;

    /// Get current playback state
    fn state(&self) -> PlaybackState;
}

/// Options applied by [`load_song`] after a successful parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadOptions {
    /// Start playing immediately
    pub autoplay: bool,
    /// Restart at the end of the song
    pub repeat: bool,
    /// Output sample rate in Hz
    pub sample_rate: u32,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            autoplay: false,
            repeat: false,
            sample_rate: DEFAULT_SAMPLE_RATE,
        }
    }
}

impl LoadOptions {
    /// Start playing immediately after loading
    pub fn autoplay(mut self, enable: bool) -> Self {
        self.autoplay = enable;
        self
    }

    /// Restart at the end of the song
    pub fn repeat(mut self, enable: bool) -> Self {
        self.repeat = enable;
        self
    }

    /// Render at a custom sample rate
    pub fn sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }
}

/// Summary information returned after loading module data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadSummary {
    /// Song title
    pub title: String,
    /// Format tag
    pub signature: Signature,
    /// Number of channels
    pub channels: usize,
    /// Number of used order table entries
    pub song_length: usize,
    /// Number of stored patterns
    pub pattern_count: usize,
    /// Number of samples holding data
    pub sample_count: usize,
    /// Output sample rate in Hz
    pub sample_rate: u32,
}

impl LoadSummary {
    /// Summarize `module` for playback at `sample_rate`.
    pub fn from_module(module: &Module, sample_rate: u32) -> Self {
        Self {
            title: module.title.clone(),
            signature: module.signature,
            channels: module.channels(),
            song_length: module.song_length,
            pattern_count: module.patterns.len(),
            sample_count: module.used_samples().count(),
            sample_rate,
        }
    }
}

/// Parse a module, initialize a player for it and apply `options`.
pub fn load_song(data: &[u8], options: LoadOptions) -> Result<(ModPlayer, LoadSummary)> {
    let mut player = ModPlayer::new(options.sample_rate);
    player.parse(data)?;
    player.set_repeat(options.repeat);
    if options.autoplay {
        player.play()?;
    }

    let summary = player
        .module()
        .map(|m| LoadSummary::from_module(m, player.sample_rate()))
        .ok_or("module missing after parse")?;
    Ok((player, summary))
}

/// Frames rendered per step by [`measure_duration`].
const MEASURE_CHUNK: usize = 256;

/// Play `module` silently to its end and report how long that took.
///
/// Returns `None` when the song is still running after `limit`, which is
/// the case for modules that jump backwards forever.
pub fn measure_duration(module: &Module, sample_rate: u32, limit: Duration) -> Option<Duration> {
    let mut player = ModPlayer::new(sample_rate);
    player.load_module(module.clone());
    player.play().ok()?;

    let max_frames = (limit.as_secs_f64() * sample_rate as f64) as u64;
    let mut left = [0.0f32; MEASURE_CHUNK];
    let mut right = [0.0f32; MEASURE_CHUNK];
    let mut frames: u64 = 0;
    while frames < max_frames {
        frames += player.mix(&mut left, &mut right).ok()? as u64;
        if player.is_finished() {
            return Some(Duration::from_secs_f64(frames as f64 / player.sample_rate() as f64));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_options_builder() {
        let opts = LoadOptions::default().autoplay(true).repeat(true).sample_rate(48_000);
        assert!(opts.autoplay);
        assert!(opts.repeat);
        assert_eq!(opts.sample_rate, 48_000);
    }

    #[test]
    fn test_load_options_from_json() {
        let opts: LoadOptions = serde_json::from_str(r#"{"repeat": true}"#).unwrap();
        assert_eq!(opts, LoadOptions::default().repeat(true));
    }

    #[test]
    fn test_load_song_rejects_garbage() {
        assert!(load_song(&[0u8; 100], LoadOptions::default()).is_err());
    }
}
