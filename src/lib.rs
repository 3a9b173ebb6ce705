//! ProTracker MOD replayer
//!
//! Decodes 4/6/8/28-channel ProTracker-style MOD files and renders them
//! sample-accurately into two parallel floating-point output buffers.
//!
//! # Features
//! - Bounds-checked parser for the classic 31-sample MOD layout
//! - Tick/row sequencer with pattern break, jump, loop and delay
//! - Full tick-0 / tick-N effect tables including the extended `E` commands
//! - Amiga-style alternating stereo panning and per-channel VU peaks
//! - Sync-marker queue (`8xx` / `E8x`) for external cueing
//! - Offline WAV export
//!
//! # Crate feature flags
//! - `export-wav` (default): WAV rendering via `hound` (`export`)
//! - `visualization` (default): Terminal visualization helpers (`visualization`)
//! - `cli` (opt-in): the `mod-replayer` command line tool
//!
//! # Quick start
//! ```no_run
//! use mod_replayer::replayer::{LoadOptions, PlaybackController};
//! use mod_replayer::load_song;
//!
//! let data = std::fs::read("song.mod").unwrap();
//! let (mut player, summary) = load_song(&data, LoadOptions::default()).unwrap();
//! player.play().unwrap();
//!
//! let mut left = vec![0.0f32; 1024];
//! let mut right = vec![0.0f32; 1024];
//! player.mix(&mut left, &mut right).unwrap();
//! println!("{} channels, {} positions", summary.channels, summary.song_length);
//! ```
//!
//! ## Sharing a player between threads
//! ```no_run
//! use mod_replayer::replayer::{LoadOptions, SharedPlayer};
//! use mod_replayer::load_song;
//!
//! let data = std::fs::read("song.mod").unwrap();
//! let (player, _) = load_song(&data, LoadOptions::default().autoplay(true)).unwrap();
//! let shared = SharedPlayer::new(player);
//! let audio = shared.clone();
//! std::thread::spawn(move || {
//!     let mut left = [0.0f32; 512];
//!     let mut right = [0.0f32; 512];
//!     audio.mix(&mut left, &mut right).unwrap();
//! });
//! shared.set_repeat(true);
//! ```

#![warn(missing_docs)]

// Domain modules
pub mod format; // MOD Format Parsing
pub mod loader; // File I/O and extension detection
pub mod replayer; // Playback Engine
pub mod tables; // Period / finetune / vibrato lookup tables

#[cfg(feature = "export-wav")]
pub mod export; // Offline rendering
#[cfg(feature = "visualization")]
pub mod visualization; // Terminal UI Helpers

pub use format::FormatError;

/// Error types for MOD replayer operations
#[derive(thiserror::Error, Debug)]
pub enum ReplayerError {
    /// The byte buffer is not a valid module
    #[error("Format error: {0}")]
    Format(#[from] FormatError),

    /// File extension or tracker format without a player
    #[error("Unsupported file extension {ext}")]
    UnsupportedFormat {
        /// Extension as detected from the file name
        ext: String,
    },

    /// Operation requires a state the player is not in
    #[error("Invalid state: {0}")]
    InvalidState(&'static str),

    /// IO error from filesystem
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error writing audio file
    #[error("Export error: {0}")]
    Export(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<String> for ReplayerError {
    fn from(msg: String) -> Self {
        ReplayerError::Other(msg)
    }
}

impl From<&str> for ReplayerError {
    fn from(msg: &str) -> Self {
        ReplayerError::Other(msg.to_string())
    }
}

/// Result type for replayer operations
pub type Result<T> = std::result::Result<T, ReplayerError>;

// Public API exports
pub use format::{Cell, Module, ModParser, Pattern, Sample, Signature};
pub use loader::{ModFileLoader, TrackerFormat};
pub use replayer::{
    load_song, LoadOptions, LoadSummary, ModPlayer, PlaybackController, PlaybackState,
    SharedPlayer,
};
pub use tables::WaveTables;

#[cfg(feature = "export-wav")]
pub use export::{export_to_wav, export_to_wav_with_config, ExportConfig};
#[cfg(feature = "visualization")]
pub use visualization::create_volume_bar;
