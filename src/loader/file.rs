//! Module file loading
//!
//! The tracker format is taken from the file extension (`song.mod`) or,
//! failing that, from an Amiga-style prefix (`mod.song`).

use crate::format::{FormatParser, ModParser, Module};
use crate::replayer::{LoadOptions, LoadSummary, ModPlayer, PlaybackController};
use crate::{ReplayerError, Result};
use std::fs;
use std::path::Path;

/// Tracker formats recognised by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerFormat {
    /// ProTracker and compatibles
    Mod,
    /// ScreamTracker 3 (recognised, no player)
    S3m,
    /// FastTracker 2 (recognised, no player)
    Xm,
}

impl TrackerFormat {
    /// Match a lowercase extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "mod" => Some(TrackerFormat::Mod),
            "s3m" => Some(TrackerFormat::S3m),
            "xm" => Some(TrackerFormat::Xm),
            _ => None,
        }
    }

    /// Canonical extension.
    pub fn extension(self) -> &'static str {
        match self {
            TrackerFormat::Mod => "mod",
            TrackerFormat::S3m => "s3m",
            TrackerFormat::Xm => "xm",
        }
    }

    /// Detect the format of `path` from its file name.
    pub fn detect<P: AsRef<Path>>(path: P) -> Result<Self> {
        let name = path
            .as_ref()
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        let name = name.trim();

        let suffix = name.rsplit('.').next().unwrap_or_default();
        if let Some(format) = Self::from_extension(suffix) {
            return Ok(format);
        }

        // unknown extension, maybe an amiga-style prefix
        let prefix = name.split('.').next().unwrap_or_default();
        Self::from_extension(prefix).ok_or_else(|| ReplayerError::UnsupportedFormat {
            ext: prefix.to_string(),
        })
    }
}

/// Loads MOD files from disk
pub struct ModFileLoader;

impl ModFileLoader {
    /// Load and parse a module, rejecting formats without a player.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Module> {
        let path = path.as_ref();
        match TrackerFormat::detect(path)? {
            TrackerFormat::Mod => {
                let data = fs::read(path)?;
                tracing::debug!(path = %path.display(), bytes = data.len(), "read module file");
                ModParser.parse(&data)
            }
            other => Err(ReplayerError::UnsupportedFormat {
                ext: other.extension().to_string(),
            }),
        }
    }

    /// Load a module from disk straight into a configured player.
    pub fn load_player<P: AsRef<Path>>(
        path: P,
        options: LoadOptions,
    ) -> Result<(ModPlayer, LoadSummary)> {
        let module = Self::load(path)?;
        let summary = LoadSummary::from_module(&module, options.sample_rate);

        let mut player = ModPlayer::new(options.sample_rate);
        player.load_module(module);
        player.set_repeat(options.repeat);
        if options.autoplay {
            player.play()?;
        }
        Ok((player, summary))
    }
}
