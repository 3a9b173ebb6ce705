//! MOD File Loader Domain
//!
//! Handles file I/O for loading tracker modules from disk, including
//! format detection from the file name.

pub mod file;

pub use file::{ModFileLoader, TrackerFormat};

use crate::format::Module;
use crate::Result;
use std::path::Path;

/// Convenience function to load a module from disk
pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Module> {
    ModFileLoader::load(path)
}
