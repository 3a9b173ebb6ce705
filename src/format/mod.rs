//! File Format Support
//!
//! Parsing of ProTracker-style MOD files into an immutable [`Module`]:
//! - Signature detection (`M.K.`, `M!K!`, `4CHN`, `FLT4`, `6CHN`, `8CHN`, `FLT8`, `28CH`)
//! - 31 sample headers plus signed 8-bit waveform data
//! - Pattern order table and unpacked pattern cells

pub mod module;
pub mod parser;

pub use module::{Cell, Module, Pattern, Sample, Signature, ROWS_PER_PATTERN, SAMPLE_COUNT};
pub use parser::ModParser;

/// Errors raised while decoding a module buffer.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    /// The four signature bytes at offset 1080 are not a known tag
    #[error("unsupported module signature {tag:?}")]
    UnsupportedSignature {
        /// Signature bytes, lossily decoded
        tag: String,
    },

    /// A section extends past the end of the buffer
    #[error("truncated {section}: need {needed} bytes, have {available}")]
    Truncated {
        /// Section being decoded when the buffer ran out
        section: &'static str,
        /// Bytes required up to the end of that section
        needed: usize,
        /// Bytes actually present
        available: usize,
    },
}

/// Trait for parsing tracker music formats into a [`Module`]
pub trait FormatParser {
    /// Parse file data into a complete module
    fn parse(&self, data: &[u8]) -> crate::Result<Module>;

    /// Get parser name
    fn name(&self) -> &str;
}
