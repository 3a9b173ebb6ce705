//! In-memory representation of a parsed MOD file.

use serde::Serialize;

/// Every pattern has exactly this many rows.
pub const ROWS_PER_PATTERN: usize = 64;
/// Number of sample slots in a 31-instrument module.
pub const SAMPLE_COUNT: usize = 31;
/// Size of the pattern order table.
pub const ORDER_TABLE_LEN: usize = 128;

/// Four-byte format tag stored at offset 1080.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Signature {
    /// `M.K.` (ProTracker)
    MK,
    /// `M!K!` (ProTracker, more than 64 patterns)
    MKExt,
    /// `4CHN`
    FourChn,
    /// `FLT4` (StarTrekker)
    Flt4,
    /// `6CHN`
    SixChn,
    /// `8CHN`
    EightChn,
    /// `FLT8` (StarTrekker)
    Flt8,
    /// `28CH`
    TwentyEightCh,
}

impl Signature {
    /// Match a raw tag, returning `None` for anything unknown.
    pub fn from_tag(tag: &[u8]) -> Option<Self> {
        match tag {
            b"M.K." => Some(Signature::MK),
            b"M!K!" => Some(Signature::MKExt),
            b"4CHN" => Some(Signature::FourChn),
            b"FLT4" => Some(Signature::Flt4),
            b"6CHN" => Some(Signature::SixChn),
            b"8CHN" => Some(Signature::EightChn),
            b"FLT8" => Some(Signature::Flt8),
            b"28CH" => Some(Signature::TwentyEightCh),
            _ => None,
        }
    }

    /// Tag as stored in the file.
    pub fn tag(self) -> &'static str {
        match self {
            Signature::MK => "M.K.",
            Signature::MKExt => "M!K!",
            Signature::FourChn => "4CHN",
            Signature::Flt4 => "FLT4",
            Signature::SixChn => "6CHN",
            Signature::EightChn => "8CHN",
            Signature::Flt8 => "FLT8",
            Signature::TwentyEightCh => "28CH",
        }
    }

    /// Channel count implied by the tag.
    pub fn channels(self) -> usize {
        match self {
            Signature::MK | Signature::MKExt | Signature::FourChn | Signature::Flt4 => 4,
            Signature::SixChn => 6,
            Signature::EightChn | Signature::Flt8 => 8,
            Signature::TwentyEightCh => 28,
        }
    }
}

/// One instrument slot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sample {
    /// Name with non-printable bytes replaced by spaces
    pub name: String,
    /// Length in bytes (always even)
    pub length: usize,
    /// Signed finetune, -8..=7
    pub finetune: i8,
    /// Default volume, 0..=64
    pub volume: u8,
    /// Loop start in bytes
    pub loop_start: usize,
    /// Loop length in bytes, 0 when the sample does not loop
    pub loop_length: usize,
    /// Decoded waveform in [-1.0, 1.0)
    pub data: Vec<f32>,
}

impl Sample {
    /// Whether the sample defines a loop region.
    #[inline]
    pub fn has_loop(&self) -> bool {
        self.loop_start != 0 || self.loop_length != 0
    }

    /// End of the loop region in bytes.
    #[inline]
    pub fn loop_end(&self) -> usize {
        self.loop_start + self.loop_length
    }
}

/// One channel's data for one row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cell {
    /// Raw 12-bit period, 0 when no note is struck
    pub period: u16,
    /// Index into the base period table, `None` when the period is 0 or unmatched
    pub note: Option<u8>,
    /// 1-based sample number, 0 for none
    pub sample: u8,
    /// Effect command nibble
    pub command: u8,
    /// Effect parameter byte
    pub param: u8,
}

impl Cell {
    /// Unpack the four on-disk bytes of a cell.
    pub fn from_bytes(bytes: [u8; 4]) -> Self {
        let period = (((bytes[0] & 0x0F) as u16) << 8) | bytes[1] as u16;
        Self {
            period,
            note: crate::tables::note_for_period(period),
            sample: (bytes[0] & 0xF0) | (bytes[2] >> 4),
            command: bytes[2] & 0x0F,
            param: bytes[3],
        }
    }

    /// Whether the cell carries neither note, sample nor effect.
    pub fn is_empty(&self) -> bool {
        self.period == 0 && self.sample == 0 && self.command == 0 && self.param == 0
    }
}

/// A 64-row grid of cells, stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct Pattern {
    channels: usize,
    cells: Vec<Cell>,
}

impl Pattern {
    /// Build a pattern from row-major cells.
    ///
    /// `cells` must hold `ROWS_PER_PATTERN * channels` entries.
    pub fn new(channels: usize, cells: Vec<Cell>) -> Self {
        debug_assert_eq!(cells.len(), ROWS_PER_PATTERN * channels);
        Self { channels, cells }
    }

    /// Cell at (`row`, `channel`).
    #[inline]
    pub fn cell(&self, row: usize, channel: usize) -> &Cell {
        &self.cells[row * self.channels + channel]
    }

    /// All cells of one row.
    pub fn row(&self, row: usize) -> &[Cell] {
        let start = row * self.channels;
        &self.cells[start..start + self.channels]
    }
}

/// A fully decoded module. Immutable once parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    /// Format tag
    pub signature: Signature,
    /// Song title (up to 20 characters)
    pub title: String,
    /// Number of used order table entries
    pub song_length: usize,
    /// Restart position byte, `None` when stored as 127
    pub repeat_position: Option<u8>,
    /// Pattern order table
    pub order: [u8; ORDER_TABLE_LEN],
    /// The 31 sample slots
    pub samples: Vec<Sample>,
    /// Patterns, indexed by order table entries
    pub patterns: Vec<Pattern>,
    /// Initial LED filter state from an `E0x` on the first row
    pub filter: bool,
}

impl Module {
    /// Number of channels.
    #[inline]
    pub fn channels(&self) -> usize {
        self.signature.channels()
    }

    /// Pattern played at song position `position`.
    #[inline]
    pub fn pattern_at(&self, position: usize) -> &Pattern {
        &self.patterns[self.order[position] as usize]
    }

    /// Cell at (`position`, `row`, `channel`).
    #[inline]
    pub fn cell_at(&self, position: usize, row: usize, channel: usize) -> &Cell {
        self.pattern_at(position).cell(row, channel)
    }

    /// Iterator over samples that actually hold data.
    pub fn used_samples(&self) -> impl Iterator<Item = (usize, &Sample)> {
        self.samples
            .iter()
            .enumerate()
            .filter(|(_, s)| s.length > 0)
    }
}
