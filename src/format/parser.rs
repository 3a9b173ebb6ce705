//! MOD format parser
//!
//! Layout of a 31-sample module:
//! - 0..20: song title
//! - 20..950: 31 sample headers, 30 bytes each
//! - 950: song length, 951: restart position (127 = none)
//! - 952..1080: pattern order table
//! - 1080..1084: format signature
//! - 1084..: patterns (`4 * 64 * channels` bytes each), then sample data

use super::module::{
    Cell, Module, Pattern, Sample, Signature, ORDER_TABLE_LEN, ROWS_PER_PATTERN, SAMPLE_COUNT,
};
use super::{FormatError, FormatParser};
use crate::Result;
use nom::bytes::complete::take;
use nom::combinator::map;
use nom::number::complete::{be_u16, be_u8};
use nom::sequence::tuple;
use nom::IResult;

const TITLE_LEN: usize = 20;
const SAMPLE_HEADERS_OFFSET: usize = 20;
const SAMPLE_HEADER_LEN: usize = 30;
const SAMPLE_NAME_LEN: usize = 22;
const SONG_LENGTH_OFFSET: usize = 950;
const REPEAT_OFFSET: usize = 951;
const ORDER_OFFSET: usize = 952;
const SIGNATURE_OFFSET: usize = 1080;
const PATTERN_OFFSET: usize = 1084;

/// Restart byte value meaning "no restart position".
const NO_REPEAT: u8 = 127;

/// Sample header fields as stored on disk (lengths in 16-bit words).
#[derive(Debug, Clone, Copy)]
struct RawSampleHeader<'a> {
    name: &'a [u8],
    length_words: u16,
    finetune: u8,
    volume: u8,
    loop_start_words: u16,
    loop_length_words: u16,
}

fn sample_header(input: &[u8]) -> IResult<&[u8], RawSampleHeader<'_>> {
    map(
        tuple((take(SAMPLE_NAME_LEN), be_u16, be_u8, be_u8, be_u16, be_u16)),
        |(name, length_words, finetune, volume, loop_start_words, loop_length_words)| {
            RawSampleHeader {
                name,
                length_words,
                finetune,
                volume,
                loop_start_words,
                loop_length_words,
            }
        },
    )(input)
}

/// Decode one signed 8-bit PCM byte into [-1.0, 1.0).
#[inline]
pub fn decode_sample_byte(byte: u8) -> f32 {
    if byte < 128 {
        byte as f32 / 128.0
    } else {
        (byte as f32 - 128.0) / 128.0 - 1.0
    }
}

/// Read a NUL-terminated string, replacing non-printable bytes with spaces.
fn read_text(bytes: &[u8]) -> String {
    bytes
        .iter()
        .take_while(|&&b| b != 0)
        .map(|&b| if (0x20..0x7F).contains(&b) { b as char } else { ' ' })
        .collect()
}

/// Sign-extend the low nibble of the finetune byte.
fn finetune_from_nibble(raw: u8) -> i8 {
    let nibble = (raw & 0x0F) as i8;
    if nibble > 7 {
        nibble - 16
    } else {
        nibble
    }
}

fn ensure_len(data: &[u8], needed: usize, section: &'static str) -> Result<()> {
    if data.len() < needed {
        tracing::warn!(section, needed, available = data.len(), "module truncated");
        return Err(FormatError::Truncated {
            section,
            needed,
            available: data.len(),
        }
        .into());
    }
    Ok(())
}

/// ProTracker MOD parser
pub struct ModParser;

impl ModParser {
    /// Parse a module from a byte buffer.
    pub fn parse_module(data: &[u8]) -> Result<Module> {
        ensure_len(data, PATTERN_OFFSET, "header")?;

        let tag = &data[SIGNATURE_OFFSET..PATTERN_OFFSET];
        let signature = Signature::from_tag(tag).ok_or_else(|| {
            let tag = String::from_utf8_lossy(tag).into_owned();
            tracing::warn!(%tag, "unsupported module signature");
            FormatError::UnsupportedSignature { tag }
        })?;
        let channels = signature.channels();

        let title = read_text(&data[..TITLE_LEN]);

        let mut samples = Self::parse_sample_headers(
            &data[SAMPLE_HEADERS_OFFSET..SAMPLE_HEADERS_OFFSET + SAMPLE_COUNT * SAMPLE_HEADER_LEN],
        )?;

        let song_length = (data[SONG_LENGTH_OFFSET] as usize).min(ORDER_TABLE_LEN);
        let repeat_position = match data[REPEAT_OFFSET] {
            NO_REPEAT => None,
            pos => Some(pos),
        };
        let mut order = [0u8; ORDER_TABLE_LEN];
        order.copy_from_slice(&data[ORDER_OFFSET..ORDER_OFFSET + ORDER_TABLE_LEN]);
        let pattern_count = order.iter().copied().max().unwrap_or(0) as usize + 1;

        let pattern_len = 4 * ROWS_PER_PATTERN * channels;
        let sample_data_offset = PATTERN_OFFSET + pattern_count * pattern_len;
        ensure_len(data, sample_data_offset, "pattern data")?;

        let patterns: Vec<Pattern> = data[PATTERN_OFFSET..sample_data_offset]
            .chunks_exact(pattern_len)
            .map(|raw| {
                let cells = raw
                    .chunks_exact(4)
                    .map(|c| Cell::from_bytes([c[0], c[1], c[2], c[3]]))
                    .collect();
                Pattern::new(channels, cells)
            })
            .collect();

        let total_sample_bytes: usize = samples.iter().map(|s| s.length).sum();
        ensure_len(data, sample_data_offset + total_sample_bytes, "sample data")?;

        let mut cursor = sample_data_offset;
        for sample in samples.iter_mut() {
            sample.data = data[cursor..cursor + sample.length]
                .iter()
                .map(|&b| decode_sample_byte(b))
                .collect();
            cursor += sample.length;
        }

        let filter = Self::initial_filter(&patterns[order[0] as usize], channels);

        tracing::debug!(
            signature = signature.tag(),
            %title,
            channels,
            song_length,
            patterns = pattern_count,
            "parsed module"
        );

        Ok(Module {
            signature,
            title,
            song_length,
            repeat_position,
            order,
            samples,
            patterns,
            filter,
        })
    }

    fn parse_sample_headers(mut input: &[u8]) -> Result<Vec<Sample>> {
        let mut samples = Vec::with_capacity(SAMPLE_COUNT);
        for _ in 0..SAMPLE_COUNT {
            let (rest, raw) = sample_header(input).map_err(|_| FormatError::Truncated {
                section: "sample headers",
                needed: SAMPLE_HEADER_LEN,
                available: input.len(),
            })?;
            input = rest;
            samples.push(Self::normalize_sample(raw));
        }
        Ok(samples)
    }

    fn normalize_sample(raw: RawSampleHeader<'_>) -> Sample {
        let length = raw.length_words as usize * 2;
        let mut loop_start = raw.loop_start_words as usize * 2;
        let mut loop_length = raw.loop_length_words as usize * 2;

        // a one-word loop is the "no loop" marker
        if loop_length == 2 {
            loop_length = 0;
        }
        if loop_start > length {
            loop_start = 0;
            loop_length = 0;
        }
        if loop_start + loop_length > length {
            loop_length = length - loop_start;
        }
        if loop_length == 0 {
            loop_start = 0;
        }

        Sample {
            name: read_text(raw.name),
            length,
            finetune: finetune_from_nibble(raw.finetune),
            volume: raw.volume.min(64),
            loop_start,
            loop_length,
            data: Vec::new(),
        }
    }

    /// Look ahead at the first row for an `E0x` filter command; the last
    /// channel carrying one wins.
    fn initial_filter(first: &Pattern, channels: usize) -> bool {
        // the LED filter only exists on 4-channel machines
        if channels > 4 {
            return false;
        }
        let mut filter = false;
        for cell in (0..channels).map(|ch| first.cell(0, ch)) {
            if cell.command == 0x0E && cell.param & 0xF0 == 0x00 {
                filter = cell.param & 0x01 == 0;
            }
        }
        filter
    }
}

impl FormatParser for ModParser {
    fn parse(&self, data: &[u8]) -> Result<Module> {
        Self::parse_module(data)
    }

    fn name(&self) -> &str {
        "ProTracker MOD"
    }
}
