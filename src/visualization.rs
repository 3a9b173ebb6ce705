//! Terminal Visualization Utilities
//!
//! Text helpers for showing pattern data and channel levels in a terminal.

use crate::format::Cell;
use std::fmt::Write;

const NOTE_NAMES: [&str; 12] = [
    "C-", "C#", "D-", "D#", "E-", "F-", "F#", "G-", "G#", "A-", "A#", "B-",
];

/// Tracker-style name of a note index, e.g. `C-1` for index 0.
pub fn note_name(note: u8) -> String {
    format!("{}{}", NOTE_NAMES[note as usize % 12], note / 12 + 1)
}

/// Format a cell the way trackers display it: `C-2 01 C20`.
///
/// Empty fields are shown as dots; periods that match no note are shown
/// as `???`.
pub fn format_cell(cell: &Cell) -> String {
    let mut text = String::with_capacity(10);

    match (cell.period, cell.note) {
        (0, _) => text.push_str("..."),
        (_, Some(note)) => text.push_str(&note_name(note)),
        (_, None) => text.push_str("???"),
    }

    if cell.sample == 0 {
        text.push_str(" ..");
    } else {
        write!(text, " {:02}", cell.sample).ok();
    }

    if cell.command == 0 && cell.param == 0 {
        text.push_str(" ...");
    } else {
        write!(text, " {:X}{:02X}", cell.command, cell.param).ok();
    }

    text
}

/// Create a Unicode block bar representing an amplitude value
///
/// Generates a fixed-width string with █ characters proportional to the amplitude level,
/// padded with spaces to maintain consistent width.
///
/// # Arguments
/// * `amplitude` - Amplitude value (0.0 to 1.0+, clamped internally)
/// * `max_length` - Maximum bar length in characters (also the fixed output width)
pub fn create_volume_bar(amplitude: f32, max_length: usize) -> String {
    let normalized = amplitude.clamp(0.0, 1.0);
    let block_count = ((normalized * max_length as f32) as usize).min(max_length);
    let blocks = "█".repeat(block_count);
    let spaces = " ".repeat(max_length - block_count);
    format!("{}{}", blocks, spaces)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_names() {
        assert_eq!(note_name(0), "C-1");
        assert_eq!(note_name(13), "C#2");
        assert_eq!(note_name(35), "B-3");
    }

    #[test]
    fn test_format_cell() {
        let cell = Cell::from_bytes([0x01, 0xAC, 0x1C, 0x20]);
        assert_eq!(format_cell(&cell), "C-2 01 C20");
        assert_eq!(format_cell(&Cell::default()), "... .. ...");

        let odd = Cell::from_bytes([0x01, 0xF5, 0x0F, 0x7D]);
        assert_eq!(format_cell(&odd), "??? .. F7D");
    }

    #[test]
    fn test_volume_bar_width() {
        assert_eq!(create_volume_bar(0.0, 4), "    ");
        assert_eq!(create_volume_bar(0.5, 4), "██  ");
        assert_eq!(create_volume_bar(3.0, 4), "████");
        assert_eq!(create_volume_bar(-1.0, 2).chars().count(), 2);
    }
}
