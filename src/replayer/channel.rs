//! Per-channel runtime state

use crate::format::{Cell, Module};
use crate::tables::{self, PERIOD_MAX, PERIOD_MIN};
use bitflags::bitflags;

bitflags! {
    /// One-shot flags cleared after every output frame.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ChannelFlags: u8 {
        /// Recompute the playback step from the voice period
        const RECALC_SPEED = 0x01;
        /// Re-bind the note index from the current period
        const RECALC_NOTE  = 0x02;
    }
}

/// Maximum channel volume.
pub const VOLUME_MAX: u8 = 64;

/// Playback state of one voice.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelState {
    /// Active sample slot (0-based)
    pub sample: usize,
    /// Current period, always within 113..=856
    pub period: i32,
    /// Period after per-tick modulation (arpeggio, vibrato)
    pub voice_period: f32,
    /// Note index into the base period table
    pub note: usize,
    /// Period distance to the next note
    pub semitone: i32,
    /// Volume, 0..=64
    pub volume: u8,
    /// Effect command of the current row
    pub command: u8,
    /// Effect parameter of the current row
    pub param: u8,
    /// Fractional read position into the sample
    pub sample_pos: f32,
    /// Position advance per output frame
    pub sample_step: f32,
    /// One-shot flags
    pub flags: ChannelFlags,
    /// Whether the voice is sounding
    pub note_on: bool,
    /// Portamento up/down speed
    pub slide_speed: u8,
    /// Tone portamento target period
    pub slide_to: i32,
    /// Tone portamento speed
    pub slide_to_speed: u8,
    /// Arpeggio offsets (hi, lo nibble)
    pub arpeggio: u8,
    /// Vibrato speed
    pub vibrato_speed: u8,
    /// Vibrato depth
    pub vibrato_depth: u8,
    /// Vibrato phase, 0..64
    pub vibrato_pos: usize,
    /// Vibrato waveform; 4..=7 restart the phase on every new note
    pub vibrato_wave: u8,
}

impl Default for ChannelState {
    fn default() -> Self {
        Self {
            sample: 0,
            period: 214,
            voice_period: 214.0,
            note: 24,
            semitone: 12,
            volume: VOLUME_MAX,
            command: 0,
            param: 0,
            sample_pos: 0.0,
            sample_step: 0.0,
            flags: ChannelFlags::empty(),
            note_on: false,
            slide_speed: 0,
            slide_to: 214,
            slide_to_speed: 0,
            arpeggio: 0,
            vibrato_speed: 0,
            vibrato_depth: 0,
            vibrato_pos: 0,
            vibrato_wave: 0,
        }
    }
}

impl ChannelState {
    /// Set the period, clamped into the playable range.
    #[inline]
    pub fn set_period(&mut self, period: i32) {
        self.period = period.clamp(PERIOD_MIN, PERIOD_MAX);
    }

    /// Set the volume, clamped to 64.
    #[inline]
    pub fn set_volume(&mut self, volume: i32) {
        self.volume = volume.clamp(0, VOLUME_MAX as i32) as u8;
    }

    /// Start the voice at `period` from the beginning of its sample.
    pub fn trigger(&mut self, period: u16) {
        self.set_period(period as i32);
        self.sample_pos = 0.0;
        if self.vibrato_wave > 3 {
            self.vibrato_pos = 0;
        }
        self.flags |= ChannelFlags::RECALC_SPEED | ChannelFlags::RECALC_NOTE;
        self.note_on = true;
    }

    /// Switch to a 1-based sample number and take over its default volume.
    ///
    /// Returns `false` when the number does not address a sample slot.
    pub fn select_sample(&mut self, module: &Module, number: u8) -> bool {
        match module.samples.get((number as usize).wrapping_sub(1)) {
            Some(sample) if number > 0 => {
                self.sample = number as usize - 1;
                self.volume = sample.volume;
                true
            }
            _ => false,
        }
    }

    /// Apply the note and sample fields of a freshly struck cell.
    ///
    /// Tone portamento (`3xx`, `5xy`) keeps the voice running and only
    /// updates the slide target.
    pub fn strike(&mut self, module: &Module, cell: &Cell) {
        if cell.period != 0 {
            if cell.command != 0x03 && cell.command != 0x05 {
                self.trigger(cell.period);
            }
            self.slide_to = tables::clamp_period(cell.period as i32);
        }
        if self.select_sample(module, cell.sample)
            && cell.period == 0
            && self.sample_pos > module.samples[self.sample].length as f32
        {
            self.sample_pos = 0.0;
        }
    }

    /// Re-bind note index and semitone span from the current period.
    pub fn recalc_note(&mut self) {
        self.note = tables::nearest_note(self.period);
        self.semitone = 7;
        if self.period >= 120 {
            let table = &tables::BASE_PERIODS;
            self.semitone = table[self.note] as i32 - table[self.note + 1] as i32;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let ch = ChannelState::default();
        assert_eq!(ch.period, 214);
        assert_eq!(ch.note, 24);
        assert_eq!(ch.volume, 64);
        assert_eq!(ch.semitone, 12);
        assert!(!ch.note_on);
    }

    #[test]
    fn test_clamping() {
        let mut ch = ChannelState::default();
        ch.set_period(20);
        assert_eq!(ch.period, PERIOD_MIN);
        ch.set_period(5000);
        assert_eq!(ch.period, PERIOD_MAX);
        ch.set_volume(200);
        assert_eq!(ch.volume, 64);
        ch.set_volume(-3);
        assert_eq!(ch.volume, 0);
    }

    #[test]
    fn test_trigger_sets_flags() {
        let mut ch = ChannelState {
            sample_pos: 12.5,
            vibrato_pos: 9,
            vibrato_wave: 4,
            ..Default::default()
        };
        ch.trigger(428);
        assert_eq!(ch.period, 428);
        assert_eq!(ch.sample_pos, 0.0);
        assert_eq!(ch.vibrato_pos, 0);
        assert!(ch.note_on);
        assert!(ch.flags.contains(ChannelFlags::RECALC_SPEED | ChannelFlags::RECALC_NOTE));
    }

    #[test]
    fn test_vibrato_phase_restart_by_waveform() {
        for wave in 0..8u8 {
            let mut ch = ChannelState {
                vibrato_pos: 9,
                vibrato_wave: wave,
                ..Default::default()
            };
            ch.trigger(428);
            let expected = if wave >= 4 { 0 } else { 9 };
            assert_eq!(ch.vibrato_pos, expected, "waveform {wave}");
        }
    }

    #[test]
    fn test_recalc_note_semitone() {
        let mut ch = ChannelState::default();
        ch.period = 428;
        ch.recalc_note();
        assert_eq!(ch.note, 12);
        assert_eq!(ch.semitone, 428 - 404);

        ch.period = 113;
        ch.recalc_note();
        assert_eq!(ch.note, 35);
        assert_eq!(ch.semitone, 7);
    }
}
