//! Tick / row / position sequencer
//!
//! Advanced once per output frame by the mixer. Tempo is expressed in BPM
//! with the ProTracker convention of 24 ticks per beat, so one tick lasts
//! `sample_rate * 60 / (bpm * 24)` frames.

use crate::format::ROWS_PER_PATTERN;
use bitflags::bitflags;

bitflags! {
    /// Global per-frame sequencer flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct SequencerFlags: u8 {
        /// A tick boundary was crossed this frame
        const NEW_TICK      = 0x01;
        /// A new row starts this frame
        const NEW_ROW       = 0x02;
        /// A new song position starts this frame
        const NEW_POSITION  = 0x04;
        /// `Bxx` / `Dxx` seen; applied at the end of the row
        const PATTERN_JUMP  = 0x10;
        /// `E6x` loop back pending; applied at the end of the row
        const PATTERN_LOOP  = 0x40;
    }
}

impl SequencerFlags {
    /// Flags that survive the end-of-frame clear.
    pub const STICKY: SequencerFlags = SequencerFlags::PATTERN_JUMP.union(SequencerFlags::PATTERN_LOOP);
}

/// Default ticks per row.
pub const DEFAULT_SPEED: u32 = 6;
/// Default tempo in BPM.
pub const DEFAULT_TEMPO: u32 = 125;

/// Outcome of one [`Sequencer::advance`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceResult {
    /// Still inside the current tick.
    NoTickChange,
    /// A tick boundary was crossed, the row is unchanged.
    TickAdvanced,
    /// A new row starts.
    RowAdvanced,
    /// Ran past the last position and restarted.
    Looped,
    /// Ran past the last position with repeat disabled.
    Completed,
}

/// Song position and timing state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sequencer {
    /// Frames elapsed in the current tick
    pub offset: u32,
    /// Tick within the current row
    pub tick: u32,
    /// Ticks per row
    pub speed: u32,
    /// Tempo in BPM
    pub tempo: u32,
    /// Index into the order table
    pub position: usize,
    /// Row within the current pattern
    pub row: usize,
    /// Row to continue at after a break or jump
    pub break_row: usize,
    /// Position to continue at after a break or jump
    pub jump_target: usize,
    /// Row recorded by `E60`
    pub loop_row: usize,
    /// Remaining `E6x` repetitions
    pub loop_count: u8,
    /// Extra tick groups requested by `EEx`
    pub pattern_delay: u8,
    /// Completed tick groups of the current delay
    pub pattern_wait: u32,
    /// Set once the song ran out with repeat disabled
    pub end_of_song: bool,
    /// Per-frame flags
    pub flags: SequencerFlags,
    /// Restart instead of stopping at the end of the song
    pub repeat: bool,
    song_length: usize,
}

impl Sequencer {
    /// Create a sequencer at position 0 for a song of `song_length` positions.
    pub fn new(song_length: usize) -> Self {
        Self {
            offset: 0,
            tick: 0,
            speed: DEFAULT_SPEED,
            tempo: DEFAULT_TEMPO,
            position: 0,
            row: 0,
            break_row: 0,
            jump_target: 0,
            loop_row: 0,
            loop_count: 0,
            pattern_delay: 0,
            pattern_wait: 0,
            end_of_song: false,
            flags: SequencerFlags::empty(),
            repeat: false,
            song_length,
        }
    }

    /// Number of positions in the song.
    pub fn song_length(&self) -> usize {
        self.song_length
    }

    /// Frames per tick at the current tempo.
    pub fn frames_per_tick(&self, sample_rate: u32) -> f32 {
        sample_rate as f32 * 60.0 / (self.tempo.max(1) as f32 * 24.0)
    }

    /// Ticks per row, ignoring zero.
    pub fn set_speed(&mut self, speed: u32) {
        if speed != 0 {
            self.speed = speed;
        }
    }

    /// Tempo in BPM, ignoring zero.
    pub fn set_tempo(&mut self, bpm: u32) {
        if bpm != 0 {
            self.tempo = bpm;
        }
    }

    /// Request a jump to `position`, row 0 (`Bxx`).
    pub fn jump_to(&mut self, position: usize) {
        self.break_row = 0;
        self.jump_target = position;
        self.flags |= SequencerFlags::PATTERN_JUMP;
    }

    /// Request a break to `row` of the next position (`Dxx`).
    ///
    /// A jump already pending in the same row keeps its target.
    pub fn break_to(&mut self, row: usize) {
        self.break_row = row;
        if !self.flags.contains(SequencerFlags::PATTERN_JUMP) {
            self.jump_target = self.position + 1;
        }
        self.flags |= SequencerFlags::PATTERN_JUMP;
    }

    /// `E6x`: `x == 0` marks the loop start, otherwise loop back while the
    /// counter is running.
    pub fn pattern_loop(&mut self, count: u8) {
        if count == 0 {
            self.loop_row = self.row;
            return;
        }
        if self.loop_count > 0 {
            self.loop_count -= 1;
        } else {
            self.loop_count = count;
        }
        if self.loop_count > 0 {
            self.flags |= SequencerFlags::PATTERN_LOOP;
        }
    }

    /// `EEx`: hold the current row for `x` extra tick groups.
    pub fn delay_pattern(&mut self, groups: u8) {
        self.pattern_delay = groups;
        self.pattern_wait = 0;
    }

    /// Advance by one output frame.
    pub fn advance(&mut self, sample_rate: u32) -> AdvanceResult {
        let mut result = AdvanceResult::NoTickChange;

        if self.offset as f32 > self.frames_per_tick(sample_rate) {
            self.tick += 1;
            self.offset = 0;
            self.flags |= SequencerFlags::NEW_TICK;
            result = AdvanceResult::TickAdvanced;
        }

        if self.tick >= self.speed && !self.hold_for_delay() {
            if self.flags.contains(SequencerFlags::PATTERN_LOOP) {
                self.row = self.loop_row;
                self.flags
                    .remove(SequencerFlags::PATTERN_LOOP | SequencerFlags::PATTERN_JUMP);
            } else if self.flags.contains(SequencerFlags::PATTERN_JUMP) {
                self.position = self.jump_target;
                self.row = self.break_row;
                self.flags.remove(SequencerFlags::PATTERN_JUMP);
            } else {
                self.row += 1;
            }
            self.tick = 0;
            self.flags |= SequencerFlags::NEW_ROW;
            result = AdvanceResult::RowAdvanced;
        }

        if self.row >= ROWS_PER_PATTERN {
            self.position += 1;
            self.row = 0;
            self.flags |= SequencerFlags::NEW_POSITION;
        }

        if self.position >= self.song_length {
            if self.repeat {
                if (self.break_row != 0 || self.jump_target != 0)
                    && self.jump_target < self.song_length
                {
                    self.position = self.jump_target;
                    self.row = self.break_row.min(ROWS_PER_PATTERN - 1);
                } else {
                    self.position = 0;
                }
                return AdvanceResult::Looped;
            }
            self.end_of_song = true;
            return AdvanceResult::Completed;
        }

        result
    }

    /// While an `EEx` delay runs the row is held until `(delay + 1) * speed`
    /// ticks have elapsed. Returns `true` while holding; clears the delay
    /// once it expires.
    fn hold_for_delay(&mut self) -> bool {
        if self.pattern_delay == 0 {
            return false;
        }
        let groups = self.pattern_delay as u32 + 1;
        if self.tick < groups * self.speed {
            self.pattern_wait = self.tick / self.speed;
            return true;
        }
        self.pattern_delay = 0;
        self.pattern_wait = 0;
        false
    }

    /// Drop the per-frame flags, keeping pending jumps and loops.
    #[inline]
    pub fn end_frame(&mut self) {
        self.offset += 1;
        self.flags &= SequencerFlags::STICKY;
    }
}
