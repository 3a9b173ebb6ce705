//! MOD player: sequencer, effects and mixer driven frame by frame

use super::channel::{ChannelFlags, ChannelState, VOLUME_MAX};
use super::effects::{self, EffectContext};
use super::sequencer::{Sequencer, SequencerFlags};
use super::sync::SyncQueue;
use super::{PlaybackController, PlaybackState};
use crate::format::{Cell, ModParser, Module};
use crate::tables::{WaveTables, PAULA_CLOCK_HZ};
use crate::{ReplayerError, Result};

/// Default output sample rate.
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

/// Mutable playback state for one loaded module.
#[derive(Debug, Clone)]
struct Voices {
    sequencer: Sequencer,
    channels: Vec<ChannelState>,
    vu: Vec<f32>,
    sync: SyncQueue,
    filter: bool,
}

impl Voices {
    fn new(channels: usize, song_length: usize) -> Self {
        Self {
            sequencer: Sequencer::new(song_length),
            channels: vec![ChannelState::default(); channels],
            vu: vec![0.0; channels],
            sync: SyncQueue::new(),
            filter: false,
        }
    }

    /// Render one stereo frame into `out`.
    fn render_frame(&mut self, module: &Module, sample_rate: u32, out: &mut [f32; 2]) {
        self.sequencer.advance(sample_rate);
        if self.sequencer.end_of_song {
            self.sequencer.end_frame();
            return;
        }

        let flags = self.sequencer.flags;
        let new_row = flags.contains(SequencerFlags::NEW_ROW);
        let new_tick = flags.contains(SequencerFlags::NEW_TICK);
        let (position, row, tick) = (
            self.sequencer.position,
            self.sequencer.row,
            self.sequencer.tick,
        );
        let tables = WaveTables::get();

        let mut side = 0usize;
        for index in 0..self.channels.len() {
            let channel = &mut self.channels[index];

            if new_row {
                let cell: Cell = *module.cell_at(position, row, index);
                channel.command = cell.command;
                channel.param = cell.param;
                // EDx strikes the note itself once its tick comes up
                if !(cell.command == 0x0E && cell.param & 0xF0 == 0xD0) {
                    channel.strike(module, &cell);
                }
            }
            channel.voice_period = channel.period as f32;

            if module.samples[channel.sample].length == 0 {
                channel.note_on = false;
            }

            if new_tick {
                let mut ctx = EffectContext {
                    channel: &mut *channel,
                    channel_index: index,
                    sequencer: &mut self.sequencer,
                    module,
                    sync: &mut self.sync,
                    filter: &mut self.filter,
                };
                if tick == 0 {
                    effects::process_tick0(&mut ctx);
                } else {
                    effects::process_tick(&mut ctx);
                }
            }

            let sample = &module.samples[channel.sample];

            if channel.flags.contains(ChannelFlags::RECALC_NOTE) {
                channel.recalc_note();
            }

            if (channel.flags.contains(ChannelFlags::RECALC_SPEED) || new_row)
                && channel.voice_period != 0.0
            {
                channel.sample_step = PAULA_CLOCK_HZ / (channel.voice_period * 2.0)
                    * tables.finetune_multiplier(sample.finetune)
                    / sample_rate as f32;
            }

            if new_tick {
                channel.vibrato_pos =
                    (channel.vibrato_pos + channel.vibrato_speed as usize) & 0x3F;
            }

            // pan L R R L, repeating every four channels
            side ^= index & 1;
            let mut value = 0.0;
            if channel.note_on {
                if let Some(&level) = sample.data.get(channel.sample_pos as usize) {
                    value = level * channel.volume as f32 / VOLUME_MAX as f32;
                }
                out[side] += value;
                channel.sample_pos += channel.sample_step;
            }
            self.vu[index] = self.vu[index].max(value.abs());

            if channel.note_on {
                if sample.has_loop() {
                    if channel.sample_pos >= sample.loop_end() as f32 {
                        channel.sample_pos -= sample.loop_length as f32;
                    }
                } else if channel.sample_pos >= sample.length as f32 {
                    channel.note_on = false;
                }
            }

            channel.flags = ChannelFlags::empty();
        }

        self.sequencer.end_frame();
    }
}

/// ProTracker MOD player
///
/// Owns the parsed module and all playback state. Not internally
/// synchronized; see [`super::SharedPlayer`] for cross-thread control.
#[derive(Debug, Clone)]
pub struct ModPlayer {
    module: Option<Module>,
    voices: Voices,
    sample_rate: u32,
    start_flags: SequencerFlags,
    repeat: bool,
    playing: bool,
    paused: bool,
}

impl Default for ModPlayer {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLE_RATE)
    }
}

impl ModPlayer {
    /// Create an empty player rendering at `sample_rate` Hz.
    pub fn new(sample_rate: u32) -> Self {
        Self {
            module: None,
            voices: Voices::new(0, 0),
            sample_rate: sample_rate.max(1),
            start_flags: SequencerFlags::NEW_TICK | SequencerFlags::NEW_ROW,
            repeat: false,
            playing: false,
            paused: false,
        }
    }

    /// Parse `data` and make it the current song.
    ///
    /// On failure the previously loaded song, if any, stays in place.
    pub fn parse(&mut self, data: &[u8]) -> Result<()> {
        let module = ModParser::parse_module(data)?;
        self.load_module(module);
        Ok(())
    }

    /// Make an already parsed module the current song and initialize.
    pub fn load_module(&mut self, module: Module) {
        tracing::info!(
            title = %module.title,
            signature = module.signature.tag(),
            channels = module.channels(),
            "module loaded"
        );
        self.module = Some(module);
        self.initialize();
    }

    /// Reset sequencer and channel state to the start of the song.
    ///
    /// The sequencer flags are primed with [`Self::start_flags`] so the
    /// first mixed frame processes row 0, tick 0.
    pub fn initialize(&mut self) {
        let (channels, song_length, filter) = match &self.module {
            Some(m) => (m.channels(), m.song_length, m.filter),
            None => (0, 0, false),
        };
        self.voices = Voices::new(channels, song_length);
        self.voices.filter = filter;
        self.voices.sequencer.repeat = self.repeat;
        self.voices.sequencer.flags = self.start_flags;
    }

    /// Render `min(left.len(), right.len())` frames.
    ///
    /// Frames are silent while stopped, paused or past the end of the song.
    /// Returns how many of them the song actually played through.
    pub fn mix(&mut self, left: &mut [f32], right: &mut [f32]) -> Result<usize> {
        let module = self
            .module
            .as_ref()
            .ok_or(ReplayerError::InvalidState("no module loaded"))?;

        let mut played = 0;
        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            let mut out = [0.0f32; 2];
            if self.playing && !self.paused && !self.voices.sequencer.end_of_song {
                self.voices.render_frame(module, self.sample_rate, &mut out);
                if !self.voices.sequencer.end_of_song {
                    played += 1;
                }
            }
            *l = out[0];
            *r = out[1];
        }
        Ok(played)
    }

    /// Currently loaded module.
    pub fn module(&self) -> Option<&Module> {
        self.module.as_ref()
    }

    /// Output sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Change the output sample rate; takes effect on the next frame.
    pub fn set_sample_rate(&mut self, sample_rate: u32) {
        self.sample_rate = sample_rate.max(1);
    }

    /// Restart at the end of the song instead of going silent.
    pub fn set_repeat(&mut self, repeat: bool) {
        self.repeat = repeat;
        self.voices.sequencer.repeat = repeat;
    }

    /// Whether the song restarts at its end.
    pub fn repeat(&self) -> bool {
        self.repeat
    }

    /// Flags the sequencer starts with after [`Self::initialize`].
    pub fn set_start_flags(&mut self, flags: SequencerFlags) {
        self.start_flags = flags;
    }

    /// Flags the sequencer starts with after [`Self::initialize`].
    pub fn start_flags(&self) -> SequencerFlags {
        self.start_flags
    }

    /// Oldest pending sync marker.
    pub fn pop_sync(&mut self) -> Option<u8> {
        self.voices.sync.pop()
    }

    /// Take all pending sync markers, oldest first.
    pub fn drain_sync(&mut self) -> impl Iterator<Item = u8> + '_ {
        self.voices.sync.drain()
    }

    /// Peak absolute output per channel since the last [`Self::reset_vu`].
    pub fn channel_vu(&self) -> &[f32] {
        &self.voices.vu
    }

    /// Clear the per-channel peak meters.
    pub fn reset_vu(&mut self) {
        self.voices.vu.iter_mut().for_each(|v| *v = 0.0);
    }

    /// LED filter state requested by the song.
    pub fn filter_enabled(&self) -> bool {
        self.voices.filter
    }

    /// Sequencer state (position, row, tick, speed, tempo, ...).
    pub fn sequencer(&self) -> &Sequencer {
        &self.voices.sequencer
    }

    /// Runtime state of one channel.
    pub fn channel(&self, index: usize) -> Option<&ChannelState> {
        self.voices.channels.get(index)
    }

    /// Current order table position.
    pub fn position(&self) -> usize {
        self.voices.sequencer.position
    }

    /// Current row.
    pub fn row(&self) -> usize {
        self.voices.sequencer.row
    }

    /// Whether the song ran out with repeat disabled.
    pub fn is_finished(&self) -> bool {
        self.voices.sequencer.end_of_song
    }
}

impl PlaybackController for ModPlayer {
    fn play(&mut self) -> Result<()> {
        if self.module.is_none() {
            return Err(ReplayerError::InvalidState("no module loaded"));
        }
        self.playing = true;
        self.paused = false;
        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        self.playing = false;
        self.paused = true;
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.playing = false;
        self.paused = false;
        self.initialize();
        Ok(())
    }

    fn state(&self) -> PlaybackState {
        if self.playing {
            PlaybackState::Playing
        } else if self.paused {
            PlaybackState::Paused
        } else {
            PlaybackState::Stopped
        }
    }
}
