//! Effect command processing
//!
//! Commands are dispatched through four 16-entry handler tables: primary
//! commands on tick 0, primary commands on ticks 1.., and the extended `E`
//! sub-commands for each of the two cases. Every handler mutates the acting
//! channel and, for flow commands, the sequencer.

use super::channel::{ChannelFlags, ChannelState};
use super::sequencer::Sequencer;
use super::sync::SyncQueue;
use crate::format::Module;
use crate::tables::{WaveTables, BASE_PERIODS};
use num_derive::FromPrimitive;
use num_traits::FromPrimitive;

/// Primary effect commands (`0`..`F`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive)]
pub enum Effect {
    /// `0xy` cycle note, note+x, note+y semitones
    Arpeggio = 0x0,
    /// `1xx` slide pitch up
    PortamentoUp = 0x1,
    /// `2xx` slide pitch down
    PortamentoDown = 0x2,
    /// `3xx` slide toward the struck note
    TonePortamento = 0x3,
    /// `4xy` pitch vibrato
    Vibrato = 0x4,
    /// `5xy` tone portamento plus volume slide
    TonePortamentoVolumeSlide = 0x5,
    /// `6xy` vibrato plus volume slide
    VibratoVolumeSlide = 0x6,
    /// `7xy` tremolo (recognised, not applied)
    Tremolo = 0x7,
    /// `8xx` sync marker
    SyncMarker = 0x8,
    /// `9xx` start sample at `xx * 256`
    SampleOffset = 0x9,
    /// `Axy` volume slide
    VolumeSlide = 0xA,
    /// `Bxx` jump to position
    PositionJump = 0xB,
    /// `Cxx` set volume
    SetVolume = 0xC,
    /// `Dxy` break to row `x*10+y` of the next position
    PatternBreak = 0xD,
    /// `Exy` extended command `x`
    Extended = 0xE,
    /// `Fxx` set speed (<= 32) or tempo
    SetSpeed = 0xF,
}

/// Extended `E` sub-commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive)]
pub enum ExtendedEffect {
    /// `E0x` LED filter, 4-channel modules only
    Filter = 0x0,
    /// `E1x` fine slide up
    FineSlideUp = 0x1,
    /// `E2x` fine slide down
    FineSlideDown = 0x2,
    /// `E3x` glissando control (not applied)
    Glissando = 0x3,
    /// `E4x` vibrato waveform
    VibratoWaveform = 0x4,
    /// `E5x` set finetune (not applied)
    SetFinetune = 0x5,
    /// `E6x` pattern loop
    PatternLoop = 0x6,
    /// `E7x` tremolo waveform (not applied)
    TremoloWaveform = 0x7,
    /// `E8x` sync marker
    SyncMarker = 0x8,
    /// `E9x` retrigger every `x` ticks
    Retrigger = 0x9,
    /// `EAx` fine volume slide up
    FineVolumeUp = 0xA,
    /// `EBx` fine volume slide down
    FineVolumeDown = 0xB,
    /// `ECx` cut note at tick `x`
    NoteCut = 0xC,
    /// `EDx` delay note until tick `x`
    NoteDelay = 0xD,
    /// `EEx` delay pattern by `x` rows
    PatternDelay = 0xE,
    /// `EFx` invert loop (not applied)
    InvertLoop = 0xF,
}

impl Effect {
    /// Decode a command nibble.
    pub fn from_command(command: u8) -> Option<Self> {
        Self::from_u8(command & 0x0F)
    }
}

impl ExtendedEffect {
    /// Decode the high nibble of an `E` parameter.
    pub fn from_param(param: u8) -> Option<Self> {
        Self::from_u8(param >> 4)
    }
}

/// Everything an effect handler may touch.
pub struct EffectContext<'a> {
    /// Channel the effect is on
    pub channel: &'a mut ChannelState,
    /// Index of that channel
    pub channel_index: usize,
    /// Global song position and timing
    pub sequencer: &'a mut Sequencer,
    /// Song being played
    pub module: &'a Module,
    /// Sync marker sink
    pub sync: &'a mut SyncQueue,
    /// LED filter state
    pub filter: &'a mut bool,
}

impl EffectContext<'_> {
    #[inline]
    fn param(&self) -> u8 {
        self.channel.param
    }

    #[inline]
    fn hi(&self) -> u8 {
        self.channel.param >> 4
    }

    #[inline]
    fn lo(&self) -> u8 {
        self.channel.param & 0x0F
    }
}

/// Handler signature shared by all dispatch tables.
pub type EffectHandler = fn(&mut EffectContext<'_>);

/// Run the tick-0 handler for the channel's current command.
pub fn process_tick0(ctx: &mut EffectContext<'_>) {
    TICK0[(ctx.channel.command & 0x0F) as usize](ctx);
}

/// Run the tick-1.. handler for the channel's current command.
pub fn process_tick(ctx: &mut EffectContext<'_>) {
    TICK_N[(ctx.channel.command & 0x0F) as usize](ctx);
}

const TICK0: [EffectHandler; 16] = [
    t0_arpeggio,
    t0_slide,
    t0_slide,
    t0_tone_portamento,
    t0_vibrato,
    nop,
    nop,
    nop,
    t0_sync,
    t0_sample_offset,
    nop,
    t0_position_jump,
    t0_set_volume,
    t0_pattern_break,
    t0_extended,
    t0_set_speed,
];

const TICK0_EXTENDED: [EffectHandler; 16] = [
    t0_filter,
    t0_fine_slide_up,
    t0_fine_slide_down,
    nop, // glissando
    t0_vibrato_waveform,
    nop, // finetune
    t0_pattern_loop,
    nop,
    t0_sync,
    nop,
    t0_fine_volume_up,
    t0_fine_volume_down,
    nop,
    note_delay,
    t0_pattern_delay,
    nop,
];

const TICK_N: [EffectHandler; 16] = [
    tn_arpeggio,
    tn_slide_up,
    tn_slide_down,
    tn_tone_portamento,
    tn_vibrato,
    tn_tone_portamento_volume_slide,
    tn_vibrato_volume_slide,
    nop,
    nop,
    nop,
    tn_volume_slide,
    nop,
    nop,
    nop,
    tn_extended,
    nop,
];

const TICK_N_EXTENDED: [EffectHandler; 16] = [
    nop,
    nop,
    nop,
    nop,
    nop,
    nop,
    nop,
    nop,
    nop,
    tn_retrigger,
    nop,
    nop,
    tn_note_cut,
    note_delay,
    nop,
    nop,
];

fn nop(_: &mut EffectContext<'_>) {}

// --- tick 0 ---

fn t0_arpeggio(ctx: &mut EffectContext<'_>) {
    ctx.channel.arpeggio = ctx.param();
}

fn t0_slide(ctx: &mut EffectContext<'_>) {
    if ctx.param() != 0 {
        ctx.channel.slide_speed = ctx.param();
    }
}

fn t0_tone_portamento(ctx: &mut EffectContext<'_>) {
    if ctx.param() != 0 {
        ctx.channel.slide_to_speed = ctx.param();
    }
}

fn t0_vibrato(ctx: &mut EffectContext<'_>) {
    if ctx.hi() != 0 && ctx.lo() != 0 {
        ctx.channel.vibrato_depth = ctx.lo();
        ctx.channel.vibrato_speed = ctx.hi();
    }
    tn_vibrato(ctx);
}

fn t0_sync(ctx: &mut EffectContext<'_>) {
    let marker = ctx.lo();
    ctx.sync.push(marker);
}

fn t0_sample_offset(ctx: &mut EffectContext<'_>) {
    ctx.channel.sample_pos = ctx.param() as f32 * 256.0;
}

fn t0_position_jump(ctx: &mut EffectContext<'_>) {
    let target = ctx.param() as usize;
    ctx.sequencer.jump_to(target);
}

fn t0_set_volume(ctx: &mut EffectContext<'_>) {
    let volume = ctx.param() as i32;
    ctx.channel.set_volume(volume);
}

fn t0_pattern_break(ctx: &mut EffectContext<'_>) {
    let row = ctx.hi() as usize * 10 + ctx.lo() as usize;
    ctx.sequencer.break_to(row);
}

fn t0_extended(ctx: &mut EffectContext<'_>) {
    TICK0_EXTENDED[ctx.hi() as usize](ctx);
}

fn t0_set_speed(ctx: &mut EffectContext<'_>) {
    let value = ctx.param() as u32;
    if value > 32 {
        ctx.sequencer.set_tempo(value);
    } else {
        ctx.sequencer.set_speed(value);
    }
}

fn t0_filter(ctx: &mut EffectContext<'_>) {
    if ctx.module.channels() > 4 {
        return;
    }
    *ctx.filter = ctx.param() & 0x01 == 0;
}

fn t0_fine_slide_up(ctx: &mut EffectContext<'_>) {
    let period = ctx.channel.period - ctx.lo() as i32;
    ctx.channel.set_period(period);
    ctx.channel.flags |= ChannelFlags::RECALC_SPEED;
}

fn t0_fine_slide_down(ctx: &mut EffectContext<'_>) {
    let period = ctx.channel.period + ctx.lo() as i32;
    ctx.channel.set_period(period);
    ctx.channel.flags |= ChannelFlags::RECALC_SPEED;
}

fn t0_vibrato_waveform(ctx: &mut EffectContext<'_>) {
    ctx.channel.vibrato_wave = ctx.param() & 0x07;
}

fn t0_pattern_loop(ctx: &mut EffectContext<'_>) {
    let count = ctx.lo();
    ctx.sequencer.pattern_loop(count);
}

fn t0_fine_volume_up(ctx: &mut EffectContext<'_>) {
    let volume = ctx.channel.volume as i32 + ctx.lo() as i32;
    ctx.channel.set_volume(volume);
}

fn t0_fine_volume_down(ctx: &mut EffectContext<'_>) {
    let volume = ctx.channel.volume as i32 - ctx.lo() as i32;
    ctx.channel.set_volume(volume);
}

fn t0_pattern_delay(ctx: &mut EffectContext<'_>) {
    let groups = ctx.lo();
    ctx.sequencer.delay_pattern(groups);
}

/// `EDx` on any tick: strike the row's note once the tick reaches `x`.
fn note_delay(ctx: &mut EffectContext<'_>) {
    if ctx.sequencer.tick != ctx.lo() as u32 {
        return;
    }
    let cell = *ctx
        .module
        .cell_at(ctx.sequencer.position, ctx.sequencer.row, ctx.channel_index);
    if cell.period != 0 {
        ctx.channel.trigger(cell.period);
        ctx.channel.voice_period = ctx.channel.period as f32;
    }
    ctx.channel.select_sample(ctx.module, cell.sample);
}

// --- tick 1.. ---

fn tn_arpeggio(ctx: &mut EffectContext<'_>) {
    if ctx.param() == 0 {
        return;
    }
    let mut note = ctx.channel.note;
    match ctx.sequencer.tick % 3 {
        1 => note += (ctx.channel.arpeggio >> 4) as usize,
        2 => note += (ctx.channel.arpeggio & 0x0F) as usize,
        _ => {}
    }
    if let Some(&period) = BASE_PERIODS.get(note) {
        ctx.channel.voice_period = period as f32;
    }
    ctx.channel.flags |= ChannelFlags::RECALC_SPEED;
}

fn tn_slide_up(ctx: &mut EffectContext<'_>) {
    let period = ctx.channel.period - ctx.channel.slide_speed as i32;
    ctx.channel.set_period(period);
    ctx.channel.flags |= ChannelFlags::RECALC_SPEED | ChannelFlags::RECALC_NOTE;
}

fn tn_slide_down(ctx: &mut EffectContext<'_>) {
    let period = ctx.channel.period + ctx.channel.slide_speed as i32;
    ctx.channel.set_period(period);
    ctx.channel.flags |= ChannelFlags::RECALC_SPEED | ChannelFlags::RECALC_NOTE;
}

fn tn_tone_portamento(ctx: &mut EffectContext<'_>) {
    let ch = &mut *ctx.channel;
    let speed = ch.slide_to_speed as i32;
    if ch.period < ch.slide_to {
        ch.set_period((ch.period + speed).min(ch.slide_to));
    } else if ch.period > ch.slide_to {
        ch.set_period((ch.period - speed).max(ch.slide_to));
    }
    ch.flags |= ChannelFlags::RECALC_SPEED | ChannelFlags::RECALC_NOTE;
}

fn tn_vibrato(ctx: &mut EffectContext<'_>) {
    let ch = &mut *ctx.channel;
    let wave = &WaveTables::get().vibrato[(ch.vibrato_wave & 0x03) as usize];
    ch.voice_period += ch.vibrato_depth as f32 * wave[ch.vibrato_pos & 0x3F] / 63.0;
    ch.flags |= ChannelFlags::RECALC_SPEED;
}

fn tn_tone_portamento_volume_slide(ctx: &mut EffectContext<'_>) {
    tn_tone_portamento(ctx);
    tn_volume_slide(ctx);
}

fn tn_vibrato_volume_slide(ctx: &mut EffectContext<'_>) {
    tn_vibrato(ctx);
    tn_volume_slide(ctx);
}

fn tn_volume_slide(ctx: &mut EffectContext<'_>) {
    let (hi, lo) = (ctx.hi() as i32, ctx.lo() as i32);
    if lo == 0 {
        let volume = ctx.channel.volume as i32 + hi;
        ctx.channel.set_volume(volume);
    }
    if hi == 0 {
        let volume = ctx.channel.volume as i32 - lo;
        ctx.channel.set_volume(volume);
    }
}

fn tn_extended(ctx: &mut EffectContext<'_>) {
    TICK_N_EXTENDED[ctx.hi() as usize](ctx);
}

fn tn_retrigger(ctx: &mut EffectContext<'_>) {
    let every = ctx.lo() as u32;
    if every != 0 && ctx.sequencer.tick % every == 0 {
        ctx.channel.sample_pos = 0.0;
    }
}

fn tn_note_cut(ctx: &mut EffectContext<'_>) {
    if ctx.sequencer.tick == ctx.lo() as u32 {
        ctx.channel.volume = 0;
    }
}
