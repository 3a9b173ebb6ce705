//! Period, finetune and vibrato lookup tables
//!
//! Built once on first use and shared read-only by the parser, the effect
//! handlers and the mixer.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::OnceLock;

/// Paula periods for three octaves, C-1 .. B-3 (finetune 0).
pub const BASE_PERIODS: [u16; 36] = [
    856, 808, 762, 720, 678, 640, 604, 570, 538, 508, 480, 453, // octave 1
    428, 404, 381, 360, 339, 320, 302, 285, 269, 254, 240, 226, // octave 2
    214, 202, 190, 180, 170, 160, 151, 143, 135, 127, 120, 113, // octave 3
];

/// Lowest period a channel may reach (B-3).
pub const PERIOD_MIN: i32 = 113;
/// Highest period a channel may reach (C-1).
pub const PERIOD_MAX: i32 = 856;

/// PAL Amiga clock used to turn periods into playback rates.
pub const PAULA_CLOCK_HZ: f32 = 7_093_789.2;

/// Number of entries in each vibrato waveform.
pub const VIBRATO_STEPS: usize = 64;

/// Seed for the random vibrato waveform so renders are reproducible.
const RANDOM_WAVE_SEED: u64 = 0x4D2E_4B2E;

/// Precomputed tables shared by every player instance.
#[derive(Debug)]
pub struct WaveTables {
    /// Finetune multipliers indexed by `finetune + 8`.
    pub finetune: [f32; 16],
    /// Sine, ramp-down, square and random vibrato waveforms, amplitude ±127.
    pub vibrato: [[f32; VIBRATO_STEPS]; 4],
}

impl WaveTables {
    /// Shared instance, built on first access.
    pub fn get() -> &'static WaveTables {
        static TABLES: OnceLock<WaveTables> = OnceLock::new();
        TABLES.get_or_init(WaveTables::build)
    }

    fn build() -> Self {
        let mut finetune = [0.0f32; 16];
        for (t, slot) in finetune.iter_mut().enumerate() {
            *slot = 2.0f32.powf((t as f32 - 8.0) / 12.0 / 8.0);
        }

        let mut rng = StdRng::seed_from_u64(RANDOM_WAVE_SEED);
        let mut vibrato = [[0.0f32; VIBRATO_STEPS]; 4];
        for i in 0..VIBRATO_STEPS {
            let phase = i as f32 / VIBRATO_STEPS as f32;
            vibrato[0][i] = 127.0 * (std::f32::consts::TAU * phase).sin();
            vibrato[1][i] = 127.0 - 4.0 * i as f32;
            vibrato[2][i] = if i < VIBRATO_STEPS / 2 { 127.0 } else { -127.0 };
            vibrato[3][i] = (1.0 - 2.0 * rng.random::<f32>()) * 127.0;
        }

        Self { finetune, vibrato }
    }

    /// Finetune multiplier for a signed finetune value (-8..=7).
    #[inline]
    pub fn finetune_multiplier(&self, finetune: i8) -> f32 {
        self.finetune[(finetune.clamp(-8, 7) + 8) as usize]
    }
}

/// Index of the base period that exactly matches `period`.
pub fn note_for_period(period: u16) -> Option<u8> {
    BASE_PERIODS
        .iter()
        .position(|&p| p == period)
        .map(|idx| idx as u8)
}

/// Last table index whose period is still at or above `period`.
///
/// Used to re-bind a sliding period to the nearest note at or below its
/// pitch. Periods above C-1 resolve to index 0.
pub fn nearest_note(period: i32) -> usize {
    BASE_PERIODS
        .iter()
        .rposition(|&p| p as i32 >= period)
        .unwrap_or(0)
}

/// Clamp a period into the playable range.
#[inline]
pub fn clamp_period(period: i32) -> i32 {
    period.clamp(PERIOD_MIN, PERIOD_MAX)
}
