//! Thread-safe player handle
//!
//! Lets a controller thread toggle playback while an audio thread mixes.

use super::{ModPlayer, PlaybackController, PlaybackState};
use crate::Result;
use parking_lot::{Mutex, MutexGuard};
use std::sync::Arc;

/// Cloneable handle to a [`ModPlayer`] behind a mutex.
#[derive(Debug, Clone)]
pub struct SharedPlayer {
    inner: Arc<Mutex<ModPlayer>>,
}

impl SharedPlayer {
    /// Wrap a player.
    pub fn new(player: ModPlayer) -> Self {
        Self {
            inner: Arc::new(Mutex::new(player)),
        }
    }

    /// Lock the player for several operations in a row.
    pub fn lock(&self) -> MutexGuard<'_, ModPlayer> {
        self.inner.lock()
    }

    /// Render into `left` / `right`; see [`ModPlayer::mix`].
    pub fn mix(&self, left: &mut [f32], right: &mut [f32]) -> Result<usize> {
        self.inner.lock().mix(left, right)
    }

    /// Start playback.
    pub fn play(&self) -> Result<()> {
        self.inner.lock().play()
    }

    /// Pause playback.
    pub fn pause(&self) -> Result<()> {
        self.inner.lock().pause()
    }

    /// Stop and rewind.
    pub fn stop(&self) -> Result<()> {
        self.inner.lock().stop()
    }

    /// Current playback state.
    pub fn state(&self) -> PlaybackState {
        self.inner.lock().state()
    }

    /// Restart at the end of the song instead of going silent.
    pub fn set_repeat(&self, repeat: bool) {
        self.inner.lock().set_repeat(repeat);
    }

    /// Take all pending sync markers.
    pub fn drain_sync(&self) -> Vec<u8> {
        self.inner.lock().drain_sync().collect()
    }

    /// Snapshot of the per-channel peaks, resetting them.
    pub fn take_vu(&self) -> Vec<f32> {
        let mut player = self.inner.lock();
        let peaks = player.channel_vu().to_vec();
        player.reset_vu();
        peaks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handles_share_one_player() {
        let shared = SharedPlayer::new(ModPlayer::default());
        let other = shared.clone();
        other.set_repeat(true);
        assert!(shared.lock().repeat());
        assert_eq!(shared.state(), PlaybackState::Stopped);
        assert!(shared.play().is_err(), "nothing loaded yet");
    }

    #[test]
    fn test_mix_from_another_thread() {
        let shared = SharedPlayer::new(ModPlayer::default());
        let audio = shared.clone();
        let handle = std::thread::spawn(move || {
            let mut l = [0.0f32; 8];
            let mut r = [0.0f32; 8];
            audio.mix(&mut l, &mut r).is_err()
        });
        assert!(handle.join().unwrap());
        assert!(shared.drain_sync().is_empty());
        assert!(shared.take_vu().is_empty());
    }
}
