//! Observable engine state.

use driftmix_core::SoundMix;

/// Where the engine is in its play cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PlaybackPhase {
    #[default]
    Idle,
    Loading,
    Playing,
    Paused,
}

/// Snapshot published to observers on every change.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineState {
    /// The mix whose tracks are loaded. `None` iff no mix tracks are loaded.
    pub current_mix: Option<SoundMix>,
    pub phase: PlaybackPhase,
    /// Applies to every track of the current mix.
    pub is_loop_enabled: bool,
    pub timer_minutes: u32,
    pub timer_active: bool,
    /// Seconds left on the sleep timer.
    pub time_remaining: u64,
    /// Preview tracks are playing.
    pub previewing: bool,
}

impl EngineState {
    pub fn new(loop_enabled: bool) -> Self {
        Self {
            current_mix: None,
            phase: PlaybackPhase::Idle,
            is_loop_enabled: loop_enabled,
            timer_minutes: 0,
            timer_active: false,
            time_remaining: 0,
            previewing: false,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.phase == PlaybackPhase::Playing
    }

    pub fn is_loading(&self) -> bool {
        self.phase == PlaybackPhase::Loading
    }

    pub(crate) fn clear_timer(&mut self) {
        self.timer_minutes = 0;
        self.timer_active = false;
        self.time_remaining = 0;
    }
}

impl Default for EngineState {
    fn default() -> Self {
        Self::new(true)
    }
}
