//! Public control surface over the bank and mixer. Every operation is
//! best-effort: unknown or failed sounds no-op, and nothing here can take
//! the frame loop down.

use std::path::Path;
use std::sync::Mutex;

use tracing::debug;

use crate::bank::{LoadState, SoundBank, SoundData};
use crate::defs::SoundKey;
use crate::mixer::{MixUpdate, Mixer, PlayOpts};

pub const BREATH_TRACKER: &str = "breath";

pub struct AudioMix {
    bank: SoundBank,
    mixer: Mutex<Mixer>,
}

impl AudioMix {
    pub fn new(muted: bool) -> Self {
        Self {
            bank: SoundBank::new(),
            mixer: Mutex::new(Mixer::new(muted)),
        }
    }

    /// Loads the whole sound set, best-effort. Mute state set before this
    /// call carries over to sounds loaded here.
    pub fn load_all(&mut self, dir: &Path) {
        self.bank.load_all(dir);
    }

    /// Injects a pre-decoded sound. Mostly for tests and embedded assets.
    pub fn insert(&mut self, key: SoundKey, data: SoundData) {
        self.bank.insert(key, data);
    }

    pub fn play(&self, key: SoundKey, opts: PlayOpts) {
        let Some(data) = self.bank.get(key) else {
            debug!(?key, "play skipped, sound not playable");
            return;
        };
        self.mixer.lock().unwrap().play(key, data, opts);
    }

    /// Footstep with directional fallback: a missing side-specific file
    /// falls back to the mono step sound.
    pub fn play_step(&self, left: bool) {
        let opts = PlayOpts {
            fade: 0.02,
            ..Default::default()
        };
        let directional = if left {
            SoundKey::StepLeft
        } else {
            SoundKey::StepRight
        };
        if self.bank.load_state(directional) == LoadState::Loaded {
            self.play(directional, opts);
        } else {
            self.play(SoundKey::Step, opts);
        }
    }

    pub fn stop_loop(&self, key: SoundKey, fade: f32) {
        self.mixer.lock().unwrap().stop_loop(key, fade);
    }

    pub fn stop_tracked(&self, tracker: &str) {
        self.mixer.lock().unwrap().stop_tracked(tracker);
    }

    pub fn set_muted(&self, muted: bool) {
        self.mixer.lock().unwrap().set_muted(muted);
    }

    pub fn toggle_mute(&self) -> bool {
        let mut mixer = self.mixer.lock().unwrap();
        let next = !mixer.is_muted();
        mixer.set_muted(next);
        next
    }

    pub fn is_muted(&self) -> bool {
        self.mixer.lock().unwrap().is_muted()
    }

    pub fn set_mix(&self, update: MixUpdate) {
        self.mixer.lock().unwrap().set_mix(update);
    }

    /// Maps normalized wind intensity to the wind group level.
    pub fn set_wind_level(&self, normalized: f64) {
        let target = (0.45 + normalized * 0.22).clamp(0.2, 1.0) as f32;
        self.set_mix(MixUpdate {
            wind: Some(target),
            ..Default::default()
        });
    }

    pub fn load_state(&self, key: SoundKey) -> LoadState {
        self.bank.load_state(key)
    }

    pub(crate) fn mixer(&self) -> &Mutex<Mixer> {
        &self.mixer
    }
}
