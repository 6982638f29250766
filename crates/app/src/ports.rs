//! Adapters wiring the director's audio and caption ports to the mix
//! subsystem and the WebSocket caption feed.

use std::sync::Arc;

use audio::{AudioMix, BREATH_TRACKER, PlayOpts, SoundKey};
use snowfield_core::ports::{AudioPort, CaptionKey, CaptionPort, Cue, Tracker};
use tokio::sync::broadcast;
use tracing::info;

pub struct MixAudioPort {
    mix: Arc<AudioMix>,
}

impl MixAudioPort {
    pub fn new(mix: Arc<AudioMix>) -> Self {
        Self { mix }
    }
}

fn loop_key(cue: Cue) -> Option<SoundKey> {
    match cue {
        Cue::WindLoop => Some(SoundKey::Wind),
        Cue::BlizzardLoop => Some(SoundKey::Blizzard),
        Cue::IndoorFireLoop => Some(SoundKey::IndoorFire),
        _ => None,
    }
}

impl AudioPort for MixAudioPort {
    fn play(&self, cue: Cue) {
        match cue {
            Cue::Step { left } => self.mix.play_step(left),
            Cue::WindLoop => self.mix.play(SoundKey::Wind, PlayOpts::default()),
            Cue::BlizzardLoop => self.mix.play(
                SoundKey::Blizzard,
                PlayOpts {
                    fade: 1.2,
                    ..Default::default()
                },
            ),
            Cue::WolfGrowl { boosted } => self.mix.play(
                SoundKey::WolfDistant,
                PlayOpts {
                    gain: if boosted { 1.0 } else { 0.7 },
                    fade: 0.05,
                    ..Default::default()
                },
            ),
            Cue::BreathShort => self.mix.play(
                SoundKey::ZoomBreathShort,
                PlayOpts {
                    gain: 0.9,
                    fade: 0.05,
                    tracker: Some(BREATH_TRACKER),
                },
            ),
            Cue::BreathSoft => self.mix.play(
                SoundKey::ZoomBreathSoft,
                PlayOpts {
                    gain: 0.8,
                    fade: 0.1,
                    tracker: Some(BREATH_TRACKER),
                },
            ),
            Cue::IndoorFireLoop => self.mix.play(
                SoundKey::IndoorFire,
                PlayOpts {
                    fade: 1.5,
                    ..Default::default()
                },
            ),
        }
    }

    fn stop(&self, cue: Cue) {
        if let Some(key) = loop_key(cue) {
            self.mix.stop_loop(key, 0.8);
        }
    }

    fn stop_tracked(&self, tracker: Tracker) {
        match tracker {
            Tracker::Breath => self.mix.stop_tracked(BREATH_TRACKER),
        }
    }

    fn set_wind_level(&self, level: f64) {
        self.mix.set_wind_level(level);
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct Caption {
    pub key: CaptionKey,
    pub duration_hint: f64,
}

/// Logs captions and forwards them to any connected WebSocket clients.
pub struct BroadcastCaptions {
    tx: broadcast::Sender<Caption>,
}

impl BroadcastCaptions {
    pub fn new(tx: broadcast::Sender<Caption>) -> Self {
        Self { tx }
    }
}

impl CaptionPort for BroadcastCaptions {
    fn show(&self, key: CaptionKey, duration_hint: f64) {
        info!(?key, duration_hint, "caption");
        // No receivers connected is fine.
        let _ = self.tx.send(Caption { key, duration_hint });
    }
}
