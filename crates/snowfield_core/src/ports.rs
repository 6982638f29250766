//! Boundaries the director calls into. Audio playback and caption display
//! are presentation concerns owned by the host.

/// A sound request. The host maps cues onto its loaded sound set; loop and
/// gain policy travel with the cue, never per call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cue {
    Step { left: bool },
    WindLoop,
    BlizzardLoop,
    WolfGrowl { boosted: bool },
    BreathShort,
    BreathSoft,
    IndoorFireLoop,
}

/// Named set of short-lived one-shot instances that can be cancelled as a
/// group when an interaction is released.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tracker {
    Breath,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptionKey {
    Wind,
    Blizzard,
    Wolf,
    Reindeer,
    Fire,
    ZoomShort,
    ZoomSoft,
}

pub trait AudioPort {
    fn play(&self, cue: Cue);
    /// Fades a looping cue out. No-op for cues that are not playing.
    fn stop(&self, cue: Cue);
    fn stop_tracked(&self, tracker: Tracker);
    /// Normalized wind intensity, mapped to the wind mix group by the host.
    fn set_wind_level(&self, level: f64);
}

pub trait CaptionPort {
    fn show(&self, key: CaptionKey, duration_hint: f64);
}

/// No-op audio sink for hosts without an output path.
pub struct NullAudio;

impl AudioPort for NullAudio {
    fn play(&self, _cue: Cue) {}
    fn stop(&self, _cue: Cue) {}
    fn stop_tracked(&self, _tracker: Tracker) {}
    fn set_wind_level(&self, _level: f64) {}
}

/// No-op caption sink.
pub struct NullCaptions;

impl CaptionPort for NullCaptions {
    fn show(&self, _key: CaptionKey, _duration_hint: f64) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caption_key_serializes_snake_case() {
        let json = serde_json::to_string(&CaptionKey::ZoomShort).unwrap();
        assert_eq!(json, "\"zoom_short\"");
    }
}
