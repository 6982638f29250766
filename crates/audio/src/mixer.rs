//! Software voice mixer. Pure state plus a `render` routine, so every
//! playback rule is testable without an output device; the cpal callback in
//! `engine` is just a thin pull on this.

use std::sync::Arc;

use crate::bank::SoundData;
use crate::defs::{MixGroup, SoundKey};

pub const DEFAULT_FADE: f32 = 0.35;

/// Master ramp on mute/unmute, instead of a hard cut.
const MUTE_RAMP_SECONDS: f32 = 0.08;
/// Fast fade applied by `stop_tracked` and loop stops.
const RELEASE_SECONDS: f32 = 0.04;

#[derive(Debug, Clone, Copy)]
pub struct GroupGains {
    pub wind: f32,
    pub env: f32,
    pub ui: f32,
}

impl Default for GroupGains {
    fn default() -> Self {
        Self {
            wind: 1.0,
            env: 1.0,
            ui: 1.0,
        }
    }
}

impl GroupGains {
    pub fn get(self, group: MixGroup) -> f32 {
        match group {
            MixGroup::Wind => self.wind,
            MixGroup::Env => self.env,
            MixGroup::Ui => self.ui,
        }
    }
}

/// Partial mix update; absent groups keep their current level.
#[derive(Debug, Clone, Copy, Default)]
pub struct MixUpdate {
    pub wind: Option<f32>,
    pub env: Option<f32>,
    pub ui: Option<f32>,
}

#[derive(Debug, Clone, Copy)]
pub struct PlayOpts {
    pub gain: f32,
    pub fade: f32,
    pub tracker: Option<&'static str>,
}

impl Default for PlayOpts {
    fn default() -> Self {
        Self {
            gain: 1.0,
            fade: DEFAULT_FADE,
            tracker: None,
        }
    }
}

struct Voice {
    key: SoundKey,
    data: Arc<SoundData>,
    pos: f64,
    gain: f32,
    target_gain: f32,
    /// Per-call gain, kept so mix changes can re-derive the target.
    base_gain: f32,
    fade: f32,
    looped: bool,
    tracker: Option<&'static str>,
    releasing: bool,
    finished: bool,
}

impl Voice {
    fn retarget(&mut self, gains: GroupGains) {
        if !self.releasing {
            self.target_gain = gains.get(self.key.group()) * self.base_gain;
        }
    }

    fn release(&mut self) {
        self.releasing = true;
        self.target_gain = 0.0;
        self.fade = RELEASE_SECONDS;
    }
}

pub struct Mixer {
    voices: Vec<Voice>,
    gains: GroupGains,
    muted: bool,
    master: f32,
}

impl Mixer {
    /// Muted by default: nothing is audible until an explicit unmute.
    pub fn new(muted: bool) -> Self {
        Self {
            voices: Vec::new(),
            gains: GroupGains::default(),
            muted,
            master: 0.0,
        }
    }

    /// Starts or re-targets playback. Looping keys reuse their live voice
    /// (gain ramps to the new target over `fade`); one-shots always stack so
    /// rapid calls overlap instead of cancelling.
    pub fn play(&mut self, key: SoundKey, data: Arc<SoundData>, opts: PlayOpts) {
        let fade = opts.fade.max(1e-3);
        if key.looped()
            && let Some(voice) = self
                .voices
                .iter_mut()
                .find(|v| v.key == key && !v.finished && !v.releasing)
        {
            voice.base_gain = opts.gain;
            voice.fade = fade;
            voice.retarget(self.gains);
            return;
        }
        self.voices.push(Voice {
            key,
            data,
            pos: 0.0,
            gain: 0.0,
            target_gain: self.gains.get(key.group()) * opts.gain,
            base_gain: opts.gain,
            fade,
            looped: key.looped(),
            tracker: opts.tracker,
            releasing: false,
            finished: false,
        });
    }

    /// Fades out any live voices for a looping key.
    pub fn stop_loop(&mut self, key: SoundKey, fade: f32) {
        for voice in self.voices.iter_mut().filter(|v| v.key == key && v.looped) {
            voice.releasing = true;
            voice.target_gain = 0.0;
            voice.fade = fade.max(1e-3);
        }
    }

    /// Fast-releases every voice carrying the tracker id.
    pub fn stop_tracked(&mut self, tracker: &str) {
        for voice in self
            .voices
            .iter_mut()
            .filter(|v| v.tracker == Some(tracker))
        {
            voice.release();
        }
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Merges a partial update and re-targets live voices in the affected
    /// groups only.
    pub fn set_mix(&mut self, update: MixUpdate) {
        if let Some(wind) = update.wind {
            self.gains.wind = wind.clamp(0.0, 1.0);
        }
        if let Some(env) = update.env {
            self.gains.env = env.clamp(0.0, 1.0);
        }
        if let Some(ui) = update.ui {
            self.gains.ui = ui.clamp(0.0, 1.0);
        }
        let gains = self.gains;
        for voice in &mut self.voices {
            let affected = match voice.key.group() {
                MixGroup::Wind => update.wind.is_some(),
                MixGroup::Env => update.env.is_some(),
                MixGroup::Ui => update.ui.is_some(),
            };
            if affected {
                voice.retarget(gains);
            }
        }
    }

    pub fn mix(&self) -> GroupGains {
        self.gains
    }

    pub fn live_count(&self, key: SoundKey) -> usize {
        self.voices
            .iter()
            .filter(|v| v.key == key && !v.finished && !v.releasing)
            .count()
    }

    /// The invariant volume of a live voice for `key`: zero when muted, else
    /// group level times per-call gain.
    pub fn effective_volume(&self, key: SoundKey) -> Option<f32> {
        let voice = self
            .voices
            .iter()
            .find(|v| v.key == key && !v.finished && !v.releasing)?;
        if self.muted {
            Some(0.0)
        } else {
            Some(self.gains.get(key.group()) * voice.base_gain)
        }
    }

    /// Mixes one block of interleaved output. All voices are resampled with
    /// linear interpolation and summed under the ramped master gain.
    pub fn render(&mut self, out: &mut [f32], channels: u16, sample_rate: u32) {
        out.fill(0.0);
        let ch = channels.max(1) as usize;
        let frames = out.len() / ch;
        let dt = 1.0 / sample_rate.max(1) as f32;
        let master_step = dt / MUTE_RAMP_SECONDS;
        let master_target = if self.muted { 0.0 } else { 1.0 };

        for frame in 0..frames {
            self.master += (master_target - self.master).clamp(-master_step, master_step);
            let mut acc = 0.0f32;
            for voice in &mut self.voices {
                if voice.finished {
                    continue;
                }
                let ramp = dt / voice.fade;
                voice.gain += (voice.target_gain - voice.gain).clamp(-ramp, ramp);
                if voice.releasing && voice.gain <= 1e-4 {
                    voice.finished = true;
                    continue;
                }

                let len = voice.data.samples.len();
                if len == 0 {
                    voice.finished = true;
                    continue;
                }
                let i = voice.pos as usize;
                let frac = (voice.pos - i as f64) as f32;
                let a = voice.data.samples[i.min(len - 1)];
                let b = voice.data.samples[(i + 1).min(len - 1)];
                acc += (a + (b - a) * frac) * voice.gain;

                voice.pos += voice.data.sample_rate as f64 / sample_rate.max(1) as f64;
                if voice.pos >= len as f64 {
                    if voice.looped {
                        voice.pos -= len as f64;
                    } else {
                        voice.finished = true;
                    }
                }
            }
            let mixed = (acc * self.master).clamp(-1.0, 1.0);
            for slot in &mut out[frame * ch..frame * ch + ch] {
                *slot = mixed;
            }
        }
        self.voices.retain(|v| !v.finished);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone(frames: usize) -> Arc<SoundData> {
        Arc::new(SoundData {
            samples: vec![0.5; frames],
            sample_rate: 48_000,
        })
    }

    fn settle(mixer: &mut Mixer) {
        // A second of audio, plenty for every ramp in here.
        let mut out = vec![0.0f32; 2 * 48_000];
        mixer.render(&mut out, 2, 48_000);
    }

    #[test]
    fn test_effective_volume_tracks_mute_and_mix() {
        let mut mixer = Mixer::new(true);
        mixer.play(SoundKey::Wind, tone(1 << 16), PlayOpts::default());
        assert_eq!(mixer.effective_volume(SoundKey::Wind), Some(0.0));

        mixer.set_muted(false);
        assert_eq!(mixer.effective_volume(SoundKey::Wind), Some(1.0));

        mixer.set_mix(MixUpdate {
            wind: Some(0.5),
            ..Default::default()
        });
        assert_eq!(mixer.effective_volume(SoundKey::Wind), Some(0.5));

        // Unrelated group updates leave wind alone.
        mixer.set_mix(MixUpdate {
            ui: Some(0.1),
            ..Default::default()
        });
        assert_eq!(mixer.effective_volume(SoundKey::Wind), Some(0.5));

        mixer.set_muted(true);
        assert_eq!(mixer.effective_volume(SoundKey::Wind), Some(0.0));
        mixer.set_muted(true);
        assert!(mixer.is_muted());
    }

    #[test]
    fn test_looping_start_is_idempotent() {
        let mut mixer = Mixer::new(false);
        mixer.play(SoundKey::Wind, tone(1 << 16), PlayOpts::default());
        mixer.play(
            SoundKey::Wind,
            tone(1 << 16),
            PlayOpts {
                gain: 0.6,
                ..Default::default()
            },
        );
        assert_eq!(mixer.live_count(SoundKey::Wind), 1);
        assert_eq!(mixer.effective_volume(SoundKey::Wind), Some(0.6));
    }

    #[test]
    fn test_one_shots_stack() {
        let mut mixer = Mixer::new(false);
        mixer.play(SoundKey::Step, tone(1 << 16), PlayOpts::default());
        mixer.play(SoundKey::Step, tone(1 << 16), PlayOpts::default());
        assert_eq!(mixer.live_count(SoundKey::Step), 2);
    }

    #[test]
    fn test_muted_render_is_silent() {
        let mut mixer = Mixer::new(true);
        mixer.play(SoundKey::Wind, tone(1 << 20), PlayOpts::default());
        settle(&mut mixer);
        let mut out = vec![0.0f32; 512];
        mixer.render(&mut out, 2, 48_000);
        assert!(out.iter().all(|s| *s == 0.0));
    }

    #[test]
    fn test_unmuted_render_produces_signal() {
        let mut mixer = Mixer::new(false);
        mixer.play(SoundKey::Wind, tone(1 << 20), PlayOpts::default());
        settle(&mut mixer);
        let mut out = vec![0.0f32; 512];
        mixer.render(&mut out, 2, 48_000);
        assert!(out.iter().any(|s| s.abs() > 0.3));
    }

    #[test]
    fn test_one_shot_finishes_and_is_dropped() {
        let mut mixer = Mixer::new(false);
        mixer.play(
            SoundKey::Step,
            tone(1000),
            PlayOpts {
                fade: 0.001,
                ..Default::default()
            },
        );
        settle(&mut mixer);
        assert_eq!(mixer.live_count(SoundKey::Step), 0);
    }

    #[test]
    fn test_loop_wraps_instead_of_finishing() {
        let mut mixer = Mixer::new(false);
        mixer.play(SoundKey::Wind, tone(1000), PlayOpts::default());
        settle(&mut mixer);
        assert_eq!(mixer.live_count(SoundKey::Wind), 1);
    }

    #[test]
    fn test_stop_tracked_releases_only_its_voices() {
        let mut mixer = Mixer::new(false);
        mixer.play(
            SoundKey::ZoomBreathShort,
            tone(1 << 20),
            PlayOpts {
                tracker: Some("breath"),
                ..Default::default()
            },
        );
        mixer.play(
            SoundKey::ZoomBreathSoft,
            tone(1 << 20),
            PlayOpts {
                tracker: Some("breath"),
                ..Default::default()
            },
        );
        mixer.play(SoundKey::WolfDistant, tone(1 << 20), PlayOpts::default());

        mixer.stop_tracked("breath");
        assert_eq!(mixer.live_count(SoundKey::ZoomBreathShort), 0);
        assert_eq!(mixer.live_count(SoundKey::ZoomBreathSoft), 0);
        assert_eq!(mixer.live_count(SoundKey::WolfDistant), 1);

        settle(&mut mixer);
        assert_eq!(mixer.live_count(SoundKey::WolfDistant), 1);
    }

    #[test]
    fn test_stop_loop_fades_out() {
        let mut mixer = Mixer::new(false);
        mixer.play(SoundKey::Blizzard, tone(1 << 20), PlayOpts::default());
        settle(&mut mixer);
        mixer.stop_loop(SoundKey::Blizzard, 0.1);
        assert_eq!(mixer.live_count(SoundKey::Blizzard), 0);
        settle(&mut mixer);
        let mut out = vec![0.0f32; 256];
        mixer.render(&mut out, 2, 48_000);
        assert!(out.iter().all(|s| *s == 0.0));
    }
}
