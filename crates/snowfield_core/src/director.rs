//! Per-frame orchestration: advances journey time, runs the event timeline,
//! applies event effects to the world, and decides when the ending begins.

use crate::noise::NoiseSource;
use crate::ports::{AudioPort, CaptionKey, CaptionPort, Cue, Tracker};
use crate::timeline::{self, EventKind, EventTimeline, Fire};
use crate::world::{
    BLIZZARD_SNOW_DENSITY, BLIZZARD_SPEED_MULTIPLIER, BASE_WALK_SPEED, ExperienceMode,
    REINDEER_END_PROGRESS, REINDEER_START_PROGRESS, WIND_BASE_AMPLITUDE, WIND_BLIZZARD_AMPLITUDE,
    WIND_BOOSTED_AMPLITUDE, WorldSnapshot, WorldState,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Aim must land this close to the wolf's bearing to count as focus.
const WOLF_FOCUS_CONE_DEG: f64 = 6.0;
/// Sustained focus needed to calm the wolf.
const WOLF_FOCUS_HOLD: f64 = 2.2;
/// Journey seconds after spawn before the wolf gives up and withdraws.
const WOLF_TIMEOUT: f64 = 5.0;
/// A withdrawal always takes this long from its own start.
const WOLF_WITHDRAW_SECONDS: f64 = 3.2;

const STRIDE_DISTANCE: f64 = 16.0;
const BREATH_INTERVAL: f64 = 2.4;
const SOFT_CAPTION_HOLD: f64 = 3.0;

const ENDING_RAMP_RATE: f64 = 0.25;
const ENDING_STEAM_RATE: f64 = 1.4;

/// Snow density chases the blizzard target slower than the wind does.
const SNOW_SMOOTHING_RATE: f64 = 1.6;

/// The only inputs the core reacts to each frame; everything else stays in
/// the rendering layer.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameInput {
    pub zoom_held: bool,
    pub aim_bearing_deg: f64,
}

pub struct SceneDirector {
    world: WorldState,
    timeline: EventTimeline,
    audio: Box<dyn AudioPort + Send>,
    captions: Box<dyn CaptionPort + Send>,
    noise: Box<dyn NoiseSource + Send>,
    rng: StdRng,
    session_started: bool,
    zoom_was_held: bool,
    zoom_hold_time: f64,
    soft_caption_shown: bool,
    breath_timer: f64,
    stride_accum: f64,
    left_step_next: bool,
}

impl SceneDirector {
    pub fn new(
        audio: Box<dyn AudioPort + Send>,
        captions: Box<dyn CaptionPort + Send>,
        noise: Box<dyn NoiseSource + Send>,
    ) -> Self {
        Self::with_rng(audio, captions, noise, StdRng::from_os_rng())
    }

    /// Deterministic constructor for tests and replays.
    pub fn with_rng(
        audio: Box<dyn AudioPort + Send>,
        captions: Box<dyn CaptionPort + Send>,
        noise: Box<dyn NoiseSource + Send>,
        mut rng: StdRng,
    ) -> Self {
        let world = WorldState::new(&mut rng);
        let timeline = EventTimeline::new(&mut rng);
        Self {
            world,
            timeline,
            audio,
            captions,
            noise,
            rng,
            session_started: false,
            zoom_was_held: false,
            zoom_hold_time: 0.0,
            soft_caption_shown: false,
            breath_timer: 0.0,
            stride_accum: 0.0,
            left_step_next: false,
        }
    }

    pub fn world(&self) -> &WorldState {
        &self.world
    }

    pub fn timeline(&self) -> &EventTimeline {
        &self.timeline
    }

    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot::from_world_state(&self.world)
    }

    /// Replay affordance: only honored once the ending is showing.
    pub fn request_replay(&mut self) {
        if self.world.mode == ExperienceMode::Ending {
            self.reset_experience();
        }
    }

    /// Returns every sub-state to its initial value and rebuilds the event
    /// schedule with fresh jitter. User audio preferences are not touched;
    /// they live with the host.
    pub fn reset_experience(&mut self) {
        self.audio.stop_tracked(Tracker::Breath);
        self.audio.stop(Cue::BlizzardLoop);
        self.audio.stop(Cue::IndoorFireLoop);
        self.world = WorldState::new(&mut self.rng);
        self.timeline.reset(&mut self.rng);
        self.session_started = false;
        self.zoom_was_held = false;
        self.zoom_hold_time = 0.0;
        self.soft_caption_shown = false;
        self.breath_timer = 0.0;
        self.stride_accum = 0.0;
        self.left_step_next = false;
        tracing::info!("experience reset");
    }

    /// One frame of state advancement. State mutation completes before the
    /// caller reads the snapshot for drawing.
    pub fn update(&mut self, dt: f64, input: FrameInput) {
        if !self.session_started {
            self.session_started = true;
            self.audio.play(Cue::WindLoop);
        }

        if self.world.mode == ExperienceMode::Ending {
            self.update_ending(dt);
            return;
        }

        self.update_zoom(dt, input);

        // The zoom interaction pauses the journey clock; the timeline has no
        // clock of its own, so nothing fires while held.
        let journey_dt = if input.zoom_held { 0.0 } else { dt };
        if journey_dt > 0.0 {
            self.world.journey.elapsed_time += journey_dt;
            let step = BASE_WALK_SPEED * self.world.walk_speed_multiplier * journey_dt;
            self.world.journey.scroll_distance += step;
            self.advance_stride(step);

            let fires = self
                .timeline
                .advance(self.world.journey.elapsed_time, &self.world);
            for fire in fires {
                self.apply_fire(fire);
            }
        }

        self.update_wind(dt, journey_dt);
        self.update_wolf(dt, input);
        self.update_reindeer(journey_dt);
        self.update_hut();
        self.update_snow(dt);
        self.audio.set_wind_level(self.world.wind.amplitude);

        self.maybe_begin_ending();
    }

    fn update_zoom(&mut self, dt: f64, input: FrameInput) {
        if input.zoom_held {
            if !self.zoom_was_held {
                self.zoom_hold_time = 0.0;
                self.soft_caption_shown = false;
                self.breath_timer = BREATH_INTERVAL;
                self.audio.play(Cue::BreathShort);
                self.captions.show(CaptionKey::ZoomShort, 2.5);
            } else {
                self.zoom_hold_time += dt;
                self.breath_timer -= dt;
                if self.breath_timer <= 0.0 {
                    self.audio.play(Cue::BreathSoft);
                    self.breath_timer += BREATH_INTERVAL;
                }
                if self.zoom_hold_time >= SOFT_CAPTION_HOLD && !self.soft_caption_shown {
                    self.soft_caption_shown = true;
                    self.captions.show(CaptionKey::ZoomSoft, 2.5);
                }
            }
        } else if self.zoom_was_held {
            // Releasing the zoom silences in-flight breath sounds at once.
            self.audio.stop_tracked(Tracker::Breath);
        }
        self.zoom_was_held = input.zoom_held;
    }

    fn advance_stride(&mut self, step: f64) {
        self.stride_accum += step;
        while self.stride_accum >= STRIDE_DISTANCE {
            self.stride_accum -= STRIDE_DISTANCE;
            self.audio.play(Cue::Step {
                left: self.left_step_next,
            });
            self.left_step_next = !self.left_step_next;
        }
    }

    fn apply_fire(&mut self, fire: Fire) {
        match fire {
            Fire::Started(EventKind::Gust) => {
                self.world.wind.target_amplitude = WIND_BOOSTED_AMPLITUDE;
                self.world.wind.gust_timer = timeline::GUST_DURATION;
                self.audio.play(Cue::WindLoop);
                self.captions.show(CaptionKey::Wind, 4.0);
            }
            Fire::Ended(EventKind::Gust) => {
                if !self.world.wind.blizzard_active {
                    self.world.wind.target_amplitude = WIND_BASE_AMPLITUDE;
                }
            }
            Fire::Started(EventKind::Blizzard) => {
                self.world.wind.blizzard_active = true;
                self.world.wind.target_amplitude = WIND_BLIZZARD_AMPLITUDE;
                self.world.snow_density_target = BLIZZARD_SNOW_DENSITY;
                self.world.walk_speed_multiplier = BLIZZARD_SPEED_MULTIPLIER;
                self.audio.play(Cue::BlizzardLoop);
                self.captions.show(CaptionKey::Blizzard, 5.0);
            }
            Fire::Ended(EventKind::Blizzard) => {
                self.world.wind.blizzard_active = false;
                // A still-running gust keeps its claim on the target.
                if self.world.wind.gust_timer <= 0.0 {
                    self.world.wind.target_amplitude = WIND_BASE_AMPLITUDE;
                }
                self.world.snow_density_target = 1.0;
                self.world.walk_speed_multiplier = 1.0;
                self.audio.stop(Cue::BlizzardLoop);
            }
            Fire::Started(EventKind::WolfEncounter) => {
                let wolf = &mut self.world.wolf;
                wolf.active = true;
                wolf.spawn_time = self.world.journey.elapsed_time;
                wolf.bearing_deg = self.rng.random_range(-40.0..=40.0);
                self.audio.play(Cue::WolfGrowl { boosted: false });
                self.captions.show(CaptionKey::Wolf, 4.0);
            }
            Fire::Ended(EventKind::WolfEncounter) => {}
            Fire::Started(EventKind::ReindeerPass) => {
                let reindeer = &mut self.world.reindeer;
                reindeer.active = true;
                reindeer.progress = REINDEER_START_PROGRESS;
                reindeer.speed = self.rng.random_range(0.12..=0.16);
                self.captions.show(CaptionKey::Reindeer, 4.0);
            }
            Fire::Ended(EventKind::ReindeerPass) => {}
            Fire::Started(EventKind::HutReveal) => {
                self.world.hut.visible = true;
                self.world.hut.reveal_distance = self.world.journey.scroll_distance;
            }
            Fire::Ended(EventKind::HutReveal) => {}
        }
    }

    fn update_wind(&mut self, dt: f64, journey_dt: f64) {
        let wind = &mut self.world.wind;
        wind.gust_timer = (wind.gust_timer - journey_dt).max(0.0);
        wind.settle(dt);
        wind.turbulence = self
            .noise
            .sample(self.world.journey.elapsed_time * 0.4, wind.amplitude)
            * wind.amplitude
            * 0.3;
    }

    /// idle -> active -> (calmed | timed-out) -> withdrawing -> idle.
    fn update_wolf(&mut self, dt: f64, input: FrameInput) {
        let journey_time = self.world.journey.elapsed_time;
        let wolf = &mut self.world.wolf;
        if !wolf.active {
            return;
        }
        if wolf.withdrawing {
            wolf.withdraw_elapsed += dt;
            if wolf.withdraw_elapsed >= WOLF_WITHDRAW_SECONDS {
                wolf.active = false;
                wolf.withdrawing = false;
            }
            return;
        }

        let aligned = input.zoom_held
            && wrap_degrees(input.aim_bearing_deg - wolf.bearing_deg).abs() <= WOLF_FOCUS_CONE_DEG;
        if aligned {
            wolf.focus_time += dt;
        } else {
            wolf.focus_time = (wolf.focus_time - dt * 2.0).max(0.0);
        }

        if wolf.focus_time >= WOLF_FOCUS_HOLD {
            wolf.calmed = true;
            wolf.withdrawing = true;
            wolf.withdraw_elapsed = 0.0;
        } else if journey_time - wolf.spawn_time >= WOLF_TIMEOUT {
            // No resolution in time: aggressive withdrawal.
            wolf.growl_boosted = true;
            wolf.withdrawing = true;
            wolf.withdraw_elapsed = 0.0;
            self.audio.play(Cue::WolfGrowl { boosted: true });
        }
    }

    fn update_reindeer(&mut self, journey_dt: f64) {
        let reindeer = &mut self.world.reindeer;
        if !reindeer.active {
            return;
        }
        reindeer.progress += reindeer.speed * journey_dt;
        if reindeer.progress >= REINDEER_END_PROGRESS {
            reindeer.active = false;
        }
    }

    /// Hut progress is derived from scroll distance every frame rather than
    /// integrated, so it cannot drift.
    fn update_hut(&mut self) {
        let hut = &mut self.world.hut;
        if !hut.visible {
            return;
        }
        let remaining = self.world.journey.target_distance - hut.reveal_distance;
        hut.progress = if remaining <= 0.0 {
            1.0
        } else {
            ((self.world.journey.scroll_distance - hut.reveal_distance) / remaining).clamp(0.0, 1.0)
        };
    }

    fn update_snow(&mut self, dt: f64) {
        let blend = 1.0 - (-SNOW_SMOOTHING_RATE * dt).exp();
        self.world.snow_density += (self.world.snow_density_target - self.world.snow_density) * blend;
    }

    /// One-way, idempotent transition into the ending.
    fn maybe_begin_ending(&mut self) {
        if self.world.mode != ExperienceMode::Journey {
            return;
        }
        if self.world.journey.scroll_distance < self.world.journey.target_distance {
            return;
        }
        self.world.mode = ExperienceMode::Ending;
        self.world.ending.active = true;
        self.world.wind.target_amplitude = 0.0;
        self.audio.stop_tracked(Tracker::Breath);
        self.audio.stop(Cue::WindLoop);
        self.audio.stop(Cue::BlizzardLoop);
        self.audio.play(Cue::IndoorFireLoop);
        self.captions.show(CaptionKey::Fire, 4.0);
        tracing::info!("journey complete, ending begins");
    }

    fn update_ending(&mut self, dt: f64) {
        let ending = &mut self.world.ending;
        ending.progress = (ending.progress + ENDING_RAMP_RATE * dt).min(1.0);
        ending.steam_phase += ENDING_STEAM_RATE * dt;
        self.world.wind.settle(dt);
        self.audio.set_wind_level(self.world.wind.amplitude);
    }
}

fn wrap_degrees(deg: f64) -> f64 {
    let mut d = deg % 360.0;
    if d > 180.0 {
        d -= 360.0;
    } else if d < -180.0 {
        d += 360.0;
    }
    d
}
