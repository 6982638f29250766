//! Shared world state for the walking scene.
//!
//! Each sub-record is mutated only by its owning event callbacks plus one
//! per-frame update in the director; everything else reads snapshots.

use rand::Rng;

pub const BASE_WALK_SPEED: f64 = 24.0;
pub const BLIZZARD_DURATION: f64 = 30.0;
pub const BLIZZARD_SPEED_MULTIPLIER: f64 = 0.8;
pub const BLIZZARD_SNOW_DENSITY: f64 = 2.6;

const JOURNEY_SECONDS_MIN: f64 = 600.0;
const JOURNEY_SECONDS_MAX: f64 = 720.0;

/// Smoothing rate for wind amplitude chasing its target.
const WIND_SMOOTHING_RATE: f64 = 3.2;

pub const WIND_BASE_AMPLITUDE: f64 = 0.32;
pub const WIND_BOOSTED_AMPLITUDE: f64 = 0.7;
pub const WIND_BLIZZARD_AMPLITUDE: f64 = 1.0;

pub const REINDEER_START_PROGRESS: f64 = -0.25;
pub const REINDEER_END_PROGRESS: f64 = 1.4;

/// Total walking distance for a journey of the given length: the blizzard
/// window is walked at reduced speed, the rest at base speed.
pub fn target_distance(journey_seconds: f64) -> f64 {
    BASE_WALK_SPEED * (journey_seconds - BLIZZARD_DURATION)
        + BASE_WALK_SPEED * BLIZZARD_SPEED_MULTIPLIER * BLIZZARD_DURATION
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExperienceMode {
    Journey,
    Ending,
}

#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct WindState {
    pub amplitude: f64,
    pub target_amplitude: f64,
    /// Micro-variation sampled from the noise source, for the renderer.
    pub turbulence: f64,
    pub gust_timer: f64,
    pub blizzard_active: bool,
}

impl WindState {
    fn new() -> Self {
        Self {
            amplitude: WIND_BASE_AMPLITUDE,
            target_amplitude: WIND_BASE_AMPLITUDE,
            turbulence: 0.0,
            gust_timer: 0.0,
            blizzard_active: false,
        }
    }

    /// Chase the target amplitude with a frame-rate independent smoother.
    /// The only direct assignment to `amplitude` happens at reset.
    pub fn settle(&mut self, dt: f64) {
        let blend = 1.0 - (-WIND_SMOOTHING_RATE * dt).exp();
        self.amplitude += (self.target_amplitude - self.amplitude) * blend;
    }
}

#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct WolfState {
    pub active: bool,
    pub withdrawing: bool,
    pub calmed: bool,
    pub growl_boosted: bool,
    pub focus_time: f64,
    pub spawn_time: f64,
    pub withdraw_elapsed: f64,
    pub bearing_deg: f64,
}

impl WolfState {
    fn new() -> Self {
        Self {
            active: false,
            withdrawing: false,
            calmed: false,
            growl_boosted: false,
            focus_time: 0.0,
            spawn_time: 0.0,
            withdraw_elapsed: 0.0,
            bearing_deg: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct ReindeerState {
    pub active: bool,
    pub progress: f64,
    pub speed: f64,
}

impl ReindeerState {
    fn new() -> Self {
        Self {
            active: false,
            progress: REINDEER_START_PROGRESS,
            speed: 0.14,
        }
    }
}

#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct HutState {
    /// Permanent for the session once set.
    pub visible: bool,
    pub reveal_distance: f64,
    pub progress: f64,
}

impl HutState {
    fn new() -> Self {
        Self {
            visible: false,
            reveal_distance: 0.0,
            progress: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct EndingState {
    pub active: bool,
    pub progress: f64,
    pub steam_phase: f64,
}

impl EndingState {
    fn new() -> Self {
        Self {
            active: false,
            progress: 0.0,
            steam_phase: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct JourneyState {
    pub elapsed_time: f64,
    pub scroll_distance: f64,
    pub target_distance: f64,
}

/// The mutable state altered by events and consumed by rendering.
#[derive(Debug, Clone)]
pub struct WorldState {
    pub mode: ExperienceMode,
    pub wind: WindState,
    pub wolf: WolfState,
    pub reindeer: ReindeerState,
    pub hut: HutState,
    pub ending: EndingState,
    pub journey: JourneyState,
    pub snow_density: f64,
    pub snow_density_target: f64,
    pub walk_speed_multiplier: f64,
}

impl WorldState {
    /// Fresh session state. The journey length is randomized once here and
    /// immutable until the next reset.
    pub fn new(rng: &mut impl Rng) -> Self {
        let journey_seconds = rng.random_range(JOURNEY_SECONDS_MIN..=JOURNEY_SECONDS_MAX);
        Self {
            mode: ExperienceMode::Journey,
            wind: WindState::new(),
            wolf: WolfState::new(),
            reindeer: ReindeerState::new(),
            hut: HutState::new(),
            ending: EndingState::new(),
            journey: JourneyState {
                elapsed_time: 0.0,
                scroll_distance: 0.0,
                target_distance: target_distance(journey_seconds),
            },
            snow_density: 1.0,
            snow_density_target: 1.0,
            walk_speed_multiplier: 1.0,
        }
    }

    /// Fraction of the journey walked, also used as the day/evening/night
    /// palette position.
    pub fn time_of_day(&self) -> f64 {
        if self.journey.target_distance <= 0.0 {
            return 1.0;
        }
        (self.journey.scroll_distance / self.journey.target_distance).clamp(0.0, 1.0)
    }
}

/// World state to share outwardly at a point in time.
#[derive(Debug, Clone, serde::Serialize)]
pub struct WorldSnapshot {
    pub mode: ExperienceMode,
    pub time_of_day: f64,
    pub wind: WindState,
    pub snow_density: f64,
    pub walk_speed_multiplier: f64,
    pub wolf: WolfState,
    pub reindeer: ReindeerState,
    pub hut: HutState,
    pub ending: EndingState,
    pub journey: JourneyState,
}

impl WorldSnapshot {
    pub fn from_world_state(world: &WorldState) -> Self {
        Self {
            mode: world.mode,
            time_of_day: world.time_of_day(),
            wind: world.wind,
            snow_density: world.snow_density,
            walk_speed_multiplier: world.walk_speed_multiplier,
            wolf: world.wolf,
            reindeer: world.reindeer,
            hut: world.hut,
            ending: world.ending,
            journey: world.journey,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_target_distance_derivation() {
        // 24*(660-30) + 24*0.8*30 = 15120 + 576
        assert_eq!(target_distance(660.0), 15696.0);
    }

    #[test]
    fn test_new_session_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let world = WorldState::new(&mut rng);
            let d = world.journey.target_distance;
            assert!(d >= target_distance(JOURNEY_SECONDS_MIN));
            assert!(d <= target_distance(JOURNEY_SECONDS_MAX));
            assert_eq!(world.journey.elapsed_time, 0.0);
            assert_eq!(world.journey.scroll_distance, 0.0);
            assert_eq!(world.wind.amplitude, WIND_BASE_AMPLITUDE);
            assert!(!world.wolf.active);
            assert_eq!(world.reindeer.progress, REINDEER_START_PROGRESS);
            assert_eq!(world.snow_density, 1.0);
            assert_eq!(world.walk_speed_multiplier, 1.0);
        }
    }

    #[test]
    fn test_wind_settle_converges() {
        let mut wind = WindState::new();
        wind.target_amplitude = WIND_BLIZZARD_AMPLITUDE;
        for _ in 0..600 {
            wind.settle(1.0 / 60.0);
        }
        assert!((wind.amplitude - WIND_BLIZZARD_AMPLITUDE).abs() < 1e-6);
    }

    #[test]
    fn test_wind_settle_step_size_independent() {
        let mut coarse = WindState::new();
        let mut fine = WindState::new();
        coarse.target_amplitude = 1.0;
        fine.target_amplitude = 1.0;
        coarse.settle(0.1);
        for _ in 0..10 {
            fine.settle(0.01);
        }
        assert!((coarse.amplitude - fine.amplitude).abs() < 1e-9);
    }

    #[test]
    fn test_snapshot_serializes() {
        let mut rng = StdRng::seed_from_u64(1);
        let world = WorldState::new(&mut rng);
        let snapshot = WorldSnapshot::from_world_state(&world);
        let json = serde_json::to_string(&snapshot).unwrap();
        assert!(json.contains("\"mode\":\"journey\""));
        assert!(json.contains("time_of_day"));
    }
}
