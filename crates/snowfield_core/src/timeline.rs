//! Scheduled world events keyed by journey time.
//!
//! The timeline has no clock of its own: it only reacts to the journey time
//! passed into [`EventTimeline::advance`], so a paused journey fires nothing.

use crate::world::{BLIZZARD_DURATION, WorldState};
use rand::Rng;

/// Uniform jitter applied to each nominal time at schedule build.
const TIME_JITTER: f64 = 0.15;

pub const GUST_DURATION: f64 = 18.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Gust,
    WolfEncounter,
    Blizzard,
    ReindeerPass,
    HutReveal,
}

/// How an event leaves the schedule once started.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Completion {
    /// Ends a fixed number of journey seconds after its start time.
    Duration(f64),
    /// Ends when the owning sub-state reports it is no longer running.
    Condition,
    /// Fires once with no end callback.
    Instant,
}

#[derive(Debug, Clone)]
pub struct ScheduledEvent {
    pub kind: EventKind,
    /// Jittered journey time, stable for the session.
    pub time: f64,
    pub completion: Completion,
    pub started: bool,
    pub completed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Fire {
    Started(EventKind),
    Ended(EventKind),
}

const SCHEDULE: &[(EventKind, f64, Completion)] = &[
    (EventKind::Gust, 75.0, Completion::Duration(GUST_DURATION)),
    (EventKind::WolfEncounter, 180.0, Completion::Condition),
    (
        EventKind::Blizzard,
        330.0,
        Completion::Duration(BLIZZARD_DURATION),
    ),
    (EventKind::ReindeerPass, 430.0, Completion::Condition),
    (EventKind::HutReveal, 480.0, Completion::Instant),
];

pub struct EventTimeline {
    events: Vec<ScheduledEvent>,
}

impl EventTimeline {
    pub fn new(rng: &mut impl Rng) -> Self {
        let events = SCHEDULE
            .iter()
            .map(|&(kind, nominal, completion)| ScheduledEvent {
                kind,
                time: nominal * rng.random_range(1.0 - TIME_JITTER..=1.0 + TIME_JITTER),
                completion,
                started: false,
                completed: false,
            })
            .collect();
        Self { events }
    }

    /// Rebuilds the full schedule with fresh jitter. Used on replay.
    pub fn reset(&mut self, rng: &mut impl Rng) {
        *self = Self::new(rng);
    }

    pub fn events(&self) -> &[ScheduledEvent] {
        &self.events
    }

    fn condition_met(kind: EventKind, world: &WorldState) -> bool {
        match kind {
            EventKind::WolfEncounter => !world.wolf.active,
            EventKind::ReindeerPass => !world.reindeer.active,
            EventKind::Gust | EventKind::Blizzard | EventKind::HutReveal => false,
        }
    }

    /// Evaluates every pending event against the current journey time.
    ///
    /// Starts are level-triggered, so a single large step may fire an event's
    /// start and duration-based end in the same call. Condition-based ends
    /// are never evaluated in the call that started the event: the caller has
    /// not applied the start mutation yet at that point.
    pub fn advance(&mut self, journey_time: f64, world: &WorldState) -> Vec<Fire> {
        let mut fired = Vec::new();
        for event in &mut self.events {
            if event.completed {
                continue;
            }
            let mut just_started = false;
            if !event.started && journey_time >= event.time {
                event.started = true;
                just_started = true;
                tracing::debug!(kind = ?event.kind, time = event.time, "timeline event started");
                fired.push(Fire::Started(event.kind));
            }
            if !event.started {
                continue;
            }
            let ended = match event.completion {
                Completion::Duration(duration) => journey_time >= event.time + duration,
                Completion::Condition => !just_started && Self::condition_met(event.kind, world),
                Completion::Instant => {
                    event.completed = true;
                    false
                }
            };
            if ended {
                event.completed = true;
                tracing::debug!(kind = ?event.kind, "timeline event ended");
                fired.push(Fire::Ended(event.kind));
            }
        }
        fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn world() -> WorldState {
        WorldState::new(&mut StdRng::seed_from_u64(0))
    }

    #[test]
    fn test_jitter_within_bounds() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..20 {
            let timeline = EventTimeline::new(&mut rng);
            for (event, &(_, nominal, _)) in timeline.events().iter().zip(SCHEDULE) {
                assert!(event.time >= nominal * 0.85 && event.time <= nominal * 1.15);
            }
        }
    }

    #[test]
    fn test_reset_produces_fresh_jitter() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut timeline = EventTimeline::new(&mut rng);
        let before: Vec<f64> = timeline.events().iter().map(|e| e.time).collect();
        timeline.reset(&mut rng);
        let after: Vec<f64> = timeline.events().iter().map(|e| e.time).collect();
        assert_ne!(before, after);
    }

    #[test]
    fn test_start_and_end_fire_exactly_once() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut timeline = EventTimeline::new(&mut rng);
        let world = world();
        let gust_time = timeline.events()[0].time;

        let mut starts = 0;
        let mut ends = 0;
        let mut t = 0.0;
        while t < gust_time + GUST_DURATION + 10.0 {
            for fire in timeline.advance(t, &world) {
                match fire {
                    Fire::Started(EventKind::Gust) => starts += 1,
                    Fire::Ended(EventKind::Gust) => ends += 1,
                    _ => {}
                }
            }
            t += 0.37;
        }
        assert_eq!(starts, 1);
        assert_eq!(ends, 1);
    }

    #[test]
    fn test_large_step_skips_whole_window() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut timeline = EventTimeline::new(&mut rng);
        let world = world();
        // One advance far past every duration event.
        let fired = timeline.advance(10_000.0, &world);
        assert!(fired.contains(&Fire::Started(EventKind::Gust)));
        assert!(fired.contains(&Fire::Ended(EventKind::Gust)));
        assert!(fired.contains(&Fire::Started(EventKind::Blizzard)));
        assert!(fired.contains(&Fire::Ended(EventKind::Blizzard)));
        assert!(fired.contains(&Fire::Started(EventKind::HutReveal)));
        // Nothing fires twice afterwards.
        assert!(timeline.advance(20_000.0, &world).is_empty()
            || timeline
                .advance(20_000.0, &world)
                .iter()
                .all(|f| matches!(f, Fire::Ended(_))));
    }

    #[test]
    fn test_condition_event_completes_when_substate_clears() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut timeline = EventTimeline::new(&mut rng);
        let mut world = world();
        let reindeer_time = timeline.events()[3].time;

        let fired = timeline.advance(reindeer_time, &world);
        assert!(fired.contains(&Fire::Started(EventKind::ReindeerPass)));
        // The start mutation has not been applied yet, so the condition must
        // not complete the event in the same call.
        assert!(!fired.contains(&Fire::Ended(EventKind::ReindeerPass)));

        world.reindeer.active = true;
        assert!(
            !timeline
                .advance(reindeer_time + 1.0, &world)
                .contains(&Fire::Ended(EventKind::ReindeerPass))
        );

        world.reindeer.active = false;
        assert!(
            timeline
                .advance(reindeer_time + 2.0, &world)
                .contains(&Fire::Ended(EventKind::ReindeerPass))
        );
    }

    #[test]
    fn test_paused_journey_fires_nothing() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut timeline = EventTimeline::new(&mut rng);
        let world = world();
        for _ in 0..100 {
            assert!(timeline.advance(0.0, &world).is_empty());
        }
    }
}
