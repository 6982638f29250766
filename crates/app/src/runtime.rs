use snowfield_core::director::{FrameInput, SceneDirector};
use snowfield_core::world::WorldSnapshot;
use tokio::sync::{mpsc, watch};
use tokio::time::{Duration, Instant, interval};
use tracing::info;

/// Everything the core reacts to, funneled through one channel so the
/// director stays confined to the world task.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlEvent {
    Tick { dt: f64 },
    Zoom { held: bool },
    Aim { bearing_deg: f64 },
    Replay,
}

/// Starts the world task that owns the scene director.
///
/// This task:
/// - Receives ticks and input events from the control channel.
/// - Applies them to the SceneDirector (state mutation strictly before the
///   snapshot is published for drawing).
/// - Sends updated snapshots to the state channel.
/// - Exits gracefully if the control channel closes.
pub async fn start_world_task(
    mut director: SceneDirector,
    mut control_rx: mpsc::Receiver<ControlEvent>,
    state_tx: watch::Sender<WorldSnapshot>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut input = FrameInput::default();
    info!("World task started");

    loop {
        match control_rx.recv().await {
            Some(ControlEvent::Tick { dt }) => {
                director.update(dt, input);
                state_tx.send(director.snapshot())?;
            }
            Some(ControlEvent::Zoom { held }) => {
                input.zoom_held = held;
            }
            Some(ControlEvent::Aim { bearing_deg }) => {
                input.aim_bearing_deg = bearing_deg;
            }
            Some(ControlEvent::Replay) => {
                director.request_replay();
                state_tx.send(director.snapshot())?;
            }
            None => {
                info!("Control channel closed, exiting world task");
                break;
            }
        }
    }

    Ok(())
}

/// Starts the tick sender task that periodically sends Tick events.
///
/// This task:
/// - Runs at the specified frequency (Hz).
/// - Computes the time delta (dt) since the last tick.
/// - Sends ControlEvent::Tick to the control channel.
/// - Keeps running separately to avoid blocking the world task.
pub async fn start_tick_task(
    control_tx: mpsc::Sender<ControlEvent>,
    hz: f64,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let interval_secs = 1.0 / hz;
    let mut interval = interval(Duration::from_secs_f64(interval_secs));
    let mut last_time = Instant::now();
    info!(
        "Tick task started with frequency {:.2} Hz (interval {:.3}s)",
        hz, interval_secs
    );

    loop {
        interval.tick().await;
        let now = Instant::now();
        let dt = now.duration_since(last_time).as_secs_f64();
        last_time = now;

        let event = ControlEvent::Tick { dt };
        if control_tx.send(event).await.is_err() {
            info!("Control channel closed, stopping tick task");
            break;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use snowfield_core::noise::ConstantNoise;
    use snowfield_core::ports::{NullAudio, NullCaptions};
    use tokio::time::{Duration, timeout};

    #[tokio::test]
    async fn test_tick_task_sends_events() {
        let (control_tx, mut control_rx) = mpsc::channel(10);
        let hz = 10.0; // 10 Hz for faster testing
        let handle = tokio::spawn(start_tick_task(control_tx, hz));

        // Wait for a few ticks
        let mut count = 0;
        while count < 3 {
            match timeout(Duration::from_millis(200), control_rx.recv()).await {
                Ok(Some(ControlEvent::Tick { dt })) => {
                    assert!(dt >= 0.0 && dt < 0.2); // dt should be around 0.1s
                    count += 1;
                }
                _ => break,
            }
        }

        // Forcibly stop the task to avoid hanging
        handle.abort();
        let _ = handle.await;
        assert_eq!(count, 3);
    }

    #[tokio::test]
    async fn test_world_task_applies_ticks_and_zoom() {
        let director = SceneDirector::new(
            Box::new(NullAudio),
            Box::new(NullCaptions),
            Box::new(ConstantNoise(0.0)),
        );
        let initial = director.snapshot();
        let (control_tx, control_rx) = mpsc::channel(10);
        let (state_tx, mut state_rx) = watch::channel(initial);
        let handle = tokio::spawn(start_world_task(director, control_rx, state_tx));

        control_tx
            .send(ControlEvent::Tick { dt: 0.1 })
            .await
            .unwrap();
        state_rx.changed().await.unwrap();
        let snapshot = state_rx.borrow().clone();
        assert!((snapshot.journey.elapsed_time - 0.1).abs() < 1e-9);

        // Zoom pauses the journey clock on the next tick.
        control_tx
            .send(ControlEvent::Zoom { held: true })
            .await
            .unwrap();
        control_tx
            .send(ControlEvent::Tick { dt: 0.1 })
            .await
            .unwrap();
        state_rx.changed().await.unwrap();
        let snapshot = state_rx.borrow().clone();
        assert!((snapshot.journey.elapsed_time - 0.1).abs() < 1e-9);

        drop(control_tx);
        let _ = handle.await;
    }
}
