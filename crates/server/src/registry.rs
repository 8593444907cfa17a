// crates/server/src/registry.rs
//! Periodic per-session tasks (overlay repaints, auto-refresh patches).
//!
//! Each live feature is one spawned ticker that sends [`ControlEvent::Tick`]
//! back into the controller's queue; the tasks never touch session state
//! themselves. Every start mints a fresh `task_id`, so a tick from a
//! ticker that was stopped and restarted carries a stale id the controller
//! can recognize and discard. Cancellation is cooperative through a
//! [`CancellationToken`].

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedSender;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::controller::ControlEvent;
use crate::protocol::SessionId;

/// Overlay repaint cadence. Fast enough to read as live, slow enough to
/// stay out of the way.
pub const OVERLAY_PERIOD: Duration = Duration::from_millis(1500);

/// Auto-refresh waits before its first patch so the freshly rendered
/// surface is not immediately repainted.
pub const AUTO_REFRESH_START_DELAY: Duration = Duration::from_secs(5);
pub const AUTO_REFRESH_PERIOD: Duration = Duration::from_secs(10);

/// The periodic features a session can have running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    AutoRefresh,
    Overlay,
}

impl Feature {
    pub const ALL: [Feature; 2] = [Feature::AutoRefresh, Feature::Overlay];

    pub fn start_delay(self) -> Duration {
        match self {
            Feature::AutoRefresh => AUTO_REFRESH_START_DELAY,
            Feature::Overlay => Duration::ZERO,
        }
    }

    pub fn period(self) -> Duration {
        match self {
            Feature::AutoRefresh => AUTO_REFRESH_PERIOD,
            Feature::Overlay => OVERLAY_PERIOD,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Feature::AutoRefresh => "auto_refresh",
            Feature::Overlay => "overlay",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

struct TaskHandle {
    task_id: u64,
    cancel: CancellationToken,
}

/// Owns the ticker tasks. Lives inside the controller task, so none of
/// this needs locking.
pub struct TaskRegistry {
    tasks: HashMap<(SessionId, Feature), TaskHandle>,
    next_task_id: u64,
    events: UnboundedSender<ControlEvent>,
}

impl TaskRegistry {
    pub fn new(events: UnboundedSender<ControlEvent>) -> Self {
        Self {
            tasks: HashMap::new(),
            next_task_id: 0,
            events,
        }
    }

    /// Start a ticker for `(session, feature)`. Starting an already-live
    /// feature is a no-op that returns the live task id; restarting takes
    /// an explicit `stop` first.
    pub fn start(&mut self, session: &SessionId, feature: Feature) -> u64 {
        match self.tasks.entry((session.clone(), feature)) {
            Entry::Occupied(entry) => entry.get().task_id,
            Entry::Vacant(entry) => {
                self.next_task_id += 1;
                let task_id = self.next_task_id;
                let cancel = CancellationToken::new();
                spawn_ticker(
                    session.clone(),
                    feature,
                    task_id,
                    cancel.clone(),
                    self.events.clone(),
                );
                entry.insert(TaskHandle { task_id, cancel });
                tracing::debug!(%session, %feature, task_id, "ticker started");
                task_id
            }
        }
    }

    /// Cancel and forget a ticker. Returns false if it was not live.
    pub fn stop(&mut self, session: &SessionId, feature: Feature) -> bool {
        match self.tasks.remove(&(session.clone(), feature)) {
            Some(handle) => {
                handle.cancel.cancel();
                tracing::debug!(%session, %feature, task_id = handle.task_id, "ticker stopped");
                true
            }
            None => false,
        }
    }

    pub fn stop_all(&mut self, session: &SessionId) {
        for feature in Feature::ALL {
            self.stop(session, feature);
        }
    }

    pub fn is_live(&self, session: &SessionId, feature: Feature) -> bool {
        self.tasks.contains_key(&(session.clone(), feature))
    }

    /// The id a tick must carry to count as coming from the live ticker.
    pub fn live_task_id(&self, session: &SessionId, feature: Feature) -> Option<u64> {
        self.tasks
            .get(&(session.clone(), feature))
            .map(|h| h.task_id)
    }

    pub fn live_features(&self, session: &SessionId) -> Vec<Feature> {
        Feature::ALL
            .into_iter()
            .filter(|f| self.is_live(session, *f))
            .collect()
    }

    pub fn live_count(&self) -> usize {
        self.tasks.len()
    }
}

fn spawn_ticker(
    session: SessionId,
    feature: Feature,
    task_id: u64,
    cancel: CancellationToken,
    events: UnboundedSender<ControlEvent>,
) {
    tokio::spawn(async move {
        let start = Instant::now() + feature.start_delay();
        let mut ticker = time::interval_at(start, feature.period());
        // late ticks fold into the next one instead of bursting
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    let tick = ControlEvent::Tick {
                        session: session.clone(),
                        feature,
                        task_id,
                    };
                    if events.send(tick).is_err() {
                        break;
                    }
                }
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::{self, UnboundedReceiver};
    use tokio::time::timeout;

    fn sid(s: &str) -> SessionId {
        SessionId::from(s)
    }

    fn test_registry() -> (TaskRegistry, UnboundedReceiver<ControlEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (TaskRegistry::new(tx), rx)
    }

    fn expect_tick(event: Option<ControlEvent>) -> (SessionId, Feature, u64) {
        match event {
            Some(ControlEvent::Tick {
                session,
                feature,
                task_id,
            }) => (session, feature, task_id),
            other => panic!("expected a tick, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn overlay_ticks_immediately_then_on_its_period() {
        let (mut registry, mut rx) = test_registry();
        let t0 = Instant::now();
        registry.start(&sid("a"), Feature::Overlay);

        let (session, feature, _) = expect_tick(rx.recv().await);
        assert_eq!(session, sid("a"));
        assert_eq!(feature, Feature::Overlay);
        assert_eq!(t0.elapsed(), Duration::ZERO);

        expect_tick(rx.recv().await);
        assert_eq!(t0.elapsed(), OVERLAY_PERIOD);
    }

    #[tokio::test(start_paused = true)]
    async fn auto_refresh_waits_its_start_delay() {
        let (mut registry, mut rx) = test_registry();
        let t0 = Instant::now();
        registry.start(&sid("a"), Feature::AutoRefresh);

        expect_tick(rx.recv().await);
        assert_eq!(t0.elapsed(), AUTO_REFRESH_START_DELAY);

        expect_tick(rx.recv().await);
        assert_eq!(t0.elapsed(), AUTO_REFRESH_START_DELAY + AUTO_REFRESH_PERIOD);
    }

    #[tokio::test(start_paused = true)]
    async fn start_is_a_noop_while_live() {
        let (mut registry, _rx) = test_registry();
        let first = registry.start(&sid("a"), Feature::Overlay);
        for _ in 0..50 {
            assert_eq!(registry.start(&sid("a"), Feature::Overlay), first);
        }
        assert_eq!(registry.live_count(), 1);
        assert_eq!(registry.live_task_id(&sid("a"), Feature::Overlay), Some(first));
    }

    #[tokio::test(start_paused = true)]
    async fn stop_cancels_the_ticker() {
        let (mut registry, mut rx) = test_registry();
        registry.start(&sid("a"), Feature::Overlay);
        expect_tick(rx.recv().await);

        assert!(registry.stop(&sid("a"), Feature::Overlay));
        assert!(!registry.is_live(&sid("a"), Feature::Overlay));
        assert!(!registry.stop(&sid("a"), Feature::Overlay));

        // no further ticks arrive once cancelled
        let quiet = timeout(OVERLAY_PERIOD * 4, rx.recv()).await;
        assert!(quiet.is_err(), "ticker kept running after stop");
    }

    #[tokio::test(start_paused = true)]
    async fn restart_mints_a_new_task_id() {
        let (mut registry, _rx) = test_registry();
        let first = registry.start(&sid("a"), Feature::AutoRefresh);
        registry.stop(&sid("a"), Feature::AutoRefresh);
        let second = registry.start(&sid("a"), Feature::AutoRefresh);
        assert!(second > first);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_all_clears_both_features() {
        let (mut registry, _rx) = test_registry();
        registry.start(&sid("a"), Feature::Overlay);
        registry.start(&sid("a"), Feature::AutoRefresh);
        registry.start(&sid("b"), Feature::Overlay);
        assert_eq!(
            registry.live_features(&sid("a")),
            vec![Feature::AutoRefresh, Feature::Overlay]
        );

        registry.stop_all(&sid("a"));
        assert!(registry.live_features(&sid("a")).is_empty());
        // other sessions are untouched
        assert_eq!(registry.live_count(), 1);
        assert!(registry.is_live(&sid("b"), Feature::Overlay));
    }
}
