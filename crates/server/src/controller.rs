// crates/server/src/controller.rs
//! The display controller: single owner of all session display state.
//!
//! Every input funnels into one unbounded queue: client events from the
//! socket tasks, disconnect notices, ticker wakeups, and REST queries.
//! One spawned task drains the queue and mutates the [`SessionStore`] and
//! [`TaskRegistry`], so transitions for a session are totally ordered and
//! none of the state needs a lock.
//!
//! Ticks carry the `task_id` their ticker was started with. The handler
//! discards any tick whose id is not the live one, which closes the race
//! where a ticker is stopped and restarted while its old tick still sits
//! in the queue.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use hostdeck_core::{render, DisplayMode, LayoutSize, SlotTile, SurfaceView, TileKind};

use crate::connections::ConnectionRegistry;
use crate::metrics::{
    record_frame, record_render_failure, record_self_cancel, record_tick, record_transition,
    set_sessions_active, set_tasks_live,
};
use crate::protocol::{ClientEvent, ClosedReason, ServerFrame, SessionId};
use crate::registry::{Feature, TaskRegistry};
use crate::sampler::MetricSampler;
use crate::session::SessionStore;

/// Everything the controller reacts to.
#[derive(Debug)]
pub enum ControlEvent {
    /// An interaction relayed by a socket task.
    Client {
        session: SessionId,
        event: ClientEvent,
    },
    /// The session's socket went away.
    Disconnected { session: SessionId },
    /// A ticker fired for `(session, feature)`.
    Tick {
        session: SessionId,
        feature: Feature,
        task_id: u64,
    },
    /// REST query for the session listing.
    Sessions {
        reply: oneshot::Sender<Vec<SessionSummary>>,
    },
}

/// One row of the `/api/sessions` listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub session_id: String,
    pub layout_size: LayoutSize,
    #[serde(flatten)]
    pub mode: DisplayMode,
    pub live_features: Vec<Feature>,
}

pub struct Controller {
    store: SessionStore,
    registry: TaskRegistry,
    connections: Arc<ConnectionRegistry>,
    sampler: Arc<MetricSampler>,
}

/// Spawn the controller task. It runs until every sender of `events_rx`
/// is dropped.
pub fn spawn(
    connections: Arc<ConnectionRegistry>,
    sampler: Arc<MetricSampler>,
    events_tx: UnboundedSender<ControlEvent>,
    mut events_rx: UnboundedReceiver<ControlEvent>,
) -> JoinHandle<()> {
    let mut controller = Controller::new(connections, sampler, events_tx);
    tokio::spawn(async move {
        while let Some(event) = events_rx.recv().await {
            controller.handle(event);
        }
        tracing::debug!("control queue closed, controller exiting");
    })
}

impl Controller {
    pub fn new(
        connections: Arc<ConnectionRegistry>,
        sampler: Arc<MetricSampler>,
        events_tx: UnboundedSender<ControlEvent>,
    ) -> Self {
        Self {
            store: SessionStore::new(),
            registry: TaskRegistry::new(events_tx),
            connections,
            sampler,
        }
    }

    pub fn handle(&mut self, event: ControlEvent) {
        match event {
            ControlEvent::Client { session, event } => self.client_event(&session, event),
            ControlEvent::Disconnected { session } => self.disconnected(&session),
            ControlEvent::Tick {
                session,
                feature,
                task_id,
            } => self.tick(&session, feature, task_id),
            ControlEvent::Sessions { reply } => {
                let _ = reply.send(self.session_listing());
            }
        }
        set_sessions_active(self.store.len());
        set_tasks_live(self.registry.live_count());
    }

    fn client_event(&mut self, session: &SessionId, event: ClientEvent) {
        match event {
            ClientEvent::Open => self.open(session),
            ClientEvent::Click { slot, item } => self.click(session, slot, item),
            ClientEvent::Drag => {
                // surfaces are display-only
                tracing::debug!(%session, "drag rejected");
            }
            ClientEvent::Hotkey { word } => self.hotkey(session, &word),
            ClientEvent::Close => self.teardown(session, Some(ClosedReason::Closed)),
        }
    }

    fn open(&mut self, session: &SessionId) {
        record_transition("open");
        self.hello_if_first(session);
        let state = *self.store.get_or_create(session);
        match state.mode {
            DisplayMode::Overlay => {
                // opening the surface takes the session out of overlay mode
                self.registry.stop(session, Feature::Overlay);
                self.send(session, ServerFrame::OverlayClear);
                self.store.get_or_create(session).mode = DisplayMode::dashboard();
                self.render_dashboard(session);
            }
            DisplayMode::Minimized => self.render_minimized(session),
            DisplayMode::Normal { view } => {
                if view != SurfaceView::Dashboard {
                    self.store.get_or_create(session).mode = DisplayMode::dashboard();
                }
                self.render_dashboard(session);
            }
        }
    }

    fn hello_if_first(&mut self, session: &SessionId) {
        let state = self.store.get_or_create(session);
        if state.first_interaction_seen {
            return;
        }
        state.first_interaction_seen = true;
        let hello = ServerFrame::Hello {
            lines: vec![
                format!("hostdeck v{} is watching this host", env!("CARGO_PKG_VERSION")),
                "Hotkeys: overlay, f3r, rmtoggle".to_string(),
            ],
        };
        self.send(session, hello);
    }

    /// Clicks are resolved against what the session's surface actually
    /// shows, not against the tile kind alone. The client echoes the kind
    /// it clicked, but the (mode, slot) pair decides what happens, so a
    /// stale client cannot trigger a control that is not on its surface.
    fn click(&mut self, session: &SessionId, slot: usize, item: TileKind) {
        let state = *self.store.get_or_create(session);
        match state.mode {
            DisplayMode::Overlay => {
                tracing::debug!(%session, slot, "click ignored while overlay is active");
            }
            DisplayMode::Minimized => match item {
                TileKind::Restore if slot == 0 => self.restore(session),
                TileKind::CloseButton if slot == 8 => {
                    self.teardown(session, Some(ClosedReason::Closed))
                }
                _ => {}
            },
            DisplayMode::Normal {
                view: SurfaceView::Modules,
            } => {
                if item == TileKind::Back {
                    self.back_to_dashboard(session);
                }
            }
            DisplayMode::Normal {
                view: SurfaceView::Dashboard,
            } => match (slot, item) {
                (render::SLOT_MINIMIZE, TileKind::Minimize) => self.minimize(session),
                (render::SLOT_RESIZE, TileKind::Resize) => self.resize(session),
                (render::SLOT_OVERLAY, TileKind::OverlayToggle) => self.enable_overlay(session),
                (render::SLOT_AUTO_REFRESH, TileKind::AutoRefreshToggle) => {
                    self.toggle_auto_refresh(session)
                }
                (render::SLOT_CLOSE, TileKind::CloseButton) => {
                    self.teardown(session, Some(ClosedReason::Closed))
                }
                (_, TileKind::Refresh) => self.manual_refresh(session),
                (_, TileKind::ModuleSummary) => self.show_modules(session),
                _ => {}
            },
        }
    }

    fn hotkey(&mut self, session: &SessionId, word: &str) {
        let word = word.trim().trim_start_matches('/').to_ascii_lowercase();
        match word.as_str() {
            "overlay" | "f3r" | "rmtoggle" => {
                if self.store.get_or_create(session).mode.is_overlay() {
                    self.disable_overlay(session);
                } else {
                    self.enable_overlay(session);
                }
            }
            other => {
                tracing::debug!(%session, word = other, "unknown hotkey");
            }
        }
    }

    fn minimize(&mut self, session: &SessionId) {
        record_transition("minimize");
        self.store.get_or_create(session).mode = DisplayMode::Minimized;
        // a live auto-refresh ticker self-cancels on its next tick
        self.render_minimized(session);
    }

    fn restore(&mut self, session: &SessionId) {
        record_transition("restore");
        self.store.get_or_create(session).mode = DisplayMode::dashboard();
        self.render_dashboard(session);
    }

    fn resize(&mut self, session: &SessionId) {
        record_transition("resize");
        let state = self.store.get_or_create(session);
        state.layout_size = state.layout_size.next();
        self.render_dashboard(session);
    }

    fn enable_overlay(&mut self, session: &SessionId) {
        record_transition("overlay_on");
        // the dashboard ticker must not outlive the surface it patches
        self.registry.stop(session, Feature::AutoRefresh);
        self.store.get_or_create(session).mode = DisplayMode::Overlay;
        self.registry.start(session, Feature::Overlay);
        self.send(
            session,
            ServerFrame::SurfaceClosed {
                reason: ClosedReason::OverlayEnabled,
            },
        );
    }

    fn disable_overlay(&mut self, session: &SessionId) {
        record_transition("overlay_off");
        self.registry.stop(session, Feature::Overlay);
        self.store.get_or_create(session).mode = DisplayMode::dashboard();
        self.send(session, ServerFrame::OverlayClear);
        self.render_dashboard(session);
    }

    fn toggle_auto_refresh(&mut self, session: &SessionId) {
        if self.registry.is_live(session, Feature::AutoRefresh) {
            record_transition("auto_refresh_off");
            self.registry.stop(session, Feature::AutoRefresh);
            self.patch_auto_refresh_tile(session, false);
        } else {
            if !self.store.get_or_create(session).mode.is_dashboard() {
                return;
            }
            record_transition("auto_refresh_on");
            self.registry.start(session, Feature::AutoRefresh);
            self.patch_auto_refresh_tile(session, true);
        }
    }

    fn patch_auto_refresh_tile(&mut self, session: &SessionId, on: bool) {
        let patch = ServerFrame::Patch {
            slots: vec![SlotTile {
                slot: render::SLOT_AUTO_REFRESH,
                tile: render::auto_refresh_tile(on),
            }],
            notice: None,
        };
        self.send(session, patch);
    }

    fn manual_refresh(&mut self, session: &SessionId) {
        record_transition("refresh");
        self.render_dashboard(session);
    }

    fn show_modules(&mut self, session: &SessionId) {
        record_transition("modules");
        self.store.get_or_create(session).mode = DisplayMode::Normal {
            view: SurfaceView::Modules,
        };
        self.render_modules(session);
    }

    fn back_to_dashboard(&mut self, session: &SessionId) {
        record_transition("back");
        self.store.get_or_create(session).mode = DisplayMode::dashboard();
        self.render_dashboard(session);
    }

    fn disconnected(&mut self, session: &SessionId) {
        if !self.store.contains(session) {
            return;
        }
        self.teardown(session, None);
    }

    /// Stop every ticker and forget the session. With a reason, the client
    /// is told to drop its surface; without one it is already gone.
    fn teardown(&mut self, session: &SessionId, reason: Option<ClosedReason>) {
        record_transition(if reason.is_some() { "close" } else { "disconnect" });
        self.registry.stop_all(session);
        let known = self.store.remove(session);
        if let Some(reason) = reason {
            self.send(session, ServerFrame::SurfaceClosed { reason });
        }
        if known {
            tracing::info!(%session, "session torn down");
        }
    }

    fn tick(&mut self, session: &SessionId, feature: Feature, task_id: u64) {
        if self.registry.live_task_id(session, feature) != Some(task_id) {
            // the ticker this came from was stopped or replaced
            return;
        }
        record_tick(feature);

        if !self.connections.is_connected(session) {
            self.self_cancel(session, feature, "disconnected");
            return;
        }
        let Some(state) = self.store.get(session).copied() else {
            self.self_cancel(session, feature, "mode_changed");
            return;
        };
        let mode_ok = match feature {
            Feature::Overlay => state.mode.is_overlay(),
            Feature::AutoRefresh => state.mode.is_dashboard(),
        };
        if !mode_ok {
            self.self_cancel(session, feature, "mode_changed");
            return;
        }

        let snap = self.sampler.sample();
        let frame = match feature {
            Feature::Overlay => ServerFrame::OverlayText {
                text: render::overlay_line(&snap),
            },
            Feature::AutoRefresh => ServerFrame::Patch {
                slots: render::data_patch(state.layout_size, &snap),
                notice: Some(render::DATA_UPDATED_NOTICE.to_string()),
            },
        };
        if !self.send(session, frame) {
            self.self_cancel(session, feature, "send_failed");
        }
    }

    fn self_cancel(&mut self, session: &SessionId, feature: Feature, reason: &'static str) {
        self.registry.stop(session, feature);
        record_self_cancel(feature, reason);
        tracing::debug!(%session, %feature, reason, "ticker self-cancelled");
    }

    fn render_dashboard(&mut self, session: &SessionId) {
        let state = *self.store.get_or_create(session);
        let auto_refresh_on = self.registry.is_live(session, Feature::AutoRefresh);
        let snap = self.sampler.sample();
        match render::dashboard(state.layout_size, auto_refresh_on, &snap) {
            Ok(frame) => {
                self.send(session, ServerFrame::Surface { frame });
            }
            Err(err) => {
                record_render_failure();
                tracing::warn!(%session, %err, "dashboard render failed");
            }
        }
    }

    fn render_minimized(&mut self, session: &SessionId) {
        let snap = self.sampler.sample();
        match render::minimized(&snap) {
            Ok(frame) => {
                self.send(session, ServerFrame::Surface { frame });
            }
            Err(err) => {
                record_render_failure();
                tracing::warn!(%session, %err, "minimized render failed");
            }
        }
    }

    fn render_modules(&mut self, session: &SessionId) {
        let snap = self.sampler.sample();
        match render::modules(&snap) {
            Ok(frame) => {
                self.send(session, ServerFrame::Surface { frame });
            }
            Err(err) => {
                record_render_failure();
                tracing::warn!(%session, %err, "module view render failed");
            }
        }
    }

    fn send(&self, session: &SessionId, frame: ServerFrame) -> bool {
        let kind = frame.kind();
        let delivered = self.connections.send_to(session, frame);
        if delivered {
            record_frame(kind);
        } else {
            tracing::debug!(%session, kind, "frame dropped, session not connected");
        }
        delivered
    }

    fn session_listing(&self) -> Vec<SessionSummary> {
        let mut listing: Vec<SessionSummary> = self
            .store
            .iter()
            .map(|(id, state)| SessionSummary {
                session_id: id.to_string(),
                layout_size: state.layout_size,
                mode: state.mode,
                live_features: self.registry.live_features(id),
            })
            .collect();
        listing.sort_by(|a, b| a.session_id.cmp(&b.session_id));
        listing
    }
}
