// crates/server/src/protocol.rs
//! Wire types for the session surface WebSocket.
//!
//! Clients send [`ClientEvent`]s (interactions with the rendered surface)
//! and receive [`ServerFrame`]s (full surfaces, patches, overlay text).
//! Both sides are tagged JSON so a browser client can switch on `type`.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use hostdeck_core::{SlotTile, SurfaceFrame, TileKind};

/// Opaque session identifier. Clients may bring their own (reconnects keep
/// the session's display state) or let the server mint one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// An interaction sent by the client.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[cfg_attr(test, derive(Serialize))]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientEvent {
    /// Open (or reopen) the surface for this session.
    Open,
    /// A click on a slot. The client echoes back the kind of tile it
    /// believes is there; the server re-checks against its own layout.
    Click { slot: usize, item: TileKind },
    /// An attempted drag. Surfaces are display-only, so this is always
    /// rejected, but the client reports it so the session still counts as
    /// interacting.
    Drag,
    /// A chat-style hotkey word, e.g. `overlay`.
    Hotkey { word: String },
    /// The client dismissed the surface itself.
    Close,
}

/// Why the server told the client to drop its surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClosedReason {
    Closed,
    OverlayEnabled,
}

/// A frame pushed to the client.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(test, derive(Deserialize))]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame {
    /// One-time greeting lines, shown in the client's log area.
    Hello { lines: Vec<String> },
    /// A complete surface replacing whatever the client shows.
    Surface { frame: SurfaceFrame },
    /// In-place updates for a subset of slots on the current surface.
    Patch {
        slots: Vec<SlotTile>,
        #[serde(skip_serializing_if = "Option::is_none")]
        notice: Option<String>,
    },
    /// Replace the one-line overlay readout.
    OverlayText { text: String },
    /// Remove the overlay readout.
    OverlayClear,
    /// Drop the current surface entirely.
    SurfaceClosed { reason: ClosedReason },
}

impl ServerFrame {
    /// Stable label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ServerFrame::Hello { .. } => "hello",
            ServerFrame::Surface { .. } => "surface",
            ServerFrame::Patch { .. } => "patch",
            ServerFrame::OverlayText { .. } => "overlay_text",
            ServerFrame::OverlayClear => "overlay_clear",
            ServerFrame::SurfaceClosed { .. } => "surface_closed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn client_events_parse_from_tagged_json() {
        let open: ClientEvent = serde_json::from_value(json!({"type": "open"})).unwrap();
        assert_eq!(open, ClientEvent::Open);

        let click: ClientEvent =
            serde_json::from_value(json!({"type": "click", "slot": 7, "item": "close_button"}))
                .unwrap();
        assert_eq!(
            click,
            ClientEvent::Click {
                slot: 7,
                item: TileKind::CloseButton
            }
        );

        let hotkey: ClientEvent =
            serde_json::from_value(json!({"type": "hotkey", "word": "overlay"})).unwrap();
        assert_eq!(
            hotkey,
            ClientEvent::Hotkey {
                word: "overlay".to_string()
            }
        );
    }

    #[test]
    fn server_frames_serialize_with_type_tags() {
        let closed = ServerFrame::SurfaceClosed {
            reason: ClosedReason::OverlayEnabled,
        };
        assert_eq!(
            serde_json::to_value(&closed).unwrap(),
            json!({"type": "surface_closed", "reason": "overlay_enabled"})
        );

        let overlay = ServerFrame::OverlayText {
            text: "[HD] CPU: 1% | RAM: 2% | Sessions: 3 | hostdeck".to_string(),
        };
        let value = serde_json::to_value(&overlay).unwrap();
        assert_eq!(value["type"], "overlay_text");
    }

    #[test]
    fn patch_omits_absent_notice() {
        let patch = ServerFrame::Patch {
            slots: vec![],
            notice: None,
        };
        let value = serde_json::to_value(&patch).unwrap();
        assert!(value.get("notice").is_none());
    }

    #[test]
    fn frame_kinds_are_stable() {
        assert_eq!(ServerFrame::Hello { lines: vec![] }.kind(), "hello");
        assert_eq!(ServerFrame::OverlayClear.kind(), "overlay_clear");
    }

    #[test]
    fn generated_session_ids_are_unique() {
        assert_ne!(SessionId::generate(), SessionId::generate());
    }
}
