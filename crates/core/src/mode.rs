// crates/core/src/mode.rs
//! Display modes and surface views.

use serde::{Deserialize, Serialize};

/// Which surface a session in [`DisplayMode::Normal`] is looking at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurfaceView {
    /// The main metric dashboard.
    Dashboard,
    /// The per-module detail listing.
    Modules,
}

/// Display mode of a session.
///
/// The current view only exists while the interactive surface is open in
/// normal mode; minimized and overlay sessions have no view to track, so
/// the variant cannot carry one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum DisplayMode {
    Normal { view: SurfaceView },
    Minimized,
    Overlay,
}

impl DisplayMode {
    /// Normal mode showing the main dashboard.
    pub fn dashboard() -> Self {
        DisplayMode::Normal {
            view: SurfaceView::Dashboard,
        }
    }

    /// True while the primary dashboard view is open. Auto-refresh is only
    /// eligible in this state.
    pub fn is_dashboard(self) -> bool {
        matches!(
            self,
            DisplayMode::Normal {
                view: SurfaceView::Dashboard
            }
        )
    }

    pub fn is_overlay(self) -> bool {
        matches!(self, DisplayMode::Overlay)
    }
}

impl Default for DisplayMode {
    fn default() -> Self {
        Self::dashboard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_normal_dashboard() {
        let mode = DisplayMode::default();
        assert!(mode.is_dashboard());
        assert!(!mode.is_overlay());
    }

    #[test]
    fn test_modules_view_is_not_the_primary_view() {
        let mode = DisplayMode::Normal {
            view: SurfaceView::Modules,
        };
        assert!(!mode.is_dashboard());
    }

    #[test]
    fn test_serde_tags_the_mode() {
        let json = serde_json::to_value(DisplayMode::dashboard()).unwrap();
        assert_eq!(json["mode"], "normal");
        assert_eq!(json["view"], "dashboard");

        let json = serde_json::to_value(DisplayMode::Overlay).unwrap();
        assert_eq!(json["mode"], "overlay");
        assert!(json.get("view").is_none());
    }
}
