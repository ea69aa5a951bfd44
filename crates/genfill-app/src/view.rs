//! Panel controls derived from the server status, and the seam to whatever
//! draws them.

use crate::status::ServerStatus;

/// Indicator colour while the server is connected.
pub const COLOUR_CONNECTED: &str = "limegreen";
/// Indicator colour while the server is not usable.
pub const COLOUR_OFFLINE: &str = "red";
/// Indicator colour before the first probe completes.
pub const COLOUR_CHECKING: &str = "gray";

/// Visible state of the panel controls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelView {
    /// Indicator colour.
    pub indicator: &'static str,
    /// Status text next to the indicator.
    pub label: String,
    /// Whether the fill control accepts clicks.
    pub fill_enabled: bool,
    /// Whether the start-server control is shown.
    pub start_server_visible: bool,
}

impl PanelView {
    /// Controls implied by `status`.
    #[must_use]
    pub fn from_status(status: &ServerStatus) -> Self {
        let (indicator, start_server_visible) = match status {
            ServerStatus::Checking => (COLOUR_CHECKING, false),
            ServerStatus::Connected => (COLOUR_CONNECTED, false),
            ServerStatus::HttpError { .. } | ServerStatus::Unreachable => (COLOUR_OFFLINE, true),
        };
        Self {
            indicator,
            label: status.label(),
            fill_enabled: status.is_reachable(),
            start_server_visible,
        }
    }
}

/// Surface the panel draws on.
pub trait PanelUi: Send + Sync {
    /// Redraw the indicator and controls.
    fn render(&self, view: &PanelView);

    /// Show a blocking alert.
    fn alert(&self, message: &str);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connected_enables_fill_and_hides_start_server() {
        let view = PanelView::from_status(&ServerStatus::Connected);
        assert_eq!(view.indicator, "limegreen");
        assert_eq!(view.label, "server connected");
        assert!(view.fill_enabled);
        assert!(!view.start_server_visible);
    }

    #[test]
    fn failures_disable_fill_and_offer_start_server() {
        for status in [ServerStatus::HttpError { status: 500 }, ServerStatus::Unreachable] {
            let view = PanelView::from_status(&status);
            assert_eq!(view.indicator, "red");
            assert!(!view.fill_enabled);
            assert!(view.start_server_visible);
        }
    }
}
