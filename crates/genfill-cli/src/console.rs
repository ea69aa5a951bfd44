//! Terminal rendering of the panel.

use genfill_app::{PanelUi, PanelView};

use crate::output::format_status_line;

/// Draws the panel as status lines on stdout and alerts on stderr.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct ConsoleUi;

impl PanelUi for ConsoleUi {
    fn render(&self, view: &PanelView) {
        println!("{}", format_status_line(view));
    }

    fn alert(&self, message: &str) {
        eprintln!("alert: {message}");
    }
}
