//! UI rendering module for snowdash
//!
//! This module contains all the rendering logic for the terminal user interface,
//! using the ratatui library for TUI components.

pub mod help_overlay;
pub mod resort_list;

pub use help_overlay::render as render_help_overlay;
pub use resort_list::render as render_resort_list;

use crate::app::App;
use ratatui::Frame;

/// Renders the dashboard and, when requested, the help overlay on top
pub fn render(frame: &mut Frame, app: &App) {
    render_resort_list(frame, app);
    if app.show_help {
        render_help_overlay(frame);
    }
}
