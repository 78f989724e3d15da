//! Application state management for snowdash
//!
//! This module contains the dashboard's view state and keyboard handling. The
//! forecast data itself arrives from the background refresh task as a
//! [`DashboardState`] and is copied in with [`App::sync`].

use crossterm::event::{KeyCode, KeyEvent};

use crate::data::{all_resorts, LocationWeather, Resort};
use crate::refresh::DashboardState;

/// Application state enum representing the current view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    /// No data yet and no error, first refresh still running
    Loading,
    /// No data yet and the first refresh failed
    Failed,
    /// Resort cards with forecast data
    ResortList,
}

/// Upper bound for the hourly list scroll offset
const MAX_SCROLL: u16 = 120;

/// Main application struct managing view state
#[derive(Debug, Default)]
pub struct App {
    /// Latest state published by the refresh task
    pub dashboard: DashboardState,
    /// Index of the highlighted resort card
    pub selected_index: usize,
    /// Index of the expanded card; at most one card is expanded
    pub expanded: Option<usize>,
    /// Scroll offset of the hourly list in the expanded card
    pub scroll_offset: u16,
    pub show_help: bool,
    pub should_quit: bool,
    /// Set by `r`; the main loop forwards it to the refresh task and clears it
    pub refresh_requested: bool,
}

impl App {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the dashboard state with the latest published one
    pub fn sync(&mut self, dashboard: DashboardState) {
        self.dashboard = dashboard;
    }

    /// Current view, derived from the dashboard state
    pub fn state(&self) -> AppState {
        match (&self.dashboard.weather, &self.dashboard.error) {
            (Some(_), _) => AppState::ResortList,
            (None, Some(_)) => AppState::Failed,
            (None, None) => AppState::Loading,
        }
    }

    pub fn resort_count(&self) -> usize {
        all_resorts().len()
    }

    pub fn selected_resort(&self) -> Option<&'static Resort> {
        all_resorts().get(self.selected_index)
    }

    /// Forecast for a resort, if data has been loaded
    pub fn weather_for(&self, resort_id: &str) -> Option<&LocationWeather> {
        self.dashboard.weather.as_ref()?.get(resort_id)
    }

    pub fn is_expanded(&self, index: usize) -> bool {
        self.expanded == Some(index)
    }

    /// Handles keyboard input and updates state accordingly
    ///
    /// # Key Bindings
    /// - `q`: Quit the application
    /// - `Esc`: Collapse the expanded card, or quit if none is expanded
    /// - `Up`/`k`, `Down`/`j`: Move selection
    /// - `Enter`/`Space`: Expand or collapse the selected card
    /// - `PageUp`/`PageDown`: Scroll the hourly list of the expanded card
    /// - `r`: Refresh now
    /// - `?`: Toggle help
    pub fn handle_key(&mut self, key_event: KeyEvent) {
        // Help overlay intercepts all keys when shown
        if self.show_help {
            match key_event.code {
                KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q') => {
                    self.show_help = false;
                }
                _ => {}
            }
            return;
        }

        match key_event.code {
            KeyCode::Char('q') => {
                self.should_quit = true;
            }
            KeyCode::Esc => {
                if self.expanded.is_some() {
                    self.collapse();
                } else {
                    self.should_quit = true;
                }
            }
            KeyCode::Char('r') => {
                self.refresh_requested = true;
            }
            KeyCode::Char('?') => {
                self.show_help = true;
            }
            _ if self.state() != AppState::ResortList => {}
            KeyCode::Up | KeyCode::Char('k') => {
                self.move_selection_up();
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.move_selection_down();
            }
            KeyCode::Enter | KeyCode::Char(' ') => {
                self.toggle_expanded();
            }
            KeyCode::PageDown => {
                self.scroll_down();
            }
            KeyCode::PageUp => {
                self.scroll_up();
            }
            _ => {}
        }
    }

    /// Expands the selected card, or collapses it if it is already expanded
    pub fn toggle_expanded(&mut self) {
        if self.is_expanded(self.selected_index) {
            self.collapse();
        } else {
            self.expanded = Some(self.selected_index);
            self.scroll_offset = 0;
        }
    }

    fn collapse(&mut self) {
        self.expanded = None;
        self.scroll_offset = 0;
    }

    /// Moves the selection up in the list, wrapping to bottom if at top
    fn move_selection_up(&mut self) {
        let count = self.resort_count();
        if count == 0 {
            return;
        }
        if self.selected_index == 0 {
            self.selected_index = count - 1;
        } else {
            self.selected_index -= 1;
        }
    }

    /// Moves the selection down in the list, wrapping to top if at bottom
    fn move_selection_down(&mut self) {
        let count = self.resort_count();
        if count == 0 {
            return;
        }
        self.selected_index = (self.selected_index + 1) % count;
    }

    fn scroll_up(&mut self) {
        self.scroll_offset = self.scroll_offset.saturating_sub(1);
    }

    fn scroll_down(&mut self) {
        if self.expanded.is_some() && self.scroll_offset < MAX_SCROLL {
            self.scroll_offset += 1;
        }
    }
}
