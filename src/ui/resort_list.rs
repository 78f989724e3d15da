//! Resort card screen rendering
//!
//! Renders one card per resort with today's temperatures and next-day snow.
//! The expanded card adds the 6-day outlook and the hourly snow list.

use chrono::{DateTime, Local, NaiveDate, Utc};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, AppState};
use crate::data::{all_resorts, LocationWeather, Resort};
use crate::report::{outlook, Summary, HOURLY_LIMIT};
use crate::snow::hourly_snow_inches;

/// Card background for even rows
const LIGHT_PURPLE: Color = Color::Rgb(169, 181, 223);
/// Card background for odd rows
const PURPLE: Color = Color::Rgb(120, 134, 199);

/// Height of a collapsed card: three summary lines plus borders
const CARD_HEIGHT: u16 = 5;

/// Background for the card at `index`
pub fn card_color(index: usize) -> Color {
    if index % 2 == 0 {
        LIGHT_PURPLE
    } else {
        PURPLE
    }
}

/// The other purple, used for the expanded section of a card
pub fn contrast_color(color: Color) -> Color {
    if color == LIGHT_PURPLE {
        PURPLE
    } else {
        LIGHT_PURPLE
    }
}

/// Formats a forecast hour in local time, e.g. "Mon 2:00 PM"
fn format_hour(time: DateTime<Utc>) -> String {
    time.with_timezone(&Local).format("%a %-I:%M %p").to_string()
}

/// Renders the full dashboard screen
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(3),    // Cards
            Constraint::Length(1), // Help text
        ])
        .split(area);

    render_header(frame, app, chunks[0]);

    match app.state() {
        AppState::Loading => render_message(
            frame,
            chunks[1],
            "Loading weather data...",
            Style::default().fg(Color::Cyan),
        ),
        AppState::Failed => {
            let message = app.dashboard.error.clone().unwrap_or_default();
            render_message(frame, chunks[1], &message, Style::default().fg(Color::Red));
        }
        AppState::ResortList => render_cards(frame, app, chunks[1]),
    }

    render_help(frame, chunks[2]);
}

/// Title line, refresh status and the stale-data banner
fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let status = if app.dashboard.is_loading {
        Span::styled("Updating...", Style::default().fg(Color::Yellow))
    } else {
        match app.dashboard.last_updated {
            Some(at) => Span::styled(
                format!("Updated {}", at.with_timezone(&Local).format("%H:%M")),
                Style::default().fg(Color::Gray),
            ),
            None => Span::raw(""),
        }
    };

    let mut lines = vec![Line::from(vec![
        Span::styled(
            "SNOWDASH",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  Colorado snow forecast  "),
        status,
    ])];

    // Previous data stays on screen after a failed refresh; say so
    if app.dashboard.weather.is_some() {
        if let Some(error) = &app.dashboard.error {
            lines.push(Line::from(Span::styled(
                format!("⚠ {} (showing previous data)", error),
                Style::default().fg(Color::Red),
            )));
        }
    }

    frame.render_widget(Paragraph::new(lines), area);
}

fn render_message(frame: &mut Frame, area: Rect, message: &str, style: Style) {
    let paragraph = Paragraph::new(message.to_string())
        .style(style)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

fn render_cards(frame: &mut Frame, app: &App, area: Rect) {
    let resorts = all_resorts();
    let constraints: Vec<Constraint> = (0..resorts.len())
        .map(|index| {
            if app.is_expanded(index) {
                Constraint::Min(CARD_HEIGHT)
            } else {
                Constraint::Length(CARD_HEIGHT)
            }
        })
        .collect();

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    let today = Local::now().date_naive();
    for (index, (resort, row)) in resorts.iter().zip(rows.iter()).enumerate() {
        render_card(frame, app, index, resort, *row, today);
    }
}

fn render_card(
    frame: &mut Frame,
    app: &App,
    index: usize,
    resort: &Resort,
    area: Rect,
    today: NaiveDate,
) {
    let background = card_color(index);
    let selected = app.selected_index == index;

    let (marker, border_style) = if selected {
        (
            "▶ ",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
    } else {
        ("  ", Style::default().fg(Color::Black))
    };

    let block = Block::default()
        .title(format!("{}{}", marker, resort.name))
        .borders(Borders::ALL)
        .border_style(border_style)
        .style(Style::default().bg(background).fg(Color::Black));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let Some(weather) = app.weather_for(resort.id) else {
        return;
    };

    let summary_lines: Vec<Line> = match Summary::from_weather(weather) {
        Some(summary) => summary.lines().into_iter().map(Line::from).collect(),
        None => vec![Line::from("No daily forecast available")],
    };

    if !app.is_expanded(index) {
        frame.render_widget(Paragraph::new(summary_lines), inner);
        return;
    }

    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(inner);
    frame.render_widget(Paragraph::new(summary_lines), sections[0]);

    render_details(
        frame,
        weather,
        sections[1],
        contrast_color(background),
        app.scroll_offset,
        today,
    );
}

/// 6-day outlook on the left, hourly snow list on the right
fn render_details(
    frame: &mut Frame,
    weather: &LocationWeather,
    area: Rect,
    background: Color,
    scroll_offset: u16,
    today: NaiveDate,
) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let style = Style::default().bg(background).fg(Color::Black);
    let heading = Style::default().add_modifier(Modifier::BOLD);

    let days = outlook(weather, today);
    let mut left = vec![Line::from(Span::styled("6-Day Forecast", heading))];
    left.extend(days.iter().map(|day| match day.temps_f {
        Some((min, max)) => Line::from(format!(
            "{:<10} Min: {:.1} °F | Max: {:.1} °F",
            day.label, min, max
        )),
        None => Line::from(format!("{:<10} --", day.label)),
    }));
    left.push(Line::from(""));
    left.push(Line::from(Span::styled("6-Day Snowfall", heading)));
    left.extend(
        days.iter()
            .map(|day| Line::from(format!("{:<10} {:.1} inches", day.label, day.snow_in))),
    );

    let mut right = vec![Line::from(Span::styled(
        "Hourly Snow Accumulation",
        heading,
    ))];
    right.extend(
        hourly_snow_inches(&weather.hourly, HOURLY_LIMIT)
            .into_iter()
            .map(|(time, inches)| {
                Line::from(format!("{:<14} {:.2} inches", format_hour(time), inches))
            }),
    );

    frame.render_widget(Paragraph::new(left).style(style), columns[0]);
    frame.render_widget(
        Paragraph::new(right)
            .style(style)
            .scroll((scroll_offset, 0)),
        columns[1],
    );
}

fn render_help(frame: &mut Frame, area: Rect) {
    let help_spans = vec![
        Span::styled("↑/↓", Style::default().fg(Color::Yellow)),
        Span::raw(" Navigate  "),
        Span::styled("Enter", Style::default().fg(Color::Yellow)),
        Span::raw(" Expand  "),
        Span::styled("PgUp/PgDn", Style::default().fg(Color::Yellow)),
        Span::raw(" Scroll  "),
        Span::styled("r", Style::default().fg(Color::Yellow)),
        Span::raw(" Refresh  "),
        Span::styled("?", Style::default().fg(Color::Yellow)),
        Span::raw(" Help  "),
        Span::styled("q", Style::default().fg(Color::Yellow)),
        Span::raw(" Quit"),
    ];

    let paragraph =
        Paragraph::new(Line::from(help_spans)).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{weather::parse_forecast, WeatherData};
    use crate::refresh::DashboardState;
    use crate::test_support::forecast_body;
    use ratatui::{backend::TestBackend, Terminal};
    use std::collections::HashMap;

    fn weather_data() -> WeatherData {
        let weather = parse_forecast(&forecast_body(6, 144, 0.5)).unwrap();
        let results: HashMap<_, _> = all_resorts()
            .iter()
            .map(|resort| (resort.id, weather.clone()))
            .collect();
        WeatherData::from_results(results).unwrap()
    }

    fn create_loaded_app() -> App {
        let mut app = App::new();
        app.sync(DashboardState {
            weather: Some(weather_data()),
            is_loading: false,
            error: None,
            last_updated: Some(Utc::now()),
        });
        app
    }

    fn render_to_string(app: &App, width: u16, height: u16) -> String {
        let backend = TestBackend::new(width, height);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|frame| render(frame, app)).unwrap();

        let buffer = terminal.backend().buffer();
        buffer.content().iter().map(|cell| cell.symbol()).collect()
    }

    #[test]
    fn test_card_colors_alternate() {
        assert_eq!(card_color(0), LIGHT_PURPLE);
        assert_eq!(card_color(1), PURPLE);
        assert_eq!(card_color(4), LIGHT_PURPLE);
        assert_eq!(contrast_color(LIGHT_PURPLE), PURPLE);
        assert_eq!(contrast_color(PURPLE), LIGHT_PURPLE);
    }

    #[test]
    fn test_loading_message_without_data() {
        let content = render_to_string(&App::new(), 80, 24);
        assert!(content.contains("Loading weather data..."));
    }

    #[test]
    fn test_error_message_without_data() {
        let mut app = App::new();
        app.sync(DashboardState {
            error: Some("Failed to load weather for: vail".to_string()),
            ..Default::default()
        });
        let content = render_to_string(&app, 80, 24);
        assert!(content.contains("Failed to load weather for: vail"));
        assert!(!content.contains("Loading weather data"));
    }

    #[test]
    fn test_cards_show_every_resort() {
        let content = render_to_string(&create_loaded_app(), 100, 40);
        for resort in all_resorts() {
            assert!(content.contains(resort.name), "missing {}", resort.name);
        }
        assert!(content.contains("Next 24hr Snow Forecast: 4.7 inches"));
    }

    #[test]
    fn test_selected_card_is_marked() {
        let content = render_to_string(&create_loaded_app(), 100, 40);
        assert!(content.contains("▶ Breckenridge"));
        assert!(!content.contains("▶ Aspen"));
    }

    #[test]
    fn test_expanded_card_shows_details() {
        let mut app = create_loaded_app();
        app.toggle_expanded();
        let content = render_to_string(&app, 120, 60);

        assert!(content.contains("6-Day Forecast"));
        assert!(content.contains("6-Day Snowfall"));
        assert!(content.contains("Hourly Snow Accumulation"));
        assert!(content.contains("0.20 inches"));
    }

    #[test]
    fn test_collapsed_cards_hide_details() {
        let content = render_to_string(&create_loaded_app(), 120, 60);
        assert!(!content.contains("Hourly Snow Accumulation"));
    }

    #[test]
    fn test_stale_banner_after_failed_refresh() {
        let mut app = create_loaded_app();
        let mut dashboard = app.dashboard.clone();
        dashboard.error = Some("Failed to load weather for: aspen".to_string());
        app.sync(dashboard);

        let content = render_to_string(&app, 100, 40);
        assert!(content.contains("showing previous data"));
        assert!(content.contains("Breckenridge"));
    }

    #[test]
    fn test_header_shows_updating() {
        let mut app = create_loaded_app();
        app.dashboard.is_loading = true;
        let content = render_to_string(&app, 100, 40);
        assert!(content.contains("Updating..."));
    }
}
