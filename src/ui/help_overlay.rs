//! Key binding reference drawn over the dashboard

use ratatui::{
    layout::{Constraint, Flex, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

/// Keys and what they do, in display order
pub const KEY_BINDINGS: &[(&str, &str)] = &[
    ("↑ / k", "Previous resort"),
    ("↓ / j", "Next resort"),
    ("Enter / Space", "Expand or collapse resort"),
    ("PgUp / PgDn", "Scroll hourly snow"),
    ("r", "Refresh now"),
    ("Esc", "Collapse, or quit"),
    ("q", "Quit"),
    ("?", "Close this help"),
];

const KEY_COLUMN_WIDTH: usize = 16;
const OVERLAY_WIDTH: u16 = 48;

/// Draws the overlay centered on the frame
pub fn render(frame: &mut Frame) {
    let mut lines = vec![Line::from(Span::styled(
        "Snowdash keys",
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    ))];
    lines.push(Line::from(""));
    lines.extend(KEY_BINDINGS.iter().map(|(key, action)| {
        Line::from(vec![
            Span::styled(
                format!("{:<width$}", key, width = KEY_COLUMN_WIDTH),
                Style::default().fg(Color::Yellow),
            ),
            Span::raw(*action),
        ])
    }));

    // Content plus top and bottom border
    let height = lines.len() as u16 + 2;
    let area = overlay_area(frame.area(), OVERLAY_WIDTH, height);

    frame.render_widget(Clear, area);
    frame.render_widget(
        Paragraph::new(lines).block(
            Block::default()
                .title(" Help ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        ),
        area,
    );
}

/// A `width` x `height` rect centered in `area`, shrunk to fit
fn overlay_area(area: Rect, width: u16, height: u16) -> Rect {
    let [row] = Layout::vertical([Constraint::Length(height.min(area.height))])
        .flex(Flex::Center)
        .areas(area);
    let [cell] = Layout::horizontal([Constraint::Length(width.min(area.width))])
        .flex(Flex::Center)
        .areas(row);
    cell
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::{backend::TestBackend, Terminal};

    fn draw(width: u16, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal.draw(render).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_every_binding_is_listed() {
        let content = draw(80, 24);
        for (_, action) in KEY_BINDINGS {
            assert!(content.contains(action), "missing '{}'", action);
        }
    }

    #[test]
    fn test_overlay_is_centered() {
        let area = overlay_area(Rect::new(0, 0, 80, 24), 48, 12);
        assert_eq!(area, Rect::new(16, 6, 48, 12));
    }

    #[test]
    fn test_overlay_shrinks_on_small_terminal() {
        let area = overlay_area(Rect::new(0, 0, 30, 6), 48, 12);
        assert_eq!(area, Rect::new(0, 0, 30, 6));
        // Drawing into a tiny terminal must not panic
        draw(30, 6);
    }
}
