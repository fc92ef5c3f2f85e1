//! Help overlay showing all keybindings
//!
//! Renders a centered modal with the key table and the machine status legend.

use ratatui::{
    layout::{Constraint, Flex, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use ddrfinder::data::MachineStatus;

use super::location_list::{machine_color, machine_icon};

const LIST_KEYS: &[(&str, &str)] = &[
    ("↑/k, ↓/j", "Move selection up/down"),
    ("Enter", "Open arcade details"),
    ("Esc", "Go back / Quit"),
    ("q", "Quit application"),
];

const MAP_KEYS: &[(&str, &str)] = &[
    ("w/a/s/d", "Pan north/west/south/east"),
    ("+, -", "Zoom in / out"),
    ("n", "Next data source"),
    ("r", "Reload from the network"),
    ("l", "Show a link to this view"),
];

const LEGEND: &[(MachineStatus, &str)] = &[
    (MachineStatus::Available, "DDR available"),
    (MachineStatus::Unavailable, "No DDR reported"),
    (MachineStatus::Unknown, "Availability unknown"),
];

/// Renders the help overlay on top of the current view
pub fn render(frame: &mut Frame) {
    let mut lines = vec![
        Line::from(Span::styled(
            "Keyboard Shortcuts",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];

    lines.push(section("List"));
    lines.extend(LIST_KEYS.iter().map(|&(key, what)| key_line(key, what)));
    lines.push(Line::from(""));

    lines.push(section("Map"));
    lines.extend(MAP_KEYS.iter().map(|&(key, what)| key_line(key, what)));
    lines.push(Line::from(""));

    lines.push(section("Legend"));
    lines.extend(LEGEND.iter().map(|&(status, what)| {
        Line::from(vec![
            Span::styled(
                format!("  {:<12}", machine_icon(status)),
                Style::default().fg(machine_color(status)),
            ),
            Span::raw(what),
        ])
    }));
    lines.push(Line::from(""));

    lines.push(Line::from(Span::styled(
        "Press Esc or ? to close",
        Style::default().fg(Color::DarkGray),
    )));

    // Two rows for the border
    let height = lines.len() as u16 + 2;
    let overlay_area = popup_area(frame.area(), 50, height);
    frame.render_widget(Clear, overlay_area);

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    frame.render_widget(Paragraph::new(lines).block(block), overlay_area);
}

fn section(title: &'static str) -> Line<'static> {
    Line::from(Span::styled(
        title,
        Style::default().add_modifier(Modifier::BOLD),
    ))
}

fn key_line(key: &'static str, description: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {:<12}", key), Style::default().fg(Color::Yellow)),
        Span::raw(description),
    ])
}

/// A `width` x `height` rect centered in `area`, shrunk to fit
fn popup_area(area: Rect, width: u16, height: u16) -> Rect {
    let [row] = Layout::vertical([Constraint::Length(height)])
        .flex(Flex::Center)
        .areas(area);
    let [popup] = Layout::horizontal([Constraint::Length(width)])
        .flex(Flex::Center)
        .areas(row);
    popup
}
