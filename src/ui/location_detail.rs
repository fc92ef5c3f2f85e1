//! Location detail screen rendering

use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use ddrfinder::data::MachineStatus;
use ddrfinder::share::{geo_uri, share_text};

use crate::app::{distance_from_center, App};
use crate::ui::location_list::{machine_color, machine_icon, render_header, render_status};

/// Renders the detail view for the location with `location_id`
pub fn render(frame: &mut Frame, app: &App, location_id: i64) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(frame.area());

    render_header(frame, app, chunks[0]);
    render_status(frame, app, chunks[2]);

    let Some(location) = app.location_by_id(location_id) else {
        let missing = Paragraph::new("Location is no longer in view")
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(missing, chunks[1]);
        return;
    };

    let source = app.source_for(location);
    let status = location.machine_status(source);
    let status_text = match status {
        MachineStatus::Available => "DDR available",
        MachineStatus::Unavailable => "No DDR reported",
        MachineStatus::Unknown => "DDR availability unknown",
    };

    let label = Style::default().fg(Color::DarkGray);
    let mut lines = vec![
        Line::from(Span::styled(
            location.name.clone(),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(location.city.clone()),
        Line::from(""),
        Line::from(vec![
            Span::styled(
                format!("{} ", machine_icon(status)),
                Style::default().fg(machine_color(status)),
            ),
            Span::raw(status_text),
        ]),
        Line::from(vec![
            Span::styled("Position  ", label),
            Span::raw(format!(
                "{:.5}, {:.5}  ({:.1} km from center)",
                location.lat,
                location.lng,
                distance_from_center(&app.bounds, location)
            )),
        ]),
        Line::from(vec![
            Span::styled("Source    ", label),
            Span::raw(
                source
                    .map(|s| s.name.clone())
                    .unwrap_or_else(|| location.source.clone()),
            ),
        ]),
    ];

    if let Some(url) = source.and_then(|s| s.info_url_for(location)) {
        lines.push(Line::from(vec![
            Span::styled("Info      ", label),
            Span::raw(url),
        ]));
    }
    lines.push(Line::from(vec![
        Span::styled("Map       ", label),
        Span::raw(geo_uri(location)),
    ]));
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("Share", label)));
    for text_line in share_text(location, source).lines() {
        lines.push(Line::from(format!("  {}", text_line)));
    }

    let block = Block::default()
        .title(" Arcade ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false });

    frame.render_widget(paragraph, chunks[1]);
}
