//! Location list screen rendering
//!
//! Renders the main view: the box being looked at, the arcades inside it sorted
//! by distance from the center, and a status line telling whether the list came
//! from the cache or the network.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use ddrfinder::data::MachineStatus;

use crate::app::{distance_from_center, App, Status};

/// Machine status to icon mapping
pub fn machine_icon(status: MachineStatus) -> &'static str {
    match status {
        MachineStatus::Available => "\u{25CF}",   // ●
        MachineStatus::Unavailable => "\u{25CB}", // ○
        MachineStatus::Unknown => "\u{25CC}",     // ◌
    }
}

/// Color for machine status
pub fn machine_color(status: MachineStatus) -> Color {
    match status {
        MachineStatus::Available => Color::Green,
        MachineStatus::Unavailable => Color::DarkGray,
        MachineStatus::Unknown => Color::Yellow,
    }
}

/// Renders the location list view
pub fn render_location_list(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(frame.area());

    render_header(frame, app, chunks[0]);
    render_list(frame, app, chunks[1]);
    render_status(frame, app, chunks[2]);
}

/// Header with data source and box position
pub fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let center = app.bounds.center();
    let source_name = app
        .known_sources
        .iter()
        .find(|s| s.key == app.data_source)
        .map(|s| s.name.as_str())
        .unwrap_or(app.data_source.as_str());

    let line = Line::from(vec![
        Span::styled(
            "DDR Finder",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled(source_name.to_string(), Style::default().fg(Color::Magenta)),
        Span::raw(format!(
            "  {:.4}, {:.4}  span {:.3}\u{00B0} x {:.3}\u{00B0}",
            center.lat,
            center.lng,
            app.bounds.lat_span(),
            app.bounds.lng_span()
        )),
    ]);

    let header = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
    frame.render_widget(header, area);
}

fn render_list(frame: &mut Frame, app: &App, area: Rect) {
    let locations = app.visible_locations();
    let block = Block::default()
        .title(format!(" Arcades ({}) ", locations.len()))
        .borders(Borders::ALL);

    if locations.is_empty() {
        let message = if app.loading {
            "Loading arcades..."
        } else {
            "No arcades in this area"
        };
        let empty = Paragraph::new(Span::styled(message, Style::default().fg(Color::DarkGray)))
            .block(block);
        frame.render_widget(empty, area);
        return;
    }

    // Keep the selection on screen
    let visible_rows = area.height.saturating_sub(2) as usize;
    let offset = if visible_rows == 0 {
        0
    } else {
        app.selected_index.saturating_sub(visible_rows - 1)
    };

    let lines: Vec<Line> = locations
        .iter()
        .enumerate()
        .skip(offset)
        .take(visible_rows)
        .map(|(i, location)| {
            let status = location.machine_status(app.source_for(location));
            let selected = i == app.selected_index;
            let name_style = if selected {
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };

            Line::from(vec![
                Span::styled(
                    format!(" {} ", machine_icon(status)),
                    Style::default().fg(machine_color(status)),
                ),
                Span::styled(format!("{:<32}", location.name), name_style),
                Span::styled(
                    format!(" {:<20}", location.city),
                    Style::default().fg(Color::Gray),
                ),
                Span::styled(
                    format!(" {:>7.1} km", distance_from_center(&app.bounds, location)),
                    Style::default().fg(Color::DarkGray),
                ),
            ])
        })
        .collect();

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// One-line status bar with the outcome of the latest request
pub fn render_status(frame: &mut Frame, app: &App, area: Rect) {
    let (text, color) = match &app.status {
        Status::Loading => ("Loading...".to_string(), Color::Cyan),
        Status::Loaded { count, from_cache } => (
            format!(
                "{} arcades {}",
                count,
                if *from_cache {
                    "(cached)"
                } else {
                    "(fetched)"
                }
            ),
            Color::Green,
        ),
        Status::Info(message) => (message.clone(), Color::Yellow),
        Status::Error(message) => (message.clone(), Color::Red),
    };

    let line = Line::from(vec![
        Span::styled(format!(" {}", text), Style::default().fg(color)),
        Span::styled(
            "   wasd: pan  +/-: zoom  r: reload  l: link  ?: help",
            Style::default().fg(Color::DarkGray),
        ),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}
