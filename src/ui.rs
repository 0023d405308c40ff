//! TUI rendering for the machine locator.
//!
//! This module handles all UI rendering logic using the `ratatui` crate:
//! the dashboard view (nearest-machine list, locator status, details with
//! directions links) and the map view (canvas with machine pins).

use crate::app::{App, ViewMode};
use crate::geo::Coordinate;
use crate::links;
use crate::location::AcquisitionState;
use crate::machines::Category;
use ratatui::{
    prelude::*,
    widgets::{canvas::*, *}, // Imports Map, MapResolution, etc.
};

use ratatui::text::Line;

/// Renders one frame of the TUI based on current application state.
///
/// Selects the view from [`App::view_mode`]: dashboard (list + status +
/// details) or map (canvas with pins).
///
/// # Arguments
///
/// * `f` - The ratatui frame to draw into (from `terminal.draw()`).
/// * `app` - Current application state (machines, selection, acquisition).
pub fn render(f: &mut Frame, app: &App) {
    match app.view_mode {
        ViewMode::Dashboard => render_dashboard_view(f, app),
        ViewMode::Map => render_map_view(f, app),
    }
}

/// Dashboard view: machine list sidebar (35%) + main area (65%).
///
/// The main area is a fixed-height locator status block above the details
/// paragraph for the selected machine.
fn render_dashboard_view(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
        .split(f.size());

    draw_machine_list(f, app, chunks[0]);

    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(7), Constraint::Min(0)])
        .split(chunks[1]);

    draw_status_panel(f, app, main_chunks[0]);
    draw_machine_details(f, app, main_chunks[1]);
}

fn draw_machine_list(f: &mut Frame, app: &App, area: Rect) {
    let limit = app.config.ui.list_limit.max(1);
    // Slide the window so the cursor stays visible past the first page.
    let offset = app.selected_index.saturating_sub(limit - 1);

    let mut items: Vec<ListItem> = app
        .machines
        .iter()
        .enumerate()
        .skip(offset)
        .take(limit)
        .map(|(i, machine)| {
            let style = if i == app.selected_index {
                Style::default()
                    .fg(Color::Cyan)
                    .bg(Color::Rgb(30, 30, 60))
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };

            ListItem::new(Line::from(vec![
                Span::styled(format!(" {:<30}", truncated(&machine.record.name, 30)), style),
                Span::styled(
                    format!(" │ {:>7}", distance_label(machine.distance_miles)),
                    Style::default().fg(Color::DarkGray),
                ),
            ]))
        })
        .collect();

    let remaining = app.machines.len().saturating_sub(offset + limit);
    if remaining > 0 {
        items.push(ListItem::new(Span::styled(
            format!("   … {} more", remaining),
            Style::default().fg(Color::DarkGray),
        )));
    }

    let list = List::new(items).block(
        Block::default()
            .title(" Nearest Machines ")
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded),
    );
    f.render_widget(list, area);
}

/// Locator status panel: acquisition state, machine count, time of the last
/// fix, and either the failure message or the current coordinates.
fn draw_status_panel(f: &mut Frame, app: &App, area: Rect) {
    let (status_label, status_style, detail) = match app.acquisition.state() {
        AcquisitionState::Idle => (
            "IDLE".to_string(),
            Style::default().fg(Color::DarkGray),
            Line::from(Span::styled(
                "  press r to find machines near you",
                Style::default().fg(Color::DarkGray),
            )),
        ),
        AcquisitionState::Requesting => {
            let dots = ".".repeat(1 + (app.tick_count / 3) % 3);
            (
                format!("LOCATING{dots}"),
                Style::default().fg(Color::Yellow),
                Line::from(Span::styled(
                    "  waiting for a position fix",
                    Style::default().fg(Color::DarkGray),
                )),
            )
        }
        AcquisitionState::Located(position) => (
            "LOCKED".to_string(),
            Style::default().fg(Color::Green),
            Line::from(Span::raw(format!(
                "  {:.4}, {:.4}",
                position.latitude, position.longitude
            ))),
        ),
        AcquisitionState::Failed(err) => (
            "ERROR".to_string(),
            Style::default().fg(Color::Red),
            Line::from(vec![
                Span::styled(format!("  {err}"), Style::default().fg(Color::Red)),
                Span::styled(" (press r to retry)", Style::default().fg(Color::DarkGray)),
            ]),
        ),
    };

    let fix_time = app
        .located_at
        .map(|at| at.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "--:--:--".to_string());

    let content = vec![
        Line::from(vec![
            Span::styled("  LOCATION: ", Style::default().add_modifier(Modifier::BOLD)),
            Span::styled(status_label, status_style),
            Span::raw("  │  "),
            Span::styled("MACHINES: ", Style::default().add_modifier(Modifier::BOLD)),
            Span::styled(
                app.machines.len().to_string(),
                Style::default().fg(Color::Cyan),
            ),
            Span::raw("  │  "),
            Span::styled("FIX AT: ", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(fix_time),
        ]),
        Line::from(""), // Spacer
        detail,
        Line::from(Span::styled(
            "  1 list  │  2 map  │  j/k move  │  r locate  │  q quit",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    let status = Paragraph::new(content)
        .block(
            Block::default()
                .title(" Locator Status ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray)),
        )
        .alignment(Alignment::Left);
    f.render_widget(status, area);
}

fn draw_machine_details(f: &mut Frame, app: &App, area: Rect) {
    let Some(machine) = app.selected() else {
        let empty = Paragraph::new("No machines in the dataset.")
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::DarkGray))
            .block(
                Block::default()
                    .title(" Machine Details ")
                    .borders(Borders::ALL),
            );
        f.render_widget(empty, area);
        return;
    };

    let record = &machine.record;
    let (badge, badge_color) = match record.category {
        Category::Pokemon => ("POKEMON CARDS", Color::Magenta),
        Category::General => ("GENERAL VENDING", Color::Blue),
    };

    let distance = match machine.distance_miles {
        Some(d) => format!("{} from you", distance_label(Some(d))),
        None => "unknown until you are located".to_string(),
    };

    let details = vec![
        Line::from(vec![
            Span::styled(
                record.name.as_str(),
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw("  |  "),
            Span::styled(record.id.as_str(), Style::default().fg(Color::DarkGray)),
        ]),
        Line::from(Span::styled(badge, Style::default().fg(badge_color))),
        Line::from(""),
        Line::from(vec![
            Span::styled("Address:  ", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(record.address.as_str()),
        ]),
        Line::from(vec![
            Span::styled("Distance: ", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(distance),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            "Directions:",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(vec![
            Span::raw("  Apple:  "),
            Span::styled(
                links::apple_maps_directions(&record.address),
                Style::default().fg(Color::Cyan),
            ),
        ]),
        Line::from(vec![
            Span::raw("  Google: "),
            Span::styled(
                links::google_maps_directions(&record.address),
                Style::default().fg(Color::Cyan),
            ),
        ]),
    ];

    let p = Paragraph::new(details).wrap(Wrap { trim: false }).block(
        Block::default()
            .title(" Machine Details ")
            .borders(Borders::ALL)
            .padding(Padding::new(2, 2, 1, 1)),
    );
    f.render_widget(p, area);
}

/// Map view: machine sidebar (25%) + canvas (75%).
///
/// The canvas centers on the user's fix once there is one, otherwise on the
/// configured map center at a wider zoom. Machines render as category-colored
/// dots, the selected one as a labeled pin, the user as a crosshair.
fn render_map_view(f: &mut Frame, app: &App) {
    let area = f.size();
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(25), Constraint::Percentage(75)])
        .split(area);

    draw_machine_sidebar(f, app, chunks[0]);

    let center = app.user_position.unwrap_or(Coordinate::new(
        app.config.map.center_lat,
        app.config.map.center_lon,
    ));
    let zoom = if app.user_position.is_some() {
        app.config.map.focus_zoom
    } else {
        app.config.map.default_zoom
    };
    // Each zoom step halves the visible longitude span. Latitude gets half
    // the longitude span to roughly match terminal cell proportions.
    let x_half = 360.0 / 2f64.powi(zoom as i32) / 2.0;
    let y_half = x_half / 2.0;

    let map_canvas = Canvas::default()
        .block(Block::bordered().title(" Machine Map "))
        .marker(symbols::Marker::Braille)
        .x_bounds([center.longitude - x_half, center.longitude + x_half])
        .y_bounds([center.latitude - y_half, center.latitude + y_half])
        .paint(|ctx| {
            // Landmass Outlines
            ctx.draw(&Map {
                color: Color::Rgb(50, 50, 50),   // Dark grey for a "tactical" look
                resolution: MapResolution::High, // Uses high-res coastline data
            });

            // Orientation Markers (N, S, E, W)
            let label_style = Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::DIM);

            ctx.print(
                center.longitude,
                center.latitude + (y_half * 0.9),
                Line::from(Span::styled("N", label_style)),
            );
            ctx.print(
                center.longitude,
                center.latitude - (y_half * 0.9),
                Line::from(Span::styled("S", label_style)),
            );
            ctx.print(
                center.longitude + (x_half * 0.9),
                center.latitude,
                Line::from(Span::styled("E", label_style)),
            );
            ctx.print(
                center.longitude - (x_half * 0.9),
                center.latitude,
                Line::from(Span::styled("W", label_style)),
            );

            // Machine Pins
            for (i, machine) in app.machines.iter().enumerate() {
                let record = &machine.record;
                if i == app.selected_index {
                    ctx.print(
                        record.location.longitude,
                        record.location.latitude,
                        Line::from(vec![
                            Span::styled(
                                " ▼ ",
                                Style::default()
                                    .fg(Color::Yellow)
                                    .add_modifier(Modifier::BOLD),
                            ),
                            Span::styled(
                                format!(" {} ", record.name),
                                Style::default().fg(Color::Black).bg(Color::Yellow),
                            ),
                        ]),
                    );
                } else {
                    let color = match record.category {
                        Category::Pokemon => Color::Yellow,
                        Category::General => Color::Blue,
                    };
                    ctx.print(
                        record.location.longitude,
                        record.location.latitude,
                        Line::from(Span::styled("•", Style::default().fg(color))),
                    );
                }
            }

            // The user's own position
            if let Some(position) = app.user_position {
                ctx.print(
                    position.longitude,
                    position.latitude,
                    Line::from(Span::styled(" ⌖ ", Style::default().fg(Color::Cyan))),
                );
            }
        });

    f.render_widget(map_canvas, chunks[1]);
}

fn draw_machine_sidebar(f: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = app
        .machines
        .iter()
        .enumerate()
        .map(|(i, machine)| {
            let style = if i == app.selected_index {
                Style::default().fg(Color::Black).bg(Color::Yellow)
            } else {
                Style::default()
            };
            ListItem::new(format!(" > {}", machine.record.name)).style(style)
        })
        .collect();

    let list = List::new(items)
        .block(Block::bordered().title("Machines"))
        .highlight_symbol(">> ");

    f.render_widget(list, area);
}

/// "3.2 mi" under ten miles, "41 mi" above, "--" before a fix.
fn distance_label(distance: Option<f64>) -> String {
    match distance {
        Some(d) if d < 10.0 => format!("{:.1} mi", d),
        Some(d) => format!("{:.0} mi", d),
        None => "--".to_string(),
    }
}

fn truncated(name: &str, max: usize) -> String {
    if name.chars().count() > max {
        let head: String = name.chars().take(max.saturating_sub(1)).collect();
        format!("{head}…")
    } else {
        name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_label_switches_precision_at_ten_miles() {
        assert_eq!(distance_label(Some(3.25)), "3.2 mi");
        assert_eq!(distance_label(Some(9.99)), "10.0 mi");
        assert_eq!(distance_label(Some(41.4)), "41 mi");
        assert_eq!(distance_label(None), "--");
    }

    #[test]
    fn truncated_keeps_short_names_and_elides_long_ones() {
        assert_eq!(truncated("Corner Mart", 30), "Corner Mart");
        let long = "A Very Long Retailer Name In A Long Plaza";
        let cut = truncated(long, 10);
        assert_eq!(cut.chars().count(), 10);
        assert!(cut.ends_with('…'));
    }
}
