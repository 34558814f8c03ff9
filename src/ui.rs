use crate::app::App;
use crate::braille::BrailleCanvas;
use crate::map::{Lod, MapLayers, Popup, Viewport};
use crate::overlay::{LegendWidget, SidePanelWidget};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Gauge, Paragraph, Widget},
    Frame,
};

/// Screen regions, top to bottom
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Regions {
    pub header: Rect,
    pub map: Rect,
    pub controls: Rect,
    pub status: Rect,
}

/// Split the terminal. Fullscreen leaves only the map and the status line.
pub fn regions(area: Rect, show_controls: bool, fullscreen: bool) -> Regions {
    let header = if fullscreen { 0 } else { 1 };
    let controls = if show_controls && !fullscreen { 2 } else { 0 };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(header),
            Constraint::Min(3),
            Constraint::Length(controls),
            Constraint::Length(1),
        ])
        .split(area);
    Regions {
        header: chunks[0],
        map: chunks[1],
        controls: chunks[2],
        status: chunks[3],
    }
}

pub fn render(frame: &mut Frame, app: &App) {
    let regions = regions(frame.area(), app.show_controls(), app.host.is_fullscreen());

    render_header(frame, regions.header);
    render_map(frame, app, regions.map);
    if !app.host.is_fullscreen() {
        render_overlays(frame, app, regions.map);
    }
    render_controls(frame, app, regions.controls);
    render_status_bar(frame, app, regions.status);
}

fn render_header(frame: &mut Frame, area: Rect) {
    if area.height == 0 {
        return;
    }
    let header = Line::from(vec![
        Span::styled(
            format!(" {} ", crate::deck::TITLE),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::styled(crate::deck::SUBTITLE, Style::default().fg(Color::DarkGray)),
    ]);
    frame.render_widget(Paragraph::new(header), area);
}

fn render_map(frame: &mut Frame, app: &App, area: Rect) {
    let Some(view) = app.host.view() else {
        frame.render_widget(
            Paragraph::new("Map unavailable").style(Style::default().fg(Color::DarkGray)),
            area,
        );
        return;
    };
    let Some(layers) = app.host.render(area.width, area.height) else {
        return;
    };

    let cursor_pos = app.host.pointer().and_then(|p| {
        let (cx, cy) = ((p.x / 2) as u16, (p.y / 4) as u16);
        (cx < area.width && cy < area.height).then_some((cx, cy))
    });

    frame.render_widget(
        MapWidget {
            layers,
            cursor_pos,
            inner_width: area.width,
            inner_height: area.height,
        },
        area,
    );

    let controls = app.host.controls();
    if controls.navigation {
        render_compass(frame, view.viewport(), view.pitch(), area);
    }
    if controls.scale {
        render_scale_bar(frame, view.viewport(), area);
    }
    if let Some(popup) = view.popup() {
        render_popup(frame, popup, view.viewport(), area);
    }
}

/// Renders braille map layers with text labels overlaid
struct MapWidget {
    layers: MapLayers,
    cursor_pos: Option<(u16, u16)>,
    inner_width: u16,
    inner_height: u16,
}

impl MapWidget {
    fn render_layer(&self, canvas: &BrailleCanvas, color: Color, area: Rect, buf: &mut Buffer) {
        for (row_idx, row_str) in canvas.rows().enumerate() {
            if row_idx >= area.height as usize {
                break;
            }
            let y = area.y + row_idx as u16;

            for (col_idx, ch) in row_str.chars().enumerate() {
                if col_idx >= area.width as usize {
                    break;
                }
                // Skip empty braille characters (U+2800)
                if ch == '\u{2800}' {
                    continue;
                }
                let x = area.x + col_idx as u16;
                buf[(x, y)].set_char(ch).set_fg(color);
            }
        }
    }
}

impl Widget for MapWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Back to front: basemap, then slide layers in mount order
        self.render_layer(&self.layers.coastlines, Color::Cyan, area, buf);
        self.render_layer(&self.layers.borders, Color::DarkGray, area, buf);
        self.render_layer(&self.layers.states, Color::Yellow, area, buf);
        for (color, canvas) in &self.layers.overlays {
            self.render_layer(canvas, *color, area, buf);
        }

        for glyph in &self.layers.glyphs {
            if glyph.col < self.inner_width && glyph.row < self.inner_height {
                buf[(area.x + glyph.col, area.y + glyph.row)]
                    .set_char(glyph.ch)
                    .set_fg(glyph.color);
            }
        }

        for label in &self.layers.labels {
            if label.row >= self.inner_height || label.col >= self.inner_width {
                continue;
            }
            let y = area.y + label.row;
            let max_len = (self.inner_width - label.col) as usize;
            for (i, ch) in label.text.chars().take(max_len.min(24)).enumerate() {
                buf[(area.x + label.col + i as u16, y)]
                    .set_char(ch)
                    .set_fg(label.color);
            }
        }

        if let Some((cx, cy)) = self.cursor_pos {
            buf[(area.x + cx, area.y + cy)].set_char('╋').set_fg(Color::Red);
        }
    }
}

/// Arrow pointing at north for the given bearing
pub fn compass_arrow(bearing: f64) -> char {
    const ARROWS: [char; 8] = ['↑', '↖', '←', '↙', '↓', '↘', '→', '↗'];
    let octant = ((bearing.rem_euclid(360.0) + 22.5) / 45.0) as usize % 8;
    ARROWS[octant]
}

fn render_compass(frame: &mut Frame, viewport: &Viewport, pitch: f64, area: Rect) {
    if area.width < 12 {
        return;
    }
    let mut spans = vec![
        Span::styled("N", Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)),
        Span::styled(
            compass_arrow(viewport.bearing).to_string(),
            Style::default().fg(Color::White),
        ),
    ];
    if pitch > 0.0 {
        spans.push(Span::styled(format!(" {:.0}°", pitch), Style::default().fg(Color::DarkGray)));
    }
    let rect = Rect::new(area.x + 1, area.y, 8.min(area.width), 1);
    frame.render_widget(Paragraph::new(Line::from(spans)), rect);
}

fn render_scale_bar(frame: &mut Frame, viewport: &Viewport, area: Rect) {
    let (px, label) = viewport.scale_bar(24);
    let cells = (px / 2).max(1);
    let text = format!("▕{}▏ {}", "─".repeat(cells), label);
    let width = (text.chars().count() as u16).min(area.width);
    let rect = Rect::new(area.x + 1, area.y + area.height.saturating_sub(1), width, 1);
    frame.render_widget(
        Paragraph::new(text).style(Style::default().fg(Color::Gray)),
        rect,
    );
}

fn render_popup(frame: &mut Frame, popup: &Popup, viewport: &Viewport, area: Rect) {
    let (px, py) = viewport.project(popup.lon, popup.lat);
    if !viewport.is_visible(px, py) {
        return;
    }
    let lines: Vec<&str> = popup.text.lines().collect();
    let width = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0) as u16 + 2;
    let height = lines.len() as u16 + 2;
    let col = (px / 2) as u16;
    let row = (py / 4) as u16;
    let x = (area.x + col + 1).min((area.x + area.width).saturating_sub(width));
    let y = (area.y + row).saturating_sub(height).max(area.y);
    let rect = Rect::new(x, y, width.min(area.width), height.min(area.height));

    frame.render_widget(Clear, rect);
    frame.render_widget(
        Paragraph::new(lines.into_iter().map(Line::from).collect::<Vec<_>>()).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White)),
        ),
        rect,
    );
}

fn render_overlays(frame: &mut Frame, app: &App, area: Rect) {
    let Some(slide) = app.slideshow.current() else {
        return;
    };
    if let Some(legend) = &slide.legend {
        frame.render_widget(
            LegendWidget {
                legend,
                expanded: app.legend_expanded(),
            },
            area,
        );
    }
    if let Some(panel) = &slide.side_panel {
        frame.render_widget(
            SidePanelWidget {
                panel,
                expanded: app.panel_expanded(),
                scroll: app.panel_scroll(),
            },
            area,
        );
    }
}

fn render_controls(frame: &mut Frame, app: &App, area: Rect) {
    if area.height == 0 {
        return;
    }
    let show = &app.slideshow;
    let Some(slide) = show.current() else {
        return;
    };
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1)])
        .split(area);

    let enabled = |on: bool| {
        if on {
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        }
    };
    let mut spans = vec![
        Span::styled(" ◀ ", enabled(show.can_go_previous())),
        Span::styled(
            format!("{} / {} ", show.index() + 1, show.len()),
            Style::default().fg(Color::Yellow),
        ),
        Span::styled(slide.title.as_str(), Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
    ];
    if let Some(description) = &slide.description {
        spans.push(Span::styled(format!("  {}", description), Style::default().fg(Color::Gray)));
    }
    spans.push(Span::styled(" ▶", enabled(show.can_go_next())));
    frame.render_widget(Paragraph::new(Line::from(spans)), rows[0]);

    let play = if show.is_playing() { "⏸ Playing" } else { "▶ Paused" };
    if show.config().show_progress && show.has_timer() {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(11), Constraint::Min(1)])
            .split(rows[1]);
        frame.render_widget(Paragraph::new(format!(" {}", play)), chunks[0]);
        frame.render_widget(
            Gauge::default()
                .gauge_style(Style::default().fg(Color::Cyan).bg(Color::Black))
                .ratio((show.progress() / 100.0).clamp(0.0, 1.0))
                .label(""),
            chunks[1],
        );
    } else {
        frame.render_widget(
            Paragraph::new(format!(" {}", play)).style(Style::default().fg(Color::DarkGray)),
            rows[1],
        );
    }
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let Some(view) = app.host.view() else {
        return;
    };
    let viewport = view.viewport();

    let mut spans = vec![
        Span::styled(" Zoom: ", Style::default().fg(Color::DarkGray)),
        Span::styled(format!("{:.1}", viewport.zoom_level()), Style::default().fg(Color::Yellow)),
        Span::styled(" (", Style::default().fg(Color::DarkGray)),
        Span::styled(Lod::from_zoom(viewport.zoom).label(), Style::default().fg(Color::Magenta)),
        Span::styled(")", Style::default().fg(Color::DarkGray)),
        Span::styled(" | ", Style::default().fg(Color::DarkGray)),
        Span::styled(
            format!("{:.4}, {:.4}", viewport.center_lat, viewport.center_lon),
            Style::default().fg(Color::Cyan),
        ),
    ];
    if let Some(error) = app.last_error() {
        spans.push(Span::styled(format!(" | {}", error), Style::default().fg(Color::Red)));
    }
    spans.push(Span::styled(
        " | ←/→:slide space:play hjkl:pan +/-:zoom L:legend p:panel q:quit",
        Style::default().fg(Color::DarkGray),
    ));
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regions_fullscreen_hides_chrome() {
        let area = Rect::new(0, 0, 80, 24);
        let normal = regions(area, true, false);
        assert_eq!(normal.header.height, 1);
        assert_eq!(normal.controls.height, 2);
        assert_eq!(normal.map, Rect::new(0, 1, 80, 20));

        let full = regions(area, true, true);
        assert_eq!(full.header.height, 0);
        assert_eq!(full.controls.height, 0);
        assert_eq!(full.map.height, 23);
    }

    #[test]
    fn test_compass_arrow() {
        assert_eq!(compass_arrow(0.0), '↑');
        assert_eq!(compass_arrow(-20.0), '↑');
        assert_eq!(compass_arrow(90.0), '←');
        assert_eq!(compass_arrow(-90.0), '→');
        assert_eq!(compass_arrow(180.0), '↓');
    }
}
