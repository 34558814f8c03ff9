use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::{Position, Rect};
use tracing::{error, info};

use crate::config::Config;
use crate::data::Datasets;
use crate::deck;
use crate::host::{MapHost, MapOptions};
use crate::map::CameraTarget;
use crate::overlay::Expander;
use crate::slideshow::{SequenceError, Slide, SlideChange, Slideshow};
use crate::ui;

/// Application state: the map host, the slideshow driving it and the
/// per-slide overlay state
pub struct App {
    pub config: Config,
    pub host: MapHost,
    pub slideshow: Slideshow,
    legend: Expander,
    panel: Expander,
    panel_scroll: u16,
    /// Slide whose overlay state is loaded
    overlays_for: Option<usize>,
    screen: Rect,
    map_area: Rect,
    last_error: Option<String>,
    pub should_quit: bool,
}

impl App {
    pub fn new(config: Config, cols: u16, rows: u16) -> Self {
        let datasets = Datasets::load(&config.data_dir, config.population_xlsx.as_deref());
        let slides = deck::build_deck(&datasets);
        info!("Deck has {} slides", slides.len());
        Self::with_slides(config, slides, cols, rows)
    }

    pub fn with_slides(config: Config, slides: Vec<Slide>, cols: u16, rows: u16) -> Self {
        let slideshow = Slideshow::new(slides, config.slideshow());
        let screen = Rect::new(0, 0, cols, rows);
        let map_area = ui::regions(screen, slideshow.config().show_controls, false).map;
        let initial_camera = slideshow
            .current()
            .and_then(|s| s.camera)
            .unwrap_or_else(|| CameraTarget::at(109.6976, 3.1390, 5.5));

        let mut host = MapHost::new(
            MapOptions {
                initial_camera,
                data_dir: config.data_dir.clone(),
                controls: config.controls,
                ..MapOptions::default()
            },
            map_area.width,
            map_area.height,
        );
        host.load();

        Self {
            config,
            host,
            slideshow,
            legend: Expander::default(),
            panel: Expander::default(),
            panel_scroll: 0,
            overlays_for: None,
            screen,
            map_area,
            last_error: None,
            should_quit: false,
        }
    }

    /// Enter the first slide
    pub async fn start(&mut self) {
        let result = match self.host.handle() {
            Some(map) => self.slideshow.mount(map).await.map(|c| c.into_iter().collect()),
            None => Ok(Vec::new()),
        };
        self.settle(result);
    }

    /// Apply queued slide commands
    pub async fn pump(&mut self) {
        let result = match self.host.handle() {
            Some(map) => self.slideshow.run_pending(map).await,
            None => Ok(Vec::new()),
        };
        self.settle(result);
    }

    fn settle(&mut self, result: Result<Vec<SlideChange>, SequenceError>) {
        match result {
            Ok(changes) => {
                if !changes.is_empty() {
                    self.last_error = None;
                }
            }
            Err(e) => {
                error!("Slide transition failed: {:#}", anyhow::Error::from(e));
                self.last_error = Some("slide transition failed, see log".to_string());
            }
        }
        self.sync_overlays();
    }

    /// Reset legend and panel state when the slide changed
    fn sync_overlays(&mut self) {
        let index = self.slideshow.index();
        if self.overlays_for == Some(index) {
            return;
        }
        let slide = self.slideshow.current();
        self.legend = slide
            .and_then(|s| s.legend.as_ref())
            .map(|l| l.expander())
            .unwrap_or_default();
        self.panel = slide
            .and_then(|s| s.side_panel.as_ref())
            .map(|p| p.expander())
            .unwrap_or_default();
        self.panel_scroll = 0;
        self.overlays_for = Some(index);
    }

    /// Advance the auto-advance timer one interval
    pub fn tick(&mut self) {
        self.slideshow.tick();
    }

    pub fn frame(&mut self, dt: Duration) {
        self.host.frame(dt);
    }

    pub fn resize(&mut self, cols: u16, rows: u16) {
        self.screen = Rect::new(0, 0, cols, rows);
        self.map_area = ui::regions(self.screen, self.show_controls(), self.host.is_fullscreen()).map;
        self.host.resize(self.map_area.width, self.map_area.height);
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.quit(),
            _ if self.slideshow.handle_key(&key) => {}
            KeyCode::Char('L') => self.legend.toggle(),
            KeyCode::Char('p') => self.panel.toggle(),
            KeyCode::PageDown => self.panel_scroll = self.panel_scroll.saturating_add(5),
            KeyCode::PageUp => self.panel_scroll = self.panel_scroll.saturating_sub(5),
            _ => {
                let fullscreen = self.host.is_fullscreen();
                self.host.handle_key(&key);
                if fullscreen != self.host.is_fullscreen() {
                    // map area grows or shrinks with the chrome
                    self.resize(self.screen.width, self.screen.height);
                }
            }
        }
    }

    pub fn handle_mouse(&mut self, mouse: MouseEvent) {
        let Some((col, row)) = self.map_cell(mouse.column, mouse.row) else {
            self.host.end_drag();
            return;
        };
        match mouse.kind {
            MouseEventKind::Moved | MouseEventKind::Drag(MouseButton::Left) => self.host.pointer_move(col, row),
            MouseEventKind::ScrollUp => self.host.scroll(col, row, true),
            MouseEventKind::ScrollDown => self.host.scroll(col, row, false),
            MouseEventKind::Down(MouseButton::Left) => {
                self.host.click(col, row);
                self.host.begin_drag(col, row);
            }
            MouseEventKind::Up(MouseButton::Left) => self.host.end_drag(),
            _ => {}
        }
    }

    /// Map-relative cell for a terminal position, unless an overlay covers it
    fn map_cell(&self, column: u16, row: u16) -> Option<(u16, u16)> {
        let position = Position::new(column, row);
        if !self.map_area.contains(position) {
            return None;
        }
        if !self.host.is_fullscreen() {
            if let Some(slide) = self.slideshow.current() {
                if let Some(panel) = &slide.side_panel {
                    if panel.area(self.map_area, self.panel.is_expanded()).contains(position) {
                        return None;
                    }
                }
                if let Some(legend) = &slide.legend {
                    let (w, h) = legend.size(self.legend.is_expanded());
                    if legend.corner.place(self.map_area, w, h).contains(position) {
                        return None;
                    }
                }
            }
        }
        Some((column - self.map_area.x, row - self.map_area.y))
    }

    pub fn show_controls(&self) -> bool {
        self.slideshow.config().show_controls
    }

    pub fn legend_expanded(&self) -> bool {
        self.legend.is_expanded()
    }

    pub fn panel_expanded(&self) -> bool {
        self.panel.is_expanded()
    }

    pub fn panel_scroll(&self) -> u16 {
        self.panel_scroll
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    /// Stop the slideshow and release the map
    pub fn shutdown(&mut self) {
        if let Some(map) = self.host.handle() {
            self.slideshow.unmount(map);
        }
        self.host.dispose();
    }
}
