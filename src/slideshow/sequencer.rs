use std::cell::Cell;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent};
use thiserror::Error;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info};

use crate::hooks::Interactions;
use crate::map::{mount_group, unmount_group, FlyOptions, MapError, MapHandle};
use crate::slideshow::slide::{HookStage, Slide};
use crate::slideshow::timer::{AutoAdvance, Tick};

#[derive(Debug, Error)]
pub enum SequenceError {
    #[error("{stage} hook of slide '{slide}' failed: {source}")]
    Hook {
        slide: String,
        stage: HookStage,
        #[source]
        source: anyhow::Error,
    },

    #[error(transparent)]
    Map(#[from] MapError),
}

#[derive(Clone, Debug, PartialEq)]
pub struct SlideshowConfig {
    pub loop_slides: bool,
    pub auto_play: bool,
    /// Flight duration for slides whose camera sets none
    pub transition_duration: Duration,
    pub tick_interval: Duration,
    pub show_controls: bool,
    pub show_progress: bool,
}

impl Default for SlideshowConfig {
    fn default() -> Self {
        Self {
            loop_slides: false,
            auto_play: false,
            transition_duration: Duration::from_millis(1000),
            tick_interval: Duration::from_millis(50),
            show_controls: true,
            show_progress: true,
        }
    }
}

/// Navigation request, applied in arrival order
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Next,
    Previous,
    GoTo(usize),
    TogglePlay,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Idle,
    Transitioning { from: usize, to: usize },
}

/// Sent to observers after every committed transition
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlideChange {
    pub index: usize,
    pub id: String,
}

/// Queues commands for a [`Slideshow`] from hooks, timers or input
#[derive(Clone, Debug)]
pub struct SlideshowRemote {
    tx: UnboundedSender<Command>,
}

impl SlideshowRemote {
    pub fn send(&self, command: Command) {
        if self.tx.send(command).is_err() {
            debug!("Slideshow gone, dropping {:?}", command);
        }
    }

    pub fn next(&self) {
        self.send(Command::Next);
    }

    pub fn previous(&self) {
        self.send(Command::Previous);
    }

    pub fn go_to(&self, index: usize) {
        self.send(Command::GoTo(index));
    }

    pub fn toggle_play(&self) {
        self.send(Command::TogglePlay);
    }
}

/// Left/Right step, Space toggles play, 1-9 jump to a slide
pub fn command_for_key(key: &KeyEvent) -> Option<Command> {
    match key.code {
        KeyCode::Left => Some(Command::Previous),
        KeyCode::Right => Some(Command::Next),
        KeyCode::Char(' ') => Some(Command::TogglePlay),
        KeyCode::Char(c @ '1'..='9') => Some(Command::GoTo(c as usize - '1' as usize)),
        _ => None,
    }
}

/// Resets the phase when a transition ends, including when its future is dropped
struct IdleOnDrop<'a>(&'a Cell<Phase>);

impl Drop for IdleOnDrop<'_> {
    fn drop(&mut self) {
        self.0.set(Phase::Idle);
    }
}

/// Steps through slides on a borrowed map.
///
/// At most one slide's layer groups are on the map at a time. Transitions
/// take `&mut self`, so they never overlap; requests made meanwhile go
/// through the command queue and are applied by [`Slideshow::run_pending`].
pub struct Slideshow {
    slides: Vec<Slide>,
    config: SlideshowConfig,
    index: usize,
    playing: bool,
    progress: f64,
    phase: Cell<Phase>,
    mounted: bool,
    /// Slide whose groups are currently on the map
    attached: Option<usize>,
    timer: Option<AutoAdvance>,
    interactions: Interactions,
    observers: Vec<Box<dyn FnMut(&SlideChange)>>,
    tx: UnboundedSender<Command>,
    rx: UnboundedReceiver<Command>,
}

impl Slideshow {
    pub fn new(slides: Vec<Slide>, config: SlideshowConfig) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            slides,
            playing: config.auto_play,
            config,
            index: 0,
            progress: 0.0,
            phase: Cell::new(Phase::Idle),
            mounted: false,
            attached: None,
            timer: None,
            interactions: Interactions::new(),
            observers: Vec::new(),
            tx,
            rx,
        }
    }

    pub fn remote(&self) -> SlideshowRemote {
        SlideshowRemote { tx: self.tx.clone() }
    }

    pub fn subscribe(&mut self, observer: impl FnMut(&SlideChange) + 'static) {
        self.observers.push(Box::new(observer));
    }

    pub fn slides(&self) -> &[Slide] {
        &self.slides
    }

    pub fn current(&self) -> Option<&Slide> {
        self.slides.get(self.index)
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.slides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Percent of the current slide's duration elapsed
    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn phase(&self) -> Phase {
        self.phase.get()
    }

    pub fn config(&self) -> &SlideshowConfig {
        &self.config
    }

    pub fn can_go_previous(&self) -> bool {
        self.config.loop_slides || self.index > 0
    }

    pub fn can_go_next(&self) -> bool {
        self.config.loop_slides || self.index + 1 < self.slides.len()
    }

    /// Whether the current slide auto-advances while playing
    pub fn has_timer(&self) -> bool {
        self.timer.is_some()
    }

    /// Enter the current slide and start listening for commands
    pub async fn mount(&mut self, map: &mut dyn MapHandle) -> Result<Option<SlideChange>, SequenceError> {
        if self.mounted {
            return Ok(None);
        }
        self.mounted = true;
        self.go_to(map, self.index).await
    }

    /// Stop the timer and slide listeners. Layers stay on the map.
    pub fn unmount(&mut self, map: &mut dyn MapHandle) {
        self.mounted = false;
        self.timer = None;
        self.interactions.teardown(map);
        while self.rx.try_recv().is_ok() {}
    }

    /// Transition to `target`. Out-of-range targets are ignored.
    pub async fn go_to(
        &mut self,
        map: &mut dyn MapHandle,
        target: usize,
    ) -> Result<Option<SlideChange>, SequenceError> {
        if target >= self.slides.len() {
            debug!("Ignoring slide {} of {}", target, self.slides.len());
            return Ok(None);
        }
        let from = self.index;
        self.phase.set(Phase::Transitioning { from, to: target });
        let _idle = IdleOnDrop(&self.phase);
        self.timer = None;

        if let Some(current) = self.attached {
            let outgoing = &self.slides[current];
            if let Some(hook) = &outgoing.on_exit {
                hook.run(map).await.map_err(|source| SequenceError::Hook {
                    slide: outgoing.id.clone(),
                    stage: HookStage::Exit,
                    source,
                })?;
            }
            for group in &outgoing.layers {
                unmount_group(map, group)?;
            }
            self.attached = None;
        }

        let incoming = &self.slides[target];
        if let Some(camera) = &incoming.camera {
            let animation = camera.animation.unwrap_or_default();
            map.fly_to(
                camera,
                FlyOptions {
                    duration: animation.duration.unwrap_or(self.config.transition_duration),
                    easing: animation.easing,
                    essential: animation.essential.unwrap_or(true),
                },
            );
        }
        // Layers go on while the camera is still moving
        for group in &incoming.layers {
            mount_group(map, group)?;
        }
        self.attached = Some(target);

        if let Some(hook) = &incoming.on_enter {
            hook.run(map).await.map_err(|source| SequenceError::Hook {
                slide: incoming.id.clone(),
                stage: HookStage::Enter,
                source,
            })?;
        }

        self.index = target;
        self.progress = 0.0;
        if self.playing && self.mounted {
            self.timer = incoming
                .duration
                .and_then(|d| AutoAdvance::new(d, self.config.tick_interval));
        }
        self.interactions.sync(map, incoming.interactions.as_ref());

        let change = SlideChange {
            index: target,
            id: incoming.id.clone(),
        };
        info!("Slide {} of {}: {}", target + 1, self.slides.len(), incoming.id);
        for observer in self.observers.iter_mut() {
            observer(&change);
        }
        Ok(Some(change))
    }

    /// Next slide; past the end wraps when looping, otherwise stops playback
    pub async fn next(&mut self, map: &mut dyn MapHandle) -> Result<Option<SlideChange>, SequenceError> {
        if self.slides.is_empty() {
            return Ok(None);
        }
        let next = self.index + 1;
        if next < self.slides.len() {
            self.go_to(map, next).await
        } else if self.config.loop_slides {
            self.go_to(map, 0).await
        } else {
            self.playing = false;
            self.timer = None;
            Ok(None)
        }
    }

    /// Previous slide; before the start wraps when looping
    pub async fn previous(&mut self, map: &mut dyn MapHandle) -> Result<Option<SlideChange>, SequenceError> {
        if self.slides.is_empty() {
            return Ok(None);
        }
        if self.index > 0 {
            self.go_to(map, self.index - 1).await
        } else if self.config.loop_slides {
            self.go_to(map, self.slides.len() - 1).await
        } else {
            Ok(None)
        }
    }

    pub fn toggle_play(&mut self) {
        self.playing = !self.playing;
        self.timer = None;
        if self.playing && self.mounted {
            self.progress = 0.0;
            self.timer = self
                .current()
                .and_then(|s| s.duration)
                .and_then(|d| AutoAdvance::new(d, self.config.tick_interval));
        }
        debug!("Playback {}", if self.playing { "started" } else { "paused" });
    }

    /// Advance the auto-advance timer one interval. Returns true when it
    /// fired and queued [`Command::Next`].
    pub fn tick(&mut self) -> bool {
        if !self.mounted || !self.playing {
            return false;
        }
        let Some(timer) = self.timer.as_mut() else {
            return false;
        };
        match timer.tick() {
            Tick::Progress(p) => {
                self.progress = p;
                false
            }
            Tick::Fire(p) => {
                self.progress = p;
                self.timer = None;
                self.remote().next();
                true
            }
        }
    }

    /// Queue the command bound to `key`. Returns whether the key was consumed.
    pub fn handle_key(&self, key: &KeyEvent) -> bool {
        if !self.mounted {
            return false;
        }
        match command_for_key(key) {
            Some(command) => {
                self.remote().send(command);
                true
            }
            None => false,
        }
    }

    pub async fn apply(
        &mut self,
        map: &mut dyn MapHandle,
        command: Command,
    ) -> Result<Option<SlideChange>, SequenceError> {
        match command {
            Command::Next => self.next(map).await,
            Command::Previous => self.previous(map).await,
            Command::GoTo(index) => self.go_to(map, index).await,
            Command::TogglePlay => {
                self.toggle_play();
                Ok(None)
            }
        }
    }

    /// Apply queued commands one at a time, including any queued while
    /// they run
    pub async fn run_pending(&mut self, map: &mut dyn MapHandle) -> Result<Vec<SlideChange>, SequenceError> {
        let mut changes = Vec::new();
        while let Ok(command) = self.rx.try_recv() {
            if !self.mounted {
                continue;
            }
            if let Some(change) = self.apply(map, command).await? {
                changes.push(change);
            }
        }
        Ok(changes)
    }
}
