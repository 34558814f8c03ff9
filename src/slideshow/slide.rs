use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use async_trait::async_trait;

use crate::hooks::InteractionHandlers;
use crate::map::{CameraTarget, LayerGroup, MapHandle};
use crate::overlay::{Legend, SidePanel};

/// Async work run when a slide is entered or left
#[async_trait(?Send)]
pub trait SlideHook {
    async fn run(&self, map: &mut dyn MapHandle) -> anyhow::Result<()>;
}

/// Hook from a plain closure
pub struct FnHook<F>(pub F);

#[async_trait(?Send)]
impl<F> SlideHook for FnHook<F>
where
    F: Fn(&mut dyn MapHandle) -> anyhow::Result<()>,
{
    async fn run(&self, map: &mut dyn MapHandle) -> anyhow::Result<()> {
        (self.0)(map)
    }
}

pub fn hook<F>(f: F) -> FnHook<F>
where
    F: Fn(&mut dyn MapHandle) -> anyhow::Result<()>,
{
    FnHook(f)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HookStage {
    Enter,
    Exit,
}

impl fmt::Display for HookStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookStage::Enter => f.write_str("enter"),
            HookStage::Exit => f.write_str("exit"),
        }
    }
}

/// One step of the presentation. Built once, addressed by index.
#[derive(Clone)]
pub struct Slide {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub camera: Option<CameraTarget>,
    pub layers: Vec<LayerGroup>,
    pub legend: Option<Legend>,
    pub side_panel: Option<SidePanel>,
    /// Display time before auto-advance
    pub duration: Option<Duration>,
    pub on_enter: Option<Rc<dyn SlideHook>>,
    pub on_exit: Option<Rc<dyn SlideHook>>,
    pub interactions: Option<InteractionHandlers>,
}

impl Slide {
    pub fn new(id: &str, title: &str) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            description: None,
            camera: None,
            layers: Vec::new(),
            legend: None,
            side_panel: None,
            duration: None,
            on_enter: None,
            on_exit: None,
            interactions: None,
        }
    }

    pub fn description(mut self, text: &str) -> Self {
        self.description = Some(text.to_string());
        self
    }

    pub fn camera(mut self, camera: CameraTarget) -> Self {
        self.camera = Some(camera);
        self
    }

    pub fn layer(mut self, group: LayerGroup) -> Self {
        self.layers.push(group);
        self
    }

    pub fn legend(mut self, legend: Legend) -> Self {
        self.legend = Some(legend);
        self
    }

    pub fn side_panel(mut self, panel: SidePanel) -> Self {
        self.side_panel = Some(panel);
        self
    }

    pub fn duration_ms(mut self, ms: u64) -> Self {
        self.duration = Some(Duration::from_millis(ms));
        self
    }

    pub fn on_enter(mut self, hook: impl SlideHook + 'static) -> Self {
        self.on_enter = Some(Rc::new(hook));
        self
    }

    pub fn on_exit(mut self, hook: impl SlideHook + 'static) -> Self {
        self.on_exit = Some(Rc::new(hook));
        self
    }

    pub fn interactions(mut self, handlers: InteractionHandlers) -> Self {
        self.interactions = Some(handlers);
        self
    }

    /// Every source and layer id this slide attaches
    pub fn attached_ids(&self) -> Vec<&str> {
        self.layers
            .iter()
            .flat_map(|g| std::iter::once(g.id.as_str()).chain(g.layers.iter().map(|l| l.id.as_str())))
            .collect()
    }
}

impl fmt::Debug for Slide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Slide")
            .field("id", &self.id)
            .field("title", &self.title)
            .field("layers", &self.layers.len())
            .field("duration", &self.duration)
            .finish_non_exhaustive()
    }
}
