//! Slide sequencing: the slide model, the auto-advance timer and the
//! sequencer state machine.

pub mod sequencer;
pub mod slide;
pub mod timer;

pub use sequencer::{
    command_for_key, Command, Phase, SequenceError, SlideChange, Slideshow, SlideshowConfig, SlideshowRemote,
};
pub use slide::{hook, FnHook, HookStage, Slide, SlideHook};
pub use timer::{AutoAdvance, Tick};
