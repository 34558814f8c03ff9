//! Terminal map slideshow: slides fly a braille map between views, attach
//! their layers and draw a legend and side panel over it.

pub mod app;
pub mod braille;
pub mod catalog;
pub mod config;
pub mod data;
pub mod deck;
pub mod hooks;
pub mod host;
pub mod map;
pub mod overlay;
pub mod slideshow;
pub mod ui;

#[cfg(test)]
mod test_utils;
