//! Runtime configuration from `TUI_SLIDES_*` environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

use crate::host::Controls;
use crate::slideshow::SlideshowConfig;

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub data_dir: PathBuf,
    pub log_file: PathBuf,
    pub auto_play: bool,
    pub loop_slides: bool,
    pub transition: Duration,
    pub tick: Duration,
    pub population_xlsx: Option<PathBuf>,
    pub controls: Controls,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            log_file: PathBuf::from("tui-slides.log"),
            auto_play: false,
            loop_slides: true,
            transition: Duration::from_millis(1500),
            tick: Duration::from_millis(50),
            population_xlsx: None,
            controls: Controls::parse("navigation,fullscreen,scale"),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; unset or unparsable values keep defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Config::default();
        if let Some(dir) = lookup("TUI_SLIDES_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(file) = lookup("TUI_SLIDES_LOG") {
            config.log_file = PathBuf::from(file);
        }
        if let Some(on) = parse(&lookup, "TUI_SLIDES_AUTOPLAY", parse_bool) {
            config.auto_play = on;
        }
        if let Some(on) = parse(&lookup, "TUI_SLIDES_LOOP", parse_bool) {
            config.loop_slides = on;
        }
        if let Some(ms) = parse(&lookup, "TUI_SLIDES_TRANSITION_MS", |v| u64::from_str(v).ok()) {
            config.transition = Duration::from_millis(ms);
        }
        if let Some(ms) = parse(&lookup, "TUI_SLIDES_TICK_MS", |v| u64::from_str(v).ok()) {
            // a zero interval would spin
            config.tick = Duration::from_millis(ms.max(1));
        }
        config.population_xlsx = lookup("TUI_SLIDES_POPULATION_XLSX")
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);
        if let Some(list) = lookup("TUI_SLIDES_CONTROLS") {
            config.controls = Controls::parse(&list);
        }
        config
    }

    pub fn slideshow(&self) -> SlideshowConfig {
        SlideshowConfig {
            loop_slides: self.loop_slides,
            auto_play: self.auto_play,
            transition_duration: self.transition,
            tick_interval: self.tick,
            ..SlideshowConfig::default()
        }
    }
}

fn parse<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, parser: impl Fn(&str) -> Option<T>) -> Option<T> {
    let raw = lookup(key)?;
    let value = parser(raw.trim());
    if value.is_none() {
        warn!("Ignoring {}={:?}", key, raw);
    }
    value
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]);
        assert_eq!(config, Config::default());
        assert!(config.loop_slides);
        assert!(!config.auto_play);
        assert_eq!(config.slideshow().transition_duration, Duration::from_millis(1500));
        assert!(config.controls.navigation && config.controls.scale && !config.controls.geolocate);
    }

    #[test]
    fn test_overrides() {
        let config = config(&[
            ("TUI_SLIDES_DATA_DIR", "/srv/sabah"),
            ("TUI_SLIDES_AUTOPLAY", "yes"),
            ("TUI_SLIDES_LOOP", "0"),
            ("TUI_SLIDES_TICK_MS", "100"),
            ("TUI_SLIDES_POPULATION_XLSX", "pop.xlsx"),
            ("TUI_SLIDES_CONTROLS", "geolocate"),
        ]);
        assert_eq!(config.data_dir, PathBuf::from("/srv/sabah"));
        assert!(config.auto_play);
        assert!(!config.loop_slides);
        assert_eq!(config.slideshow().tick_interval, Duration::from_millis(100));
        assert_eq!(config.population_xlsx, Some(PathBuf::from("pop.xlsx")));
        assert!(config.controls.geolocate && !config.controls.navigation);
    }

    #[test]
    fn test_bad_values_keep_defaults() {
        let config = config(&[("TUI_SLIDES_AUTOPLAY", "maybe"), ("TUI_SLIDES_TRANSITION_MS", "fast")]);
        assert!(!config.auto_play);
        assert_eq!(config.transition, Duration::from_millis(1500));
    }
}
