//! Legend and side panel overlays drawn on top of the map.

pub mod legend;
pub mod panel;

pub use legend::{Corner, EntrySize, Legend, LegendEntry, LegendWidget};
pub use panel::{ContentBlock, PanelSide, SidePanel, SidePanelWidget, StatCard};

/// Local expand/collapse state for an overlay
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Expander {
    collapsible: bool,
    expanded: bool,
}

impl Expander {
    pub fn new(collapsible: bool, default_expanded: bool) -> Self {
        Self {
            collapsible,
            expanded: default_expanded,
        }
    }

    /// No-op for non-collapsible overlays
    pub fn toggle(&mut self) {
        if self.collapsible {
            self.expanded = !self.expanded;
        }
    }

    /// Non-collapsible overlays are always open
    pub fn is_expanded(&self) -> bool {
        !self.collapsible || self.expanded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expander() {
        let mut fixed = Expander::new(false, false);
        assert!(fixed.is_expanded());
        fixed.toggle();
        assert!(fixed.is_expanded());

        let mut foldable = Expander::new(true, true);
        foldable.toggle();
        assert!(!foldable.is_expanded());
        foldable.toggle();
        assert!(foldable.is_expanded());
    }
}
