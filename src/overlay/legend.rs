use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget},
};

use crate::map::LinePattern;
use crate::overlay::Expander;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Corner {
    TopLeft,
    TopRight,
    #[default]
    BottomLeft,
    BottomRight,
}

impl Corner {
    /// A `width` x `height` box in this corner of `area`, one cell in from
    /// the edges
    pub fn place(self, area: Rect, width: u16, height: u16) -> Rect {
        let width = width.min(area.width.saturating_sub(2));
        let height = height.min(area.height.saturating_sub(2));
        let left = area.x + 1;
        let right = (area.x + area.width).saturating_sub(width + 1);
        let top = area.y + 1;
        let bottom = (area.y + area.height).saturating_sub(height + 1);
        let (x, y) = match self {
            Corner::TopLeft => (left, top),
            Corner::TopRight => (right, top),
            Corner::BottomLeft => (left, bottom),
            Corner::BottomRight => (right, bottom),
        };
        Rect::new(x, y, width, height)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EntrySize {
    Small,
    #[default]
    Medium,
    Large,
}

#[derive(Clone, Debug)]
pub struct LegendEntry {
    pub label: String,
    pub color: Option<Color>,
    pub pattern: LinePattern,
    pub size: EntrySize,
    pub description: Option<String>,
}

impl LegendEntry {
    pub fn new(label: &str, color: Color) -> Self {
        Self {
            label: label.to_string(),
            color: Some(color),
            pattern: LinePattern::Solid,
            size: EntrySize::Medium,
            description: None,
        }
    }

    /// Entry without a swatch
    pub fn text(label: &str) -> Self {
        Self {
            color: None,
            ..Self::new(label, Color::Reset)
        }
    }

    pub fn pattern(mut self, pattern: LinePattern) -> Self {
        self.pattern = pattern;
        self
    }

    pub fn size(mut self, size: EntrySize) -> Self {
        self.size = size;
        self
    }

    pub fn description(mut self, text: &str) -> Self {
        self.description = Some(text.to_string());
        self
    }

    fn swatch(&self) -> &'static str {
        match (self.pattern, self.size) {
            (LinePattern::Dashed, _) => "╍╍",
            (LinePattern::Dotted, _) => "┄┄",
            (LinePattern::Solid, EntrySize::Small) => "▪ ",
            (LinePattern::Solid, EntrySize::Medium) => "■ ",
            (LinePattern::Solid, EntrySize::Large) => "██",
        }
    }

    fn lines(&self) -> Vec<Line<'_>> {
        let mut spans = Vec::new();
        if let Some(color) = self.color {
            spans.push(Span::styled(self.swatch(), Style::default().fg(color)));
            spans.push(Span::raw(" "));
        }
        spans.push(Span::raw(self.label.as_str()));
        let mut lines = vec![Line::from(spans)];
        if let Some(description) = &self.description {
            lines.push(Line::from(Span::styled(
                format!("   {}", description),
                Style::default().fg(Color::DarkGray),
            )));
        }
        lines
    }

    fn width(&self) -> usize {
        let label = self.label.chars().count() + if self.color.is_some() { 3 } else { 0 };
        let description = self.description.as_ref().map_or(0, |d| d.chars().count() + 3);
        label.max(description)
    }
}

#[derive(Clone, Debug)]
pub struct Legend {
    pub title: Option<String>,
    pub corner: Corner,
    pub entries: Vec<LegendEntry>,
    pub collapsible: bool,
    pub default_expanded: bool,
}

impl Legend {
    pub fn new(title: &str) -> Self {
        Self {
            title: Some(title.to_string()),
            corner: Corner::default(),
            entries: Vec::new(),
            collapsible: false,
            default_expanded: true,
        }
    }

    pub fn corner(mut self, corner: Corner) -> Self {
        self.corner = corner;
        self
    }

    pub fn collapsible(mut self) -> Self {
        self.collapsible = true;
        self
    }

    pub fn collapsed(mut self) -> Self {
        self.default_expanded = false;
        self
    }

    pub fn entry(mut self, entry: LegendEntry) -> Self {
        self.entries.push(entry);
        self
    }

    pub fn expander(&self) -> Expander {
        Expander::new(self.collapsible, self.default_expanded)
    }

    /// Outer size including the border
    pub fn size(&self, expanded: bool) -> (u16, u16) {
        let title = self.title.as_ref().map_or(0, |t| t.chars().count() + 4);
        let body = if expanded {
            self.entries.iter().map(LegendEntry::width).max().unwrap_or(0)
        } else {
            0
        };
        let rows = if expanded {
            self.entries
                .iter()
                .map(|e| 1 + usize::from(e.description.is_some()))
                .sum()
        } else {
            0
        };
        ((title.max(body) + 2) as u16, (rows + 2) as u16)
    }
}

pub struct LegendWidget<'a> {
    pub legend: &'a Legend,
    pub expanded: bool,
}

impl Widget for LegendWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let (width, height) = self.legend.size(self.expanded);
        let rect = self.legend.corner.place(area, width, height);
        if rect.width < 3 || rect.height < 2 {
            return;
        }

        let mut title = String::new();
        if self.legend.collapsible {
            title.push_str(if self.expanded { "▾ " } else { "▸ " });
        }
        if let Some(t) = &self.legend.title {
            title.push_str(t);
        }

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(Span::styled(
                title,
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            ));

        Clear.render(rect, buf);
        let lines: Vec<Line> = if self.expanded {
            self.legend.entries.iter().flat_map(LegendEntry::lines).collect()
        } else {
            Vec::new()
        };
        Paragraph::new(lines).block(block).render(rect, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn legend() -> Legend {
        Legend::new("Map Legend")
            .collapsible()
            .entry(LegendEntry::new("State Boundaries", Color::Blue))
            .entry(
                LegendEntry::new("Future", Color::Gray)
                    .pattern(LinePattern::Dashed)
                    .description("Planned by 2027"),
            )
    }

    #[test]
    fn test_corner_placement() {
        let area = Rect::new(0, 0, 80, 24);
        assert_eq!(Corner::BottomLeft.place(area, 20, 5), Rect::new(1, 18, 20, 5));
        assert_eq!(Corner::TopRight.place(area, 20, 5), Rect::new(59, 1, 20, 5));
    }

    #[test]
    fn test_collapsed_size_is_title_only() {
        let legend = legend();
        assert_eq!(legend.size(true).1, 5);
        assert_eq!(legend.size(false), (16, 2));
    }

    #[test]
    fn test_render_shows_entries_when_expanded() {
        let legend = legend();
        let area = Rect::new(0, 0, 60, 20);
        let mut buf = Buffer::empty(area);
        LegendWidget {
            legend: &legend,
            expanded: true,
        }
        .render(area, &mut buf);
        let text: String = buf.content().iter().map(|c| c.symbol()).collect();
        assert!(text.contains("State Boundaries"));
        assert!(text.contains("╍╍"));
        assert!(text.contains("▾ Map Legend"));
    }
}
