use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap},
};

use crate::overlay::Expander;

pub const DEFAULT_PANEL_WIDTH: u16 = 40;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PanelSide {
    Left,
    #[default]
    Right,
}

#[derive(Clone, Debug, PartialEq)]
pub struct StatCard {
    pub label: String,
    pub value: String,
    pub color: Color,
}

impl StatCard {
    pub fn new(label: &str, value: impl ToString, color: Color) -> Self {
        Self {
            label: label.to_string(),
            value: value.to_string(),
            color,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ContentBlock {
    Stats(Vec<StatCard>),
    Heading(String),
    Paragraph(String),
    KeyValue(Vec<(String, String)>),
    Bullets(Vec<String>),
    /// Ranked rows with a colored marker, e.g. states by scarcity
    Ranked(Vec<(String, String, Color)>),
}

impl ContentBlock {
    pub fn heading(text: &str) -> Self {
        ContentBlock::Heading(text.to_string())
    }

    pub fn paragraph(text: &str) -> Self {
        ContentBlock::Paragraph(text.to_string())
    }

    pub fn bullets<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ContentBlock::Bullets(items.into_iter().map(Into::into).collect())
    }

    pub fn key_values<I, K, V>(rows: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        ContentBlock::KeyValue(rows.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    fn lines(&self, inner_width: usize) -> Vec<Line<'_>> {
        match self {
            ContentBlock::Stats(cards) => cards
                .iter()
                .map(|card| {
                    Line::from(vec![
                        Span::styled("▌", Style::default().fg(card.color)),
                        Span::styled(
                            format!("{} ", card.value),
                            Style::default().fg(card.color).add_modifier(Modifier::BOLD),
                        ),
                        Span::styled(card.label.as_str(), Style::default().fg(Color::Gray)),
                    ])
                })
                .collect(),
            ContentBlock::Heading(text) => vec![Line::from(Span::styled(
                text.as_str(),
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
            ))],
            ContentBlock::Paragraph(text) => vec![Line::from(text.as_str())],
            ContentBlock::KeyValue(rows) => rows
                .iter()
                .map(|(key, value)| {
                    let pad = inner_width.saturating_sub(key.chars().count() + value.chars().count());
                    Line::from(vec![
                        Span::styled(key.as_str(), Style::default().fg(Color::Gray)),
                        Span::raw(" ".repeat(pad.max(1))),
                        Span::styled(value.as_str(), Style::default().fg(Color::White)),
                    ])
                })
                .collect(),
            ContentBlock::Bullets(items) => items
                .iter()
                .map(|item| Line::from(vec![Span::raw("• "), Span::raw(item.as_str())]))
                .collect(),
            ContentBlock::Ranked(rows) => rows
                .iter()
                .enumerate()
                .map(|(i, (name, detail, color))| {
                    Line::from(vec![
                        Span::styled(format!("{:>2}. ", i + 1), Style::default().fg(Color::DarkGray)),
                        Span::styled("● ", Style::default().fg(*color)),
                        Span::raw(name.as_str()),
                        Span::styled(format!("  {}", detail), Style::default().fg(Color::Gray)),
                    ])
                })
                .collect(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct SidePanel {
    pub title: String,
    pub side: PanelSide,
    pub width: u16,
    pub collapsible: bool,
    pub default_expanded: bool,
    pub content: Vec<ContentBlock>,
}

impl SidePanel {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            side: PanelSide::default(),
            width: DEFAULT_PANEL_WIDTH,
            collapsible: false,
            default_expanded: true,
            content: Vec::new(),
        }
    }

    pub fn side(mut self, side: PanelSide) -> Self {
        self.side = side;
        self
    }

    pub fn width(mut self, width: u16) -> Self {
        self.width = width;
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

    pub fn block(mut self, block: ContentBlock) -> Self {
        self.content.push(block);
        self
    }

    pub fn expander(&self) -> Expander {
        Expander::new(self.collapsible, self.default_expanded)
    }

    /// Panel rectangle inside `area`. Collapsed panels shrink to a tab showing
    /// only the title bar.
    pub fn area(&self, area: Rect, expanded: bool) -> Rect {
        let width = self.width.min(area.width);
        let height = if expanded { area.height } else { 3.min(area.height) };
        let x = match self.side {
            PanelSide::Left => area.x,
            PanelSide::Right => area.x + area.width - width,
        };
        Rect::new(x, area.y, width, height)
    }

    pub fn lines(&self, inner_width: usize) -> Vec<Line<'_>> {
        let mut lines = Vec::new();
        for (i, block) in self.content.iter().enumerate() {
            if i > 0 {
                lines.push(Line::default());
            }
            lines.extend(block.lines(inner_width));
        }
        lines
    }
}

pub struct SidePanelWidget<'a> {
    pub panel: &'a SidePanel,
    pub expanded: bool,
    pub scroll: u16,
}

impl Widget for SidePanelWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let rect = self.panel.area(area, self.expanded);
        if rect.width < 4 || rect.height < 2 {
            return;
        }

        let marker = match (self.panel.collapsible, self.expanded) {
            (false, _) => "",
            (true, true) => "▾ ",
            (true, false) => "▸ ",
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(Span::styled(
                format!("{}{}", marker, self.panel.title),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ));

        Clear.render(rect, buf);
        if !self.expanded {
            block.render(rect, buf);
            return;
        }

        let inner_width = rect.width.saturating_sub(2) as usize;
        Paragraph::new(self.panel.lines(inner_width))
            .block(block)
            .wrap(Wrap { trim: true })
            .scroll((self.scroll, 0))
            .render(rect, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer_text(buf: &Buffer) -> String {
        buf.content().iter().map(|c| c.symbol()).collect()
    }

    fn overview() -> SidePanel {
        SidePanel::new("Malaysia Overview")
            .collapsible()
            .block(ContentBlock::heading("Country Statistics"))
            .block(ContentBlock::Stats(vec![
                StatCard::new("Total States", 13, Color::Blue),
                StatCard::new("Population", "32.7M", Color::Green),
            ]))
    }

    #[test]
    fn test_area_by_side() {
        let screen = Rect::new(0, 0, 100, 30);
        let right = overview();
        assert_eq!(right.area(screen, true), Rect::new(60, 0, 40, 30));
        let left = overview().side(PanelSide::Left).width(30);
        assert_eq!(left.area(screen, false), Rect::new(0, 0, 30, 3));
    }

    #[test]
    fn test_blocks_are_separated() {
        let panel = overview();
        // heading, blank, two cards
        assert_eq!(panel.lines(38).len(), 4);
    }

    #[test]
    fn test_render_expanded_and_collapsed() {
        let panel = overview();
        let area = Rect::new(0, 0, 80, 20);

        let mut buf = Buffer::empty(area);
        SidePanelWidget {
            panel: &panel,
            expanded: true,
            scroll: 0,
        }
        .render(area, &mut buf);
        let text = buffer_text(&buf);
        assert!(text.contains("▾ Malaysia Overview"));
        assert!(text.contains("32.7M Population"));

        let mut buf = Buffer::empty(area);
        SidePanelWidget {
            panel: &panel,
            expanded: false,
            scroll: 0,
        }
        .render(area, &mut buf);
        let text = buffer_text(&buf);
        assert!(text.contains("▸ Malaysia Overview"));
        assert!(!text.contains("Population"));
    }

    #[test]
    fn test_key_value_padding() {
        let block = ContentBlock::key_values([("Hotels", "120")]);
        let lines = block.lines(20);
        assert_eq!(lines[0].width(), 20);
    }
}
