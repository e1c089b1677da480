//! Treemap widget: fills, borders, labels, hover tooltip, staggered reveal.

use std::time::{Duration, Instant};

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph},
    Frame,
};

use crate::format::{format_signed_pct, format_usd, share_pct};
use crate::treemap::{layout, LayoutRect, Tile, TreemapData};
use crate::ui::{change_color, scale_rgb, ACCENT, CREAM, DIM, SLATE};

/// Exact record name that gets the highlight treatment.
const HIGHLIGHT_NAME: &str = "Raydium AMM";

/// Per-leaf reveal delay during the staggered fade-in.
const STAGGER: Duration = Duration::from_millis(80);

/// Label legibility thresholds, in cells.
const NAME_MIN: (u16, u16) = (12, 2);
const VALUE_MIN: (u16, u16) = (14, 3);
const CHANGE_MIN: (u16, u16) = (16, 4);

/// Laid-out treemap plus the state its renderer needs: aggregate figures for
/// the tooltip and the reveal clock. Rebuilt whenever the data or the target
/// area changes, which restarts the reveal.
pub struct TreemapView {
    pub tiles: Vec<Tile>,
    pub total_value: f64,
    pub max_value: f64,
    pub area: Rect,
    pub(crate) revealed_at: Instant,
}

impl TreemapView {
    /// Lay the tree out inside `area` less the outer padding (2 columns,
    /// 1 row per side, matching the layout's cell-aspect correction).
    pub fn build(data: &TreemapData, area: Rect) -> Self {
        let inner = LayoutRect::new(
            area.x.saturating_add(2),
            area.y.saturating_add(1),
            area.width.saturating_sub(4),
            area.height.saturating_sub(2),
        );
        let tiles = layout(data, inner);
        let total_value = tiles.iter().map(|t| t.leaf.value).sum();
        let max_value = tiles
            .iter()
            .map(|t| t.leaf.value)
            .fold(0.0_f64, f64::max);
        Self {
            tiles,
            total_value,
            max_value,
            area,
            revealed_at: Instant::now(),
        }
    }

    /// The tile under a terminal coordinate, if any.
    pub fn hit(&self, x: u16, y: u16) -> Option<&Tile> {
        self.tiles.iter().find(|t| t.contains(x, y))
    }

    fn revealed(&self, index: usize) -> bool {
        self.revealed_at.elapsed() >= STAGGER * index as u32
    }

    /// Draw every revealed tile; `mouse` is the current pointer position used
    /// for hover highlighting and the floating tooltip.
    pub fn render(&self, f: &mut Frame, mouse: Option<(u16, u16)>) {
        let hovered = mouse.and_then(|(x, y)| self.hit(x, y).map(|t| (t.x0, t.y0)));

        for (i, tile) in self.tiles.iter().enumerate() {
            if !self.revealed(i) {
                continue;
            }
            let is_hovered = hovered == Some((tile.x0, tile.y0));
            self.render_tile(f, tile, is_hovered);
        }

        if let Some((mx, my)) = mouse {
            if let Some(tile) = self.hit(mx, my) {
                self.render_tooltip(f, tile, (mx, my));
            }
        }
    }

    fn render_tile(&self, f: &mut Frame, tile: &Tile, hovered: bool) {
        let rect = Rect::new(tile.x0, tile.y0, tile.width(), tile.height());
        if rect.width == 0 || rect.height == 0 {
            return;
        }

        let highlight = tile.leaf.name == HIGHLIGHT_NAME;
        let base = if highlight { CREAM } else { SLATE };
        let intensity = if hovered || self.max_value <= 0.0 {
            1.0
        } else {
            0.7 + 0.3 * (tile.leaf.value / self.max_value)
        };
        let fill = scale_rgb(base, intensity);
        let fg = if highlight { Color::Black } else { CREAM };

        let mut block = Block::default().style(Style::default().bg(fill).fg(fg));
        if rect.width >= 2 && rect.height >= 2 {
            let border_style = if hovered {
                Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)
            } else if highlight {
                Style::default().fg(ACCENT)
            } else {
                Style::default().fg(DIM)
            };
            block = block
                .borders(Borders::ALL)
                .border_type(if hovered {
                    BorderType::Thick
                } else {
                    BorderType::Plain
                })
                .border_style(border_style);
        }

        let mut lines = Vec::new();
        if rect.width >= NAME_MIN.0 && rect.height >= NAME_MIN.1 {
            lines.push(Line::from(Span::styled(
                label_name(&tile.leaf.display_name),
                Style::default().fg(fg).add_modifier(Modifier::BOLD),
            )));
        }
        if rect.width >= VALUE_MIN.0 && rect.height >= VALUE_MIN.1 {
            lines.push(Line::from(Span::styled(
                format_usd(tile.leaf.value),
                Style::default().fg(fg),
            )));
        }
        if rect.width >= CHANGE_MIN.0 && rect.height >= CHANGE_MIN.1 {
            if let Some(change) = tile.leaf.change_1d {
                lines.push(Line::from(Span::styled(
                    format!("{change:+.1}%"),
                    Style::default().fg(change_color(change)),
                )));
            }
        }

        f.render_widget(Paragraph::new(lines).block(block), rect);
    }

    fn render_tooltip(&self, f: &mut Frame, tile: &Tile, mouse: (u16, u16)) {
        let share = share_pct(tile.leaf.value, self.total_value);
        let mut lines = vec![
            Line::from(Span::styled(
                tile.leaf.display_name.clone(),
                Style::default().fg(CREAM).add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                tile.leaf.category.clone(),
                Style::default().fg(DIM),
            )),
            Line::from(format!("Volume 24h  {}", format_usd(tile.leaf.value))),
            Line::from(format!("Share       {share:.1}%")),
        ];
        if let Some(change) = tile.leaf.change_1d {
            lines.push(Line::from(vec![
                Span::raw("Change 24h  "),
                Span::styled(
                    format_signed_pct(change),
                    Style::default().fg(change_color(change)),
                ),
            ]));
        }
        if let Some(change) = tile.leaf.change_7d {
            lines.push(Line::from(vec![
                Span::raw("Change 7d   "),
                Span::styled(
                    format_signed_pct(change),
                    Style::default().fg(change_color(change)),
                ),
            ]));
        }

        let width = lines
            .iter()
            .map(|l| l.width() as u16)
            .max()
            .unwrap_or(0)
            .saturating_add(4);
        let height = lines.len() as u16 + 2;
        let (x, y) = tooltip_origin(mouse, (width, height), f.area());
        let rect = Rect::new(x, y, width.min(f.area().width), height.min(f.area().height));

        f.render_widget(Clear, rect);
        f.render_widget(
            Paragraph::new(lines).block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(ACCENT))
                    .style(Style::default().bg(Color::Rgb(0x1A, 0x20, 0x2C))),
            ),
            rect,
        );
    }
}

/// Tile labels get a tighter budget than list rows.
fn label_name(name: &str) -> String {
    if name.chars().count() <= 10 {
        name.to_string()
    } else {
        let head: String = name.chars().take(10).collect();
        format!("{head}…")
    }
}

/// Where to place a tooltip of `size` for a pointer at `mouse`: offset to the
/// lower right, flipped left/up when it would overflow the frame, then
/// clamped inside it.
pub fn tooltip_origin(mouse: (u16, u16), size: (u16, u16), frame: Rect) -> (u16, u16) {
    let (mx, my) = mouse;
    let (w, h) = size;

    let mut x = mx.saturating_add(2);
    if x.saturating_add(w) > frame.right() {
        x = mx.saturating_sub(w.saturating_add(2));
    }
    let mut y = my.saturating_add(1);
    if y.saturating_add(h) > frame.bottom() {
        y = my.saturating_sub(h.saturating_add(1));
    }

    let max_x = frame.right().saturating_sub(w).max(frame.x);
    let max_y = frame.bottom().saturating_sub(h).max(frame.y);
    (x.clamp(frame.x, max_x), y.clamp(frame.y, max_y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::treemap::TreemapLeaf;

    fn leaf(name: &str, value: f64) -> TreemapLeaf {
        TreemapLeaf {
            name: name.to_string(),
            display_name: name.to_string(),
            value,
            category: "Dexes".to_string(),
            change_1d: Some(1.0),
            change_7d: Some(-2.0),
        }
    }

    fn view(values: &[(&str, f64)]) -> TreemapView {
        let data = TreemapData {
            name: "root".to_string(),
            children: values.iter().map(|(n, v)| leaf(n, *v)).collect(),
        };
        TreemapView::build(&data, Rect::new(0, 0, 60, 20))
    }

    #[test]
    fn test_build_applies_outer_padding() {
        let view = view(&[("Raydium AMM", 5.0), ("Orca", 3.0)]);
        for tile in &view.tiles {
            assert!(tile.x0 >= 2 && tile.x1 <= 58);
            assert!(tile.y0 >= 1 && tile.y1 <= 19);
        }
        assert_eq!(view.total_value, 8.0);
        assert_eq!(view.max_value, 5.0);
    }

    #[test]
    fn test_hit_resolves_to_containing_tile() {
        let view = view(&[("Raydium AMM", 5.0), ("Orca", 3.0)]);
        let tile = &view.tiles[0];
        assert_eq!(
            view.hit(tile.x0, tile.y0).map(|t| t.leaf.name.as_str()),
            Some(tile.leaf.name.as_str())
        );
        assert!(view.hit(0, 0).is_none());
    }

    #[test]
    fn test_label_name_truncates_with_ellipsis() {
        assert_eq!(label_name("Orca"), "Orca");
        assert_eq!(label_name("Meteora DLMM"), "Meteora DL…");
        assert_eq!(label_name("exactly ten"), "exactly te…");
    }

    #[test]
    fn test_tooltip_prefers_lower_right() {
        let frame = Rect::new(0, 0, 100, 40);
        assert_eq!(tooltip_origin((10, 10), (20, 6), frame), (12, 11));
    }

    #[test]
    fn test_tooltip_flips_at_edges() {
        let frame = Rect::new(0, 0, 100, 40);
        // Right edge: flip left of the pointer
        let (x, _) = tooltip_origin((95, 10), (20, 6), frame);
        assert_eq!(x, 95 - 22);
        // Bottom edge: flip above the pointer
        let (_, y) = tooltip_origin((10, 38), (20, 6), frame);
        assert_eq!(y, 38 - 7);
    }

    #[test]
    fn test_tooltip_clamped_inside_frame() {
        let frame = Rect::new(0, 0, 30, 10);
        let (x, y) = tooltip_origin((1, 1), (20, 6), frame);
        assert!(x + 20 <= 30);
        assert!(y + 6 <= 10);
        // Tooltip larger than the frame still pins to the origin
        let (x, y) = tooltip_origin((5, 5), (50, 20), frame);
        assert_eq!((x, y), (0, 0));
    }

    #[test]
    fn test_stagger_reveals_in_index_order() {
        let view = view(&[("a", 5.0), ("b", 3.0), ("c", 2.0)]);
        // Index 0 is due immediately; later indices wait their delay out
        assert!(view.revealed(0));
        assert!(!view.revealed(100));
    }
}
