//! Squarified treemap layout.
//!
//! Pure geometry: `layout` turns a flat value tree into non-overlapping
//! integer-cell tiles whose areas are proportional to their values. Drawing,
//! hover handling, and animation live in `ui::treemap`; this module never
//! touches a rendering surface so it can be tested against known value sets.

/// Terminal cells are roughly twice as tall as they are wide. Aspect ratios
/// are judged in visual units (height x2) so tiles look square on screen;
/// areas themselves stay proportional to values.
const CELL_ASPECT: f64 = 2.0;

/// Leaf of the value tree: one protocol with its display metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct TreemapLeaf {
    pub name: String,
    pub display_name: String,
    pub value: f64,
    pub category: String,
    pub change_1d: Option<f64>,
    pub change_7d: Option<f64>,
}

/// Single-level hierarchy: a synthetic valueless root over protocol leaves.
#[derive(Debug, Clone, PartialEq)]
pub struct TreemapData {
    pub name: String,
    pub children: Vec<TreemapLeaf>,
}

/// Target rectangle in terminal cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LayoutRect {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

impl LayoutRect {
    pub fn new(x: u16, y: u16, width: u16, height: u16) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Positioned leaf. Bounds are half-open: the tile covers columns
/// `x0..x1` and rows `y0..y1`.
#[derive(Debug, Clone)]
pub struct Tile {
    pub leaf: TreemapLeaf,
    pub x0: u16,
    pub y0: u16,
    pub x1: u16,
    pub y1: u16,
}

impl Tile {
    pub fn width(&self) -> u16 {
        self.x1.saturating_sub(self.x0)
    }

    pub fn height(&self) -> u16 {
        self.y1.saturating_sub(self.y0)
    }

    pub fn area(&self) -> u32 {
        u32::from(self.width()) * u32::from(self.height())
    }

    pub fn contains(&self, x: u16, y: u16) -> bool {
        x >= self.x0 && x < self.x1 && y >= self.y0 && y < self.y1
    }
}

/// Worst aspect ratio of a row of areas laid along a side of length `side`.
fn worst_ratio(row: &[f64], side: f64) -> f64 {
    let sum: f64 = row.iter().sum();
    if sum <= 0.0 || side <= 0.0 {
        return f64::INFINITY;
    }
    let side_sq = side * side;
    let sum_sq = sum * sum;
    row.iter().fold(0.0_f64, |worst, &area| {
        let ratio = (side_sq * area / sum_sq).max(sum_sq / (side_sq * area));
        worst.max(ratio)
    })
}

/// Lay out the value tree inside `area` with the squarified algorithm:
/// children sorted descending by value, rows flushed whenever adding the next
/// child would worsen the row's worst aspect ratio, each row laid along the
/// shorter side of the remaining rectangle. Output coordinates are rounded to
/// integer cell boundaries; adjacent tiles share boundaries exactly, so the
/// tiling is seam- and overlap-free and covers the whole rectangle.
///
/// Zero- and negative-value leaves are dropped. An empty tree or degenerate
/// rectangle yields no tiles.
pub fn layout(data: &TreemapData, area: LayoutRect) -> Vec<Tile> {
    let mut children: Vec<&TreemapLeaf> =
        data.children.iter().filter(|leaf| leaf.value > 0.0).collect();
    if children.is_empty() || area.width == 0 || area.height == 0 {
        return Vec::new();
    }
    children.sort_by(|a, b| b.value.partial_cmp(&a.value).unwrap_or(std::cmp::Ordering::Equal));

    let total: f64 = children.iter().map(|leaf| leaf.value).sum();

    // Work in visual units: height scaled so aspect decisions match what the
    // eye sees in a terminal.
    let full_w = f64::from(area.width);
    let full_h = f64::from(area.height) * CELL_ASPECT;
    let scale = full_w * full_h / total;
    let areas: Vec<f64> = children.iter().map(|leaf| leaf.value * scale).collect();

    // (index, x, y, w, h) in visual units, origin at the rect corner.
    let mut placed: Vec<(usize, f64, f64, f64, f64)> = Vec::with_capacity(children.len());

    let (mut x, mut y) = (0.0_f64, 0.0_f64);
    let (mut w, mut h) = (full_w, full_h);
    let mut i = 0;
    while i < areas.len() {
        let side = w.min(h);

        // Grow the row while it improves the worst aspect ratio
        let row_start = i;
        i += 1;
        while i < areas.len() {
            let current = worst_ratio(&areas[row_start..i], side);
            let extended = worst_ratio(&areas[row_start..=i], side);
            if extended > current {
                break;
            }
            i += 1;
        }

        let row = &areas[row_start..i];
        let row_area: f64 = row.iter().sum();
        let last_row = i >= areas.len();

        if w >= h {
            // Vertical strip on the left, tiles stacked top to bottom
            let thickness = if last_row { w } else { row_area / h };
            let mut ty = y;
            for (k, &tile_area) in row.iter().enumerate() {
                let tile_h = if k == row.len() - 1 {
                    y + h - ty
                } else {
                    tile_area / thickness
                };
                placed.push((row_start + k, x, ty, thickness, tile_h));
                ty += tile_h;
            }
            x += thickness;
            w -= thickness;
        } else {
            // Horizontal strip on top, tiles laid left to right
            let thickness = if last_row { h } else { row_area / w };
            let mut tx = x;
            for (k, &tile_area) in row.iter().enumerate() {
                let tile_w = if k == row.len() - 1 {
                    x + w - tx
                } else {
                    tile_area / thickness
                };
                placed.push((row_start + k, tx, y, tile_w, thickness));
                tx += tile_w;
            }
            y += thickness;
            h -= thickness;
        }
    }

    // Map visual units back to cells and round. Neighbouring tiles were
    // produced from the same running offsets, so rounding keeps shared edges
    // shared.
    let round_cell = |v: f64, max: u16| -> u16 { (v.round().max(0.0) as u16).min(max) };
    placed
        .into_iter()
        .map(|(idx, vx, vy, vw, vh)| Tile {
            leaf: children[idx].clone(),
            x0: area.x + round_cell(vx, area.width),
            y0: area.y + round_cell(vy / CELL_ASPECT, area.height),
            x1: area.x + round_cell(vx + vw, area.width),
            y1: area.y + round_cell((vy + vh) / CELL_ASPECT, area.height),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(name: &str, value: f64) -> TreemapLeaf {
        TreemapLeaf {
            name: name.to_string(),
            display_name: name.to_string(),
            value,
            category: "Dexes".to_string(),
            change_1d: None,
            change_7d: None,
        }
    }

    fn tree(values: &[(&str, f64)]) -> TreemapData {
        TreemapData {
            name: "root".to_string(),
            children: values.iter().map(|(n, v)| leaf(n, *v)).collect(),
        }
    }

    #[test]
    fn test_empty_tree_yields_no_tiles() {
        let tiles = layout(&tree(&[]), LayoutRect::new(0, 0, 40, 20));
        assert!(tiles.is_empty());
    }

    #[test]
    fn test_degenerate_rect_yields_no_tiles() {
        let tiles = layout(&tree(&[("a", 1.0)]), LayoutRect::new(0, 0, 0, 20));
        assert!(tiles.is_empty());
    }

    #[test]
    fn test_single_leaf_fills_rect() {
        let tiles = layout(&tree(&[("a", 5.0)]), LayoutRect::new(2, 3, 40, 20));
        assert_eq!(tiles.len(), 1);
        let t = &tiles[0];
        assert_eq!((t.x0, t.y0, t.x1, t.y1), (2, 3, 42, 23));
    }

    #[test]
    fn test_zero_value_leaves_dropped() {
        let tiles = layout(
            &tree(&[("a", 3.0), ("dead", 0.0), ("b", 1.0)]),
            LayoutRect::new(0, 0, 40, 20),
        );
        assert_eq!(tiles.len(), 2);
        assert!(tiles.iter().all(|t| t.leaf.name != "dead"));
    }

    #[test]
    fn test_tiles_sorted_descending_by_value() {
        let tiles = layout(
            &tree(&[("small", 1.0), ("big", 9.0), ("mid", 4.0)]),
            LayoutRect::new(0, 0, 60, 24),
        );
        let values: Vec<f64> = tiles.iter().map(|t| t.leaf.value).collect();
        assert_eq!(values, vec![9.0, 4.0, 1.0]);
    }

    #[test]
    fn test_areas_proportional_to_values() {
        let tiles = layout(&tree(&[("a", 2.0), ("b", 1.0)]), LayoutRect::new(0, 0, 30, 20));
        assert_eq!(tiles.len(), 2);
        let ratio = f64::from(tiles[0].area()) / f64::from(tiles[1].area());
        // v1/v2 = 2 within rounding error
        assert!((ratio - 2.0).abs() < 0.25, "area ratio {} too far from 2", ratio);
    }

    #[test]
    fn test_tile_areas_cover_rect_exactly() {
        let rect = LayoutRect::new(0, 0, 48, 18);
        let tiles = layout(
            &tree(&[("a", 7.0), ("b", 5.0), ("c", 3.0), ("d", 2.0), ("e", 1.0)]),
            rect,
        );
        let covered: u32 = tiles.iter().map(Tile::area).sum();
        assert_eq!(covered, u32::from(rect.width) * u32::from(rect.height));
    }

    #[test]
    fn test_tiles_stay_in_bounds_and_do_not_overlap() {
        let rect = LayoutRect::new(4, 2, 50, 16);
        let tiles = layout(
            &tree(&[
                ("a", 13.0),
                ("b", 8.0),
                ("c", 8.0),
                ("d", 5.0),
                ("e", 3.0),
                ("f", 1.0),
            ]),
            rect,
        );
        for t in &tiles {
            assert!(t.x0 >= rect.x && t.x1 <= rect.x + rect.width);
            assert!(t.y0 >= rect.y && t.y1 <= rect.y + rect.height);
        }
        for (i, a) in tiles.iter().enumerate() {
            for b in tiles.iter().skip(i + 1) {
                let disjoint =
                    a.x1 <= b.x0 || b.x1 <= a.x0 || a.y1 <= b.y0 || b.y1 <= a.y0;
                assert!(disjoint, "tiles overlap: {:?} and {:?}", a.leaf.name, b.leaf.name);
            }
        }
    }

    #[test]
    fn test_hit_testing() {
        let tiles = layout(&tree(&[("a", 1.0)]), LayoutRect::new(0, 0, 10, 10));
        let t = &tiles[0];
        assert!(t.contains(0, 0));
        assert!(t.contains(9, 9));
        assert!(!t.contains(10, 9));
    }
}
