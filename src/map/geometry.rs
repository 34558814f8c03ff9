use crate::braille::BrailleCanvas;
use crate::map::style::LinePattern;

/// Draw a line using Bresenham's algorithm
pub fn draw_line(canvas: &mut BrailleCanvas, x0: i32, y0: i32, x1: i32, y1: i32) {
    draw_patterned_line(canvas, x0, y0, x1, y1, LinePattern::Solid);
}

/// Bresenham with a dash mask applied per step
pub fn draw_patterned_line(
    canvas: &mut BrailleCanvas,
    x0: i32,
    y0: i32,
    x1: i32,
    y1: i32,
    pattern: LinePattern,
) {
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    let mut x = x0;
    let mut y = y0;
    let mut step = 0u32;

    loop {
        if pattern.is_on(step) {
            canvas.set_pixel_signed(x, y);
        }
        step += 1;

        if x == x1 && y == y1 {
            break;
        }

        let e2 = 2 * err;

        if e2 >= dy {
            if x == x1 {
                break;
            }
            err += dy;
            x += sx;
        }

        if e2 <= dx {
            if y == y1 {
                break;
            }
            err += dx;
            y += sy;
        }
    }
}

/// Draw a thicker line (used for wide line layers)
pub fn draw_thick_line(
    canvas: &mut BrailleCanvas,
    x0: i32,
    y0: i32,
    x1: i32,
    y1: i32,
    pattern: LinePattern,
) {
    draw_patterned_line(canvas, x0, y0, x1, y1, pattern);
    draw_patterned_line(canvas, x0 + 1, y0, x1 + 1, y1, pattern);
    draw_patterned_line(canvas, x0, y0 + 1, x1, y1 + 1, pattern);
}

/// Draw a filled circle (for circle layers)
pub fn draw_circle(canvas: &mut BrailleCanvas, cx: i32, cy: i32, radius: i32) {
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy <= radius * radius {
                canvas.set_pixel_signed(cx + dx, cy + dy);
            }
        }
    }
}

/// Stipple-fill a polygon (exterior ring plus holes) with even-odd scanlines.
/// `spacing` controls dot density: every `spacing`-th row and column is set.
pub fn fill_polygon(canvas: &mut BrailleCanvas, rings: &[Vec<(i32, i32)>], spacing: i32) {
    let spacing = spacing.max(1);
    let max_y = (canvas.height() * 4) as i32;
    let max_x = (canvas.width() * 2) as i32;

    let Some((min_py, max_py)) = rings
        .iter()
        .flatten()
        .fold(None, |acc: Option<(i32, i32)>, &(_, y)| match acc {
            None => Some((y, y)),
            Some((lo, hi)) => Some((lo.min(y), hi.max(y))),
        })
    else {
        return;
    };

    let start = min_py.max(0);
    let end = max_py.min(max_y - 1);
    let mut crossings = Vec::new();

    // Align rows to the global spacing grid so adjacent polygons share a pattern
    let mut y = start + (spacing - start.rem_euclid(spacing)) % spacing;
    while y <= end {
        crossings.clear();
        let scan = y as f64 + 0.5;
        for ring in rings {
            for (a, b) in ring.iter().zip(ring.iter().cycle().skip(1)) {
                let (ax, ay) = (a.0 as f64, a.1 as f64);
                let (bx, by) = (b.0 as f64, b.1 as f64);
                if (ay <= scan && by > scan) || (by <= scan && ay > scan) {
                    crossings.push(ax + (scan - ay) / (by - ay) * (bx - ax));
                }
            }
        }
        crossings.sort_by(|a, b| a.total_cmp(b));

        for pair in crossings.chunks_exact(2) {
            let from = (pair[0].ceil() as i32).max(0);
            let to = (pair[1].floor() as i32).min(max_x - 1);
            let mut x = from + (spacing - from.rem_euclid(spacing)) % spacing;
            while x <= to {
                canvas.set_pixel_signed(x, y);
                x += spacing;
            }
        }
        y += spacing;
    }
}

/// Even-odd point-in-ring test in geographic coordinates
pub fn point_in_ring(lon: f64, lat: f64, ring: &[Vec<f64>]) -> bool {
    let mut inside = false;
    let n = ring.len();
    if n < 3 {
        return false;
    }
    let mut j = n - 1;
    for i in 0..n {
        let (xi, yi) = (ring[i][0], ring[i][1]);
        let (xj, yj) = (ring[j][0], ring[j][1]);
        if ((yi > lat) != (yj > lat)) && (lon < (xj - xi) * (lat - yi) / (yj - yi) + xi) {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Distance in pixels from a point to a segment
pub fn segment_distance(p: (i32, i32), a: (i32, i32), b: (i32, i32)) -> f64 {
    let (px, py) = (p.0 as f64, p.1 as f64);
    let (ax, ay) = (a.0 as f64, a.1 as f64);
    let (bx, by) = (b.0 as f64, b.1 as f64);
    let (dx, dy) = (bx - ax, by - ay);
    let len2 = dx * dx + dy * dy;
    let t = if len2 == 0.0 {
        0.0
    } else {
        (((px - ax) * dx + (py - ay) * dy) / len2).clamp(0.0, 1.0)
    };
    let (cx, cy) = (ax + t * dx, ay + t * dy);
    ((px - cx).powi(2) + (py - cy).powi(2)).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_horizontal_line() {
        let mut canvas = BrailleCanvas::new(5, 1);
        draw_line(&mut canvas, 0, 0, 9, 0);
        // Top dot row set in every cell
        assert_eq!(canvas.to_string(), "⠉⠉⠉⠉⠉");
    }

    #[test]
    fn test_vertical_line() {
        let mut canvas = BrailleCanvas::new(1, 2);
        draw_line(&mut canvas, 0, 0, 0, 7);
        assert_eq!(canvas.to_string(), "⡇\n⡇");
    }

    #[test]
    fn test_dashed_line_leaves_gaps() {
        let mut solid = BrailleCanvas::new(10, 1);
        let mut dashed = BrailleCanvas::new(10, 1);
        draw_line(&mut solid, 0, 0, 19, 0);
        draw_patterned_line(&mut dashed, 0, 0, 19, 0, LinePattern::Dashed);
        assert_ne!(solid.to_string(), dashed.to_string());
        assert!(!dashed.is_blank());
    }

    #[test]
    fn test_fill_polygon_stays_inside() {
        let mut canvas = BrailleCanvas::new(10, 5);
        let square = vec![(4, 4), (12, 4), (12, 12), (4, 12)];
        fill_polygon(&mut canvas, &[square], 2);
        // Nothing outside the square's character cells
        assert_eq!(canvas.glyph(0, 0), None);
        assert_eq!(canvas.glyph(9, 4), None);
        assert!(canvas.glyph(4, 2).is_some());
    }

    #[test]
    fn test_point_in_ring() {
        let ring = vec![
            vec![0.0, 0.0],
            vec![10.0, 0.0],
            vec![10.0, 10.0],
            vec![0.0, 10.0],
            vec![0.0, 0.0],
        ];
        assert!(point_in_ring(5.0, 5.0, &ring));
        assert!(!point_in_ring(15.0, 5.0, &ring));
    }

    #[test]
    fn test_segment_distance() {
        assert_eq!(segment_distance((5, 3), (0, 0), (10, 0)), 3.0);
        assert_eq!(segment_distance((-4, 3), (0, 0), (10, 0)), 5.0);
    }
}
