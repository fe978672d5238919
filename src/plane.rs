//! The plane sprite.
//!
//! A terminal cell cannot rotate, so the plane is drawn as one of eight
//! directional glyphs picked by 45° sector of the current heading.

use crate::heading::{ICON_OFFSET_DEG, normalize_deg};
use crate::types::{DrawOp, Point, Style};

/// One glyph per 45° sector, starting at 0° (right) and going clockwise
/// in screen coordinates (y down).
const GLYPHS: [char; 8] = ['→', '↘', '↓', '↙', '←', '↖', '↑', '↗'];

/// Sprites paint above markers.
pub const PLANE_Z: i32 = 1;

/// Pick the glyph facing the heading's travel direction. The stored heading
/// includes the icon offset, so it is subtracted before sectoring.
pub fn glyph_for_heading(heading: i32) -> char {
    let travel = normalize_deg(heading - ICON_OFFSET_DEG);
    let sector = ((travel + 22) / 45) as usize % 8;
    GLYPHS[sector]
}

/// Emit the plane's draw op, skipping positions that fall off the canvas.
pub fn resolve(position: Point, heading: i32, style: &Style, ops: &mut Vec<DrawOp>) {
    let (x, y) = position.cell();
    if x < 0 || y < 0 {
        return;
    }
    ops.push(DrawOp {
        x: x as u16,
        y: y as u16,
        ch: glyph_for_heading(heading),
        style: style.clone(),
        z_order: PLANE_Z,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heading::{Direction, heading_for_key};

    #[test]
    fn key_headings_map_to_cardinal_glyphs() {
        assert_eq!(glyph_for_heading(heading_for_key(Direction::Up)), '↑');
        assert_eq!(glyph_for_heading(heading_for_key(Direction::Down)), '↓');
        assert_eq!(glyph_for_heading(heading_for_key(Direction::Left)), '←');
        assert_eq!(glyph_for_heading(heading_for_key(Direction::Right)), '→');
    }

    #[test]
    fn sector_boundaries_round_to_nearest() {
        // Travel 44° is closer to ↘ (45°) than to → (0°).
        assert_eq!(glyph_for_heading(normalize_deg(44 + ICON_OFFSET_DEG)), '↘');
        assert_eq!(glyph_for_heading(normalize_deg(22 + ICON_OFFSET_DEG)), '→');
        assert_eq!(glyph_for_heading(normalize_deg(23 + ICON_OFFSET_DEG)), '↘');
    }

    #[test]
    fn off_canvas_plane_is_skipped() {
        let mut ops = Vec::new();
        resolve(Point::new(-2.0, 5.0), 45, &Style::default(), &mut ops);
        assert!(ops.is_empty());
        resolve(Point::new(3.0, 5.0), 45, &Style::default(), &mut ops);
        assert_eq!(ops.len(), 1);
        assert_eq!((ops[0].x, ops[0].y), (3, 5));
    }
}
