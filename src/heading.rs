//! Orientation math — turns inputs into a rotation angle.
//!
//! Headings are whole degrees in [0, 360) and include a fixed +45° icon
//! offset: the plane artwork points up-and-right at rotation zero, so every
//! computed direction is shifted by 45° to make the glyph face its target.
//! Rendering subtracts the offset again (see `plane::glyph_for_heading`).

/// Rotation applied on top of the raw direction so the icon's drawn
/// orientation lines up with vector directions.
pub const ICON_OFFSET_DEG: i32 = 45;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Unit step in cell coordinates (y grows downward, as on screen).
    pub fn unit(self) -> (f64, f64) {
        match self {
            Direction::Up => (0.0, -1.0),
            Direction::Down => (0.0, 1.0),
            Direction::Left => (-1.0, 0.0),
            Direction::Right => (1.0, 0.0),
        }
    }
}

/// Wrap an angle into [0, 360).
pub fn normalize_deg(angle: i32) -> i32 {
    angle.rem_euclid(360)
}

/// Heading for a (dx, dy) vector from the plane's center to its target.
///
/// `atan2` in degrees, rounded up, plus the icon offset, wrapped.
pub fn heading_for_vector(dx: f64, dy: f64) -> i32 {
    let deg = dy.atan2(dx).to_degrees();
    normalize_deg(deg.ceil() as i32 + ICON_OFFSET_DEG)
}

/// Heading for a keyboard direction. Fixed table, not computed from a
/// vector: Up is -90°, Down 90°, Left 180°, Right 0°, each plus the offset.
pub fn heading_for_key(direction: Direction) -> i32 {
    let base = match direction {
        Direction::Up => -90,
        Direction::Down => 90,
        Direction::Left => 180,
        Direction::Right => 0,
    };
    normalize_deg(base + ICON_OFFSET_DEG)
}
