//! Ripple marker — the transient widget shown at a click location.
//!
//! Two rings expand from the clicked cell, the second half a period behind
//! the first, looping until the owning sequence removes the marker. Rings
//! fade as they grow: bold near the center, dim at the rim.

use std::time::{Duration, Instant};

use crate::sequencer::MarkerId;
use crate::types::{Color, DrawOp, Point, Style};

/// Markers paint under the plane.
pub const RIPPLE_Z: i32 = 0;

/// Ring cells are sampled every this many degrees around the ellipse.
const RING_STEP_DEG: u32 = 12;

pub struct Ripple {
    pub id: MarkerId,
    pub center: Point,
    spawned: Instant,
}

impl Ripple {
    pub fn new(id: MarkerId, center: Point, spawned: Instant) -> Self {
        Ripple {
            id,
            center,
            spawned,
        }
    }

    /// Emit draw ops for both rings at time `now`. Terminal cells are about
    /// twice as tall as wide, so the horizontal radius is doubled to keep
    /// the ripple visually circular. Off-screen cells are skipped.
    pub fn resolve(
        &self,
        now: Instant,
        period: Duration,
        max_radius: f64,
        color: &Color,
        ops: &mut Vec<DrawOp>,
    ) {
        let age = now.saturating_duration_since(self.spawned);
        let base = ring_phase(age, period);
        // Second ring runs half a period behind the first.
        let trailing = ring_phase(age + period / 2, period);
        for phase in [base, trailing] {
            self.resolve_ring(phase, max_radius, color, ops);
        }
    }

    fn resolve_ring(&self, phase: f64, max_radius: f64, color: &Color, ops: &mut Vec<DrawOp>) {
        let radius = phase * max_radius;
        let (cx, cy) = (self.center.x, self.center.y);
        let style = ring_style(phase, color);

        if radius < 0.5 {
            // Too small to draw as a ring; a single dot at the click cell.
            push_cell(ops, cx, cy, '·', style);
            return;
        }

        let mut deg = 0;
        while deg < 360 {
            let theta = (deg as f64).to_radians();
            let x = cx + radius * 2.0 * theta.cos();
            let y = cy + radius * theta.sin();
            push_cell(ops, x, y, '◦', style.clone());
            deg += RING_STEP_DEG;
        }
    }
}

/// Progress of a looping ring in [0, 1).
fn ring_phase(age: Duration, period: Duration) -> f64 {
    let p = period.as_secs_f64();
    (age.as_secs_f64() % p) / p
}

fn ring_style(phase: f64, color: &Color) -> Style {
    let style = Style::fg(color.clone());
    if phase < 1.0 / 3.0 {
        style.bold()
    } else if phase < 2.0 / 3.0 {
        style
    } else {
        style.dim()
    }
}

fn push_cell(ops: &mut Vec<DrawOp>, x: f64, y: f64, ch: char, style: Style) {
    let (x, y) = Point::new(x, y).cell();
    if x < 0 || y < 0 {
        return;
    }
    // Rings overdraw at shallow angles; duplicate cells are harmless since
    // they carry identical style.
    ops.push(DrawOp {
        x: x as u16,
        y: y as u16,
        ch,
        style,
        z_order: RIPPLE_Z,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NamedColor;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    fn ops_at(ripple: &Ripple, t0: Instant, age: Duration) -> Vec<DrawOp> {
        let mut ops = Vec::new();
        ripple.resolve(
            t0 + age,
            ms(1000),
            4.0,
            &Color::Named(NamedColor::Blue),
            &mut ops,
        );
        ops
    }

    #[test]
    fn fresh_ripple_draws_a_center_dot() {
        let t0 = Instant::now();
        let r = Ripple::new(0, Point::new(20.0, 10.0), t0);
        let ops = ops_at(&r, t0, ms(0));
        // First ring is a dot; trailing ring is already at half radius.
        assert!(ops.iter().any(|op| op.ch == '·' && op.x == 20 && op.y == 10));
        assert!(ops.iter().any(|op| op.ch == '◦'));
    }

    #[test]
    fn rings_stay_inside_their_bounding_box() {
        let t0 = Instant::now();
        let r = Ripple::new(0, Point::new(20.0, 10.0), t0);
        for age in [0, 250, 500, 750, 990] {
            for op in ops_at(&r, t0, ms(age)) {
                assert!((op.x as i32 - 20).abs() <= 9, "x={} too far", op.x);
                assert!((op.y as i32 - 10).abs() <= 5, "y={} too far", op.y);
            }
        }
    }

    #[test]
    fn leading_ring_grows_with_age() {
        let t0 = Instant::now();
        let r = Ripple::new(0, Point::new(30.0, 15.0), t0);
        let spread = |age| {
            ops_at(&r, t0, age)
                .iter()
                .map(|op| (op.x as i32 - 30).abs())
                .max()
                .unwrap_or(0)
        };
        assert!(spread(ms(300)) < spread(ms(900)));
    }

    #[test]
    fn cells_off_the_canvas_edge_are_skipped() {
        let t0 = Instant::now();
        let r = Ripple::new(0, Point::new(1.0, 1.0), t0);
        for op in ops_at(&r, t0, ms(800)) {
            // u16 ops only; nothing wrapped around from negative space.
            assert!(op.x < 40 && op.y < 20);
        }
    }
}
