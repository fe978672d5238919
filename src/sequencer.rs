//! Animation sequencer — the runtime ordering of rotate and glide phases.
//!
//! The sequencer is a plain state machine: every operation takes an explicit
//! `Instant`, nothing sleeps, and nothing reads the clock. The app's event
//! loop feeds it real time; tests feed it hand-rolled timestamps.
//!
//! Two input streams share one plane:
//! - Keyboard steps: the heading snaps to the key's direction immediately,
//!   and a fixed-size glide is scheduled to fire once the rotation has had
//!   time to show. Only the latest key's scheduled glide ever fires.
//! - Clicks: each click gets a ripple marker at once and a rotate+glide
//!   sequence queued in click order. The rotate phase always completes; the
//!   glide phase is cut short when a newer input supersedes it, at which
//!   point the sequence's marker is removed.
//!
//! The marker lifecycle rule: every spawned marker is removed exactly once,
//! when its sequence's glide finishes, is preempted, or is torn down.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::heading::{Direction, heading_for_key, heading_for_vector};
use crate::types::Point;

pub type MarkerId = u64;

/// Fixed delays and step sizes, usually built from `FlightConfig`.
#[derive(Debug, Clone, Copy)]
pub struct Tuning {
    /// How long a rotation is given to visually settle before the glide.
    pub rotate_delay: Duration,
    /// Duration of a glide, for clicks and keyboard steps alike.
    pub move_duration: Duration,
    /// Keyboard step size in columns.
    pub step_cols: f64,
    /// Keyboard step size in rows. Cells are roughly 2:1, so half the
    /// columns value keeps steps visually square.
    pub step_rows: f64,
}

impl Default for Tuning {
    fn default() -> Self {
        Tuning {
            rotate_delay: Duration::from_millis(200),
            move_duration: Duration::from_millis(1000),
            step_cols: 10.0,
            step_rows: 5.0,
        }
    }
}

/// Marker lifecycle notifications for the renderer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SeqEvent {
    MarkerSpawned { id: MarkerId, at: Point },
    MarkerRemoved { id: MarkerId },
}

/// One click's rotate+glide pair, waiting in the queue or in flight.
#[derive(Debug, Clone, Copy)]
struct ClickSeq {
    target: Point,
    marker: MarkerId,
}

#[derive(Debug, Clone, Copy)]
struct PendingStep {
    dx: f64,
    dy: f64,
    fire_at: Instant,
}

#[derive(Debug, Clone, Copy)]
enum Phase {
    Idle,
    /// Waiting out the rotate delay before `seq`'s glide starts.
    Rotating { until: Instant, seq: ClickSeq },
    /// Gliding from `from` to `to`; `marker` is the owning click's ripple,
    /// None for keyboard steps.
    Moving {
        from: Point,
        to: Point,
        start: Instant,
        end: Instant,
        marker: Option<MarkerId>,
    },
}

pub struct Sequencer {
    tuning: Tuning,
    /// Where the plane started; `recenter` returns here.
    home: Point,
    /// Captured from the plane's center on the first interaction; never
    /// recalculated afterward.
    origin: Option<Point>,
    position: Point,
    heading: i32,
    phase: Phase,
    pending_step: Option<PendingStep>,
    queue: VecDeque<ClickSeq>,
    next_marker: MarkerId,
    shut_down: bool,
}

impl Sequencer {
    pub fn new(home: Point, tuning: Tuning) -> Self {
        Sequencer {
            tuning,
            home,
            origin: None,
            position: home,
            heading: heading_for_key(Direction::Right),
            phase: Phase::Idle,
            pending_step: None,
            queue: VecDeque::new(),
            next_marker: 0,
            shut_down: false,
        }
    }

    pub fn heading(&self) -> i32 {
        self.heading
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn origin(&self) -> Option<Point> {
        self.origin
    }

    /// Clicks waiting behind the active sequence.
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.phase, Phase::Idle) && self.pending_step.is_none() && self.queue.is_empty()
    }

    /// The plane's displacement from the captured origin, if one exists.
    pub fn offset(&self) -> Option<(f64, f64)> {
        self.origin
            .map(|o| (self.position.x - o.x, self.position.y - o.y))
    }

    // -----------------------------------------------------------------------
    // Inputs
    // -----------------------------------------------------------------------

    /// Arrow key pressed: rotate now, glide one step after the rotate delay.
    /// Overwrites any step still waiting to fire.
    pub fn press(&mut self, direction: Direction, now: Instant) {
        if self.shut_down {
            return;
        }
        self.capture_origin();
        self.heading = heading_for_key(direction);
        let (ux, uy) = direction.unit();
        self.pending_step = Some(PendingStep {
            dx: ux * self.tuning.step_cols,
            dy: uy * self.tuning.step_rows,
            fire_at: now + self.tuning.rotate_delay,
        });
    }

    /// Mouse clicked: spawn the ripple immediately and queue the sequence.
    /// An in-flight glide is cut short so the queue can advance; a rotate in
    /// progress is left to finish.
    pub fn click(&mut self, target: Point, now: Instant) -> Vec<SeqEvent> {
        if self.shut_down {
            return Vec::new();
        }
        self.capture_origin();
        let mut events = Vec::new();

        let id = self.next_marker;
        self.next_marker += 1;
        events.push(SeqEvent::MarkerSpawned { id, at: target });
        self.queue.push_back(ClickSeq { target, marker: id });

        if let Phase::Moving { marker, .. } = self.phase {
            self.cancel_move(marker, &mut events);
        }
        self.advance_queue(now);
        events
    }

    // -----------------------------------------------------------------------
    // Time
    // -----------------------------------------------------------------------

    /// Advance all timers to `now`. Returns marker lifecycle events in the
    /// order they occurred.
    pub fn tick(&mut self, now: Instant) -> Vec<SeqEvent> {
        if self.shut_down {
            return Vec::new();
        }
        let mut events = Vec::new();

        // A firing keyboard step takes over the plane: an in-flight glide is
        // dropped (switch-to-latest) and an unstarted click rotate goes back
        // to the head of the queue to run afterward.
        if let Some(step) = self.pending_step
            && now >= step.fire_at
        {
            self.pending_step = None;
            match self.phase {
                Phase::Moving { marker, .. } => self.cancel_move(marker, &mut events),
                Phase::Rotating { seq, .. } => {
                    self.queue.push_front(seq);
                    self.phase = Phase::Idle;
                }
                Phase::Idle => {}
            }
            let from = self.position;
            self.phase = Phase::Moving {
                from,
                to: from.offset(step.dx, step.dy),
                start: now,
                end: now + self.tuning.move_duration,
                marker: None,
            };
        }

        match self.phase {
            Phase::Rotating { until, seq } if now >= until => {
                self.phase = Phase::Moving {
                    from: self.position,
                    to: seq.target,
                    start: now,
                    end: now + self.tuning.move_duration,
                    marker: Some(seq.marker),
                };
            }
            Phase::Moving {
                from,
                to,
                start,
                end,
                marker,
            } => {
                if now >= end {
                    self.position = to;
                    if let Some(id) = marker {
                        events.push(SeqEvent::MarkerRemoved { id });
                    }
                    self.phase = Phase::Idle;
                } else {
                    let t = (now - start).as_secs_f64() / (end - start).as_secs_f64();
                    self.position = from.lerp(to, t);
                }
            }
            _ => {}
        }

        self.advance_queue(now);
        events
    }

    // -----------------------------------------------------------------------
    // Teardown
    // -----------------------------------------------------------------------

    /// Drop every pending timer and queued sequence. Returns removals for
    /// all still-live markers; subsequent calls do nothing.
    pub fn shutdown(&mut self) -> Vec<SeqEvent> {
        if self.shut_down {
            return Vec::new();
        }
        let events = self.drain_markers();
        self.shut_down = true;
        events
    }

    /// Put the plane back at its starting cell, aborting all animation.
    /// The origin, once captured, stays captured.
    pub fn recenter(&mut self) -> Vec<SeqEvent> {
        if self.shut_down {
            return Vec::new();
        }
        let events = self.drain_markers();
        self.position = self.home;
        events
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn capture_origin(&mut self) {
        if self.origin.is_none() {
            self.origin = Some(self.position);
        }
    }

    fn cancel_move(&mut self, marker: Option<MarkerId>, events: &mut Vec<SeqEvent>) {
        if let Some(id) = marker {
            events.push(SeqEvent::MarkerRemoved { id });
        }
        self.phase = Phase::Idle;
    }

    /// Start the next queued click's rotate phase if nothing is in flight.
    fn advance_queue(&mut self, now: Instant) {
        if !matches!(self.phase, Phase::Idle) {
            return;
        }
        if let Some(seq) = self.queue.pop_front() {
            let (dx, dy) = (seq.target.x - self.position.x, seq.target.y - self.position.y);
            self.heading = heading_for_vector(dx, dy);
            self.phase = Phase::Rotating {
                until: now + self.tuning.rotate_delay,
                seq,
            };
        }
    }

    fn drain_markers(&mut self) -> Vec<SeqEvent> {
        let mut events = Vec::new();
        self.pending_step = None;
        match self.phase {
            Phase::Moving { marker: Some(id), .. } => {
                events.push(SeqEvent::MarkerRemoved { id });
            }
            Phase::Rotating { seq, .. } => {
                events.push(SeqEvent::MarkerRemoved { id: seq.marker });
            }
            _ => {}
        }
        self.phase = Phase::Idle;
        for seq in self.queue.drain(..) {
            events.push(SeqEvent::MarkerRemoved { id: seq.marker });
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    fn seq() -> (Sequencer, Instant) {
        let t0 = Instant::now();
        (Sequencer::new(Point::new(40.0, 12.0), Tuning::default()), t0)
    }

    fn removals(events: &[SeqEvent]) -> Vec<MarkerId> {
        events
            .iter()
            .filter_map(|e| match e {
                SeqEvent::MarkerRemoved { id } => Some(*id),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn key_step_glides_one_step() {
        let (mut s, t0) = seq();
        s.press(Direction::Right, t0);
        assert_eq!(s.heading(), 45);

        // Nothing moves during the rotate delay.
        s.tick(t0 + ms(100));
        assert_eq!(s.position(), Point::new(40.0, 12.0));

        // Step fires, glide runs for move_duration.
        s.tick(t0 + ms(200));
        s.tick(t0 + ms(700));
        assert!(s.position().x > 40.0 && s.position().x < 50.0);
        s.tick(t0 + ms(1300));
        assert_eq!(s.position(), Point::new(50.0, 12.0));
        assert!(s.is_idle());
    }

    #[test]
    fn second_key_press_cancels_pending_step() {
        let (mut s, t0) = seq();
        s.press(Direction::Up, t0);
        s.press(Direction::Right, t0 + ms(100));
        assert_eq!(s.heading(), 45);

        // The Up step would have fired at t0+200; only Right's fires, at t0+300.
        s.tick(t0 + ms(250));
        assert_eq!(s.position(), Point::new(40.0, 12.0));
        s.tick(t0 + ms(300));
        s.tick(t0 + ms(1400));
        assert_eq!(s.position(), Point::new(50.0, 12.0), "only the Right step moved");
    }

    #[test]
    fn click_sequence_runs_rotate_then_move_and_drops_marker() {
        let (mut s, t0) = seq();
        let target = Point::new(10.0, 2.0);
        let events = s.click(target, t0);
        assert_eq!(events, vec![SeqEvent::MarkerSpawned { id: 0, at: target }]);
        // Heading faces the target (up-and-left quadrant).
        assert!((180..360).contains(&s.heading()));

        // Rotate phase: stationary.
        assert!(s.tick(t0 + ms(100)).is_empty());
        assert_eq!(s.position(), Point::new(40.0, 12.0));

        // Glide phase.
        s.tick(t0 + ms(200));
        s.tick(t0 + ms(800));
        assert_ne!(s.position(), Point::new(40.0, 12.0));

        let events = s.tick(t0 + ms(1300));
        assert_eq!(removals(&events), vec![0]);
        assert_eq!(s.position(), target);
        assert!(s.is_idle());
    }

    #[test]
    fn click_during_rotate_waits_for_full_sequence() {
        let (mut s, t0) = seq();
        s.click(Point::new(10.0, 2.0), t0);
        let events = s.click(Point::new(60.0, 20.0), t0 + ms(50));
        assert_eq!(removals(&events), Vec::<MarkerId>::new());
        assert_eq!(s.queued(), 1);

        // First sequence runs to completion.
        s.tick(t0 + ms(200));
        let events = s.tick(t0 + ms(1250));
        assert_eq!(removals(&events), vec![0]);
        assert_eq!(s.position(), Point::new(10.0, 2.0));

        // Second sequence starts only now.
        assert_eq!(s.queued(), 0);
        s.tick(t0 + ms(1500));
        let events = s.tick(t0 + ms(2600));
        assert_eq!(removals(&events), vec![1]);
        assert_eq!(s.position(), Point::new(60.0, 20.0));
    }

    #[test]
    fn click_during_move_preempts_it() {
        let (mut s, t0) = seq();
        s.click(Point::new(10.0, 2.0), t0);
        s.tick(t0 + ms(200));
        s.tick(t0 + ms(600));
        let mid = s.position();
        assert_ne!(mid, Point::new(40.0, 12.0));

        // Arrives mid-glide: first marker removed immediately, move abandoned.
        let events = s.click(Point::new(60.0, 20.0), t0 + ms(700));
        assert_eq!(removals(&events), vec![0]);

        // Second sequence rotates from wherever the plane stopped.
        s.tick(t0 + ms(900));
        let events = s.tick(t0 + ms(2000));
        assert_eq!(removals(&events), vec![1]);
        assert_eq!(s.position(), Point::new(60.0, 20.0));
    }

    #[test]
    fn origin_is_captured_once() {
        let (mut s, t0) = seq();
        assert_eq!(s.origin(), None);
        s.press(Direction::Right, t0);
        assert_eq!(s.origin(), Some(Point::new(40.0, 12.0)));

        // Glide away, then interact again: origin is not recalculated.
        s.tick(t0 + ms(200));
        s.tick(t0 + ms(1300));
        assert_ne!(s.position(), Point::new(40.0, 12.0));
        s.click(Point::new(5.0, 5.0), t0 + ms(1400));
        assert_eq!(s.origin(), Some(Point::new(40.0, 12.0)));
        assert_eq!(s.offset(), Some((10.0, 0.0)));
    }

    #[test]
    fn key_step_firing_mid_rotate_requeues_the_click() {
        let (mut s, t0) = seq();
        s.click(Point::new(10.0, 12.0), t0);
        s.press(Direction::Down, t0 + ms(50));

        // Key step fires first (t0+250); the click's rotate is pushed back.
        let mut removed = Vec::new();
        for i in 0..40 {
            removed.extend(removals(&s.tick(t0 + ms(260 + i * 100))));
        }
        // The click's sequence still completed exactly once.
        assert_eq!(removed, vec![0]);
        assert_eq!(s.position(), Point::new(10.0, 12.0));
    }

    #[test]
    fn shutdown_drops_timers_and_live_markers() {
        let (mut s, t0) = seq();
        s.click(Point::new(10.0, 2.0), t0);
        s.click(Point::new(60.0, 20.0), t0 + ms(10));
        s.press(Direction::Up, t0 + ms(20));

        let events = s.shutdown();
        assert_eq!(removals(&events), vec![0, 1]);

        // Nothing fires afterward, no matter how much time passes.
        let pos = s.position();
        assert!(s.tick(t0 + ms(60_000)).is_empty());
        assert_eq!(s.position(), pos);
        assert!(s.shutdown().is_empty());
    }

    #[test]
    fn recenter_aborts_animation_but_keeps_origin() {
        let (mut s, t0) = seq();
        s.click(Point::new(10.0, 2.0), t0);
        s.tick(t0 + ms(200));
        s.tick(t0 + ms(600));

        let events = s.recenter();
        assert_eq!(removals(&events), vec![0]);
        assert_eq!(s.position(), Point::new(40.0, 12.0));
        assert_eq!(s.origin(), Some(Point::new(40.0, 12.0)));
        assert!(s.is_idle());
    }
}
