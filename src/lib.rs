//! Paper Plane — a terminal plane animation toy.
//!
//! A plane glyph rotates to face a clicked cell, then glides toward it; a
//! ripple marker blooms at the click point until the glide completes. Arrow
//! keys nudge the plane one step at a time. The interesting part is the
//! `sequencer` module, which turns these discrete inputs into ordered
//! rotate-then-glide animations with cancellation.

pub mod app;
pub mod config;
pub mod heading;
pub mod marker;
pub mod plane;
pub mod sequencer;
pub mod types;
