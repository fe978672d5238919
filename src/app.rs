//! App — terminal setup and the poll/tick/render loop.
//!
//! Owns the terminal, feeds input events and wall-clock time into the
//! sequencer, keeps the live ripple widgets in sync with its marker events,
//! and repaints the canvas every frame.

use std::io::{self, Write};
use std::time::{Duration, Instant};

use anyhow::{Result, bail};
use crossterm::event::{
    DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, MouseButton,
    MouseEventKind,
};
use crossterm::{cursor, event, execute, queue, style, terminal};

use crate::config::{FlightConfig, matches_binding};
use crate::heading::Direction;
use crate::marker::Ripple;
use crate::plane;
use crate::sequencer::{SeqEvent, Sequencer, Tuning};
use crate::types::{Cell, Color, DrawOp, NamedColor, Point, Style};

/// Rows reserved above the canvas for the menu bar.
const CANVAS_OFFSET: u16 = 1;

/// Repaint cadence; also the upper bound on input latency.
const FRAME_INTERVAL: Duration = Duration::from_millis(33);

const MIN_WIDTH: u16 = 20;
const MIN_HEIGHT: u16 = 8;

pub struct App {
    config: FlightConfig,
    sequencer: Sequencer,
    ripples: Vec<Ripple>,
    canvas_w: u16,
    canvas_h: u16,
}

impl App {
    pub fn new(config: FlightConfig) -> Result<Self> {
        let (term_w, term_h) = terminal::size()?;
        // +2: one row for menu bar, one row for status bar
        if term_w < MIN_WIDTH || term_h < MIN_HEIGHT + 2 {
            bail!(
                "Terminal too small: need {}x{}, have {}x{}",
                MIN_WIDTH,
                MIN_HEIGHT + 2,
                term_w,
                term_h,
            );
        }
        let canvas_w = term_w;
        let canvas_h = term_h - 2;
        let home = Point::new(canvas_w as f64 / 2.0, canvas_h as f64 / 2.0);
        let tuning: Tuning = config.tuning();
        Ok(App {
            config,
            sequencer: Sequencer::new(home, tuning),
            ripples: Vec::new(),
            canvas_w,
            canvas_h,
        })
    }

    /// Run the toy until quit.
    ///
    /// Sets up the terminal (raw mode, alternate screen, mouse capture),
    /// enters the event loop, and restores the terminal on exit (even on
    /// error).
    pub fn fly(&mut self) -> Result<()> {
        let mut stdout = io::stdout();
        terminal::enable_raw_mode()?;
        execute!(
            stdout,
            terminal::EnterAlternateScreen,
            EnableMouseCapture,
            cursor::Hide,
            terminal::Clear(terminal::ClearType::All),
        )?;

        let result = self.run_loop(&mut stdout);

        // Always restore terminal state.
        let _ = execute!(stdout, cursor::Show, DisableMouseCapture, terminal::LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();

        result
    }

    // -----------------------------------------------------------------------
    // Event loop
    // -----------------------------------------------------------------------

    fn run_loop(&mut self, stdout: &mut io::Stdout) -> Result<()> {
        self.render_menubar(stdout)?;

        loop {
            if event::poll(FRAME_INTERVAL)? {
                let now = Instant::now();
                match event::read()? {
                    Event::Key(key) => {
                        if self.handle_key(key, now) == Flow::Quit {
                            let events = self.sequencer.shutdown();
                            self.apply(&events, now);
                            break;
                        }
                    }
                    Event::Mouse(mouse) => {
                        if mouse.kind == MouseEventKind::Down(MouseButton::Left) {
                            self.handle_click(mouse.column, mouse.row, now);
                        }
                    }
                    Event::Resize(w, h) => {
                        self.canvas_w = w;
                        self.canvas_h = h.saturating_sub(2).max(1);
                        execute!(stdout, terminal::Clear(terminal::ClearType::All))?;
                        self.render_menubar(stdout)?;
                    }
                    _ => {}
                }
            }

            let now = Instant::now();
            let events = self.sequencer.tick(now);
            self.apply(&events, now);
            self.render(stdout, now)?;
        }

        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent, now: Instant) -> Flow {
        let bindings = &self.config.key_bindings;
        if matches_binding(&bindings.quit, &key) || key.code == KeyCode::Esc {
            return Flow::Quit;
        }
        if matches_binding(&bindings.center, &key) {
            let events = self.sequencer.recenter();
            self.apply(&events, now);
            return Flow::Continue;
        }
        let direction = match key.code {
            KeyCode::Up => Some(Direction::Up),
            KeyCode::Down => Some(Direction::Down),
            KeyCode::Left => Some(Direction::Left),
            KeyCode::Right => Some(Direction::Right),
            _ => None,
        };
        if let Some(direction) = direction {
            self.sequencer.press(direction, now);
        }
        Flow::Continue
    }

    fn handle_click(&mut self, column: u16, row: u16, now: Instant) {
        // Clicks on the menu or status rows are ignored.
        if row < CANVAS_OFFSET || row >= CANVAS_OFFSET + self.canvas_h {
            return;
        }
        let target = Point::new(column as f64, (row - CANVAS_OFFSET) as f64);
        let events = self.sequencer.click(target, now);
        self.apply(&events, now);
    }

    /// Mirror sequencer marker events into the live ripple list.
    fn apply(&mut self, events: &[SeqEvent], now: Instant) {
        for event in events {
            match *event {
                SeqEvent::MarkerSpawned { id, at } => {
                    self.ripples.push(Ripple::new(id, at, now));
                }
                SeqEvent::MarkerRemoved { id } => {
                    self.ripples.retain(|r| r.id != id);
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // Terminal output
    // -----------------------------------------------------------------------

    fn render(&self, stdout: &mut io::Stdout, now: Instant) -> Result<()> {
        let mut ops = Vec::new();
        for ripple in &self.ripples {
            ripple.resolve(
                now,
                self.config.ripple_period(),
                self.config.ripple_radius,
                &self.config.marker_color,
                &mut ops,
            );
        }
        let plane_style = Style::fg(self.config.plane_color.clone()).bold();
        plane::resolve(
            self.sequencer.position(),
            self.sequencer.heading(),
            &plane_style,
            &mut ops,
        );

        let grid = rasterize(&ops, self.canvas_w, self.canvas_h);
        for (y, row) in grid.iter().enumerate() {
            queue!(stdout, cursor::MoveTo(0, y as u16 + CANVAS_OFFSET))?;
            for cell in row {
                let cs = to_content_style(&cell.style);
                queue!(
                    stdout,
                    style::PrintStyledContent(style::StyledContent::new(cs, cell.ch))
                )?;
            }
        }
        self.render_status(stdout)?;
        stdout.flush()?;
        Ok(())
    }

    fn render_menubar(&self, stdout: &mut io::Stdout) -> Result<()> {
        let items: &[&str] = &[
            "[click] fly there",
            "[←↑↓→] step",
            "[c] center",
            "[q][Esc] quit",
        ];

        queue!(
            stdout,
            cursor::MoveTo(0, 0),
            terminal::Clear(terminal::ClearType::CurrentLine),
            style::Print(" "),
        )?;
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                queue!(stdout, style::Print("  "))?;
            }
            print_menu_item(stdout, item)?;
        }
        stdout.flush()?;
        Ok(())
    }

    fn render_status(&self, stdout: &mut io::Stdout) -> Result<()> {
        let status_y = self.canvas_h + CANVAS_OFFSET;
        let (px, py) = self.sequencer.position().cell();
        let origin = match self.sequencer.origin() {
            Some(o) => {
                let (ox, oy) = o.cell();
                format!("origin ({ox},{oy})")
            }
            None => "origin unset".to_string(),
        };
        let status = format!(
            " heading {:>3}° | pos ({px},{py}) | {origin} | queued {} ",
            self.sequencer.heading(),
            self.sequencer.queued(),
        );

        let mut cs = style::ContentStyle::default();
        cs.attributes.set(style::Attribute::Dim);

        queue!(
            stdout,
            cursor::MoveTo(0, status_y),
            terminal::Clear(terminal::ClearType::CurrentLine),
            style::PrintStyledContent(style::StyledContent::new(cs, status)),
        )?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

/// Print a menu item string, bolding the text inside `[...]` brackets and
/// dimming the rest.
fn print_menu_item(stdout: &mut io::Stdout, item: &str) -> Result<()> {
    let mut bracketed = false;
    for ch in item.chars() {
        match ch {
            '[' => {
                bracketed = true;
                queue!(stdout, style::SetAttribute(style::Attribute::Bold))?;
            }
            ']' => {
                queue!(
                    stdout,
                    style::Print(']'),
                    style::SetAttribute(style::Attribute::Reset),
                )?;
                bracketed = false;
                continue;
            }
            _ if !bracketed => {
                queue!(
                    stdout,
                    style::SetAttribute(style::Attribute::Dim),
                    style::Print(ch),
                    style::SetAttribute(style::Attribute::Reset),
                )?;
                continue;
            }
            _ => {}
        }
        queue!(stdout, style::Print(ch))?;
    }
    Ok(())
}

/// Rasterize draw ops onto a fixed-size cell grid, higher z painting over
/// lower. Off-grid ops are clipped.
fn rasterize(ops: &[DrawOp], width: u16, height: u16) -> Vec<Vec<Cell>> {
    let w = width as usize;
    let h = height as usize;
    let mut grid = vec![vec![Cell::default(); w]; h];
    let mut sorted: Vec<&DrawOp> = ops.iter().collect();
    sorted.sort_by_key(|op| op.z_order);
    for op in sorted {
        let (x, y) = (op.x as usize, op.y as usize);
        if x < w && y < h {
            grid[y][x] = Cell {
                ch: op.ch,
                style: op.style.clone(),
            };
        }
    }
    grid
}

// ---------------------------------------------------------------------------
// Style conversion
// ---------------------------------------------------------------------------

fn to_content_style(s: &Style) -> style::ContentStyle {
    let mut cs = style::ContentStyle::default();
    if let Some(fg) = &s.fg {
        cs.foreground_color = Some(to_ct_color(fg));
    }
    if s.bold {
        cs.attributes.set(style::Attribute::Bold);
    }
    if s.dim {
        cs.attributes.set(style::Attribute::Dim);
    }
    cs
}

fn to_ct_color(c: &Color) -> style::Color {
    match c {
        Color::Named(n) => match n {
            NamedColor::Black => style::Color::Black,
            NamedColor::Red => style::Color::Red,
            NamedColor::Green => style::Color::Green,
            NamedColor::Yellow => style::Color::Yellow,
            NamedColor::Blue => style::Color::Blue,
            NamedColor::Magenta => style::Color::Magenta,
            NamedColor::Cyan => style::Color::Cyan,
            NamedColor::White => style::Color::White,
        },
        Color::Rgb { r, g, b } => style::Color::Rgb {
            r: *r,
            g: *g,
            b: *b,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rasterize_clips_and_layers() {
        let ops = vec![
            DrawOp {
                x: 1,
                y: 1,
                ch: 'a',
                style: Style::default(),
                z_order: 0,
            },
            DrawOp {
                x: 1,
                y: 1,
                ch: 'b',
                style: Style::default(),
                z_order: 1,
            },
            DrawOp {
                x: 99,
                y: 0,
                ch: 'x',
                style: Style::default(),
                z_order: 0,
            },
        ];
        let grid = rasterize(&ops, 4, 3);
        assert_eq!(grid[1][1].ch, 'b');
        assert_eq!(grid[0][0].ch, ' ');
        assert_eq!(grid.len(), 3);
        assert_eq!(grid[0].len(), 4);
    }

    #[test]
    fn rasterize_is_z_stable_regardless_of_op_order() {
        let mk = |ch, z| DrawOp {
            x: 0,
            y: 0,
            ch,
            style: Style::default(),
            z_order: z,
        };
        let grid = rasterize(&[mk('p', 1), mk('m', 0)], 1, 1);
        assert_eq!(grid[0][0].ch, 'p', "plane paints over marker");
    }
}
