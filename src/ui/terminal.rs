/// Terminal presenter: shows a `FrameBuffer` with crossterm.
///
/// How it works:
///   1. Sample the frame into terminal cells. Each cell is an upper half
///      block '▀': foreground = top sample, background = bottom sample, so
///      one cell carries two vertical pixels. The frame is stretched to fill
///      the terminal.
///   2. Compare each cell with the previous frame's cell
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    event::{DisableMouseCapture, EnableMouseCapture},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::game_loop::Presenter;
use super::renderer::FrameBuffer;

const HALF_BLOCK: &str = "\u{2580}";

// ── Cell: two stacked samples ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Cell {
    top: u32,
    bottom: u32,
}

impl Cell {
    /// Never equal to a sampled cell (alpha 0 is never sampled opaque).
    const INVALID: Cell = Cell { top: 0x00AB_CDEF, bottom: 0x00FE_DCBA };
}

fn colour(argb: u32) -> Color {
    let [_, r, g, b] = argb.to_be_bytes();
    Color::Rgb { r, g, b }
}

/// Sample `frame` into `cols`×`rows` cells, row-major.
fn sample_cells(frame: &FrameBuffer, cols: usize, rows: usize, out: &mut Vec<Cell>) {
    out.clear();
    if cols == 0 || rows == 0 {
        return;
    }
    let (fw, fh) = (frame.width(), frame.height());
    let sub_rows = rows * 2;
    for row in 0..rows {
        let top_y = (row * 2) * fh / sub_rows;
        let bottom_y = (row * 2 + 1) * fh / sub_rows;
        for col in 0..cols {
            let x = col * fw / cols;
            out.push(Cell {
                top: frame.get(x, top_y) | 0xFF00_0000,
                bottom: frame.get(x, bottom_y) | 0xFF00_0000,
            });
        }
    }
}

pub struct Terminal {
    writer: BufWriter<io::Stdout>,
    front: Vec<Cell>,
    back: Vec<Cell>,
    cols: usize,
    rows: usize,
    frame_w: usize,
    frame_h: usize,
}

impl Terminal {
    pub fn new() -> Self {
        Terminal {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: Vec::new(),
            back: Vec::new(),
            cols: 0,
            rows: 0,
            frame_w: 1,
            frame_h: 1,
        }
    }

    /// Switch the terminal into game mode. Pair with `leave()`.
    pub fn enter() -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            io::stdout(),
            terminal::EnterAlternateScreen,
            EnableMouseCapture,
            cursor::Hide,
            Clear(ClearType::All)
        )
    }

    pub fn leave() -> io::Result<()> {
        execute!(
            io::stdout(),
            ResetColor,
            DisableMouseCapture,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    fn resize(&mut self, cols: usize, rows: usize) {
        self.cols = cols;
        self.rows = rows;
        // Force full repaint: back ≠ front for every cell.
        self.back = vec![Cell::INVALID; cols * rows];
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg: Option<u32> = None;
        let mut last_bg: Option<u32> = None;
        let mut need_move = true;

        for y in 0..self.rows {
            for x in 0..self.cols {
                let i = y * self.cols + x;
                let cell = self.front[i];
                if cell == self.back[i] {
                    need_move = true;
                    continue;
                }

                if need_move {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                    need_move = false;
                }

                // Set colors only if changed
                if last_fg != Some(cell.top) {
                    queue!(self.writer, SetForegroundColor(colour(cell.top)))?;
                    last_fg = Some(cell.top);
                }
                if last_bg != Some(cell.bottom) {
                    queue!(self.writer, SetBackgroundColor(colour(cell.bottom)))?;
                    last_bg = Some(cell.bottom);
                }

                queue!(self.writer, Print(HALF_BLOCK))?;
            }
            // the cursor does not wrap predictably at the last column
            need_move = true;
        }

        self.writer.flush()
    }
}

impl Presenter for Terminal {
    fn present(&mut self, frame: &FrameBuffer) -> io::Result<()> {
        // Detect terminal resize
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.cols || th as usize != self.rows {
            self.resize(tw as usize, th as usize);
            queue!(self.writer, Clear(ClearType::All))?;
        }
        self.frame_w = frame.width().max(1);
        self.frame_h = frame.height().max(1);

        sample_cells(frame, self.cols, self.rows, &mut self.front);
        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    /// Frame pixel under terminal cell `(col, row)` (its top sample).
    fn frame_point(&self, col: u16, row: u16) -> Option<(i32, i32)> {
        if self.cols == 0 || self.rows == 0 {
            return None;
        }
        let (col, row) = (col as usize, row as usize);
        if col >= self.cols || row >= self.rows {
            return None;
        }
        let x = col * self.frame_w / self.cols;
        let y = (row * 2) * self.frame_h / (self.rows * 2);
        Some((x as i32, y as i32))
    }
}
