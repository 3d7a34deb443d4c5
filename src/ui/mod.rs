pub mod cpu;
pub mod header;
pub mod memory;
pub mod sessions;
pub mod sysinfo;
pub mod trend;


use std::io::{self, Write};

use crossterm::cursor::MoveTo;
use crossterm::queue;
use crossterm::terminal::{self, Clear, ClearType};

use crate::config::RunConfig;
use crate::system::history::SeriesStore;
use crate::system::info::SystemInfo;
use crate::system::sample::SessionSnapshot;

pub const SEPARATOR_WIDTH: usize = 39;
const FALLBACK_WIDTH: u16 = 80;

pub fn separator() -> String {
    "-".repeat(SEPARATOR_WIDTH)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    /// Clear and redraw the whole screen every iteration.
    FullScreen,
    /// Append one block per iteration, keeping earlier output in scrollback.
    Sequential,
}

impl Mode {
    pub fn for_config(config: &RunConfig) -> Self {
        if config.sequential_mode {
            Mode::Sequential
        } else {
            Mode::FullScreen
        }
    }
}

/// Everything one frame is built from.
pub struct FrameContext<'a> {
    pub config: &'a RunConfig,
    pub store: &'a SeriesStore,
    pub sessions: &'a SessionSnapshot,
    /// Zero-based index of the iteration being drawn.
    pub iteration: usize,
    pub self_memory_kb: Option<u64>,
    pub width: u16,
}

pub fn build_frame(ctx: &FrameContext<'_>) -> Vec<String> {
    let config = ctx.config;
    let mut lines = Vec::new();

    header::render(&mut lines, config, ctx.iteration, ctx.self_memory_kb);
    if config.shows_usage() {
        let remaining = config.sample_count.saturating_sub(ctx.iteration + 1);
        memory::render(
            &mut lines,
            ctx.store.memory(),
            config.show_graphics,
            config.sequential_mode,
            remaining,
        );
    }
    if config.shows_sessions() {
        sessions::render(&mut lines, ctx.sessions, ctx.width);
    }
    if config.shows_usage() {
        cpu::render(
            &mut lines,
            ctx.store.cpu(),
            config.show_graphics,
            config.sequential_mode,
        );
    }
    lines
}

pub fn build_system_info(info: &SystemInfo) -> Vec<String> {
    let mut lines = Vec::new();
    sysinfo::render(&mut lines, info);
    lines
}

/// Line-oriented terminal output.
pub struct Screen<W: Write> {
    out: W,
    mode: Mode,
    width: u16,
}

impl<W: Write> Screen<W> {
    pub fn new(out: W, mode: Mode) -> Self {
        let width = terminal::size().map(|(w, _)| w).unwrap_or(FALLBACK_WIDTH);
        Self::with_width(out, mode, width)
    }

    pub fn with_width(out: W, mode: Mode, width: u16) -> Self {
        Screen { out, mode, width }
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Shows one iteration's frame.
    pub fn draw(&mut self, lines: &[String]) -> io::Result<()> {
        if self.mode == Mode::FullScreen {
            queue!(self.out, Clear(ClearType::All), MoveTo(0, 0))?;
        }
        self.print_lines(lines)
    }

    /// Appends lines below whatever is already shown.
    pub fn print_lines(&mut self, lines: &[String]) -> io::Result<()> {
        for line in lines {
            writeln!(self.out, "{line}")?;
        }
        self.out.flush()
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }
}
