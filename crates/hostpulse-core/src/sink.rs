//! Snapshot consumers: terminal frame, log line, JSON line.

use std::io::{self, Write};

use crossterm::cursor::MoveTo;
use crossterm::execute;
use crossterm::terminal::{Clear, ClearType};
use log::info;

use crate::render::{format_log_line, render_frame};
use crate::sampler::Snapshot;

/// Consumes one snapshot per sampler cycle.
pub trait Sink {
    fn consume(&mut self, snapshot: &Snapshot) -> io::Result<()>;

    /// Called once after the last cycle.
    fn finish(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<S: Sink + ?Sized> Sink for Box<S> {
    fn consume(&mut self, snapshot: &Snapshot) -> io::Result<()> {
        (**self).consume(snapshot)
    }

    fn finish(&mut self) -> io::Result<()> {
        (**self).finish()
    }
}

/// Clears the terminal and redraws the full frame every cycle.
pub struct TerminalSink<W: Write> {
    out: W,
}

impl<W: Write> TerminalSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl TerminalSink<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> Sink for TerminalSink<W> {
    fn consume(&mut self, snapshot: &Snapshot) -> io::Result<()> {
        execute!(self.out, Clear(ClearType::All), MoveTo(0, 0))?;
        self.out.write_all(render_frame(snapshot).as_bytes())?;
        self.out.flush()
    }

    fn finish(&mut self) -> io::Result<()> {
        writeln!(self.out)?;
        self.out.flush()
    }
}

/// Emits each snapshot as one `info!` record.
#[derive(Debug, Default)]
pub struct LogSink;

impl Sink for LogSink {
    fn consume(&mut self, snapshot: &Snapshot) -> io::Result<()> {
        info!("{}", format_log_line(snapshot));
        Ok(())
    }
}

/// Writes each snapshot as a single JSON line.
pub struct JsonSink<W: Write> {
    out: W,
}

impl<W: Write> JsonSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl JsonSink<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> Sink for JsonSink<W> {
    fn consume(&mut self, snapshot: &Snapshot) -> io::Result<()> {
        serde_json::to_writer(&mut self.out, snapshot)?;
        self.out.write_all(b"\n")?;
        self.out.flush()
    }
}
