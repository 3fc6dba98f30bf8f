//! One-line job progress on stderr.

use std::io::{self, Write};

use crossterm::cursor::MoveToColumn;
use crossterm::queue;
use crossterm::style::Print;
use crossterm::terminal::{Clear, ClearType};

use crate::job::CollectionEvent;

const BAR_WIDTH: usize = 30;

/// `[####----]` with `value` clamped into `0..=max`. An unknown range draws empty.
pub fn bar(value: usize, max: usize, width: usize) -> String {
    let filled = if max == 0 {
        0
    } else {
        value.min(max) * width / max
    };
    format!("[{}{}]", "#".repeat(filled), "-".repeat(width - filled))
}

pub fn status_line(description: &str, value: usize, min: usize, max: usize) -> String {
    let span = max.saturating_sub(min);
    let done = value.saturating_sub(min);
    format!(
        "{description} {} {}/{}",
        bar(done, span, BAR_WIDTH),
        done.min(span),
        span
    )
}

pub struct Progress<W: Write> {
    out: W,
    description: String,
    min: usize,
    max: usize,
    value: usize,
    active: bool,
}

impl<W: Write> Progress<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            description: String::new(),
            min: 0,
            max: 0,
            value: 0,
            active: false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn handle(&mut self, event: &CollectionEvent) -> io::Result<()> {
        match event {
            CollectionEvent::JobStarted { description, .. } => {
                self.description = description.clone();
                self.min = 0;
                self.max = 0;
                self.value = 0;
                self.active = true;
                self.draw()
            }
            CollectionEvent::ProgressBounds { min, max, .. } => {
                self.min = *min;
                self.max = *max;
                self.value = *min;
                self.draw()
            }
            CollectionEvent::Progress { value, .. } => {
                self.value = *value;
                self.draw()
            }
            CollectionEvent::JobFinished { .. } => self.clear(),
            CollectionEvent::EnabledChanged { .. } | CollectionEvent::ContentsChanged { .. } => {
                Ok(())
            }
        }
    }

    /// Wipe the progress line, if one is showing.
    pub fn clear(&mut self) -> io::Result<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;
        queue!(self.out, MoveToColumn(0), Clear(ClearType::CurrentLine))?;
        self.out.flush()
    }

    fn draw(&mut self) -> io::Result<()> {
        if !self.active {
            return Ok(());
        }
        let line = status_line(&self.description, self.value, self.min, self.max);
        queue!(
            self.out,
            MoveToColumn(0),
            Clear(ClearType::CurrentLine),
            Print(line)
        )?;
        self.out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
