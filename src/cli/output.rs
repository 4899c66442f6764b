//! Colored terminal output for release captain commands

use std::io::Write;
use termcolor::{Buffer, BufferWriter, Color, ColorChoice, ColorSpec, WriteColor};

/// Marker printed in front of a checklist line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepMarker {
    /// Step is done
    Done,
    /// Step the checklist is waiting on
    Cursor,
    /// Step may be run now
    Ready,
    /// Step is waiting on an earlier one
    Blocked,
}

impl StepMarker {
    fn glyph(&self) -> &'static str {
        match self {
            StepMarker::Done => "✓",
            StepMarker::Cursor => "▶",
            StepMarker::Ready => "○",
            StepMarker::Blocked => "·",
        }
    }

    fn color(&self) -> Color {
        match self {
            StepMarker::Done => Color::Green,
            StepMarker::Cursor => Color::Cyan,
            StepMarker::Ready => Color::White,
            StepMarker::Blocked => Color::Yellow,
        }
    }
}

/// Output manager for consistent colored terminal output
#[derive(Debug)]
pub struct OutputManager {
    bufwtr: BufferWriter,
    verbose: bool,
    quiet: bool,
}

impl Clone for OutputManager {
    fn clone(&self) -> Self {
        Self::new(self.verbose, self.quiet)
    }
}

impl OutputManager {
    /// Create a new output manager
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self {
            bufwtr: BufferWriter::stdout(ColorChoice::Auto),
            verbose,
            quiet,
        }
    }

    fn prefixed(&self, spec: &ColorSpec, prefix: &str, message: &str) -> std::io::Result<()> {
        let mut buffer = self.bufwtr.buffer();
        write_prefixed(&mut buffer, spec, prefix, message)?;
        self.bufwtr.print(&buffer)
    }

    /// Print an info message (normal output)
    pub fn info(&self, message: &str) -> std::io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        self.prefixed(ColorSpec::new().set_fg(Some(Color::Cyan)), "ℹ", message)
    }

    /// Print a success message
    pub fn success(&self, message: &str) -> std::io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        self.prefixed(
            ColorSpec::new().set_fg(Some(Color::Green)).set_bold(true),
            "✓",
            message,
        )
    }

    /// Print a warning message
    pub fn warn(&self, message: &str) -> std::io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        self.prefixed(
            ColorSpec::new().set_fg(Some(Color::Yellow)).set_bold(true),
            "⚠",
            message,
        )
    }

    /// Print an error message to stderr (always shown)
    pub fn error(&self, message: &str) {
        let bufwtr = BufferWriter::stderr(ColorChoice::Auto);
        let mut buffer = bufwtr.buffer();
        let spec = ColorSpec::new().set_fg(Some(Color::Red)).set_bold(true).clone();
        if write_prefixed(&mut buffer, &spec, "✗", message).is_err() || bufwtr.print(&buffer).is_err()
        {
            // Stderr failed - fallback to stdout as last resort
            println!("[STDERR ERROR] ✗ {}", message);
        }
    }

    /// Print a verbose/debug message (only in verbose mode)
    pub fn verbose(&self, message: &str) -> std::io::Result<()> {
        if !self.verbose || self.quiet {
            return Ok(());
        }
        self.prefixed(ColorSpec::new().set_fg(Some(Color::Blue)), "→", message)
    }

    /// Print a sub-step progress line
    pub fn progress(&self, message: &str) -> std::io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        self.prefixed(ColorSpec::new().set_fg(Some(Color::Magenta)), "⋯", message)
    }

    /// Print a section header
    pub fn section(&self, title: &str) -> std::io::Result<()> {
        if self.quiet {
            return Ok(());
        }

        let mut buffer = self.bufwtr.buffer();
        writeln!(&mut buffer)?;
        buffer.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)).set_bold(true))?;
        writeln!(&mut buffer, "═══ {} ═══", title)?;
        buffer.reset()?;
        self.bufwtr.print(&buffer)
    }

    /// Print one checklist line: marker, step id and label
    pub fn step_line(&self, marker: StepMarker, id: &str, label: &str) -> std::io::Result<()> {
        if self.quiet {
            return Ok(());
        }

        let mut buffer = self.bufwtr.buffer();
        buffer.set_color(
            ColorSpec::new()
                .set_fg(Some(marker.color()))
                .set_bold(marker == StepMarker::Cursor),
        )?;
        write!(&mut buffer, "{} {:<24}", marker.glyph(), id)?;
        buffer.reset()?;
        writeln!(&mut buffer, " {}", label)?;
        self.bufwtr.print(&buffer)
    }

    /// Print indented text (for sub-items)
    pub fn indent(&self, message: &str) -> std::io::Result<()> {
        if self.quiet {
            return Ok(());
        }

        let mut buffer = self.bufwtr.buffer();
        writeln!(&mut buffer, "    {}", message)?;
        self.bufwtr.print(&buffer)
    }

    /// Print a plain message (respects quiet mode)
    pub fn println(&self, message: &str) -> std::io::Result<()> {
        if self.quiet {
            return Ok(());
        }

        let mut buffer = self.bufwtr.buffer();
        writeln!(&mut buffer, "{}", message)?;
        self.bufwtr.print(&buffer)
    }

    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Check if quiet mode is enabled
    pub fn is_quiet(&self) -> bool {
        self.quiet
    }
}

fn write_prefixed(
    buffer: &mut Buffer,
    spec: &ColorSpec,
    prefix: &str,
    message: &str,
) -> std::io::Result<()> {
    buffer.set_color(spec)?;
    write!(buffer, "{}", prefix)?;
    buffer.reset()?;
    writeln!(buffer, " {}", message)
}
