//! Colored and indented terminal output.

use core::fmt;

use std::io::{self, IsTerminal, Write};

use termcolor::{Color, ColorChoice, ColorSpec, WriteColor};

/// The severity of a single line of output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Warn,
    Error,
    /// A line without a label.
    Blank,
}

impl Level {
    fn label(self) -> Option<(&'static str, Color)> {
        match self {
            Level::Info => Some(("info", Color::Green)),
            Level::Warn => Some(("warning", Color::Yellow)),
            Level::Error => Some(("error", Color::Red)),
            Level::Blank => None,
        }
    }
}

/// Helper to write output lines to a color-aware sink.
pub struct Out<'a> {
    w: &'a mut dyn WriteColor,
    indent: usize,
}

impl<'a> Out<'a> {
    /// Construct new output wrapping the given sink.
    pub fn new(w: &'a mut dyn WriteColor) -> Self {
        Self { w, indent: 0 }
    }

    /// Borrow the output with `n` additional levels of indentation.
    pub fn indent(&mut self, n: usize) -> Out<'_> {
        Out {
            w: &mut *self.w,
            indent: self.indent + n,
        }
    }

    #[doc(hidden)]
    pub fn write(&mut self, level: Level, args: fmt::Arguments<'_>) -> io::Result<()> {
        for _ in 0..self.indent {
            self.w.write_all(b"  ")?;
        }

        if let Some((label, color)) = level.label() {
            self.w
                .set_color(ColorSpec::new().set_fg(Some(color)).set_bold(true))?;
            self.w.write_all(label.as_bytes())?;
            self.w.reset()?;
            self.w.write_all(b": ")?;
        }

        self.w.write_fmt(args)?;
        self.w.write_all(b"\n")?;
        Ok(())
    }
}

/// How to color output, as selected on the command line.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Colors {
    /// Color output when writing to a terminal.
    #[default]
    Auto,
    Always,
    Never,
}

impl Colors {
    /// Resolve into a choice for standard output.
    pub fn choice(self) -> ColorChoice {
        match self {
            Colors::Auto if io::stdout().is_terminal() => ColorChoice::Auto,
            Colors::Auto => ColorChoice::Never,
            Colors::Always => ColorChoice::Always,
            Colors::Never => ColorChoice::Never,
        }
    }
}

macro_rules! info {
    ($o:expr, $($arg:tt)*) => {
        $o.write($crate::out::Level::Info, format_args!($($arg)*))?
    };
}

macro_rules! warning {
    ($o:expr, $($arg:tt)*) => {
        $o.write($crate::out::Level::Warn, format_args!($($arg)*))?
    };
}

macro_rules! error {
    ($o:expr, $($arg:tt)*) => {
        $o.write($crate::out::Level::Error, format_args!($($arg)*))?
    };
}

macro_rules! blank {
    ($o:expr, $($arg:tt)*) => {
        $o.write($crate::out::Level::Blank, format_args!($($arg)*))?
    };
}

pub(crate) use {blank, error, info, warning};
