//! Text output for packet decoding.
//!
//! One [`Emitter`] accumulates the text for a single packet. Verbosity is
//! carried here so printers can ask `verbose()` instead of threading a config
//! struct through every call. Nested detail is emitted as newline +
//! tab-indent; the decode loop owns the final newline.

use std::fmt::{Arguments, Write};

/// Accumulates one packet's worth of decoded text.
#[derive(Debug)]
pub struct Emitter {
    buf: String,
    verbosity: u8,
}

impl Emitter {
    pub fn new(verbosity: u8) -> Self {
        Self {
            buf: String::with_capacity(256),
            verbosity,
        }
    }

    /// Verbosity level: 0 = one-line summary, higher = more nested detail.
    pub fn verbosity(&self) -> u8 {
        self.verbosity
    }

    /// True when nested detail should be printed at all.
    pub fn verbose(&self) -> bool {
        self.verbosity >= 1
    }

    pub fn str(&mut self, s: &str) {
        self.buf.push_str(s);
    }

    /// `write!`-style formatted append. Infallible (String sink).
    pub fn fmt(&mut self, args: Arguments<'_>) {
        let _ = self.buf.write_fmt(args);
    }

    /// Start an indented detail line at the given nesting depth.
    pub fn indent(&mut self, depth: usize) {
        self.buf.push('\n');
        for _ in 0..=depth {
            self.buf.push('\t');
        }
    }

    /// Fixed truncation marker: the capture ended before `proto` did.
    pub fn truncated(&mut self, proto: &str) {
        let _ = write!(self.buf, "[|{proto}]");
    }

    /// Fixed invalid marker: the packet's own structure is self-contradictory.
    pub fn invalid(&mut self) {
        self.buf.push_str(" (invalid)");
    }

    pub fn as_str(&self) -> &str {
        &self.buf
    }

    pub fn finish(self) -> String {
        self.buf
    }
}

/// `emit!(out, "...", args)` - shorthand for `out.fmt(format_args!(...))`.
#[macro_export]
macro_rules! emit {
    ($out:expr, $($arg:tt)*) => {
        $out.fmt(format_args!($($arg)*))
    };
}
