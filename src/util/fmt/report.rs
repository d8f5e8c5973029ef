use std::fmt::{self, Write};

use crate::token::Position;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Severity {
    /// Stops compilation.
    Critical,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Critical => "CRITICAL ERROR",
            Severity::Warning => "WARNING",
        })
    }
}

/// A message anchored to a source position, detached from the pass that
/// produced it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Stable error code, such as `ERR_NO_VAR`. Warnings have none.
    pub code: Option<&'static str>,
    pub pos: Position,
    pub message: String,
}

impl Diagnostic {
    pub fn critical(code: &'static str, pos: Position, message: String) -> Diagnostic {
        Diagnostic {
            severity: Severity::Critical,
            code: Some(code),
            pos,
            message,
        }
    }

    pub fn warning(pos: Position, message: String) -> Diagnostic {
        Diagnostic {
            severity: Severity::Warning,
            code: None,
            pos,
            message,
        }
    }
}

/// Renders diagnostics against the source they were reported for.
pub struct Reporter<'a> {
    file_name: &'a str,
    src: &'a str,
}

impl<'a> Reporter<'a> {
    pub fn new(file_name: &'a str, src: &'a str) -> Reporter<'a> {
        Reporter { file_name, src }
    }

    /// Formats the header, the offending line, a caret under the column, a
    /// pointer line and the message. The result has no trailing newline.
    pub fn render(&self, diagnostic: &Diagnostic) -> String {
        let Position { line, column } = diagnostic.pos;
        let column = column as usize;
        let source_line = self
            .src
            .lines()
            .nth((line as usize).saturating_sub(1))
            .unwrap_or_default();

        let mut out = String::with_capacity(source_line.len() * 3 + diagnostic.message.len() + 64);
        _ = writeln!(
            out,
            "{} line {line}, column {column}, {}",
            diagnostic.severity, self.file_name
        );
        _ = writeln!(out, "{source_line}");
        _ = writeln!(out, "{:width$}^", "", width = column.saturating_sub(1));
        _ = writeln!(out, "{}/", "_".repeat(column.saturating_sub(2)));
        out.push_str(&diagnostic.message);
        out
    }
}
