//! G-code program model
//!
//! A program is the ordered list of raw lines handed to the runner. Blank
//! and comment lines stay in the sequence so that progress accounting
//! matches the line numbers the operator sees in the editor.

use crate::error::{Error, Result};
use std::path::Path;

/// How a program line is treated at send time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind<'a> {
    /// Empty or whitespace only
    Blank,
    /// Starts with `;` or `(`
    Comment,
    /// Trimmed text to transmit
    Command(&'a str),
}

impl<'a> LineKind<'a> {
    /// Classify a raw program line
    pub fn classify(raw: &'a str) -> Self {
        let line = raw.trim();
        if line.is_empty() {
            LineKind::Blank
        } else if line.starts_with(';') || line.starts_with('(') {
            LineKind::Comment
        } else {
            LineKind::Command(line)
        }
    }

    /// Text to transmit, if any
    pub fn command(&self) -> Option<&'a str> {
        match self {
            LineKind::Command(line) => Some(line),
            _ => None,
        }
    }
}

/// An ordered sequence of program lines
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
    lines: Vec<String>,
}

impl Program {
    /// Build a program from editor text, keeping blank lines
    pub fn from_text(text: &str) -> Self {
        Self {
            lines: text.lines().map(str::to_string).collect(),
        }
    }

    /// Build a program from already split lines
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }

    /// Read a program file (UTF-8 text)
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            tracing::warn!("Failed to read program {}: {}", path.display(), e);
            Error::Io(e)
        })?;
        let program = Self::from_text(&content);
        tracing::info!(
            "Loaded program {} ({} lines)",
            path.display(),
            program.loaded_line_count()
        );
        Ok(program)
    }

    /// Raw lines
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Number of lines a run counts, blank lines included
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether there are no lines at all
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Whether every line is blank
    pub fn is_blank(&self) -> bool {
        self.lines.iter().all(|line| line.trim().is_empty())
    }

    /// Number of non-empty lines, as reported after loading a file
    ///
    /// Runs count every line; this count only drops blank ones.
    pub fn loaded_line_count(&self) -> usize {
        self.lines
            .iter()
            .filter(|line| !line.trim().is_empty())
            .count()
    }

    /// Number of lines that will be transmitted
    pub fn command_count(&self) -> usize {
        self.lines
            .iter()
            .filter(|line| LineKind::classify(line).command().is_some())
            .count()
    }
}

impl From<Vec<String>> for Program {
    fn from(lines: Vec<String>) -> Self {
        Self { lines }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(LineKind::classify("   "), LineKind::Blank);
        assert_eq!(LineKind::classify("; comment"), LineKind::Comment);
        assert_eq!(LineKind::classify("  (setup)"), LineKind::Comment);
        assert_eq!(LineKind::classify("  G1 X10 \r"), LineKind::Command("G1 X10"));
    }

    #[test]
    fn test_blank_lines_are_kept() {
        let program = Program::from_text("G21\n\n; home\nG28\n");
        assert_eq!(program.len(), 4);
        assert_eq!(program.loaded_line_count(), 3);
        assert_eq!(program.command_count(), 2);
    }

    #[test]
    fn test_crlf_text() {
        let program = Program::from_text("G90\r\nG1 X1\r\n");
        assert_eq!(program.len(), 2);
        assert_eq!(LineKind::classify(&program.lines()[0]), LineKind::Command("G90"));
    }

    #[test]
    fn test_is_blank() {
        assert!(Program::from_text("\n  \n").is_blank());
        assert!(Program::default().is_blank());
        assert!(!Program::from_text("\n(only a comment)\n").is_blank());
    }
}
