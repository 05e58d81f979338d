//! Source positions for error reporting
// Constructor helpers are clear at call sites without #[must_use].
#![allow(clippy::must_use_candidate)]

use serde::{Deserialize, Serialize};
use std::fmt;

/// Position inside a source document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    /// Line number (1-indexed)
    pub line: usize,

    /// Column number (1-indexed)
    pub column: usize,

    /// Byte offset from start of input
    pub offset: usize,
}

impl Position {
    /// Create a new position
    pub fn new(line: usize, column: usize, offset: usize) -> Self {
        Self {
            line,
            column,
            offset,
        }
    }

    /// Compute line and column for a byte offset into `input`.
    /// Offsets past the end are clamped to the input length.
    pub fn locate(input: &[u8], offset: usize) -> Self {
        let offset = offset.min(input.len());
        let consumed = &input[..offset];
        let line = consumed.iter().filter(|&&b| b == b'\n').count() + 1;
        let column = match consumed.iter().rposition(|&b| b == b'\n') {
            Some(newline) => offset - newline,
            None => offset + 1,
        };
        Self::new(line, column, offset)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_default() {
        let pos = Position::default();
        assert_eq!(pos.line, 0);
        assert_eq!(pos.column, 0);
        assert_eq!(pos.offset, 0);
    }

    #[test]
    fn test_locate_first_line() {
        let pos = Position::locate(b"<a><b/></a>", 3);
        assert_eq!(pos, Position::new(1, 4, 3));
    }

    #[test]
    fn test_locate_after_newlines() {
        let input = b"<a>\n  <b>\n</a>";
        // offset of '<' in "</a>"
        let pos = Position::locate(input, 10);
        assert_eq!(pos.line, 3);
        assert_eq!(pos.column, 1);
    }

    #[test]
    fn test_locate_clamps_offset() {
        let pos = Position::locate(b"abc", 99);
        assert_eq!(pos.offset, 3);
        assert_eq!(pos.line, 1);
        assert_eq!(pos.column, 4);
    }

    #[test]
    fn test_display() {
        assert_eq!(Position::new(7, 12, 80).to_string(), "line 7, column 12");
    }
}
