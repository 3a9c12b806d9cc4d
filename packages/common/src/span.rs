use serde::{Deserialize, Serialize};
use std::fmt;

/// Byte range into a source text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Zero-width span at an offset
    pub fn at(offset: usize) -> Self {
        Self {
            start: offset,
            end: offset,
        }
    }

    /// Smallest span covering both
    pub fn to(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn range(&self) -> std::ops::Range<usize> {
        self.start..self.end
    }
}

impl From<std::ops::Range<usize>> for Span {
    fn from(range: std::ops::Range<usize>) -> Self {
        Span::new(range.start, range.end)
    }
}

/// 1-based line/column position, columns counted in characters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourcePos {
    pub line: usize,
    pub column: usize,
}

impl SourcePos {
    /// Resolve a byte offset. Offsets past the end clamp to the end of the text.
    pub fn from_offset(source: &str, offset: usize) -> Self {
        let mut offset = offset.min(source.len());
        while !source.is_char_boundary(offset) {
            offset -= 1;
        }

        let before = &source[..offset];
        let line = before.matches('\n').count() + 1;
        let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
        let column = before[line_start..].chars().count() + 1;

        Self { line, column }
    }
}

impl fmt::Display for SourcePos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_first_line() {
        let pos = SourcePos::from_offset("const a = 1;", 6);
        assert_eq!(pos, SourcePos { line: 1, column: 7 });
    }

    #[test]
    fn test_position_after_newlines() {
        let source = "a\nbc\ndef";
        assert_eq!(SourcePos::from_offset(source, 5), SourcePos { line: 3, column: 1 });
        assert_eq!(SourcePos::from_offset(source, 3), SourcePos { line: 2, column: 2 });
    }

    #[test]
    fn test_position_clamps_and_respects_char_boundaries() {
        let source = "é\nx";
        assert_eq!(SourcePos::from_offset(source, 1), SourcePos { line: 1, column: 1 });
        assert_eq!(SourcePos::from_offset(source, 100), SourcePos { line: 2, column: 2 });
    }

    #[test]
    fn test_span_union() {
        let span = Span::new(4, 6).to(Span::new(1, 3));
        assert_eq!(span, Span::new(1, 6));
        assert_eq!(span.len(), 5);
    }
}
