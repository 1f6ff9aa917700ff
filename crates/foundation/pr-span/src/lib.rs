//! Source file spans and lexical positions

use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// A unique identifier for a source file
#[derive(Copy, Clone, Debug, Display, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[display("file#{_0}")]
pub struct FileId(pub u32);

impl FileId {
    /// Creates a file ID from its raw index
    pub fn new(id: u32) -> Self {
        Self(id)
    }
}

/// A byte offset span in a source file
#[derive(Copy, Clone, Debug, Default, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct Span {
    /// Offset of the first byte
    pub start: u32,
    /// Offset one past the last byte
    pub end: u32,
}

impl Span {
    /// Creates a span covering `start..end`
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// The span as a `usize` range, for slicing source text
    pub fn range(&self) -> Range<usize> {
        self.start as usize..self.end as usize
    }

    /// Length of the span in bytes
    pub fn len(&self) -> u32 {
        self.end - self.start
    }

    /// Whether the span covers no bytes
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Smallest span covering both `self` and `other`
    #[must_use]
    pub fn to(self, other: Self) -> Self {
        Self {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

/// Human-facing location of a syntax element: file, 1-based line and column
///
/// Every node of every tree in the compiler carries one of these so that
/// diagnostics can point back at the source.
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// File the element came from
    pub file: FileId,
    /// Line number, starting at 1
    pub line: u32,
    /// Column number, starting at 1
    pub column: u32,
    /// Byte span of the element
    pub span: Span,
}

impl Position {
    /// Creates a position without span information
    pub fn new(file: FileId, line: u32, column: u32) -> Self {
        Self {
            file,
            line,
            column,
            span: Span::default(),
        }
    }

    /// Attaches a byte span to this position
    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}:{}:{}", self.file, self.line, self.column)
    }
}
