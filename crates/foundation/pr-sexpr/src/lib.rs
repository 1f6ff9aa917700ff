//! Generic expression trees for schema sources
//!
//! Schema files are sequences of s-expressions. This crate turns source text
//! into a language-independent tree of atoms, quoted strings, round lists and
//! square lists; giving those trees a meaning is the statement parser's job.

pub mod error;
pub mod reader;

pub use error::SyntaxError;
pub use reader::Reader;

use pr_span::Position;
use std::fmt;

/// One node of a generic expression tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SExpr {
    /// What kind of node this is
    pub kind: SExprKind,
    /// Where the node starts in the source
    pub position: Position,
}

/// Node kinds
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SExprKind {
    /// Bare symbol or number
    Atom(String),
    /// Double-quoted string, escapes already processed
    Quoted(String),
    /// `( ... )`
    List(Vec<SExpr>),
    /// `[ ... ]`
    SquareList(Vec<SExpr>),
}

impl SExpr {
    /// Creates a node
    pub fn new(kind: SExprKind, position: Position) -> Self {
        Self { kind, position }
    }

    /// The atom text, if this node is an atom
    pub fn as_atom(&self) -> Option<&str> {
        match &self.kind {
            SExprKind::Atom(text) => Some(text),
            _ => None,
        }
    }

    /// The string contents, if this node is a quoted string
    pub fn as_quoted(&self) -> Option<&str> {
        match &self.kind {
            SExprKind::Quoted(text) => Some(text),
            _ => None,
        }
    }

    /// The children, if this node is a round list
    pub fn as_list(&self) -> Option<&[SExpr]> {
        match &self.kind {
            SExprKind::List(items) => Some(items),
            _ => None,
        }
    }

    /// The children, if this node is a square list
    pub fn as_square_list(&self) -> Option<&[SExpr]> {
        match &self.kind {
            SExprKind::SquareList(items) => Some(items),
            _ => None,
        }
    }

    /// Short description used in "expected X, found Y" messages
    pub fn describe(&self) -> &'static str {
        match self.kind {
            SExprKind::Atom(_) => "symbol",
            SExprKind::Quoted(_) => "string",
            SExprKind::List(_) => "list",
            SExprKind::SquareList(_) => "square list",
        }
    }
}

impl fmt::Display for SExpr {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn write_items(formatter: &mut fmt::Formatter<'_>, items: &[SExpr]) -> fmt::Result {
            for (index, item) in items.iter().enumerate() {
                if index > 0 {
                    write!(formatter, " ")?;
                }
                write!(formatter, "{item}")?;
            }
            Ok(())
        }

        match &self.kind {
            SExprKind::Atom(text) => write!(formatter, "{text}"),
            SExprKind::Quoted(text) => write!(formatter, "{text:?}"),
            SExprKind::List(items) => {
                write!(formatter, "(")?;
                write_items(formatter, items)?;
                write!(formatter, ")")
            }
            SExprKind::SquareList(items) => {
                write!(formatter, "[")?;
                write_items(formatter, items)?;
                write!(formatter, "]")
            }
        }
    }
}
