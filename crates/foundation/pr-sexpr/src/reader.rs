//! Streaming s-expression reader
//!
//! [`Reader`] yields one top-level expression at a time so the caller can
//! process a file statement by statement and stop at the first error.

use crate::error::SyntaxError;
use crate::{SExpr, SExprKind};
use pr_span::{FileId, Position, Span};
use std::iter::Peekable;
use std::str::CharIndices;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Open(char),
    Close(char),
    Atom(String),
    Quoted(String),
}

struct Lexer<'src> {
    file: FileId,
    text: &'src str,
    chars: Peekable<CharIndices<'src>>,
    line: u32,
    column: u32,
}

impl<'src> Lexer<'src> {
    fn new(file: FileId, text: &'src str) -> Self {
        Self {
            file,
            text,
            chars: text.char_indices().peekable(),
            line: 1,
            column: 1,
        }
    }

    fn offset(&mut self) -> u32 {
        self.chars
            .peek()
            .map_or(self.text.len(), |&(offset, _)| offset) as u32
    }

    fn here(&mut self) -> Position {
        let offset = self.offset();
        Position::new(self.file, self.line, self.column).with_span(Span::new(offset, offset))
    }

    fn bump(&mut self) -> Option<char> {
        let (_, character) = self.chars.next()?;
        if character == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(character)
    }

    fn skip_trivia(&mut self) {
        while let Some(&(_, character)) = self.chars.peek() {
            if character.is_whitespace() {
                self.bump();
            } else if character == ';' {
                while let Some(&(_, next)) = self.chars.peek() {
                    if next == '\n' {
                        break;
                    }
                    self.bump();
                }
            } else {
                break;
            }
        }
    }

    /// Position of the end of input, after trailing whitespace and comments
    fn end_position(&mut self) -> Position {
        self.skip_trivia();
        self.here()
    }

    fn next_token(&mut self) -> Option<Result<(Token, Position), SyntaxError>> {
        self.skip_trivia();
        let start = self.here();
        let character = self.bump()?;

        let token = match character {
            '(' | '[' => Ok(Token::Open(character)),
            ')' | ']' => Ok(Token::Close(character)),
            '"' => self.quoted(start).map(Token::Quoted),
            _ => {
                let mut text = String::from(character);
                while let Some(&(_, next)) = self.chars.peek() {
                    if next.is_whitespace() || matches!(next, '(' | ')' | '[' | ']' | '"' | ';') {
                        break;
                    }
                    text.push(next);
                    self.bump();
                }
                Ok(Token::Atom(text))
            }
        };

        let end = self.offset();
        Some(token.map(|token| (token, start.with_span(Span::new(start.span.start, end)))))
    }

    fn quoted(&mut self, start: Position) -> Result<String, SyntaxError> {
        let mut text = String::new();
        loop {
            let escape_position = self.here();
            match self.bump() {
                None => return Err(SyntaxError::UnterminatedString { position: start }),
                Some('"') => return Ok(text),
                Some('\\') => match self.bump() {
                    Some(escaped @ ('"' | '\\')) => text.push(escaped),
                    Some(found) => {
                        return Err(SyntaxError::InvalidEscape {
                            found,
                            position: escape_position,
                        });
                    }
                    None => return Err(SyntaxError::UnterminatedString { position: start }),
                },
                Some(character) => text.push(character),
            }
        }
    }
}

/// Reads top-level expressions from one source file
pub struct Reader<'src> {
    lexer: Lexer<'src>,
    failed: bool,
}

impl<'src> Reader<'src> {
    /// Creates a reader over `text`, attributing positions to `file`
    pub fn new(file: FileId, text: &'src str) -> Self {
        Self {
            lexer: Lexer::new(file, text),
            failed: false,
        }
    }

    /// Position just past the last expression, used to report end-of-file errors
    pub fn eof_position(&mut self) -> Position {
        self.lexer.end_position()
    }

    fn read_expr(&mut self, token: Token, position: Position) -> Result<SExpr, SyntaxError> {
        match token {
            Token::Atom(text) => Ok(SExpr::new(SExprKind::Atom(text), position)),
            Token::Quoted(text) => Ok(SExpr::new(SExprKind::Quoted(text), position)),
            Token::Close(found) => Err(SyntaxError::UnexpectedClose { found, position }),
            Token::Open(opening) => {
                let closing = if opening == '(' { ')' } else { ']' };
                let mut items = Vec::new();
                loop {
                    let Some(next) = self.lexer.next_token() else {
                        return Err(SyntaxError::UnexpectedEof { opening, position });
                    };
                    let (token, item_position) = next?;
                    match token {
                        Token::Close(found) if found == closing => {
                            let span = position.span.to(item_position.span);
                            let kind = if opening == '(' {
                                SExprKind::List(items)
                            } else {
                                SExprKind::SquareList(items)
                            };
                            return Ok(SExpr::new(kind, position.with_span(span)));
                        }
                        Token::Close(found) => {
                            return Err(SyntaxError::MismatchedClose {
                                expected: closing,
                                found,
                                position: item_position,
                            });
                        }
                        token => items.push(self.read_expr(token, item_position)?),
                    }
                }
            }
        }
    }
}

impl Iterator for Reader<'_> {
    type Item = Result<SExpr, SyntaxError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let result = match self.lexer.next_token()? {
            Ok((token, position)) => self.read_expr(token, position),
            Err(error) => Err(error),
        };
        self.failed = result.is_err();
        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_all(text: &str) -> Vec<Result<SExpr, SyntaxError>> {
        Reader::new(FileId::new(0), text).collect()
    }

    #[test]
    fn test_reads_nested_lists() {
        let exprs = read_all("(record T [(field x (float 32))])");
        assert_eq!(exprs.len(), 1);
        let expr = exprs[0].as_ref().unwrap();
        let items = expr.as_list().unwrap();
        assert_eq!(items[0].as_atom(), Some("record"));
        assert_eq!(items[2].as_square_list().unwrap().len(), 1);
        assert_eq!(expr.to_string(), "(record T [(field x (float 32))])");
    }

    #[test]
    fn test_positions_are_one_based() {
        let exprs = read_all("; header\n  (package-end)\n(x)");
        let first = exprs[0].as_ref().unwrap();
        assert_eq!((first.position.line, first.position.column), (2, 3));
        let second = exprs[1].as_ref().unwrap();
        assert_eq!((second.position.line, second.position.column), (3, 1));
    }

    #[test]
    fn test_quoted_strings() {
        let exprs = read_all(r#"(string 8 "UTF-8") "a\"b""#);
        let items = exprs[0].as_ref().unwrap().as_list().unwrap().to_vec();
        assert_eq!(items[2].as_quoted(), Some("UTF-8"));
        assert_eq!(exprs[1].as_ref().unwrap().as_quoted(), Some("a\"b"));
    }

    #[test]
    fn test_empty_input_yields_nothing() {
        assert!(read_all("").is_empty());
        assert!(read_all("  ; only a comment\n").is_empty());
    }

    #[test]
    fn test_unclosed_list() {
        let exprs = read_all("(package-begin x");
        assert!(matches!(
            exprs.as_slice(),
            [Err(SyntaxError::UnexpectedEof { opening: '(', .. })]
        ));
    }

    #[test]
    fn test_mismatched_close_stops_stream() {
        let exprs = read_all("(a] (b)");
        assert_eq!(exprs.len(), 1);
        assert!(matches!(
            exprs[0],
            Err(SyntaxError::MismatchedClose {
                expected: ')',
                found: ']',
                ..
            })
        ));
    }

    #[test]
    fn test_stray_close() {
        let exprs = read_all(")");
        assert!(matches!(
            exprs.as_slice(),
            [Err(SyntaxError::UnexpectedClose { found: ')', .. })]
        ));
    }

    #[test]
    fn test_unterminated_string() {
        let exprs = read_all("(string 4 \"UTF");
        assert!(matches!(
            exprs.as_slice(),
            [Err(SyntaxError::UnterminatedString { .. })]
        ));
    }
}
