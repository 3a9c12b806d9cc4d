//! Character cursor shared by the text passes.
//!
//! The declaration rewriter and the markup compiler both walk raw source text
//! rather than tokens. `Cursor` gives them one definition of what counts as
//! trivia (whitespace and comments) and how string and template literals are
//! skipped, so that neither pass mistakes text inside a literal or a comment
//! for code.

use crate::span::Span;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScanError {
    #[error("Unterminated string literal")]
    UnterminatedString { span: Span },

    #[error("Unterminated template literal")]
    UnterminatedTemplate { span: Span },

    #[error("Unterminated comment")]
    UnterminatedComment { span: Span },
}

impl ScanError {
    pub fn span(&self) -> Span {
        match self {
            ScanError::UnterminatedString { span }
            | ScanError::UnterminatedTemplate { span }
            | ScanError::UnterminatedComment { span } => *span,
        }
    }
}

pub fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

pub fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

#[derive(Debug, Clone)]
pub struct Cursor<'src> {
    source: &'src str,
    pos: usize,
}

impl<'src> Cursor<'src> {
    pub fn new(source: &'src str) -> Self {
        Self { source, pos: 0 }
    }

    pub fn source(&self) -> &'src str {
        self.source
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn set_pos(&mut self, pos: usize) {
        self.pos = pos.min(self.source.len());
    }

    pub fn is_eof(&self) -> bool {
        self.pos >= self.source.len()
    }

    pub fn rest(&self) -> &'src str {
        &self.source[self.pos..]
    }

    pub fn slice(&self, start: usize, end: usize) -> &'src str {
        &self.source[start..end]
    }

    pub fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    pub fn peek_nth(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    pub fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    pub fn starts_with(&self, text: &str) -> bool {
        self.rest().starts_with(text)
    }

    pub fn eat(&mut self, text: &str) -> bool {
        if self.starts_with(text) {
            self.pos += text.len();
            true
        } else {
            false
        }
    }

    pub fn eat_while(&mut self, mut pred: impl FnMut(char) -> bool) -> &'src str {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            self.pos += c.len_utf8();
        }
        &self.source[start..self.pos]
    }

    /// Consume an identifier if one starts here
    pub fn ident(&mut self) -> Option<&'src str> {
        match self.peek() {
            Some(c) if is_ident_start(c) => Some(self.eat_while(is_ident_continue)),
            _ => None,
        }
    }

    /// Consume `word` only if it is a whole identifier
    pub fn eat_keyword(&mut self, word: &str) -> bool {
        if !self.starts_with(word) {
            return false;
        }
        let after = self.source[self.pos + word.len()..].chars().next();
        if after.map(is_ident_continue).unwrap_or(false) {
            return false;
        }
        self.pos += word.len();
        true
    }

    /// Is the character before the cursor part of an identifier or a `.`?
    pub fn follows_word_or_dot(&self) -> bool {
        self.source[..self.pos]
            .chars()
            .next_back()
            .map(|c| is_ident_continue(c) || c == '.')
            .unwrap_or(false)
    }

    /// Only whitespace between the start of the current line and the cursor
    pub fn at_line_start(&self) -> bool {
        self.source[..self.pos]
            .chars()
            .rev()
            .take_while(|c| *c != '\n')
            .all(|c| c == ' ' || c == '\t' || c == '\r')
    }

    pub fn skip_whitespace(&mut self) {
        self.eat_while(char::is_whitespace);
    }

    /// Skip whitespace and comments
    pub fn skip_trivia(&mut self) -> Result<(), ScanError> {
        loop {
            self.skip_whitespace();
            if self.starts_with("//") {
                self.eat_while(|c| c != '\n');
            } else if self.starts_with("/*") {
                self.skip_block_comment()?;
            } else {
                return Ok(());
            }
        }
    }

    pub fn skip_block_comment(&mut self) -> Result<(), ScanError> {
        let start = self.pos;
        self.pos += 2;
        match self.rest().find("*/") {
            Some(end) => {
                self.pos += end + 2;
                Ok(())
            }
            None => {
                self.pos = self.source.len();
                Err(ScanError::UnterminatedComment {
                    span: Span::new(start, self.pos),
                })
            }
        }
    }

    /// Skip a `'` or `"` string literal. The cursor must be on the quote.
    /// A raw newline terminates the literal with an error, leaving the cursor on it.
    pub fn skip_string(&mut self) -> Result<(), ScanError> {
        let start = self.pos;
        let quote = match self.bump() {
            Some(q) => q,
            None => return Ok(()),
        };
        while let Some(c) = self.peek() {
            match c {
                '\\' => {
                    self.bump();
                    self.bump();
                }
                '\n' => break,
                c if c == quote => {
                    self.bump();
                    return Ok(());
                }
                _ => {
                    self.bump();
                }
            }
        }
        Err(ScanError::UnterminatedString {
            span: Span::new(start, self.pos),
        })
    }

    /// Skip a template literal including nested `${ ... }` substitutions.
    pub fn skip_template(&mut self) -> Result<(), ScanError> {
        let start = self.pos;
        self.bump();
        while let Some(c) = self.peek() {
            match c {
                '\\' => {
                    self.bump();
                    self.bump();
                }
                '`' => {
                    self.bump();
                    return Ok(());
                }
                '$' if self.peek_nth(1) == Some('{') => {
                    self.pos += 2;
                    self.skip_balanced('}')?;
                }
                _ => {
                    self.bump();
                }
            }
        }
        Err(ScanError::UnterminatedTemplate {
            span: Span::new(start, self.pos),
        })
    }

    /// Skip code up to and including the `close` that balances an already
    /// consumed opener.
    pub fn skip_balanced(&mut self, close: char) -> Result<(), ScanError> {
        let mut depth = 0usize;
        loop {
            self.skip_trivia()?;
            match self.peek() {
                None => return Ok(()),
                Some('"') | Some('\'') => self.skip_string()?,
                Some('`') => self.skip_template()?,
                Some('{') | Some('(') | Some('[') => {
                    depth += 1;
                    self.bump();
                }
                Some(c) if c == close && depth == 0 => {
                    self.bump();
                    return Ok(());
                }
                Some('}') | Some(')') | Some(']') => {
                    depth = depth.saturating_sub(1);
                    self.bump();
                }
                Some(_) => {
                    self.bump();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skip_trivia() {
        let mut cursor = Cursor::new("  // line\n /* block */ x");
        cursor.skip_trivia().unwrap();
        assert_eq!(cursor.peek(), Some('x'));
    }

    #[test]
    fn test_unterminated_comment() {
        let mut cursor = Cursor::new("/* never closed");
        assert!(matches!(
            cursor.skip_trivia(),
            Err(ScanError::UnterminatedComment { .. })
        ));
    }

    #[test]
    fn test_skip_string_with_escapes() {
        let mut cursor = Cursor::new(r#""a \"quoted\" word" rest"#);
        cursor.skip_string().unwrap();
        assert_eq!(cursor.rest(), " rest");
    }

    #[test]
    fn test_string_stops_at_newline() {
        let mut cursor = Cursor::new("'don\nnext");
        assert!(cursor.skip_string().is_err());
        assert_eq!(cursor.rest(), "\nnext");
    }

    #[test]
    fn test_skip_template_with_nested_substitutions() {
        let mut cursor = Cursor::new("`a ${ {b: `c${d}`}.b } e` tail");
        cursor.skip_template().unwrap();
        assert_eq!(cursor.rest(), " tail");
    }

    #[test]
    fn test_eat_keyword_requires_word_boundary() {
        let mut cursor = Cursor::new("imports");
        assert!(!cursor.eat_keyword("import"));
        let mut cursor = Cursor::new("import x");
        assert!(cursor.eat_keyword("import"));
        assert_eq!(cursor.rest(), " x");
    }

    #[test]
    fn test_line_start_detection() {
        let mut cursor = Cursor::new("a;\n   export");
        cursor.set_pos(6);
        assert!(cursor.at_line_start());
        cursor.set_pos(1);
        assert!(!cursor.at_line_start());
    }
}
