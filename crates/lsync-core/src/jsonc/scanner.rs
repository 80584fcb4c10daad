//! JSONC tokenizer
//!
//! Splits text into tokens with byte offsets. Comments and whitespace are
//! kept as tokens so callers that edit text can see exactly where they are.

use crate::error::{Error, Result};

/// Token categories produced by [`Scanner`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    OpenBrace,
    CloseBrace,
    OpenBracket,
    CloseBracket,
    Colon,
    Comma,
    String,
    Number,
    True,
    False,
    Null,
    LineComment,
    BlockComment,
    Whitespace,
}

impl TokenKind {
    /// Comments and whitespace
    pub fn is_trivia(&self) -> bool {
        matches!(
            self,
            TokenKind::LineComment | TokenKind::BlockComment | TokenKind::Whitespace
        )
    }
}

/// A token and its byte range in the source text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub start: usize,
    pub end: usize,
}

impl Token {
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.start..self.end]
    }
}

/// Incremental JSONC tokenizer
pub struct Scanner<'a> {
    text: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(text: &'a str) -> Self {
        Self::with_offset(text, 0)
    }

    /// Start scanning at `offset`, which must be a token boundary
    pub fn with_offset(text: &'a str, offset: usize) -> Self {
        Self {
            text,
            bytes: text.as_bytes(),
            pos: offset.min(text.len()),
        }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    /// Next token including trivia, or `None` at end of input
    pub fn next_token(&mut self) -> Result<Option<Token>> {
        let start = self.pos;
        let Some(&byte) = self.bytes.get(start) else {
            return Ok(None);
        };

        let kind = match byte {
            b'{' => self.single(TokenKind::OpenBrace),
            b'}' => self.single(TokenKind::CloseBrace),
            b'[' => self.single(TokenKind::OpenBracket),
            b']' => self.single(TokenKind::CloseBracket),
            b':' => self.single(TokenKind::Colon),
            b',' => self.single(TokenKind::Comma),
            b' ' | b'\t' | b'\r' | b'\n' => {
                while matches!(self.bytes.get(self.pos), Some(b' ' | b'\t' | b'\r' | b'\n')) {
                    self.pos += 1;
                }
                TokenKind::Whitespace
            }
            b'"' => self.scan_string(start)?,
            b'/' => self.scan_comment(start)?,
            b'-' | b'0'..=b'9' => {
                while matches!(
                    self.bytes.get(self.pos),
                    Some(b'0'..=b'9' | b'-' | b'+' | b'.' | b'e' | b'E')
                ) {
                    self.pos += 1;
                }
                TokenKind::Number
            }
            b'a'..=b'z' | b'A'..=b'Z' => {
                while matches!(self.bytes.get(self.pos), Some(b'a'..=b'z' | b'A'..=b'Z')) {
                    self.pos += 1;
                }
                match &self.text[start..self.pos] {
                    "true" => TokenKind::True,
                    "false" => TokenKind::False,
                    "null" => TokenKind::Null,
                    word => {
                        return Err(self.error(format!("unexpected identifier '{}'", word), start))
                    }
                }
            }
            _ => {
                let ch = self.text[start..].chars().next().unwrap_or('?');
                return Err(self.error(format!("unexpected character '{}'", ch), start));
            }
        };

        Ok(Some(Token {
            kind,
            start,
            end: self.pos,
        }))
    }

    /// Next token that is not a comment or whitespace
    pub fn next_significant(&mut self) -> Result<Option<Token>> {
        while let Some(token) = self.next_token()? {
            if !token.kind.is_trivia() {
                return Ok(Some(token));
            }
        }
        Ok(None)
    }

    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.pos += 1;
        kind
    }

    fn scan_string(&mut self, start: usize) -> Result<TokenKind> {
        self.pos += 1;
        loop {
            match self.bytes.get(self.pos) {
                None | Some(b'\n') => {
                    return Err(self.error("unterminated string", start));
                }
                Some(b'\\') => self.pos += 2,
                Some(b'"') => {
                    self.pos += 1;
                    return Ok(TokenKind::String);
                }
                Some(_) => self.pos += 1,
            }
        }
    }

    fn scan_comment(&mut self, start: usize) -> Result<TokenKind> {
        match self.bytes.get(start + 1) {
            Some(b'/') => {
                self.pos = self.text[start..]
                    .find(&['\n', '\r'][..])
                    .map(|i| start + i)
                    .unwrap_or(self.text.len());
                Ok(TokenKind::LineComment)
            }
            Some(b'*') => match self.text[start + 2..].find("*/") {
                Some(i) => {
                    self.pos = start + 2 + i + 2;
                    Ok(TokenKind::BlockComment)
                }
                None => Err(self.error("unterminated block comment", start)),
            },
            _ => Err(self.error("unexpected character '/'", start)),
        }
    }

    pub(crate) fn error(&self, message: impl Into<String>, offset: usize) -> Error {
        let (line, column) = line_column(self.text, offset);
        Error::parse(message, offset, line, column)
    }
}

/// 1-based line and column (in characters) of a byte offset
pub fn line_column(text: &str, offset: usize) -> (usize, usize) {
    let offset = offset.min(text.len());
    let before = &text[..offset];
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
    let column = before[line_start..].chars().count() + 1;
    (line, column)
}
