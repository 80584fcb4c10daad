//! Permissive JSONC parser producing a tree with source spans
//!
//! Accepts `//` and `/* */` comments, trailing commas in objects and arrays,
//! a leading byte-order mark, and empty documents. Every node remembers the
//! byte range it came from so the edit layer can rewrite values in place.

use serde_json::{Map, Number, Value};

use super::path::Segment;
use super::scanner::{Scanner, Token, TokenKind};
use crate::error::Result;

/// Nesting limit, guarding the recursive descent against hostile input
const MAX_DEPTH: usize = 256;

/// Byte range `start..end` in the source text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// A parsed value
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub span: Span,
    pub kind: NodeKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Object(Vec<Property>),
    Array(Vec<Node>),
    String(String),
    Number(Number),
    Bool(bool),
    Null,
}

/// An object member, keeping the span of its key
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub key: String,
    pub key_span: Span,
    pub value: Node,
}

impl Node {
    pub fn type_name(&self) -> &'static str {
        match self.kind {
            NodeKind::Object(_) => "object",
            NodeKind::Array(_) => "array",
            NodeKind::String(_) => "string",
            NodeKind::Number(_) => "number",
            NodeKind::Bool(_) => "boolean",
            NodeKind::Null => "null",
        }
    }

    pub fn as_object(&self) -> Option<&[Property]> {
        match &self.kind {
            NodeKind::Object(props) => Some(props),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Node]> {
        match &self.kind {
            NodeKind::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Member value by key. With duplicate keys the last one wins, as in
    /// [`Node::to_value`].
    pub fn get(&self, key: &str) -> Option<&Node> {
        self.as_object()?
            .iter()
            .rev()
            .find(|p| p.key == key)
            .map(|p| &p.value)
    }

    /// Walk `path` from this node
    pub fn find(&self, path: &[Segment]) -> Option<&Node> {
        path.iter().try_fold(self, |node, segment| match segment {
            Segment::Key(key) => node.get(key),
            Segment::Index(index) => node.as_array()?.get(*index),
        })
    }

    /// Convert to a `serde_json::Value`, dropping spans
    pub fn to_value(&self) -> Value {
        match &self.kind {
            NodeKind::Object(props) => {
                let mut map = Map::new();
                for prop in props {
                    map.insert(prop.key.clone(), prop.value.to_value());
                }
                Value::Object(map)
            }
            NodeKind::Array(items) => Value::Array(items.iter().map(Node::to_value).collect()),
            NodeKind::String(s) => Value::String(s.clone()),
            NodeKind::Number(n) => Value::Number(n.clone()),
            NodeKind::Bool(b) => Value::Bool(*b),
            NodeKind::Null => Value::Null,
        }
    }
}

/// Parse JSONC text into a tree.
///
/// Returns `Ok(None)` for a document with no value (empty, whitespace or
/// comments only).
pub fn parse_tree(text: &str) -> Result<Option<Node>> {
    let start = if text.starts_with('\u{feff}') {
        '\u{feff}'.len_utf8()
    } else {
        0
    };

    let mut parser = Parser {
        text,
        scanner: Scanner::with_offset(text, start),
        peeked: None,
    };

    let Some(token) = parser.next()? else {
        return Ok(None);
    };
    let root = parser.parse_value(token, 0)?;

    if let Some(extra) = parser.next()? {
        return Err(parser
            .scanner
            .error("unexpected content after the end of the document", extra.start));
    }

    Ok(Some(root))
}

/// Parse JSONC text straight into a `serde_json::Value` (`Null` when empty)
pub fn parse_value(text: &str) -> Result<Value> {
    Ok(parse_tree(text)?.map(|n| n.to_value()).unwrap_or(Value::Null))
}

struct Parser<'a> {
    text: &'a str,
    scanner: Scanner<'a>,
    peeked: Option<Token>,
}

impl Parser<'_> {
    fn next(&mut self) -> Result<Option<Token>> {
        match self.peeked.take() {
            Some(token) => Ok(Some(token)),
            None => self.scanner.next_significant(),
        }
    }

    fn peek(&mut self) -> Result<Option<Token>> {
        if self.peeked.is_none() {
            self.peeked = self.scanner.next_significant()?;
        }
        Ok(self.peeked)
    }

    fn expect_next(&mut self, what: &str) -> Result<Token> {
        match self.next()? {
            Some(token) => Ok(token),
            None => Err(self
                .scanner
                .error(format!("unexpected end of input, expected {}", what), self.text.len())),
        }
    }

    fn parse_value(&mut self, token: Token, depth: usize) -> Result<Node> {
        if depth > MAX_DEPTH {
            return Err(self.scanner.error("document nested too deeply", token.start));
        }

        let kind = match token.kind {
            TokenKind::OpenBrace => return self.parse_object(token, depth),
            TokenKind::OpenBracket => return self.parse_array(token, depth),
            TokenKind::String => NodeKind::String(self.string_value(token)?),
            TokenKind::Number => {
                let raw = token.text(self.text);
                let number = serde_json::from_str::<Number>(raw).map_err(|_| {
                    self.scanner
                        .error(format!("invalid number '{}'", raw), token.start)
                })?;
                NodeKind::Number(number)
            }
            TokenKind::True => NodeKind::Bool(true),
            TokenKind::False => NodeKind::Bool(false),
            TokenKind::Null => NodeKind::Null,
            other => {
                return Err(self.scanner.error(
                    format!("expected a value, found {}", describe(other)),
                    token.start,
                ))
            }
        };

        Ok(Node {
            span: Span::new(token.start, token.end),
            kind,
        })
    }

    fn parse_object(&mut self, open: Token, depth: usize) -> Result<Node> {
        let mut props = Vec::new();

        loop {
            let token = self.expect_next("a property name or '}'")?;
            match token.kind {
                TokenKind::CloseBrace => {
                    return Ok(Node {
                        span: Span::new(open.start, token.end),
                        kind: NodeKind::Object(props),
                    })
                }
                TokenKind::String => {
                    let key = self.string_value(token)?;
                    let colon = self.expect_next("':'")?;
                    if colon.kind != TokenKind::Colon {
                        return Err(self.scanner.error(
                            format!("expected ':' after property name, found {}", describe(colon.kind)),
                            colon.start,
                        ));
                    }
                    let value_token = self.expect_next("a value")?;
                    let value = self.parse_value(value_token, depth + 1)?;
                    props.push(Property {
                        key,
                        key_span: Span::new(token.start, token.end),
                        value,
                    });

                    let separator = self.peek()?;
                    match separator.map(|t| t.kind) {
                        Some(TokenKind::Comma) => {
                            self.next()?;
                        }
                        Some(TokenKind::CloseBrace) => {}
                        Some(other) => {
                            let at = separator.map(|t| t.start).unwrap_or(self.text.len());
                            return Err(self.scanner.error(
                                format!("expected ',' or '}}', found {}", describe(other)),
                                at,
                            ));
                        }
                        None => {
                            return Err(self
                                .scanner
                                .error("unexpected end of input, expected '}'", self.text.len()))
                        }
                    }
                }
                other => {
                    return Err(self.scanner.error(
                        format!("expected a property name, found {}", describe(other)),
                        token.start,
                    ))
                }
            }
        }
    }

    fn parse_array(&mut self, open: Token, depth: usize) -> Result<Node> {
        let mut items = Vec::new();

        loop {
            let token = self.expect_next("a value or ']'")?;
            if token.kind == TokenKind::CloseBracket {
                return Ok(Node {
                    span: Span::new(open.start, token.end),
                    kind: NodeKind::Array(items),
                });
            }

            items.push(self.parse_value(token, depth + 1)?);

            let separator = self.peek()?;
            match separator.map(|t| t.kind) {
                Some(TokenKind::Comma) => {
                    self.next()?;
                }
                Some(TokenKind::CloseBracket) => {}
                Some(other) => {
                    let at = separator.map(|t| t.start).unwrap_or(self.text.len());
                    return Err(self.scanner.error(
                        format!("expected ',' or ']', found {}", describe(other)),
                        at,
                    ));
                }
                None => {
                    return Err(self
                        .scanner
                        .error("unexpected end of input, expected ']'", self.text.len()))
                }
            }
        }
    }

    fn string_value(&self, token: Token) -> Result<String> {
        serde_json::from_str::<String>(token.text(self.text))
            .map_err(|e| self.scanner.error(format!("invalid string: {}", e), token.start))
    }
}

fn describe(kind: TokenKind) -> &'static str {
    match kind {
        TokenKind::OpenBrace => "'{'",
        TokenKind::CloseBrace => "'}'",
        TokenKind::OpenBracket => "'['",
        TokenKind::CloseBracket => "']'",
        TokenKind::Colon => "':'",
        TokenKind::Comma => "','",
        TokenKind::String => "a string",
        TokenKind::Number => "a number",
        TokenKind::True | TokenKind::False => "a boolean",
        TokenKind::Null => "null",
        TokenKind::LineComment | TokenKind::BlockComment => "a comment",
        TokenKind::Whitespace => "whitespace",
    }
}
