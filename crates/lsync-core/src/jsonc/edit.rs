//! Minimal text edits against JSONC documents
//!
//! [`set_value`] computes the smallest edit that makes a path hold a new
//! value: an existing value is replaced in place, a missing property is
//! inserted after the last member of its object. Everything outside the
//! edited range, comments included, stays byte-for-byte identical.

use serde_json::Value;

use super::parser::{parse_tree, Node, NodeKind, Property};
use super::path::{format_segments, JsonPath, Segment};
use super::scanner::{Scanner, TokenKind};
use crate::error::{Error, Result};

/// Replace `length` bytes at `offset` with `content`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub offset: usize,
    pub length: usize,
    pub content: String,
}

impl Edit {
    pub fn insert(offset: usize, content: impl Into<String>) -> Self {
        Self {
            offset,
            length: 0,
            content: content.into(),
        }
    }

    pub fn replace(offset: usize, length: usize, content: impl Into<String>) -> Self {
        Self {
            offset,
            length,
            content: content.into(),
        }
    }
}

/// Apply non-overlapping edits computed against `text`.
///
/// Edits are applied from the highest offset down so earlier offsets stay
/// valid.
pub fn apply_edits(text: &str, edits: &[Edit]) -> String {
    let mut ordered: Vec<&Edit> = edits.iter().collect();
    ordered.sort_by(|a, b| b.offset.cmp(&a.offset));

    let mut result = text.to_string();
    for edit in ordered {
        result.replace_range(edit.offset..edit.offset + edit.length, &edit.content);
    }
    result
}

/// Whitespace conventions used for newly written text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattingOptions {
    /// One level of indentation, e.g. four spaces or a tab
    pub indent_unit: String,
    /// Line terminator
    pub eol: String,
}

impl Default for FormattingOptions {
    fn default() -> Self {
        Self::spaces(4)
    }
}

impl FormattingOptions {
    pub fn spaces(width: usize) -> Self {
        Self {
            indent_unit: " ".repeat(width),
            eol: "\n".to_string(),
        }
    }

    pub fn tabs() -> Self {
        Self {
            indent_unit: "\t".to_string(),
            eol: "\n".to_string(),
        }
    }

    pub fn with_eol(mut self, eol: impl Into<String>) -> Self {
        self.eol = eol.into();
        self
    }

    /// Infer indentation and line endings from `text`.
    ///
    /// Only lines that start with JSON structure (not comment continuation
    /// lines) vote on the indent; anything the text does not reveal comes
    /// from `fallback`.
    pub fn detect(text: &str, fallback: &FormattingOptions) -> Self {
        let eol = if text.contains("\r\n") {
            "\r\n".to_string()
        } else if text.contains('\n') {
            "\n".to_string()
        } else {
            fallback.eol.clone()
        };

        let mut smallest_spaces: Option<usize> = None;
        let mut indent_unit = None;
        for line in text.lines().skip(1) {
            let content = line.trim_start_matches([' ', '\t']);
            let indent = &line[..line.len() - content.len()];
            if indent.is_empty() || !content.starts_with(['"', '{', '}', '[', ']']) {
                continue;
            }
            if indent.starts_with('\t') {
                indent_unit = Some("\t".to_string());
                break;
            }
            if indent.bytes().all(|b| b == b' ') {
                smallest_spaces = Some(smallest_spaces.map_or(indent.len(), |s| s.min(indent.len())));
            }
        }

        let indent_unit = indent_unit
            .or_else(|| smallest_spaces.map(|n| " ".repeat(n)))
            .unwrap_or_else(|| fallback.indent_unit.clone());

        Self { indent_unit, eol }
    }
}

/// Compute the edits that make `path` hold `value` in `text`.
///
/// Supported changes: replacing an existing value (any path), and adding a
/// missing key to an existing object. Missing intermediate containers,
/// type mismatches and out-of-range indices are errors.
pub fn set_value(
    text: &str,
    path: &JsonPath,
    value: &Value,
    formatting: &FormattingOptions,
) -> Result<Vec<Edit>> {
    let root = parse_tree(text)?.ok_or_else(|| Error::patch("document is empty"))?;
    let Some((last, parent_path)) = path.split_last() else {
        return Err(Error::patch("cannot replace the document root"));
    };

    let rendered = serde_json::to_string(value)?;

    if let Some(node) = root.find(path.segments()) {
        return Ok(vec![Edit::replace(
            node.span.start,
            node.span.len(),
            rendered,
        )]);
    }

    let parent = root.find(parent_path).ok_or_else(|| {
        Error::patch(format!("'{}' does not exist", format_segments(parent_path)))
    })?;

    match (last, &parent.kind) {
        (Segment::Key(key), NodeKind::Object(props)) => {
            let member = format!("{}: {}", serde_json::to_string(key)?, rendered);
            insert_member(text, parent, props, &member, formatting)
        }
        (Segment::Index(index), NodeKind::Array(items)) => Err(Error::patch(format!(
            "index {} is out of range for '{}' ({} items)",
            index,
            format_segments(parent_path),
            items.len()
        ))),
        (_, _) => Err(Error::patch(format!(
            "'{}' is {}, cannot address '{}' in it",
            format_segments(parent_path),
            parent.type_name(),
            path
        ))),
    }
}

/// Add `member` (already rendered as `"key": value`) to an object node
fn insert_member(
    text: &str,
    object: &Node,
    props: &[Property],
    member: &str,
    formatting: &FormattingOptions,
) -> Result<Vec<Edit>> {
    let open = object.span.start;
    let close = object.span.end - 1;
    let object_indent = line_indent(text, open);

    let Some(last) = props.last() else {
        let inner = &text[open + 1..close];
        let child = format!(
            "{}{}{}",
            formatting.eol, object_indent, formatting.indent_unit
        );
        return Ok(if inner.trim().is_empty() {
            vec![Edit::replace(
                open + 1,
                inner.len(),
                format!("{}{}{}{}", child, member, formatting.eol, object_indent),
            )]
        } else {
            vec![Edit::insert(open + 1, format!("{}{}", child, member))]
        });
    };

    let value_end = last.value.span.end;
    let trailing = scan_trailing(text, value_end, close)?;
    let multiline = text[open..props[0].key_span.start].contains('\n');

    if !multiline {
        return Ok(match trailing.comma_end {
            Some(comma_end) => vec![Edit::insert(comma_end, format!(" {}", member))],
            None => vec![Edit::insert(value_end, format!(", {}", member))],
        });
    }

    let indent = if is_first_on_line(text, last.key_span.start) {
        line_indent(text, last.key_span.start).to_string()
    } else {
        format!("{}{}", object_indent, formatting.indent_unit)
    };
    let addition = format!("{}{}{}", formatting.eol, indent, member);

    Ok(match trailing.comma_end {
        Some(_) => vec![Edit::insert(trailing.anchor, addition)],
        None if trailing.anchor == value_end => {
            vec![Edit::insert(value_end, format!(",{}", addition))]
        }
        None => vec![
            Edit::insert(value_end, ","),
            Edit::insert(trailing.anchor, addition),
        ],
    })
}

/// What follows the last member of an object, up to its closing brace
struct Trailing {
    /// End of the separator comma, when the object has a trailing comma
    comma_end: Option<usize>,
    /// Where new text goes so comments stay on the line they annotate
    anchor: usize,
}

fn scan_trailing(text: &str, value_end: usize, close: usize) -> Result<Trailing> {
    let mut scanner = Scanner::with_offset(text, value_end);
    let mut trailing = Trailing {
        comma_end: None,
        anchor: value_end,
    };
    let mut same_line = true;

    while let Some(token) = scanner.next_token()? {
        if token.start >= close {
            break;
        }
        match token.kind {
            TokenKind::Comma => {
                trailing.comma_end = Some(token.end);
                trailing.anchor = token.end;
            }
            TokenKind::LineComment | TokenKind::BlockComment if same_line => {
                trailing.anchor = token.end;
                if token.text(text).contains('\n') {
                    same_line = false;
                }
            }
            TokenKind::Whitespace if token.text(text).contains('\n') => same_line = false,
            _ => {}
        }
    }

    Ok(trailing)
}

/// Leading whitespace of the line containing `offset`
fn line_indent(text: &str, offset: usize) -> &str {
    let line_start = text[..offset].rfind('\n').map(|i| i + 1).unwrap_or(0);
    let rest = &text[line_start..];
    let content = rest.trim_start_matches([' ', '\t']);
    &rest[..rest.len() - content.len()]
}

fn is_first_on_line(text: &str, offset: usize) -> bool {
    let line_start = text[..offset].rfind('\n').map(|i| i + 1).unwrap_or(0);
    text[line_start..offset].bytes().all(|b| b == b' ' || b == b'\t')
}
