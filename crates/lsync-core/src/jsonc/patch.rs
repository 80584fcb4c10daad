//! Sequential application of value patches to JSONC text

use serde_json::Value;

use super::edit::{apply_edits, set_value, FormattingOptions};
use super::path::JsonPath;
use crate::error::Result;

/// Set the value at `path` to `value`
#[derive(Debug, Clone, PartialEq)]
pub struct Patch {
    pub path: JsonPath,
    pub value: Value,
}

impl Patch {
    pub fn new(path: JsonPath, value: impl Into<Value>) -> Self {
        Self {
            path,
            value: value.into(),
        }
    }
}

/// Apply `patches` to `text` in order.
///
/// Each patch is computed against the text produced by the previous one, so
/// an insertion earlier in the document never invalidates a later patch.
/// Any failing patch fails the whole call and no partial result escapes.
pub fn apply_patches(text: &str, patches: &[Patch], formatting: &FormattingOptions) -> Result<String> {
    let mut current = text.to_string();
    for patch in patches {
        let edits = set_value(&current, &patch.path, &patch.value, formatting)?;
        current = apply_edits(&current, &edits);
    }
    Ok(current)
}
