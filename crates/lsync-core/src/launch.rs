//! Structural view of a VS Code launch.json and the visibility plan for it
//!
//! Only `configurations[*].presentation.{hidden,cmake}` is read or written;
//! every other part of the document is carried through untouched.

use serde::Serialize;

use crate::context::BuildContext;
use crate::error::{Error, Result};
use crate::jsonc::{apply_patches, parse_tree, FormattingOptions, JsonPath, Node, Patch};
use crate::matcher::{evaluate_with_cache, Matcher, RegexCache};

const CONFIGURATIONS: &str = "configurations";
const PRESENTATION: &str = "presentation";
const HIDDEN: &str = "hidden";
const CMAKE: &str = "cmake";

/// One element of the `configurations` array, as far as visibility cares
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchEntry {
    /// Position in `configurations`
    pub index: usize,
    /// The entry's `name`, for logging
    pub name: Option<String>,
    /// `presentation.hidden` when it is a boolean
    pub hidden: Option<bool>,
    /// `presentation.cmake` when it is an array
    pub matchers: Option<Vec<Matcher>>,
}

impl LaunchEntry {
    /// Label for log messages: the name, or the index
    pub fn label(&self) -> String {
        match &self.name {
            Some(name) => format!("'{}'", name),
            None => format!("#{}", self.index),
        }
    }
}

/// A `hidden` flag that has to be written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VisibilityChange {
    pub index: usize,
    pub hidden: bool,
    pub previous: Option<bool>,
}

/// Path of the `hidden` flag of entry `index`
pub fn hidden_path(index: usize) -> JsonPath {
    JsonPath::root()
        .key(CONFIGURATIONS)
        .index(index)
        .key(PRESENTATION)
        .key(HIDDEN)
}

/// Desired visibility change for one entry, if any.
///
/// Entries without matchers (or with an empty list) are never changed. An
/// absent `hidden` always counts as different so the flag gets written once.
pub fn compute_visibility(
    entry: &LaunchEntry,
    context: &BuildContext,
    cache: &mut RegexCache,
) -> Result<Option<VisibilityChange>> {
    let Some(matchers) = entry.matchers.as_deref().filter(|m| !m.is_empty()) else {
        return Ok(None);
    };

    let hidden = !evaluate_with_cache(matchers, context, cache)?;
    if entry.hidden == Some(hidden) {
        return Ok(None);
    }

    Ok(Some(VisibilityChange {
        index: entry.index,
        hidden,
        previous: entry.hidden,
    }))
}

/// A launch.json read for one pass: source text plus the entries found in it
#[derive(Debug, Clone)]
pub struct LaunchDocument {
    text: String,
    entries: Vec<LaunchEntry>,
}

impl LaunchDocument {
    /// Parse permissively (comments, trailing commas, empty content).
    ///
    /// Fails on malformed JSONC and on matcher items that are not
    /// `{ "type": .., "value": "<string>" }` objects.
    pub fn parse(text: impl Into<String>) -> Result<Self> {
        let text = text.into();
        let entries = match parse_tree(&text)? {
            Some(root) => collect_entries(&root)?,
            None => Vec::new(),
        };
        Ok(Self { text, entries })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn entries(&self) -> &[LaunchEntry] {
        &self.entries
    }

    /// Entries that carry a non-empty matcher list
    pub fn managed_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.matchers.as_ref().is_some_and(|m| !m.is_empty()))
            .count()
    }

    /// Every visibility change needed for `context`, in document order.
    ///
    /// Any matcher error aborts the whole plan.
    pub fn plan(&self, context: &BuildContext) -> Result<Vec<VisibilityChange>> {
        let mut cache = RegexCache::new();
        let mut changes = Vec::new();
        for entry in &self.entries {
            if let Some(change) = compute_visibility(entry, context, &mut cache)? {
                tracing::debug!(
                    "Configuration {} -> hidden={} (was {:?})",
                    entry.label(),
                    change.hidden,
                    change.previous
                );
                changes.push(change);
            }
        }
        Ok(changes)
    }

    /// The document text with `changes` applied, one patch per change
    pub fn render(
        &self,
        changes: &[VisibilityChange],
        formatting: &FormattingOptions,
    ) -> Result<String> {
        let patches: Vec<Patch> = changes
            .iter()
            .map(|c| Patch::new(hidden_path(c.index), c.hidden))
            .collect();
        apply_patches(&self.text, &patches, formatting)
    }
}

fn collect_entries(root: &Node) -> Result<Vec<LaunchEntry>> {
    let Some(configurations) = root.get(CONFIGURATIONS).and_then(Node::as_array) else {
        tracing::debug!("launch.json has no '{}' array", CONFIGURATIONS);
        return Ok(Vec::new());
    };

    configurations
        .iter()
        .enumerate()
        .map(|(index, node)| read_entry(index, node))
        .collect()
}

fn read_entry(index: usize, node: &Node) -> Result<LaunchEntry> {
    let name = node
        .get("name")
        .and_then(|n| n.to_value().as_str().map(str::to_string));
    let presentation = node.get(PRESENTATION);

    let hidden = presentation
        .and_then(|p| p.get(HIDDEN))
        .and_then(|h| h.to_value().as_bool());

    let matchers = match presentation
        .and_then(|p| p.get(CMAKE))
        .and_then(Node::as_array)
    {
        Some(items) => Some(
            items
                .iter()
                .map(|item| {
                    serde_json::from_value::<Matcher>(item.to_value())
                        .map_err(|e| Error::invalid_matcher(index, e.to_string()))
                })
                .collect::<Result<Vec<_>>>()?,
        ),
        None => None,
    };

    Ok(LaunchEntry {
        index,
        name,
        hidden,
        matchers,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jsonc::parse_value;
    use crate::matcher::MatcherKind;
    use serde_json::json;

    const SAMPLE: &str = r#"{
    "version": "0.2.0",
    "configurations": [
        {
            // runs everywhere
            "name": "plain",
            "type": "cppdbg"
        },
        {
            "name": "linux-debug",
            "presentation": {
                "hidden": true,
                "cmake": [{ "type": "preset-include", "value": "debug" }]
            }
        },
        {
            "name": "release-only",
            "presentation": {
                "cmake": [{ "type": "preset-match", "value": "^rel" }]
            }
        },
        {
            "name": "no-rules",
            "presentation": { "hidden": false, "cmake": [] }
        }
    ]
}"#;

    fn plan(text: &str, context: &BuildContext) -> Vec<VisibilityChange> {
        LaunchDocument::parse(text).unwrap().plan(context).unwrap()
    }

    #[test]
    fn test_entries_are_read() {
        let doc = LaunchDocument::parse(SAMPLE).unwrap();
        let entries = doc.entries();
        assert_eq!(entries.len(), 4);
        assert_eq!(entries[0].matchers, None);
        assert_eq!(entries[1].hidden, Some(true));
        assert_eq!(
            entries[1].matchers,
            Some(vec![Matcher::new(MatcherKind::PresetInclude, "debug")])
        );
        assert_eq!(entries[2].hidden, None);
        assert_eq!(entries[3].matchers, Some(vec![]));
        assert_eq!(doc.managed_count(), 2);
    }

    #[test]
    fn test_matching_preset_unhides_entry() {
        let changes = plan(SAMPLE, &BuildContext::with_preset("debug-linux"));
        assert_eq!(
            changes,
            vec![
                VisibilityChange { index: 1, hidden: false, previous: Some(true) },
                VisibilityChange { index: 2, hidden: true, previous: None },
            ]
        );
    }

    #[test]
    fn test_kit_context_hides_preset_rules() {
        let changes = plan(SAMPLE, &BuildContext::with_kit("gcc-12"));
        assert_eq!(
            changes,
            vec![VisibilityChange { index: 2, hidden: true, previous: None }]
        );
    }

    #[test]
    fn test_empty_context_hides_every_managed_entry() {
        let doc = LaunchDocument::parse(SAMPLE).unwrap();
        let changes = doc.plan(&BuildContext::none()).unwrap();
        let rendered = doc.render(&changes, &FormattingOptions::default()).unwrap();
        let value = parse_value(&rendered).unwrap();

        assert_eq!(value["configurations"][1]["presentation"]["hidden"], json!(true));
        assert_eq!(value["configurations"][2]["presentation"]["hidden"], json!(true));
        assert!(value["configurations"][0].get("presentation").is_none());
        assert_eq!(value["configurations"][3]["presentation"]["hidden"], json!(false));
    }

    #[test]
    fn test_render_then_plan_is_stable() {
        let context = BuildContext::with_preset("release");
        let doc = LaunchDocument::parse(SAMPLE).unwrap();
        let rendered = doc
            .render(&doc.plan(&context).unwrap(), &FormattingOptions::default())
            .unwrap();

        let again = LaunchDocument::parse(rendered).unwrap();
        assert!(again.plan(&context).unwrap().is_empty());
    }

    #[test]
    fn test_invalid_pattern_aborts_plan() {
        let text = r#"{"configurations": [
            {"presentation": {"hidden": true, "cmake": [{"type": "kit-include", "value": "gcc"}]}},
            {"presentation": {"cmake": [{"type": "match", "value": "[bad"}]}}
        ]}"#;
        let doc = LaunchDocument::parse(text).unwrap();
        let err = doc.plan(&BuildContext::with_kit("gcc")).unwrap_err();
        assert!(matches!(err, Error::Pattern { .. }));
    }

    #[test]
    fn test_malformed_matcher_is_rejected_at_parse() {
        let text = r#"{"configurations": [{"presentation": {"cmake": [{"type": "include"}]}}]}"#;
        let err = LaunchDocument::parse(text).unwrap_err();
        assert!(matches!(err, Error::InvalidMatcher { index: 0, .. }));

        let text = r#"{"configurations": [{"presentation": {"cmake": ["debug"]}}]}"#;
        assert!(LaunchDocument::parse(text).is_err());
    }

    #[test]
    fn test_non_boolean_hidden_counts_as_absent() {
        let text = r#"{"configurations": [{"presentation": {"hidden": "yes", "cmake": [{"type": "include", "value": ""}]}}]}"#;
        let changes = plan(text, &BuildContext::with_kit("any"));
        assert_eq!(
            changes,
            vec![VisibilityChange { index: 0, hidden: false, previous: None }]
        );
    }

    #[test]
    fn test_documents_without_configurations() {
        assert!(LaunchDocument::parse("").unwrap().entries().is_empty());
        assert!(LaunchDocument::parse("[]").unwrap().entries().is_empty());
        assert!(LaunchDocument::parse(r#"{"configurations": {}}"#)
            .unwrap()
            .entries()
            .is_empty());
    }

    #[test]
    fn test_non_object_entries_are_left_alone() {
        let text = r#"{"configurations": [42, "x", {"presentation": 1}]}"#;
        let changes = plan(text, &BuildContext::none());
        assert!(changes.is_empty());
    }

    #[test]
    fn test_entry_label() {
        let doc = LaunchDocument::parse(SAMPLE).unwrap();
        assert_eq!(doc.entries()[1].label(), "'linux-debug'");

        let doc = LaunchDocument::parse(r#"{"configurations": [{}]}"#).unwrap();
        assert_eq!(doc.entries()[0].label(), "#0");
    }
}
