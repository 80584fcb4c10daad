//! One visibility pass over a single launch file
//!
//! Read, parse, evaluate every entry against the context snapshot, and write
//! back only when at least one `hidden` flag has to change. Any failure ends
//! the pass for this file without writing.

use std::path::Path;

use serde::Serialize;

use lsync_core::prelude::*;
use lsync_core::{BuildContext, LaunchDocument, VisibilityChange};

use crate::config::FormatSettings;
use crate::store::LaunchStore;

/// Result of a pass over one launch file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PassOutcome {
    /// The file does not exist
    Absent,
    /// Every managed entry already has the right visibility
    Unchanged { managed: usize },
    /// The file was rewritten
    Updated { changes: Vec<VisibilityChange> },
}

impl PassOutcome {
    pub fn is_updated(&self) -> bool {
        matches!(self, PassOutcome::Updated { .. })
    }
}

/// Bring the launch file at `path` in line with `context`.
///
/// Inserted text follows the file's own indentation and line endings;
/// `format` only fills in what the file does not reveal.
pub fn apply_to_document<S: LaunchStore + ?Sized>(
    store: &S,
    path: &Path,
    context: &BuildContext,
    format: &FormatSettings,
) -> Result<PassOutcome> {
    let Some(text) = store.read(path)? else {
        debug!("No launch file at {}", path.display());
        return Ok(PassOutcome::Absent);
    };

    let document = LaunchDocument::parse(text)?;
    let changes = document.plan(context)?;

    if changes.is_empty() {
        debug!("{} already matches {}", path.display(), context);
        return Ok(PassOutcome::Unchanged {
            managed: document.managed_count(),
        });
    }

    let options = format.for_text(document.text());
    let updated = document.render(&changes, &options)?;
    store.write(path, &updated)?;

    info!(
        "Updated {} configuration(s) in {} for {}",
        changes.len(),
        path.display(),
        context
    );
    Ok(PassOutcome::Updated { changes })
}
