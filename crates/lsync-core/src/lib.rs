//! # lsync-core - Core Domain Types
//!
//! Foundation crate for launch-sync. Provides the build context model, the
//! visibility rule language, comment-preserving JSONC editing, and the
//! launch.json view that ties them together.
//!
//! This crate has **zero internal dependencies** -- it only depends on external
//! crates (serde, serde_json, thiserror, regex, tracing).
//!
//! ## Public API
//!
//! ### Build Context (`context`)
//! - [`BuildContext`] - The active preset or kit (at most one of them)
//! - [`ContextKind`] - Which CMake selection changed (configure/build preset, kit)
//! - [`is_placeholder()`] - Recognize the integration's "default preset" sentinels
//!
//! ### Rules (`matcher`)
//! - [`Matcher`], [`MatcherKind`] - One `presentation.cmake` rule
//! - [`evaluate()`] - Visibility verdict for a rule list (first match wins)
//! - [`RegexCache`] - Compiled patterns shared across one evaluation pass
//!
//! ### JSONC (`jsonc`)
//! - [`jsonc::parse_tree()`] - Parse with comments and trailing commas, keeping spans
//! - [`jsonc::set_value()`] - Minimal edits that set one value by path
//! - [`jsonc::apply_patches()`] - Sequential patch application
//! - [`jsonc::FormattingOptions`] - Indent and line ending for inserted text
//!
//! ### Launch Files (`launch`)
//! - [`LaunchDocument`] - Parsed launch.json with its managed entries
//! - [`VisibilityChange`] - A `hidden` flag that must be written
//!
//! ### Error Handling (`error`)
//! - [`Error`] - Custom error enum with `fatal` vs `recoverable` classification
//! - [`Result`] - Type alias for `std::result::Result<T, Error>`
//! - [`ResultExt`] - Extension trait for adding error context
//!
//! ## Prelude
//!
//! Import commonly used types with:
//! ```rust
//! use lsync_core::prelude::*;
//! ```

pub mod context;
pub mod error;
pub mod jsonc;
pub mod launch;
pub mod logging;
pub mod matcher;

/// Prelude for common imports used throughout all launch-sync crates
pub mod prelude {
    pub use super::error::{Error, Result, ResultExt};
    pub use tracing::{debug, error, info, instrument, trace, warn};
}

// Re-export commonly used types at crate root for convenience
pub use context::{
    is_placeholder, normalize_label, BuildContext, ContextKind, DEFAULT_BUILD_PRESET,
    DEFAULT_CONFIGURE_PRESET,
};
pub use error::{Error, Result, ResultExt};
pub use jsonc::FormattingOptions;
pub use launch::{compute_visibility, hidden_path, LaunchDocument, LaunchEntry, VisibilityChange};
pub use matcher::{evaluate, evaluate_with_cache, Matcher, MatcherKind, RegexCache};
