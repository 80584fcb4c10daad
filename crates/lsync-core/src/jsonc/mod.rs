//! JSON-with-comments support: parsing with spans and minimal in-place edits
//!
//! VS Code's `launch.json` is JSONC: it may contain comments and trailing
//! commas, and users expect both to survive automated edits. The parser here
//! keeps source spans for every node, and the edit layer rewrites only the
//! bytes of the value being changed.

pub mod edit;
pub mod parser;
pub mod patch;
pub mod path;
pub mod scanner;

pub use edit::{apply_edits, set_value, Edit, FormattingOptions};
pub use parser::{parse_tree, parse_value, Node, NodeKind, Property, Span};
pub use patch::{apply_patches, Patch};
pub use path::{JsonPath, Segment};
