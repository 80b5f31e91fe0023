//! Unified-diff parsing into structured hunks.

pub mod parser;

pub use parser::{ensure_hunk_header, parse_patch, DiffHunk, DiffLine, DiffLineKind};
