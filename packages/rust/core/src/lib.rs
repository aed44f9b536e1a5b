//! Content assembly for docbinder.
//!
//! Groups content units into collections, merges each collection into one
//! page with per-section anchors, builds the navigation tree, and writes the
//! resulting site.

pub mod assembler;
pub mod grouping;
pub mod merge;
pub mod nav;
pub mod output;
pub mod pipeline;
pub mod source;

pub use assembler::{assemble, assemble_from};
pub use grouping::{Collection, Grouping, group};
pub use nav::{NavTree, build_nav_tree};
pub use output::{PageContext, PageRequest, WriteConfig, WriteResult, page_requests, validate_site, write_site};
pub use pipeline::{BuildConfig, BuildResult, ProgressReporter, SilentProgress, build_site};
pub use source::{ContentSource, MemorySource, SnapshotSource, parse_snapshot};
