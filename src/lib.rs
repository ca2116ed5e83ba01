//! Treeflow Library
//!
//! Hierarchical task tracking: projects own a tree of nodes, and a node's
//! status and progress are derived from its leaf tasks.

pub mod board;
pub mod cli;
pub mod config;
pub mod error;
pub mod format;
pub mod logging;
pub mod prefs;
pub mod registry;
pub mod store;
pub mod tree;
pub mod types;

pub use board::{Board, SharedBoard};
pub use error::{CoreError, CoreResult, ErrorCode, StorageError};
pub use registry::{Project, Registry};
pub use store::{FileStorage, MemoryStorage, Storage};
pub use tree::{Node, Tree};
pub use types::{LeafCount, NodeView, ProjectSummary, Status};
