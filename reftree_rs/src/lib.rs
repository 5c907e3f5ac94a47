//! # reftree
//!
//! **Entity-level dependency trees for Python codebases** - one target,
//! both directions.
//!
//! Given a top-level function or class, reftree builds a bidirectional
//! dependency tree across the whole codebase: everything the entity
//! depends on (upstream) and everything that depends on it (downstream),
//! with per-path depth, parent links and a canonical node registry.
//!
//! ## Features
//!
//! - **Bidirectional traversal** - upstream dependencies and downstream
//!   dependents in one build, with signed depths
//! - **Reference classification** - inheritance, imports, calls,
//!   instantiations, attribute access, bare names, in a fixed precedence
//! - **Cycle and explosion control** - path-scoped cycle guard, depth
//!   limit, node safety cap
//! - **Projections** - flatten, depth slices, root groups, path
//!   reconstruction, bounded subsets for visualization
//!
//! ## Quick Start (Library Usage)
//!
//! ```rust,no_run
//! use reftree::deptree::build_dependency_tree;
//! use reftree::types::EntityKind;
//! use std::path::Path;
//!
//! let tree = build_dependency_tree(
//!     Path::new("src/models.py"),
//!     "Worker",
//!     EntityKind::Class,
//!     Some(2),
//!     None,
//! )?;
//! println!("{} nodes", tree.node_registry.len());
//! # anyhow::Ok(())
//! ```
//!
//! ## CLI Usage
//!
//! ```bash
//! reftree src/models.py Worker class            # Full tree, both directions
//! reftree src/models.py Worker class --json     # Machine-readable
//! reftree api.py handler function --downstream-only
//! ```
//!
//! Vibecrafted with AI Agents by VetCoders (c)2025 The Loctree Team

// ============================================================================
// Core Modules
// ============================================================================

/// Command-line argument parsing.
///
/// Contains [`ParsedArgs`](args::ParsedArgs) and [`parse_args`](args::parse_args).
pub mod args;

/// Reference classification between a candidate entity and a target name.
///
/// Ordered detectors with fixed precedence; see
/// [`classify_reference`](classify::classify_reference).
pub mod classify;

/// Dependency tree construction.
///
/// # Key Types
///
/// - [`TreeBuilder`](deptree::TreeBuilder) - per-build traversal state
/// - [`build_dependency_tree`](deptree::build_dependency_tree) - one-shot entry point
pub mod deptree;

/// Filesystem utilities: Python source gathering and path display.
pub mod fs_utils;

/// Per-build source entity index with memoized file parses.
pub mod index;

/// Import statement extraction.
pub mod imports;

/// Human and JSON rendering of dependency trees.
pub mod output;

/// Python parsing and top-level entity extraction (tree-sitter).
pub mod parse;

/// Progress UI utilities (spinner, status lines).
pub mod progress;

/// Read-only projections over a completed tree.
///
/// Flatten, depth slices, root groups, parent-link paths, bounded subsets.
pub mod query;

/// Name usage and import resolution over entity bodies.
pub mod resolver;

/// Common types used throughout the crate.
///
/// # Key Types
///
/// - [`CodeEntity`](types::CodeEntity) - a parsed top-level function/class
/// - [`DependencyNode`](types::DependencyNode) - one traversal result node
/// - [`DependencyTree`](types::DependencyTree) - the build result
/// - [`NodeId`](types::NodeId) - stable node identity
pub mod types;

// ============================================================================
// Re-exports for convenience
// ============================================================================

/// One-shot tree build with default limits.
pub use deptree::build_dependency_tree;

/// Per-build traversal state machine.
pub use deptree::TreeBuilder;

/// The build result.
pub use types::DependencyTree;

/// One traversal result node.
pub use types::DependencyNode;

/// Stable node identity `(name, file_path, line_start)`.
pub use types::NodeId;

/// Entity kinds (function, class).
pub use types::EntityKind;

/// Relationship kinds with their precedence semantics.
pub use types::DependencyKind;

/// Classify one candidate/target pair.
pub use classify::classify_reference;

/// Parse a Python file into entities plus the raw tree.
pub use parse::parse_file;
