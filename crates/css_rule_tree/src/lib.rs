//! Mutable CSS rule tree used by the stylesheet transforms.
//!
//! The tree is an arena: every node is addressed by a [`NodeId`] and stores
//! the id of its parent plus the ordered ids of its children. [`parse`] builds
//! a tree from source text and [`stringify`] prints one back.

pub mod error;
pub mod parse;
pub mod stringify;
pub mod tree;

pub use error::{CssSyntaxError, RuleTreeError};
pub use parse::parse;
pub use stringify::stringify;
pub use tree::{Ancestors, Node, NodeId, NodeKind, RuleTree, ROOT_NODE_ID};
