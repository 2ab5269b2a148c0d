use thiserror::Error;

use crate::tree::NodeId;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuleTreeError {
  #[error("Node {0} does not exist in this tree")]
  UnknownNode(NodeId),
  #[error("Node {0} cannot hold children")]
  NotAContainer(NodeId),
  #[error("Node {0} is not a rule")]
  NotARule(NodeId),
  #[error("A tree has exactly one root")]
  DuplicateRoot,
  #[error("The root node cannot be removed")]
  CannotRemoveRoot,
  #[error("Moving node {node} under {parent} would create a cycle")]
  WouldCreateCycle { node: NodeId, parent: NodeId },
  #[error("Malformed tree at node {node}: {reason}")]
  Malformed { node: NodeId, reason: String },
}

/// Raised by [`crate::parse`] for input it cannot turn into a tree.
///
/// `line` and `column` are 1-based and point at the offending character.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("CssSyntaxError: {line}:{column}: {reason}")]
pub struct CssSyntaxError {
  pub reason: String,
  pub offset: usize,
  pub line: usize,
  pub column: usize,
}

impl CssSyntaxError {
  pub(crate) fn at(css: &str, offset: usize, reason: impl Into<String>) -> Self {
    let before = &css[..offset.min(css.len())];
    let line = before.matches('\n').count() + 1;
    let column = match before.rfind('\n') {
      Some(newline) => before[newline + 1..].chars().count() + 1,
      None => before.chars().count() + 1,
    };

    Self {
      reason: reason.into(),
      offset,
      line,
      column,
    }
  }
}
