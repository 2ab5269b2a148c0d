use css_rule_tree::{NodeId, RuleTreeError};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FlattenError {
  /// The tree's parent and child links disagree or loop.
  #[error("Malformed rule tree at node {node}: {reason}")]
  MalformedTree { node: NodeId, reason: String },
  #[error("Failed to edit rule tree")]
  Tree(#[source] RuleTreeError),
}

impl From<RuleTreeError> for FlattenError {
  fn from(error: RuleTreeError) -> Self {
    match error {
      RuleTreeError::Malformed { node, reason } => FlattenError::MalformedTree { node, reason },
      error => FlattenError::Tree(error),
    }
  }
}
