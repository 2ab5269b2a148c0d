use serde::{Deserialize, Serialize};

/// Options for [`crate::flatten_nesting`].
///
/// Deserializes from the camelCase JSON a host keeps in its config, e.g.
/// `{ "preserveEmpty": true }`. Missing keys use their defaults.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct FlattenNestingOptions {
  /// Keep rules that end up with no children once their nested rules have
  /// been moved out, instead of removing them.
  pub preserve_empty: bool,
}

impl FlattenNestingOptions {
  pub fn with_preserve_empty(mut self, value: bool) -> Self {
    self.preserve_empty = value;
    self
  }
}
