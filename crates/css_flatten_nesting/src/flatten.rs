use css_rule_tree::{NodeId, RuleTree};

use crate::error::FlattenError;
use crate::options::FlattenNestingOptions;
use crate::selectors::flattened_selectors;

/// Joins the expanded selectors of a promoted rule.
pub const SELECTOR_SEPARATOR: &str = ", ";

/// Counts gathered during a [`flatten_nesting`] pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FlattenReport {
  /// Rules still attached to the tree when their turn came.
  pub visited: usize,
  /// Nested rules moved to the root.
  pub promoted: usize,
  /// Ancestor rules removed because they were left without children.
  pub pruned: usize,
}

/// Move every nested rule that holds declarations to the root of `tree`.
///
/// Rules are visited once each, in document order. A rule nested in another
/// rule is replaced by a root level copy whose selector spells out the whole
/// ancestor chain, see [`flattened_selectors`]. The copy keeps the original's
/// children, so rules nested deeper are handled when the walk reaches them.
/// Ancestors emptied by the move are removed unless
/// [`FlattenNestingOptions::preserve_empty`] is set.
///
/// Rules directly under the root and rules with no declarations of their own
/// are left where they are. Running the pass on a flat tree changes nothing.
#[tracing::instrument(level = "debug", skip_all)]
pub fn flatten_nesting(
  tree: &mut RuleTree,
  options: &FlattenNestingOptions,
) -> Result<FlattenReport, FlattenError> {
  tree.validate()?;

  let root = tree.root();
  let mut report = FlattenReport::default();

  for rule in tree.walk_rules() {
    if !tree.is_attached(rule) {
      continue;
    }
    report.visited += 1;

    let Some(parent) = tree.parent(rule) else {
      continue;
    };
    if parent == root || !tree.has_declarations(rule) {
      continue;
    }

    let selector = flattened_selectors(tree, rule)?.join(SELECTOR_SEPARATOR);
    tracing::trace!(rule, %selector, "Promoting nested rule");

    let promoted = tree.clone_with_selector(rule, selector)?;
    tree.append_existing(root, promoted)?;
    tree.remove(rule)?;
    report.promoted += 1;

    if !options.preserve_empty {
      report.pruned += prune_empty_ancestors(tree, parent)?;
    }
  }

  tracing::debug!(
    visited = report.visited,
    promoted = report.promoted,
    pruned = report.pruned,
    "Flattened nested rules"
  );

  Ok(report)
}

/// Remove `start` and its ancestors for as long as they are childless rules.
fn prune_empty_ancestors(tree: &mut RuleTree, start: NodeId) -> Result<usize, FlattenError> {
  let mut pruned = 0;
  let mut current = Some(start);

  while let Some(id) = current {
    if !tree.is_rule(id) || !tree.children(id).is_empty() {
      break;
    }

    current = tree.parent(id);
    tree.remove(id)?;
    tracing::trace!(rule = id, "Removed empty rule");
    pruned += 1;
  }

  Ok(pruned)
}
