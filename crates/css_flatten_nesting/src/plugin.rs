use std::fmt::Debug;

use css_rule_tree::RuleTree;

use crate::flatten::flatten_nesting;
use crate::options::FlattenNestingOptions;

/// A single transform step run by a [`crate::Processor`].
pub trait Plugin: Debug {
  fn name(&self) -> &'static str;
  fn run(&self, tree: &mut RuleTree) -> anyhow::Result<()>;
}

/// Runs [`flatten_nesting`] as a pipeline step.
///
/// The pass does not repeat itself, so it has to be placed after every step
/// that can still add nested rules.
#[derive(Clone, Debug, Default)]
pub struct FlattenNestingPlugin {
  options: FlattenNestingOptions,
}

pub fn flatten_nesting_plugin() -> FlattenNestingPlugin {
  FlattenNestingPlugin::default()
}

impl FlattenNestingPlugin {
  pub fn new(options: FlattenNestingOptions) -> Self {
    Self { options }
  }

  pub fn options(&self) -> &FlattenNestingOptions {
    &self.options
  }
}

impl Plugin for FlattenNestingPlugin {
  fn name(&self) -> &'static str {
    "flatten-nesting"
  }

  fn run(&self, tree: &mut RuleTree) -> anyhow::Result<()> {
    flatten_nesting(tree, &self.options)?;
    Ok(())
  }
}
