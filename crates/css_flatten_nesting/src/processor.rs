use anyhow::Context;
use css_rule_tree::{parse, RuleTree};

use crate::plugin::Plugin;

#[derive(Debug)]
pub struct ProcessResult {
  pub css: String,
  pub tree: RuleTree,
}

/// Ordered list of [`Plugin`]s applied to a stylesheet.
///
/// Plugins run strictly in the order they were added.
#[derive(Debug, Default)]
pub struct Processor {
  plugins: Vec<Box<dyn Plugin>>,
}

impl Processor {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_plugin(mut self, plugin: impl Plugin + 'static) -> Self {
    self.push(plugin);
    self
  }

  pub fn push(&mut self, plugin: impl Plugin + 'static) {
    self.plugins.push(Box::new(plugin));
  }

  pub fn plugin_names(&self) -> Vec<&'static str> {
    self.plugins.iter().map(|plugin| plugin.name()).collect()
  }

  /// Parse `css`, run every plugin over it and print the result.
  #[tracing::instrument(level = "debug", skip_all, fields(plugins = self.plugins.len()))]
  pub fn process(&self, css: &str) -> anyhow::Result<ProcessResult> {
    let mut tree = parse(css).context("Failed to parse CSS")?;
    self.run(&mut tree)?;

    Ok(ProcessResult {
      css: tree.to_css(),
      tree,
    })
  }

  /// Run every plugin over an already parsed tree.
  pub fn run(&self, tree: &mut RuleTree) -> anyhow::Result<()> {
    for plugin in &self.plugins {
      let _span = tracing::debug_span!("plugin", name = plugin.name()).entered();
      plugin
        .run(tree)
        .with_context(|| format!("Plugin '{}' failed", plugin.name()))?;
    }

    Ok(())
  }
}
