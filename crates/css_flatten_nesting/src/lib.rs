//! Flattens nested style rules into root level rules.
//!
//! ```text
//! .a, .b { &:hover, &:focus { color: red } }
//! ```
//!
//! becomes
//!
//! ```text
//! .a:hover, .a:focus, .b:hover, .b:focus { color: red }
//! ```
//!
//! Use [`flatten_nesting`] on a [`css_rule_tree::RuleTree`] directly, or add
//! [`FlattenNestingPlugin`] to a [`Processor`] as its last nesting aware step.

pub mod error;
pub mod flatten;
pub mod options;
pub mod plugin;
pub mod processor;
pub mod selectors;

pub use error::FlattenError;
pub use flatten::{flatten_nesting, FlattenReport, SELECTOR_SEPARATOR};
pub use options::FlattenNestingOptions;
pub use plugin::{flatten_nesting_plugin, FlattenNestingPlugin, Plugin};
pub use processor::{ProcessResult, Processor};
pub use selectors::{combine, flattened_selectors, own_selectors, PARENT_REFERENCE};
