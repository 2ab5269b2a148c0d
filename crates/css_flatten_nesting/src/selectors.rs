use css_rule_tree::{NodeId, RuleTree};

use crate::error::FlattenError;

/// Stands for the resolved parent selector inside a nested selector.
pub const PARENT_REFERENCE: char = '&';

/// Combine a parent selector with a nested child selector.
///
/// A child starting with `&` is glued onto the parent (`.a` + `&:hover` is
/// `.a:hover`); any other child becomes a descendant (`.a` + `.b` is `.a .b`).
/// Only a leading `&` is substituted.
pub fn combine(parent: &str, child: &str) -> String {
  match child.strip_prefix(PARENT_REFERENCE) {
    Some(rest) => format!("{parent}{rest}"),
    None => format!("{parent} {child}"),
  }
}

/// The comma separated selectors of a single rule, trimmed, in source order.
///
/// Commas inside quotes, brackets or parentheses and escaped commas do not
/// separate selectors, so `:is(.a, .b)` and `[lang=en,fr]` stay whole. Empty
/// segments are dropped.
pub fn own_selectors(selector: &str) -> Vec<String> {
  let mut selectors = Vec::new();
  let mut start = 0;
  let mut depth = 0u32;
  let mut quote: Option<char> = None;
  let mut chars = selector.char_indices();

  while let Some((index, ch)) = chars.next() {
    match (quote, ch) {
      (_, '\\') => {
        chars.next();
      }
      (Some(open), _) if ch == open => quote = None,
      (Some(_), _) => {}
      (None, '"' | '\'') => quote = Some(ch),
      (None, '(' | '[') => depth += 1,
      (None, ')' | ']') => depth = depth.saturating_sub(1),
      (None, ',') if depth == 0 => {
        selectors.push(&selector[start..index]);
        start = index + 1;
      }
      _ => {}
    }
  }
  selectors.push(&selector[start..]);

  selectors
    .into_iter()
    .map(str::trim)
    .filter(|selector| !selector.is_empty())
    .map(str::to_string)
    .collect()
}

/// Fully expanded selectors for `rule`, taking every enclosing rule into
/// account.
///
/// Expansion stops at the first ancestor without a selector (the root or an
/// at-rule), which makes the rule below it the outermost contributor. When
/// several ancestors list several selectors the result is their cross
/// product, parent major: `.a, .b` around `&:hover, &:focus` gives
/// `.a:hover, .a:focus, .b:hover, .b:focus`.
///
/// Returns an empty list for ids that are not rules or have no selector text.
pub fn flattened_selectors(tree: &RuleTree, rule: NodeId) -> Result<Vec<String>, FlattenError> {
  let mut chain = Vec::new();
  let mut current = Some(rule);

  while let Some(id) = current {
    let Some(selector) = tree.selector(id) else {
      break;
    };
    if chain.len() == tree.len() {
      return Err(FlattenError::MalformedTree {
        node: rule,
        reason: "parent chain does not reach the root".into(),
      });
    }
    chain.push(selector);
    current = tree.parent(id);
  }

  let mut flattened: Vec<String> = Vec::new();
  for selector in chain.into_iter().rev() {
    let own = own_selectors(selector);
    if flattened.is_empty() {
      flattened = own;
      continue;
    }

    let mut combined = Vec::with_capacity(flattened.len() * own.len());
    for parent in &flattened {
      for child in &own {
        combined.push(combine(parent, child));
      }
    }
    flattened = combined;
  }

  Ok(flattened)
}

#[cfg(test)]
mod tests {
  use css_rule_tree::ROOT_NODE_ID;
  use pretty_assertions::assert_eq;

  use super::*;

  #[test]
  fn combine_glues_parent_reference() {
    assert_eq!(combine(".a", "&:hover"), ".a:hover");
    assert_eq!(combine(".a", "&--modifier"), ".a--modifier");
    assert_eq!(combine(".a", "& > .b"), ".a > .b");
  }

  #[test]
  fn combine_uses_descendant_otherwise() {
    assert_eq!(combine(".a", ".b"), ".a .b");
    assert_eq!(combine(".a", "> .b"), ".a > .b");
  }

  #[test]
  fn combine_only_substitutes_leading_reference() {
    assert_eq!(combine(".a", ".b &"), ".a .b &");
  }

  #[test]
  fn own_selectors_trim_and_drop_empty_segments() {
    assert_eq!(own_selectors(" .a ,  .b,"), vec![".a", ".b"]);
    assert_eq!(own_selectors(".a,,.b"), vec![".a", ".b"]);
    assert!(own_selectors("").is_empty());
    assert!(own_selectors(" , ").is_empty());
  }

  #[test]
  fn own_selectors_keep_nested_commas() {
    assert_eq!(
      own_selectors(":is(.a, .b) > span, :not(.c,.d)"),
      vec![":is(.a, .b) > span", ":not(.c,.d)"]
    );
    assert_eq!(own_selectors("[lang=en,fr], .b"), vec!["[lang=en,fr]", ".b"]);
  }

  #[test]
  fn own_selectors_keep_quoted_and_escaped_commas() {
    assert_eq!(
      own_selectors("[title=\"a,b\"], .x\\,y, [title='c,]']"),
      vec!["[title=\"a,b\"]", ".x\\,y", "[title='c,]']"]
    );
  }

  #[test]
  fn root_level_rule_keeps_own_selectors() {
    let mut tree = RuleTree::new();
    let a = tree.append_rule(ROOT_NODE_ID, ".a,.b").unwrap();

    assert_eq!(flattened_selectors(&tree, a).unwrap(), vec![".a", ".b"]);
  }

  #[test]
  fn non_rules_have_no_selectors() {
    let mut tree = RuleTree::new();
    let media = tree.append_at_rule(ROOT_NODE_ID, "media", "print").unwrap();

    assert!(flattened_selectors(&tree, ROOT_NODE_ID).unwrap().is_empty());
    assert!(flattened_selectors(&tree, media).unwrap().is_empty());
    assert!(flattened_selectors(&tree, 404).unwrap().is_empty());
  }

  #[test]
  fn cross_product_is_parent_major() {
    let mut tree = RuleTree::new();
    let a = tree.append_rule(ROOT_NODE_ID, ".a, .b").unwrap();
    let nested = tree.append_rule(a, "&:hover, &:focus").unwrap();

    assert_eq!(
      flattened_selectors(&tree, nested).unwrap(),
      vec![".a:hover", ".a:focus", ".b:hover", ".b:focus"]
    );
  }

  #[test]
  fn expands_every_level() {
    let mut tree = RuleTree::new();
    let a = tree.append_rule(ROOT_NODE_ID, ".a").unwrap();
    let b = tree.append_rule(a, ".b, .c").unwrap();
    let d = tree.append_rule(b, "&.d").unwrap();

    assert_eq!(
      flattened_selectors(&tree, d).unwrap(),
      vec![".a .b.d", ".a .c.d"]
    );
  }

  #[test]
  fn stops_at_at_rules() {
    let mut tree = RuleTree::new();
    let a = tree.append_rule(ROOT_NODE_ID, ".a").unwrap();
    let media = tree.append_at_rule(a, "media", "print").unwrap();
    let b = tree.append_rule(media, ".b").unwrap();

    assert_eq!(flattened_selectors(&tree, b).unwrap(), vec![".b"]);
  }

  #[test]
  fn rule_without_selector_text_ends_expansion() {
    let mut tree = RuleTree::new();
    let a = tree.append_rule(ROOT_NODE_ID, ".a").unwrap();
    let empty = tree.append_rule(a, "").unwrap();
    let b = tree.append_rule(empty, ".b").unwrap();

    assert!(flattened_selectors(&tree, empty).unwrap().is_empty());
    assert_eq!(flattened_selectors(&tree, b).unwrap(), vec![".b"]);
  }

  #[test]
  fn looping_parent_chain_is_malformed() {
    let mut tree = RuleTree::new();
    let a = tree.append_rule(ROOT_NODE_ID, ".a").unwrap();
    let b = tree.append_rule(a, ".b").unwrap();
    tree.get_mut(a).unwrap().parent = Some(b);

    assert!(matches!(
      flattened_selectors(&tree, b),
      Err(FlattenError::MalformedTree { node, .. }) if node == b
    ));
  }
}
