use crate::tree::{NodeId, NodeKind, RuleTree, ROOT_NODE_ID};

const INDENT: &str = "  ";

/// Print `tree` as CSS, one node per line with two space indentation.
///
/// Detached nodes are not printed.
pub fn stringify(tree: &RuleTree) -> String {
  let mut stringifier = Stringifier {
    tree,
    output: String::new(),
    seen: vec![false; tree.len()],
  };
  for child in tree.children(ROOT_NODE_ID) {
    stringifier.node(*child, 0);
  }
  stringifier.output
}

struct Stringifier<'a> {
  tree: &'a RuleTree,
  output: String,
  seen: Vec<bool>,
}

impl Stringifier<'_> {
  /// Push one line of output at `depth` levels of indentation.
  fn line(&mut self, depth: usize, text: &str) {
    for _ in 0..depth {
      self.output.push_str(INDENT);
    }
    self.output.push_str(text);
    self.output.push('\n');
  }

  fn node(&mut self, id: NodeId, depth: usize) {
    // A node listed twice means the tree is corrupt; print it once.
    match self.seen.get_mut(id) {
      Some(seen) if !*seen => *seen = true,
      _ => return,
    }
    let tree = self.tree;
    let Some(kind) = tree.kind(id) else {
      return;
    };

    match kind {
      NodeKind::Root => {}
      NodeKind::Rule { selector } => self.block(id, depth, selector),
      NodeKind::AtRule {
        name,
        params,
        block,
      } => {
        let prelude = if params.is_empty() {
          format!("@{name}")
        } else {
          format!("@{name} {params}")
        };
        if *block || !tree.children(id).is_empty() {
          self.block(id, depth, &prelude);
        } else {
          self.line(depth, &format!("{prelude};"));
        }
      }
      NodeKind::Declaration {
        prop,
        value,
        important,
      } => {
        let important = if *important { " !important" } else { "" };
        self.line(depth, &format!("{prop}: {value}{important};"));
      }
      NodeKind::Comment { text } => self.line(depth, &format!("/* {text} */")),
    }
  }

  fn block(&mut self, id: NodeId, depth: usize, prelude: &str) {
    let tree = self.tree;
    let children = tree.children(id);
    if children.is_empty() {
      self.line(depth, &format!("{prelude} {{}}"));
      return;
    }

    self.line(depth, &format!("{prelude} {{"));
    for child in children {
      self.node(*child, depth + 1);
    }
    self.line(depth, "}");
  }
}
