use std::mem;

use crate::error::RuleTreeError;

/// Index of a node inside a [`RuleTree`].
///
/// Ids stay valid for the lifetime of the tree. Removing a node only detaches
/// it, so an id never points at a different node later on.
pub type NodeId = usize;

/// The root always occupies the first slot of the arena.
pub const ROOT_NODE_ID: NodeId = 0;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeKind {
  Root,
  Rule {
    selector: String,
  },
  AtRule {
    name: String,
    params: String,
    /// Whether the at-rule has a `{}` body, even an empty one.
    block: bool,
  },
  Declaration {
    prop: String,
    value: String,
    important: bool,
  },
  Comment {
    text: String,
  },
}

impl NodeKind {
  pub fn rule(selector: impl Into<String>) -> Self {
    NodeKind::Rule {
      selector: selector.into(),
    }
  }

  pub fn declaration(prop: impl Into<String>, value: impl Into<String>) -> Self {
    NodeKind::Declaration {
      prop: prop.into(),
      value: value.into(),
      important: false,
    }
  }

  pub fn at_rule(name: impl Into<String>, params: impl Into<String>) -> Self {
    NodeKind::AtRule {
      name: name.into(),
      params: params.into(),
      block: false,
    }
  }

  pub fn comment(text: impl Into<String>) -> Self {
    NodeKind::Comment { text: text.into() }
  }

  /// Whether nodes of this kind may hold children.
  pub fn is_container(&self) -> bool {
    matches!(
      self,
      NodeKind::Root | NodeKind::Rule { .. } | NodeKind::AtRule { .. }
    )
  }

  pub fn type_name(&self) -> &'static str {
    match self {
      NodeKind::Root => "root",
      NodeKind::Rule { .. } => "rule",
      NodeKind::AtRule { .. } => "atrule",
      NodeKind::Declaration { .. } => "decl",
      NodeKind::Comment { .. } => "comment",
    }
  }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Node {
  pub kind: NodeKind,
  pub parent: Option<NodeId>,
  pub children: Vec<NodeId>,
}

impl Node {
  fn new(kind: NodeKind) -> Self {
    Self {
      kind,
      parent: None,
      children: Vec::new(),
    }
  }

  pub fn is_rule(&self) -> bool {
    matches!(self.kind, NodeKind::Rule { .. })
  }

  pub fn selector(&self) -> Option<&str> {
    match &self.kind {
      NodeKind::Rule { selector } => Some(selector.as_str()),
      _ => None,
    }
  }
}

/// Mutable stylesheet tree with parent back references.
///
/// Nodes live in a flat arena and refer to each other by [`NodeId`]. The tree
/// is built by the parser (or by hand through the `append_*` helpers), edited
/// in place by transforms, and finally printed with [`RuleTree::to_css`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RuleTree {
  nodes: Vec<Node>,
}

impl Default for RuleTree {
  fn default() -> Self {
    Self::new()
  }
}

impl RuleTree {
  pub fn new() -> Self {
    RuleTree {
      nodes: vec![Node::new(NodeKind::Root)],
    }
  }

  pub fn root(&self) -> NodeId {
    ROOT_NODE_ID
  }

  /// Number of allocated nodes, detached ones included.
  pub fn len(&self) -> usize {
    self.nodes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.children(ROOT_NODE_ID).is_empty()
  }

  pub fn get(&self, id: NodeId) -> Option<&Node> {
    self.nodes.get(id)
  }

  /// Raw access to a node. Editing `parent` or `children` directly bypasses
  /// the structural checks; [`RuleTree::validate`] will report the damage.
  pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
    self.nodes.get_mut(id)
  }

  pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
    self.get(id).map(|node| &node.kind)
  }

  pub fn parent(&self, id: NodeId) -> Option<NodeId> {
    self.get(id).and_then(|node| node.parent)
  }

  pub fn children(&self, id: NodeId) -> &[NodeId] {
    self
      .get(id)
      .map(|node| node.children.as_slice())
      .unwrap_or_default()
  }

  pub fn selector(&self, id: NodeId) -> Option<&str> {
    self.get(id).and_then(Node::selector)
  }

  pub fn is_root(&self, id: NodeId) -> bool {
    matches!(self.kind(id), Some(NodeKind::Root))
  }

  pub fn is_rule(&self, id: NodeId) -> bool {
    self.get(id).is_some_and(Node::is_rule)
  }

  /// Whether `id` directly holds at least one declaration.
  pub fn has_declarations(&self, id: NodeId) -> bool {
    self
      .children(id)
      .iter()
      .any(|child| matches!(self.kind(*child), Some(NodeKind::Declaration { .. })))
  }

  /// Creates a node of `kind` as the last child of `parent`.
  pub fn append(&mut self, parent: NodeId, kind: NodeKind) -> Result<NodeId, RuleTreeError> {
    if matches!(kind, NodeKind::Root) {
      return Err(RuleTreeError::DuplicateRoot);
    }
    self.ensure_container(parent)?;

    let id = self.nodes.len();
    let mut node = Node::new(kind);
    node.parent = Some(parent);
    self.nodes.push(node);
    self.nodes[parent].children.push(id);
    if let NodeKind::AtRule { block, .. } = &mut self.nodes[parent].kind {
      *block = true;
    }

    Ok(id)
  }

  pub fn append_rule(
    &mut self,
    parent: NodeId,
    selector: impl Into<String>,
  ) -> Result<NodeId, RuleTreeError> {
    self.append(parent, NodeKind::rule(selector))
  }

  pub fn append_declaration(
    &mut self,
    parent: NodeId,
    prop: impl Into<String>,
    value: impl Into<String>,
  ) -> Result<NodeId, RuleTreeError> {
    self.append(parent, NodeKind::declaration(prop, value))
  }

  pub fn append_at_rule(
    &mut self,
    parent: NodeId,
    name: impl Into<String>,
    params: impl Into<String>,
  ) -> Result<NodeId, RuleTreeError> {
    self.append(parent, NodeKind::at_rule(name, params))
  }

  pub fn append_comment(
    &mut self,
    parent: NodeId,
    text: impl Into<String>,
  ) -> Result<NodeId, RuleTreeError> {
    self.append(parent, NodeKind::comment(text))
  }

  /// Moves `child` to the end of `parent`, detaching it from wherever it was.
  pub fn append_existing(&mut self, parent: NodeId, child: NodeId) -> Result<(), RuleTreeError> {
    self.ensure_container(parent)?;
    if self.get(child).is_none() {
      return Err(RuleTreeError::UnknownNode(child));
    }
    if child == ROOT_NODE_ID {
      return Err(RuleTreeError::DuplicateRoot);
    }
    if child == parent || self.ancestors(parent).any(|ancestor| ancestor == child) {
      return Err(RuleTreeError::WouldCreateCycle { node: child, parent });
    }

    self.detach(child);
    self.nodes[child].parent = Some(parent);
    self.nodes[parent].children.push(child);
    if let NodeKind::AtRule { block, .. } = &mut self.nodes[parent].kind {
      *block = true;
    }

    Ok(())
  }

  /// Allocates an unattached copy of rule `id` carrying `selector`.
  ///
  /// The copy adopts the original's children, which are re-parented onto it,
  /// so the original is left empty. Attach the copy with
  /// [`RuleTree::append_existing`].
  pub fn clone_with_selector(
    &mut self,
    id: NodeId,
    selector: impl Into<String>,
  ) -> Result<NodeId, RuleTreeError> {
    match self.get(id) {
      Some(node) if node.is_rule() => {}
      Some(_) => return Err(RuleTreeError::NotARule(id)),
      None => return Err(RuleTreeError::UnknownNode(id)),
    }

    let clone_id = self.nodes.len();
    let children = mem::take(&mut self.nodes[id].children);
    for child in &children {
      if let Some(node) = self.nodes.get_mut(*child) {
        node.parent = Some(clone_id);
      }
    }

    let mut clone = Node::new(NodeKind::rule(selector));
    clone.children = children;
    self.nodes.push(clone);

    Ok(clone_id)
  }

  /// Detaches `id` from its parent. The node keeps its own children.
  pub fn remove(&mut self, id: NodeId) -> Result<(), RuleTreeError> {
    if self.get(id).is_none() {
      return Err(RuleTreeError::UnknownNode(id));
    }
    if id == ROOT_NODE_ID {
      return Err(RuleTreeError::CannotRemoveRoot);
    }

    self.detach(id);
    Ok(())
  }

  fn detach(&mut self, id: NodeId) {
    let Some(parent) = self.nodes[id].parent.take() else {
      return;
    };
    if let Some(parent) = self.nodes.get_mut(parent) {
      parent.children.retain(|child| *child != id);
    }
  }

  fn ensure_container(&self, id: NodeId) -> Result<(), RuleTreeError> {
    match self.kind(id) {
      Some(kind) if kind.is_container() => Ok(()),
      Some(_) => Err(RuleTreeError::NotAContainer(id)),
      None => Err(RuleTreeError::UnknownNode(id)),
    }
  }

  /// Parents of `id`, nearest first.
  ///
  /// Stops after as many steps as there are nodes, so a corrupted parent
  /// chain cannot make iteration loop forever.
  pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
    Ancestors {
      tree: self,
      current: self.parent(id),
      remaining: self.nodes.len(),
    }
  }

  /// Whether the parent chain of `id` reaches the root.
  pub fn is_attached(&self, id: NodeId) -> bool {
    if id == ROOT_NODE_ID {
      return true;
    }
    self.ancestors(id).last() == Some(ROOT_NODE_ID)
  }

  /// Every node reachable from the root, in pre-order document order.
  pub fn walk(&self) -> Vec<NodeId> {
    let mut order = Vec::new();
    let mut seen = vec![false; self.nodes.len()];
    let mut stack = vec![ROOT_NODE_ID];

    while let Some(id) = stack.pop() {
      if seen.get(id).copied().unwrap_or(true) {
        continue;
      }
      seen[id] = true;
      order.push(id);
      stack.extend(self.children(id).iter().rev());
    }

    order
  }

  /// Ids of every attached rule in pre-order document order.
  ///
  /// The list is collected up front so callers can restructure the tree while
  /// iterating it.
  pub fn walk_rules(&self) -> Vec<NodeId> {
    self
      .walk()
      .into_iter()
      .filter(|id| self.is_rule(*id))
      .collect()
  }

  /// Checks that parent and child links agree and contain no cycles.
  pub fn validate(&self) -> Result<(), RuleTreeError> {
    if !self.is_root(ROOT_NODE_ID) {
      return Err(RuleTreeError::Malformed {
        node: ROOT_NODE_ID,
        reason: "first node is not the root".into(),
      });
    }

    let mut seen = vec![false; self.nodes.len()];
    let mut stack = vec![ROOT_NODE_ID];
    seen[ROOT_NODE_ID] = true;

    while let Some(id) = stack.pop() {
      let node = &self.nodes[id];
      if !node.children.is_empty() && !node.kind.is_container() {
        return Err(RuleTreeError::Malformed {
          node: id,
          reason: format!("{} node has children", node.kind.type_name()),
        });
      }

      for child in &node.children {
        let Some(child_node) = self.nodes.get(*child) else {
          return Err(RuleTreeError::Malformed {
            node: id,
            reason: format!("child {child} does not exist"),
          });
        };
        if child_node.parent != Some(id) {
          return Err(RuleTreeError::Malformed {
            node: *child,
            reason: format!(
              "listed as a child of {id} but its parent is {:?}",
              child_node.parent
            ),
          });
        }
        if seen[*child] {
          return Err(RuleTreeError::Malformed {
            node: *child,
            reason: "reachable more than once".into(),
          });
        }
        seen[*child] = true;
        stack.push(*child);
      }
    }

    for (id, node) in self.nodes.iter().enumerate() {
      if let Some(parent) = node.parent {
        if self.nodes.get(parent).is_none() {
          return Err(RuleTreeError::Malformed {
            node: id,
            reason: format!("parent {parent} does not exist"),
          });
        }
        if !self.nodes[parent].children.contains(&id) {
          return Err(RuleTreeError::Malformed {
            node: id,
            reason: format!("parent {parent} does not list it as a child"),
          });
        }
      }
    }

    Ok(())
  }

  pub fn to_css(&self) -> String {
    crate::stringify::stringify(self)
  }
}

pub struct Ancestors<'a> {
  tree: &'a RuleTree,
  current: Option<NodeId>,
  remaining: usize,
}

impl Iterator for Ancestors<'_> {
  type Item = NodeId;

  fn next(&mut self) -> Option<Self::Item> {
    if self.remaining == 0 {
      return None;
    }
    self.remaining -= 1;

    let id = self.current?;
    self.current = self.tree.parent(id);
    Some(id)
  }
}

#[cfg(test)]
mod tests {
  use pretty_assertions::assert_eq;

  use super::*;

  fn sample() -> (RuleTree, NodeId, NodeId, NodeId) {
    let mut tree = RuleTree::new();
    let a = tree.append_rule(ROOT_NODE_ID, ".a").unwrap();
    tree.append_declaration(a, "color", "red").unwrap();
    let b = tree.append_rule(a, ".b").unwrap();
    let decl = tree.append_declaration(b, "x", "y").unwrap();
    (tree, a, b, decl)
  }

  #[test]
  fn new_tree_only_holds_the_root() {
    let tree = RuleTree::new();

    assert_eq!(tree.len(), 1);
    assert!(tree.is_root(tree.root()));
    assert!(tree.is_empty());
    assert_eq!(tree.parent(tree.root()), None);
  }

  #[test]
  fn append_links_parent_and_child() {
    let (tree, a, b, decl) = sample();

    assert_eq!(tree.parent(b), Some(a));
    assert_eq!(tree.parent(decl), Some(b));
    assert_eq!(tree.children(a), &[2, b]);
    assert!(tree.has_declarations(b));
    assert_eq!(tree.selector(b), Some(".b"));
  }

  #[test]
  fn append_rejects_leaf_parents_and_unknown_ids() {
    let (mut tree, _, _, decl) = sample();

    assert_eq!(
      tree.append_rule(decl, ".c"),
      Err(RuleTreeError::NotAContainer(decl))
    );
    assert_eq!(
      tree.append_rule(99, ".c"),
      Err(RuleTreeError::UnknownNode(99))
    );
    assert_eq!(
      tree.append(ROOT_NODE_ID, NodeKind::Root),
      Err(RuleTreeError::DuplicateRoot)
    );
  }

  #[test]
  fn clone_with_selector_adopts_children() {
    let (mut tree, _, b, decl) = sample();

    let clone = tree.clone_with_selector(b, ".a .b").unwrap();

    assert_eq!(tree.selector(clone), Some(".a .b"));
    assert_eq!(tree.children(clone), &[decl]);
    assert_eq!(tree.parent(decl), Some(clone));
    assert!(tree.children(b).is_empty());
    assert_eq!(tree.parent(clone), None);
  }

  #[test]
  fn remove_detaches_node() {
    let (mut tree, a, b, _) = sample();

    tree.remove(b).unwrap();

    assert_eq!(tree.parent(b), None);
    assert_eq!(tree.children(a).len(), 1);
    assert!(!tree.is_attached(b));
    assert_eq!(tree.remove(ROOT_NODE_ID), Err(RuleTreeError::CannotRemoveRoot));
  }

  #[test]
  fn append_existing_moves_node() {
    let (mut tree, a, b, _) = sample();

    tree.append_existing(ROOT_NODE_ID, b).unwrap();

    assert_eq!(tree.children(ROOT_NODE_ID), &[a, b]);
    assert_eq!(tree.parent(b), Some(ROOT_NODE_ID));
    assert_eq!(tree.children(a).len(), 1);
    tree.validate().unwrap();
  }

  #[test]
  fn append_existing_refuses_cycles() {
    let (mut tree, a, b, _) = sample();

    assert_eq!(
      tree.append_existing(b, a),
      Err(RuleTreeError::WouldCreateCycle { node: a, parent: b })
    );
  }

  #[test]
  fn walk_rules_is_pre_order() {
    let mut tree = RuleTree::new();
    let a = tree.append_rule(ROOT_NODE_ID, ".a").unwrap();
    let b = tree.append_rule(a, ".b").unwrap();
    let c = tree.append_rule(b, ".c").unwrap();
    let d = tree.append_rule(a, ".d").unwrap();
    let media = tree.append_at_rule(ROOT_NODE_ID, "media", "print").unwrap();
    let e = tree.append_rule(media, ".e").unwrap();

    assert_eq!(tree.walk_rules(), vec![a, b, c, d, e]);
  }

  #[test]
  fn ancestors_stop_on_cycles() {
    let (mut tree, a, b, _) = sample();
    tree.get_mut(a).unwrap().parent = Some(b);

    assert_eq!(tree.ancestors(b).count(), tree.len());
    assert!(!tree.is_attached(b));
  }

  #[test]
  fn validate_reports_mismatched_links() {
    let (mut tree, a, b, _) = sample();
    tree.get_mut(b).unwrap().parent = Some(ROOT_NODE_ID);

    let error = tree.validate().unwrap_err();

    assert!(matches!(error, RuleTreeError::Malformed { node, .. } if node == b));
    assert_eq!(tree.parent(a), Some(ROOT_NODE_ID));
  }

  #[test]
  fn validate_reports_dangling_children() {
    let (mut tree, a, _, _) = sample();
    tree.get_mut(a).unwrap().children.push(42);

    assert!(matches!(
      tree.validate(),
      Err(RuleTreeError::Malformed { node, .. }) if node == a
    ));
  }
}
