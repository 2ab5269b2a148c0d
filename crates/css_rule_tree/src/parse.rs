use crate::error::CssSyntaxError;
use crate::tree::{NodeId, NodeKind, RuleTree, ROOT_NODE_ID};

const IMPORTANT: &str = "!important";

/// Parse stylesheet source into a [`RuleTree`].
///
/// Rules may be nested inside other rules and at-rules. Comments are kept as
/// comment nodes; whitespace between nodes is not preserved.
#[tracing::instrument(level = "debug", skip_all, fields(len = css.len()))]
pub fn parse(css: &str) -> Result<RuleTree, CssSyntaxError> {
  let mut parser = Parser {
    css,
    pos: 0,
    tree: RuleTree::new(),
  };
  parser.block(ROOT_NODE_ID, None)?;

  tracing::trace!(nodes = parser.tree.len(), "Parsed stylesheet");
  Ok(parser.tree)
}

/// What stopped [`Parser::prelude`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Terminator {
  OpenCurly,
  Semicolon,
  CloseCurly,
  End,
}

struct Parser<'a> {
  css: &'a str,
  pos: usize,
  tree: RuleTree,
}

impl<'a> Parser<'a> {
  fn peek(&self) -> Option<char> {
    self.css[self.pos..].chars().next()
  }

  fn rest_starts_with(&self, pattern: &str) -> bool {
    self.css[self.pos..].starts_with(pattern)
  }

  fn error(&self, offset: usize, reason: &str) -> CssSyntaxError {
    CssSyntaxError::at(self.css, offset, reason)
  }

  fn skip_whitespace(&mut self) {
    while let Some(ch) = self.peek() {
      if !ch.is_whitespace() {
        break;
      }
      self.pos += ch.len_utf8();
    }
  }

  fn append(
    &mut self,
    parent: NodeId,
    kind: NodeKind,
    offset: usize,
  ) -> Result<NodeId, CssSyntaxError> {
    let css = self.css;
    self
      .tree
      .append(parent, kind)
      .map_err(|err| CssSyntaxError::at(css, offset, err.to_string()))
  }

  /// Parse the contents of `parent`. `open` is the offset of the `{` that
  /// started the block, or `None` for the stylesheet itself.
  fn block(&mut self, parent: NodeId, open: Option<usize>) -> Result<(), CssSyntaxError> {
    loop {
      self.skip_whitespace();

      match self.peek() {
        None => {
          return match open {
            Some(offset) => Err(self.error(offset, "Unclosed block")),
            None => Ok(()),
          };
        }
        Some('}') => {
          if open.is_none() {
            return Err(self.error(self.pos, "Unexpected }"));
          }
          self.pos += 1;
          return Ok(());
        }
        Some(';') => self.pos += 1,
        Some('@') => self.at_rule(parent)?,
        Some('/') if self.rest_starts_with("/*") => self.comment(parent)?,
        Some(_) => self.rule_or_declaration(parent)?,
      }
    }
  }

  fn comment(&mut self, parent: NodeId) -> Result<(), CssSyntaxError> {
    let start = self.pos;
    let body_start = start + 2;
    let Some(length) = self.css[body_start..].find("*/") else {
      return Err(self.error(start, "Unclosed comment"));
    };

    let text = self.css[body_start..body_start + length].trim().to_string();
    self.pos = body_start + length + 2;
    self.append(parent, NodeKind::comment(text), start)?;

    Ok(())
  }

  fn at_rule(&mut self, parent: NodeId) -> Result<(), CssSyntaxError> {
    let start = self.pos;
    self.pos += 1;

    let name_start = self.pos;
    while let Some(ch) = self.peek() {
      if !(ch.is_alphanumeric() || ch == '-' || ch == '_') {
        break;
      }
      self.pos += ch.len_utf8();
    }
    let name = self.css[name_start..self.pos].to_string();
    if name.is_empty() {
      return Err(self.error(start, "At-rule without name"));
    }

    let (params, terminator) = self.prelude()?;
    let kind = NodeKind::AtRule {
      name,
      params: params.trim().to_string(),
      block: terminator == Terminator::OpenCurly,
    };
    let node = self.append(parent, kind, start)?;

    match terminator {
      Terminator::OpenCurly => {
        let open = self.pos;
        self.pos += 1;
        self.block(node, Some(open))
      }
      Terminator::Semicolon => {
        self.pos += 1;
        Ok(())
      }
      Terminator::CloseCurly | Terminator::End => Ok(()),
    }
  }

  fn rule_or_declaration(&mut self, parent: NodeId) -> Result<(), CssSyntaxError> {
    let start = self.pos;
    let (text, terminator) = self.prelude()?;

    if terminator == Terminator::OpenCurly {
      let rule = self.append(parent, NodeKind::rule(text.trim()), start)?;
      let open = self.pos;
      self.pos += 1;
      return self.block(rule, Some(open));
    }

    if parent == ROOT_NODE_ID {
      return Err(self.error(start, "Unknown word"));
    }
    let Some(declaration) = declaration(&text) else {
      return Err(self.error(start, "Unknown word"));
    };
    self.append(parent, declaration, start)?;

    if terminator == Terminator::Semicolon {
      self.pos += 1;
    }
    Ok(())
  }

  /// Read text up to the next top level `{`, `;` or `}`, leaving the
  /// terminator unconsumed. Comments inside the text are dropped.
  fn prelude(&mut self) -> Result<(String, Terminator), CssSyntaxError> {
    let mut text = String::new();
    let mut depth = 0u32;

    while let Some(ch) = self.peek() {
      match ch {
        '{' if depth == 0 => return Ok((text, Terminator::OpenCurly)),
        ';' if depth == 0 => return Ok((text, Terminator::Semicolon)),
        '}' if depth == 0 => return Ok((text, Terminator::CloseCurly)),
        '/' if self.rest_starts_with("/*") => {
          let start = self.pos;
          match self.css[start + 2..].find("*/") {
            Some(length) => self.pos = start + 2 + length + 2,
            None => return Err(self.error(start, "Unclosed comment")),
          }
          continue;
        }
        '"' | '\'' => {
          text.push_str(self.string(ch)?);
          continue;
        }
        '\\' => {
          text.push(ch);
          self.pos += 1;
          if let Some(escaped) = self.peek() {
            text.push(escaped);
            self.pos += escaped.len_utf8();
          }
          continue;
        }
        '(' | '[' => depth += 1,
        ')' | ']' => depth = depth.saturating_sub(1),
        _ => {}
      }

      text.push(ch);
      self.pos += ch.len_utf8();
    }

    Ok((text, Terminator::End))
  }

  /// Consume a quoted string starting at the current position.
  fn string(&mut self, quote: char) -> Result<&'a str, CssSyntaxError> {
    let css = self.css;
    let start = self.pos;
    let mut escaped = false;

    for (index, ch) in css[start + 1..].char_indices() {
      if escaped {
        escaped = false;
      } else if ch == '\\' {
        escaped = true;
      } else if ch == quote {
        let end = start + 1 + index + 1;
        self.pos = end;
        return Ok(&css[start..end]);
      } else if ch == '\n' {
        break;
      }
    }

    Err(self.error(start, "Unclosed string"))
  }
}

fn declaration(text: &str) -> Option<NodeKind> {
  let colon = top_level_colon(text)?;
  let prop = text[..colon].trim();
  if prop.is_empty() {
    return None;
  }

  let mut value = text[colon + 1..].trim();
  let mut important = false;
  let lowered = value.to_ascii_lowercase();
  if let Some(stripped) = lowered.strip_suffix(IMPORTANT) {
    value = value[..stripped.len()].trim_end();
    important = true;
  }

  Some(NodeKind::Declaration {
    prop: prop.to_string(),
    value: value.to_string(),
    important,
  })
}

fn top_level_colon(text: &str) -> Option<usize> {
  let mut depth = 0u32;
  let mut quote: Option<char> = None;

  for (index, ch) in text.char_indices() {
    if let Some(open) = quote {
      if ch == open {
        quote = None;
      }
      continue;
    }
    match ch {
      '"' | '\'' => quote = Some(ch),
      '(' | '[' => depth += 1,
      ')' | ']' => depth = depth.saturating_sub(1),
      ':' if depth == 0 => return Some(index),
      _ => {}
    }
  }

  None
}
