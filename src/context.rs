//! Per-instance resolution context.
//!
//! Created once per question instance and threaded through every template
//! resolution of that instance, so prompt, code, answers and hint agree on
//! names and values. Never shared between instances.

use crate::condition::CompareOp;
use crate::error::ContentError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VarKind {
  Integer,
  String,
  Boolean,
}

impl VarKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      VarKind::Integer => "integer",
      VarKind::String => "string",
      VarKind::Boolean => "boolean",
    }
  }
}

/// A variable name drawn for this instance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NamedVar {
  pub name: String,
  pub natural: String,
  pub kind: VarKind,
  /// The sample value bound to this name (string names only).
  pub text: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResolutionContext {
  pub names: Vec<NamedVar>,
  pub values: Vec<String>,
  pub operators: Vec<CompareOp>,
}

impl ResolutionContext {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn has_name(&self, name: &str) -> bool {
    self.names.iter().any(|v| v.name == name)
  }

  /// 1-based lookup, as written in templates.
  pub fn name(&self, index: usize) -> Result<&NamedVar, ContentError> {
    nth(&self.names, index, "name")
  }

  pub fn value(&self, index: usize) -> Result<&str, ContentError> {
    nth(&self.values, index, "value").map(String::as_str)
  }

  pub fn operator(&self, index: usize) -> Result<CompareOp, ContentError> {
    nth(&self.operators, index, "operator").copied()
  }

  pub fn text(&self, index: usize) -> Result<&str, ContentError> {
    let var = self.name(index)?;
    var.text.as_deref().ok_or(ContentError::UnknownBackReference {
      kind: "text",
      index,
      available: self.names.iter().filter(|v| v.text.is_some()).count(),
    })
  }
}

fn nth<'a, T>(items: &'a [T], index: usize, kind: &'static str) -> Result<&'a T, ContentError> {
  index
    .checked_sub(1)
    .and_then(|i| items.get(i))
    .ok_or(ContentError::UnknownBackReference { kind, index, available: items.len() })
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn lookups_are_one_based_and_bounded() {
    let mut ctx = ResolutionContext::new();
    ctx.values.push("7".into());
    assert_eq!(ctx.value(1).unwrap(), "7");
    assert!(matches!(
      ctx.value(0),
      Err(ContentError::UnknownBackReference { kind: "value", index: 0, available: 1 })
    ));
    assert!(matches!(ctx.value(2), Err(ContentError::UnknownBackReference { .. })));
  }

  #[test]
  fn text_requires_a_string_name() {
    let mut ctx = ResolutionContext::new();
    ctx.names.push(NamedVar {
      name: "age".into(),
      natural: "age".into(),
      kind: VarKind::Integer,
      text: None,
    });
    assert!(ctx.has_name("age"));
    assert!(ctx.text(1).is_err());
  }
}
