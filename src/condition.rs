//! Condition evaluation for data-dependent answers.
//!
//! A `predict_output` question carries several candidate answers; each may be
//! guarded by conditions such as `<#value:1#> <#operator:1#> <#value:2#>`.
//! Once the instance's values are drawn, exactly one candidate is reachable.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::context::ResolutionContext;
use crate::domain::AnswerDef;
use crate::error::ContentError;
use crate::resolver::substitute_references;

/// Comparison operators usable in code templates and conditions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CompareOp {
  Gt,
  Ge,
  Lt,
  Le,
  Eq,
  Ne,
}

impl CompareOp {
  pub const ALL: [CompareOp; 6] =
    [CompareOp::Gt, CompareOp::Ge, CompareOp::Lt, CompareOp::Le, CompareOp::Eq, CompareOp::Ne];

  pub fn symbol(&self) -> &'static str {
    match self {
      CompareOp::Gt => ">",
      CompareOp::Ge => ">=",
      CompareOp::Lt => "<",
      CompareOp::Le => "<=",
      CompareOp::Eq => "==",
      CompareOp::Ne => "!=",
    }
  }

  pub fn random<R: Rng + ?Sized>(rng: &mut R) -> CompareOp {
    *Self::ALL.choose(rng).unwrap_or(&CompareOp::Eq)
  }

  pub fn holds(&self, ord: Ordering) -> bool {
    match self {
      CompareOp::Gt => ord == Ordering::Greater,
      CompareOp::Ge => ord != Ordering::Less,
      CompareOp::Lt => ord == Ordering::Less,
      CompareOp::Le => ord != Ordering::Greater,
      CompareOp::Eq => ord == Ordering::Equal,
      CompareOp::Ne => ord != Ordering::Equal,
    }
  }
}

impl fmt::Display for CompareOp {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.symbol())
  }
}

impl FromStr for CompareOp {
  type Err = ContentError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Self::ALL
      .iter()
      .find(|op| op.symbol() == s.trim())
      .copied()
      .ok_or_else(|| ContentError::UnknownOperator(s.to_string()))
  }
}

/// `left check right`; each part may hold back-references into the context.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
  pub left: String,
  pub check: String,
  pub right: String,
}

impl Condition {
  pub fn new(left: impl Into<String>, check: impl Into<String>, right: impl Into<String>) -> Self {
    Self { left: left.into(), check: check.into(), right: right.into() }
  }
}

/// Evaluate one condition against the instance's context.
/// Both sides integers: numeric comparison. Otherwise: lexicographic.
pub fn evaluate(condition: &Condition, ctx: &ResolutionContext) -> Result<bool, ContentError> {
  let left = substitute_references(&condition.left, ctx)?;
  let right = substitute_references(&condition.right, ctx)?;
  let op: CompareOp = substitute_references(&condition.check, ctx)?.parse()?;

  let ord = match (left.trim().parse::<i64>(), right.trim().parse::<i64>()) {
    (Ok(l), Ok(r)) => l.cmp(&r),
    _ => left.as_str().cmp(right.as_str()),
  };
  let holds = op.holds(ord);
  debug!(target: "question", %left, %op, %right, holds, "Condition evaluated");
  Ok(holds)
}

/// First unconditioned candidate wins; a conditioned one wins if any of its conditions holds.
pub fn select_answer<'a>(
  candidates: &'a [AnswerDef],
  ctx: &ResolutionContext,
) -> Result<(usize, &'a AnswerDef), ContentError> {
  for (i, candidate) in candidates.iter().enumerate() {
    if candidate.conditions.is_empty() {
      return Ok((i, candidate));
    }
    for condition in &candidate.conditions {
      if evaluate(condition, ctx)? {
        return Ok((i, candidate));
      }
    }
  }
  Err(ContentError::NoMatchingAnswer)
}
