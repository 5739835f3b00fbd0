//! Placeholder resolution for question templates.
//!
//! Templates use Xcode-style `<#...#>` tokens. Resolution runs a fixed, ordered
//! list of stages over one `ResolutionContext`; each stage sees the output of
//! the previous one:
//!
//! 1. `<#letvar#>`                       -> `let` | `var`
//! 2. `<#bool#>`                         -> `true` | `false`
//! 3. `<#int#>` `<#string#>` `<#boolvar#>` -> fresh variable name
//! 4. `<#tiny#>` `<#small#>` `<#medium#>` -> random integer
//! 5. `<#op#>`                           -> random comparison operator
//! 6. `<#name:N#>` `<#natural:N#>` `<#text:N#>` `<#value:N#>` `<#operator:N#>`
//!    (optionally `|capitalized`, `|uppercased`, `|lowercased`, `|count`)
//! 7. `<#= expr #>`                      -> integer arithmetic result
//!
//! `<#any-...#>` tokens belong to reference answers and are left alone.

use std::sync::OnceLock;

use rand::seq::SliceRandom;
use rand::{Rng, RngCore};
use regex::Regex;
use tracing::trace;

use crate::arith;
use crate::condition::CompareOp;
use crate::context::{NamedVar, ResolutionContext, VarKind};
use crate::domain::{NameEntry, NamePools, NumberRanges};
use crate::error::ContentError;
use crate::matcher::WILDCARD_PREFIX;
use crate::util::{capitalize_first, try_replace_all};

static MUTABILITY_RE: OnceLock<Regex> = OnceLock::new();
static BOOL_RE: OnceLock<Regex> = OnceLock::new();
static NEW_NAME_RE: OnceLock<Regex> = OnceLock::new();
static NUMBER_RE: OnceLock<Regex> = OnceLock::new();
static OPERATOR_RE: OnceLock<Regex> = OnceLock::new();
static REFERENCE_RE: OnceLock<Regex> = OnceLock::new();
static ARITH_RE: OnceLock<Regex> = OnceLock::new();
static LEFTOVER_RE: OnceLock<Regex> = OnceLock::new();

fn re(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
  cell.get_or_init(|| Regex::new(pattern).expect("static placeholder regex"))
}

/// Everything one stage needs: the immutable pools plus this instance's context and randomness.
struct Pass<'a, 'r> {
  pools: &'a NamePools,
  ranges: NumberRanges,
  ctx: &'a mut ResolutionContext,
  rng: &'a mut (dyn RngCore + 'r),
}

type Stage = for<'a, 'r> fn(&str, &mut Pass<'a, 'r>) -> Result<String, ContentError>;

const STAGES: [(&str, Stage); 7] = [
  ("mutability", resolve_mutability),
  ("bool", resolve_bools),
  ("new_names", resolve_new_names),
  ("numbers", resolve_numbers),
  ("operators", resolve_operators),
  ("references", resolve_references),
  ("arithmetic", resolve_arithmetic),
];

pub struct Resolver<'a> {
  pools: &'a NamePools,
  ranges: NumberRanges,
}

impl<'a> Resolver<'a> {
  pub fn new(pools: &'a NamePools, ranges: NumberRanges) -> Self {
    Self { pools, ranges }
  }

  /// Expand every placeholder of `template`, drawing new names/values into `ctx`.
  ///
  /// Already-resolved text passes through unchanged: the token vocabulary never
  /// appears in replacement values.
  pub fn resolve(
    &self,
    template: &str,
    ctx: &mut ResolutionContext,
    rng: &mut dyn RngCore,
  ) -> Result<String, ContentError> {
    if template.is_empty() {
      return Ok(String::new());
    }
    let mut pass = Pass { pools: self.pools, ranges: self.ranges, ctx, rng };
    let mut text = template.to_string();
    for (name, stage) in STAGES {
      let next = stage(&text, &mut pass)?;
      if next != text {
        trace!(target: "question", stage = name, "Template stage applied");
      }
      text = next;
    }

    let leftover = re(&LEFTOVER_RE, r"<#[^#\n]*#>");
    if let Some(m) = leftover.find_iter(&text).find(|m| !m.as_str().starts_with(WILDCARD_PREFIX)) {
      return Err(ContentError::UnresolvedPlaceholder(m.as_str().to_string()));
    }
    Ok(text)
  }
}

fn resolve_mutability(text: &str, pass: &mut Pass<'_, '_>) -> Result<String, ContentError> {
  try_replace_all(re(&MUTABILITY_RE, r"<#letvar#>"), text, |_| {
    Ok(if pass.rng.gen_bool(0.5) { "let" } else { "var" }.to_string())
  })
}

fn resolve_bools(text: &str, pass: &mut Pass<'_, '_>) -> Result<String, ContentError> {
  try_replace_all(re(&BOOL_RE, r"<#bool#>"), text, |_| {
    Ok(pass.rng.gen_bool(0.5).to_string())
  })
}

fn resolve_new_names(text: &str, pass: &mut Pass<'_, '_>) -> Result<String, ContentError> {
  try_replace_all(re(&NEW_NAME_RE, r"<#(int|string|boolvar)#>"), text, |caps| {
    let pools = pass.pools;
    let (kind, pool) = match &caps[1] {
      "int" => (VarKind::Integer, &pools.integer),
      "string" => (VarKind::String, &pools.string),
      _ => (VarKind::Boolean, &pools.boolean),
    };
    let fresh: Vec<&NameEntry> = pool.iter().filter(|e| !pass.ctx.has_name(&e.name)).collect();
    let entry = *fresh
      .choose(&mut *pass.rng)
      .ok_or(ContentError::NamePoolExhausted { kind: kind.as_str() })?;

    let natural = entry.natural_name();
    let text_value = match kind {
      VarKind::String => Some(
        entry
          .values
          .choose(&mut *pass.rng)
          .cloned()
          .unwrap_or_else(|| capitalize_first(&natural)),
      ),
      _ => None,
    };
    pass.ctx.names.push(NamedVar {
      name: entry.name.clone(),
      natural,
      kind,
      text: text_value,
    });
    Ok(entry.name.clone())
  })
}

fn resolve_numbers(text: &str, pass: &mut Pass<'_, '_>) -> Result<String, ContentError> {
  try_replace_all(re(&NUMBER_RE, r"<#(tiny|small|medium)#>"), text, |caps| {
    let (lo, hi) = match &caps[1] {
      "tiny" => pass.ranges.tiny,
      "small" => pass.ranges.small,
      _ => pass.ranges.medium,
    };
    let n = pass.rng.gen_range(lo.min(hi)..=hi.max(lo)).to_string();
    pass.ctx.values.push(n.clone());
    Ok(n)
  })
}

fn resolve_operators(text: &str, pass: &mut Pass<'_, '_>) -> Result<String, ContentError> {
  try_replace_all(re(&OPERATOR_RE, r"<#op#>"), text, |_| {
    let op = CompareOp::random(&mut *pass.rng);
    pass.ctx.operators.push(op);
    Ok(op.to_string())
  })
}

fn resolve_references(text: &str, pass: &mut Pass<'_, '_>) -> Result<String, ContentError> {
  substitute_references(text, pass.ctx)
}

fn resolve_arithmetic(text: &str, _pass: &mut Pass<'_, '_>) -> Result<String, ContentError> {
  try_replace_all(re(&ARITH_RE, r"<#=([^#]*)#>"), text, |caps| {
    let expr = caps[1].trim();
    arith::evaluate(expr)
      .map(|n| n.to_string())
      .map_err(|reason| ContentError::Arithmetic { expr: expr.to_string(), reason })
  })
}

/// Stage 6 on its own: substitute back-references from an existing context.
/// Used directly by the condition evaluator, which must never draw new values.
pub fn substitute_references(text: &str, ctx: &ResolutionContext) -> Result<String, ContentError> {
  let pattern = re(
    &REFERENCE_RE,
    r"<#(name|natural|text|value|operator):(\d+)((?:\|[a-z]+)*)#>",
  );
  try_replace_all(pattern, text, |caps| {
    let index: usize = caps[2].parse().unwrap_or(0);
    let raw = match &caps[1] {
      "name" => ctx.name(index)?.name.clone(),
      "natural" => ctx.name(index)?.natural.clone(),
      "text" => ctx.text(index)?.to_string(),
      "value" => ctx.value(index)?.to_string(),
      _ => ctx.operator(index)?.to_string(),
    };
    caps[3]
      .split('|')
      .filter(|f| !f.is_empty())
      .try_fold(raw, |acc, filter| apply_filter(&acc, filter))
  })
}

fn apply_filter(value: &str, filter: &str) -> Result<String, ContentError> {
  match filter {
    "capitalized" => Ok(capitalize_first(value)),
    "uppercased" => Ok(value.to_uppercase()),
    "lowercased" => Ok(value.to_lowercase()),
    "count" => Ok(value.chars().count().to_string()),
    other => Err(ContentError::UnknownFilter(other.to_string())),
  }
}
