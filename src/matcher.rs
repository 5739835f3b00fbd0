//! Structural answer matching for free-coding questions.
//!
//! A canonical reference answer is turned into a permissive, anchored regex.
//! The pattern is built as a list of pieces: literal text still waiting to be
//! escaped, and regex fragments produced by earlier rules. Each rule only
//! rewrites literal pieces, so a rule can never mangle regex syntax emitted by
//! another one (e.g. the `:` inside `(?:` is out of reach of the colon rule).
//!
//! Rules, in order:
//! 1. declaration type annotations become optional; where the reference has
//!    none, an arbitrary annotation is allowed
//! 2. `<#any-mut#>` matches `let` or `var`
//! 3. `<#any-string#>` / `<#any-number#>` become capture groups
//! 4. free whitespace around `(` `)` `,` `:` `{` `}`
//! 5. every remaining single space becomes ` *`

use std::sync::OnceLock;

use regex::{Captures, Regex};
use tracing::{debug, trace};

use crate::error::ContentError;

/// Reference-answer wildcards (`<#any-mut#>`, `<#any-string#>`, `<#any-number#>`) start with this.
/// The template resolver leaves them in place for the matcher.
pub const WILDCARD_PREFIX: &str = "<#any-";

#[derive(Clone, Debug, PartialEq, Eq)]
enum Piece {
  Lit(String),
  Pat(String),
}

struct Rule {
  name: &'static str,
  find: fn() -> &'static Regex,
  expand: fn(&Captures) -> Vec<Piece>,
}

static DECLARATION_RE: OnceLock<Regex> = OnceLock::new();
static ANY_MUT_RE: OnceLock<Regex> = OnceLock::new();
static ANY_VALUE_RE: OnceLock<Regex> = OnceLock::new();
static PUNCT_RE: OnceLock<Regex> = OnceLock::new();
static SPACE_RE: OnceLock<Regex> = OnceLock::new();

fn re(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
  cell.get_or_init(|| Regex::new(pattern).expect("static matcher regex"))
}

const RULES: [Rule; 5] = [
  Rule { name: "optional_type_annotation", find: declaration_re, expand: expand_declaration },
  Rule { name: "any_mutability", find: any_mut_re, expand: expand_any_mut },
  Rule { name: "value_captures", find: any_value_re, expand: expand_any_value },
  Rule { name: "flexible_punctuation", find: punct_re, expand: expand_punct },
  Rule { name: "optional_spaces", find: space_re, expand: expand_space },
];

fn declaration_re() -> &'static Regex {
  re(&DECLARATION_RE, r"(?m)^((?:if |guard )?(?:let|var|<#any-mut#>) [^:=\n]+?)(: [^=\n]+?)? =")
}

fn expand_declaration(c: &Captures) -> Vec<Piece> {
  let mut out = vec![Piece::Lit(c[1].to_string())];
  match c.get(2) {
    Some(annotation) => {
      out.push(Piece::Pat("(?:".into()));
      out.push(Piece::Lit(annotation.as_str().to_string()));
      out.push(Piece::Pat(")?".into()));
    }
    None => out.push(Piece::Pat(r"(?: *: *[^=\n]+?)?".into())),
  }
  out.push(Piece::Lit(" =".into()));
  out
}

fn any_mut_re() -> &'static Regex {
  re(&ANY_MUT_RE, r"<#any-mut#>")
}

fn expand_any_mut(_: &Captures) -> Vec<Piece> {
  vec![Piece::Pat("(?:let|var)".into())]
}

fn any_value_re() -> &'static Regex {
  re(&ANY_VALUE_RE, r"<#any-(string|number)#>")
}

fn expand_any_value(c: &Captures) -> Vec<Piece> {
  match &c[1] {
    "string" => vec![Piece::Pat(r#"([^"\n]*)"#.into())],
    _ => vec![Piece::Pat(r"(-?\d+(?:\.\d+)?)".into())],
  }
}

fn punct_re() -> &'static Regex {
  re(&PUNCT_RE, r"\s*([(),:{}])\s*")
}

fn expand_punct(c: &Captures) -> Vec<Piece> {
  vec![Piece::Pat(r"\s*".into()), Piece::Lit(c[1].to_string()), Piece::Pat(r"\s*".into())]
}

fn space_re() -> &'static Regex {
  re(&SPACE_RE, r" ")
}

fn expand_space(_: &Captures) -> Vec<Piece> {
  vec![Piece::Pat(" *".into())]
}

fn apply(rule: &Rule, pieces: Vec<Piece>) -> Vec<Piece> {
  let find = (rule.find)();
  let mut out = Vec::with_capacity(pieces.len());
  for piece in pieces {
    let text = match piece {
      Piece::Lit(text) => text,
      pat => {
        out.push(pat);
        continue;
      }
    };
    let mut last = 0;
    for caps in find.captures_iter(&text) {
      let Some(m) = caps.get(0) else { continue };
      if m.start() > last {
        out.push(Piece::Lit(text[last..m.start()].to_string()));
      }
      out.extend((rule.expand)(&caps));
      last = m.end();
    }
    if last < text.len() {
      out.push(Piece::Lit(text[last..].to_string()));
    }
  }
  out
}

/// Run the rule list over a canonical reference and render the final pattern source.
fn pattern_source(reference: &str) -> String {
  let mut pieces = vec![Piece::Lit(reference.to_string())];
  for rule in &RULES {
    pieces = apply(rule, pieces);
    trace!(target: "question", rule = rule.name, pieces = pieces.len(), "Matcher rule applied");
  }
  let body: String = pieces
    .iter()
    .map(|p| match p {
      Piece::Lit(text) => regex::escape(text),
      Piece::Pat(src) => src.clone(),
    })
    .collect();
  format!(r"\A{body}\z")
}

/// Compiled matcher for one canonical reference answer.
#[derive(Clone, Debug)]
pub struct AnswerMatcher {
  regex: Regex,
}

/// Outcome of checking one submission against one matcher.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MatchOutcome {
  pub is_match: bool,
  pub captures: Vec<String>,
}

impl AnswerMatcher {
  /// Build from a canonical (already normalized) reference answer.
  pub fn build(canonical_reference: &str) -> Result<Self, ContentError> {
    if canonical_reference.trim().is_empty() {
      return Err(ContentError::EmptyReferenceAnswer);
    }
    let source = pattern_source(canonical_reference);
    let regex = Regex::new(&source).map_err(|source| ContentError::InvalidPattern {
      reference: canonical_reference.to_string(),
      source,
    })?;
    debug!(target: "question", rules = RULES.len(), pattern_len = regex.as_str().len(), "Answer matcher built");
    Ok(Self { regex })
  }

  pub fn pattern(&self) -> &str {
    self.regex.as_str()
  }

  /// Test a canonical submission. Captured groups are returned for display only.
  pub fn matches(&self, canonical_submission: &str) -> MatchOutcome {
    if canonical_submission.trim().is_empty() {
      return MatchOutcome::default();
    }
    match self.regex.captures(canonical_submission) {
      Some(caps) => MatchOutcome {
        is_match: true,
        captures: caps
          .iter()
          .skip(1)
          .map(|g| g.map(|m| m.as_str().to_string()).unwrap_or_default())
          .collect(),
      },
      None => MatchOutcome::default(),
    }
  }
}

/// Accept if any matcher accepts. Returns the first successful outcome.
pub fn match_any(matchers: &[AnswerMatcher], canonical_submission: &str) -> MatchOutcome {
  if canonical_submission.trim().is_empty() {
    return MatchOutcome::default();
  }
  matchers
    .iter()
    .map(|m| m.matches(canonical_submission))
    .find(|o| o.is_match)
    .unwrap_or_default()
}
