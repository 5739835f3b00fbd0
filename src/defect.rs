//! Single-defect injection for "spot the error" questions.
//!
//! Each category knows how to find its candidate sites in a clean sample. One
//! site is picked at random and exactly one edit is applied. The reported line
//! is either structurally known (where the compiler would complain) or the
//! first line that differs from the original.

use std::fmt;
use std::ops::Range;
use std::sync::OnceLock;

use rand::seq::SliceRandom;
use rand::Rng;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ContentError;
use crate::util::capitalize_first;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefectKind {
  WrongReturnType,
  MissingBrace,
  MissingQuote,
  MissingDeclarationKeyword,
  MisspelledKeyword,
  ColonSemicolonSwap,
  MissingUnderscoreLabel,
  WrongCallCasing,
}

impl DefectKind {
  pub const ALL: [DefectKind; 8] = [
    DefectKind::WrongReturnType,
    DefectKind::MissingBrace,
    DefectKind::MissingQuote,
    DefectKind::MissingDeclarationKeyword,
    DefectKind::MisspelledKeyword,
    DefectKind::ColonSemicolonSwap,
    DefectKind::MissingUnderscoreLabel,
    DefectKind::WrongCallCasing,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      DefectKind::WrongReturnType => "wrong_return_type",
      DefectKind::MissingBrace => "missing_brace",
      DefectKind::MissingQuote => "missing_quote",
      DefectKind::MissingDeclarationKeyword => "missing_declaration_keyword",
      DefectKind::MisspelledKeyword => "misspelled_keyword",
      DefectKind::ColonSemicolonSwap => "colon_semicolon_swap",
      DefectKind::MissingUnderscoreLabel => "missing_underscore_label",
      DefectKind::WrongCallCasing => "wrong_call_casing",
    }
  }

  /// Short explanation shown once the user has answered.
  pub fn explanation(&self) -> &'static str {
    match self {
      DefectKind::WrongReturnType => "The declared return type does not match the returned value.",
      DefectKind::MissingBrace => "A brace is missing.",
      DefectKind::MissingQuote => "A string literal is not closed.",
      DefectKind::MissingDeclarationKeyword => "A variable is used without `let` or `var`.",
      DefectKind::MisspelledKeyword => "A keyword is misspelled.",
      DefectKind::ColonSemicolonSwap => "A colon was replaced by a semicolon.",
      DefectKind::MissingUnderscoreLabel => "The call omits an argument label the function now requires.",
      DefectKind::WrongCallCasing => "The function is called with the wrong capitalization.",
    }
  }
}

impl fmt::Display for DefectKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// One injected defect. `line` is 0-based.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DefectRecord {
  pub kind: DefectKind,
  pub code: String,
  pub line: usize,
}

/// A single candidate edit: replace `range` with `replacement`.
#[derive(Clone, Debug)]
struct Site {
  range: Range<usize>,
  replacement: String,
  /// Where the error surfaces, when that is not the edited line.
  line: Option<usize>,
}

static RETURN_TYPE_RE: OnceLock<Regex> = OnceLock::new();
static RETURN_RE: OnceLock<Regex> = OnceLock::new();
static STRING_RE: OnceLock<Regex> = OnceLock::new();
static DECLARATION_RE: OnceLock<Regex> = OnceLock::new();
static KEYWORD_RE: OnceLock<Regex> = OnceLock::new();
static COLON_RE: OnceLock<Regex> = OnceLock::new();
static UNDERSCORE_RE: OnceLock<Regex> = OnceLock::new();
static FUNC_NAME_RE: OnceLock<Regex> = OnceLock::new();

fn re(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
  cell.get_or_init(|| Regex::new(pattern).expect("static defect regex"))
}

const TYPE_SWAPS: [(&str, &str); 4] = [("Int", "String"), ("String", "Int"), ("Bool", "Int"), ("Double", "String")];

const KEYWORD_TYPOS: [(&str, &str); 8] = [
  ("func", "fucn"),
  ("return", "retrun"),
  ("let", "lte"),
  ("var", "vra"),
  ("while", "whlie"),
  ("else", "esle"),
  ("for", "fro"),
  ("if", "fi"),
];

fn line_of(code: &str, offset: usize) -> usize {
  code[..offset].matches('\n').count()
}

fn string_literals(code: &str) -> Vec<Range<usize>> {
  re(&STRING_RE, r#""[^"\n]*""#).find_iter(code).map(|m| m.range()).collect()
}

fn inside_string(literals: &[Range<usize>], offset: usize) -> bool {
  literals.iter().any(|r| r.start < offset && offset < r.end)
}

/// Offset of the `}` closing the first body that opens at or after `from`.
fn body_end(code: &str, from: usize, literals: &[Range<usize>]) -> Option<usize> {
  let mut depth = 0usize;
  for (i, ch) in code[from..].char_indices() {
    let at = from + i;
    if inside_string(literals, at) {
      continue;
    }
    match ch {
      '{' => depth += 1,
      '}' if depth > 0 => {
        depth -= 1;
        if depth == 0 {
          return Some(at);
        }
      }
      _ => {}
    }
  }
  None
}

/// Function names with the byte offset of their declaration.
fn declared_functions(code: &str) -> Vec<(String, usize)> {
  re(&FUNC_NAME_RE, r"\bfunc\s+([A-Za-z_]\w*)")
    .captures_iter(code)
    .filter_map(|c| c.get(1).map(|m| (m.as_str().to_string(), m.start())))
    .collect()
}

/// Call sites of `name(`, excluding its own declaration.
fn call_sites(code: &str, name: &str) -> Vec<usize> {
  let pattern = format!(r"\b{}\s*\(", regex::escape(name));
  let Ok(call) = Regex::new(&pattern) else { return vec![] };
  call
    .find_iter(code)
    .filter(|m| !code[..m.start()].trim_end().ends_with("func"))
    .map(|m| m.start())
    .collect()
}

fn sites(kind: DefectKind, code: &str) -> Vec<Site> {
  let literals = string_literals(code);
  let outside = |offset: usize| !inside_string(&literals, offset);

  let found = match kind {
    DefectKind::WrongReturnType => re(&RETURN_TYPE_RE, r"->\s*(Int|String|Bool|Double)\b")
      .captures_iter(code)
      .filter_map(|c| {
        let ty = c.get(1)?;
        let swapped = TYPE_SWAPS.iter().find(|(from, _)| *from == ty.as_str())?.1;
        // only a `return` inside this function's own body counts
        let end = body_end(code, ty.end(), &literals)?;
        let ret = re(&RETURN_RE, r"\breturn\b")
          .find_at(code, ty.end())
          .filter(|m| m.start() < end)?;
        Some(Site {
          range: ty.range(),
          replacement: swapped.to_string(),
          line: Some(line_of(code, ret.start())),
        })
      })
      .collect(),

    DefectKind::MissingBrace => code
      .char_indices()
      .filter(|(i, ch)| (*ch == '{' || *ch == '}') && outside(*i))
      .map(|(i, _)| Site { range: i..i + 1, replacement: String::new(), line: None })
      .collect(),

    DefectKind::MissingQuote => literals
      .iter()
      .map(|r| Site { range: r.end - 1..r.end, replacement: String::new(), line: None })
      .collect(),

    DefectKind::MissingDeclarationKeyword => re(&DECLARATION_RE, r"(?m)^[ \t]*((?:let|var)\s+)[A-Za-z_]")
      .captures_iter(code)
      .filter_map(|c| c.get(1))
      .map(|m| Site { range: m.range(), replacement: String::new(), line: None })
      .collect(),

    DefectKind::MisspelledKeyword => re(&KEYWORD_RE, r"\b(func|return|let|var|while|else|for|if)\b")
      .find_iter(code)
      .filter(|m| outside(m.start()))
      .filter_map(|m| {
        let typo = KEYWORD_TYPOS.iter().find(|(kw, _)| *kw == m.as_str())?.1;
        Some(Site { range: m.range(), replacement: typo.to_string(), line: None })
      })
      .collect(),

    DefectKind::ColonSemicolonSwap => re(&COLON_RE, r"\w[ \t]*(:)[ \t]")
      .captures_iter(code)
      .filter_map(|c| c.get(1))
      .filter(|m| outside(m.start()))
      .map(|m| Site { range: m.range(), replacement: ";".into(), line: None })
      .collect(),

    DefectKind::MissingUnderscoreLabel => {
      let functions = declared_functions(code);
      re(&UNDERSCORE_RE, r"[(,][ \t]*(_[ \t]+)[A-Za-z]\w*[ \t]*:")
        .captures_iter(code)
        .filter_map(|c| c.get(1))
        .filter_map(|m| {
          // the nearest declaration before the parameter owns it
          let (name, _) = functions.iter().rev().find(|(_, at)| *at < m.start())?;
          let call = *call_sites(code, name).first()?;
          Some(Site { range: m.range(), replacement: String::new(), line: Some(line_of(code, call)) })
        })
        .collect()
    }

    DefectKind::WrongCallCasing => declared_functions(code)
      .iter()
      .flat_map(|(name, _)| {
        let renamed = if name.starts_with(|c: char| c.is_uppercase()) {
          name.to_lowercase()
        } else {
          capitalize_first(name)
        };
        call_sites(code, name)
          .into_iter()
          .filter(|at| outside(*at))
          .map(move |at| Site { range: at..at + name.len(), replacement: renamed.clone(), line: None })
          .collect::<Vec<_>>()
      })
      .collect(),
  };
  found
}

/// Categories that have at least one site in `code`.
pub fn applicable_kinds(code: &str) -> Vec<DefectKind> {
  DefectKind::ALL
    .into_iter()
    .filter(|k| !sites(*k, code).is_empty())
    .collect()
}

/// Pick a category uniformly among the applicable ones and inject it.
pub fn inject_defect<R: Rng + ?Sized>(code: &str, rng: &mut R) -> Result<DefectRecord, ContentError> {
  let kinds = applicable_kinds(code);
  let kind = *kinds.choose(rng).ok_or(ContentError::NoApplicableDefect)?;
  inject(code, kind, rng)
}

/// Inject one defect of `kind`. Fails if the category does not apply or changes nothing.
pub fn inject<R: Rng + ?Sized>(code: &str, kind: DefectKind, rng: &mut R) -> Result<DefectRecord, ContentError> {
  let candidates = sites(kind, code);
  let site = candidates.choose(rng).ok_or(ContentError::DefectNotApplicable(kind))?;

  let mut mutated = String::with_capacity(code.len());
  mutated.push_str(&code[..site.range.start]);
  mutated.push_str(&site.replacement);
  mutated.push_str(&code[site.range.end..]);

  let line = match site.line {
    Some(line) if mutated != code => Some(line),
    _ => first_differing_line(code, &mutated),
  }
  .ok_or(ContentError::UndetectableDefect(kind))?;

  debug!(target: "question", %kind, line, candidates = candidates.len(), "Defect injected");
  Ok(DefectRecord { kind, code: mutated, line })
}

fn first_differing_line(original: &str, mutated: &str) -> Option<usize> {
  let a: Vec<&str> = original.lines().collect();
  let b: Vec<&str> = mutated.lines().collect();
  a.iter()
    .zip(b.iter())
    .position(|(x, y)| x != y)
    .or_else(|| (a.len() != b.len()).then(|| a.len().min(b.len())))
}

#[cfg(test)]
mod tests {
  use super::*;
  use rand::rngs::StdRng;
  use rand::SeedableRng;

  const SAMPLE: &str = r#"func greet(_ name: String) -> String {
    let greeting = "Hello, " + name
    return greeting
}

func add(a: Int, b: Int) -> Int {
    var total = a
    total += b
    return total
}

let message = greet("Sam")
print(message)
print(add(a: 2, b: 3))"#;

  #[test]
  fn every_category_applies_to_the_sample() {
    assert_eq!(applicable_kinds(SAMPLE), DefectKind::ALL.to_vec());
  }

  #[test]
  fn every_category_is_always_detectable() {
    let mut rng = StdRng::seed_from_u64(42);
    for kind in DefectKind::ALL {
      for _ in 0..120 {
        let record = inject(SAMPLE, kind, &mut rng).unwrap();
        assert_ne!(record.code, SAMPLE, "{kind} changed nothing");
        assert!(record.line < SAMPLE.lines().count(), "{kind} line out of range");
      }
    }
  }

  #[test]
  fn exactly_one_edit_is_applied() {
    let mut rng = StdRng::seed_from_u64(9);
    let original: Vec<&str> = SAMPLE.lines().collect();
    for _ in 0..200 {
      let record = inject_defect(SAMPLE, &mut rng).unwrap();
      let mutated: Vec<&str> = record.code.lines().collect();
      assert_eq!(original.len(), mutated.len());
      let changed = original.iter().zip(&mutated).filter(|(a, b)| a != b).count();
      assert_eq!(changed, 1, "{} changed {changed} lines", record.kind);
    }
  }

  #[test]
  fn diffed_categories_report_the_changed_line() {
    let mut rng = StdRng::seed_from_u64(3);
    for kind in [DefectKind::MissingBrace, DefectKind::MissingQuote, DefectKind::MisspelledKeyword] {
      for _ in 0..50 {
        let record = inject(SAMPLE, kind, &mut rng).unwrap();
        let before = SAMPLE.lines().nth(record.line).unwrap();
        let after = record.code.lines().nth(record.line).unwrap();
        assert_ne!(before, after);
      }
    }
  }

  #[test]
  fn wrong_return_type_points_at_the_return_statement() {
    let mut rng = StdRng::seed_from_u64(1);
    for _ in 0..30 {
      let record = inject(SAMPLE, DefectKind::WrongReturnType, &mut rng).unwrap();
      let line = record.code.lines().nth(record.line).unwrap();
      assert!(line.trim_start().starts_with("return"), "got {line:?}");
    }
  }

  #[test]
  fn wrong_return_type_stays_inside_the_mutated_function() {
    let code = "func seven() -> Int {\n    7\n}\n\nfunc greet() -> String {\n    return \"hi\"\n}\n\nprint(seven())\nprint(greet())";
    let mut rng = StdRng::seed_from_u64(12);
    for _ in 0..30 {
      let record = inject(code, DefectKind::WrongReturnType, &mut rng).unwrap();
      assert!(record.code.starts_with("func seven() -> Int {"), "implicit return was mutated");
      assert!(record.code.contains("func greet() -> Int {"));
      assert_eq!(record.line, 5);
    }

    let implicit_only = "func seven() -> Int {\n    7\n}\nprint(seven())";
    assert!(matches!(
      inject(implicit_only, DefectKind::WrongReturnType, &mut rng),
      Err(ContentError::DefectNotApplicable(DefectKind::WrongReturnType))
    ));
  }

  #[test]
  fn missing_underscore_points_at_the_call() {
    let mut rng = StdRng::seed_from_u64(1);
    let record = inject(SAMPLE, DefectKind::MissingUnderscoreLabel, &mut rng).unwrap();
    assert!(record.code.starts_with("func greet(name: String)"));
    assert_eq!(record.line, 11);
  }

  #[test]
  fn call_casing_skips_the_declaration() {
    let mut rng = StdRng::seed_from_u64(5);
    for _ in 0..30 {
      let record = inject(SAMPLE, DefectKind::WrongCallCasing, &mut rng).unwrap();
      assert!(record.code.contains("func greet(") && record.code.contains("func add("));
      assert!(record.code.contains("Greet(\"Sam\")") || record.code.contains("Add(a: 2"));
    }
  }

  #[test]
  fn strings_are_left_alone() {
    let code = "let note = \"if you want, for sure: {ok}\"\nprint(note)";
    let mut rng = StdRng::seed_from_u64(2);
    assert!(matches!(
      inject(code, DefectKind::MisspelledKeyword, &mut rng),
      Ok(DefectRecord { line: 0, .. })
    ));
    for _ in 0..20 {
      let record = inject(code, DefectKind::MisspelledKeyword, &mut rng).unwrap();
      assert!(record.code.starts_with("lte note"));
    }
    assert!(matches!(
      inject(code, DefectKind::MissingBrace, &mut rng),
      Err(ContentError::DefectNotApplicable(DefectKind::MissingBrace))
    ));
  }

  #[test]
  fn nothing_applicable_is_a_content_error() {
    let mut rng = StdRng::seed_from_u64(2);
    assert!(matches!(inject_defect("print(1)", &mut rng), Err(ContentError::NoApplicableDefect)));
  }
}
