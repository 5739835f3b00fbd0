//! Code normalization ("anonymization") for free-form submissions.
//!
//! Two snippets that only differ by whitespace, brace style, `;` separators,
//! identifier choice or verbose generic spellings normalize to the same text.
//! This is regex-driven and best-effort: adversarial input (identifiers inside
//! string literals, shadowing tricks) can misfire.
//!
//! Declared identifiers become positional markers, one counter per category:
//!
//! | category                  | marker |
//! |---------------------------|--------|
//! | local `let`/`var`         | `@N@`  |
//! | loop variable             | `~N~`  |
//! | function / closure param  | `%N%`  |
//! | function name             | `#N#`  |

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;

static OPEN_BRACE_RE: OnceLock<Regex> = OnceLock::new();
static CLOSE_BRACE_RE: OnceLock<Regex> = OnceLock::new();
static LOCAL_RE: OnceLock<Regex> = OnceLock::new();
static LOOP_RE: OnceLock<Regex> = OnceLock::new();
static FUNC_PARAMS_RE: OnceLock<Regex> = OnceLock::new();
static PARAM_RE: OnceLock<Regex> = OnceLock::new();
static CLOSURE_PARAM_RE: OnceLock<Regex> = OnceLock::new();
static FUNC_NAME_RE: OnceLock<Regex> = OnceLock::new();
static SPACES_RE: OnceLock<Regex> = OnceLock::new();
static ARRAY_RE: OnceLock<Regex> = OnceLock::new();
static DICTIONARY_RE: OnceLock<Regex> = OnceLock::new();
static OPTIONAL_RE: OnceLock<Regex> = OnceLock::new();

fn re(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
  cell.get_or_init(|| Regex::new(pattern).expect("static normalizer regex"))
}

/// Identifier categories, in the order they are anonymized.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Category {
  Local,
  Loop,
  Param,
  Function,
}

impl Category {
  fn marker(&self, n: usize) -> String {
    match self {
      Category::Local => format!("@{n}@"),
      Category::Loop => format!("~{n}~"),
      Category::Param => format!("%{n}%"),
      Category::Function => format!("#{n}#"),
    }
  }
}

/// Per-call numbering state. Lives on the stack of one `normalize` call.
#[derive(Default)]
struct Anonymizer {
  counters: HashMap<&'static str, usize>,
  seen: HashMap<String, String>,
}

impl Anonymizer {
  fn key(category: Category) -> &'static str {
    match category {
      Category::Local => "local",
      Category::Loop => "loop",
      Category::Param => "param",
      Category::Function => "function",
    }
  }

  /// Replace every whole-identifier occurrence of `name` with the category's next marker.
  fn anonymize(&mut self, code: &str, name: &str, category: Category) -> String {
    if name == "_" || self.seen.contains_key(name) {
      return code.to_string();
    }
    let counter = self.counters.entry(Self::key(category)).or_insert(0);
    *counter += 1;
    let marker = category.marker(*counter);
    self.seen.insert(name.to_string(), marker.clone());
    replace_identifier(code, name, &marker)
  }
}

/// Whole-identifier replacement that leaves member accesses (`x.name`) alone
/// but still treats the end of a range operator (`0...name`) as a boundary.
fn replace_identifier(code: &str, name: &str, marker: &str) -> String {
  let pattern = format!(r"(^|[^\w.]|\.\.){}\b", regex::escape(name));
  match Regex::new(&format!("(?m){pattern}")) {
    Ok(re) => re.replace_all(code, format!("${{1}}{marker}").as_str()).into_owned(),
    Err(_) => code.to_string(),
  }
}

/// Normalize `code` into its canonical form. Pure and deterministic.
pub fn normalize(code: &str) -> String {
  let code = code.trim();
  if code.is_empty() {
    return String::new();
  }

  // Braces: `{` ends a line and `}` starts one, whatever the original style.
  let code = re(&OPEN_BRACE_RE, r"\s*\{\s*").replace_all(code, " {\n");
  let code = re(&CLOSE_BRACE_RE, r"\s*\}").replace_all(&code, "\n}");

  let code = trim_lines(&code);
  let code = code.replace(';', "\n");
  let code = anonymize(&code);

  let code = re(&SPACES_RE, r"[ \t]{2,}").replace_all(&code, " ");
  let code = code
    .lines()
    .filter(|l| !l.trim().is_empty())
    .collect::<Vec<_>>()
    .join("\n");
  let code = shorthand_generics(&code);
  trim_lines(&code)
}

fn trim_lines(code: &str) -> String {
  code.lines().map(str::trim).collect::<Vec<_>>().join("\n")
}

fn anonymize(code: &str) -> String {
  let mut anon = Anonymizer::default();
  let mut code = code.to_string();

  let locals: Vec<String> = re(&LOCAL_RE, r"(?:\b(?:let|var)|<#any-mut#>)\s+([A-Za-z_]\w*)")
    .captures_iter(&code)
    .map(|c| c[1].to_string())
    .collect();
  for name in locals {
    code = anon.anonymize(&code, &name, Category::Local);
  }

  let loops: Vec<String> = re(&LOOP_RE, r"\bfor\s+([A-Za-z_]\w*)\s+in\b")
    .captures_iter(&code)
    .map(|c| c[1].to_string())
    .collect();
  for name in loops {
    code = anon.anonymize(&code, &name, Category::Loop);
  }

  let mut params: Vec<String> = vec![];
  for list in re(&FUNC_PARAMS_RE, r"\bfunc\s+[A-Za-z_]\w*\s*(?:<[^>]*>)?\s*\(([^)]*)\)").captures_iter(&code) {
    for part in list[1].split(',') {
      // `label name: Type` or `name: Type`; the internal name is the last identifier
      if let Some(c) = re(&PARAM_RE, r"^\s*(?:[A-Za-z_]\w*\s+)?([A-Za-z_]\w*)\s*:").captures(part) {
        params.push(c[1].to_string());
      }
    }
  }
  // `{ value in` closures: a single parameter without parentheses or type
  params.extend(
    re(&CLOSURE_PARAM_RE, r"(?m)^\(?\s*([A-Za-z_]\w*)\s*\)?\s+in\b")
      .captures_iter(&code)
      .map(|c| c[1].to_string()),
  );
  for name in params {
    code = anon.anonymize(&code, &name, Category::Param);
  }

  let functions: Vec<String> = re(&FUNC_NAME_RE, r"\bfunc\s+([A-Za-z_]\w*)")
    .captures_iter(&code)
    .map(|c| c[1].to_string())
    .collect();
  for name in functions {
    code = anon.anonymize(&code, &name, Category::Function);
  }

  code
}

/// Rewrite generics until none are left. Each pass only handles generics whose
/// arguments are already shorthand, so nesting unwinds from the inside out.
fn shorthand_generics(code: &str) -> String {
  let mut code = code.to_string();
  loop {
    let next = shorthand_generics_once(&code);
    if next == code {
      return code;
    }
    code = next;
  }
}

fn shorthand_generics_once(code: &str) -> String {
  let code = re(&ARRAY_RE, r"\bArray<\s*([\w\[\]:? ]+?)\s*>").replace_all(code, "[$1]");
  let code = re(&DICTIONARY_RE, r"\bDictionary<\s*([\w\[\]?]+)\s*,\s*([\w\[\]:? ]+?)\s*>")
    .replace_all(&code, "[$1: $2]");
  re(&OPTIONAL_RE, r"\bOptional<\s*([\w\[\]:? ]+?)\s*>")
    .replace_all(&code, "$1?")
    .into_owned()
}

#[cfg(test)]
mod tests {
  use super::normalize;

  #[test]
  fn empty_and_blank_input() {
    assert_eq!(normalize(""), "");
    assert_eq!(normalize("  \n\t "), "");
  }

  #[test]
  fn function_example_normalizes_to_markers() {
    assert_eq!(
      normalize("func double(a: Int) -> Int { return a }"),
      "func #1#(%1%: Int) -> Int {\nreturn %1%\n}"
    );
  }

  #[test]
  fn brace_styles_collapse() {
    let allman = "func greet(name: String)\n{\n    print(name)\n}";
    let kr = "func hello(who: String) {\n  print(who)\n}";
    let inline = "func hi(x: String) { print(x) }";
    assert_eq!(normalize(allman), normalize(kr));
    assert_eq!(normalize(kr), normalize(inline));
  }

  #[test]
  fn categories_count_independently() {
    let code = "func total(items: [Int]) -> Int {\nvar sum = 0\nfor item in items {\nsum += item\n}\nreturn sum\n}";
    assert_eq!(
      normalize(code),
      "func #1#(%1%: [Int]) -> Int {\nvar @1@ = 0\nfor ~1~ in %1% {\n@1@ += ~1~\n}\nreturn @1@\n}"
    );
  }

  #[test]
  fn labels_closures_and_separators() {
    assert_eq!(
      normalize("func greet(person name: String) { print(name); print(name) }"),
      "func #1#(person %1%: String) {\nprint(%1%)\nprint(%1%)\n}"
    );
    assert_eq!(
      normalize("let doubled = numbers.map { n in n * 2 }"),
      "let @1@ = numbers.map {\n%1% in %1% * 2\n}"
    );
  }

  #[test]
  fn member_access_and_substrings_are_not_clobbered() {
    assert_eq!(
      normalize("let count = word.count\nlet counter = count + 1"),
      "let @1@ = word.count\nlet @2@ = @1@ + 1"
    );
    assert_eq!(normalize("for i in 0...n { print(i) }"), "for ~1~ in 0...n {\nprint(~1~)\n}");
  }

  #[test]
  fn verbose_generics_become_shorthand() {
    assert_eq!(normalize("var names: Array<String> = []"), "var @1@: [String] = []");
    assert_eq!(
      normalize("let ages: Dictionary<String, Int> = [:]"),
      "let @1@: [String: Int] = [:]"
    );
    assert_eq!(normalize("var maybe: Optional<Int> = nil"), "var @1@: Int? = nil");
  }

  #[test]
  fn nested_generics_are_rewritten_in_one_call() {
    assert_eq!(normalize("var items: Array<Optional<Int>> = []"), "var @1@: [Int?] = []");
    assert_eq!(
      normalize("var rows: Array<Dictionary<String, Int>> = []"),
      "var @1@: [[String: Int]] = []"
    );
    assert_eq!(
      normalize("var lookup: Dictionary<String, Array<Int>> = [:]"),
      "var @1@: [String: [Int]] = [:]"
    );
  }

  #[test]
  fn whitespace_runs_and_blank_lines_collapse() {
    assert_eq!(
      normalize("let   total  =   1\n\n\n   print( total )   "),
      "let @1@ = 1\nprint( @1@ )"
    );
  }

  #[test]
  fn normalization_is_idempotent() {
    let samples = [
      "func double(a: Int) -> Int { return a }",
      "func total(items: [Int]) -> Int {\nvar sum = 0\nfor item in items { sum += item }\nreturn sum\n}",
      "let doubled = numbers.map { n in n * 2 }; print(doubled)",
      "var names: Array<String> = []\nnames.append(\"x\")",
      "if let value = Int(\"3\")\n{\n  print(value)\n}\nelse { print(0) }",
      "func f(_ a: String, b: String) -> Bool { return a.lowercased() == b.lowercased() }",
      "var items: Array<Optional<Int>> = []",
      "var rows: Array<Dictionary<String, Int>> = []",
    ];
    for s in samples {
      let once = normalize(s);
      assert_eq!(normalize(&once), once, "not stable for {s:?}");
    }
  }
}
