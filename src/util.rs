//! Small utility helpers used across modules.

use regex::{Captures, Regex};

/// Like `Regex::replace_all`, but the replacement may fail.
/// Matches are visited left to right, so side effects in `f` happen in textual order.
pub fn try_replace_all<E>(
  re: &Regex,
  text: &str,
  mut f: impl FnMut(&Captures) -> Result<String, E>,
) -> Result<String, E> {
  let mut out = String::with_capacity(text.len());
  let mut last = 0;
  for caps in re.captures_iter(text) {
    let Some(m) = caps.get(0) else { continue };
    out.push_str(&text[last..m.start()]);
    out.push_str(&f(&caps)?);
    last = m.end();
  }
  out.push_str(&text[last..]);
  Ok(out)
}

/// "favoriteColor" -> "favorite color", "numberOfHTTPCalls" -> "number of http calls".
pub fn camel_to_words(input: &str) -> String {
  let mut out = String::with_capacity(input.len() + 4);
  let mut chars = input.chars().peekable();
  let mut prev_lower = false;
  let mut prev_upper = false;

  while let Some(c) = chars.next() {
    if c == '_' {
      if !out.is_empty() && !out.ends_with(' ') { out.push(' '); }
      prev_lower = false;
      prev_upper = false;
      continue;
    }
    let is_upper = c.is_uppercase();
    if !out.is_empty() && !out.ends_with(' ') {
      let next_lower = chars.peek().map(|n| n.is_lowercase()).unwrap_or(false);
      // fooBar | HTTPCalls (break before the last capital of an acronym)
      if is_upper && (prev_lower || (prev_upper && next_lower)) {
        out.push(' ');
      }
    }
    out.extend(c.to_lowercase());
    prev_lower = c.is_lowercase() || c.is_ascii_digit();
    prev_upper = is_upper;
  }
  out
}

/// Uppercase the first character, leave the rest alone.
pub fn capitalize_first(s: &str) -> String {
  let mut chars = s.chars();
  match chars.next() {
    Some(first) => first.to_uppercase().chain(chars).collect(),
    None => String::new(),
  }
}

/// Log-safe truncation for large strings.
/// Avoids spamming logs with whole code submissions.
pub fn trunc_for_log(s: &str, max: usize) -> String {
  if s.len() <= max {
    return s.to_string();
  }
  let mut end = max;
  while !s.is_char_boundary(end) { end -= 1; }
  format!("{}… ({} bytes total)", &s[..end], s.len())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn camel_case_becomes_words() {
    assert_eq!(camel_to_words("favoriteColor"), "favorite color");
    assert_eq!(camel_to_words("age"), "age");
    assert_eq!(camel_to_words("numberOfHTTPCalls"), "number of http calls");
    assert_eq!(camel_to_words("is_raining"), "is raining");
  }

  #[test]
  fn capitalize_only_touches_first_char() {
    assert_eq!(capitalize_first("favorite color"), "Favorite color");
    assert_eq!(capitalize_first(""), "");
  }

  #[test]
  fn fallible_replace_visits_matches_in_order() {
    let re = Regex::new(r"\d").unwrap();
    let mut seen = vec![];
    let out: Result<String, ()> = try_replace_all(&re, "a1b2c3", |c| {
      seen.push(c[0].to_string());
      Ok("#".into())
    });
    assert_eq!(out.unwrap(), "a#b#c#");
    assert_eq!(seen, vec!["1", "2", "3"]);

    let failed: Result<String, &str> = try_replace_all(&re, "a1b2", |_| Err("boom"));
    assert_eq!(failed.unwrap_err(), "boom");
  }

  #[test]
  fn truncation_respects_char_boundaries() {
    assert_eq!(trunc_for_log("short", 10), "short");
    let t = trunc_for_log("ééééé", 3);
    assert!(t.starts_with('é'));
    assert!(t.contains("10 bytes total"));
  }
}
