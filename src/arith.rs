//! Integer arithmetic for `<#= ... #>` placeholders.
//!
//! Grammar (whitespace ignored):
//!   expr   := term (('+' | '-') term)*
//!   term   := unary (('*' | '/' | '%') unary)*
//!   unary  := '-' unary | atom
//!   atom   := integer | '(' expr ')'
//!
//! Division truncates toward zero and `%` keeps the dividend's sign, which is
//! what Swift's `Int` does, so generated answers agree with the displayed code.

pub fn evaluate(expr: &str) -> Result<i64, String> {
  let tokens = tokenize(expr)?;
  if tokens.is_empty() {
    return Err("empty expression".into());
  }
  let mut p = Parser { tokens: &tokens, pos: 0 };
  let value = p.expr()?;
  if p.pos != tokens.len() {
    return Err(format!("unexpected token {:?}", tokens[p.pos]));
  }
  Ok(value)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Tok {
  Num(i64),
  Op(char),
  Open,
  Close,
}

fn tokenize(s: &str) -> Result<Vec<Tok>, String> {
  let mut out = vec![];
  let mut chars = s.chars().peekable();
  while let Some(&c) = chars.peek() {
    match c {
      c if c.is_whitespace() => { chars.next(); }
      '0'..='9' => {
        let mut n: i64 = 0;
        while let Some(&d) = chars.peek() {
          let Some(digit) = d.to_digit(10) else { break };
          n = n
            .checked_mul(10)
            .and_then(|n| n.checked_add(i64::from(digit)))
            .ok_or("integer literal overflows")?;
          chars.next();
        }
        out.push(Tok::Num(n));
      }
      '+' | '-' | '*' | '/' | '%' => { out.push(Tok::Op(c)); chars.next(); }
      '(' => { out.push(Tok::Open); chars.next(); }
      ')' => { out.push(Tok::Close); chars.next(); }
      other => return Err(format!("unexpected character '{other}'")),
    }
  }
  Ok(out)
}

struct Parser<'a> {
  tokens: &'a [Tok],
  pos: usize,
}

impl Parser<'_> {
  fn peek(&self) -> Option<Tok> {
    self.tokens.get(self.pos).copied()
  }

  fn expr(&mut self) -> Result<i64, String> {
    let mut acc = self.term()?;
    while let Some(Tok::Op(op @ ('+' | '-'))) = self.peek() {
      self.pos += 1;
      let rhs = self.term()?;
      acc = if op == '+' { acc.checked_add(rhs) } else { acc.checked_sub(rhs) }
        .ok_or("overflow")?;
    }
    Ok(acc)
  }

  fn term(&mut self) -> Result<i64, String> {
    let mut acc = self.unary()?;
    while let Some(Tok::Op(op @ ('*' | '/' | '%'))) = self.peek() {
      self.pos += 1;
      let rhs = self.unary()?;
      acc = match op {
        '*' => acc.checked_mul(rhs).ok_or("overflow")?,
        _ if rhs == 0 => return Err("division by zero".into()),
        '/' => acc.checked_div(rhs).ok_or("overflow")?,
        _ => acc.checked_rem(rhs).ok_or("overflow")?,
      };
    }
    Ok(acc)
  }

  fn unary(&mut self) -> Result<i64, String> {
    if let Some(Tok::Op('-')) = self.peek() {
      self.pos += 1;
      return self.unary()?.checked_neg().ok_or_else(|| "overflow".into());
    }
    self.atom()
  }

  fn atom(&mut self) -> Result<i64, String> {
    match self.peek() {
      Some(Tok::Num(n)) => {
        self.pos += 1;
        Ok(n)
      }
      Some(Tok::Open) => {
        self.pos += 1;
        let v = self.expr()?;
        if self.peek() != Some(Tok::Close) {
          return Err("missing ')'".into());
        }
        self.pos += 1;
        Ok(v)
      }
      Some(t) => Err(format!("unexpected token {t:?}")),
      None => Err("unexpected end of expression".into()),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::evaluate;

  #[test]
  fn precedence_and_parentheses() {
    assert_eq!(evaluate("2 + 3 * 4"), Ok(14));
    assert_eq!(evaluate("(2 + 3) * 4"), Ok(20));
    assert_eq!(evaluate(" 10 - 4 - 3 "), Ok(3));
    assert_eq!(evaluate("-3 + 5"), Ok(2));
  }

  #[test]
  fn integer_division_matches_swift() {
    assert_eq!(evaluate("7 / 2"), Ok(3));
    assert_eq!(evaluate("-7 / 2"), Ok(-3));
    assert_eq!(evaluate("-7 % 3"), Ok(-1));
  }

  #[test]
  fn malformed_expressions_fail() {
    assert!(evaluate("").is_err());
    assert!(evaluate("1 +").is_err());
    assert!(evaluate("(1 + 2").is_err());
    assert!(evaluate("4 / 0").is_err());
    assert!(evaluate("2 x 3").is_err());
    assert!(evaluate("1 2").is_err());
  }
}
