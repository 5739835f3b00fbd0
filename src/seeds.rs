//! Built-in content: name pools and a small question bank covering every activity.
//! Keeps the server useful when no QUESTION_BANK_PATH is configured.

use crate::condition::Condition;
use crate::domain::{Activity, AnswerDef, NameEntry, NamePools, QuestionDef};

fn entry(name: &str, values: &[&str]) -> NameEntry {
  NameEntry {
    name: name.to_string(),
    natural: None,
    values: values.iter().map(|v| v.to_string()).collect(),
  }
}

pub fn seed_name_pools() -> NamePools {
  NamePools {
    integer: ["age", "score", "numberOfApples", "stepCount", "temperature", "highScore", "lives", "pageCount"]
      .iter()
      .map(|n| entry(n, &[]))
      .collect(),
    string: vec![
      entry("favoriteColor", &["red", "blue", "green", "purple"]),
      entry("hometown", &["Paris", "Tokyo", "Lima", "Nairobi", "Oslo"]),
      entry("petName", &["Milo", "Luna", "Coco", "Rex"]),
      entry("favoriteFood", &["pizza", "sushi", "tacos", "ramen"]),
      entry("nickname", &[]),
    ],
    boolean: ["isRaining", "hasTicket", "isLoggedIn", "gameOver"]
      .iter()
      .map(|n| entry(n, &[]))
      .collect(),
  }
}

pub fn seed_questions() -> Vec<QuestionDef> {
  vec![
    QuestionDef {
      id: "predict-compare".into(),
      activity: Activity::PredictOutput,
      tags: vec!["conditionals".into(), "comparison".into()],
      prompt: "What does this code print?".into(),
      code: "<#letvar#> <#int#> = <#small#>\n<#letvar#> <#int#> = <#small#>\nif <#name:1#> <#op#> <#name:2#> {\n    print(\"yes\")\n} else {\n    print(\"no\")\n}".into(),
      answers: vec![
        AnswerDef::new("yes").when(Condition::new("<#value:1#>", "<#operator:1#>", "<#value:2#>")),
        AnswerDef::new("no"),
      ],
      hint: "Compare <#name:1#> and <#name:2#> using <#operator:1#>.".into(),
      ranges: None,
    },
    QuestionDef {
      id: "predict-arithmetic".into(),
      activity: Activity::PredictOutput,
      tags: vec!["arithmetic".into()],
      prompt: "What is printed?".into(),
      code: "let <#int#> = <#medium#>\nlet <#int#> = <#tiny#>\nprint(<#name:1#> + <#name:2#> * 2)".into(),
      answers: vec![AnswerDef::new("<#= <#value:1#> + <#value:2#> * 2 #>")],
      hint: "Multiplication happens before addition.".into(),
      ranges: None,
    },
    QuestionDef {
      id: "predict-string-count".into(),
      activity: Activity::PredictOutput,
      tags: vec!["strings".into()],
      prompt: "What does this code print?".into(),
      code: "let <#string#> = \"<#text:1#>\"\nprint(<#name:1#>.count)".into(),
      answers: vec![AnswerDef::new("<#text:1|count#>")],
      hint: "`count` is the number of characters in <#natural:1#>.".into(),
      ranges: None,
    },
    QuestionDef {
      id: "free-case-insensitive".into(),
      activity: Activity::FreeCoding,
      tags: vec!["functions".into(), "strings".into()],
      prompt: "Write a function `f` that takes two strings and returns whether they are equal, ignoring case.".into(),
      code: String::new(),
      answers: vec![
        AnswerDef::new("func f(a: String, b: String) -> Bool { return a.lowercased() == b.lowercased() }"),
        AnswerDef::new("func f(a: String, b: String) -> Bool { return a.uppercased() == b.uppercased() }"),
      ],
      hint: "Convert both strings with `lowercased()` before comparing.".into(),
      ranges: None,
    },
    QuestionDef {
      id: "free-greeting".into(),
      activity: Activity::FreeCoding,
      tags: vec!["variables".into(), "strings".into()],
      prompt: "Store any greeting in a constant or variable, then print it.".into(),
      code: String::new(),
      answers: vec![AnswerDef::new("<#any-mut#> greeting = \"<#any-string#>\"\nprint(greeting)")],
      hint: "Declare it with `let`, then pass it to `print`.".into(),
      ranges: None,
    },
    QuestionDef {
      id: "spot-functions".into(),
      activity: Activity::SpotTheError,
      tags: vec!["functions".into()],
      prompt: "One line of this program does not compile. Which one?".into(),
      code: "func greet(_ name: String) -> String {\n    let greeting = \"Hello, \" + name\n    return greeting\n}\n\nfunc add(a: Int, b: Int) -> Int {\n    var total = a\n    total += b\n    return total\n}\n\nlet message = greet(\"Sam\")\nprint(message)\nprint(add(a: <#small#>, b: <#small#>))".into(),
      answers: vec![],
      hint: "Read each declaration carefully, then check how the functions are called.".into(),
      ranges: None,
    },
    QuestionDef {
      id: "rearrange-sum".into(),
      activity: Activity::RearrangeLines,
      tags: vec!["loops".into()],
      prompt: "Put the lines in order so the program prints the sum of 1 through <#tiny#>.".into(),
      code: "var <#int#> = 0\nfor i in 1...<#value:1#> {\n    <#name:1#> += i\n}\nprint(<#name:1#>)".into(),
      answers: vec![],
      hint: "A variable must be declared before the loop uses it.".into(),
      ranges: None,
    },
    QuestionDef {
      id: "select-integer-literals".into(),
      activity: Activity::MultipleSelection,
      tags: vec!["types".into()],
      prompt: "Which of these are integer literals?".into(),
      code: String::new(),
      answers: vec![
        AnswerDef::new("<#small#>").correct(),
        AnswerDef::new("-<#medium#>").correct(),
        AnswerDef::new("\"<#tiny#>\""),
        AnswerDef::new("<#tiny#>.5"),
      ],
      hint: "Quotes make a string; a decimal point makes a Double.".into(),
      ranges: None,
    },
  ]
}
