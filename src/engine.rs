//! Question generation and answer checking.
//!
//! This ties the resolver, condition evaluator, defect injector, normalizer
//! and matcher together per activity. Everything here is synchronous and
//! owns its own resolution context, so instances can be generated on any
//! thread without coordination.

use std::collections::BTreeSet;

use rand::seq::SliceRandom;
use rand::RngCore;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::condition::select_answer;
use crate::context::ResolutionContext;
use crate::defect::inject_defect;
use crate::domain::{Activity, AnswerDef, Expected, LineOrder, NamePools, NumberRanges, QuestionDef, ResolvedQuestion};
use crate::error::ContentError;
use crate::matcher::{match_any, AnswerMatcher};
use crate::normalizer::normalize;
use crate::resolver::Resolver;

/// Bounded retries for producing a shuffle that differs from the original order.
const SHUFFLE_ATTEMPTS: usize = 16;

/// A user's answer, as submitted by the client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Submission {
  Text(String),
  Lines(Vec<String>),
  /// 0-based line index.
  Line(usize),
}

/// Result of a free-form check. `captures` are the wildcard groups of the matching reference.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FreeformVerdict {
  pub correct: bool,
  pub captures: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Verdict {
  pub correct: bool,
  pub expected: String,
  pub explanation: String,
  pub captures: Vec<String>,
}

/// Build a fresh instance of `def`.
///
/// Prompt, code, answers and hint are resolved in that order against one
/// context, so a name drawn in the code is the same name in the answers.
#[instrument(level = "debug", skip_all, fields(question = %def.id, activity = %def.activity))]
pub fn generate_instance(
  def: &QuestionDef,
  pools: &NamePools,
  default_ranges: NumberRanges,
  rng: &mut dyn RngCore,
) -> Result<ResolvedQuestion, ContentError> {
  let resolver = Resolver::new(pools, def.ranges.unwrap_or(default_ranges));
  let mut ctx = ResolutionContext::new();

  let prompt = resolver.resolve(&def.prompt, &mut ctx, rng)?;
  let mut code = resolver.resolve(&def.code, &mut ctx, rng)?;
  let answers = def
    .answers
    .iter()
    .map(|a| {
      Ok(AnswerDef {
        text: resolver.resolve(&a.text, &mut ctx, rng)?,
        conditions: a.conditions.clone(),
        correct: a.correct,
      })
    })
    .collect::<Result<Vec<_>, ContentError>>()?;
  let hint = resolver.resolve(&def.hint, &mut ctx, rng)?;

  let mut options = vec![];
  let expected = match def.activity {
    Activity::PredictOutput => {
      if answers.is_empty() {
        return Err(ContentError::MissingAnswers);
      }
      let (index, answer) = select_answer(&answers, &ctx)?;
      debug!(target: "question", index, "Answer selected");
      for a in &answers {
        if !options.contains(&a.text) {
          options.push(a.text.clone());
        }
      }
      Expected::Output { answer: answer.text.clone() }
    }

    Activity::FreeCoding => {
      if answers.is_empty() {
        return Err(ContentError::MissingAnswers);
      }
      // Kept as written; normalized once when a submission is checked.
      let references: Vec<String> = answers.into_iter().map(|a| a.text).collect();
      // surface broken references now rather than on the first submission
      for r in &references {
        AnswerMatcher::build(&normalize(r))?;
      }
      Expected::Freeform { references }
    }

    Activity::SpotTheError => {
      let record = inject_defect(&code, rng)?;
      code = record.code.clone();
      Expected::Defect { record }
    }

    Activity::RearrangeLines => {
      let lines: Vec<String> = code
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(str::to_string)
        .collect();
      options = shuffled(&lines, rng);
      code = String::new();
      Expected::Lines { lines, order: LineOrder::Sequence }
    }

    Activity::MultipleSelection => {
      let correct: Vec<String> = answers.iter().filter(|a| a.correct).map(|a| a.text.clone()).collect();
      if correct.is_empty() {
        return Err(ContentError::NoMatchingAnswer);
      }
      options = answers.iter().map(|a| a.text.clone()).collect();
      options.shuffle(rng);
      Expected::Lines { lines: correct, order: LineOrder::Set }
    }
  };

  Ok(ResolvedQuestion {
    id: Uuid::new_v4().to_string(),
    question_id: def.id.clone(),
    activity: def.activity,
    tags: def.tags.clone(),
    prompt,
    code,
    hint,
    options,
    expected,
  })
}

fn shuffled(lines: &[String], rng: &mut dyn RngCore) -> Vec<String> {
  let mut out = lines.to_vec();
  for _ in 0..SHUFFLE_ATTEMPTS {
    out.shuffle(rng);
    if out != lines {
      break;
    }
  }
  out
}

/// Normalize the submission and every reference, then test them; any match wins.
/// References are taken as written, never pre-normalized.
pub fn check_freeform_answer(references: &[String], submission: &str) -> Result<FreeformVerdict, ContentError> {
  let matchers = references
    .iter()
    .map(|r| AnswerMatcher::build(&normalize(r)))
    .collect::<Result<Vec<_>, _>>()?;
  let outcome = match_any(&matchers, &normalize(submission));
  debug!(target: "question", references = matchers.len(), correct = outcome.is_match, "Free-form answer checked");
  Ok(FreeformVerdict { correct: outcome.is_match, captures: outcome.captures })
}

/// Line-by-line equality after trimming; blank lines are ignored.
pub fn check_exact_answer(expected: &[String], submission: &[String], order: LineOrder) -> bool {
  let clean = |lines: &[String]| -> Vec<String> {
    lines
      .iter()
      .map(|l| l.trim())
      .filter(|l| !l.is_empty())
      .map(str::to_string)
      .collect()
  };
  let (expected, submission) = (clean(expected), clean(submission));
  match order {
    LineOrder::Sequence => expected == submission,
    LineOrder::Set => {
      expected.len() == submission.len()
        && expected.iter().collect::<BTreeSet<_>>() == submission.iter().collect::<BTreeSet<_>>()
    }
  }
}

/// Check a submission against an instance's expected answer.
/// A submission of the wrong shape is simply incorrect.
pub fn check_submission(expected: &Expected, submission: &Submission) -> Result<Verdict, ContentError> {
  let mut captures = vec![];
  let mut explanation = String::new();
  let correct = match (expected, submission) {
    (Expected::Output { answer }, Submission::Text(text)) => answer.trim() == text.trim(),
    (Expected::Freeform { references }, Submission::Text(text)) => {
      let verdict = check_freeform_answer(references, text)?;
      captures = verdict.captures;
      verdict.correct
    }
    (Expected::Defect { record }, Submission::Line(line)) => {
      explanation = record.kind.explanation().to_string();
      *line == record.line
    }
    (Expected::Lines { lines, order }, Submission::Lines(submitted)) => check_exact_answer(lines, submitted, *order),
    _ => false,
  };
  Ok(Verdict { correct, expected: expected.display(), explanation, captures })
}
