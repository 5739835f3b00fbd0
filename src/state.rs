//! Application state: the question bank, name pools, generated instances, and selection logic.
//!
//! This module owns:
//!   - the question bank (by id, by activity), immutable after startup
//!   - name pools and default number ranges (from TOML or built-in seeds)
//!   - generated instances (by instance id), dropped once answered or when
//!     the store is full (oldest first)
//!   - last-served question per activity filter, to avoid immediate repeats
//!
//! A question whose content is broken is logged and skipped; selection moves
//! on to the next candidate instead of failing the request.

use std::{
  collections::{HashMap, VecDeque},
  sync::Arc,
};
use tokio::sync::RwLock;
use tracing::{error, info, instrument, warn};

use crate::config::load_bank_config_from_env;
use crate::domain::{Activity, NamePools, NumberRanges, QuestionDef, ResolvedQuestion};
use crate::engine::generate_instance;
use crate::seeds::{seed_name_pools, seed_questions};

/// Upper bound on live instances; abandoned questions are dropped oldest first.
pub const MAX_LIVE_INSTANCES: usize = 1024;

/// Generated instances by id, with insertion order for eviction.
#[derive(Debug, Default)]
pub struct InstanceStore {
  by_id: HashMap<String, ResolvedQuestion>,
  order: VecDeque<String>,
  capacity: usize,
}

impl InstanceStore {
  pub fn with_capacity(capacity: usize) -> Self {
    Self { capacity: capacity.max(1), ..Default::default() }
  }

  pub fn len(&self) -> usize {
    self.by_id.len()
  }

  pub fn is_empty(&self) -> bool {
    self.by_id.is_empty()
  }

  /// Insert, evicting the oldest live instances past capacity.
  /// Returns how many were evicted.
  pub fn insert(&mut self, q: ResolvedQuestion) -> usize {
    self.order.push_back(q.id.clone());
    self.by_id.insert(q.id.clone(), q);
    let mut evicted = 0;
    while self.by_id.len() > self.capacity {
      let Some(oldest) = self.order.pop_front() else { break };
      if self.by_id.remove(&oldest).is_some() {
        evicted += 1;
      }
    }
    evicted
  }

  pub fn get(&self, id: &str) -> Option<&ResolvedQuestion> {
    self.by_id.get(id)
  }

  pub fn remove(&mut self, id: &str) -> Option<ResolvedQuestion> {
    let q = self.by_id.remove(id)?;
    self.order.retain(|queued| queued != id);
    Some(q)
  }
}

#[derive(Clone)]
pub struct AppState {
  pub by_id: Arc<HashMap<String, QuestionDef>>,
  pub by_activity: Arc<HashMap<Activity, Vec<String>>>,
  pub pools: Arc<NamePools>,
  pub ranges: NumberRanges,
  pub instances: Arc<RwLock<InstanceStore>>,
  pub last_by_activity: Arc<RwLock<HashMap<Option<Activity>, String>>>,
}

impl AppState {
  /// Build state from env: load the TOML bank if configured, then add built-in seeds.
  #[instrument(level = "info", skip_all)]
  pub fn new() -> Self {
    let cfg = load_bank_config_from_env().unwrap_or_default();

    // Configured questions first; built-in seeds never overwrite them.
    let mut questions = cfg.questions;
    questions.extend(seed_questions());
    let pools = cfg.names.unwrap_or_else(seed_name_pools);
    let ranges = cfg.ranges.unwrap_or_default();

    Self::from_parts(questions, pools, ranges)
  }

  /// Build state from already-loaded content. Duplicate ids keep the first definition.
  pub fn from_parts(questions: Vec<QuestionDef>, pools: NamePools, ranges: NumberRanges) -> Self {
    let mut id_map = HashMap::<String, QuestionDef>::new();
    let mut activity_map = HashMap::<Activity, Vec<String>>::new();

    for q in questions {
      if id_map.contains_key(&q.id) {
        warn!(target: "question", id = %q.id, "Duplicate question id; keeping the first definition");
        continue;
      }
      activity_map.entry(q.activity).or_default().push(q.id.clone());
      id_map.insert(q.id.clone(), q);
    }

    // Dry-run every question once so broken content shows up at startup.
    let mut rng = rand::thread_rng();
    for q in id_map.values() {
      if let Err(e) = generate_instance(q, &pools, ranges, &mut rng) {
        error!(target: "question", id = %q.id, activity = %q.activity, error = %e, "Question failed its startup dry run");
      }
    }

    for activity in Activity::ALL {
      let count = activity_map.get(&activity).map_or(0, Vec::len);
      info!(target: "question", %activity, count, "Startup question inventory");
    }

    Self {
      by_id: Arc::new(id_map),
      by_activity: Arc::new(activity_map),
      pools: Arc::new(pools),
      ranges,
      instances: Arc::new(RwLock::new(InstanceStore::with_capacity(MAX_LIVE_INSTANCES))),
      last_by_activity: Arc::new(RwLock::new(HashMap::new())),
    }
  }

  /// Candidate question ids for an activity (or every activity), in bank order.
  fn candidates(&self, activity: Option<Activity>) -> Vec<String> {
    match activity {
      Some(a) => self.by_activity.get(&a).cloned().unwrap_or_default(),
      None => Activity::ALL
        .iter()
        .filter_map(|a| self.by_activity.get(a))
        .flatten()
        .cloned()
        .collect(),
    }
  }

  /// Selection policy:
  /// Rotate through the bank starting after the last question served for this
  /// activity. A question that fails to generate is logged and skipped.
  /// Returns None only when no candidate generates.
  #[instrument(level = "info", skip(self))]
  pub async fn choose_question(&self, activity: Option<Activity>) -> Option<ResolvedQuestion> {
    let ids = self.candidates(activity);
    if ids.is_empty() {
      warn!(target: "question", ?activity, "No questions for activity");
      return None;
    }

    let last = { self.last_by_activity.read().await.get(&activity).cloned() };
    let start = last
      .and_then(|last_id| ids.iter().position(|id| *id == last_id))
      .map_or(0, |i| i + 1);

    for offset in 0..ids.len() {
      let id = &ids[(start + offset) % ids.len()];
      let Some(def) = self.by_id.get(id) else { continue };

      // ThreadRng is not Send; keep it out of any await.
      let generated = {
        let mut rng = rand::thread_rng();
        generate_instance(def, &self.pools, self.ranges, &mut rng)
      };

      match generated {
        Ok(q) => {
          self.insert_instance(q.clone()).await;
          self.last_by_activity.write().await.insert(activity, id.clone());
          info!(target: "question", question = %id, instance = %q.id, activity = %q.activity, "Generated question instance");
          return Some(q);
        }
        Err(e) => {
          error!(target: "question", question = %id, error = %e, "Question generation failed; skipping");
        }
      }
    }
    None
  }

  #[instrument(level = "debug", skip(self, q), fields(id = %q.id))]
  pub async fn insert_instance(&self, q: ResolvedQuestion) {
    let evicted = self.instances.write().await.insert(q);
    if evicted > 0 {
      warn!(target: "question", evicted, "Instance store full; dropped oldest unanswered instances");
    }
  }

  /// Read-only access to a generated instance by id.
  #[instrument(level = "debug", skip(self), fields(%id))]
  pub async fn get_instance(&self, id: &str) -> Option<ResolvedQuestion> {
    let instances = self.instances.read().await;
    instances.get(id).cloned()
  }

  /// Remove an instance once its activity has ended (its answer was checked).
  #[instrument(level = "debug", skip(self), fields(%id))]
  pub async fn take_instance(&self, id: &str) -> Option<ResolvedQuestion> {
    self.instances.write().await.remove(id)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::AnswerDef;

  fn question(id: &str, activity: Activity, code: &str, answers: Vec<AnswerDef>) -> QuestionDef {
    QuestionDef { id: id.into(), activity, code: code.into(), answers, ..Default::default() }
  }

  fn state(questions: Vec<QuestionDef>) -> AppState {
    AppState::from_parts(questions, seed_name_pools(), NumberRanges::default())
  }

  #[tokio::test]
  async fn rotates_through_questions_of_an_activity() {
    let st = state(vec![
      question("a", Activity::PredictOutput, "print(1)", vec![AnswerDef::new("1")]),
      question("b", Activity::PredictOutput, "print(2)", vec![AnswerDef::new("2")]),
    ]);
    let first = st.choose_question(Some(Activity::PredictOutput)).await.unwrap();
    let second = st.choose_question(Some(Activity::PredictOutput)).await.unwrap();
    let third = st.choose_question(Some(Activity::PredictOutput)).await.unwrap();
    assert_eq!(first.question_id, "a");
    assert_eq!(second.question_id, "b");
    assert_eq!(third.question_id, "a");
    assert!(st.get_instance(&second.id).await.is_some());
  }

  #[tokio::test]
  async fn broken_questions_are_skipped() {
    let st = state(vec![
      question("broken", Activity::PredictOutput, "print(<#name:3#>)", vec![AnswerDef::new("x")]),
      question("fine", Activity::PredictOutput, "print(1)", vec![AnswerDef::new("1")]),
    ]);
    for _ in 0..3 {
      let q = st.choose_question(Some(Activity::PredictOutput)).await.unwrap();
      assert_eq!(q.question_id, "fine");
    }
  }

  #[tokio::test]
  async fn nothing_to_serve() {
    let st = state(vec![question("broken", Activity::FreeCoding, "", vec![])]);
    assert!(st.choose_question(Some(Activity::FreeCoding)).await.is_none());
    assert!(st.choose_question(Some(Activity::RearrangeLines)).await.is_none());
    assert!(st.get_instance("missing").await.is_none());
  }

  #[tokio::test]
  async fn taken_instances_are_gone() {
    let st = state(vec![question("a", Activity::PredictOutput, "print(1)", vec![AnswerDef::new("1")])]);
    let q = st.choose_question(None).await.unwrap();
    assert_eq!(st.take_instance(&q.id).await.map(|t| t.id), Some(q.id.clone()));
    assert!(st.get_instance(&q.id).await.is_none());
    assert!(st.take_instance(&q.id).await.is_none());
    assert!(st.instances.read().await.is_empty());
  }

  #[test]
  fn full_store_drops_the_oldest_instances() {
    let def = question("a", Activity::PredictOutput, "print(<#tiny#>)", vec![AnswerDef::new("<#value:1#>")]);
    let pools = seed_name_pools();
    let mut rng = rand::thread_rng();
    let mut fresh = || generate_instance(&def, &pools, NumberRanges::default(), &mut rng).unwrap();

    let mut store = InstanceStore::with_capacity(2);
    let (first, second, third) = (fresh(), fresh(), fresh());
    assert_eq!(store.insert(first.clone()), 0);
    assert_eq!(store.insert(second.clone()), 0);
    assert_eq!(store.insert(third.clone()), 1);
    assert_eq!(store.len(), 2);
    assert!(store.get(&first.id).is_none());
    assert!(store.get(&second.id).is_some());

    // a removed id frees its slot without evicting anyone else
    assert!(store.remove(&second.id).is_some());
    assert_eq!(store.insert(fresh()), 0);
    assert!(store.get(&third.id).is_some());
  }

  #[test]
  fn duplicate_ids_keep_the_first_definition() {
    let st = state(vec![
      question("dup", Activity::PredictOutput, "print(1)", vec![AnswerDef::new("1")]),
      question("dup", Activity::FreeCoding, "", vec![AnswerDef::new("print(1)")]),
    ]);
    assert_eq!(st.by_id["dup"].activity, Activity::PredictOutput);
    assert!(st.by_activity.get(&Activity::FreeCoding).is_none());
  }
}
