//! Practice-question content engine.
//!
//! Turns static question templates into concrete instances and checks user
//! answers against them. The engine modules are pure and synchronous; the
//! `state`, `logic` and `routes` modules wrap them in an axum service.

pub mod arith;
pub mod condition;
pub mod context;
pub mod defect;
pub mod domain;
pub mod engine;
pub mod error;
pub mod matcher;
pub mod normalizer;
pub mod resolver;

pub mod config;
pub mod logic;
pub mod protocol;
pub mod routes;
pub mod seeds;
pub mod state;
pub mod telemetry;
pub mod util;

pub use engine::{check_exact_answer, check_freeform_answer, check_submission, generate_instance};
pub use error::ContentError;
