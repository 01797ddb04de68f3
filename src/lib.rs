// src/lib.rs

pub mod config;
pub mod error;
pub mod exam;
pub mod models;
pub mod state;
pub mod store;
pub mod telemetry;
pub mod utils;

pub use exam::assignment::assign_questions;
pub use exam::proctor::{ProctorSession, Signal};
pub use exam::runner::{ExamInput, ExamOutcome, ExamRunner};
pub use utils::rng::shuffle;
