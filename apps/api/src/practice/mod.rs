//! Practice pipeline: question generation with fingerprint dedup, hints,
//! rubric evaluation and multiple-choice drills.

pub mod evaluation;
pub mod fingerprint;
pub mod handlers;
pub mod mcq;
pub mod prompts;
pub mod questions;
pub mod taxonomy;
