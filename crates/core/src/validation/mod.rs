//! Blueprint validation engine.
//!
//! Provides rule and report types, per-language lexicons, and a pure-logic
//! evaluator that checks a blueprint document without mutating it.

pub mod evaluator;
pub mod lexicon;
pub mod rules;

pub use evaluator::{validate_blueprint, validate_document};
pub use lexicon::Lexicon;
pub use rules::{Rule, ValidationError, ValidationReport};
