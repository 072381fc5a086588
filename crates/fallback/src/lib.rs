//! Rule-Based Fallback System
//!
//! Provides demographic heuristics when no trained model is available, and
//! post-hoc overrides for profiles the model is known to misjudge.

mod rules;

pub use rules::{FallbackEngine, Override, Rule, RuleVerdict, FALLBACK_NOTE, OVERRIDE_NOTE};
