//! Decision Module - Similarity Verdict Engine
//!
//! Turns raw NCD distances against the prototype store (plus an optional
//! external ML signal) into a verdict with a confidence tier and a
//! human-readable justification.
//!
//! # Architecture
//! - `types.rs`: `Verdict`, `ScoreBundle`, `ClassificationResult`
//! - `engine.rs`: scoring, penalty/tie-break rules, ML fusion
//!
//! # Failure Strategy
//! An empty store degrades to an `unknown` verdict with a reason; ML
//! failures fall back to the NCD-only verdict. Only a compressor failure
//! (corrupted store) propagates as an error.

pub mod engine;
pub mod types;


pub use engine::{DecisionEngine, ScoringStrategy};
pub use types::{
    ClassificationResult, ClusterScore, ConfidenceTier, DecisionSource, ScoreBundle, Verdict,
};
