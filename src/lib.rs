//! domshape-core - DOM-shape phishing classifier, similarity core
//!
//! Classifies a rendered page as phishing or legitimate by comparing the
//! structural shape of its sanitized DOM (or, for near-empty DOMs, its
//! resource-loading fingerprint) against small labeled reference sets
//! using Normalized Compression Distance.

pub mod constants;
pub mod error;
pub mod logic;

pub use error::{ShapeError, ShapeResult};
pub use logic::config::DetectionConfig;
pub use logic::decision::{ClassificationResult, DecisionEngine, ScoringStrategy, Verdict};
pub use logic::prototypes::PrototypeStore;
pub use logic::signature::SubjectMode;
