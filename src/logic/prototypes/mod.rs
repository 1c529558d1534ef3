//! Prototypes Module - Labeled Reference Store
//!
//! Holds the read-only reference collections the decision engine compares
//! against: one legitimate collection and one or more phishing clusters.
//!
//! # Architecture
//! - `types.rs`: `Prototype`, `ClassLabel`, `PhishCluster`
//! - `store.rs`: directory loader (built once at startup, never mutated)
//! - `save.rs`: persistence used by the offline builder
//!
//! # Failure Strategy
//! Missing directories produce empty collections with a warning; the
//! engine degrades to an `unknown` verdict rather than refusing to start.

pub mod save;
pub mod store;
pub mod types;


pub use store::PrototypeStore;
pub use types::{ClassLabel, PhishCluster, Prototype, PrototypeMeta};
