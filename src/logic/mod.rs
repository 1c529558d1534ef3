//! Logic Module - Similarity Engines
//!
//! Engines of the classifier, leaves first:
//! - `compress` - memoized compressed-size oracle
//! - `ncd` - normalized compression distance + distance matrix
//! - `fpf` - farthest-point-first selection and clustering
//! - `prototypes/` - labeled read-only reference store
//! - `decision/` - verdict engine with ML fusion
//! - `builder` - offline prototype/cluster building jobs

pub mod builder;
pub mod compress;
pub mod config;
pub mod decision;
pub mod fpf;
pub mod model;
pub mod ncd;
pub mod prototypes;
pub mod signature;
