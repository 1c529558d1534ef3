//! Central Configuration Constants
//!
//! Single source of truth for all detection defaults.
//! To change a default threshold, only edit this file.

use std::path::PathBuf;

/// Sanitized DOMs below this size (bytes) carry weak structural signal;
/// the legitimate scores get a penalty before comparison.
pub const DEFAULT_MINIMAL_DOM_THRESHOLD: usize = 120;

/// Penalty added to the legitimate min/avg for minimal subjects.
pub const DEFAULT_MINIMAL_DOM_PENALTY: f64 = 0.15;

/// Sanitized DOMs below this size (bytes) are classified by their
/// resource signature instead of the tag stream.
pub const DEFAULT_SMALL_DOM_THRESHOLD: usize = 2000;

/// Score separation above which the verdict is high-confidence.
pub const DEFAULT_HIGH_SEPARATION: f64 = 0.1;

/// Score separation above which the verdict is medium-confidence.
pub const DEFAULT_LOW_SEPARATION: f64 = 0.05;

/// Minimum ML probability for the ML label to override the NCD verdict.
pub const DEFAULT_ML_CONFIDENCE_THRESHOLD: f64 = 0.6;

/// Upper bound on memoized compressed-size entries.
pub const DEFAULT_COMPRESSION_CACHE_CAPACITY: usize = 10_000;

/// Prototypes selected per class by the offline builder.
pub const DEFAULT_PROTOTYPES_PER_CLASS: usize = 5;

/// Phishing-family clustering bounds.
pub const MIN_CLUSTERS: usize = 2;
pub const MAX_CLUSTERS: usize = 4;

/// Variance-reduction floor for the clustering early stop.
pub const CLUSTER_VARIANCE_EPSILON: f64 = 0.001;

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// App name
pub const APP_NAME: &str = "DomShape";

// ============================================
// Helper functions to read from env with fallback
// ============================================

/// Get the prototype store root from environment or use the platform
/// data directory.
pub fn get_prototype_root() -> PathBuf {
    if let Ok(dir) = std::env::var("DOMSHAPE_PROTOTYPE_DIR") {
        return PathBuf::from(dir);
    }
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("domshape")
        .join("prototypes")
}

pub fn env_usize(key: &str, default: usize) -> usize {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

pub fn env_f64(key: &str, default: f64) -> f64 {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}
