//! Detection Configuration
//!
//! All tunables of the similarity engine in one struct. The cutoffs are
//! calibration knobs, not derived truths; re-tune them against your own
//! labeled corpus.

use serde::{Deserialize, Serialize};

use crate::constants::{
    env_f64, env_usize, DEFAULT_COMPRESSION_CACHE_CAPACITY, DEFAULT_HIGH_SEPARATION,
    DEFAULT_LOW_SEPARATION, DEFAULT_MINIMAL_DOM_PENALTY, DEFAULT_MINIMAL_DOM_THRESHOLD,
    DEFAULT_ML_CONFIDENCE_THRESHOLD, DEFAULT_SMALL_DOM_THRESHOLD,
};

/// Detection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Subjects below this byte length get the legit-side penalty.
    pub minimal_dom_threshold: usize,

    /// Penalty added to legit min/avg for minimal subjects.
    pub minimal_dom_penalty: f64,

    /// Sanitized DOMs below this byte length are classified by resource
    /// signature upstream of the engine.
    pub small_dom_threshold: usize,

    /// Separation cutoff for a high-confidence verdict.
    pub high_separation: f64,

    /// Separation cutoff for a medium-confidence verdict.
    pub low_separation: f64,

    /// ML probability at or above which the ML label wins.
    pub ml_confidence_threshold: f64,

    /// Memo cache bound for the compression oracle.
    pub compression_cache_capacity: usize,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            minimal_dom_threshold: DEFAULT_MINIMAL_DOM_THRESHOLD,
            minimal_dom_penalty: DEFAULT_MINIMAL_DOM_PENALTY,
            small_dom_threshold: DEFAULT_SMALL_DOM_THRESHOLD,
            high_separation: DEFAULT_HIGH_SEPARATION,
            low_separation: DEFAULT_LOW_SEPARATION,
            ml_confidence_threshold: DEFAULT_ML_CONFIDENCE_THRESHOLD,
            compression_cache_capacity: DEFAULT_COMPRESSION_CACHE_CAPACITY,
        }
    }
}

impl DetectionConfig {
    /// Read overrides from `DOMSHAPE_*` environment variables, falling
    /// back to the compiled defaults.
    pub fn from_env() -> Self {
        Self {
            minimal_dom_threshold: env_usize(
                "DOMSHAPE_MINIMAL_DOM_THRESHOLD",
                DEFAULT_MINIMAL_DOM_THRESHOLD,
            ),
            minimal_dom_penalty: env_f64(
                "DOMSHAPE_MINIMAL_DOM_PENALTY",
                DEFAULT_MINIMAL_DOM_PENALTY,
            ),
            small_dom_threshold: env_usize(
                "DOMSHAPE_SMALL_DOM_THRESHOLD",
                DEFAULT_SMALL_DOM_THRESHOLD,
            ),
            high_separation: env_f64("DOMSHAPE_HIGH_SEPARATION", DEFAULT_HIGH_SEPARATION),
            low_separation: env_f64("DOMSHAPE_LOW_SEPARATION", DEFAULT_LOW_SEPARATION),
            ml_confidence_threshold: env_f64(
                "DOMSHAPE_ML_CONFIDENCE_THRESHOLD",
                DEFAULT_ML_CONFIDENCE_THRESHOLD,
            ),
            compression_cache_capacity: env_usize(
                "DOMSHAPE_COMPRESSION_CACHE_CAPACITY",
                DEFAULT_COMPRESSION_CACHE_CAPACITY,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DetectionConfig::default();
        assert_eq!(config.minimal_dom_threshold, 120);
        assert!(config.high_separation > config.low_separation);
    }
}
