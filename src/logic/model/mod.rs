//! ML Fusion Boundary
//!
//! The supervised classifier is an external collaborator: a feature map
//! goes in, a labeled probability comes out. Only the boundary lives
//! here. Implementations may be absent or failing at any time, and the
//! decision engine must keep working without them, so unavailability is a
//! tagged result rather than a swallowed exception.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::logic::prototypes::ClassLabel;

/// Feature map handed to the external predictor. Opaque to this crate.
pub type FeatureMap = HashMap<String, f64>;

/// Output of the external classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MlPrediction {
    pub label: ClassLabel,
    /// Probability of the chosen label, in [0, 1].
    pub probability: f64,
}

/// Why no ML signal is available for this request.
#[derive(Debug, Clone, thiserror::Error)]
#[error("ml predictor unavailable: {0}")]
pub struct MlUnavailable(pub String);

/// External supervised classifier.
///
/// Treated as possibly absent or throwing; a failure here must never
/// abort classification.
pub trait MlPredictor: Send + Sync {
    fn predict(&self, features: &FeatureMap) -> Result<MlPrediction, MlUnavailable>;
}

/// Validate predictor output before fusing it.
///
/// Malformed output (probability outside [0, 1] or NaN) counts as an
/// external-signal error and degrades to the NCD-only path.
pub fn validate_prediction(prediction: MlPrediction) -> Result<MlPrediction, MlUnavailable> {
    if !prediction.probability.is_finite()
        || prediction.probability < 0.0
        || prediction.probability > 1.0
    {
        return Err(MlUnavailable(format!(
            "malformed probability {}",
            prediction.probability
        )));
    }
    Ok(prediction)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_prediction_passes() {
        let p = MlPrediction {
            label: ClassLabel::Phish,
            probability: 0.9,
        };
        assert!(validate_prediction(p).is_ok());
    }

    #[test]
    fn test_out_of_range_probability_is_unavailable() {
        let p = MlPrediction {
            label: ClassLabel::Legit,
            probability: 1.5,
        };
        assert!(validate_prediction(p).is_err());

        let p = MlPrediction {
            label: ClassLabel::Legit,
            probability: f64::NAN,
        };
        assert!(validate_prediction(p).is_err());
    }
}
