use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::logic::model::MlPrediction;
use crate::logic::prototypes::ClassLabel;
use crate::logic::signature::SubjectMode;

/// Final classification of a subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Phish,
    Legit,
    Unknown,
}

impl From<ClassLabel> for Verdict {
    fn from(label: ClassLabel) -> Self {
        match label {
            ClassLabel::Phish => Verdict::Phish,
            ClassLabel::Legit => Verdict::Legit,
        }
    }
}

/// Confidence tier derived from score separation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceTier {
    Low,
    Medium,
    High,
}

/// Which policy produced the final verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecisionSource {
    #[serde(rename = "prototype")]
    Prototype,
    #[serde(rename = "ncd-clustered")]
    NcdClustered,
    #[serde(rename = "ml")]
    Ml,
}

/// Distances of the subject to one phishing cluster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterScore {
    pub cluster_id: usize,
    pub min: f64,
    pub avg: f64,
}

/// Per-request raw distances. Created per classification call and
/// discarded after the response is built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreBundle {
    pub phish_min: f64,
    pub phish_avg: f64,
    pub legit_min: f64,
    pub legit_avg: f64,
    /// Per-cluster scores (clustered strategy only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cluster_scores: Vec<ClusterScore>,
    /// Cluster with the global best phishing match.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_cluster: Option<usize>,
}

/// Classification result exposed to the calling layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub verdict: Verdict,
    pub confidence: ConfidenceTier,
    pub decision_source: DecisionSource,

    pub phish_min: f64,
    pub phish_avg: f64,
    pub legit_min: f64,
    pub legit_avg: f64,

    /// Legitimate scores after the minimal-input adjustment. Equal to the
    /// raw values when no adjustment applied.
    pub legit_min_adjusted: f64,
    pub legit_avg_adjusted: f64,
    pub minimal_dom_adjustment_applied: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_cluster: Option<usize>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cluster_scores: Vec<ClusterScore>,

    pub dom_size: usize,
    pub detection_mode: SubjectMode,
    pub detection_id: Uuid,

    /// Free-text explanation of the decision path.
    pub reason: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ml_prediction: Option<MlPrediction>,
}
