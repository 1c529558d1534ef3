//! Decision Engine
//!
//! Scores a subject byte sequence against every loaded prototype and
//! applies the classification policy: penalty adjustment, primary rule,
//! separation-based confidence, optional ML fusion.

use uuid::Uuid;

use super::types::{
    ClassificationResult, ClusterScore, ConfidenceTier, DecisionSource, ScoreBundle, Verdict,
};
use crate::error::ShapeResult;
use crate::logic::compress::CompressionOracle;
use crate::logic::config::DetectionConfig;
use crate::logic::model::{validate_prediction, FeatureMap, MlPredictor};
use crate::logic::ncd::ncd;
use crate::logic::prototypes::{Prototype, PrototypeStore};
use crate::logic::signature::SubjectMode;

/// Distance reported for a class with no prototypes, and for an empty
/// subject. Lets the comparison degrade instead of crashing.
const MAX_DISTANCE: f64 = 1.0;

/// Scoring paths. Selected once at startup, not per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoringStrategy {
    /// One flat phishing collection.
    Flat,
    /// Phishing structural families scored per cluster.
    Clustered,
}

impl ScoringStrategy {
    fn source(self) -> DecisionSource {
        match self {
            ScoringStrategy::Flat => DecisionSource::Prototype,
            ScoringStrategy::Clustered => DecisionSource::NcdClustered,
        }
    }
}

/// The similarity verdict engine.
///
/// Holds the read-only store; per-request scoring is pure computation, so
/// concurrent calls need no locking beyond the oracle's memo cache.
pub struct DecisionEngine {
    store: PrototypeStore,
    oracle: CompressionOracle,
    config: DetectionConfig,
    strategy: ScoringStrategy,
}

impl DecisionEngine {
    pub fn new(store: PrototypeStore, config: DetectionConfig, strategy: ScoringStrategy) -> Self {
        let oracle = CompressionOracle::new(config.compression_cache_capacity);
        Self {
            store,
            oracle,
            config,
            strategy,
        }
    }

    pub fn store(&self) -> &PrototypeStore {
        &self.store
    }

    /// Classify a subject byte sequence. NCD-only path.
    pub fn classify(&self, subject: &[u8], mode: SubjectMode) -> ShapeResult<ClassificationResult> {
        self.classify_with_ml(subject, mode, None, None)
    }

    /// Classify with optional ML fusion.
    ///
    /// When the predictor yields a valid prediction at or above the
    /// fusion threshold, its label becomes the final verdict. Any
    /// predictor failure falls back to the NCD verdict.
    pub fn classify_with_ml(
        &self,
        subject: &[u8],
        mode: SubjectMode,
        features: Option<&FeatureMap>,
        predictor: Option<&dyn MlPredictor>,
    ) -> ShapeResult<ClassificationResult> {
        let dom_size = subject.len();

        if !self.store.has_phish() && !self.store.has_legit() {
            log::warn!("No prototypes loaded; cannot perform NCD classification");
            let mut result = self.unknown_result(dom_size, mode);
            self.fuse_ml(&mut result, features, predictor);
            return Ok(result);
        }

        let scores = self.score(subject)?;
        let mut result = self.decide(scores, dom_size, mode);
        self.fuse_ml(&mut result, features, predictor);
        Ok(result)
    }

    // ========================================================================
    // SCORING
    // ========================================================================

    fn score(&self, subject: &[u8]) -> ShapeResult<ScoreBundle> {
        let (legit_min, legit_avg) = self.score_collection(subject, &self.store.legit)?;

        let mut cluster_scores = Vec::with_capacity(self.store.phish_clusters.len());
        let mut phish_min = MAX_DISTANCE;
        let mut phish_avg_acc = 0.0;
        let mut phish_total = 0usize;
        let mut best_cluster = None;

        for cluster in &self.store.phish_clusters {
            let (min, avg) = self.score_collection(subject, &cluster.prototypes)?;
            // Strict < keeps the lowest cluster id on ties.
            if best_cluster.is_none() || min < phish_min {
                phish_min = min;
                best_cluster = Some(cluster.id);
            }
            phish_avg_acc += avg * cluster.prototypes.len() as f64;
            phish_total += cluster.prototypes.len();
            cluster_scores.push(ClusterScore {
                cluster_id: cluster.id,
                min,
                avg,
            });
        }

        let phish_avg = if phish_total > 0 {
            phish_avg_acc / phish_total as f64
        } else {
            MAX_DISTANCE
        };
        if self.store.phish_clusters.is_empty() {
            log::warn!("No phishing prototypes available");
            phish_min = MAX_DISTANCE;
        }
        if self.store.legit.is_empty() {
            log::warn!("No legitimate prototypes available");
        }

        Ok(ScoreBundle {
            phish_min,
            phish_avg,
            legit_min,
            legit_avg,
            cluster_scores,
            best_cluster,
        })
    }

    /// Min and mean NCD of the subject to one collection. An empty
    /// collection, or an empty subject, scores maximal distance.
    fn score_collection(
        &self,
        subject: &[u8],
        prototypes: &[Prototype],
    ) -> ShapeResult<(f64, f64)> {
        if prototypes.is_empty() || subject.is_empty() {
            return Ok((MAX_DISTANCE, MAX_DISTANCE));
        }

        let mut min = f64::INFINITY;
        let mut sum = 0.0;
        for prototype in prototypes {
            let d = ncd(&self.oracle, subject, &prototype.bytes)?;
            if d < min {
                min = d;
            }
            sum += d;
        }
        Ok((min, sum / prototypes.len() as f64))
    }

    // ========================================================================
    // CLASSIFICATION POLICY
    // ========================================================================

    fn decide(&self, scores: ScoreBundle, dom_size: usize, mode: SubjectMode) -> ClassificationResult {
        // Minimal-input adjustment: tiny subjects are dominated by
        // compressor framing noise and statistically skew phishing, so
        // the penalty lands on the legitimate side only.
        let minimal = dom_size < self.config.minimal_dom_threshold;
        let (legit_min_adj, legit_avg_adj) = if minimal {
            log::info!(
                "Minimal subject ({} bytes < {}); applying +{} penalty to legitimate scores",
                dom_size,
                self.config.minimal_dom_threshold,
                self.config.minimal_dom_penalty
            );
            (
                scores.legit_min + self.config.minimal_dom_penalty,
                scores.legit_avg + self.config.minimal_dom_penalty,
            )
        } else {
            (scores.legit_min, scores.legit_avg)
        };

        // Primary rule: phish iff the best phishing match beats the best
        // (adjusted) legitimate match.
        let verdict = if scores.phish_min < legit_min_adj {
            Verdict::Phish
        } else {
            Verdict::Legit
        };

        let separation = (scores.phish_min - legit_min_adj).abs();
        let confidence = if separation > self.config.high_separation {
            ConfidenceTier::High
        } else if separation > self.config.low_separation {
            ConfidenceTier::Medium
        } else {
            ConfidenceTier::Low
        };

        let clustered = self.strategy == ScoringStrategy::Clustered;
        let reason = build_reason(
            &scores,
            legit_min_adj,
            minimal,
            verdict,
            self.config.minimal_dom_penalty,
            clustered,
        );

        log::info!(
            "NCD classification: {:?} (phish_min={:.4}, legit_min={:.4}, legit_min_adj={:.4}, separation={:.4}, minimal_adj={})",
            verdict,
            scores.phish_min,
            scores.legit_min,
            legit_min_adj,
            separation,
            minimal
        );

        ClassificationResult {
            verdict,
            confidence,
            decision_source: self.strategy.source(),
            phish_min: scores.phish_min,
            phish_avg: scores.phish_avg,
            legit_min: scores.legit_min,
            legit_avg: scores.legit_avg,
            legit_min_adjusted: legit_min_adj,
            legit_avg_adjusted: legit_avg_adj,
            minimal_dom_adjustment_applied: minimal,
            best_cluster: if clustered { scores.best_cluster } else { None },
            cluster_scores: if clustered { scores.cluster_scores } else { Vec::new() },
            dom_size,
            detection_mode: mode,
            detection_id: Uuid::new_v4(),
            reason,
            ml_prediction: None,
        }
    }

    fn unknown_result(&self, dom_size: usize, mode: SubjectMode) -> ClassificationResult {
        ClassificationResult {
            verdict: Verdict::Unknown,
            confidence: ConfidenceTier::Low,
            decision_source: self.strategy.source(),
            phish_min: MAX_DISTANCE,
            phish_avg: MAX_DISTANCE,
            legit_min: MAX_DISTANCE,
            legit_avg: MAX_DISTANCE,
            legit_min_adjusted: MAX_DISTANCE,
            legit_avg_adjusted: MAX_DISTANCE,
            minimal_dom_adjustment_applied: false,
            best_cluster: None,
            cluster_scores: Vec::new(),
            dom_size,
            detection_mode: mode,
            detection_id: Uuid::new_v4(),
            reason: "No prototypes available; run the offline prototype builder first".to_string(),
            ml_prediction: None,
        }
    }

    // ========================================================================
    // ML FUSION
    // ========================================================================

    fn fuse_ml(
        &self,
        result: &mut ClassificationResult,
        features: Option<&FeatureMap>,
        predictor: Option<&dyn MlPredictor>,
    ) {
        let (Some(features), Some(predictor)) = (features, predictor) else {
            return;
        };

        match predictor.predict(features).and_then(validate_prediction) {
            Ok(prediction) => {
                if prediction.probability >= self.config.ml_confidence_threshold {
                    log::info!(
                        "ML prediction: {} (confidence {:.4}) - using ML verdict",
                        prediction.label,
                        prediction.probability
                    );
                    result.verdict = prediction.label.into();
                    result.decision_source = DecisionSource::Ml;
                    result.reason.push_str(&format!(
                        " ML classifier overrode with {} at probability {:.4}.",
                        prediction.label, prediction.probability
                    ));
                } else {
                    log::info!(
                        "ML prediction: {} (confidence {:.4}) - below fusion threshold, keeping NCD verdict",
                        prediction.label,
                        prediction.probability
                    );
                }
                result.ml_prediction = Some(prediction);
            }
            Err(e) => {
                // External-signal failure: never aborts classification.
                log::warn!("ML prediction failed: {}. Using NCD verdict only.", e);
                result
                    .reason
                    .push_str(" ML signal unavailable; NCD-only verdict.");
            }
        }
    }
}

/// Reason string mirroring the score comparison the verdict came from.
fn build_reason(
    scores: &ScoreBundle,
    legit_min_adj: f64,
    minimal: bool,
    verdict: Verdict,
    penalty: f64,
    clustered: bool,
) -> String {
    let mut reason = format!(
        "Classified as {}. Phishing prototype distances: min={:.4}, avg={:.4}. \
         Legitimate prototype distances: min={:.4}, avg={:.4}.",
        match verdict {
            Verdict::Phish => "phish",
            Verdict::Legit => "legit",
            Verdict::Unknown => "unknown",
        },
        scores.phish_min,
        scores.phish_avg,
        scores.legit_min,
        scores.legit_avg,
    );
    if minimal {
        reason.push_str(&format!(" Minimal DOM penalty applied (+{}).", penalty));
    }
    match verdict {
        Verdict::Phish if minimal => reason.push_str(&format!(
            " Phishing prototype match ({:.4}) better than adjusted legitimate ({:.4}, original: {:.4}).",
            scores.phish_min, legit_min_adj, scores.legit_min
        )),
        Verdict::Phish => reason.push_str(&format!(
            " Phishing prototype match ({:.4}) better than legitimate ({:.4}).",
            scores.phish_min, scores.legit_min
        )),
        _ if minimal => reason.push_str(&format!(
            " Legitimate prototype match ({:.4}, original: {:.4}) better than phishing ({:.4}).",
            legit_min_adj, scores.legit_min, scores.phish_min
        )),
        _ => reason.push_str(&format!(
            " Legitimate prototype match ({:.4}) better than phishing ({:.4}).",
            scores.legit_min, scores.phish_min
        )),
    }
    if clustered {
        if let Some(id) = scores.best_cluster {
            reason.push_str(&format!(" Best phishing cluster: {}.", id));
        }
    }
    reason
}
