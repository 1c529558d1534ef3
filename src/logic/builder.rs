//! Offline Prototype Builder
//!
//! Batch jobs that turn a labeled sample pool into the on-disk store the
//! decision engine loads: FPF subset selection per class, and structural
//! clustering of the phishing pool. Single-threaded; the O(n^2) distance
//! matrix dominates and greedy center selection is sequential anyway.

use std::fs;
use std::path::{Path, PathBuf};

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::error::{ShapeError, ShapeResult};
use crate::logic::compress::CompressionOracle;
use crate::logic::fpf::{self, SeedPolicy};
use crate::logic::ncd::distance_matrix;
use crate::logic::prototypes::save::save_prototype;
use crate::logic::prototypes::types::{ClassLabel, PrototypeMeta};

/// One labeled sample from the pool.
#[derive(Debug, Clone)]
pub struct Sample {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub origin: String,
}

/// Outcome of subset selection for one class.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassSummary {
    pub label: ClassLabel,
    pub pool_size: usize,
    pub requested_k: usize,
    pub selected: Vec<String>,
}

/// Outcome of a full prototype build.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildSummary {
    pub phishing: ClassSummary,
    pub legitimate: ClassSummary,
}

/// One phishing structural family in the clustering report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterInfo {
    pub id: usize,
    pub center: String,
    pub members: Vec<String>,
    /// Intra-cluster distance stats (min, max, avg); None for singletons.
    pub intra_distance: Option<(f64, f64, f64)>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterReport {
    pub total_samples: usize,
    pub clusters: Vec<ClusterInfo>,
}

// ============================================================================
// SAMPLE LOADING
// ============================================================================

/// Load every non-empty `.dom` sample in a directory, with its origin URL
/// from the `.meta.json` sidecar when present.
pub fn load_samples(dir: &Path) -> ShapeResult<Vec<Sample>> {
    if !dir.exists() {
        log::warn!("Sample folder not found: {}", dir.display());
        return Ok(Vec::new());
    }

    let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().map_or(false, |ext| ext == "dom"))
        .collect();
    paths.sort();

    let mut samples = Vec::new();
    for path in paths {
        let bytes = fs::read(&path)?;
        if bytes.is_empty() {
            log::warn!("Skipping empty sample {}", path.display());
            continue;
        }
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown.dom")
            .to_string();
        let origin = fs::read_to_string(path.with_extension("meta.json"))
            .ok()
            .and_then(|data| serde_json::from_str::<PrototypeMeta>(&data).ok())
            .map(|meta| meta.url)
            .unwrap_or_else(|| file_name.clone());
        samples.push(Sample {
            file_name,
            bytes,
            origin,
        });
    }

    log::info!("Loaded {} samples from {}", samples.len(), dir.display());
    Ok(samples)
}

// ============================================================================
// PROTOTYPE SELECTION
// ============================================================================

/// Build per-class prototype sets with FPF subset selection.
///
/// Expects `<samples_dir>/phishing` and `<samples_dir>/legit`; writes the
/// selected prototypes under the matching subdirectories of `output_dir`.
/// Random seeding avoids selection bias between runs.
pub fn build_prototypes(
    samples_dir: &Path,
    k: usize,
    output_dir: &Path,
    oracle: &CompressionOracle,
) -> ShapeResult<BuildSummary> {
    let phishing = select_class(
        &samples_dir.join("phishing"),
        &output_dir.join("phishing"),
        k,
        ClassLabel::Phish,
        oracle,
    )?;
    let legitimate = select_class(
        &samples_dir.join("legit"),
        &output_dir.join("legit"),
        k,
        ClassLabel::Legit,
        oracle,
    )?;
    Ok(BuildSummary {
        phishing,
        legitimate,
    })
}

fn select_class(
    samples_dir: &Path,
    output_dir: &Path,
    k: usize,
    label: ClassLabel,
    oracle: &CompressionOracle,
) -> ShapeResult<ClassSummary> {
    let samples = load_samples(samples_dir)?;
    if samples.is_empty() {
        log::warn!(
            "No {} samples in {}; skipping selection",
            label,
            samples_dir.display()
        );
        return Ok(ClassSummary {
            label,
            pool_size: 0,
            requested_k: k,
            selected: Vec::new(),
        });
    }

    let pool: Vec<Vec<u8>> = samples.iter().map(|s| s.bytes.clone()).collect();
    let matrix = distance_matrix(oracle, &pool)?;

    let mut rng = StdRng::from_entropy();
    let indices = fpf::select_subset(&matrix, k, SeedPolicy::Random, &mut rng)?;

    let mut selected = Vec::with_capacity(indices.len());
    for &i in &indices {
        let sample = &samples[i];
        save_prototype(output_dir, &sample.origin, &sample.bytes, label)?;
        selected.push(sample.file_name.clone());
    }

    log::info!(
        "Selected {}/{} {} prototypes from {} samples",
        selected.len(),
        k,
        label,
        samples.len()
    );
    Ok(ClassSummary {
        label,
        pool_size: samples.len(),
        requested_k: k,
        selected,
    })
}

// ============================================================================
// PHISHING-FAMILY CLUSTERING
// ============================================================================

/// Partition the phishing sample pool into structural families and write
/// the `cluster_N` directory layout the clustered store loads.
pub fn cluster_phishing(
    phishing_dir: &Path,
    output_dir: &Path,
    min_clusters: usize,
    max_clusters: usize,
    variance_epsilon: f64,
    oracle: &CompressionOracle,
) -> ShapeResult<ClusterReport> {
    let samples = load_samples(phishing_dir)?;
    if samples.len() < min_clusters {
        return Err(ShapeError::InvalidArgument(format!(
            "need at least {} phishing samples for clustering, got {}",
            min_clusters,
            samples.len()
        )));
    }

    let pool: Vec<Vec<u8>> = samples.iter().map(|s| s.bytes.clone()).collect();
    let matrix = distance_matrix(oracle, &pool)?;
    let clustering = fpf::cluster(&matrix, min_clusters, max_clusters, variance_epsilon)?;

    // Rebuild the clustered layout from scratch so stale families from a
    // previous run cannot leak in.
    if output_dir.exists() {
        fs::remove_dir_all(output_dir)?;
    }

    for (i, sample) in samples.iter().enumerate() {
        let cluster_id = clustering.assignments[i] + 1;
        let cluster_dir = output_dir.join(format!("cluster_{}", cluster_id));
        save_prototype(&cluster_dir, &sample.origin, &sample.bytes, ClassLabel::Phish)?;
    }

    let report = build_report(&samples, &matrix, &clustering);
    for info in &report.clusters {
        log::info!(
            "Cluster {}: {} samples, center {}",
            info.id,
            info.members.len(),
            info.center
        );
    }
    Ok(report)
}

fn build_report(
    samples: &[Sample],
    matrix: &[Vec<f64>],
    clustering: &fpf::Clustering,
) -> ClusterReport {
    let clusters = clustering
        .centers
        .iter()
        .enumerate()
        .map(|(c, &center_idx)| {
            let member_indices: Vec<usize> = clustering
                .assignments
                .iter()
                .enumerate()
                .filter(|(_, &a)| a == c)
                .map(|(i, _)| i)
                .collect();

            let mut intra = Vec::new();
            for (a, &i) in member_indices.iter().enumerate() {
                for &j in &member_indices[a + 1..] {
                    intra.push(matrix[i][j]);
                }
            }
            let intra_distance = if intra.is_empty() {
                None
            } else {
                let min = intra.iter().cloned().fold(f64::INFINITY, f64::min);
                let max = intra.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
                let avg = intra.iter().sum::<f64>() / intra.len() as f64;
                Some((min, max, avg))
            };

            ClusterInfo {
                id: c + 1,
                center: samples[center_idx].file_name.clone(),
                members: member_indices
                    .iter()
                    .map(|&i| samples[i].file_name.clone())
                    .collect(),
                intra_distance,
            }
        })
        .collect();

    ClusterReport {
        total_samples: samples.len(),
        clusters,
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::prototypes::PrototypeStore;
    use tempfile::tempdir;

    fn write_sample(dir: &Path, name: &str, bytes: &[u8]) {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join(format!("{}.dom", name)), bytes).unwrap();
    }

    fn families() -> Vec<Vec<u8>> {
        let login = b"html body form input input button img".repeat(10);
        let redirect = b"html head meta script script".repeat(10);
        vec![
            login.clone(),
            [&login[..], b" div" as &[u8]].concat(),
            redirect.clone(),
            [&redirect[..], b" noscript" as &[u8]].concat(),
        ]
    }

    #[test]
    fn test_build_prototypes_round_trip() {
        let dir = tempdir().unwrap();
        let samples_dir = dir.path().join("samples");
        let output_dir = dir.path().join("prototypes");

        for (i, bytes) in families().iter().enumerate() {
            write_sample(&samples_dir.join("phishing"), &format!("p{}", i), bytes);
        }
        write_sample(
            &samples_dir.join("legit"),
            "l0",
            &b"html head body main article section p p".repeat(10),
        );

        let oracle = CompressionOracle::new(256);
        let summary = build_prototypes(&samples_dir, 2, &output_dir, &oracle).unwrap();
        assert_eq!(summary.phishing.selected.len(), 2);
        // Pool smaller than k: the whole pool is kept.
        assert_eq!(summary.legitimate.selected.len(), 1);

        let store = PrototypeStore::load_flat(&output_dir).unwrap();
        assert_eq!(store.phish_count(), 2);
        assert_eq!(store.legit_count(), 1);
    }

    #[test]
    fn test_cluster_phishing_writes_cluster_layout() {
        let dir = tempdir().unwrap();
        let phishing_dir = dir.path().join("samples").join("phishing");
        let output_dir = dir.path().join("store").join("phishing_clustered");

        for (i, bytes) in families().iter().enumerate() {
            write_sample(&phishing_dir, &format!("p{}", i), bytes);
        }

        let oracle = CompressionOracle::new(256);
        let report = cluster_phishing(&phishing_dir, &output_dir, 2, 4, 0.001, &oracle).unwrap();
        assert_eq!(report.total_samples, 4);
        assert!(report.clusters.len() >= 2);

        let member_total: usize = report.clusters.iter().map(|c| c.members.len()).sum();
        assert_eq!(member_total, 4);

        for info in &report.clusters {
            assert!(output_dir.join(format!("cluster_{}", info.id)).is_dir());
        }
    }

    #[test]
    fn test_cluster_with_too_few_samples_is_error() {
        let dir = tempdir().unwrap();
        let phishing_dir = dir.path().join("phishing");
        write_sample(&phishing_dir, "only", b"html body div");

        let oracle = CompressionOracle::new(16);
        let result = cluster_phishing(
            &phishing_dir,
            &dir.path().join("out"),
            2,
            4,
            0.001,
            &oracle,
        );
        assert!(result.is_err());
    }
}
