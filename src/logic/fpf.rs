//! Farthest-Point-First selection and clustering
//!
//! One greedy primitive, two uses:
//! - subset selection: pick k maximally mutually-distant representatives
//!   from a same-label pool (diverse prototype sets);
//! - clustering: partition the phishing pool into structural families,
//!   stopping early when another center no longer reduces the variance of
//!   distance-to-nearest-center.
//!
//! Both operate on a precomputed distance matrix; center selection is
//! inherently sequential (every step depends on all previous picks).

use rand::Rng;

use crate::error::{ShapeError, ShapeResult};

/// How the first point is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedPolicy {
    /// Uniformly random seed. Used for prototype-subset selection to
    /// avoid run-to-run selection bias.
    Random,
    /// Start from the sample with the highest average distance to the
    /// rest of the pool - the most atypical one. Used for clustering.
    MaxAvgDistance,
}

/// Output of the clustering variant.
#[derive(Debug, Clone)]
pub struct Clustering {
    /// Cluster index per pool point, parallel to the pool.
    pub assignments: Vec<usize>,
    /// Pool indices of the selected centers, in selection order.
    pub centers: Vec<usize>,
}

// ============================================================================
// SUBSET SELECTION
// ============================================================================

/// Select `k` mutually-distant pool indices.
///
/// Ties break toward the lowest pool index so runs with the same seed are
/// deterministic. `k == 0` is a caller error; `k >= n` returns the whole
/// pool (with a warning) since no selection is needed.
pub fn select_subset<R: Rng>(
    matrix: &[Vec<f64>],
    k: usize,
    policy: SeedPolicy,
    rng: &mut R,
) -> ShapeResult<Vec<usize>> {
    let n = matrix.len();
    if k == 0 {
        return Err(ShapeError::InvalidArgument(
            "subset size k must be positive".to_string(),
        ));
    }
    if k >= n {
        log::warn!(
            "Requested {} prototypes from a pool of {}; returning the full pool",
            k,
            n
        );
        return Ok((0..n).collect());
    }

    let seed = match policy {
        SeedPolicy::Random => rng.gen_range(0..n),
        SeedPolicy::MaxAvgDistance => max_avg_distance_index(matrix),
    };

    let mut selected = vec![seed];
    // Distance from each point to its nearest selected point.
    let mut nearest = matrix[seed].clone();

    while selected.len() < k {
        let next = argmax_excluding(&nearest, &selected);
        selected.push(next);
        for (dist, &d_new) in nearest.iter_mut().zip(matrix[next].iter()) {
            if d_new < *dist {
                *dist = d_new;
            }
        }
    }

    Ok(selected)
}

// ============================================================================
// CLUSTERING
// ============================================================================

/// Partition the pool into structural families.
///
/// Seeds from the most atypical sample, adds farthest-first centers up to
/// `max_clusters`, and stops early once adding a center reduces the
/// variance of distance-to-nearest-center by less than `variance_epsilon`
/// (provided at least `min_clusters` centers exist). Every point then
/// joins its nearest center, ties toward the lowest cluster index.
pub fn cluster(
    matrix: &[Vec<f64>],
    min_clusters: usize,
    max_clusters: usize,
    variance_epsilon: f64,
) -> ShapeResult<Clustering> {
    let n = matrix.len();
    if min_clusters == 0 || max_clusters < min_clusters {
        return Err(ShapeError::InvalidArgument(format!(
            "invalid cluster bounds: min={}, max={}",
            min_clusters, max_clusters
        )));
    }
    if n < min_clusters {
        return Err(ShapeError::InvalidArgument(format!(
            "need at least {} samples for clustering, got {}",
            min_clusters, n
        )));
    }

    let seed = max_avg_distance_index(matrix);
    let mut centers = vec![seed];
    let mut nearest = matrix[seed].clone();
    log::info!(
        "Initial cluster center: sample {} (avg distance {:.4})",
        seed,
        row_mean(&matrix[seed])
    );

    while centers.len() < max_clusters && centers.len() < n {
        let candidate = argmax_excluding(&nearest, &centers);

        let old_variance = variance(&nearest);
        let trial: Vec<f64> = nearest
            .iter()
            .zip(matrix[candidate].iter())
            .map(|(&a, &b)| a.min(b))
            .collect();
        let reduction = old_variance - variance(&trial);

        if reduction < variance_epsilon && centers.len() >= min_clusters {
            log::info!(
                "Stopping at {} clusters: variance reduction {:.6} below epsilon",
                centers.len(),
                reduction
            );
            break;
        }

        log::info!(
            "Cluster {}: center sample {} (distance to nearest center {:.4}, variance reduction {:.6})",
            centers.len() + 1,
            candidate,
            nearest[candidate],
            reduction
        );
        centers.push(candidate);
        nearest = trial;
    }

    let assignments = assign_to_centers(matrix, &centers);
    Ok(Clustering {
        assignments,
        centers,
    })
}

/// Nearest-center assignment, ties toward the lowest cluster index.
pub fn assign_to_centers(matrix: &[Vec<f64>], centers: &[usize]) -> Vec<usize> {
    (0..matrix.len())
        .map(|i| {
            let mut best = 0;
            let mut best_dist = matrix[i][centers[0]];
            for (c, &center) in centers.iter().enumerate().skip(1) {
                let d = matrix[i][center];
                if d < best_dist {
                    best = c;
                    best_dist = d;
                }
            }
            best
        })
        .collect()
}

// ============================================================================
// HELPERS
// ============================================================================

fn max_avg_distance_index(matrix: &[Vec<f64>]) -> usize {
    let mut best = 0;
    let mut best_mean = f64::NEG_INFINITY;
    for (i, row) in matrix.iter().enumerate() {
        let mean = row_mean(row);
        if mean > best_mean {
            best = i;
            best_mean = mean;
        }
    }
    best
}

fn row_mean(row: &[f64]) -> f64 {
    if row.is_empty() {
        return 0.0;
    }
    row.iter().sum::<f64>() / row.len() as f64
}

/// Index maximizing `values`, skipping `excluded`; strict comparison keeps
/// the lowest index on ties.
fn argmax_excluding(values: &[f64], excluded: &[usize]) -> usize {
    let mut best = usize::MAX;
    let mut best_value = f64::NEG_INFINITY;
    for (i, &v) in values.iter().enumerate() {
        if excluded.contains(&i) {
            continue;
        }
        if v > best_value {
            best = i;
            best_value = v;
        }
    }
    best
}

fn variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// Two tight pairs far apart plus one outlier.
    fn toy_matrix() -> Vec<Vec<f64>> {
        vec![
            vec![0.0, 0.1, 0.9, 0.9, 0.8],
            vec![0.1, 0.0, 0.9, 0.9, 0.8],
            vec![0.9, 0.9, 0.0, 0.1, 0.8],
            vec![0.9, 0.9, 0.1, 0.0, 0.8],
            vec![0.8, 0.8, 0.8, 0.8, 0.0],
        ]
    }

    #[test]
    fn test_subset_returns_k_unique_valid_indices() {
        let m = toy_matrix();
        let mut rng = StdRng::seed_from_u64(7);
        for k in 1..=5 {
            let sel = select_subset(&m, k, SeedPolicy::Random, &mut rng).unwrap();
            assert_eq!(sel.len(), k);
            let mut sorted = sel.clone();
            sorted.sort_unstable();
            sorted.dedup();
            assert_eq!(sorted.len(), k, "indices must be unique");
            assert!(sel.iter().all(|&i| i < m.len()));
        }
    }

    #[test]
    fn test_k_at_least_n_returns_full_pool() {
        let m = toy_matrix();
        let mut rng = StdRng::seed_from_u64(7);
        let sel = select_subset(&m, 12, SeedPolicy::Random, &mut rng).unwrap();
        assert_eq!(sel, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_k_zero_is_error() {
        let m = toy_matrix();
        let mut rng = StdRng::seed_from_u64(7);
        assert!(select_subset(&m, 0, SeedPolicy::Random, &mut rng).is_err());
    }

    #[test]
    fn test_selection_spreads_across_groups() {
        let m = toy_matrix();
        let mut rng = StdRng::seed_from_u64(7);
        let sel = select_subset(&m, 2, SeedPolicy::MaxAvgDistance, &mut rng).unwrap();
        // The two picks must come from different tight pairs (or the
        // outlier), never both from the same pair.
        let group = |i: usize| match i {
            0 | 1 => 0,
            2 | 3 => 1,
            _ => 2,
        };
        assert_ne!(group(sel[0]), group(sel[1]));
    }

    #[test]
    fn test_cluster_assignment_invariant() {
        let m = toy_matrix();
        let clustering = cluster(&m, 2, 4, 0.001).unwrap();
        for i in 0..m.len() {
            let assigned = m[i][clustering.centers[clustering.assignments[i]]];
            let best = clustering
                .centers
                .iter()
                .map(|&c| m[i][c])
                .fold(f64::INFINITY, f64::min);
            assert_eq!(assigned, best, "point {} not assigned to nearest center", i);
        }
    }

    #[test]
    fn test_cluster_respects_bounds() {
        let m = toy_matrix();
        let clustering = cluster(&m, 2, 4, 0.001).unwrap();
        assert!(clustering.centers.len() >= 2);
        assert!(clustering.centers.len() <= 4);
        assert_eq!(clustering.assignments.len(), m.len());
    }

    #[test]
    fn test_cluster_too_few_samples_is_error() {
        let m = vec![vec![0.0]];
        assert!(cluster(&m, 2, 4, 0.001).is_err());
    }
}
