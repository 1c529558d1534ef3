//! Normalized Compression Distance
//!
//! NCD(x, y) = (C(xy) - min(C(x), C(y))) / max(C(x), C(y))
//!
//! where C is the compression oracle and xy is byte concatenation. Lower
//! means more similar. The range is nominally [0, 1] but can slightly
//! exceed 1 on tiny inputs where compressor framing dominates; callers
//! must not assume a hard upper bound.

use crate::error::ShapeResult;
use crate::logic::compress::CompressionOracle;

/// NCD between two byte sequences.
///
/// Byte-identical inputs short-circuit to exactly 0.0: a real compressor
/// charges a few framing bytes for the duplicate half, and that noise
/// would otherwise leak into the identity property and the matrix
/// diagonal. Negative numerators clamp to 0.0 for the same reason.
///
/// All three size queries go through the same oracle so a single
/// compressor configuration backs every term.
pub fn ncd(oracle: &CompressionOracle, x: &[u8], y: &[u8]) -> ShapeResult<f64> {
    if x == y {
        return Ok(0.0);
    }

    let cx = oracle.compressed_size(x)? as f64;
    let cy = oracle.compressed_size(y)? as f64;
    let cxy = oracle.joint_compressed_size(x, y)? as f64;

    let max_c = cx.max(cy);
    if max_c == 0.0 {
        return Ok(0.0);
    }

    let value = (cxy - cx.min(cy)) / max_c;
    Ok(value.max(0.0))
}

/// Full pairwise distance matrix over a sample pool.
///
/// Symmetric with an exactly-zero diagonal; each off-diagonal pair is
/// computed once and mirrored. O(n^2) joint compressions - the dominant
/// cost of a clustering run, so callers compute it once and reuse it.
pub fn distance_matrix(oracle: &CompressionOracle, pool: &[Vec<u8>]) -> ShapeResult<Vec<Vec<f64>>> {
    let n = pool.len();
    let mut matrix = vec![vec![0.0; n]; n];

    let total_pairs = n.saturating_mul(n.saturating_sub(1)) / 2;
    log::info!(
        "Computing {}x{} distance matrix ({} pairwise NCD values)",
        n,
        n,
        total_pairs
    );

    for i in 0..n {
        for j in (i + 1)..n {
            let d = ncd(oracle, &pool[i], &pool[j])?;
            matrix[i][j] = d;
            matrix[j][i] = d;
        }
    }

    Ok(matrix)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn oracle() -> CompressionOracle {
        CompressionOracle::new(256)
    }

    #[test]
    fn test_identity_is_zero() {
        let o = oracle();
        let x = b"html head body div div span a img form input";
        assert_eq!(ncd(&o, x, x).unwrap(), 0.0);
    }

    #[test]
    fn test_non_negative() {
        let o = oracle();
        let x = b"html head meta title body div div div span";
        let y = b"completely unrelated resource list cdn.example.com/app.js";
        assert!(ncd(&o, x, y).unwrap() >= 0.0);
        assert!(ncd(&o, y, x).unwrap() >= 0.0);
    }

    #[test]
    fn test_similar_closer_than_unrelated() {
        let o = oracle();
        let base = b"html head body form input input button div div span".repeat(8);
        let mut near = base.clone();
        near.extend_from_slice(b" footer");
        let far = b"zqx jkw vbn mlp qaz wsx edc rfv tgb yhn ujm ikl".repeat(8);

        let d_near = ncd(&o, &base, &near).unwrap();
        let d_far = ncd(&o, &base, &far).unwrap();
        assert!(
            d_near < d_far,
            "near={} should be below far={}",
            d_near,
            d_far
        );
    }

    #[test]
    fn test_matrix_symmetric_zero_diagonal() {
        let o = oracle();
        let pool: Vec<Vec<u8>> = vec![
            b"html body div div div".to_vec(),
            b"html body form input button".to_vec(),
            b"svg path path circle rect".to_vec(),
        ];
        let m = distance_matrix(&o, &pool).unwrap();
        for i in 0..pool.len() {
            assert_eq!(m[i][i], 0.0);
            for j in 0..pool.len() {
                assert_eq!(m[i][j], m[j][i]);
            }
        }
    }
}
