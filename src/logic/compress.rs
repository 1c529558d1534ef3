//! Compression Oracle
//!
//! Deterministic zlib compressed-size queries with a bounded memo cache.
//! The same prototypes get compressed on every request, so single-sequence
//! sizes are cached; joint (concatenated) sizes are pair-dependent and are
//! not.

use std::collections::{HashMap, VecDeque};
use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;
use parking_lot::Mutex;
use sha2::{Digest, Sha256};

use crate::error::{ShapeError, ShapeResult};

/// Fixed compression level. Changing it invalidates every distance the
/// engine has ever produced, so it is not a config knob.
const COMPRESSION_LEVEL: u32 = 6;

type CacheKey = [u8; 32];

// ============================================================================
// ORACLE
// ============================================================================

/// Memoizing compressed-size oracle.
///
/// Safe for concurrent use; the cache is the only shared mutable state and
/// is capacity-bounded with oldest-first eviction.
pub struct CompressionOracle {
    cache: Mutex<SizeCache>,
}

struct SizeCache {
    map: HashMap<CacheKey, usize>,
    order: VecDeque<CacheKey>,
    capacity: usize,
}

impl CompressionOracle {
    pub fn new(cache_capacity: usize) -> Self {
        Self {
            cache: Mutex::new(SizeCache {
                map: HashMap::new(),
                order: VecDeque::new(),
                capacity: cache_capacity.max(1),
            }),
        }
    }

    /// Compressed size of `bytes`, memoized.
    ///
    /// Deterministic for identical input: same compressor, same level.
    /// Empty input returns the compressor's framing size, never zero.
    pub fn compressed_size(&self, bytes: &[u8]) -> ShapeResult<usize> {
        let key: CacheKey = Sha256::digest(bytes).into();

        if let Some(&size) = self.cache.lock().map.get(&key) {
            return Ok(size);
        }

        let size = compress_len(bytes)?;

        let mut cache = self.cache.lock();
        if !cache.map.contains_key(&key) {
            if cache.map.len() >= cache.capacity {
                if let Some(oldest) = cache.order.pop_front() {
                    cache.map.remove(&oldest);
                }
            }
            cache.map.insert(key, size);
            cache.order.push_back(key);
        }
        Ok(size)
    }

    /// Compressed size of `x` followed by `y`. Pair-dependent; bypasses
    /// the cache.
    pub fn joint_compressed_size(&self, x: &[u8], y: &[u8]) -> ShapeResult<usize> {
        let mut joined = Vec::with_capacity(x.len() + y.len());
        joined.extend_from_slice(x);
        joined.extend_from_slice(y);
        compress_len(&joined)
    }

    pub fn cache_len(&self) -> usize {
        self.cache.lock().map.len()
    }
}

fn compress_len(bytes: &[u8]) -> ShapeResult<usize> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::new(COMPRESSION_LEVEL));
    encoder
        .write_all(bytes)
        .map_err(|e| ShapeError::CompressionFailed(format!("zlib write: {}", e)))?;
    let compressed = encoder
        .finish()
        .map_err(|e| ShapeError::CompressionFailed(format!("zlib finish: {}", e)))?;
    Ok(compressed.len())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic_for_identical_input() {
        let oracle = CompressionOracle::new(16);
        let data = b"<html><body><form><input></form></body></html>";
        let a = oracle.compressed_size(data).unwrap();
        let b = oracle.compressed_size(data).unwrap();
        assert_eq!(a, b);
        assert_eq!(oracle.cache_len(), 1);
    }

    #[test]
    fn test_empty_input_has_minimal_size() {
        let oracle = CompressionOracle::new(16);
        let size = oracle.compressed_size(b"").unwrap();
        // zlib frames even an empty stream.
        assert!(size > 0);
    }

    #[test]
    fn test_cache_is_bounded() {
        let oracle = CompressionOracle::new(4);
        for i in 0..20u32 {
            let data = i.to_le_bytes();
            oracle.compressed_size(&data).unwrap();
        }
        assert!(oracle.cache_len() <= 4);
    }

    #[test]
    fn test_joint_size_at_least_single() {
        let oracle = CompressionOracle::new(16);
        let x = b"div span div span div span";
        let y = b"form input form input form";
        let cx = oracle.compressed_size(x).unwrap();
        let cxy = oracle.joint_compressed_size(x, y).unwrap();
        assert!(cxy >= cx);
    }
}
