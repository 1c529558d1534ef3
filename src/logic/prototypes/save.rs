use std::fs;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use super::types::{ClassLabel, PrototypeMeta};
use crate::error::ShapeResult;

/// Persist one prototype as a `.dom` byte file plus a `.meta.json`
/// sidecar.
///
/// File stem is `<unix_ts>_<hash12>` where the hash covers the origin and
/// the bytes, so distinct captures of the same origin never collide.
/// Returns the paths written.
pub fn save_prototype(
    dir: &Path,
    origin: &str,
    bytes: &[u8],
    label: ClassLabel,
) -> ShapeResult<(PathBuf, PathBuf)> {
    fs::create_dir_all(dir)?;

    let ts = chrono::Utc::now().timestamp();
    let mut hasher = Sha256::new();
    hasher.update(origin.as_bytes());
    hasher.update(bytes);
    let digest = hex::encode(hasher.finalize());
    let base = format!("{}_{}", ts, &digest[..12]);

    let dom_path = dir.join(format!("{}.dom", base));
    let meta_path = dir.join(format!("{}.meta.json", base));

    fs::write(&dom_path, bytes)?;

    let meta = PrototypeMeta {
        url: origin.to_string(),
        ts,
        size: bytes.len(),
        label,
    };
    fs::write(&meta_path, serde_json::to_vec_pretty(&meta)?)?;

    Ok((dom_path, meta_path))
}
