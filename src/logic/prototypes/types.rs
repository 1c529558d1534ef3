use serde::{Deserialize, Serialize};

/// Class label of a prototype or verdict side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassLabel {
    Phish,
    Legit,
}

impl std::fmt::Display for ClassLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClassLabel::Phish => write!(f, "phish"),
            ClassLabel::Legit => write!(f, "legit"),
        }
    }
}

/// Sidecar metadata record stored next to each `.dom` file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrototypeMeta {
    /// Originating identifier, usually the rendered URL.
    pub url: String,
    /// Unix timestamp of capture.
    pub ts: i64,
    /// Byte length of the `.dom` file at save time.
    pub size: usize,
    pub label: ClassLabel,
}

/// A stored reference byte sequence used as a comparison anchor.
///
/// Immutable once loaded; the sole unit of comparison for the engine.
#[derive(Debug, Clone)]
pub struct Prototype {
    pub bytes: Vec<u8>,
    pub meta: PrototypeMeta,
}

/// A structurally homogeneous phishing family.
#[derive(Debug, Clone)]
pub struct PhishCluster {
    /// 1-based cluster id matching the `cluster_N` directory name.
    pub id: usize,
    pub prototypes: Vec<Prototype>,
}
