use std::fs;
use std::path::{Path, PathBuf};

use super::types::{ClassLabel, PhishCluster, Prototype, PrototypeMeta};
use crate::error::ShapeResult;

/// Directory names under the store root.
const LEGIT_DIR: &str = "legit";
const PHISHING_DIR: &str = "phishing";
const PHISHING_CLUSTERED_DIR: &str = "phishing_clustered";

/// Read-only prototype collections, loaded once at process start.
///
/// Built explicitly and passed into the decision engine by reference;
/// request handling never mutates it. Rebuilds happen by restarting or by
/// atomically swapping a freshly constructed store.
#[derive(Debug, Clone, Default)]
pub struct PrototypeStore {
    pub legit: Vec<Prototype>,
    pub phish_clusters: Vec<PhishCluster>,
}

impl PrototypeStore {
    /// Load the flat layout: `<root>/phishing` becomes a single cluster.
    pub fn load_flat(root: &Path) -> ShapeResult<Self> {
        let legit = load_prototype_dir(&root.join(LEGIT_DIR), ClassLabel::Legit)?;
        let phish = load_prototype_dir(&root.join(PHISHING_DIR), ClassLabel::Phish)?;

        let phish_clusters = if phish.is_empty() {
            Vec::new()
        } else {
            vec![PhishCluster {
                id: 1,
                prototypes: phish,
            }]
        };

        let store = Self {
            legit,
            phish_clusters,
        };
        store.log_summary(root);
        Ok(store)
    }

    /// Load the clustered layout: `<root>/phishing_clustered/cluster_N`.
    pub fn load_clustered(root: &Path) -> ShapeResult<Self> {
        let legit = load_prototype_dir(&root.join(LEGIT_DIR), ClassLabel::Legit)?;

        let clustered_root = root.join(PHISHING_CLUSTERED_DIR);
        let mut phish_clusters = Vec::new();
        for dir in sorted_cluster_dirs(&clustered_root)? {
            let id = phish_clusters.len() + 1;
            let prototypes = load_prototype_dir(&dir, ClassLabel::Phish)?;
            if prototypes.is_empty() {
                log::warn!("Cluster directory {} is empty, skipping", dir.display());
                continue;
            }
            phish_clusters.push(PhishCluster { id, prototypes });
        }

        let store = Self {
            legit,
            phish_clusters,
        };
        store.log_summary(root);
        Ok(store)
    }

    pub fn phish_count(&self) -> usize {
        self.phish_clusters.iter().map(|c| c.prototypes.len()).sum()
    }

    pub fn legit_count(&self) -> usize {
        self.legit.len()
    }

    pub fn has_phish(&self) -> bool {
        self.phish_count() > 0
    }

    pub fn has_legit(&self) -> bool {
        !self.legit.is_empty()
    }

    fn log_summary(&self, root: &Path) {
        log::info!(
            "Prototype store at {}: {} phishing (in {} clusters), {} legitimate",
            root.display(),
            self.phish_count(),
            self.phish_clusters.len(),
            self.legit_count()
        );
    }
}

/// Load every `.dom` file in a directory as a prototype.
///
/// Empty files are skipped; a missing directory yields an empty list with
/// a warning so the engine can degrade instead of failing startup.
pub fn load_prototype_dir(dir: &Path, label: ClassLabel) -> ShapeResult<Vec<Prototype>> {
    if !dir.exists() {
        log::warn!("Prototype folder not found: {}", dir.display());
        return Ok(Vec::new());
    }

    let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().map_or(false, |ext| ext == "dom"))
        .collect();
    paths.sort();

    let mut items = Vec::new();
    for path in paths {
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) => {
                log::error!("Failed to load prototype {}: {}", path.display(), e);
                continue;
            }
        };
        if bytes.is_empty() {
            log::warn!("Skipping empty prototype {}", path.display());
            continue;
        }
        let meta = read_meta(&path, label, bytes.len());
        items.push(Prototype { bytes, meta });
    }

    log::info!("Loaded {} prototypes from {}", items.len(), dir.display());
    Ok(items)
}

/// Read the `.meta.json` sidecar, synthesizing a record when it is
/// missing or unreadable so an incomplete store still loads.
fn read_meta(dom_path: &Path, label: ClassLabel, size: usize) -> PrototypeMeta {
    let meta_path = dom_path.with_extension("meta.json");
    if let Ok(data) = fs::read_to_string(&meta_path) {
        match serde_json::from_str::<PrototypeMeta>(&data) {
            Ok(meta) => return meta,
            Err(e) => {
                log::warn!("Malformed metadata {}: {}", meta_path.display(), e);
            }
        }
    }
    PrototypeMeta {
        url: "unknown".to_string(),
        ts: 0,
        size,
        label,
    }
}

/// `cluster_N` subdirectories in numeric order.
fn sorted_cluster_dirs(root: &Path) -> ShapeResult<Vec<PathBuf>> {
    if !root.exists() {
        log::warn!("Clustered prototype folder not found: {}", root.display());
        return Ok(Vec::new());
    }

    let mut dirs: Vec<(usize, PathBuf)> = fs::read_dir(root)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_dir())
        .filter_map(|p| {
            let n = p
                .file_name()?
                .to_str()?
                .strip_prefix("cluster_")?
                .parse::<usize>()
                .ok()?;
            Some((n, p))
        })
        .collect();
    dirs.sort_by_key(|(n, _)| *n);
    Ok(dirs.into_iter().map(|(_, p)| p).collect())
}
