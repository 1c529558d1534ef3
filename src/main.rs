//! domshape - offline prototype building and one-shot classification

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use domshape_core::constants::{
    self, CLUSTER_VARIANCE_EPSILON, DEFAULT_PROTOTYPES_PER_CLASS, MAX_CLUSTERS, MIN_CLUSTERS,
};
use domshape_core::logic::builder;
use domshape_core::logic::compress::CompressionOracle;
use domshape_core::{DecisionEngine, DetectionConfig, PrototypeStore, ScoringStrategy, SubjectMode};

#[derive(Parser)]
#[command(name = "domshape", about = "DOM-shape phishing classifier", version)]
enum Cli {
    /// Select diverse per-class prototypes from a labeled sample pool
    BuildPrototypes(BuildPrototypesArgs),
    /// Partition the phishing sample pool into structural families
    Cluster(ClusterArgs),
    /// Classify one subject byte file against the prototype store
    Classify(ClassifyArgs),
}

#[derive(Parser)]
struct BuildPrototypesArgs {
    #[arg(long, help = "Directory with phishing/ and legit/ sample pools")]
    samples_dir: PathBuf,

    #[arg(long, default_value_t = DEFAULT_PROTOTYPES_PER_CLASS,
          help = "Prototypes to select per class")]
    k: usize,

    #[arg(long, help = "Prototype store root to write")]
    output_dir: PathBuf,
}

#[derive(Parser)]
struct ClusterArgs {
    #[arg(long, help = "Directory with phishing .dom samples")]
    phishing_dir: PathBuf,

    #[arg(long, help = "phishing_clustered/ directory to write")]
    output_dir: PathBuf,

    #[arg(long, default_value_t = MAX_CLUSTERS)]
    max_clusters: usize,
}

#[derive(Parser)]
struct ClassifyArgs {
    #[arg(long, help = "Subject byte file (sanitized DOM or resource signature)")]
    input: PathBuf,

    #[arg(long, help = "Prototype store root (defaults to the data directory)")]
    prototypes: Option<PathBuf>,

    #[arg(long, help = "Use the clustered phishing layout")]
    clustered: bool,

    #[arg(long, help = "Subject is a resource signature, not a DOM tag stream")]
    resource_signature: bool,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!(
        "Starting {} v{}",
        constants::APP_NAME,
        constants::APP_VERSION
    );

    let result = match Cli::parse() {
        Cli::BuildPrototypes(args) => build_prototypes(args),
        Cli::Cluster(args) => cluster(args),
        Cli::Classify(args) => classify(args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn build_prototypes(args: BuildPrototypesArgs) -> domshape_core::ShapeResult<()> {
    let config = DetectionConfig::from_env();
    let oracle = CompressionOracle::new(config.compression_cache_capacity);

    let summary = builder::build_prototypes(&args.samples_dir, args.k, &args.output_dir, &oracle)?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    log::info!("Prototypes saved to {}", args.output_dir.display());
    Ok(())
}

fn cluster(args: ClusterArgs) -> domshape_core::ShapeResult<()> {
    let config = DetectionConfig::from_env();
    let oracle = CompressionOracle::new(config.compression_cache_capacity);

    let report = builder::cluster_phishing(
        &args.phishing_dir,
        &args.output_dir,
        MIN_CLUSTERS,
        args.max_clusters,
        CLUSTER_VARIANCE_EPSILON,
        &oracle,
    )?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn classify(args: ClassifyArgs) -> domshape_core::ShapeResult<()> {
    let config = DetectionConfig::from_env();
    let root = args
        .prototypes
        .unwrap_or_else(constants::get_prototype_root);

    let (store, strategy) = if args.clustered {
        (
            PrototypeStore::load_clustered(&root)?,
            ScoringStrategy::Clustered,
        )
    } else {
        (PrototypeStore::load_flat(&root)?, ScoringStrategy::Flat)
    };

    let subject = fs::read(&args.input)?;
    let mode = if args.resource_signature {
        SubjectMode::ResourceSignature
    } else {
        SubjectMode::DomStructure
    };

    let engine = DecisionEngine::new(store, config, strategy);
    let result = engine.classify(&subject, mode)?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
