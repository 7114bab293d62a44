use std::path::PathBuf;

use thiserror::Error;

use keepset_mark::MarkError;
use keepset_store::StoreError;
use keepset_strategy::StrategyError;
use keepset_sweep::SweepError;

/// Job configuration problems. All of them are detected before the job
/// touches the store.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Strategy(#[from] StrategyError),

    #[error("duplicate strategy name: {0}")]
    DuplicateStrategy(String),

    #[error("unknown preset: {0}")]
    UnknownPreset(String),

    #[error("no strategies configured; nothing would be retained")]
    NoStrategies,

    #[error("page_size must be positive")]
    ZeroPageSize,

    #[error("batch_size must be positive")]
    ZeroBatchSize,

    #[error("safety_factor must be a finite number >= 1, got {0}")]
    SafetyFactor(f64),

    #[error("scrub_comments requires local_domain")]
    MissingLocalDomain,

    #[error("failed to parse job file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors surfaced by a pruning job.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("marking failed: {0}")]
    Mark(#[from] MarkError),

    #[error("sweep failed: {0}")]
    Sweep(#[from] SweepError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("post-sweep pass {pass} failed: {source}")]
    PostPass {
        pass: String,
        #[source]
        source: StoreError,
    },
}

pub type EngineResult<T> = Result<T, EngineError>;
