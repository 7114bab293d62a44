//! Job orchestration for keepset.
//!
//! A job validates its [`JobConfig`], optionally truncates the retain-set,
//! runs every strategy through the marker, sweeps everything left
//! unretained, and finally hands the pruned store to the configured
//! [`PostSweepPass`]es.
//!
//! # Quick Start
//!
//! ```rust
//! use chrono::Utc;
//! use keepset_engine::{JobConfig, Pruner, RunMode};
//! use keepset_store::InMemoryRowStore;
//!
//! let store = InMemoryRowStore::new();
//! let pruner = Pruner::new(&store, JobConfig::default(), Utc::now()).unwrap();
//! let report = pruner.run(RunMode::Full).unwrap();
//! assert!(report.is_complete());
//! ```
//!
//! # Design Rules
//!
//! 1. Configuration errors surface before the first write.
//! 2. Phases run strictly in order: reset, mark, sweep, post passes.
//! 3. An early sweep stop is reported, not raised.

pub mod config;
pub mod error;
pub mod pass;
pub mod pruner;

pub use config::JobConfig;
pub use error::{ConfigError, EngineError, EngineResult};
pub use pass::{NoopPass, PassReport, PostSweepPass, ScrubCommentPii};
pub use pruner::{JobReport, Pruner, RunMode};
