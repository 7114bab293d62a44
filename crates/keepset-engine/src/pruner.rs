use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use keepset_mark::{MarkReport, Marker};
use keepset_store::RowStore;
use keepset_strategy::RootStrategy;
use keepset_sweep::{MaintenanceHooks, NoopHooks, SweepReport, Sweeper};

use crate::config::JobConfig;
use crate::error::{ConfigError, EngineError, EngineResult};
use crate::pass::{PassReport, PostSweepPass, ScrubCommentPii};

/// How far a job goes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    /// Mark, sweep, then run post-sweep passes.
    Full,
    /// Mark only and report how many objects a sweep would select.
    MarkOnly,
}

/// Everything a job did.
#[derive(Clone, Debug, Serialize)]
pub struct JobReport {
    pub run_id: Uuid,
    pub mode: RunMode,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub marks: Vec<MarkReport>,
    /// Retain-set size after marking.
    pub retained: u64,
    /// Sweep candidates left after marking.
    pub candidates: u64,
    pub sweep: Option<SweepReport>,
    pub post_passes: Vec<PassReport>,
}

impl JobReport {
    /// True when the sweep ran and removed every candidate.
    pub fn is_complete(&self) -> bool {
        self.sweep.is_some_and(|s| s.outcome.is_complete())
    }
}

/// Runs a pruning job against one store.
///
/// All configuration, including every strategy, is checked before the
/// first statement that changes the store.
pub struct Pruner<'s> {
    store: &'s dyn RowStore,
    config: JobConfig,
    strategies: Vec<Box<dyn RootStrategy>>,
    hooks: Box<dyn MaintenanceHooks>,
    post_passes: Vec<Box<dyn PostSweepPass>>,
}

impl<'s> Pruner<'s> {
    /// Build a job from `config`, measuring recency windows from `now`.
    pub fn new(store: &'s dyn RowStore, config: JobConfig, now: DateTime<Utc>) -> EngineResult<Self> {
        config.validate()?;
        let strategies = config.build_strategies(now)?;
        let mut post_passes: Vec<Box<dyn PostSweepPass>> = Vec::new();
        if config.scrub_comments {
            if let Some(domain) = config.local_domain.as_deref() {
                post_passes.push(Box::new(ScrubCommentPii::new(domain)));
            }
        }
        Ok(Self {
            store,
            config,
            strategies,
            hooks: Box::new(NoopHooks),
            post_passes,
        })
    }

    /// Register a custom strategy, run after the configured ones.
    pub fn with_strategy(mut self, strategy: Box<dyn RootStrategy>) -> Self {
        self.strategies.push(strategy);
        self
    }

    pub fn with_hooks(mut self, hooks: Box<dyn MaintenanceHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn with_post_pass(mut self, pass: Box<dyn PostSweepPass>) -> Self {
        self.post_passes.push(pass);
        self
    }

    pub fn config(&self) -> &JobConfig {
        &self.config
    }

    pub fn strategy_names(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    pub fn run(&self, mode: RunMode) -> EngineResult<JobReport> {
        let run_id = Uuid::now_v7();
        let started_at = Utc::now();
        info!(run_id = %run_id, ?mode, strategies = self.strategies.len(), "job started");

        self.preflight()?;
        let marker = Marker::new(self.store, self.config.marker_config())?;
        let sweeper = Sweeper::new(self.store, self.config.sweep_config())?;

        if self.config.fresh_retain_set {
            self.store.reset_retain_set()?;
            info!("retain-set reset");
        }

        let marks = marker.mark_all(&self.strategies)?;
        let retained = self.store.retained_count()?;
        let candidates = sweeper.candidates()?;
        info!(retained, candidates, "marking finished");

        let mut report = JobReport {
            run_id,
            mode,
            started_at,
            finished_at: started_at,
            marks,
            retained,
            candidates,
            sweep: None,
            post_passes: Vec::new(),
        };

        if mode == RunMode::Full {
            let sweep = sweeper.sweep(self.hooks.as_ref())?;
            if !sweep.outcome.is_complete() {
                warn!(run_id = %run_id, "sweep stopped early; re-run the job to finish");
            }
            report.sweep = Some(sweep);
            report.post_passes = self.run_post_passes()?;
        }

        report.finished_at = Utc::now();
        info!(run_id = %run_id, complete = report.is_complete(), "job finished");
        Ok(report)
    }

    /// Validate strategies registered after construction.
    fn preflight(&self) -> EngineResult<()> {
        let mut names = BTreeSet::new();
        for strategy in &self.strategies {
            strategy.validate().map_err(ConfigError::from)?;
            if !names.insert(strategy.name()) {
                return Err(ConfigError::DuplicateStrategy(strategy.name().to_string()).into());
            }
        }
        Ok(())
    }

    fn run_post_passes(&self) -> EngineResult<Vec<PassReport>> {
        let mut reports = Vec::with_capacity(self.post_passes.len());
        for pass in &self.post_passes {
            let rows = pass.run(self.store).map_err(|source| EngineError::PostPass {
                pass: pass.name().to_string(),
                source,
            })?;
            reports.push(PassReport {
                name: pass.name().to_string(),
                rows,
            });
        }
        Ok(reports)
    }
}
