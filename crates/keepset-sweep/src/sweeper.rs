use serde::Serialize;
use tracing::{info, warn};

use keepset_cache::{CacheStats, ObjectCache};
use keepset_store::RowStore;

use crate::cascade::{Cascade, CascadeReport};
use crate::config::{expected_batches, trip_point, SweepConfig};
use crate::error::SweepResult;
use crate::hooks::MaintenanceHooks;

/// How a sweep ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SweepOutcome {
    /// No unretained candidates are left.
    Completed,
    /// The loop ran past the expected batch count and stopped. At least
    /// `remaining` candidates were left.
    SafetyValveTripped { remaining: u64 },
}

impl SweepOutcome {
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

/// Result of a full sweep.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub outcome: SweepOutcome,
    /// Non-transient objects before the sweep.
    pub total: u64,
    /// Retain-set size before the sweep.
    pub retained: u64,
    pub expected_batches: u64,
    pub batches: u64,
    pub deleted: CascadeReport,
    pub cache: CacheStats,
}

/// Deletes every object missing from the retain-set.
pub struct Sweeper<'s> {
    store: &'s dyn RowStore,
    config: SweepConfig,
}

impl<'s> Sweeper<'s> {
    pub fn new(store: &'s dyn RowStore, config: SweepConfig) -> SweepResult<Self> {
        config.validate()?;
        Ok(Self { store, config })
    }

    pub fn config(&self) -> &SweepConfig {
        &self.config
    }

    /// Unretained, non-transient objects left in the store.
    pub fn candidates(&self) -> SweepResult<u64> {
        let total = self.store.count_objects(&self.config.transient_types)?;
        let retained = self.store.retained_count()?;
        Ok(total.saturating_sub(retained))
    }

    /// Run batches until no candidate is left or the safety valve trips.
    pub fn sweep(&self, hooks: &dyn MaintenanceHooks) -> SweepResult<SweepReport> {
        let total = self.store.count_objects(&self.config.transient_types)?;
        let retained = self.store.retained_count()?;
        let expected = expected_batches(total, retained, self.config.batch_size);
        info!(
            "expecting {expected} batches ({total} total; {retained} to keep; {} per batch)",
            self.config.batch_size
        );

        let mut report = SweepReport {
            outcome: SweepOutcome::Completed,
            total,
            retained,
            expected_batches: expected,
            batches: 0,
            deleted: CascadeReport::default(),
            cache: CacheStats::default(),
        };

        hooks.defer_counts(true);
        let result = self.run_batches(expected, hooks, &mut report);
        hooks.defer_counts(false);
        result?;

        info!(
            batches = report.batches,
            objects = report.deleted.objects,
            revisions = report.deleted.revisions,
            complete = report.outcome.is_complete(),
            "sweep finished"
        );
        Ok(report)
    }

    fn run_batches(
        &self,
        expected: u64,
        hooks: &dyn MaintenanceHooks,
        report: &mut SweepReport,
    ) -> SweepResult<()> {
        let trip = trip_point(expected, self.config.safety_factor);
        let cascade = Cascade::new(self.store, &self.config);
        let mut iteration: u64 = 0;

        loop {
            let ids = self
                .store
                .select_unretained(&self.config.transient_types, self.config.batch_size)?;
            if ids.is_empty() {
                report.outcome = SweepOutcome::Completed;
                return Ok(());
            }

            iteration += 1;
            if iteration > trip {
                warn!(
                    iteration,
                    expected,
                    remaining = ids.len(),
                    "safety valve tripped; stopping sweep with at least {} objects left",
                    ids.len()
                );
                report.outcome = SweepOutcome::SafetyValveTripped {
                    remaining: ids.len() as u64,
                };
                return Ok(());
            }

            let mut cache = ObjectCache::new(self.store);
            report.deleted += cascade.delete_batch(&ids, &mut cache)?;
            report.cache.absorb(cache.stats());
            report.batches += 1;
            drop(cache);

            let percent = iteration.saturating_mul(100) / expected.max(1);
            info!("{percent}% ({iteration} / {expected} batches)");
            hooks.free_resources();
        }
    }
}

impl std::fmt::Debug for Sweeper<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sweeper").field("config", &self.config).finish()
    }
}
