//! Sweep engine for keepset.
//!
//! The sweeper repeatedly selects a batch of objects missing from the
//! retain-set and deletes each one together with its dependent records:
//! term relationships, comments and their meta, object meta, and revisions.
//! Children of a deleted object are moved to its parent when that parent
//! still exists.
//!
//! # Design Rules
//!
//! 1. The retain-set is read-only here.
//! 2. No transaction spans a batch. A failure stops the sweep; re-running
//!    it picks up where it stopped.
//! 3. Revisions are deleted before their parent, through an explicit
//!    worklist.
//! 4. The loop stops at `floor(expected * safety_factor)` batches even if
//!    candidates remain.

pub mod cascade;
pub mod config;
pub mod error;
pub mod hooks;
pub mod sweeper;

pub use cascade::{Cascade, CascadeReport};
pub use config::{expected_batches, trip_point, SweepConfig};
pub use error::{SweepError, SweepResult};
pub use hooks::{HookEvent, MaintenanceHooks, NoopHooks, RecordingHooks};
pub use sweeper::{SweepOutcome, SweepReport, Sweeper};
