use keepset_types::ObjectType;

use crate::error::{SweepError, SweepResult};

/// Sweep settings.
#[derive(Clone, Debug, PartialEq)]
pub struct SweepConfig {
    /// Unretained ids selected per batch.
    pub batch_size: usize,
    /// Multiplier on the expected batch count before the safety valve trips.
    pub safety_factor: f64,
    /// Types never selected as sweep candidates. They are removed only
    /// through their parent's cascade.
    pub transient_types: Vec<ObjectType>,
    /// Taxonomies whose relationships are always deleted with an object.
    pub base_taxonomies: Vec<String>,
    /// Child types re-parented when their parent is deleted, in addition to
    /// the batch's own types.
    pub reparent_types: Vec<ObjectType>,
    /// The type deleted recursively with its parent.
    pub revision_type: ObjectType,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            batch_size: 500,
            safety_factor: 1.25,
            transient_types: vec![ObjectType::revision()],
            base_taxonomies: vec!["category".to_string(), "post_tag".to_string()],
            reparent_types: vec![ObjectType::attachment()],
            revision_type: ObjectType::revision(),
        }
    }
}

impl SweepConfig {
    pub fn validate(&self) -> SweepResult<()> {
        if self.batch_size == 0 {
            return Err(SweepError::ZeroBatchSize);
        }
        if !self.safety_factor.is_finite() || self.safety_factor < 1.0 {
            return Err(SweepError::InvalidSafetyFactor(self.safety_factor));
        }
        Ok(())
    }
}

/// `ceil((total - retained) / batch_size)`, or zero when nothing is left to
/// delete.
pub fn expected_batches(total: u64, retained: u64, batch_size: usize) -> u64 {
    let batch_size = batch_size.max(1) as u64;
    total.saturating_sub(retained).div_ceil(batch_size)
}

/// Last batch number allowed to run: `floor(expected * factor)`.
pub fn trip_point(expected: u64, safety_factor: f64) -> u64 {
    (expected as f64 * safety_factor).floor() as u64
}
