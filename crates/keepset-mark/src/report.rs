use std::fmt;

use serde::Serialize;

use keepset_cache::CacheStats;

/// Which query a marking pass ran.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Pass {
    Primary,
    Backfill,
}

impl fmt::Display for Pass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Primary => "primary",
            Self::Backfill => "backfill",
        })
    }
}

/// Counters for one strategy pass.
///
/// `roots`, `embedded`, `linked` and `ancestors` count objects found per
/// page and may overlap across pages; `inserted` counts entries the
/// retain-set did not already hold.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MarkReport {
    pub strategy: String,
    pub pass: Pass,
    pub pages: u64,
    pub roots: u64,
    pub embedded: u64,
    pub linked: u64,
    pub ancestors: u64,
    pub inserted: u64,
    pub cache: CacheStats,
}

impl MarkReport {
    pub fn new(strategy: impl Into<String>, pass: Pass) -> Self {
        Self {
            strategy: strategy.into(),
            pass,
            pages: 0,
            roots: 0,
            embedded: 0,
            linked: 0,
            ancestors: 0,
            inserted: 0,
            cache: CacheStats::default(),
        }
    }
}
