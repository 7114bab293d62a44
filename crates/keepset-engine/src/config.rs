use std::collections::BTreeSet;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use keepset_mark::{CachePolicy, MarkerConfig};
use keepset_strategy::{presets, DeclarativeStrategy, EmbeddedRefExtractor, RootStrategy, StrategySpec};
use keepset_sweep::SweepConfig;
use keepset_types::ObjectType;

use crate::error::ConfigError;

/// Configuration for one pruning job, usually read from a TOML file.
///
/// ```toml
/// page_size = 500
/// batch_size = 500
/// use_presets = ["recent_posts", "nav_menu_items"]
///
/// [[strategies]]
/// name = "landing_pages"
/// types = ["page"]
/// within = "1 year"
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct JobConfig {
    /// Rows per page while marking.
    pub page_size: usize,
    /// Ids per sweep batch.
    pub batch_size: usize,
    /// Sweep safety valve multiplier.
    pub safety_factor: f64,
    pub cache_policy: CachePolicy,
    /// Types the sweep never selects directly.
    pub transient_types: Vec<ObjectType>,
    /// Taxonomies always unlinked from deleted objects.
    pub base_taxonomies: Vec<String>,
    /// Extra child types re-parented on delete.
    pub reparent_types: Vec<ObjectType>,
    pub revision_type: ObjectType,
    /// Truncate the retain-set before marking.
    pub fresh_retain_set: bool,
    /// Block attribute keys holding object ids.
    pub embedded_ref_keys: Vec<String>,
    /// Built-in strategies to run before the declared ones.
    pub use_presets: Vec<String>,
    pub strategies: Vec<StrategySpec>,
    /// Rewrite comment author details after the sweep.
    pub scrub_comments: bool,
    /// Domain for scrubbed comment emails.
    pub local_domain: Option<String>,
}

impl Default for JobConfig {
    fn default() -> Self {
        let sweep = SweepConfig::default();
        Self {
            page_size: MarkerConfig::default().page_size,
            batch_size: sweep.batch_size,
            safety_factor: sweep.safety_factor,
            cache_policy: CachePolicy::default(),
            transient_types: sweep.transient_types,
            base_taxonomies: sweep.base_taxonomies,
            reparent_types: sweep.reparent_types,
            revision_type: sweep.revision_type,
            fresh_retain_set: true,
            embedded_ref_keys: EmbeddedRefExtractor::default().keys().to_vec(),
            use_presets: presets::PRESET_NAMES.iter().map(|n| n.to_string()).collect(),
            strategies: Vec::new(),
            scrub_comments: false,
            local_domain: None,
        }
    }
}

impl JobConfig {
    /// Parse a job file. Fields left out keep their defaults.
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(input)?)
    }

    /// Read and parse a job file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let input = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&input)
    }

    /// Check every setting and every strategy declaration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.page_size == 0 {
            return Err(ConfigError::ZeroPageSize);
        }
        if self.batch_size == 0 {
            return Err(ConfigError::ZeroBatchSize);
        }
        if !self.safety_factor.is_finite() || self.safety_factor < 1.0 {
            return Err(ConfigError::SafetyFactor(self.safety_factor));
        }
        if self.scrub_comments
            && self.local_domain.as_deref().map_or(true, |d| d.trim().is_empty())
        {
            return Err(ConfigError::MissingLocalDomain);
        }
        self.strategy_specs().map(|_| ())
    }

    /// Presets followed by declared strategies, each validated, names unique.
    pub fn strategy_specs(&self) -> Result<Vec<StrategySpec>, ConfigError> {
        let mut specs = Vec::with_capacity(self.use_presets.len() + self.strategies.len());
        for name in &self.use_presets {
            let spec =
                presets::preset(name).ok_or_else(|| ConfigError::UnknownPreset(name.clone()))?;
            specs.push(spec);
        }
        specs.extend(self.strategies.iter().cloned());

        if specs.is_empty() {
            return Err(ConfigError::NoStrategies);
        }
        let mut names = BTreeSet::new();
        for spec in &specs {
            spec.validate()?;
            if !names.insert(spec.name.as_str()) {
                return Err(ConfigError::DuplicateStrategy(spec.name.clone()));
            }
        }
        Ok(specs)
    }

    /// Build the strategies, with recency windows measured from `now`.
    pub fn build_strategies(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<Box<dyn RootStrategy>>, ConfigError> {
        self.strategy_specs()?
            .into_iter()
            .map(|spec| {
                DeclarativeStrategy::new(spec, now)
                    .map(|s| Box::new(s) as Box<dyn RootStrategy>)
                    .map_err(ConfigError::from)
            })
            .collect()
    }

    pub fn marker_config(&self) -> MarkerConfig {
        MarkerConfig {
            page_size: self.page_size,
            cache_policy: self.cache_policy,
            extractor: EmbeddedRefExtractor::with_keys(self.embedded_ref_keys.iter().cloned()),
        }
    }

    pub fn sweep_config(&self) -> SweepConfig {
        SweepConfig {
            batch_size: self.batch_size,
            safety_factor: self.safety_factor,
            transient_types: self.transient_types.clone(),
            base_taxonomies: self.base_taxonomies.clone(),
            reparent_types: self.reparent_types.clone(),
            revision_type: self.revision_type.clone(),
        }
    }
}
