//! Strategy declarations.
//!
//! A [`StrategySpec`] is the serde form of a root strategy, written in the
//! job's TOML file under `[[strategies]]`:
//!
//! ```toml
//! [[strategies]]
//! name = "forum_replies"
//! types = ["reply"]
//! within = "1 month"
//! skip_backfill = true
//! link = { kind = "meta_pointers", keys = ["_bbp_topic_id", "_bbp_forum_id"] }
//! ```

use serde::{Deserialize, Serialize};

use keepset_store::{MetaCondition, TypeSelector};
use keepset_types::ObjectStatus;

use crate::error::{StrategyError, StrategyResult};
use crate::window::RecencyWindow;

/// How a strategy finds the objects its roots depend on.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LinkResolver {
    /// No linked objects.
    #[default]
    None,
    /// Every meta value under `keys` is an object id to retain.
    MetaPointers { keys: Vec<String> },
    /// For roots whose `kind_key` meta equals `kind_value`, the `object_key`
    /// meta value is an object id to retain.
    MenuItemTarget {
        kind_key: String,
        kind_value: String,
        object_key: String,
    },
}

impl LinkResolver {
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

/// A declared root strategy.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategySpec {
    pub name: String,
    /// Required. Kept optional here so a missing value is reported as a
    /// configuration error naming the strategy.
    #[serde(default)]
    pub types: Option<TypeSelector>,
    #[serde(default)]
    pub statuses: Vec<ObjectStatus>,
    /// Only roots published within this window of the job clock.
    #[serde(default)]
    pub within: Option<RecencyWindow>,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub meta: Vec<MetaCondition>,
    #[serde(default)]
    pub skip_backfill: bool,
    #[serde(default)]
    pub link: LinkResolver,
}

impl StrategySpec {
    /// A spec with only a name and a type selector.
    pub fn new(name: impl Into<String>, types: TypeSelector) -> Self {
        Self {
            name: name.into(),
            types: Some(types),
            statuses: Vec::new(),
            within: None,
            search: None,
            meta: Vec::new(),
            skip_backfill: false,
            link: LinkResolver::None,
        }
    }

    pub fn within(mut self, window: RecencyWindow) -> Self {
        self.within = Some(window);
        self
    }

    pub fn search(mut self, needle: impl Into<String>) -> Self {
        self.search = Some(needle.into());
        self
    }

    pub fn meta(mut self, condition: MetaCondition) -> Self {
        self.meta.push(condition);
        self
    }

    pub fn skip_backfill(mut self) -> Self {
        self.skip_backfill = true;
        self
    }

    pub fn link(mut self, resolver: LinkResolver) -> Self {
        self.link = resolver;
        self
    }

    /// The type selector, or the missing-field error.
    pub fn types(&self) -> StrategyResult<&TypeSelector> {
        self.types.as_ref().ok_or_else(|| StrategyError::MissingField {
            strategy: self.name.clone(),
            field: "types",
        })
    }

    /// Reject declarations that cannot run.
    pub fn validate(&self) -> StrategyResult<()> {
        if self.name.trim().is_empty() {
            return Err(StrategyError::EmptyName);
        }
        let types = self.types()?;
        if types.is_any() && !self.skip_backfill {
            return Err(StrategyError::BackfillOnAnyType {
                strategy: self.name.clone(),
            });
        }
        if self.search.as_deref().is_some_and(|s| s.trim().is_empty()) {
            return Err(self.invalid("search", "must not be blank"));
        }
        if self.meta.iter().any(|c| c.key().is_empty()) {
            return Err(self.invalid("meta", "condition key must not be empty"));
        }
        match &self.link {
            LinkResolver::None => {}
            LinkResolver::MetaPointers { keys } => {
                if keys.is_empty() || keys.iter().any(|k| k.is_empty()) {
                    return Err(self.invalid("link", "meta_pointers needs non-empty keys"));
                }
            }
            LinkResolver::MenuItemTarget {
                kind_key,
                object_key,
                ..
            } => {
                if kind_key.is_empty() || object_key.is_empty() {
                    return Err(self.invalid("link", "menu_item_target keys must not be empty"));
                }
            }
        }
        Ok(())
    }

    fn invalid(&self, field: &'static str, reason: &str) -> StrategyError {
        StrategyError::InvalidField {
            strategy: self.name.clone(),
            field,
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keepset_types::ObjectType;

    fn posts() -> TypeSelector {
        TypeSelector::Types(vec![ObjectType::new("post").unwrap()])
    }

    #[test]
    fn parses_from_toml() {
        let spec: StrategySpec = toml::from_str(
            r#"
            name = "forum_replies"
            types = ["reply"]
            within = "1 month"
            skip_backfill = true
            link = { kind = "meta_pointers", keys = ["_bbp_topic_id", "_bbp_forum_id"] }
            "#,
        )
        .unwrap();
        assert_eq!(spec.within, Some(RecencyWindow::Months(1)));
        assert!(spec.skip_backfill);
        assert_eq!(
            spec.link,
            LinkResolver::MetaPointers {
                keys: vec!["_bbp_topic_id".into(), "_bbp_forum_id".into()]
            }
        );
        spec.validate().unwrap();
    }

    #[test]
    fn link_defaults_to_none() {
        let spec: StrategySpec = toml::from_str("name = \"x\"\ntypes = \"post\"").unwrap();
        assert!(spec.link.is_none());
        assert!(spec.meta.is_empty());
    }

    #[test]
    fn missing_types_is_reported_with_name() {
        let spec: StrategySpec = toml::from_str("name = \"orphans\"").unwrap();
        let err = spec.validate().unwrap_err();
        assert!(matches!(
            err,
            StrategyError::MissingField { ref strategy, field: "types" } if strategy == "orphans"
        ));
    }

    #[test]
    fn empty_name_is_rejected() {
        assert!(matches!(
            StrategySpec::new("  ", posts()).validate(),
            Err(StrategyError::EmptyName)
        ));
    }

    #[test]
    fn any_type_requires_skip_backfill() {
        let spec = StrategySpec::new("blocks", TypeSelector::Any);
        assert!(matches!(
            spec.validate(),
            Err(StrategyError::BackfillOnAnyType { .. })
        ));
        spec.skip_backfill().validate().unwrap();
    }

    #[test]
    fn bad_link_declarations_are_rejected() {
        let spec = StrategySpec::new("x", posts()).link(LinkResolver::MetaPointers { keys: vec![] });
        assert!(matches!(
            spec.validate(),
            Err(StrategyError::InvalidField { field: "link", .. })
        ));
    }

    #[test]
    fn unparsable_window_fails_deserialization() {
        let parsed: Result<StrategySpec, _> =
            toml::from_str("name = \"x\"\ntypes = \"post\"\nwithin = \"soon\"");
        assert!(parsed.is_err());
    }
}
