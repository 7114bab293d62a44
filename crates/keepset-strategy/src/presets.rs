//! Built-in strategy declarations.
//!
//! Each preset is a plain [`StrategySpec`]; a job enables them by name with
//! `use_presets = ["recent_posts", ...]`.

use keepset_store::{MetaCondition, TypeSelector};
use keepset_types::ObjectType;

use crate::spec::{LinkResolver, StrategySpec};
use crate::window::RecencyWindow;

/// Names accepted by [`preset`], in the order [`all`] returns them.
pub const PRESET_NAMES: [&str; 5] = [
    "recent_posts",
    "nav_menu_items",
    "forum_replies",
    "buy_now_blocks",
    "amazon_onsite",
];

/// Look up a preset by name.
pub fn preset(name: &str) -> Option<StrategySpec> {
    match name {
        "recent_posts" => Some(recent_posts()),
        "nav_menu_items" => Some(nav_menu_items()),
        "forum_replies" => Some(forum_replies()),
        "buy_now_blocks" => Some(buy_now_blocks()),
        "amazon_onsite" => Some(amazon_onsite()),
        _ => None,
    }
}

/// Every preset.
pub fn all() -> Vec<StrategySpec> {
    PRESET_NAMES.iter().filter_map(|n| preset(n)).collect()
}

/// Posts published in the last three months.
pub fn recent_posts() -> StrategySpec {
    StrategySpec::new("recent_posts", only("post")).within(RecencyWindow::Months(3))
}

/// Every menu item, plus the content each `post_type` item points at.
pub fn nav_menu_items() -> StrategySpec {
    StrategySpec::new("nav_menu_items", only("nav_menu_item")).link(LinkResolver::MenuItemTarget {
        kind_key: "_menu_item_type".to_string(),
        kind_value: "post_type".to_string(),
        object_key: "_menu_item_object_id".to_string(),
    })
}

/// Forum replies from the last month with their topic and forum.
pub fn forum_replies() -> StrategySpec {
    StrategySpec::new("forum_replies", only("reply"))
        .within(RecencyWindow::Months(1))
        .skip_backfill()
        .link(LinkResolver::MetaPointers {
            keys: vec!["_bbp_topic_id".to_string(), "_bbp_forum_id".to_string()],
        })
}

/// Recent content of any type embedding a buy-now block.
pub fn buy_now_blocks() -> StrategySpec {
    StrategySpec::new("buy_now_blocks", TypeSelector::Any)
        .within(RecencyWindow::Months(3))
        .search("wp:pmc/buy-now")
        .skip_backfill()
}

/// Recent content of any type carrying non-empty Amazon product data.
pub fn amazon_onsite() -> StrategySpec {
    const KEY: &str = "_amzn_product_information";
    StrategySpec::new("amazon_onsite", TypeSelector::Any)
        .within(RecencyWindow::Months(3))
        .meta(MetaCondition::Exists {
            key: KEY.to_string(),
        })
        .meta(MetaCondition::NotEquals {
            key: KEY.to_string(),
            value: "a:0:{}".to_string(),
        })
        .skip_backfill()
}

fn only(name: &'static str) -> TypeSelector {
    // Literal names are never empty.
    TypeSelector::Types(ObjectType::new(name).into_iter().collect())
}
