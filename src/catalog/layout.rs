//! Page layout table for the class setups guide.
//!
//! Every heading text and structural anchor the parser depends on lives
//! here. A change in the wiki's page layout should only need an edit in
//! this file.

use crate::model::{ClassRole, ItemCategory, Phase, fold_name};

/// Content container every parsed page must contain.
pub const CONTENT_ANCHOR: &str = "mw-parser-output";

/// Section headings (`<h2>`) for each phase.
pub const PHASE_HEADINGS: &[(Phase, &[&str])] = &[
    (Phase::PreBoss, &["Pre-Boss", "Pre-Bosses", "Early Pre-Hardmode"]),
    (
        Phase::PreMech,
        &["Pre-Mech", "Pre-Mech Bosses", "Pre-Mechanical Bosses", "Early Hardmode"],
    ),
    (Phase::PrePlantera, &["Pre-Plantera", "Post-Mechanical Bosses"]),
    (Phase::PreGolem, &["Pre-Golem", "Post-Plantera"]),
    (Phase::Endgame, &["Endgame", "Post-Golem", "Endgame (Pre-Moon Lord)"]),
];

/// Subsection headings (`<h3>`) for each class.
pub const CLASS_HEADINGS: &[(ClassRole, &[&str])] = &[
    (ClassRole::Ranger, &["Ranged", "Ranger"]),
    (ClassRole::Mage, &["Magic", "Mage"]),
    (ClassRole::Summoner, &["Summoner", "Summon", "Summoning"]),
    (ClassRole::Melee, &["Melee"]),
];

/// Category headings (`<h4>` or `<dt>`) inside a class subsection.
pub const CATEGORY_HEADINGS: &[(ItemCategory, &[&str])] = &[
    (ItemCategory::Weapon, &["Weapons", "Weapon"]),
    (ItemCategory::Armor, &["Armor", "Armour"]),
    (ItemCategory::Accessory, &["Accessories", "Accessory"]),
    (ItemCategory::Buff, &["Buffs", "Buff", "Potions", "Buffs and potions"]),
];

/// Non-phase `<h2>` sections that are skipped along with their content.
pub const IGNORED_SECTIONS: &[&str] = &[
    "Contents",
    "General tips",
    "Notes",
    "Tips",
    "See also",
    "References",
    "History",
    "Navigation",
];

/// Link prefixes that never denote an item.
pub const NON_ITEM_LINK_PREFIXES: &[&str] = &["/wiki/File:", "/wiki/Category:", "#"];

fn lookup<T: Copy>(table: &[(T, &[&str])], heading: &str) -> Option<T> {
    let key = fold_name(heading);
    table
        .iter()
        .find(|(_, texts)| texts.iter().any(|t| fold_name(t) == key))
        .map(|(value, _)| *value)
}

/// Maps a section heading to its phase.
#[must_use]
pub fn phase_for_heading(heading: &str) -> Option<Phase> {
    lookup(PHASE_HEADINGS, heading)
}

/// Maps a subsection heading to its class.
#[must_use]
pub fn class_for_heading(heading: &str) -> Option<ClassRole> {
    lookup(CLASS_HEADINGS, heading)
}

/// Maps a category heading to its item category.
#[must_use]
pub fn category_for_heading(heading: &str) -> Option<ItemCategory> {
    lookup(CATEGORY_HEADINGS, heading)
}

/// Whether a section heading belongs to the skip list.
#[must_use]
pub fn is_ignored_section(heading: &str) -> bool {
    let key = fold_name(heading);
    IGNORED_SECTIONS.iter().any(|s| fold_name(s) == key)
}

/// Whether an `href` can point at an item page.
#[must_use]
pub fn is_item_link(href: &str) -> bool {
    !href.is_empty() && !NON_ITEM_LINK_PREFIXES.iter().any(|p| href.starts_with(p))
}

/// Resolves an `href` found on the page to an absolute URL.
///
/// `base` is the wiki origin without a trailing slash, e.g.
/// `https://terraria.wiki.gg`. Returns `None` for links that cannot be
/// resolved (fragments, `javascript:` and the like).
#[must_use]
pub fn resolve_link(base: &str, href: &str) -> Option<String> {
    let href = href.trim();
    if href.starts_with("https://") || href.starts_with("http://") {
        Some(href.to_string())
    } else if let Some(rest) = href.strip_prefix("//") {
        Some(format!("https://{rest}"))
    } else if href.starts_with('/') {
        Some(format!("{}{href}", base.trim_end_matches('/')))
    } else {
        None
    }
}
