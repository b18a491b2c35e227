//! Domain vocabulary: progression phases, class roles, and item references.
//!
//! All three enums are closed sets. Text coming from users or from the
//! guide page is mapped onto them in exactly one place each: user input
//! through [`Phase::from_name`] / [`ClassRole::from_role_name`], page
//! headings through [`crate::catalog::layout`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ============================================================================
// Phase
// ============================================================================

/// A game-progression stage.
///
/// Ordered by progression: `PreBoss < PreMech < ... < Endgame`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// Before any boss has been defeated.
    #[serde(rename = "Pre-Boss")]
    PreBoss,
    /// Hardmode, before the mechanical bosses.
    #[serde(rename = "Pre-Mech")]
    PreMech,
    /// After the mechanical bosses, before Plantera.
    #[serde(rename = "Pre-Plantera")]
    PrePlantera,
    /// After Plantera, before Golem.
    #[serde(rename = "Pre-Golem")]
    PreGolem,
    /// Everything after Golem.
    #[serde(rename = "Endgame")]
    Endgame,
}

impl Phase {
    /// All phases in progression order.
    pub const ALL: [Self; 5] = [
        Self::PreBoss,
        Self::PreMech,
        Self::PrePlantera,
        Self::PreGolem,
        Self::Endgame,
    ];

    /// Canonical display name, also used in persisted state.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::PreBoss => "Pre-Boss",
            Self::PreMech => "Pre-Mech",
            Self::PrePlantera => "Pre-Plantera",
            Self::PreGolem => "Pre-Golem",
            Self::Endgame => "Endgame",
        }
    }

    /// Additional spellings accepted from users, besides the canonical name.
    const fn aliases(self) -> &'static [&'static str] {
        match self {
            Self::PreBoss => &["pre boss", "preboss", "start", "early game"],
            Self::PreMech => &[
                "pre mech",
                "premech",
                "pre mech bosses",
                "pre mechanical bosses",
                "early hardmode",
            ],
            Self::PrePlantera => &["pre plantera", "preplantera", "post mech"],
            Self::PreGolem => &["pre golem", "pregolem", "post plantera"],
            Self::Endgame => &["end game", "post golem", "moon lord", "late game"],
        }
    }

    /// Resolves a canonical name or alias, ignoring case, dashes and
    /// surrounding whitespace.
    #[must_use]
    pub fn from_name(input: &str) -> Option<Self> {
        let key = fold_name(input);
        Self::ALL.into_iter().find(|phase| {
            fold_name(phase.name()) == key || phase.aliases().iter().any(|a| fold_name(a) == key)
        })
    }

    /// Returns every name a phase answers to, folded for comparison.
    pub(crate) fn folded_names(self) -> impl Iterator<Item = String> {
        std::iter::once(fold_name(self.name())).chain(self.aliases().iter().map(|a| fold_name(a)))
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error for text that names no phase or class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownName(pub String);

impl fmt::Display for UnknownName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown name '{}'", self.0)
    }
}

impl std::error::Error for UnknownName {}

impl FromStr for Phase {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| UnknownName(s.to_string()))
    }
}

// ============================================================================
// ClassRole
// ============================================================================

/// A player's build archetype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ClassRole {
    /// Ranged weapons (guns, bows).
    Ranger,
    /// Magic weapons.
    Mage,
    /// Minions and sentries.
    Summoner,
    /// Swords, yoyos, spears.
    Melee,
}

impl ClassRole {
    /// All classes in display order.
    pub const ALL: [Self; 4] = [Self::Ranger, Self::Mage, Self::Summoner, Self::Melee];

    /// Canonical display name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Ranger => "Ranger",
            Self::Mage => "Mage",
            Self::Summoner => "Summoner",
            Self::Melee => "Melee",
        }
    }

    /// Maps a chat role name (or explicit class argument) to a class.
    ///
    /// Case-insensitive; accepts both the player-facing names and the
    /// wiki's damage-type names.
    #[must_use]
    pub fn from_role_name(role: &str) -> Option<Self> {
        match role.trim().to_lowercase().as_str() {
            "ranger" | "ranged" => Some(Self::Ranger),
            "mage" | "magic" => Some(Self::Mage),
            "summoner" | "summon" => Some(Self::Summoner),
            "melee" => Some(Self::Melee),
            _ => None,
        }
    }
}

impl fmt::Display for ClassRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ClassRole {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_role_name(s).ok_or_else(|| UnknownName(s.to_string()))
    }
}

// ============================================================================
// Items
// ============================================================================

/// Kind of gear an item reference points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemCategory {
    /// Weapons.
    Weapon,
    /// Armor pieces and sets.
    Armor,
    /// Accessories, wings included.
    Accessory,
    /// Potions, food and other buffs.
    Buff,
}

impl ItemCategory {
    /// All categories in display order.
    pub const ALL: [Self; 4] = [Self::Weapon, Self::Armor, Self::Accessory, Self::Buff];

    /// Plural heading used when presenting a preset.
    #[must_use]
    pub const fn heading(self) -> &'static str {
        match self {
            Self::Weapon => "Weapons",
            Self::Armor => "Armor",
            Self::Accessory => "Accessories",
            Self::Buff => "Buffs",
        }
    }
}

impl fmt::Display for ItemCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.heading())
    }
}

/// One recommended item, as linked from the guide page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemReference {
    /// Display name, whitespace-normalized.
    pub name: String,
    /// Absolute wiki URL.
    pub url: String,
    /// Category heading the item was listed under.
    pub category: ItemCategory,
}

// ============================================================================
// Helpers
// ============================================================================

/// Lowercases and collapses dashes, underscores and runs of whitespace
/// into single spaces.
pub(crate) fn fold_name(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut pending_space = false;
    for ch in input.chars() {
        if ch.is_whitespace() || matches!(ch, '-' | '_' | '\u{2010}' | '\u{2011}' | '\u{2013}') {
            pending_space = !out.is_empty();
            continue;
        }
        if pending_space {
            out.push(' ');
            pending_space = false;
        }
        out.extend(ch.to_lowercase());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phases_are_totally_ordered() {
        for pair in Phase::ALL.windows(2) {
            assert!(pair[0] < pair[1], "{} should sort before {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn phase_from_canonical_names() {
        for phase in Phase::ALL {
            assert_eq!(Phase::from_name(phase.name()), Some(phase));
        }
    }

    #[test]
    fn phase_from_aliases_ignores_case_and_dashes() {
        assert_eq!(Phase::from_name("pre-mech bosses"), Some(Phase::PreMech));
        assert_eq!(Phase::from_name("  PRE_MECH "), Some(Phase::PreMech));
        assert_eq!(Phase::from_name("Pre\u{2011}Mech"), Some(Phase::PreMech));
        assert_eq!(Phase::from_name("endgame"), Some(Phase::Endgame));
        assert_eq!(Phase::from_name("Hardmode"), None);
    }

    #[test]
    fn phase_serializes_by_display_name() {
        let json = serde_json::to_string(&Phase::PrePlantera).unwrap();
        assert_eq!(json, "\"Pre-Plantera\"");
        let back: Phase = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Phase::PrePlantera);
    }

    #[test]
    fn class_role_from_role_names() {
        assert_eq!(ClassRole::from_role_name("Ranged"), Some(ClassRole::Ranger));
        assert_eq!(ClassRole::from_role_name("MAGIC"), Some(ClassRole::Mage));
        assert_eq!(ClassRole::from_role_name(" summoner "), Some(ClassRole::Summoner));
        assert_eq!(ClassRole::from_role_name("melee"), Some(ClassRole::Melee));
        assert_eq!(ClassRole::from_role_name("Moderator"), None);
    }

    #[test]
    fn guild_rank_names_are_not_classes() {
        for rank in ["Warrior", "Wizard", "Summoning"] {
            assert_eq!(ClassRole::from_role_name(rank), None, "{rank}");
        }
    }

    #[test]
    fn class_role_from_str_reports_input() {
        let err = "bard".parse::<ClassRole>().unwrap_err();
        assert_eq!(err, UnknownName("bard".to_string()));
    }

    #[test]
    fn fold_name_collapses_separators() {
        assert_eq!(fold_name("Pre-Mech  Bosses"), "pre mech bosses");
        assert_eq!(fold_name("--x--"), "x");
        assert_eq!(fold_name(""), "");
    }
}
