//! Preset catalog: fetch the guide page, parse it, cache the result.
//!
//! The catalog is built wholesale from one page download. A [`Catalog`]
//! value is always complete: every phase/class pair is present, possibly
//! with an empty item list.

pub mod cache;
pub mod fetch;
pub mod html;
pub mod layout;
pub mod parser;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::model::{ClassRole, ItemReference, Phase};

pub use cache::{CacheSettings, CacheStatus, CatalogCache};
pub use fetch::{PageSource, WikiFetcher};
pub use parser::PageParser;

/// Item lists for every (phase, class) pair, in page order.
///
/// Only the parser constructs this type, and only once every pair has
/// been seen. It serializes for output but cannot be read back:
///
/// ```compile_fail
/// let _: classguide::catalog::Presets = serde_json::from_str("{}").unwrap();
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Presets {
    entries: BTreeMap<Phase, BTreeMap<ClassRole, Vec<ItemReference>>>,
}

impl Presets {
    pub(crate) const fn from_complete(
        entries: BTreeMap<Phase, BTreeMap<ClassRole, Vec<ItemReference>>>,
    ) -> Self {
        Self { entries }
    }

    /// Items recommended for `class` during `phase`, in display order.
    #[must_use]
    pub fn items(&self, phase: Phase, class: ClassRole) -> &[ItemReference] {
        self.entries
            .get(&phase)
            .and_then(|classes| classes.get(&class))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Iterates over all entries in (phase, class) order.
    pub fn iter(&self) -> impl Iterator<Item = (Phase, ClassRole, &[ItemReference])> {
        self.entries.iter().flat_map(|(phase, classes)| {
            classes
                .iter()
                .map(move |(class, items)| (*phase, *class, items.as_slice()))
        })
    }

    /// Total number of item references across all entries.
    #[must_use]
    pub fn total_items(&self) -> usize {
        self.entries
            .values()
            .flat_map(BTreeMap::values)
            .map(Vec::len)
            .sum()
    }
}

/// A parsed guide page plus the time it was downloaded.
///
/// ```compile_fail
/// let _: classguide::catalog::Catalog = serde_json::from_str("{}").unwrap();
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Catalog {
    /// Parsed item lists.
    pub presets: Presets,
    /// When the page was fetched.
    pub fetched_at: DateTime<Utc>,
}

impl Catalog {
    /// Wraps freshly parsed presets.
    #[must_use]
    pub const fn new(presets: Presets, fetched_at: DateTime<Utc>) -> Self {
        Self {
            presets,
            fetched_at,
        }
    }

    /// Shorthand for [`Presets::items`].
    #[must_use]
    pub fn items(&self, phase: Phase, class: ClassRole) -> &[ItemReference] {
        self.presets.items(phase, class)
    }
}
