//! Query service: server → phase → preset.
//!
//! [`PresetService`] is the only component that touches both the phase
//! store and the catalog cache. It holds both by `Arc`, so the CLI and the
//! `serve` loop can share one instance across tasks.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, instrument};

use crate::catalog::CatalogCache;
use crate::error::{CatalogError, QueryError};
use crate::model::{ClassRole, ItemCategory, ItemReference, Phase};
use crate::observability::metrics;
use crate::phase::{PhaseStore, resolve_phase};

/// Items of one category, in display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryGroup<'a> {
    /// Category shared by every item in the group.
    pub category: ItemCategory,
    /// Items in page order.
    pub items: Vec<&'a ItemReference>,
}

/// Groups items by category.
///
/// Categories come out in canonical order (weapons first, buffs last);
/// items keep their relative order. Categories with no items are omitted.
#[must_use]
pub fn grouped(items: &[ItemReference]) -> Vec<CategoryGroup<'_>> {
    ItemCategory::ALL
        .into_iter()
        .map(|category| CategoryGroup {
            category,
            items: items.iter().filter(|item| item.category == category).collect(),
        })
        .filter(|group| !group.items.is_empty())
        .collect()
}

/// A resolved preset: the answer to "what should I use right now?".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Preset {
    /// Phase the server is in.
    pub phase: Phase,
    /// Class the preset is for.
    pub class: ClassRole,
    /// Recommended items in display order; may be empty.
    pub items: Vec<ItemReference>,
}

impl Preset {
    /// Items grouped by category, see [`grouped`].
    #[must_use]
    pub fn grouped(&self) -> Vec<CategoryGroup<'_>> {
        grouped(&self.items)
    }
}

/// Derives a class from a member's role names.
///
/// The first role that names a class wins.
#[must_use]
pub fn detect_role<S: AsRef<str>>(roles: &[S]) -> Option<ClassRole> {
    roles
        .iter()
        .find_map(|role| ClassRole::from_role_name(role.as_ref()))
}

/// Answers preset lookups for servers.
#[derive(Debug, Clone)]
pub struct PresetService {
    phases: Arc<PhaseStore>,
    catalog: Arc<CatalogCache>,
}

impl PresetService {
    /// Creates a service over a phase store and a catalog cache.
    #[must_use]
    pub const fn new(phases: Arc<PhaseStore>, catalog: Arc<CatalogCache>) -> Self {
        Self { phases, catalog }
    }

    /// Phase store backing this service.
    #[must_use]
    pub fn phases(&self) -> &PhaseStore {
        &self.phases
    }

    /// Catalog cache backing this service.
    #[must_use]
    pub fn catalog(&self) -> &CatalogCache {
        &self.catalog
    }

    /// Phase selected by `server`.
    ///
    /// # Errors
    ///
    /// Returns `QueryError::PhaseNotConfigured` if the server never set one.
    pub fn current_phase(&self, server: &str) -> Result<Phase, QueryError> {
        self.phases
            .get(server)
            .ok_or_else(|| QueryError::PhaseNotConfigured {
                server: server.to_string(),
            })
    }

    /// Resolves `input` to a phase and records it for `server`.
    ///
    /// # Errors
    ///
    /// Returns `QueryError::UnknownPhase` if `input` names no phase, or
    /// `QueryError::Store` if the selection cannot be persisted.
    pub fn set_phase(&self, server: &str, input: &str) -> Result<Phase, QueryError> {
        let phase = resolve_phase(input)?;
        self.phases.set(server, phase)?;
        Ok(phase)
    }

    /// Items for `class` in the phase `server` has selected.
    ///
    /// An empty list is a valid answer.
    ///
    /// # Errors
    ///
    /// Returns `QueryError::PhaseNotConfigured` if the server has no phase,
    /// or `QueryError::Catalog` if no catalog can be produced.
    pub async fn lookup(
        &self,
        server: &str,
        class: ClassRole,
    ) -> Result<Vec<ItemReference>, QueryError> {
        self.preset(server, class).await.map(|preset| preset.items)
    }

    /// Like [`lookup`](Self::lookup), keeping the phase and class.
    ///
    /// # Errors
    ///
    /// Same as [`lookup`](Self::lookup).
    #[instrument(skip(self), fields(phase = tracing::field::Empty))]
    pub async fn preset(&self, server: &str, class: ClassRole) -> Result<Preset, QueryError> {
        let phase = match self.current_phase(server) {
            Ok(phase) => phase,
            Err(e) => {
                metrics::record_lookup("phase_not_configured");
                return Err(e);
            }
        };
        tracing::Span::current().record("phase", phase.name());

        let catalog = self.catalog.get().await.inspect_err(|_: &CatalogError| {
            metrics::record_lookup("unavailable");
        })?;

        let items = catalog.items(phase, class).to_vec();
        metrics::record_lookup(if items.is_empty() { "empty" } else { "found" });
        debug!(items = items.len(), "preset resolved");
        Ok(Preset {
            phase,
            class,
            items,
        })
    }

    /// Preset for a member, picking the class from an explicit argument
    /// or, failing that, from the member's roles.
    ///
    /// # Errors
    ///
    /// Returns `QueryError::UnknownClass` for an unrecognised explicit
    /// class, `QueryError::ClassNotDetected` when no role names a class,
    /// plus everything [`preset`](Self::preset) returns.
    pub async fn lookup_for_member<S: AsRef<str>>(
        &self,
        server: &str,
        explicit: Option<&str>,
        roles: &[S],
    ) -> Result<Preset, QueryError> {
        let class = match explicit {
            Some(name) => ClassRole::from_role_name(name).ok_or_else(|| QueryError::UnknownClass {
                input: name.to_string(),
            })?,
            None => detect_role(roles).ok_or(QueryError::ClassNotDetected)?,
        };
        self.preset(server, class).await
    }
}
