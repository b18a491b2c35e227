//! Phase store: server identifier → selected phase.
//!
//! Last write wins. When opened on a file, the whole map is loaded once
//! and rewritten on every `set` (temp file + rename, so readers of the file
//! never see a half-written map). The file layout is
//! `{ "<server>": { "phase": "<name>" } }`; any phase spelling accepted by
//! [`Phase::from_name`] loads, and the canonical name is written back.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use dashmap::DashMap;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, info};

use crate::error::StoreError;
use crate::model::Phase;

#[derive(Debug, Serialize, Deserialize)]
struct PhaseRecord {
    #[serde(deserialize_with = "phase_by_any_name")]
    phase: Phase,
}

fn phase_by_any_name<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Phase, D::Error> {
    let name = String::deserialize(deserializer)?;
    Phase::from_name(&name)
        .ok_or_else(|| serde::de::Error::custom(format!("unknown phase '{name}'")))
}

/// Concurrent map of phase selections with optional file persistence.
pub struct PhaseStore {
    selections: DashMap<String, Phase>,
    path: Option<PathBuf>,
    // std::sync::Mutex: held only around the synchronous file write
    flush_lock: Mutex<()>,
}

impl PhaseStore {
    /// Creates a store that lives only in memory.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            selections: DashMap::new(),
            path: None,
            flush_lock: Mutex::new(()),
        }
    }

    /// Opens a file-backed store, loading existing selections.
    ///
    /// A missing file is an empty store; it is created on the first `set`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Io` if the file exists but cannot be read, and
    /// `StoreError::Json` if it is malformed or names an unknown phase.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let selections = DashMap::new();

        match fs::read_to_string(&path) {
            Ok(raw) if raw.trim().is_empty() => {}
            Ok(raw) => {
                let records: BTreeMap<String, PhaseRecord> =
                    serde_json::from_str(&raw).map_err(|source| StoreError::Json {
                        path: path.clone(),
                        source,
                    })?;
                for (server, record) in records {
                    selections.insert(server, record.phase);
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no state file yet");
            }
            Err(source) => return Err(StoreError::Io { path, source }),
        }

        info!(path = %path.display(), servers = selections.len(), "phase store loaded");
        Ok(Self {
            selections,
            path: Some(path),
            flush_lock: Mutex::new(()),
        })
    }

    /// Phase selected by `server`, or `None` if it never set one.
    #[must_use]
    pub fn get(&self, server: &str) -> Option<Phase> {
        self.selections.get(server).map(|entry| *entry.value())
    }

    /// Records `phase` for `server` and flushes the store to disk.
    ///
    /// If the flush fails the previous selection is restored, so memory
    /// and disk stay in agreement.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Io` if the state file cannot be written.
    pub fn set(&self, server: &str, phase: Phase) -> Result<(), StoreError> {
        let previous = self.selections.insert(server.to_string(), phase);
        if let Err(e) = self.flush() {
            self.roll_back(server, phase, previous);
            return Err(e);
        }
        info!(server, phase = %phase, previous = ?previous, "phase selected");
        Ok(())
    }

    /// Number of servers with a selection.
    #[must_use]
    pub fn len(&self) -> usize {
        self.selections.len()
    }

    /// Whether no server has a selection.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.selections.is_empty()
    }

    /// Backing file, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Sorted copy of all selections.
    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<String, Phase> {
        self.selections
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect()
    }

    /// Undoes a `set` of `written`, unless another `set` has replaced it
    /// since.
    fn roll_back(&self, server: &str, written: Phase, previous: Option<Phase>) {
        match previous {
            Some(old) => {
                if let Some(mut current) = self.selections.get_mut(server)
                    && *current == written
                {
                    *current = old;
                }
            }
            None => {
                self.selections.remove_if(server, |_, current| *current == written);
            }
        }
    }

    fn flush(&self) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        // guards no data, so poisoning is harmless
        let _guard = self.flush_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let records: BTreeMap<String, PhaseRecord> = self
            .snapshot()
            .into_iter()
            .map(|(server, phase)| (server, PhaseRecord { phase }))
            .collect();
        let json = serde_json::to_string_pretty(&records).map_err(|source| StoreError::Json {
            path: path.clone(),
            source,
        })?;

        let tmp = temp_path(path);
        let io_err = |source| StoreError::Io {
            path: path.clone(),
            source,
        };
        fs::write(&tmp, json).map_err(io_err)?;
        fs::rename(&tmp, path).map_err(io_err)?;
        debug!(path = %path.display(), servers = records.len(), "phase store flushed");
        Ok(())
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(std::ffi::OsStr::to_os_string)
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

impl std::fmt::Debug for PhaseStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhaseStore")
            .field("servers", &self.selections.len())
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}
