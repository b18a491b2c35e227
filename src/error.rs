//! Error types for `classguide`
//!
//! Each component owns a `thiserror` enum; [`GuideError`] aggregates them
//! for the CLI and maps every variant to a process exit code.

use std::path::PathBuf;

use thiserror::Error;

use crate::model::{ClassRole, Phase};

// ============================================================================
// Exit Codes
// ============================================================================

/// Exit codes for `classguide` CLI operations.
///
/// These codes follow Unix conventions.
pub struct ExitCode;

impl ExitCode {
    /// Successful execution
    pub const SUCCESS: i32 = 0;

    /// General error
    pub const ERROR: i32 = 1;

    /// Configuration error (bad flag value, unreadable state file)
    pub const CONFIG_ERROR: i32 = 2;

    /// I/O error (file not found, permission denied)
    pub const IO_ERROR: i32 = 3;

    /// Guide page could not be fetched or parsed
    pub const CATALOG_ERROR: i32 = 4;

    /// Lookup failed (phase not configured, unknown phase or class)
    pub const QUERY_ERROR: i32 = 5;

    /// Usage error (invalid arguments, missing required options)
    pub const USAGE_ERROR: i32 = 64;

    /// Interrupted by SIGINT (Ctrl+C)
    pub const INTERRUPTED: i32 = 130;

    /// Terminated by SIGTERM
    pub const TERMINATED: i32 = 143;
}

// ============================================================================
// Top-Level Error
// ============================================================================

/// Top-level error type for `classguide` operations.
///
/// Aggregates all domain-specific errors and provides a unified
/// interface for exit code mapping.
#[derive(Debug, Error)]
pub enum GuideError {
    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Page fetch error outside the cache (e.g. `catalog validate`)
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Page parse error outside the cache
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Catalog could not be produced
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// Phase store error
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Lookup error
    #[error(transparent)]
    Query(#[from] QueryError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl GuideError {
    /// Returns the appropriate exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Store(_) => ExitCode::CONFIG_ERROR,
            Self::Fetch(_) | Self::Parse(_) | Self::Catalog(_) => ExitCode::CATALOG_ERROR,
            Self::Query(err) => err.exit_code(),
            Self::Io(_) => ExitCode::IO_ERROR,
            Self::Json(_) => ExitCode::ERROR,
        }
    }
}

// ============================================================================
// Configuration Errors
// ============================================================================

/// Configuration errors raised while resolving settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Field has an invalid value
    #[error("invalid value for '{field}': got '{value}', expected {expected}")]
    InvalidValue {
        /// Name of the field with invalid value
        field: String,
        /// The actual value provided
        value: String,
        /// Description of what was expected
        expected: String,
    },

    /// Metrics recorder or exporter could not be installed
    #[error("metrics setup failed: {0}")]
    Metrics(String),
}

// ============================================================================
// Fetch Errors
// ============================================================================

/// Errors from retrieving the guide page.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    /// Connection failure, DNS failure, or body read failure
    #[error("network error: {0}")]
    Network(String),

    /// Request did not complete within the configured timeout
    #[error("request timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// Server answered with a non-success status
    #[error("unexpected HTTP status {0}")]
    HttpStatus(u16),

    /// Response body exceeded the configured limit
    #[error("response body too large: {size} bytes (limit: {limit})")]
    BodyTooLarge {
        /// Actual body size in bytes
        size: usize,
        /// Configured size limit in bytes
        limit: usize,
    },
}

// ============================================================================
// Parse Errors
// ============================================================================

/// Structural errors found while parsing the guide page.
///
/// Any of these aborts the parse; no partial catalog is produced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// A structural anchor (content container) is missing
    #[error("page structure changed: missing anchor '{0}'")]
    MissingAnchor(&'static str),

    /// A known phase section is missing
    #[error("phase section '{0}' not found on page")]
    MissingPhase(Phase),

    /// A phase section appears twice
    #[error("phase section '{0}' appears more than once")]
    DuplicatePhase(Phase),

    /// A class subsection is missing from a phase
    #[error("class subsection '{class}' missing from phase '{phase}'")]
    MissingClass {
        /// Phase section that lacks the subsection
        phase: Phase,
        /// Missing class
        class: ClassRole,
    },

    /// A class subsection appears twice within one phase
    #[error("class subsection '{class}' appears more than once in phase '{phase}'")]
    DuplicateClass {
        /// Phase section containing the duplicate
        phase: Phase,
        /// Duplicated class
        class: ClassRole,
    },

    /// A section heading that matches no known phase
    #[error("unknown phase heading '{0}'")]
    UnknownPhase(String),

    /// A subsection heading that matches no known class
    #[error("unknown class heading '{heading}' in phase '{phase}'")]
    UnknownClass {
        /// Enclosing phase
        phase: Phase,
        /// Heading text as found
        heading: String,
    },

    /// A category heading that matches no known item category
    #[error("unknown item category '{heading}' under {phase}/{class}")]
    UnknownCategory {
        /// Enclosing phase
        phase: Phase,
        /// Enclosing class
        class: ClassRole,
        /// Heading text as found
        heading: String,
    },

    /// An item list appears before any category heading
    #[error("item '{item}' under {phase}/{class} is not under a category heading")]
    ItemOutsideCategory {
        /// Enclosing phase
        phase: Phase,
        /// Enclosing class
        class: ClassRole,
        /// Item text
        item: String,
    },

    /// A link that cannot be turned into an item reference
    #[error("unusable item link '{0}'")]
    BadLink(String),
}

// ============================================================================
// Catalog Errors
// ============================================================================

/// Cause of a failed catalog refresh.
#[derive(Debug, Clone, Error)]
pub enum RefreshError {
    /// Page could not be fetched
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Page could not be parsed
    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Errors surfaced by the catalog cache.
#[derive(Debug, Clone, Error)]
pub enum CatalogError {
    /// No catalog has ever been built and the refresh failed
    #[error("class setups are unavailable: {source}")]
    Unavailable {
        /// Why the refresh failed
        #[source]
        source: RefreshError,
    },
}

// ============================================================================
// Phase Store Errors
// ============================================================================

/// Errors from loading or flushing the phase store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// State file could not be read or written
    #[error("state file {path}: {source}")]
    Io {
        /// State file path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// State file is not valid JSON for the expected layout
    #[error("state file {path} is malformed: {source}")]
    Json {
        /// State file path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: serde_json::Error,
    },
}

// ============================================================================
// Query Errors
// ============================================================================

/// Errors returned by the query service.
#[derive(Debug, Error)]
pub enum QueryError {
    /// The server has not selected a phase yet
    #[error("no phase configured for server '{server}'; ask an admin to run `phase set`")]
    PhaseNotConfigured {
        /// Server identifier
        server: String,
    },

    /// Phase text did not match any known phase
    #[error("phase '{input}' not recognised{}", suggestion_suffix(.suggestion))]
    UnknownPhase {
        /// Text as supplied
        input: String,
        /// Closest known phase, if any was reasonably close
        suggestion: Option<Phase>,
    },

    /// Class text did not match any known class
    #[error("class '{input}' not recognised (expected Ranger, Mage, Summoner or Melee)")]
    UnknownClass {
        /// Text as supplied
        input: String,
    },

    /// Neither an explicit class nor a class role was available
    #[error("could not detect a class; pass --class or give the member a Ranger/Mage/Summoner/Melee role")]
    ClassNotDetected,

    /// Catalog unavailable
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// Phase store failure
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl QueryError {
    /// Returns the exit code for this query failure.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::PhaseNotConfigured { .. }
            | Self::UnknownPhase { .. }
            | Self::UnknownClass { .. }
            | Self::ClassNotDetected => ExitCode::QUERY_ERROR,
            Self::Catalog(_) => ExitCode::CATALOG_ERROR,
            Self::Store(_) => ExitCode::CONFIG_ERROR,
        }
    }
}

fn suggestion_suffix(suggestion: &Option<Phase>) -> String {
    suggestion.map_or_else(String::new, |p| format!("; did you mean '{p}'?"))
}

// ============================================================================
// Result Type Alias
// ============================================================================

/// Result type alias for `classguide` operations.
pub type Result<T> = std::result::Result<T, GuideError>;

// ============================================================================
// Tests
// ============================================================================
