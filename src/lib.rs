//! `classguide` - progression-aware class setups scraped from the
//! Terraria wiki.
//!
//! The crate downloads one guide page, parses it into a catalog of item
//! lists per (phase, class), caches it, and answers lookups for servers
//! that have each selected a progression phase.

pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod model;
pub mod observability;
pub mod phase;
pub mod query;
pub mod serve;
