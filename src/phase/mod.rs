//! Per-server phase selection.
//!
//! [`PhaseStore`] keeps the phase each server has selected;
//! [`resolve_phase`] turns free-form admin input into a [`Phase`].
//!
//! [`Phase`]: crate::model::Phase

pub mod resolve;
pub mod store;

pub use resolve::resolve_phase;
pub use store::PhaseStore;
