//! Persistent run state.
//!
//! A single JSON document records the day the batch last completed and, per
//! series, the release dates last seen on its page and the outcome of the
//! latest download. The store writes the whole document through on every
//! mutation so a crash loses at most the operation in flight.

pub mod error;
pub mod store;
pub mod types;

pub use error::{FilesystemError, StateError};
pub use store::{JsonStateStore, StateStore};
pub use types::{SeriesRecord, StateDocument};
