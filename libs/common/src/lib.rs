//! Record store adapter for the user dashboard
//!
//! This crate wraps the remote keyed collection the user directory lives in
//! and exposes ordered range, equality and limit queries over it. Results
//! come back as order-preserving [`store::Snapshot`]s of raw records; typing
//! them is left to the caller.

pub mod error;
pub mod firebase;
pub mod memory;
pub mod query;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use firebase::{FirebaseConfig, FirebaseStore};
pub use memory::MemoryStore;
pub use query::{LimitTo, Query, SENTINEL};
pub use store::{Record, RecordStore, Snapshot};
