//! Storage interface for Zonal.
//!
//! The persistence engine itself (files, SQL, network) lives with the host;
//! this crate defines the asynchronous [`PlayerDataStore`] contract the merge
//! engine consumes, plus an in-memory backend for tests and embedding.

pub mod error;
pub mod memory;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use memory::InMemoryPlayerStore;
pub use traits::PlayerDataStore;
