//! `innkeep-infra` — storage adapters.
//!
//! In-memory implementations used by the API process and tests. A document
//! database adapter would implement the same traits.

pub mod credentials;
pub mod store;

pub use credentials::InMemoryCredentialStore;
pub use store::{InMemoryStore, RecordStore};
