//! Store repositories
//!
//! Sqlite-backed implementations of the key-value store contract.

pub mod userdata;

pub use userdata::UserDataRepository;
