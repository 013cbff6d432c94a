//! Local persistent store
//!
//! A single logical `userdata` table of `{key, data}` rows holding the auth
//! token, refresh token, cached user profile and client route logs.

pub mod memory;
#[cfg(feature = "sqlite")]
pub mod pool;
#[cfg(feature = "sqlite")]
pub mod repositories;
pub mod store;

pub use memory::MemoryStore;
#[cfg(feature = "sqlite")]
pub use pool::{StoreConfig, create_pool};
#[cfg(feature = "sqlite")]
pub use repositories::UserDataRepository;
pub use store::{KeyValueStore, StoreError, StoreKey, StoreOp, StoreOutput};

#[cfg(feature = "sqlite")]
pub use sqlx::SqlitePool;
