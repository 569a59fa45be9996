//! Data access layer
//!
//! The auth core talks to users through the `UserStore` trait; Postgres is
//! the production backend and the in-memory store backs tests.

pub mod memory;
pub mod postgres;
pub mod user;

pub use memory::MemoryUserStore;
pub use postgres::PgUserStore;
pub use user::{NewUser, StoreError, StoreResult, UserRecord, UserStore};
