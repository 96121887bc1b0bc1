/// Database layer
///
/// # Modules
///
/// - `pool`: PostgreSQL connection pool
/// - `migrations`: Embedded schema migrations
/// - `store`: Repository traits the services depend on
/// - `postgres`: PostgreSQL store
/// - `memory`: In-memory store
/// - `error`: Backend-neutral storage errors

pub mod error;
pub mod memory;
pub mod migrations;
pub mod pool;
pub mod postgres;
pub mod store;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use store::{Repository, Store};
