pub mod connection_pool;
pub mod sqlite_cart_store;
pub mod sqlite_user_directory;

pub use connection_pool::ConnectionPool;
pub use sqlite_cart_store::SqliteCartStore;
pub use sqlite_user_directory::SqliteUserDirectory;
