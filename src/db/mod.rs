pub mod connection;
pub mod schema;

pub use connection::make_pool;
pub use schema::ensure_schema;
