//! Infrastructure layer - store connections.

mod db;
mod kv;

pub use db::Database;
pub use kv::KeyValueStore;
