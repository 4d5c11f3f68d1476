pub mod config;
pub mod db;
pub mod error;
pub mod formats;
pub mod query;
pub mod server;

pub use error::{WebstoreError, WebstoreResult};
