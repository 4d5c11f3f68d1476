//! Database access: the factory actor that owns connection pools, and the
//! table gateway that runs generic operations over runtime-discovered schemas.
//!
//! Layout:
//! - `actor.rs`: name -> pool resolution, cached with idle eviction
//! - `database.rs`: table listing, table resolution, raw SQL
//! - `table.rs`: predicates, reads, staged writes on one table
//! - `cursor.rs`: lazy row materialisation
//! - `schema.rs`, `value.rs`, `predicate.rs`: SQL building blocks

pub mod actor;
pub mod cursor;
pub mod database;
pub mod predicate;
pub mod schema;
pub mod table;
pub mod traits;

mod value;

pub use actor::{DbFactoryHandle, spawn};
pub use cursor::RowCursor;
pub use database::Database;
pub use predicate::Predicate;
pub use schema::{ColumnInfo, ColumnKind};
pub use table::{Select, Table, resource_url};
pub use traits::DatabaseFactory;
