//! `/db/...` routes: generic REST over the tables of a database.

pub mod extract;
pub mod handlers;
pub mod respond;

use crate::server::router::WebstoreState;
pub use crate::db::resource_url;
use handlers::{create, create_named, delete, index, read, row, sql, update};

use axum::{
    Router,
    routing::{get, post},
};

pub fn router(enable_sql: bool) -> Router<WebstoreState> {
    let database = if enable_sql {
        get(index).post(create).put(sql)
    } else {
        get(index).post(create)
    };

    Router::new()
        .route("/db/{database}", database)
        .route(
            "/db/{database}/{table}",
            post(create_named).get(read).put(update).delete(delete),
        )
        .route("/db/{database}/{table}/row/{row}", get(row))
}
