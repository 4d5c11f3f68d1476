pub mod router;
pub mod routes;

pub use router::{WebstoreState, webstore_router};
