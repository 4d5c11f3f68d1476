mod webstore;

pub use webstore::{ApiErrorObject, WebstoreError, WebstoreResult};
