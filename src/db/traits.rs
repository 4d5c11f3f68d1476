use super::database::Database;
use crate::error::WebstoreResult;
use async_trait::async_trait;

/// Resolves database names to live handles.
#[async_trait]
pub trait DatabaseFactory: Send + Sync {
    /// Fails with `DatabaseUnavailable` when the database cannot be opened.
    async fn resolve(&self, name: &str) -> WebstoreResult<Database>;
}
