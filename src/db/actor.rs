use crate::config::StorageConfig;
use crate::db::database::Database;
use crate::db::schema::validate_database_name;
use crate::db::traits::DatabaseFactory;
use crate::error::{WebstoreError, WebstoreResult};
use async_trait::async_trait;
use moka::sync::Cache;
use ractor::{Actor, ActorProcessingErr, ActorRef, RpcReplyPort};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug)]
pub enum DbFactoryMessage {
    /// Resolve a database by name, opening its pool on first use.
    Resolve(String, RpcReplyPort<Result<Database, WebstoreError>>),

    /// Names of databases with an open pool.
    ListOpen(RpcReplyPort<Vec<String>>),
}

#[derive(Clone)]
pub struct DbFactoryHandle {
    actor: ActorRef<DbFactoryMessage>,
}

impl DbFactoryHandle {
    pub async fn list_open(&self) -> WebstoreResult<Vec<String>> {
        ractor::call!(self.actor, DbFactoryMessage::ListOpen)
            .map_err(|e| WebstoreError::Actor(format!("DbFactory ListOpen RPC failed: {e}")))
    }
}

#[async_trait]
impl DatabaseFactory for DbFactoryHandle {
    async fn resolve(&self, name: &str) -> WebstoreResult<Database> {
        ractor::call!(self.actor, DbFactoryMessage::Resolve, name.to_string())
            .map_err(|e| WebstoreError::Actor(format!("DbFactory Resolve RPC failed: {e}")))?
    }
}

struct DbFactoryState {
    cfg: StorageConfig,
    pools: Cache<String, SqlitePool>,
}

struct DbFactory;

#[ractor::async_trait]
impl Actor for DbFactory {
    type Msg = DbFactoryMessage;
    type State = DbFactoryState;
    type Arguments = StorageConfig;

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        cfg: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        tokio::fs::create_dir_all(&cfg.data_dir)
            .await
            .map_err(|e| {
                ActorProcessingErr::from(format!(
                    "cannot create data dir {}: {e}",
                    cfg.data_dir.display()
                ))
            })?;

        let pools = Cache::builder()
            .max_capacity(cfg.max_open_databases)
            .time_to_idle(Duration::from_secs(cfg.idle_timeout_secs))
            // Requests may still hold a clone; the pool closes when the last one drops.
            .eviction_listener(|name: Arc<String>, _pool: SqlitePool, cause| {
                info!(database = %name, ?cause, "database pool released");
            })
            .build();

        info!(data_dir = %cfg.data_dir.display(), "DbFactory initialized");
        Ok(DbFactoryState { cfg, pools })
    }

    async fn handle(
        &self,
        _myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            DbFactoryMessage::Resolve(name, reply) => {
                let res = self.resolve(state, name).await;
                let _ = reply.send(res);
            }
            DbFactoryMessage::ListOpen(reply) => {
                let mut names: Vec<String> = state
                    .pools
                    .iter()
                    .map(|(name, _)| name.as_ref().clone())
                    .collect();
                names.sort();
                let _ = reply.send(names);
            }
        }
        Ok(())
    }
}

impl DbFactory {
    async fn resolve(
        &self,
        state: &mut DbFactoryState,
        name: String,
    ) -> Result<Database, WebstoreError> {
        validate_database_name(&name)?;

        if let Some(pool) = state.pools.get(&name) {
            if !pool.is_closed() {
                return Ok(Database::new(name, pool));
            }
            state.pools.invalidate(&name);
        }

        let path = state.cfg.data_dir.join(format!("{name}.db"));
        if !state.cfg.create_missing && !path.is_file() {
            return Err(WebstoreError::DatabaseUnavailable(name));
        }

        let connect_opts = SqliteConnectOptions::new()
            .filename(&path)
            .create_if_missing(state.cfg.create_missing)
            .busy_timeout(Duration::from_secs(state.cfg.busy_timeout_secs))
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .max_connections(state.cfg.max_connections)
            .connect_with(connect_opts)
            .await
            .map_err(|e| {
                warn!(database = %name, path = %path.display(), error = %e, "db connect failed");
                WebstoreError::DatabaseUnavailable(name.clone())
            })?;

        info!(database = %name, path = %path.display(), "database pool opened");
        state.pools.insert(name.clone(), pool.clone());
        Ok(Database::new(name, pool))
    }
}

/// Spawn the database factory actor and return a cloneable handle.
pub async fn spawn(cfg: StorageConfig) -> WebstoreResult<DbFactoryHandle> {
    let (actor, _jh) = ractor::Actor::spawn(None, DbFactory, cfg)
        .await
        .map_err(|e| WebstoreError::Actor(format!("failed to spawn DbFactory: {e}")))?;

    Ok(DbFactoryHandle { actor })
}
