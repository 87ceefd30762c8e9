//! SQLite database connection and migration management.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use sqlx::SqlitePool;
use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use tracing::{debug, info};

use super::schema;
use super::sync::SqliteSyncRepository;
use super::task::SqliteTaskRepository;
use super::todo_list::SqliteTodoListRepository;
use super::user::SqliteUserRepository;
use crate::config::StoreConfig;
use crate::db::{ChangeNotifier, Database, DbError, DbResult};

// Embed migrations from data/sql/sqlite/ at compile time
static MIGRATOR: Migrator = sqlx::migrate!("data/sql/sqlite");

/// SQLite database implementation.
///
/// Owns the connection pool and the change notifier shared by every
/// repository handed out. Repositories borrow both, so they are cheap to
/// create per call.
pub struct SqliteDatabase {
    pool: SqlitePool,
    notifier: ChangeNotifier,
}

impl SqliteDatabase {
    /// Open (or create) a database file with default settings.
    pub async fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        Self::open_with(path, &StoreConfig::default()).await
    }

    /// Open (or create) a database file.
    pub async fn open_with<P: AsRef<Path>>(path: P, config: &StoreConfig) -> DbResult<Self> {
        let path = path.as_ref();
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true)
            .busy_timeout(config.busy_timeout);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await
            .map_err(|e| DbError::Connection {
                message: format!("{}: {}", path.display(), e),
            })?;

        info!(path = %path.display(), "opened database");
        Ok(Self::from_pool(pool))
    }

    /// Create an in-memory database (useful for testing).
    ///
    /// Every SQLite connection to `:memory:` gets its own database, so the
    /// pool is pinned to one connection that is never recycled.
    pub async fn in_memory() -> DbResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| DbError::Connection {
                message: e.to_string(),
            })?
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>)
            .connect_with(options)
            .await
            .map_err(|e| DbError::Connection {
                message: e.to_string(),
            })?;

        Ok(Self::from_pool(pool))
    }

    fn from_pool(pool: SqlitePool) -> Self {
        Self {
            pool,
            notifier: ChangeNotifier::new(),
        }
    }

    /// The underlying pool, for tests and advanced operations that need
    /// direct database access.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close every pooled connection. Live queries stop on their next read.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

impl Database for SqliteDatabase {
    type Users<'a> = SqliteUserRepository<'a>;
    type TodoLists<'a> = SqliteTodoListRepository<'a>;
    type Tasks<'a> = SqliteTaskRepository<'a>;
    type SyncRepo<'a> = SqliteSyncRepository<'a>;

    async fn migrate(&self) -> DbResult<()> {
        MIGRATOR
            .run(&self.pool)
            .await
            .map_err(|e| DbError::Migration {
                message: e.to_string(),
            })?;
        debug!("migrations applied");

        schema::validate(&self.pool).await
    }

    async fn validate_schema(&self) -> DbResult<()> {
        schema::validate(&self.pool).await
    }

    fn notifier(&self) -> &ChangeNotifier {
        &self.notifier
    }

    fn users(&self) -> Self::Users<'_> {
        SqliteUserRepository {
            pool: &self.pool,
            notifier: &self.notifier,
        }
    }

    fn todo_lists(&self) -> Self::TodoLists<'_> {
        SqliteTodoListRepository {
            pool: &self.pool,
            notifier: &self.notifier,
        }
    }

    fn tasks(&self) -> Self::Tasks<'_> {
        SqliteTaskRepository {
            pool: &self.pool,
            notifier: &self.notifier,
        }
    }

    fn sync(&self) -> Self::SyncRepo<'_> {
        SqliteSyncRepository {
            pool: &self.pool,
            notifier: &self.notifier,
        }
    }
}
