use sea_orm::{Database, DatabaseConnection};
use sqlx::postgres::PgPoolOptions;
use tokio::sync::OnceCell;

use crate::error::{AppError, AppResult};

pub type DbPool = sqlx::PgPool;
pub type OrmConn = DatabaseConnection;

/// Lazily-initialized database handles, owned by `AppState` and shared for
/// the lifetime of the process. The first caller establishes the connection;
/// every later call reuses it. A failed connect is returned to the caller
/// and never retried here.
pub struct Db {
    database_url: String,
    pool: OnceCell<DbPool>,
    orm: OnceCell<OrmConn>,
}

impl Db {
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            pool: OnceCell::new(),
            orm: OnceCell::new(),
        }
    }

    /// sqlx pool, used for embedded migrations and the seed binary.
    pub async fn pool(&self) -> AppResult<&DbPool> {
        self.pool
            .get_or_try_init(|| async {
                PgPoolOptions::new()
                    .max_connections(10)
                    .connect(&self.database_url)
                    .await
                    .map_err(|err| AppError::Connection(Box::new(err)))
            })
            .await
    }

    /// SeaORM connection, used by the domain services.
    pub async fn orm(&self) -> AppResult<&OrmConn> {
        self.orm
            .get_or_try_init(|| async {
                Database::connect(self.database_url.as_str())
                    .await
                    .map_err(|err| AppError::Connection(Box::new(err)))
            })
            .await
    }
}
