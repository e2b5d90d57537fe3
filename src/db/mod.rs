use std::path::{Path, PathBuf};
use std::str::FromStr;

use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous},
    SqlitePool,
};

use crate::{
    core::errors::{AppError, AppResult},
    host::PropertyStore,
};

pub mod repositories;

#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn new(data_dir: &Path) -> AppResult<Self> {
        std::fs::create_dir_all(data_dir)?;
        let db_path = data_dir.join("deckorder.sqlite");
        let connect_options = SqliteConnectOptions::from_str(&format!(
            "sqlite:{}",
            db_path.to_string_lossy().replace('\\', "/")
        ))
        .map_err(|err| AppError::Database(err.to_string()))?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal);
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(connect_options)
            .await?;
        sqlx::query("PRAGMA foreign_keys = ON;")
            .execute(&pool)
            .await?;
        sqlx::migrate!("./src/db/migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub async fn in_memory() -> AppResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        sqlx::query("PRAGMA foreign_keys = ON;")
            .execute(&pool)
            .await?;
        sqlx::migrate!("./src/db/migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

pub fn default_data_dir(base: Option<PathBuf>) -> Result<PathBuf, AppError> {
    if let Some(path) = base {
        return Ok(path);
    }
    let mut cwd = std::env::current_dir().map_err(|err| AppError::Io(err.to_string()))?;
    cwd.push(".deckorder");
    Ok(cwd)
}

/// Key-value properties scoped to one document.
#[derive(Clone)]
pub struct DocumentProperties {
    db: Database,
    document_id: String,
}

impl DocumentProperties {
    pub fn new(db: Database, document_id: impl Into<String>) -> Self {
        Self {
            db,
            document_id: document_id.into(),
        }
    }

    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    pub async fn delete_property(&self, key: &str) -> AppResult<bool> {
        repositories::properties::delete_property(self.db.pool(), &self.document_id, key).await
    }
}

impl PropertyStore for DocumentProperties {
    async fn get_property(&self, key: &str) -> AppResult<Option<String>> {
        let stored =
            repositories::properties::get_property(self.db.pool(), &self.document_id, key).await?;
        Ok(stored.map(|property| property.value))
    }

    async fn set_property(&self, key: &str, value: &str) -> AppResult<()> {
        repositories::properties::set_property(self.db.pool(), &self.document_id, key, value).await
    }
}
