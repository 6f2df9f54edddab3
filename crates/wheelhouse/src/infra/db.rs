use log::debug;
use sqlx::{
    migrate::MigrateDatabase,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Row, Sqlite, SqlitePool,
};
use std::{
    hash::{DefaultHasher, Hash, Hasher},
    time::Duration as StdDuration,
};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use uuid::Uuid;

use crate::config::SqliteConfigSerde;

#[derive(Debug, Clone, PartialEq)]
pub enum SqliteMode {
    ReadWriteCreate,
    ReadWrite,
    ReadOnly,
    Memory,
}

/// Connection-level sqlite tuning. Journal, synchronous and temp_store are
/// kept as pragma strings validated against the values sqlite accepts;
/// anything unrecognized falls back to the safe default.
#[derive(Debug, Clone)]
pub struct SqliteConfig {
    pub mode: SqliteMode,
    pub shared_cache: bool,
    pub busy_timeout_ms: u32,
    pub journal_mode: String,
    pub synchronous: String,
    pub cache_size: i32,
    pub foreign_keys: bool,
    pub wal_autocheckpoint: Option<u32>,
    pub temp_store: String,
    pub mmap_size: Option<u64>,
    pub page_size: Option<u32>,
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            mode: SqliteMode::ReadWriteCreate,
            shared_cache: true,
            busy_timeout_ms: 5000,
            journal_mode: String::from("WAL"),
            synchronous: String::from("NORMAL"),
            cache_size: 1000000,
            foreign_keys: true,
            wal_autocheckpoint: Some(1000),
            temp_store: String::from("memory"),
            mmap_size: Some(268435456), // 256MB
            page_size: Some(4096),
        }
    }
}

fn pragma_or<'a>(value: &'a str, allowed: &[&str], fallback: &'a str) -> &'a str {
    if allowed.iter().any(|v| v.eq_ignore_ascii_case(value)) {
        value
    } else {
        fallback
    }
}

impl SqliteConfig {
    /// In-memory database with everything tuned for test speed.
    pub fn testing() -> Self {
        Self {
            mode: SqliteMode::Memory,
            journal_mode: String::from("MEMORY"),
            synchronous: String::from("OFF"),
            busy_timeout_ms: 1000,
            cache_size: 10000,
            wal_autocheckpoint: None,
            mmap_size: None,
            page_size: None,
            ..Default::default()
        }
    }

    fn read_only(&self) -> Self {
        Self {
            mode: SqliteMode::ReadOnly,
            // No writes happen on this pool, sync cost buys nothing
            synchronous: String::from("OFF"),
            foreign_keys: false,
            cache_size: self.cache_size * 2,
            ..self.clone()
        }
    }

    pub fn build_connect_options(&self, database_path: &str) -> SqliteConnectOptions {
        let mut options = SqliteConnectOptions::new();

        match self.mode {
            SqliteMode::Memory => {
                // Shared named memory database so the read and write pools of
                // one connection see the same tables. The name is a hash of
                // the path to dodge uri character issues.
                let mut hasher = DefaultHasher::new();
                database_path.hash(&mut hasher);
                let memory_uri =
                    format!("file:memdb_{}?mode=memory&cache=shared", hasher.finish());
                options = options.filename(&memory_uri).shared_cache(true);
            }
            SqliteMode::ReadOnly => {
                options = options
                    .filename(database_path)
                    .read_only(true)
                    .shared_cache(self.shared_cache);
            }
            SqliteMode::ReadWrite => {
                options = options
                    .filename(database_path)
                    .read_only(false)
                    .shared_cache(self.shared_cache);
            }
            SqliteMode::ReadWriteCreate => {
                options = options
                    .filename(database_path)
                    .read_only(false)
                    .create_if_missing(true)
                    .shared_cache(self.shared_cache);
            }
        }

        options = options
            .busy_timeout(StdDuration::from_millis(self.busy_timeout_ms as u64))
            .pragma(
                "journal_mode",
                pragma_or(
                    &self.journal_mode,
                    &["WAL", "DELETE", "TRUNCATE", "PERSIST", "MEMORY", "OFF"],
                    "WAL",
                )
                .to_string(),
            )
            .pragma(
                "synchronous",
                pragma_or(&self.synchronous, &["OFF", "NORMAL", "FULL", "EXTRA"], "NORMAL")
                    .to_string(),
            )
            .pragma("cache_size", self.cache_size.to_string())
            .pragma(
                "temp_store",
                pragma_or(&self.temp_store, &["default", "file", "memory"], "memory")
                    .to_string(),
            );

        if self.foreign_keys {
            options = options.pragma("foreign_keys", "true");
        }
        if let Some(checkpoint) = self.wal_autocheckpoint {
            options = options.pragma("wal_autocheckpoint", checkpoint.to_string());
        }
        if let Some(mmap_size) = self.mmap_size {
            options = options.pragma("mmap_size", mmap_size.to_string());
        }
        if let Some(page_size) = self.page_size {
            options = options.pragma("page_size", page_size.to_string());
        }

        options
    }
}

impl From<SqliteConfigSerde> for SqliteConfig {
    fn from(config: SqliteConfigSerde) -> Self {
        Self {
            mode: match config.mode.as_str() {
                "ReadWrite" => SqliteMode::ReadWrite,
                "ReadOnly" => SqliteMode::ReadOnly,
                "Memory" => SqliteMode::Memory,
                _ => SqliteMode::ReadWriteCreate,
            },
            shared_cache: config.shared_cache,
            busy_timeout_ms: config.busy_timeout_ms,
            journal_mode: config.journal_mode,
            synchronous: config.synchronous,
            cache_size: config.cache_size,
            foreign_keys: config.foreign_keys,
            wal_autocheckpoint: config.wal_autocheckpoint,
            temp_store: config.temp_store,
            mmap_size: config.mmap_size,
            page_size: config.page_size,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DatabasePoolConfig {
    pub read_max_connections: u32,
    pub read_min_connections: u32,
    pub write_max_connections: u32,
    pub write_min_connections: u32,
    pub idle_timeout_secs: u64,
    pub acquire_timeout_secs: u64,
    pub sqlite_config: SqliteConfig,
}

impl Default for DatabasePoolConfig {
    fn default() -> Self {
        Self {
            read_max_connections: 12,
            read_min_connections: 2,
            write_max_connections: 5,
            write_min_connections: 1,
            idle_timeout_secs: 600,
            acquire_timeout_secs: 15,
            sqlite_config: SqliteConfig::default(),
        }
    }
}

impl DatabasePoolConfig {
    pub fn testing() -> Self {
        Self {
            read_max_connections: 2,
            write_max_connections: 1,
            acquire_timeout_secs: 5,
            sqlite_config: SqliteConfig::testing(),
            ..Default::default()
        }
    }
}

impl From<crate::config::DBSettings> for DatabasePoolConfig {
    fn from(config: crate::config::DBSettings) -> Self {
        Self {
            read_max_connections: config.read_max_connections,
            read_min_connections: config.read_min_connections,
            write_max_connections: config.write_max_connections,
            write_min_connections: config.write_min_connections,
            idle_timeout_secs: config.idle_timeout_secs,
            acquire_timeout_secs: config.acquire_timeout_secs,
            sqlite_config: config.sqlite_config.into(),
        }
    }
}

static CAMPAIGNS_MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations/campaigns");
static PLAYERS_MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations/players");

pub enum DatabaseType {
    Campaigns,
    Players,
}

/// One logical database backed by a read pool and a write pool. The write
/// pool is small to keep sqlite's single-writer contention down; reads get
/// the wider pool.
#[derive(Clone, Debug)]
pub struct DBConnection {
    pub database_name: String,
    pub database_path: String,
    read_pool: SqlitePool,
    write_pool: SqlitePool,
}

impl DBConnection {
    pub async fn new(
        path: &str,
        db_name: &str,
        pool_config: DatabasePoolConfig,
        db_type: DatabaseType,
    ) -> Result<Self, sqlx::Error> {
        let database_path = format!("{}/{}.db", path, db_name);

        if pool_config.sqlite_config.mode != SqliteMode::Memory {
            let database_url = format!("sqlite:{}", database_path);
            if !Sqlite::database_exists(&database_url).await? {
                Sqlite::create_database(&database_url).await?;
            }
        }

        let (read_pool, write_pool) = Self::create_pools(&database_path, &pool_config).await?;

        let migrator = match db_type {
            DatabaseType::Campaigns => &CAMPAIGNS_MIGRATOR,
            DatabaseType::Players => &PLAYERS_MIGRATOR,
        };
        migrator
            .run(&write_pool)
            .await
            .map_err(|e| sqlx::Error::Migrate(Box::new(e)))?;

        Ok(Self {
            database_name: db_name.to_string(),
            database_path,
            read_pool,
            write_pool,
        })
    }

    #[cfg(test)]
    pub fn new_with_pools(
        database_name: String,
        database_path: String,
        read_pool: SqlitePool,
        write_pool: SqlitePool,
    ) -> Self {
        Self {
            database_name,
            database_path,
            read_pool,
            write_pool,
        }
    }

    async fn create_pools(
        database_path: &str,
        pool_config: &DatabasePoolConfig,
    ) -> Result<(SqlitePool, SqlitePool), sqlx::Error> {
        let write_config = if pool_config.sqlite_config.mode == SqliteMode::Memory {
            pool_config.sqlite_config.clone()
        } else {
            SqliteConfig {
                mode: SqliteMode::ReadWrite,
                ..pool_config.sqlite_config.clone()
            }
        };
        let read_config = if pool_config.sqlite_config.mode == SqliteMode::Memory {
            pool_config.sqlite_config.clone()
        } else {
            pool_config.sqlite_config.read_only()
        };

        let write_options = write_config.build_connect_options(database_path);
        debug!("write connection: {:?}", write_options);
        let write_pool = SqlitePoolOptions::new()
            .max_connections(pool_config.write_max_connections)
            .min_connections(pool_config.write_min_connections)
            .acquire_timeout(StdDuration::from_secs(pool_config.acquire_timeout_secs))
            .idle_timeout(StdDuration::from_secs(pool_config.idle_timeout_secs))
            .connect_with(write_options)
            .await?;

        let read_options = read_config.build_connect_options(database_path);
        debug!("read connection: {:?}", read_options);
        let read_pool = SqlitePoolOptions::new()
            .max_connections(pool_config.read_max_connections)
            .min_connections(pool_config.read_min_connections)
            .acquire_timeout(StdDuration::from_secs(pool_config.acquire_timeout_secs))
            .idle_timeout(StdDuration::from_secs(pool_config.idle_timeout_secs))
            .connect_with(read_options)
            .await?;

        Ok((read_pool, write_pool))
    }

    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        let _: i32 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.read_pool)
            .await?;
        let _: i32 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.write_pool)
            .await?;
        Ok(())
    }

    pub async fn close(self) {
        self.read_pool.close().await;
        self.write_pool.close().await;
    }

    pub fn read(&self) -> &SqlitePool {
        &self.read_pool
    }

    pub fn write(&self) -> &SqlitePool {
        &self.write_pool
    }
}

pub fn parse_uuid(row: &SqliteRow, column: &str) -> Result<Uuid, sqlx::Error> {
    Uuid::parse_str(&row.get::<String, _>(column)).map_err(|e| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    })
}

pub fn parse_required_datetime(
    row: &SqliteRow,
    column: &str,
) -> Result<OffsetDateTime, sqlx::Error> {
    let date_str: String = row.get(column);
    OffsetDateTime::parse(&date_str, &Rfc3339).map_err(|e| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    })
}

pub fn parse_optional_datetime(
    row: &SqliteRow,
    column: &str,
) -> Result<Option<OffsetDateTime>, sqlx::Error> {
    row.get::<Option<String>, _>(column)
        .map(|s| OffsetDateTime::parse(&s, &Rfc3339))
        .transpose()
        .map_err(|e| sqlx::Error::ColumnDecode {
            index: column.to_string(),
            source: Box::new(e),
        })
}

pub fn parse_required_json<T>(row: &SqliteRow, column: &str) -> Result<T, sqlx::Error>
where
    T: serde::de::DeserializeOwned,
{
    let raw: String = row.get(column);
    serde_json::from_str(&raw).map_err(|e| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    })
}

/// RFC3339 text, the format every datetime column stores.
pub fn format_datetime(value: OffsetDateTime) -> String {
    value
        .format(&Rfc3339)
        .expect("OffsetDateTime always formats as RFC3339")
}
