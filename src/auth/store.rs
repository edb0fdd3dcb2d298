// Token persistence
// Durable key-value storage for the access/refresh token pair

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, RwLock};

use super::types::TokenPair;

pub const ACCESS_TOKEN_KEY: &str = "parko_access_token";
pub const REFRESH_TOKEN_KEY: &str = "parko_refresh_token";

/// Storage for the session's tokens
///
/// Tokens are opaque strings. Absence is the only "error": implementations
/// log storage failures and report the value as missing.
pub trait TokenStore: Send + Sync {
    fn access(&self) -> Option<String>;

    fn refresh(&self) -> Option<String>;

    /// Store a pair; a missing refresh token keeps the one already stored
    fn set(&self, pair: &TokenPair);

    fn clear(&self);

    /// Both tokens are present
    fn has_tokens(&self) -> bool {
        self.access().is_some() && self.refresh().is_some()
    }
}

/// Token store backed by an `auth_kv` table in a SQLite file
pub struct SqliteTokenStore {
    conn: Mutex<Connection>,
}

impl SqliteTokenStore {
    /// Open (or create) the token database at `path`
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create token directory: {}", parent.display())
                })?;
            }
        }

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open SQLite database: {}", path.display()))?;
        Self::from_connection(conn)
    }

    /// Store that lives only as long as the process
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory SQLite")?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS auth_kv (key TEXT PRIMARY KEY, value TEXT NOT NULL)",
            [],
        )
        .context("Failed to create auth_kv table")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn read(&self, key: &str) -> Option<String> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        conn.query_row("SELECT value FROM auth_kv WHERE key = ?", [key], |row| {
            row.get::<_, String>(0)
        })
        .optional()
        .unwrap_or_else(|e| {
            tracing::error!(key = key, error = %e, "Failed to read token from SQLite");
            None
        })
    }

    fn write_pair(&self, pair: &TokenPair) -> rusqlite::Result<()> {
        let mut conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT OR REPLACE INTO auth_kv (key, value) VALUES (?1, ?2)",
            [ACCESS_TOKEN_KEY, pair.access.as_str()],
        )?;
        if let Some(ref refresh) = pair.refresh {
            tx.execute(
                "INSERT OR REPLACE INTO auth_kv (key, value) VALUES (?1, ?2)",
                [REFRESH_TOKEN_KEY, refresh.as_str()],
            )?;
        }
        tx.commit()
    }

    fn delete_all(&self) -> rusqlite::Result<()> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        conn.execute(
            "DELETE FROM auth_kv WHERE key IN (?1, ?2)",
            [ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY],
        )?;
        Ok(())
    }
}

impl TokenStore for SqliteTokenStore {
    fn access(&self) -> Option<String> {
        self.read(ACCESS_TOKEN_KEY)
    }

    fn refresh(&self) -> Option<String> {
        self.read(REFRESH_TOKEN_KEY)
    }

    fn set(&self, pair: &TokenPair) {
        if let Err(e) = self.write_pair(pair) {
            tracing::error!(error = %e, "Failed to persist tokens to SQLite");
        }
    }

    fn clear(&self) {
        if let Err(e) = self.delete_all() {
            tracing::error!(error = %e, "Failed to clear tokens from SQLite");
        }
    }
}

#[derive(Default)]
struct StoredTokens {
    access: Option<String>,
    refresh: Option<String>,
}

/// Process-local token store
#[derive(Default)]
pub struct MemoryTokenStore {
    tokens: RwLock<StoredTokens>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tokens(pair: &TokenPair) -> Self {
        let store = Self::new();
        store.set(pair);
        store
    }
}

impl TokenStore for MemoryTokenStore {
    fn access(&self) -> Option<String> {
        let tokens = self.tokens.read().unwrap_or_else(|e| e.into_inner());
        tokens.access.clone()
    }

    fn refresh(&self) -> Option<String> {
        let tokens = self.tokens.read().unwrap_or_else(|e| e.into_inner());
        tokens.refresh.clone()
    }

    fn set(&self, pair: &TokenPair) {
        let mut tokens = self.tokens.write().unwrap_or_else(|e| e.into_inner());
        tokens.access = Some(pair.access.clone());
        if let Some(ref refresh) = pair.refresh {
            tokens.refresh = Some(refresh.clone());
        }
    }

    fn clear(&self) {
        let mut tokens = self.tokens.write().unwrap_or_else(|e| e.into_inner());
        *tokens = StoredTokens::default();
    }
}
