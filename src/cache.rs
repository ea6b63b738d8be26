// 🗄️ Coin cache - last known coin list
//
// Only business fields are persisted. Display state is derived again after
// every load. Saves replace the whole list; `sequence_id` keeps list order.

use crate::coin::Coin;
use crate::error::{CacheError, CacheResult};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::Deserialize;
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, warn};

// ============================================================================
// CACHE STORE CAPABILITY
// ============================================================================

/// Narrow persistence interface used by the reconciliation engine.
///
/// `load` never fails from the caller's view (empty list on no data or
/// error) and `save` is best-effort.
pub trait CacheStore: Send + Sync {
    fn load(&self) -> Vec<Coin>;
    fn save(&self, coins: &[Coin]);
}

// ============================================================================
// SQLITE CACHE
// ============================================================================

pub struct SqliteCacheStore {
    conn: Mutex<Connection>,
}

impl SqliteCacheStore {
    pub fn open(path: &Path) -> CacheResult<Self> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> CacheResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> CacheResult<Self> {
        setup_database(&conn)?;
        Ok(SqliteCacheStore {
            conn: Mutex::new(conn),
        })
    }

    pub fn try_load(&self) -> CacheResult<Vec<Coin>> {
        let conn = self.conn.lock().map_err(|_| CacheError::Poisoned)?;
        get_all_coins(&conn)
    }

    pub fn try_save(&self, coins: &[Coin]) -> CacheResult<usize> {
        let mut conn = self.conn.lock().map_err(|_| CacheError::Poisoned)?;
        replace_coins(&mut conn, coins)
    }

    /// When the cache was last written, if ever.
    pub fn last_saved_at(&self) -> CacheResult<Option<DateTime<Utc>>> {
        let conn = self.conn.lock().map_err(|_| CacheError::Poisoned)?;
        let saved: Option<String> = conn
            .query_row(
                "SELECT value FROM cache_meta WHERE key = 'saved_at'",
                [],
                |row| row.get(0),
            )
            .optional()?;

        Ok(saved
            .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
            .map(|dt| dt.with_timezone(&Utc)))
    }

    pub fn count(&self) -> CacheResult<i64> {
        let conn = self.conn.lock().map_err(|_| CacheError::Poisoned)?;
        verify_count(&conn)
    }
}

impl CacheStore for SqliteCacheStore {
    fn load(&self) -> Vec<Coin> {
        match self.try_load() {
            Ok(coins) => {
                debug!(count = coins.len(), "Loaded coins from cache");
                coins
            }
            Err(e) => {
                warn!(error = %e, "Cache read failed, treating as empty");
                Vec::new()
            }
        }
    }

    fn save(&self, coins: &[Coin]) {
        match self.try_save(coins) {
            Ok(inserted) => debug!(count = inserted, "Saved coins to cache"),
            Err(e) => warn!(error = %e, "Cache write failed"),
        }
    }
}

pub fn setup_database(conn: &Connection) -> CacheResult<()> {
    // WAL for crash recovery; in-memory databases answer "memory" and that's fine
    let _mode: String =
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS coins (
            sequence_id INTEGER PRIMARY KEY,
            name TEXT,
            symbol TEXT,
            is_new INTEGER NOT NULL,
            is_active INTEGER NOT NULL,
            coin_type TEXT
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS cache_meta (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )",
        [],
    )?;

    Ok(())
}

/// Clear the table and insert `coins` in order, as one transaction.
pub fn replace_coins(conn: &mut Connection, coins: &[Coin]) -> CacheResult<usize> {
    let tx = conn.transaction()?;

    tx.execute("DELETE FROM coins", [])?;

    let mut inserted = 0;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO coins (sequence_id, name, symbol, is_new, is_active, coin_type)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )?;

        for (index, coin) in coins.iter().enumerate() {
            stmt.execute(params![
                index as i64,
                coin.name,
                coin.symbol,
                coin.is_new,
                coin.is_active,
                coin.coin_type,
            ])?;
            inserted += 1;
        }
    }

    tx.execute(
        "INSERT INTO cache_meta (key, value) VALUES ('saved_at', ?1)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        params![Utc::now().to_rfc3339()],
    )?;

    tx.commit()?;
    Ok(inserted)
}

pub fn get_all_coins(conn: &Connection) -> CacheResult<Vec<Coin>> {
    let mut stmt = conn.prepare(
        "SELECT name, symbol, is_new, is_active, coin_type
         FROM coins
         ORDER BY sequence_id ASC",
    )?;

    let coins = stmt
        .query_map([], |row| {
            Ok(Coin {
                name: row.get(0)?,
                symbol: row.get(1)?,
                is_new: row.get(2)?,
                is_active: row.get(3)?,
                coin_type: row.get(4)?,
                display: Default::default(),
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(coins)
}

pub fn verify_count(conn: &Connection) -> CacheResult<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM coins", [], |row| row.get(0))?;
    Ok(count)
}

// ============================================================================
// IN-MEMORY CACHE
// ============================================================================

/// Process-local cache, used when no database path is configured and in tests.
#[derive(Default)]
pub struct MemoryCacheStore {
    coins: Mutex<Vec<Coin>>,
    saves: Mutex<usize>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_coins(coins: Vec<Coin>) -> Self {
        MemoryCacheStore {
            coins: Mutex::new(coins),
            saves: Mutex::new(0),
        }
    }

    /// Number of `save` calls received.
    pub fn save_count(&self) -> usize {
        self.saves.lock().map(|s| *s).unwrap_or(0)
    }
}

impl CacheStore for MemoryCacheStore {
    fn load(&self) -> Vec<Coin> {
        match self.coins.lock() {
            Ok(coins) => coins.clone(),
            Err(_) => {
                warn!("Memory cache lock poisoned, treating as empty");
                Vec::new()
            }
        }
    }

    fn save(&self, coins: &[Coin]) {
        match (self.coins.lock(), self.saves.lock()) {
            (Ok(mut stored), Ok(mut saves)) => {
                // Strip display state, same as the SQLite store
                *stored = coins
                    .iter()
                    .map(|c| Coin { display: Default::default(), ..c.clone() })
                    .collect();
                *saves += 1;
            }
            _ => warn!("Memory cache lock poisoned, save dropped"),
        }
    }
}

// ============================================================================
// CSV SEED IMPORT
// ============================================================================

#[derive(Debug, Deserialize)]
struct CsvCoin {
    name: Option<String>,
    symbol: Option<String>,
    is_new: bool,
    is_active: bool,
    #[serde(rename = "type")]
    coin_type: Option<String>,
}

impl From<CsvCoin> for Coin {
    fn from(row: CsvCoin) -> Self {
        Coin {
            name: row.name.filter(|s| !s.is_empty()),
            symbol: row.symbol.filter(|s| !s.is_empty()),
            is_new: row.is_new,
            is_active: row.is_active,
            coin_type: row.coin_type.filter(|s| !s.is_empty()),
            display: Default::default(),
        }
    }
}

/// Read coins from CSV (`name,symbol,is_new,is_active,type`).
pub fn load_csv(csv_path: &Path) -> CacheResult<Vec<Coin>> {
    let rdr = csv::Reader::from_path(csv_path)?;
    read_csv(rdr)
}

fn read_csv<R: std::io::Read>(mut rdr: csv::Reader<R>) -> CacheResult<Vec<Coin>> {
    let mut coins = Vec::new();
    for result in rdr.deserialize() {
        let row: CsvCoin = result?;
        coins.push(row.into());
    }
    Ok(coins)
}

// ============================================================================
// TESTS
// ============================================================================
