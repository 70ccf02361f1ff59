//! The `WalletSqliteDatabase` itself
// Grounded on crates/cdk-sqlite/src/async_sqlite.rs's `AsyncSqlite`: a
// `tokio::sync::Mutex<rusqlite::Connection>`, with each operation taking the
// lock and running its SQL directly — no pooling, no generic
// `DatabaseExecutor`/`Statement` builder layer, since this store is
// single-mint and single-writer by design. Proofs and cached mint metadata
// are stored as JSON blobs (one row per key) rather than normalized columns,
// since every reader already goes through `serde` to get a typed value back
// out and a handful of small tables does not need column-level queries.

use std::path::Path;

use async_trait::async_trait;
use cashu::{Amount, Proof, Secret, SecretKey};
use cdk::database::{CachedMintMetadata, MintQuote, WalletDatabase, MINT_METADATA_TTL_SECS};
use cdk::wallet::OpenableDatabase;
use rusqlite::Connection;
use tokio::sync::Mutex;
use tracing::instrument;

use crate::error::Error;

fn unix_time() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

const MIGRATIONS: &str = "
CREATE TABLE IF NOT EXISTS proofs (
    secret TEXT PRIMARY KEY NOT NULL,
    data   TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS silent_payment_keys (
    id         INTEGER PRIMARY KEY CHECK (id = 0),
    scan_priv  TEXT NOT NULL,
    spend_priv TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS mint_metadata (
    mint_url TEXT PRIMARY KEY NOT NULL,
    data     TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS mint_quotes (
    id   TEXT PRIMARY KEY NOT NULL,
    data TEXT NOT NULL
);
";

/// A [`cdk::WalletDatabase`] backed by a SQLite file (or an in-memory
/// database, for tests).
#[derive(Debug)]
pub struct WalletSqliteDatabase {
    conn: Mutex<Connection>,
}

impl WalletSqliteDatabase {
    /// Open (creating if necessary) the database at `path`, running
    /// migrations, matching [`OpenableDatabase::open`] but callable directly
    /// when a caller already has a concrete `WalletSqliteDatabase` in hand.
    #[instrument]
    pub async fn open(path: &Path) -> Result<Self, Error> {
        let conn = Connection::open(path)?;
        Self::migrate_and_wrap(conn)
    }

    /// An in-memory database, for tests.
    pub fn in_memory() -> Result<Self, Error> {
        let conn = Connection::open_in_memory()?;
        Self::migrate_and_wrap(conn)
    }

    fn migrate_and_wrap(conn: Connection) -> Result<Self, Error> {
        conn.execute_batch(MIGRATIONS)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

#[async_trait]
impl OpenableDatabase for WalletSqliteDatabase {
    async fn open(path: &Path) -> Result<Self, Self::Err> {
        WalletSqliteDatabase::open(path).await
    }
}

#[async_trait]
impl WalletDatabase for WalletSqliteDatabase {
    type Err = Error;

    #[instrument(skip(self))]
    async fn get_balance(&self) -> Result<Amount, Error> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare_cached("SELECT data FROM proofs")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut total = Amount::ZERO;
        for row in rows {
            let proof: Proof = serde_json::from_str(&row?)?;
            total = total + proof.amount;
        }
        Ok(total)
    }

    #[instrument(skip(self, proofs))]
    async fn add_proofs(&self, proofs: &[Proof]) -> Result<(), Error> {
        let conn = self.conn.lock().await;
        let mut stmt =
            conn.prepare_cached("INSERT OR REPLACE INTO proofs (secret, data) VALUES (?1, ?2)")?;
        for proof in proofs {
            let data = serde_json::to_string(proof)?;
            stmt.execute(rusqlite::params![proof.secret.to_string(), data])?;
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn remove_proofs(&self, secrets: &[Secret]) -> Result<(), Error> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare_cached("DELETE FROM proofs WHERE secret = ?1")?;
        for secret in secrets {
            stmt.execute([secret.to_string()])?;
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_proofs(&self) -> Result<Vec<Proof>, Error> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare_cached("SELECT data FROM proofs")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut proofs = Vec::new();
        for row in rows {
            proofs.push(serde_json::from_str(&row?)?);
        }
        Ok(proofs)
    }

    #[instrument(skip(self))]
    async fn get_silent_keys(&self) -> Result<Option<(SecretKey, SecretKey)>, Error> {
        let conn = self.conn.lock().await;
        let mut stmt =
            conn.prepare_cached("SELECT scan_priv, spend_priv FROM silent_payment_keys WHERE id = 0")?;
        let mut rows = stmt.query([])?;
        let Some(row) = rows.next()? else {
            return Ok(None);
        };
        let scan_priv: String = row.get(0)?;
        let spend_priv: String = row.get(1)?;
        Ok(Some((
            scan_priv.parse().map_err(cdk::Error::from)?,
            spend_priv.parse().map_err(cdk::Error::from)?,
        )))
    }

    #[instrument(skip(self, scan_priv, spend_priv))]
    async fn save_silent_keys(&self, scan_priv: &SecretKey, spend_priv: &SecretKey) -> Result<(), Error> {
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT OR REPLACE INTO silent_payment_keys (id, scan_priv, spend_priv) VALUES (0, ?1, ?2)",
            rusqlite::params![scan_priv.to_secret_hex(), spend_priv.to_secret_hex()],
        )?;
        Ok(())
    }

    /// TTL-gated per the trait doc: a snapshot older than
    /// [`MINT_METADATA_TTL_SECS`] is treated as absent, not returned stale.
    #[instrument(skip(self))]
    async fn get_cached_mint_meta(&self, mint_url: &str) -> Result<Option<CachedMintMetadata>, Error> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare_cached("SELECT data FROM mint_metadata WHERE mint_url = ?1")?;
        let mut rows = stmt.query([mint_url])?;
        let Some(row) = rows.next()? else {
            return Ok(None);
        };
        let data: String = row.get(0)?;
        let meta: CachedMintMetadata = serde_json::from_str(&data)?;
        if unix_time().saturating_sub(meta.cached_at) >= MINT_METADATA_TTL_SECS {
            return Ok(None);
        }
        Ok(Some(meta))
    }

    #[instrument(skip(self, meta))]
    async fn cache_mint_meta(&self, mint_url: &str, meta: CachedMintMetadata) -> Result<(), Error> {
        let conn = self.conn.lock().await;
        let data = serde_json::to_string(&meta)?;
        conn.execute(
            "INSERT OR REPLACE INTO mint_metadata (mint_url, data) VALUES (?1, ?2)",
            rusqlite::params![mint_url, data],
        )?;
        Ok(())
    }

    #[instrument(skip(self, quote))]
    async fn add_mint_quote(&self, quote: &MintQuote) -> Result<(), Error> {
        let conn = self.conn.lock().await;
        let data = serde_json::to_string(quote)?;
        conn.execute(
            "INSERT OR REPLACE INTO mint_quotes (id, data) VALUES (?1, ?2)",
            rusqlite::params![quote.id, data],
        )?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_mint_quote(&self, id: &str) -> Result<Option<MintQuote>, Error> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare_cached("SELECT data FROM mint_quotes WHERE id = ?1")?;
        let mut rows = stmt.query([id])?;
        let Some(row) = rows.next()? else {
            return Ok(None);
        };
        let data: String = row.get(0)?;
        Ok(Some(serde_json::from_str(&data)?))
    }
}
