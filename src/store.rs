//! SQLite persistence for rate records.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

use crate::error::StoreError;
use crate::rate_record::RateRecord;

type Result<T> = std::result::Result<T, StoreError>;

const CREATE_TABLE: &str = r"
    CREATE TABLE IF NOT EXISTS forex_rates (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        date TEXT NOT NULL,
        currency_pair TEXT NOT NULL,
        tt_buying TEXT NOT NULL,
        tt_selling TEXT NOT NULL,
        timestamp TEXT NOT NULL,
        UNIQUE(date, currency_pair)
    )
";

/// Handle to the `forex_rates` table.
///
/// Ingest opens it read-write with [`RateStore::open`]; the viewer uses
/// [`RateStore::open_read_only`], which never creates the file and reads a
/// missing store as empty.
#[derive(Debug, Clone)]
pub struct RateStore {
    pool: SqlitePool,
    /// `None` for in-memory stores.
    path: Option<PathBuf>,
}

impl RateStore {
    /// Opens (creating if needed) the database file and initializes it.
    pub async fn open(path: &Path) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        let store = Self {
            pool,
            path: Some(path.to_path_buf()),
        };
        store.initialize().await?;
        Ok(store)
    }

    /// Opens the database for reading without touching the file.
    ///
    /// Connections are made lazily, so the file may appear after the viewer
    /// has started.
    pub fn open_read_only(path: &Path) -> Self {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .read_only(true)
            .create_if_missing(false);
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_lazy_with(options);

        Self {
            pool,
            path: Some(path.to_path_buf()),
        }
    }

    /// Creates an initialized in-memory store.
    pub async fn open_in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        // A single connection that is never recycled keeps the database alive.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let store = Self { pool, path: None };
        store.initialize().await?;
        Ok(store)
    }

    /// Creates the table and its uniqueness constraint if absent.
    pub async fn initialize(&self) -> Result<()> {
        sqlx::query(CREATE_TABLE).execute(&self.pool).await?;
        Ok(())
    }

    fn is_present(&self) -> bool {
        self.path.as_deref().is_none_or(Path::exists)
    }

    /// Inserts the record or replaces the one with the same date and pair.
    pub async fn upsert(&self, record: &RateRecord) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO forex_rates (date, currency_pair, tt_buying, tt_selling, timestamp)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(date, currency_pair) DO UPDATE SET
                tt_buying = excluded.tt_buying,
                tt_selling = excluded.tt_selling,
                timestamp = excluded.timestamp
            ",
        )
        .bind(record.date)
        .bind(&record.currency_pair)
        .bind(record.tt_buying.to_string())
        .bind(record.tt_selling.to_string())
        .bind(record.captured_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Records for `date`, ordered by currency pair.
    pub async fn query_by_date(&self, date: NaiveDate) -> Result<Vec<RateRecord>> {
        if !self.is_present() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, (NaiveDate, String, String, String, NaiveDateTime)>(
            r"
            SELECT date, currency_pair, tt_buying, tt_selling, timestamp
            FROM forex_rates
            WHERE date = ?1
            ORDER BY currency_pair
            ",
        )
        .bind(date)
        .fetch_all(&self.pool)
        .await;

        let rows = match rows {
            Ok(rows) => rows,
            Err(err) if is_missing_store(&err) => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        rows.into_iter()
            .map(|(date, currency_pair, buying, selling, captured_at)| -> Result<RateRecord> {
                Ok(RateRecord {
                    date,
                    tt_buying: decode_rate(&currency_pair, buying)?,
                    tt_selling: decode_rate(&currency_pair, selling)?,
                    currency_pair,
                    captured_at,
                })
            })
            .collect()
    }

    /// Every date with at least one record, most recent first.
    pub async fn distinct_dates(&self) -> Result<Vec<NaiveDate>> {
        if !self.is_present() {
            return Ok(Vec::new());
        }

        let dates = sqlx::query_scalar::<_, NaiveDate>(
            "SELECT DISTINCT date FROM forex_rates ORDER BY date DESC",
        )
        .fetch_all(&self.pool)
        .await;

        match dates {
            Ok(dates) => Ok(dates),
            Err(err) if is_missing_store(&err) => Ok(Vec::new()),
            Err(err) => Err(err.into()),
        }
    }
}

fn decode_rate(currency_pair: &str, value: String) -> Result<Decimal> {
    Decimal::from_str(&value).map_err(|_| StoreError::InvalidRate {
        currency_pair: currency_pair.to_string(),
        value,
    })
}

/// The file vanished or ingest has not created the table yet.
fn is_missing_store(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => {
            let message = db.message();
            message.contains("no such table") || message.contains("unable to open database file")
        }
        _ => false,
    }
}
