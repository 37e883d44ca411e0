use crate::DbError;
use chrono::NaiveDate;
use core_types::PriceRecord;
use rust_decimal::Decimal;
use sqlx::postgres::PgPool;
use sqlx::FromRow;

/// The `PriceRepository` provides a high-level, application-specific interface
/// to the daily price table. It encapsulates the one read-only query the
/// system issues.
#[derive(Debug, Clone)]
pub struct PriceRepository {
    pool: PgPool,
}

/// This struct represents a row fetched from the daily_prices table.
#[derive(FromRow, Debug, Clone)]
struct DbPriceRow {
    ticker: String,
    date: NaiveDate,
    open: Decimal,
    high: Decimal,
    low: Decimal,
    close: Decimal,
    volume: i64,
    sector: String,
}

impl From<DbPriceRow> for PriceRecord {
    fn from(row: DbPriceRow) -> Self {
        PriceRecord {
            ticker: row.ticker,
            date: row.date,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            volume: row.volume,
            sector: row.sector,
        }
    }
}

impl PriceRepository {
    /// Creates a new `PriceRepository` with a shared database connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Fetches every row of the daily price table.
    ///
    /// The query is checked at runtime rather than with the `query_as!` macro
    /// because the table schema belongs to an external ingestion process and
    /// is not available at compile time.
    pub async fn fetch_all_prices(&self) -> Result<Vec<PriceRecord>, DbError> {
        let rows = sqlx::query_as::<_, DbPriceRow>(
            r#"
            SELECT ticker, date, open, high, low, close, volume, sector
            FROM daily_prices
            ORDER BY ticker, date
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        tracing::debug!(rows = rows.len(), "fetched daily price table");
        Ok(rows.into_iter().map(PriceRecord::from).collect())
    }
}
