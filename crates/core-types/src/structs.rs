use crate::error::CoreError;
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One daily price row for one equity. The natural key is `(ticker, date)`;
/// the dataset never contains two rows with the same key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRecord {
    pub ticker: String,
    pub date: NaiveDate,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: i64,
    pub sector: String,
}

/// Formats a date as its `"YYYY-MM"` month key, the grouping unit for the
/// month filter and the monthly movers table.
pub fn month_key(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

/// The full record set loaded from the data source, immutable for the rest of
/// the session. Rows are held sorted by `(ticker, date)` so per-ticker series
/// are contiguous and date-ascending.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    records: Vec<PriceRecord>,
}

impl Dataset {
    pub fn new(mut records: Vec<PriceRecord>) -> Self {
        records.sort_by(|a, b| a.ticker.cmp(&b.ticker).then(a.date.cmp(&b.date)));
        Self { records }
    }

    pub fn records(&self) -> &[PriceRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct calendar years present in the dataset, ascending.
    pub fn years(&self) -> Vec<i32> {
        let years: BTreeSet<i32> = self.records.iter().map(|r| r.date.year()).collect();
        years.into_iter().collect()
    }

    /// Distinct `"YYYY-MM"` month keys present in the dataset, ascending.
    pub fn months(&self) -> Vec<String> {
        let months: BTreeSet<String> = self.records.iter().map(|r| month_key(r.date)).collect();
        months.into_iter().collect()
    }

    /// Distinct sector names present in the dataset, ascending.
    pub fn sectors(&self) -> Vec<String> {
        let sectors: BTreeSet<String> =
            self.records.iter().map(|r| r.sector.clone()).collect();
        sectors.into_iter().collect()
    }

    /// Earliest and latest trading date in the dataset, or `None` when empty.
    pub fn date_bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        let min = self.records.iter().map(|r| r.date).min()?;
        let max = self.records.iter().map(|r| r.date).max()?;
        Some((min, max))
    }
}

/// The conjunction of user-selected predicates. A record passes only if it
/// matches every one of them, so an empty selection set passes nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterSpec {
    pub years: BTreeSet<i32>,
    pub months: BTreeSet<String>,
    pub sectors: BTreeSet<String>,
    /// Inclusive on both endpoints.
    pub date_range: (NaiveDate, NaiveDate),
}

impl FilterSpec {
    /// The "everything selected" spec for a dataset: every year, month and
    /// sector it contains, over its full date range.
    pub fn select_all(dataset: &Dataset) -> Self {
        let (start, end) = dataset
            .date_bounds()
            .unwrap_or((NaiveDate::MIN, NaiveDate::MAX));
        Self {
            years: dataset.years().into_iter().collect(),
            months: dataset.months().into_iter().collect(),
            sectors: dataset.sectors().into_iter().collect(),
            date_range: (start, end),
        }
    }

    pub fn matches(&self, record: &PriceRecord) -> bool {
        let (start, end) = self.date_range;
        self.years.contains(&record.date.year())
            && self.months.contains(&month_key(record.date))
            && self.sectors.contains(&record.sector)
            && record.date >= start
            && record.date <= end
    }
}

/// The "top N" cardinality chosen by the user, limited to the slider's range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub struct TopN(usize);

impl TopN {
    pub const MIN: usize = 5;
    pub const MAX: usize = 15;

    pub fn new(n: usize) -> Result<Self, CoreError> {
        if (Self::MIN..=Self::MAX).contains(&n) {
            Ok(Self(n))
        } else {
            Err(CoreError::InvalidInput(
                "top_n".to_string(),
                format!("{} is outside [{}, {}]", n, Self::MIN, Self::MAX),
            ))
        }
    }

    pub fn get(self) -> usize {
        self.0
    }
}

impl Default for TopN {
    fn default() -> Self {
        Self(10)
    }
}

impl TryFrom<usize> for TopN {
    type Error = CoreError;

    fn try_from(n: usize) -> Result<Self, Self::Error> {
        Self::new(n)
    }
}

impl From<TopN> for usize {
    fn from(n: TopN) -> usize {
        n.get()
    }
}
