use chrono::Datelike;
use core_types::{month_key, Dataset, FilterSpec, PriceRecord};
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

/// One row of the filtered view: a surviving record plus its derived columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewRow {
    pub record: PriceRecord,
    pub year: i32,
    /// `"YYYY-MM"` month key of the record's date.
    pub month: String,
    /// Simple percent change from the same ticker's previous close within the
    /// view. `None` for each ticker's first row; downstream metrics must never
    /// substitute zero for it.
    pub daily_return: Option<f64>,
}

/// The subset of the dataset passing every active filter, with the derived
/// calendar and return columns attached.
///
/// Rows keep the dataset's `(ticker, date)` ordering, so each ticker's series
/// is a contiguous, date-ascending run. Building a view never mutates the
/// dataset; the same `FilterSpec` applied twice yields the same view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilteredView {
    rows: Vec<ViewRow>,
}

impl FilteredView {
    /// Applies the filter conjunction and derives `year`, `month` and
    /// `daily_return` for every surviving row.
    pub fn build(dataset: &Dataset, spec: &FilterSpec) -> Self {
        let mut rows: Vec<ViewRow> = dataset
            .records()
            .iter()
            .filter(|r| spec.matches(r))
            .map(|record| ViewRow {
                year: record.date.year(),
                month: month_key(record.date),
                daily_return: None,
                record: record.clone(),
            })
            .collect();

        for i in 1..rows.len() {
            if rows[i].record.ticker != rows[i - 1].record.ticker {
                continue;
            }
            let prev = rows[i - 1].record.close;
            let curr = rows[i].record.close;
            if prev.is_zero() {
                continue;
            }
            rows[i].daily_return = ((curr - prev) / prev).to_f64();
        }

        Self { rows }
    }

    pub fn rows(&self) -> &[ViewRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterates the view one ticker at a time. Each slice is non-empty and
    /// date-ascending; slices arrive in ascending ticker order.
    pub fn ticker_series(&self) -> impl Iterator<Item = &[ViewRow]> {
        self.rows
            .chunk_by(|a, b| a.record.ticker == b.record.ticker)
    }

    /// Distinct tickers present in the view, ascending.
    pub fn tickers(&self) -> Vec<String> {
        self.ticker_series()
            .map(|series| series[0].record.ticker.clone())
            .collect()
    }
}
