use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Green/Red counts and whole-view averages.
///
/// The averages are exact `Decimal` means over every filtered row; rounding
/// is left to the presentation edge. Both are `None` for an empty view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSummary {
    pub green_count: usize,
    pub red_count: usize,
    pub avg_close: Option<Decimal>,
    pub avg_volume: Option<Decimal>,
}

impl MarketSummary {
    /// Creates a new, zeroed-out MarketSummary.
    pub fn new() -> Self {
        Self {
            green_count: 0,
            red_count: 0,
            avg_close: None,
            avg_volume: None,
        }
    }
}

impl Default for MarketSummary {
    fn default() -> Self {
        Self::new()
    }
}

/// One ticker's simple return over a period: `last_close / first_close - 1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerReturn {
    pub ticker: String,
    pub period_return: f64,
}

/// One ticker's sample standard deviation of daily returns.
///
/// Tickers without at least two defined daily returns never appear here;
/// their volatility is undefined, not zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerVolatility {
    pub ticker: String,
    pub volatility: f64,
}

/// One point of a ticker's cumulative return series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CumulativePoint {
    pub date: NaiveDate,
    pub cumulative_return: f64,
}

/// A ticker's running additive sum of daily returns, ordered by date.
///
/// Dates whose daily return is undefined (each ticker's first row) contribute
/// no point. Additive, not compounding: the last point only approximates
/// `last_close / first_close - 1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CumulativeSeries {
    pub ticker: String,
    pub points: Vec<CumulativePoint>,
}

/// Mean per-ticker period return for one sector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorPerformance {
    pub sector: String,
    pub avg_return: f64,
}

/// Pairwise Pearson correlation of day-over-day close changes.
///
/// `values` is square with `tickers.len()` rows; `values[i][j]` correlates
/// `tickers[i]` with `tickers[j]`. Empty when fewer than two tickers or
/// fewer than two complete percent-change rows survive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    pub tickers: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    pub fn empty() -> Self {
        Self {
            tickers: Vec::new(),
            values: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tickers.is_empty()
    }

    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        self.values.get(i)?.get(j).copied()
    }
}

/// Top and bottom movers within one designated month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyMovers {
    /// The `"YYYY-MM"` month the table was computed for.
    pub month: String,
    pub gainers: Vec<TickerReturn>,
    pub losers: Vec<TickerReturn>,
}

/// The full set of derived tables for one dashboard render.
///
/// This struct is the final output of the `DashboardEngine` and the data
/// transfer object handed to the presentation layer. It is recomputed on
/// every filter change and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardReport {
    pub market_summary: MarketSummary,
    /// Highest period returns, descending, at most `top_n` entries.
    pub top_gainers: Vec<TickerReturn>,
    /// Lowest period returns, worst first, at most `top_n` entries.
    pub top_losers: Vec<TickerReturn>,
    /// Most volatile tickers, descending, at most `top_n` entries.
    pub volatility: Vec<TickerVolatility>,
    /// One series per top gainer.
    pub cumulative_returns: Vec<CumulativeSeries>,
    /// Mean return per sector, descending.
    pub sector_performance: Vec<SectorPerformance>,
    pub correlation: CorrelationMatrix,
    /// Present only when the caller designated a month.
    pub monthly_movers: Option<MonthlyMovers>,
}
