use crate::error::AnalyticsError;
use crate::report::{
    CorrelationMatrix, CumulativePoint, CumulativeSeries, DashboardReport, MarketSummary,
    MonthlyMovers, SectorPerformance, TickerReturn, TickerVolatility,
};
use crate::view::{FilteredView, ViewRow};
use core_types::{Trend, TopN};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// A stateless calculator for deriving the dashboard tables from a filtered view.
#[derive(Debug, Default, Clone)]
pub struct DashboardEngine {}

impl DashboardEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// The main entry point for computing the dashboard tables.
    ///
    /// # Arguments
    ///
    /// * `view` - The filtered view produced by the filter engine.
    /// * `top_n` - The ranking cardinality selected by the user.
    /// * `focus_month` - The designated `"YYYY-MM"` month for the monthly
    ///   movers table, or `None` to omit that table.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `DashboardReport` or an `AnalyticsError`.
    /// A sparse or empty view produces empty tables, never an error.
    pub fn run(
        &self,
        view: &FilteredView,
        top_n: TopN,
        focus_month: Option<&str>,
    ) -> Result<DashboardReport, AnalyticsError> {
        let n = top_n.get();
        tracing::debug!(
            rows = view.len(),
            tickers = view.tickers().len(),
            top_n = n,
            "computing dashboard report"
        );

        let market_summary = self.market_summary(view);
        let ranked = self.period_returns(view)?;

        let top_gainers: Vec<TickerReturn> = ranked.iter().take(n).cloned().collect();
        let top_losers: Vec<TickerReturn> = ranked.iter().rev().take(n).cloned().collect();

        let volatility = self.volatility_ranking(view, n);
        let cumulative_returns = self.cumulative_returns(view, &top_gainers);
        let sector_performance = self.sector_performance(view)?;
        let correlation = self.correlation_matrix(view);
        let monthly_movers = match focus_month {
            Some(month) => Some(self.monthly_movers(view, month, n)?),
            None => None,
        };

        Ok(DashboardReport {
            market_summary,
            top_gainers,
            top_losers,
            volatility,
            cumulative_returns,
            sector_performance,
            correlation,
            monthly_movers,
        })
    }

    /// Counts Green/Red tickers and averages close and volume over all rows.
    fn market_summary(&self, view: &FilteredView) -> MarketSummary {
        let mut summary = MarketSummary::new();

        for series in view.ticker_series() {
            let first = series[0].record.close;
            let last = series[series.len() - 1].record.close;
            match Trend::of_period(first, last) {
                Trend::Green => summary.green_count += 1,
                Trend::Red => summary.red_count += 1,
            }
        }

        if !view.is_empty() {
            let count = Decimal::from(view.len());
            let close_sum: Decimal = view.rows().iter().map(|r| r.record.close).sum();
            let volume_sum: Decimal = view
                .rows()
                .iter()
                .map(|r| Decimal::from(r.record.volume))
                .sum();
            summary.avg_close = Some(close_sum / count);
            summary.avg_volume = Some(volume_sum / count);
        }

        summary
    }

    /// Per-ticker `last_close / first_close - 1` over the view, descending.
    ///
    /// Ties keep ascending ticker order: the series iterator yields tickers
    /// ascending and the sort is stable.
    fn period_returns(&self, view: &FilteredView) -> Result<Vec<TickerReturn>, AnalyticsError> {
        let mut returns = Vec::new();
        for series in view.ticker_series() {
            if let Some(period_return) = period_return_of(series)? {
                returns.push(TickerReturn {
                    ticker: series[0].record.ticker.clone(),
                    period_return,
                });
            }
        }
        returns.sort_by(|a, b| {
            b.period_return
                .partial_cmp(&a.period_return)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Ok(returns)
    }

    /// Sample standard deviation of daily returns per ticker, descending,
    /// truncated to `n`. Tickers with fewer than two defined returns are
    /// excluded rather than reported as zero.
    fn volatility_ranking(&self, view: &FilteredView, n: usize) -> Vec<TickerVolatility> {
        let mut ranking: Vec<TickerVolatility> = view
            .ticker_series()
            .filter_map(|series| {
                let returns: Vec<f64> =
                    series.iter().filter_map(|row| row.daily_return).collect();
                let volatility = sample_std_dev(&returns)?;
                Some(TickerVolatility {
                    ticker: series[0].record.ticker.clone(),
                    volatility,
                })
            })
            .collect();
        ranking.sort_by(|a, b| {
            b.volatility
                .partial_cmp(&a.volatility)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        ranking.truncate(n);
        ranking
    }

    /// Running additive sum of daily returns for each top gainer, in ranking
    /// order. Rows with an undefined daily return emit no point.
    fn cumulative_returns(
        &self,
        view: &FilteredView,
        top_gainers: &[TickerReturn],
    ) -> Vec<CumulativeSeries> {
        let by_ticker: BTreeMap<&str, &[ViewRow]> = view
            .ticker_series()
            .map(|series| (series[0].record.ticker.as_str(), series))
            .collect();

        top_gainers
            .iter()
            .filter_map(|gainer| {
                let series = by_ticker.get(gainer.ticker.as_str())?;
                let mut running = 0.0;
                let mut points = Vec::new();
                for row in *series {
                    if let Some(daily) = row.daily_return {
                        running += daily;
                        points.push(CumulativePoint {
                            date: row.record.date,
                            cumulative_return: running,
                        });
                    }
                }
                Some(CumulativeSeries {
                    ticker: gainer.ticker.clone(),
                    points,
                })
            })
            .collect()
    }

    /// Mean per-ticker period return by sector, descending.
    ///
    /// Each ticker joins to the first sector seen in its series; sectors are
    /// static per ticker in practice.
    fn sector_performance(
        &self,
        view: &FilteredView,
    ) -> Result<Vec<SectorPerformance>, AnalyticsError> {
        let mut by_sector: BTreeMap<String, Vec<f64>> = BTreeMap::new();
        for series in view.ticker_series() {
            if let Some(period_return) = period_return_of(series)? {
                by_sector
                    .entry(series[0].record.sector.clone())
                    .or_default()
                    .push(period_return);
            }
        }

        let mut performance: Vec<SectorPerformance> = by_sector
            .into_iter()
            .map(|(sector, returns)| SectorPerformance {
                sector,
                avg_return: returns.iter().sum::<f64>() / returns.len() as f64,
            })
            .collect();
        performance.sort_by(|a, b| {
            b.avg_return
                .partial_cmp(&a.avg_return)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Ok(performance)
    }

    /// Pearson correlation of day-over-day close changes between tickers.
    ///
    /// The view is pivoted to a date-by-ticker grid of closes; a date
    /// contributes only if every ticker has a close on it and on the grid
    /// date immediately before it. Fewer than two tickers or fewer than two
    /// surviving dates yield an empty matrix.
    fn correlation_matrix(&self, view: &FilteredView) -> CorrelationMatrix {
        let tickers = view.tickers();
        if tickers.len() < 2 {
            return CorrelationMatrix::empty();
        }

        let ticker_index: BTreeMap<&str, usize> = tickers
            .iter()
            .enumerate()
            .map(|(i, t)| (t.as_str(), i))
            .collect();
        let dates: Vec<chrono::NaiveDate> = {
            let set: std::collections::BTreeSet<chrono::NaiveDate> =
                view.rows().iter().map(|r| r.record.date).collect();
            set.into_iter().collect()
        };
        let date_index: BTreeMap<chrono::NaiveDate, usize> =
            dates.iter().enumerate().map(|(i, d)| (*d, i)).collect();

        let mut grid: Vec<Vec<Option<f64>>> = vec![vec![None; dates.len()]; tickers.len()];
        for row in view.rows() {
            let t = ticker_index[row.record.ticker.as_str()];
            let d = date_index[&row.record.date];
            grid[t][d] = row.record.close.to_f64();
        }

        // Percent-change columns, keeping only dates complete across tickers.
        let mut pct_cols: Vec<Vec<f64>> = vec![Vec::new(); tickers.len()];
        for d in 1..dates.len() {
            let mut changes = Vec::with_capacity(tickers.len());
            for column in &grid {
                match (column[d - 1], column[d]) {
                    (Some(prev), Some(curr)) if prev != 0.0 => {
                        changes.push(curr / prev - 1.0);
                    }
                    _ => break,
                }
            }
            if changes.len() == tickers.len() {
                for (t, change) in changes.into_iter().enumerate() {
                    pct_cols[t].push(change);
                }
            }
        }

        if pct_cols[0].len() < 2 {
            return CorrelationMatrix::empty();
        }

        let k = tickers.len();
        let mut values = vec![vec![0.0; k]; k];
        for i in 0..k {
            values[i][i] = 1.0;
            for j in (i + 1)..k {
                let r = pearson(&pct_cols[i], &pct_cols[j]);
                values[i][j] = r;
                values[j][i] = r;
            }
        }

        CorrelationMatrix { tickers, values }
    }

    /// Top and bottom movers within the designated month only.
    fn monthly_movers(
        &self,
        view: &FilteredView,
        month: &str,
        n: usize,
    ) -> Result<MonthlyMovers, AnalyticsError> {
        let mut returns = Vec::new();
        for series in view.ticker_series() {
            let in_month: Vec<ViewRow> = series
                .iter()
                .filter(|row| row.month == month)
                .cloned()
                .collect();
            if let Some(period_return) = period_return_of(&in_month)? {
                returns.push(TickerReturn {
                    ticker: in_month[0].record.ticker.clone(),
                    period_return,
                });
            }
        }

        let mut gainers = returns.clone();
        gainers.sort_by(|a, b| {
            b.period_return
                .partial_cmp(&a.period_return)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        gainers.truncate(n);

        let mut losers = returns;
        losers.sort_by(|a, b| {
            a.period_return
                .partial_cmp(&b.period_return)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        losers.truncate(n);

        Ok(MonthlyMovers {
            month: month.to_string(),
            gainers,
            losers,
        })
    }
}

/// `last_close / first_close - 1` over a date-ascending run of rows.
///
/// `None` when the run is empty or its first close is zero.
fn period_return_of(rows: &[ViewRow]) -> Result<Option<f64>, AnalyticsError> {
    let (Some(first), Some(last)) = (rows.first(), rows.last()) else {
        return Ok(None);
    };
    if first.record.close.is_zero() {
        return Ok(None);
    }
    let ratio = (last.record.close - first.record.close) / first.record.close;
    ratio
        .to_f64()
        .map(Some)
        .ok_or_else(|| {
            AnalyticsError::InternalError(format!(
                "period return for {} does not fit in f64",
                first.record.ticker
            ))
        })
}

/// Sample standard deviation (n - 1 denominator). `None` below two samples.
fn sample_std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    Some(variance.sqrt())
}

/// Pearson correlation coefficient. Zero-variance inputs yield 0.0.
fn pearson(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len() as f64;
    let x_mean = x.iter().sum::<f64>() / n;
    let y_mean = y.iter().sum::<f64>() / n;

    let covariance: f64 = x
        .iter()
        .zip(y.iter())
        .map(|(a, b)| (a - x_mean) * (b - y_mean))
        .sum::<f64>()
        / n;
    let x_var = x.iter().map(|a| (a - x_mean).powi(2)).sum::<f64>() / n;
    let y_var = y.iter().map(|b| (b - y_mean).powi(2)).sum::<f64>() / n;

    let denom = (x_var * y_var).sqrt();
    if denom > 0.0 {
        covariance / denom
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::{Dataset, FilterSpec, PriceRecord};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 7, d).unwrap()
    }

    fn record(ticker: &str, date: NaiveDate, close: Decimal, sector: &str) -> PriceRecord {
        PriceRecord {
            ticker: ticker.to_string(),
            date,
            open: close,
            high: close,
            low: close,
            close,
            volume: 1_000,
            sector: sector.to_string(),
        }
    }

    /// Two tickers, three consecutive days: A = [10, 11, 9], B = [20, 19, 21].
    fn scenario_view() -> FilteredView {
        let ds = Dataset::new(vec![
            record("AAA", date(3), dec!(10), "IT"),
            record("AAA", date(4), dec!(11), "IT"),
            record("AAA", date(5), dec!(9), "IT"),
            record("BBB", date(3), dec!(20), "Banking"),
            record("BBB", date(4), dec!(19), "Banking"),
            record("BBB", date(5), dec!(21), "Banking"),
        ]);
        FilteredView::build(&ds, &FilterSpec::select_all(&ds))
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_market_summary_counts_and_averages() {
        let engine = DashboardEngine::new();
        let summary = engine.market_summary(&scenario_view());

        // A ended 9 < 10 (Red), B ended 21 > 20 (Green).
        assert_eq!(summary.green_count, 1);
        assert_eq!(summary.red_count, 1);
        assert_eq!(summary.avg_close, Some(dec!(90) / dec!(6)));
        assert_eq!(summary.avg_volume, Some(dec!(1000)));
    }

    #[test]
    fn test_market_summary_empty_view() {
        let ds = Dataset::new(Vec::new());
        let view = FilteredView::build(&ds, &FilterSpec::select_all(&ds));
        let summary = DashboardEngine::new().market_summary(&view);
        assert_eq!(summary.green_count, 0);
        assert_eq!(summary.red_count, 0);
        assert_eq!(summary.avg_close, None);
        assert_eq!(summary.avg_volume, None);
    }

    #[test]
    fn test_period_returns_rank_gainer_first() {
        let engine = DashboardEngine::new();
        let ranked = engine.period_returns(&scenario_view()).unwrap();

        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].ticker, "BBB");
        assert!(close(ranked[0].period_return, 0.05));
        assert_eq!(ranked[1].ticker, "AAA");
        assert!(close(ranked[1].period_return, -0.10));
    }

    #[test]
    fn test_equal_returns_tie_break_by_ticker() {
        let ds = Dataset::new(vec![
            record("ZZZ", date(3), dec!(10), "IT"),
            record("ZZZ", date(4), dec!(11), "IT"),
            record("MMM", date(3), dec!(20), "IT"),
            record("MMM", date(4), dec!(22), "IT"),
        ]);
        let view = FilteredView::build(&ds, &FilterSpec::select_all(&ds));
        let ranked = DashboardEngine::new().period_returns(&view).unwrap();
        assert!(close(ranked[0].period_return, ranked[1].period_return));
        assert_eq!(ranked[0].ticker, "MMM");
        assert_eq!(ranked[1].ticker, "ZZZ");
    }

    #[test]
    fn test_volatility_excludes_single_return_tickers() {
        let ds = Dataset::new(vec![
            record("AAA", date(3), dec!(10), "IT"),
            record("AAA", date(4), dec!(11), "IT"),
            record("AAA", date(5), dec!(9), "IT"),
            // One row only: no daily return at all.
            record("ONE", date(3), dec!(50), "IT"),
            // Two rows: a single daily return, sample std dev undefined.
            record("TWO", date(3), dec!(30), "IT"),
            record("TWO", date(4), dec!(33), "IT"),
        ]);
        let view = FilteredView::build(&ds, &FilterSpec::select_all(&ds));

        let ranking = DashboardEngine::new().volatility_ranking(&view, 10);
        let tickers: Vec<&str> = ranking.iter().map(|v| v.ticker.as_str()).collect();
        assert_eq!(tickers, vec!["AAA"]);
    }

    #[test]
    fn test_volatility_value_is_sample_std_dev() {
        let view = scenario_view();
        let ranking = DashboardEngine::new().volatility_ranking(&view, 10);
        let aaa = ranking.iter().find(|v| v.ticker == "AAA").unwrap();

        let r1 = 0.1_f64;
        let r2 = 9.0 / 11.0 - 1.0;
        let mean = (r1 + r2) / 2.0;
        let expected = (((r1 - mean).powi(2) + (r2 - mean).powi(2)) / 1.0).sqrt();
        assert!(close(aaa.volatility, expected));
    }

    #[test]
    fn test_cumulative_returns_are_additive() {
        let engine = DashboardEngine::new();
        let view = scenario_view();
        let ranked = engine.period_returns(&view).unwrap();
        let series = engine.cumulative_returns(&view, &ranked);

        let aaa = series.iter().find(|s| s.ticker == "AAA").unwrap();
        // Two defined returns, so two points; the first (undefined) day emits none.
        assert_eq!(aaa.points.len(), 2);
        assert!(close(aaa.points[0].cumulative_return, 0.1));

        let additive = 0.1 + (9.0 / 11.0 - 1.0);
        let compounded = 9.0 / 10.0 - 1.0;
        assert!(close(aaa.points[1].cumulative_return, additive));
        // The running sum is additive; it only approximates the compounded
        // period return.
        assert!(!close(additive, compounded));
    }

    #[test]
    fn test_cumulative_restricted_to_top_gainers() {
        let engine = DashboardEngine::new();
        let view = scenario_view();
        let top = vec![TickerReturn {
            ticker: "BBB".to_string(),
            period_return: 0.05,
        }];
        let series = engine.cumulative_returns(&view, &top);
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].ticker, "BBB");
    }

    #[test]
    fn test_sector_performance_joins_and_sorts() {
        let performance = DashboardEngine::new()
            .sector_performance(&scenario_view())
            .unwrap();
        assert_eq!(performance.len(), 2);
        assert_eq!(performance[0].sector, "Banking");
        assert!(close(performance[0].avg_return, 0.05));
        assert_eq!(performance[1].sector, "IT");
        assert!(close(performance[1].avg_return, -0.10));
    }

    #[test]
    fn test_correlation_matrix_two_tickers() {
        let matrix = DashboardEngine::new().correlation_matrix(&scenario_view());

        assert_eq!(matrix.tickers, vec!["AAA".to_string(), "BBB".to_string()]);
        assert!(close(matrix.get(0, 0).unwrap(), 1.0));
        assert!(close(matrix.get(1, 1).unwrap(), 1.0));
        // Two surviving percent-change pairs moving in opposite directions
        // correlate exactly -1.
        assert!(close(matrix.get(0, 1).unwrap(), -1.0));
        assert_eq!(matrix.get(0, 1), matrix.get(1, 0));
    }

    #[test]
    fn test_correlation_needs_two_tickers() {
        let ds = Dataset::new(vec![
            record("AAA", date(3), dec!(10), "IT"),
            record("AAA", date(4), dec!(11), "IT"),
            record("AAA", date(5), dec!(9), "IT"),
        ]);
        let view = FilteredView::build(&ds, &FilterSpec::select_all(&ds));
        assert!(DashboardEngine::new().correlation_matrix(&view).is_empty());
    }

    #[test]
    fn test_correlation_drops_incomplete_dates() {
        // BBB is missing 2023-07-04, so both change rows touching that date
        // drop and only one complete pair remains -> empty matrix.
        let ds = Dataset::new(vec![
            record("AAA", date(3), dec!(10), "IT"),
            record("AAA", date(4), dec!(11), "IT"),
            record("AAA", date(5), dec!(9), "IT"),
            record("BBB", date(3), dec!(20), "Banking"),
            record("BBB", date(5), dec!(21), "Banking"),
        ]);
        let view = FilteredView::build(&ds, &FilterSpec::select_all(&ds));
        assert!(DashboardEngine::new().correlation_matrix(&view).is_empty());
    }

    #[test]
    fn test_monthly_movers_designated_month_only() {
        let ds = Dataset::new(vec![
            record("AAA", date(3), dec!(10), "IT"),
            record("AAA", date(4), dec!(12), "IT"),
            record("AAA", NaiveDate::from_ymd_opt(2023, 8, 1).unwrap(), dec!(100), "IT"),
            record("BBB", date(3), dec!(20), "Banking"),
            record("BBB", date(4), dec!(19), "Banking"),
        ]);
        let view = FilteredView::build(&ds, &FilterSpec::select_all(&ds));
        let movers = DashboardEngine::new()
            .monthly_movers(&view, "2023-07", 10)
            .unwrap();

        assert_eq!(movers.month, "2023-07");
        // AAA's August spike is outside the designated month.
        assert_eq!(movers.gainers[0].ticker, "AAA");
        assert!(close(movers.gainers[0].period_return, 0.2));
        assert_eq!(movers.losers[0].ticker, "BBB");
        assert!(close(movers.losers[0].period_return, -0.05));
    }

    #[test]
    fn test_monthly_movers_absent_month_is_empty() {
        let movers = DashboardEngine::new()
            .monthly_movers(&scenario_view(), "2024-01", 10)
            .unwrap();
        assert!(movers.gainers.is_empty());
        assert!(movers.losers.is_empty());
    }

    #[test]
    fn test_run_assembles_full_report() {
        let report = DashboardEngine::new()
            .run(&scenario_view(), TopN::default(), Some("2023-07"))
            .unwrap();

        assert_eq!(report.top_gainers[0].ticker, "BBB");
        assert_eq!(report.top_losers[0].ticker, "AAA");
        assert_eq!(report.cumulative_returns.len(), 2);
        assert!(!report.correlation.is_empty());
        assert!(report.monthly_movers.is_some());
    }

    #[test]
    fn test_run_on_empty_view_is_all_neutral() {
        let ds = Dataset::new(Vec::new());
        let view = FilteredView::build(&ds, &FilterSpec::select_all(&ds));
        let report = DashboardEngine::new()
            .run(&view, TopN::default(), None)
            .unwrap();

        assert_eq!(report.market_summary, MarketSummary::new());
        assert!(report.top_gainers.is_empty());
        assert!(report.top_losers.is_empty());
        assert!(report.volatility.is_empty());
        assert!(report.cumulative_returns.is_empty());
        assert!(report.sector_performance.is_empty());
        assert!(report.correlation.is_empty());
        assert!(report.monthly_movers.is_none());
    }
}
