//! End-to-end pipeline tests: dataset -> filter engine -> metrics pipeline.

use analytics::{DashboardEngine, FilteredView};
use chrono::NaiveDate;
use core_types::{Dataset, FilterSpec, PriceRecord, TopN};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn record(
    ticker: &str,
    date: NaiveDate,
    close: Decimal,
    volume: i64,
    sector: &str,
) -> PriceRecord {
    PriceRecord {
        ticker: ticker.to_string(),
        date,
        open: close,
        high: close,
        low: close,
        close,
        volume,
        sector: sector.to_string(),
    }
}

/// Two sectors, four tickers, two months of sparse daily data.
fn sample_dataset() -> Dataset {
    Dataset::new(vec![
        record("HDFC", date(2023, 7, 3), dec!(1600), 900, "Banking"),
        record("HDFC", date(2023, 7, 4), dec!(1640), 950, "Banking"),
        record("HDFC", date(2023, 8, 1), dec!(1700), 800, "Banking"),
        record("ICICI", date(2023, 7, 3), dec!(950), 1_200, "Banking"),
        record("ICICI", date(2023, 7, 4), dec!(940), 1_100, "Banking"),
        record("ICICI", date(2023, 8, 1), dec!(970), 1_000, "Banking"),
        record("INFY", date(2023, 7, 3), dec!(1450), 2_000, "IT"),
        record("INFY", date(2023, 7, 4), dec!(1430), 2_100, "IT"),
        record("INFY", date(2023, 8, 1), dec!(1400), 2_050, "IT"),
        record("TCS", date(2023, 7, 3), dec!(3300), 500, "IT"),
        record("TCS", date(2023, 7, 4), dec!(3350), 520, "IT"),
        record("TCS", date(2023, 8, 1), dec!(3400), 510, "IT"),
    ])
}

#[test]
fn full_pipeline_over_select_all() {
    let ds = sample_dataset();
    let spec = FilterSpec::select_all(&ds);
    let view = FilteredView::build(&ds, &spec);
    let report = DashboardEngine::new()
        .run(&view, TopN::default(), Some("2023-07"))
        .unwrap();

    // HDFC, ICICI and TCS gained over the window, INFY lost.
    assert_eq!(report.market_summary.green_count, 3);
    assert_eq!(report.market_summary.red_count, 1);

    // Only four tickers, so both rankings hold everything.
    assert_eq!(report.top_gainers.len(), 4);
    assert_eq!(report.top_gainers[0].ticker, "HDFC");
    assert_eq!(report.top_losers[0].ticker, "INFY");

    // Cumulative series exist exactly for the gainer ranking.
    let cumulative_tickers: Vec<&str> = report
        .cumulative_returns
        .iter()
        .map(|s| s.ticker.as_str())
        .collect();
    let gainer_tickers: Vec<&str> = report
        .top_gainers
        .iter()
        .map(|r| r.ticker.as_str())
        .collect();
    assert_eq!(cumulative_tickers, gainer_tickers);

    // Banking outperformed IT on average.
    assert_eq!(report.sector_performance[0].sector, "Banking");
    assert_eq!(report.sector_performance[1].sector, "IT");
    assert!(report.sector_performance[0].avg_return > report.sector_performance[1].avg_return);

    // All four tickers share the same trading dates, so the matrix is full.
    assert_eq!(report.correlation.tickers.len(), 4);
    for i in 0..4 {
        assert!((report.correlation.get(i, i).unwrap() - 1.0).abs() < 1e-12);
    }

    let movers = report.monthly_movers.unwrap();
    assert_eq!(movers.month, "2023-07");
    // Within July only: HDFC gained the most, INFY lost the most.
    assert_eq!(movers.gainers[0].ticker, "HDFC");
    assert_eq!(movers.losers[0].ticker, "INFY");
}

#[test]
fn month_filter_narrows_every_metric() {
    let ds = sample_dataset();
    let mut spec = FilterSpec::select_all(&ds);
    spec.months.remove("2023-08");
    let view = FilteredView::build(&ds, &spec);
    let report = DashboardEngine::new()
        .run(&view, TopN::default(), None)
        .unwrap();

    assert_eq!(view.len(), 8);
    // July alone: HDFC and TCS up, ICICI and INFY down.
    assert_eq!(report.market_summary.green_count, 2);
    assert_eq!(report.market_summary.red_count, 2);
    assert!(report.monthly_movers.is_none());

    // One daily return per ticker is not enough for a sample std dev.
    assert!(report.volatility.is_empty());
}

#[test]
fn empty_selection_yields_neutral_report() {
    let ds = sample_dataset();
    let mut spec = FilterSpec::select_all(&ds);
    spec.years.clear();
    let view = FilteredView::build(&ds, &spec);

    assert!(view.is_empty());
    let report = DashboardEngine::new()
        .run(&view, TopN::default(), Some("2023-07"))
        .unwrap();
    assert_eq!(report.market_summary.green_count, 0);
    assert!(report.top_gainers.is_empty());
    assert!(report.correlation.is_empty());
    let movers = report.monthly_movers.unwrap();
    assert!(movers.gainers.is_empty() && movers.losers.is_empty());
}
