use analytics::{
    CorrelationMatrix, CumulativeSeries, DashboardEngine, DashboardReport, FilteredView,
    MarketSummary, MonthlyMovers, SectorPerformance, TickerReturn, TickerVolatility,
};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use comfy_table::Table;
use core_types::{Dataset, FilterSpec, TopN};
use database::{PriceRepository, PriceStore};
use rust_decimal::Decimal;
use std::net::SocketAddr;
use tracing_subscriber::EnvFilter;

/// The main entry point for the marketdash application.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file, if present.
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Parse command-line arguments and execute the appropriate command.
    let cli = Cli::parse();
    match cli.command {
        Commands::Serve(args) => handle_serve(args).await,
        Commands::Report(args) => handle_report(args).await,
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// A dashboard backend for daily stock prices of an index's constituents.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API the browser dashboard talks to.
    Serve(ServeArgs),
    /// Compute one dashboard from the command line and print its tables.
    Report(ReportArgs),
}

#[derive(Parser)]
struct ServeArgs {
    /// Override the interface configured in config.toml.
    #[arg(long)]
    host: Option<String>,

    /// Override the port configured in config.toml.
    #[arg(long)]
    port: Option<u16>,
}

#[derive(Parser)]
struct ReportArgs {
    /// Years to include (comma-separated). Defaults to every year present.
    #[arg(long, value_delimiter = ',')]
    years: Vec<i32>,

    /// Months to include, as YYYY-MM keys (comma-separated). Defaults to
    /// every month present.
    #[arg(long, value_delimiter = ',')]
    months: Vec<String>,

    /// Sectors to include (comma-separated). Defaults to every sector present.
    #[arg(long, value_delimiter = ',')]
    sectors: Vec<String>,

    /// Start of the inclusive date range (format: YYYY-MM-DD).
    #[arg(long)]
    from: Option<NaiveDate>,

    /// End of the inclusive date range (format: YYYY-MM-DD).
    #[arg(long)]
    to: Option<NaiveDate>,

    /// Ranking size for the top/bottom tables (5 to 15).
    #[arg(long)]
    top_n: Option<usize>,

    /// Designated YYYY-MM month for the monthly movers tables.
    #[arg(long)]
    focus_month: Option<String>,
}

// ==============================================================================
// Serve Command Logic
// ==============================================================================

async fn handle_serve(args: ServeArgs) -> anyhow::Result<()> {
    let config = configuration::load_config()?;
    let host = args.host.unwrap_or(config.server.host.clone());
    let port = args.port.unwrap_or(config.server.port);
    let addr: SocketAddr = format!("{host}:{port}").parse()?;

    web_server::run_server(addr, config.default_top_n()).await
}

// ==============================================================================
// Report Command Logic
// ==============================================================================

/// Loads the dataset, runs the filter engine and the metrics pipeline once,
/// and prints every table. A data-source failure aborts before any filtering.
async fn handle_report(args: ReportArgs) -> anyhow::Result<()> {
    let config = configuration::load_config()?;

    let db_pool = database::connect().await?;
    let store = PriceStore::new(PriceRepository::new(db_pool));
    let dataset = store.get_or_load().await?;
    tracing::info!(rows = dataset.len(), "price dataset loaded");

    if dataset.is_empty() {
        println!("No data available from the data source.");
        return Ok(());
    }

    let top_n = match args.top_n {
        Some(n) => TopN::new(n)?,
        None => config.default_top_n(),
    };
    let spec = build_filter_spec(&dataset, &args);
    let view = FilteredView::build(&dataset, &spec);
    let report = DashboardEngine::new().run(&view, top_n, args.focus_month.as_deref())?;

    render_report(&report, top_n);
    Ok(())
}

/// Maps the CLI flags onto a `FilterSpec`. Omitted flags select everything,
/// matching the dashboard's everything-selected defaults.
fn build_filter_spec(dataset: &Dataset, args: &ReportArgs) -> FilterSpec {
    let defaults = FilterSpec::select_all(dataset);
    FilterSpec {
        years: if args.years.is_empty() {
            defaults.years
        } else {
            args.years.iter().copied().collect()
        },
        months: if args.months.is_empty() {
            defaults.months
        } else {
            args.months.iter().cloned().collect()
        },
        sectors: if args.sectors.is_empty() {
            defaults.sectors
        } else {
            args.sectors.iter().cloned().collect()
        },
        date_range: (
            args.from.unwrap_or(defaults.date_range.0),
            args.to.unwrap_or(defaults.date_range.1),
        ),
    }
}

// ==============================================================================
// Table Rendering
// ==============================================================================

fn render_report(report: &DashboardReport, top_n: TopN) {
    let n = top_n.get();

    println!("\nMarket Summary");
    render_market_summary(&report.market_summary);

    println!("\nTop {n} Gainers");
    render_returns(&report.top_gainers);
    println!("\nTop {n} Losers");
    render_returns(&report.top_losers);

    println!("\nTop {n} Most Volatile Stocks");
    render_volatility(&report.volatility);

    println!("\nCumulative Return (Top {n} Stocks)");
    render_cumulative(&report.cumulative_returns);

    println!("\nAverage Return by Sector");
    render_sectors(&report.sector_performance);

    println!("\nCorrelation of Daily % Change in Closing Prices");
    render_correlation(&report.correlation);

    if let Some(movers) = &report.monthly_movers {
        render_monthly(movers, n);
    }
}

fn fmt_pct(value: f64) -> String {
    format!("{:+.2}%", value * 100.0)
}

fn fmt_decimal(value: Option<Decimal>, places: u32) -> String {
    match value {
        Some(v) => v.round_dp(places).to_string(),
        None => "-".to_string(),
    }
}

fn render_market_summary(summary: &MarketSummary) {
    let mut table = Table::new();
    table.set_header(vec!["Metric", "Value"]);
    table.add_row(vec!["Green Stocks".to_string(), summary.green_count.to_string()]);
    table.add_row(vec!["Red Stocks".to_string(), summary.red_count.to_string()]);
    table.add_row(vec![
        "Average Close Price".to_string(),
        fmt_decimal(summary.avg_close, 2),
    ]);
    table.add_row(vec![
        "Average Volume".to_string(),
        fmt_decimal(summary.avg_volume, 0),
    ]);
    println!("{table}");
}

fn render_returns(rows: &[TickerReturn]) {
    let mut table = Table::new();
    table.set_header(vec!["Ticker", "Return"]);
    for row in rows {
        table.add_row(vec![row.ticker.clone(), fmt_pct(row.period_return)]);
    }
    println!("{table}");
}

fn render_volatility(rows: &[TickerVolatility]) {
    let mut table = Table::new();
    table.set_header(vec!["Ticker", "Std Dev of Daily Return"]);
    for row in rows {
        table.add_row(vec![row.ticker.clone(), format!("{:.4}", row.volatility)]);
    }
    println!("{table}");
}

fn render_cumulative(series: &[CumulativeSeries]) {
    let mut table = Table::new();
    table.set_header(vec!["Ticker", "Sessions", "Final Cumulative Return"]);
    for s in series {
        let last = s
            .points
            .last()
            .map(|p| fmt_pct(p.cumulative_return))
            .unwrap_or_else(|| "-".to_string());
        table.add_row(vec![s.ticker.clone(), s.points.len().to_string(), last]);
    }
    println!("{table}");
}

fn render_sectors(rows: &[SectorPerformance]) {
    let mut table = Table::new();
    table.set_header(vec!["Sector", "Avg Return"]);
    for row in rows {
        table.add_row(vec![row.sector.clone(), fmt_pct(row.avg_return)]);
    }
    println!("{table}");
}

fn render_correlation(matrix: &CorrelationMatrix) {
    if matrix.is_empty() {
        println!("Not enough overlapping data to correlate.");
        return;
    }
    let mut table = Table::new();
    let mut header = vec![String::new()];
    header.extend(matrix.tickers.iter().cloned());
    table.set_header(header);
    for (i, ticker) in matrix.tickers.iter().enumerate() {
        let mut row = vec![ticker.clone()];
        row.extend(matrix.values[i].iter().map(|v| format!("{v:.2}")));
        table.add_row(row);
    }
    println!("{table}");
}

fn render_monthly(movers: &MonthlyMovers, n: usize) {
    println!("\nTop {} Gainers - {}", n, movers.month);
    render_returns(&movers.gainers);
    println!("\nTop {} Losers - {}", n, movers.month);
    render_returns(&movers.losers);
}
