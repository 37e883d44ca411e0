use crate::{error::AppError, AppState};
use analytics::{DashboardReport, FilteredView};
use axum::{extract::State, Json};
use chrono::NaiveDate;
use core_types::{Dataset, FilterSpec, TopN};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

/// The selections available to the dashboard's filter controls, derived from
/// the cached dataset.
#[derive(Debug, Clone, Serialize)]
pub struct FilterOptions {
    pub years: Vec<i32>,
    pub months: Vec<String>,
    pub sectors: Vec<String>,
    pub min_date: Option<NaiveDate>,
    pub max_date: Option<NaiveDate>,
    pub top_n_min: usize,
    pub top_n_max: usize,
}

/// One dashboard computation request.
///
/// An omitted list selects everything, matching the dashboard's
/// everything-selected defaults. A present-but-empty list is an empty
/// selection set and passes no records.
#[derive(Debug, Clone, Deserialize)]
pub struct DashboardRequest {
    pub years: Option<Vec<i32>>,
    pub months: Option<Vec<String>>,
    pub sectors: Option<Vec<String>>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub top_n: Option<usize>,
    /// The designated month for the monthly movers table.
    pub focus_month: Option<String>,
}

fn build_filter_spec(dataset: &Dataset, request: &DashboardRequest) -> FilterSpec {
    let defaults = FilterSpec::select_all(dataset);
    FilterSpec {
        years: match &request.years {
            Some(years) => years.iter().copied().collect(),
            None => defaults.years,
        },
        months: match &request.months {
            Some(months) => months.iter().cloned().collect(),
            None => defaults.months,
        },
        sectors: match &request.sectors {
            Some(sectors) => sectors.iter().cloned().collect(),
            None => defaults.sectors,
        },
        date_range: (
            request.start_date.unwrap_or(defaults.date_range.0),
            request.end_date.unwrap_or(defaults.date_range.1),
        ),
    }
}

/// # GET /api/filters
/// Returns the selections available to the dashboard's sidebar controls.
pub async fn get_filter_options(
    State(state): State<Arc<AppState>>,
) -> Result<Json<FilterOptions>, AppError> {
    let dataset = state.store.get_or_load().await?;
    let (min_date, max_date) = match dataset.date_bounds() {
        Some((min, max)) => (Some(min), Some(max)),
        None => (None, None),
    };
    Ok(Json(FilterOptions {
        years: dataset.years(),
        months: dataset.months(),
        sectors: dataset.sectors(),
        min_date,
        max_date,
        top_n_min: TopN::MIN,
        top_n_max: TopN::MAX,
    }))
}

/// # POST /api/dashboard
/// Runs the filter engine and the metrics pipeline against the cached
/// dataset and returns every derived table.
pub async fn compute_dashboard(
    State(state): State<Arc<AppState>>,
    Json(request): Json<DashboardRequest>,
) -> Result<Json<DashboardReport>, AppError> {
    let dataset = state.store.get_or_load().await?;

    let top_n = match request.top_n {
        Some(n) => TopN::new(n)?,
        None => state.default_top_n,
    };
    let spec = build_filter_spec(&dataset, &request);
    let view = FilteredView::build(&dataset, &spec);
    let report = state
        .engine
        .run(&view, top_n, request.focus_month.as_deref())?;
    Ok(Json(report))
}

/// # POST /api/cache/invalidate
/// Clears the session cache; the next request reloads from the database.
pub async fn invalidate_cache(
    State(state): State<Arc<AppState>>,
) -> Json<serde_json::Value> {
    state.store.invalidate().await;
    Json(json!({ "status": "cache invalidated" }))
}
