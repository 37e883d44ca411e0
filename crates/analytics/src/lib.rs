//! # Marketdash Analytics Engine
//!
//! This crate turns the cached price dataset into the derived tables the
//! dashboard displays. It contains the filter engine and the metrics pipeline.
//!
//! ## Architectural Principles
//!
//! - **Layer 1 Logic:** This is a pure logic crate. It has no knowledge of the
//!   database or the presentation layer. It depends only on `core-types` (Layer 0).
//! - **Stateless Calculation:** The `DashboardEngine` is a stateless calculator.
//!   It takes a `FilteredView` as input and produces a `DashboardReport` as
//!   output, so every filter change is one full, reproducible re-computation.
//!
//! ## Public API
//!
//! - `FilteredView`: the filter engine. Applies a `FilterSpec` to a `Dataset`
//!   and derives the calendar and daily-return columns.
//! - `DashboardEngine`: the metrics pipeline. Computes every dashboard table
//!   from a `FilteredView`.
//! - `DashboardReport`: the standardized set of derived tables.
//! - `AnalyticsError`: the specific error types that can be returned from this crate.

// Declare the modules that constitute this crate.
pub mod engine;
pub mod error;
pub mod report;
pub mod view;

// Re-export the key components to create a clean, public-facing API.
pub use engine::DashboardEngine;
pub use error::AnalyticsError;
pub use report::{
    CorrelationMatrix, CumulativePoint, CumulativeSeries, DashboardReport, MarketSummary,
    MonthlyMovers, SectorPerformance, TickerReturn, TickerVolatility,
};
pub use view::{FilteredView, ViewRow};
