//! # Marketdash Database Crate
//!
//! This crate acts as a high-level, application-specific interface to the
//! PostgreSQL store holding the daily price table. It is the system's only
//! contact with the outside data source.
//!
//! ## Architectural Principles
//!
//! - **Layer 3 Adapter:** This crate encapsulates all database-specific logic.
//!   It hands the rest of the application an immutable `Dataset` and hides the
//!   underlying SQL and connection details.
//! - **Read-Only:** The price table belongs to an external ingestion process.
//!   This crate issues exactly one `SELECT` and never writes.
//! - **Session Cache:** `PriceStore` loads the dataset once per session and
//!   serves the cached copy afterwards; it refreshes only on an explicit
//!   `invalidate` call, never silently.
//!
//! ## Public API
//!
//! - `connect`: The async function to establish the database connection pool.
//! - `PriceRepository`: The struct that holds the connection pool and runs the
//!   bulk price query.
//! - `PriceStore`: The session-scoped cache in front of the repository.
//! - `DbError`: The specific error types that can be returned from this crate.

// Declare the modules that constitute this crate.
pub mod connection;
pub mod error;
pub mod repository;
pub mod store;

// Re-export the key components to create a clean, public-facing API.
pub use connection::connect;
pub use error::DbError;
pub use repository::PriceRepository;
pub use store::PriceStore;
