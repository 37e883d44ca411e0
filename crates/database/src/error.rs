use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Failed to load environment variables for database connection: {0}")]
    ConnectionConfigError(String),

    /// Connection or query failure at load time. The caller must surface a
    /// user-visible message and halt the render cycle; it must not treat this
    /// as an empty dataset.
    #[error("Data source unavailable: {0}")]
    DataSource(#[from] sqlx::Error),
}
