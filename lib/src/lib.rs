pub mod aggregate;
pub mod api;
pub mod client;
pub mod config;
pub mod csv_format;
pub mod error;
pub mod export;
pub mod hierarchy;
pub mod models;
pub mod pipeline;
pub mod utils;

// Re-export error types for convenience
pub use error::{ExportError, Result};
