//! HTTP service for PPTX template analysis, deck generation and patching.

pub mod config;
pub mod dtos;
pub mod error;
pub mod fetch;
pub mod handlers;
pub mod middleware;
pub mod startup;

pub use config::ServerConfig;
pub use error::AppError;
pub use fetch::{FetchError, HttpFetcher, PackageFetcher};
pub use startup::{build_app, build_router, AppState, Application};

/// Name reported by the status endpoints.
pub const SERVICE_NAME: &str = "pptx-service";
