pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::ServeArgs;

pub use adapters::{InMemorySheetStore, SheetsClient};
pub use app::{build_dispatcher, server::router, sheets_dispatcher};
pub use config::AppConfig;
pub use core::dispatch::{ActionRequest, ApiResponse, Dispatcher};
pub use utils::error::{AppError, ErrorCategory, Result};
