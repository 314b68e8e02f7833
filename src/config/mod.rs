#[cfg(feature = "cli")]
pub mod cli;
pub mod env;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use cli::ServeArgs;
pub use toml_config::{AppConfig, OtpConfig, ServerConfig, SheetsConfig};
