use crate::config::toml_config::AppConfig;
use crate::utils::error::Result;
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "refi-desk")]
#[command(about = "Borrower refinance desk backed by Google Sheets")]
pub struct ServeArgs {
    /// TOML 配置檔；未指定時改讀環境變數
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Overrides `server.bind_address`.
    #[arg(long)]
    pub bind: Option<String>,

    #[arg(long, help = "Validate the configuration and exit")]
    pub check: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl ServeArgs {
    pub fn load_config(&self) -> Result<AppConfig> {
        let mut config = match &self.config {
            Some(path) => {
                tracing::info!("📄 Loading configuration from {}", path.display());
                AppConfig::from_file(path)?
            }
            None => {
                tracing::info!("📄 Loading configuration from environment");
                AppConfig::from_env()?
            }
        };

        if let Some(bind) = &self.bind {
            config.server.bind_address = bind.clone();
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_bind_flag_overrides_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(
            br#"
[sheets]
spreadsheet_id = "sheet-123"
access_token = "t"
"#,
        )
        .unwrap();

        let path = file.path().to_string_lossy().to_string();
        let args = ServeArgs::parse_from(["refi-desk", "--config", path.as_str(), "--bind", "127.0.0.1:7000"]);
        let config = args.load_config().unwrap();

        assert_eq!(config.server.bind_address, "127.0.0.1:7000");
        assert_eq!(config.sheets.spreadsheet_id, "sheet-123");
        assert!(!args.check);
    }
}
