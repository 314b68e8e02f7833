// Application wiring: builds the dispatcher from configuration and exposes the HTTP surface.

pub mod function;
pub mod server;

use crate::adapters::otp::{InMemoryOtpStore, LogOtpSender};
use crate::adapters::sheets::SheetsClient;
use crate::config::AppConfig;
use crate::core::borrowers::BorrowerService;
use crate::core::dispatch::Dispatcher;
use crate::core::otp::OtpService;
use crate::core::users::UserDirectory;
use crate::domain::ports::SheetStore;
use crate::utils::error::Result;
use crate::utils::validation::Validate;
use std::sync::Arc;

/// Services over `store`, with the in-memory OTP store and log-only delivery.
pub fn build_dispatcher<S: SheetStore>(store: Arc<S>, config: &AppConfig) -> Dispatcher<S> {
    let tabs = config.sheets.tabs.clone();

    let borrowers =
        BorrowerService::new(Arc::clone(&store), tabs.clone(), config.sheets.derived_columns);
    let users = UserDirectory::new(Arc::clone(&store), tabs.users);
    let otp_store = Arc::new(InMemoryOtpStore::new(
        config.otp.max_attempts,
        config.otp.resend_cooldown(),
    ));
    let otp = OtpService::new(
        users.clone(),
        otp_store,
        Arc::new(LogOtpSender),
        config.otp.clone(),
    );

    Dispatcher::new(borrowers, users, otp, config.request_timeout())
}

/// 驗證配置後建立連到 Google Sheets 的 dispatcher
pub fn sheets_dispatcher(config: &AppConfig) -> Result<Dispatcher<SheetsClient>> {
    config.validate()?;
    let client = SheetsClient::new(&config.sheets, config.request_timeout())?;

    tracing::info!(
        "📊 Using spreadsheet {} ({} derived columns)",
        config.sheets.spreadsheet_id,
        match config.sheets.derived_columns {
            crate::domain::model::DerivedMode::Formula => "formula",
            crate::domain::model::DerivedMode::Static => "static",
        }
    );
    Ok(build_dispatcher(Arc::new(client), config))
}
