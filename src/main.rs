use clap::Parser;
use refi_desk::app::server;
use refi_desk::utils::logger;
use refi_desk::{sheets_dispatcher, ServeArgs};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = ServeArgs::parse();

    // 初始化日誌
    logger::init_cli_logger(args.verbose);

    tracing::info!("Starting refi-desk server");
    if args.verbose {
        tracing::debug!("CLI args: {:?}", args);
    }

    // 載入並驗證配置，任何錯誤都在碰到試算表之前結束
    let config = match args.load_config() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Configuration load failed: {}", e);
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };

    let dispatcher = match sheets_dispatcher(&config) {
        Ok(dispatcher) => dispatcher,
        Err(e) => {
            tracing::error!("❌ Configuration validation failed: {}", e);
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };

    if args.check {
        println!("✅ Configuration is valid");
        return Ok(());
    }

    server::serve(dispatcher, &config.server.bind_address).await?;
    Ok(())
}
