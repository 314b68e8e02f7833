use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use refi_desk::adapters::sheets::SheetsClient;
use refi_desk::app::function::{handle_event, FunctionEvent, FunctionResponse};
use refi_desk::utils::logger;
use refi_desk::{sheets_dispatcher, AppConfig, Dispatcher};

async fn function_handler(
    dispatcher: &Dispatcher<SheetsClient>,
    event: LambdaEvent<FunctionEvent>,
) -> Result<FunctionResponse, Error> {
    Ok(handle_event(dispatcher, event.payload).await)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    logger::init_lambda_logger();

    // 冷啟動時驗證配置，缺少 spreadsheet id 或憑證就直接失敗
    let config = AppConfig::from_env()?;
    let dispatcher = sheets_dispatcher(&config).map_err(|e| {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        e
    })?;

    tracing::info!("Starting refi-desk function");
    let dispatcher = &dispatcher;
    run(service_fn(move |event: LambdaEvent<FunctionEvent>| async move {
        function_handler(dispatcher, event).await
    }))
    .await
}
