use httpmock::prelude::*;
use refi_desk::domain::model::CellValue;
use refi_desk::domain::ports::SheetStore;
use refi_desk::{build_dispatcher, AppConfig, AppError, ErrorCategory, SheetsClient};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

fn config_for(server: &MockServer, timeout_seconds: u64) -> AppConfig {
    let toml_content = format!(
        r#"
[server]
request_timeout_seconds = {}

[sheets]
spreadsheet_id = "sheet-123"
api_base_url = "{}"
access_token = "test-token"
"#,
        timeout_seconds,
        server.base_url()
    );
    AppConfig::from_toml_str(&toml_content).unwrap()
}

fn client_for(server: &MockServer) -> SheetsClient {
    let config = config_for(server, 5);
    SheetsClient::new(&config.sheets, config.request_timeout()).unwrap()
}

#[tokio::test]
async fn test_read_range_stringifies_cells() {
    let server = MockServer::start();
    let read_mock = server.mock(|when, then| {
        when.method(GET)
            .path("/v4/spreadsheets/sheet-123/values/Users")
            .header("authorization", "Bearer test-token");
        then.status(200).json_body(json!({
            "range": "Users!A1:Z1000",
            "majorDimension": "ROWS",
            "values": [["Name", "Email"], ["Ann", "ann@example.com", 3, true]]
        }));
    });

    let rows = client_for(&server).read_range("Users").await.unwrap();

    read_mock.assert();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1], vec!["Ann", "ann@example.com", "3", "TRUE"]);
}

#[tokio::test]
async fn test_empty_range_has_no_values_key() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/v4/spreadsheets/sheet-123/values/Borrower_Data!A:M");
        then.status(200)
            .json_body(json!({ "range": "Borrower_Data!A1:M1000", "majorDimension": "ROWS" }));
    });

    let rows = client_for(&server)
        .read_range("Borrower_Data!A:M")
        .await
        .unwrap();
    assert!(rows.is_empty());
}

#[tokio::test]
async fn test_non_success_status_is_upstream_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/v4/spreadsheets/sheet-123/values/Users");
        then.status(403).json_body(json!({
            "error": {
                "code": 403,
                "message": "The caller does not have permission",
                "status": "PERMISSION_DENIED"
            }
        }));
    });

    let err = client_for(&server).read_range("Users").await.unwrap_err();
    assert_eq!(err.category(), ErrorCategory::UpstreamError);
    assert!(err.to_string().contains("The caller does not have permission"));
}

#[tokio::test]
async fn test_append_uses_user_entered_insert_rows() {
    let server = MockServer::start();
    let append_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/v4/spreadsheets/sheet-123/values/Borrower_Data!A:M:append")
            .query_param("valueInputOption", "USER_ENTERED")
            .query_param("insertDataOption", "INSERT_ROWS")
            .json_body(json!({
                "majorDimension": "ROWS",
                "values": [["'=cmd()", "300000", true, "=INDIRECT(\"D\"&ROW())/100/12"]]
            }));
        then.status(200).json_body(json!({ "spreadsheetId": "sheet-123" }));
    });

    client_for(&server)
        .append_row(
            "Borrower_Data!A:M",
            vec![
                CellValue::text("=cmd()"),
                CellValue::Number(rust_decimal_macros::dec!(300000)),
                CellValue::Bool(true),
                CellValue::Formula("=INDIRECT(\"D\"&ROW())/100/12".into()),
            ],
        )
        .await
        .unwrap();

    append_mock.assert();
}

#[tokio::test]
async fn test_update_overwrites_exact_range() {
    let server = MockServer::start();
    let update_mock = server.mock(|when, then| {
        when.method(PUT)
            .path("/v4/spreadsheets/sheet-123/values/Borrower_Data!A3:M3")
            .query_param("valueInputOption", "USER_ENTERED")
            .json_body(json!({
                "range": "Borrower_Data!A3:M3",
                "majorDimension": "ROWS",
                "values": [["BRW-1-abc", "Smith"]]
            }));
        then.status(200).json_body(json!({ "updatedRows": 1 }));
    });

    client_for(&server)
        .update_range(
            "Borrower_Data!A3:M3",
            vec![CellValue::text("BRW-1-abc"), CellValue::text("Smith")],
        )
        .await
        .unwrap();

    update_mock.assert();
}

#[tokio::test]
async fn test_delete_row_is_structural() {
    let server = MockServer::start();
    let meta_mock = server.mock(|when, then| {
        when.method(GET)
            .path("/v4/spreadsheets/sheet-123")
            .query_param_exists("fields");
        then.status(200).json_body(json!({
            "sheets": [
                { "properties": { "sheetId": 0, "title": "Users" } },
                { "properties": { "sheetId": 777, "title": "Borrower_Data" } }
            ]
        }));
    });
    let delete_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/v4/spreadsheets/sheet-123:batchUpdate")
            .json_body(json!({
                "requests": [{
                    "deleteDimension": {
                        "range": {
                            "sheetId": 777,
                            "dimension": "ROWS",
                            "startIndex": 4,
                            "endIndex": 5
                        }
                    }
                }]
            }));
        then.status(200).json_body(json!({ "replies": [{}] }));
    });

    client_for(&server).delete_row("Borrower_Data", 5).await.unwrap();

    meta_mock.assert();
    delete_mock.assert();
}

#[tokio::test]
async fn test_unknown_tab_cannot_be_deleted_from() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/v4/spreadsheets/sheet-123");
        then.status(200)
            .json_body(json!({ "sheets": [{ "properties": { "sheetId": 0, "title": "Users" } }] }));
    });

    let err = client_for(&server)
        .delete_row("Borrower_Data", 2)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::UpstreamError { .. }));
}

#[tokio::test]
async fn test_slow_sheets_call_times_out() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/v4/spreadsheets/sheet-123/values/Users");
        then.status(200)
            .delay(Duration::from_secs(3))
            .json_body(json!({ "values": [] }));
    });

    let config = config_for(&server, 1);
    let client = SheetsClient::new(&config.sheets, config.request_timeout()).unwrap();
    let err = client.read_range("Users").await.unwrap_err();
    assert_eq!(err.category(), ErrorCategory::UpstreamError);
}

#[tokio::test]
async fn test_fetch_rates_through_dispatcher() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET)
            .path("/v4/spreadsheets/sheet-123/values/Freddie_Mac_Rate");
        then.status(200).json_body(json!({
            "values": [
                ["Date", "30-Year Fixed Rate", "15-Year Fixed Rate"],
                ["2026-10-08", "5.00%", "4.40%"]
            ]
        }));
    });

    let config = config_for(&server, 5);
    let client = SheetsClient::new(&config.sheets, config.request_timeout()).unwrap();
    let dispatcher = build_dispatcher(Arc::new(client), &config);

    let (status, response) = dispatcher
        .handle_body(r#"{"action":"fetchFreddieMacRates"}"#)
        .await;
    assert_eq!(status, 200);

    let data = response.data.unwrap();
    assert_eq!(data[0]["30-Year Fixed Rate"], "5.00%");
    assert_eq!(data[0]["Date"], "2026-10-08");
}
