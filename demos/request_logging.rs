use std::sync::Arc;
use std::time::Instant;

use lumberjack::ambient::{Claim, FixedRequest, RequestView, SpanCorrelation};
use lumberjack::config::LoggerOptions;
use lumberjack::exception::LoggedError;
use lumberjack::init::{init_self_log, SelfLogConfig};
use lumberjack::record::ContextMap;
use lumberjack::LumberJack;
use serde_json::json;
use tracing::Instrument;

/// Logs one of each category for a simulated request into `./logs`.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // INFO so the request span below is enabled and carries an id.
    init_self_log(SelfLogConfig {
        max_level: tracing::level_filters::LevelFilter::INFO,
        ..Default::default()
    })?;

    let options = LoggerOptions::from_json_str(
        r#"{ "BITS.Logger": {
                "EnvironmentName": "Development",
                "LogLocation": "logs",
                "EnableDiagnostics": true,
                "AddClaims": true } }"#,
    )?;

    // Host middleware would capture this per request.
    let request = RequestView {
        claims: vec![
            Claim::new("bits_participant_partid", "1001"),
            Claim::new("givenname", "jane"),
            Claim::new("surname", "doe"),
        ],
        method: "GET".to_string(),
        route_template: Some("api/orders/{id}".to_string()),
        route_values: vec![("id".to_string(), "17".to_string())],
        query_string: "?expand=lines&expand=customer".to_string(),
        referrer: Some("https://localhost/swagger/index.html".to_string()),
        user_agent: Some("demo".to_string()),
        session: None,
    };

    let jack = LumberJack::from_options(
        options,
        Arc::new(FixedRequest(request)),
        Arc::new(SpanCorrelation),
    )?;

    handle_request(&jack)
        .instrument(tracing::info_span!("request", id = 17))
        .await?;
    Ok(())
}

async fn handle_request(jack: &LumberJack) -> Result<(), Box<dyn std::error::Error>> {
    let started = Instant::now();
    let mut info = ContextMap::new();
    info.insert("orderId".to_string(), json!(17));

    jack.log_usage("order viewed", Some(&info)).await?;
    jack.log_diagnostic("served from cache", Some(&info)).await?;

    let err = LoggedError::new("OrderStoreError", "could not load order lines")
        .with_data("OrderId", 17)
        .with_inner(
            LoggedError::new("QueryError", "statement timeout")
                .with_data("Procedure", "Orders.LoadLines"),
        );
    jack.log_error(&err, None).await?;

    jack.log_performance(started.elapsed().as_millis() as i64, Some(&info))
        .await?;

    println!("wrote usage, diag, error and perf entries under ./logs");
    Ok(())
}
