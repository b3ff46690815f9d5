use graylog_gelf::{GelfError, GelfHandler, GelfLayer, GelfOptions, HttpTransport, Level, LogRecord};
use httpmock::prelude::*;
use std::time::Duration;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::EnvFilter;

fn handler(server: &MockServer, compress: bool) -> GelfHandler {
    let transport =
        HttpTransport::new(&server.host(), server.port(), "/gelf", Duration::from_secs(5)).unwrap();
    let options = GelfOptions {
        localname: Some("http-test".to_string()),
        compress,
        ..GelfOptions::default()
    };
    GelfHandler::new(options, transport).unwrap()
}

#[tokio::test]
async fn test_compressed_post() {
    let server = MockServer::start();

    let gelf_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/gelf")
            .header("Content-Encoding", "gzip,deflate");
        then.status(202);
    });

    let handler = handler(&server, true);
    handler
        .emit(&LogRecord::new("http.app", Level::Info, "compressed body"))
        .await
        .unwrap();

    gelf_mock.assert();
}

#[tokio::test]
async fn test_uncompressed_post_carries_json() {
    let server = MockServer::start();

    let gelf_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/gelf")
            .body_contains("\"short_message\":\"plain body\"")
            .body_contains("\"_order\":\"A-17\"");
        then.status(202);
    });

    let handler = handler(&server, false);
    let record = LogRecord::new("http.app", Level::Info, "plain body").with_extra("order", "A-17");
    handler.emit(&record).await.unwrap();

    gelf_mock.assert();
}

#[tokio::test]
async fn test_error_status_is_reported() {
    let server = MockServer::start();

    let gelf_mock = server.mock(|when, then| {
        when.method(POST).path("/gelf");
        then.status(500);
    });

    let handler = handler(&server, true);
    let result = handler
        .emit(&LogRecord::new("http.app", Level::Error, "server down"))
        .await;

    gelf_mock.assert();
    assert!(matches!(
        result,
        Err(GelfError::HttpStatusError { status: 500 })
    ));
}

#[tokio::test]
async fn test_layer_sends_one_post_per_event_at_debug_level() {
    let server = MockServer::start();

    let gelf_mock = server.mock(|when, then| {
        when.method(POST).path("/gelf");
        then.status(202);
    });

    let (layer, worker) = GelfLayer::new(handler(&server, false));
    let worker = tokio::spawn(worker.run());

    // debug 等級下 reqwest/hyper 在送出時也會記錄事件
    let subscriber = tracing_subscriber::registry()
        .with(EnvFilter::new("debug"))
        .with(layer);
    let guard = tracing::subscriber::set_default(subscriber);

    tracing::info!(target: "shop", order = "A-17", "order created");
    tokio::time::sleep(Duration::from_secs(1)).await;

    drop(guard);
    worker.abort();

    gelf_mock.assert_hits(1);
}
