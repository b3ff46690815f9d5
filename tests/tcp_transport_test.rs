use graylog_gelf::adapters::RetryPolicy;
use graylog_gelf::core::decoder::decode_payload;
use graylog_gelf::{GelfError, GelfHandler, GelfOptions, Level, LogRecord, StreamTransport};
use serde_json::json;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::time::sleep;

fn options() -> GelfOptions {
    GelfOptions {
        localname: Some("tcp-test".to_string()),
        ..GelfOptions::default()
    }
}

#[tokio::test]
async fn test_frames_are_null_terminated_and_uncompressed() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let server = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let mut data = Vec::new();
        let mut buf = [0u8; 4096];
        while data.iter().filter(|b| **b == 0).count() < 2 {
            let n = stream.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            data.extend_from_slice(&buf[..n]);
        }
        data
    });

    // compress=true 會被 TCP 傳輸強制關閉
    let handler = GelfHandler::new(options(), StreamTransport::tcp("127.0.0.1", port)).unwrap();
    assert!(!handler.formatter().options().compress);

    handler
        .emit(&LogRecord::new("tcp.app", Level::Info, "first"))
        .await
        .unwrap();
    handler
        .emit(&LogRecord::new("tcp.app", Level::Error, "second"))
        .await
        .unwrap();

    let data = tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(data.last(), Some(&0));

    let frames: Vec<&[u8]> = data.split(|b| *b == 0).filter(|f| !f.is_empty()).collect();
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[0][0], b'{');

    let first = decode_payload(frames[0]).unwrap();
    let second = decode_payload(frames[1]).unwrap();
    assert_eq!(first["short_message"], json!("first"));
    assert_eq!(second["short_message"], json!("second"));
    assert_eq!(second["level"], json!(3));
}

#[tokio::test]
async fn test_unreachable_input_backs_off() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let handler = GelfHandler::new(options(), StreamTransport::tcp("127.0.0.1", port)).unwrap();
    let record = LogRecord::new("tcp.app", Level::Warning, "nobody listening");

    assert!(handler.emit(&record).await.is_err());

    // 退避期間內不重新連線
    let second = handler.emit(&record).await;
    assert!(matches!(
        second,
        Err(GelfError::TransportUnavailableError { .. })
    ));
}

fn quick_retry() -> RetryPolicy {
    RetryPolicy {
        start: Duration::from_millis(200),
        factor: 2.0,
        max: Duration::from_millis(400),
    }
}

fn quick_handler(port: u16) -> GelfHandler {
    let transport = StreamTransport::tcp("127.0.0.1", port)
        .with_retry(quick_retry())
        .with_connect_timeout(Duration::from_millis(500));
    GelfHandler::new(options(), transport).unwrap()
}

fn is_backing_off(result: &graylog_gelf::Result<()>) -> bool {
    matches!(result, Err(GelfError::TransportUnavailableError { .. }))
}

async fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}

async fn read_first_frame(stream: &mut TcpStream) -> Vec<u8> {
    let mut data = Vec::new();
    let mut buf = [0u8; 4096];
    while !data.contains(&0) {
        let n = stream.read(&mut buf).await.unwrap();
        if n == 0 {
            break;
        }
        data.extend_from_slice(&buf[..n]);
    }
    let end = data.iter().position(|b| *b == 0).unwrap_or(data.len());
    data.truncate(end);
    data
}

#[tokio::test]
async fn test_backoff_doubles_up_to_cap() {
    let port = closed_port().await;
    let handler = quick_handler(port);
    let record = LogRecord::new("tcp.app", Level::Info, "retry me");

    // 第一次連線失敗：等待 200ms
    let first = handler.emit(&record).await;
    assert!(first.is_err() && !is_backing_off(&first));
    assert!(is_backing_off(&handler.emit(&record).await));

    sleep(Duration::from_millis(300)).await;
    let second = handler.emit(&record).await;
    assert!(second.is_err() && !is_backing_off(&second));

    // 等待加倍為 400ms
    sleep(Duration::from_millis(240)).await;
    assert!(is_backing_off(&handler.emit(&record).await));

    sleep(Duration::from_millis(240)).await;
    let third = handler.emit(&record).await;
    assert!(third.is_err() && !is_backing_off(&third));

    // 上限 400ms，未設上限時會是 800ms
    sleep(Duration::from_millis(500)).await;
    let fourth = handler.emit(&record).await;
    assert!(fourth.is_err() && !is_backing_off(&fourth));
}

#[tokio::test]
async fn test_reconnects_once_backoff_window_passes() {
    let port = closed_port().await;
    let handler = quick_handler(port);

    assert!(handler
        .emit(&LogRecord::new("tcp.app", Level::Info, "lost"))
        .await
        .is_err());

    let listener = TcpListener::bind(("127.0.0.1", port)).await.unwrap();
    let server = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        read_first_frame(&mut stream).await
    });

    assert!(is_backing_off(
        &handler
            .emit(&LogRecord::new("tcp.app", Level::Info, "too early"))
            .await
    ));

    sleep(Duration::from_millis(300)).await;
    handler
        .emit(&LogRecord::new("tcp.app", Level::Info, "back online"))
        .await
        .unwrap();

    let frame = tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(decode_payload(&frame).unwrap()["short_message"], json!("back online"));
}

#[tokio::test]
async fn test_reconnects_after_write_failure() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let server = tokio::spawn(async move {
        let (mut first, _) = listener.accept().await.unwrap();
        let before = read_first_frame(&mut first).await;
        drop(first);

        let (mut second, _) = listener.accept().await.unwrap();
        let after = read_first_frame(&mut second).await;
        (before, after)
    });

    let handler = quick_handler(port);
    handler
        .emit(&LogRecord::new("tcp.app", Level::Info, "before restart"))
        .await
        .unwrap();

    // 對端關閉後，寫入最終失敗並在下一次送出時重連
    let mut failures = 0;
    for _ in 0..100 {
        if server.is_finished() {
            break;
        }
        if handler
            .emit(&LogRecord::new("tcp.app", Level::Info, "after restart"))
            .await
            .is_err()
        {
            failures += 1;
        }
        sleep(Duration::from_millis(20)).await;
    }

    let (before, after) = tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .unwrap()
        .unwrap();
    assert!(failures >= 1);
    assert_eq!(decode_payload(&before).unwrap()["short_message"], json!("before restart"));
    assert_eq!(decode_payload(&after).unwrap()["short_message"], json!("after restart"));
}
