use graylog_gelf::core::decoder::{decode_payload, ChunkAssembler};
use graylog_gelf::{Chunker, GelfHandler, GelfOptions, Level, LogRecord, OverflowPolicy, UdpTransport};
use serde_json::json;
use std::time::Duration;
use tokio::net::UdpSocket;

async fn receiver() -> (UdpSocket, u16) {
    let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let port = socket.local_addr().unwrap().port();
    (socket, port)
}

async fn recv(socket: &UdpSocket) -> Option<Vec<u8>> {
    let mut buf = vec![0u8; 65_535];
    match tokio::time::timeout(Duration::from_millis(500), socket.recv(&mut buf)).await {
        Ok(Ok(len)) => {
            buf.truncate(len);
            Some(buf)
        }
        _ => None,
    }
}

async fn recv_message(socket: &UdpSocket) -> (serde_json::Value, usize) {
    let mut assembler = ChunkAssembler::default();
    let mut datagrams = 0;
    loop {
        let datagram = recv(socket).await.expect("expected a datagram");
        datagrams += 1;
        if let Some(payload) = assembler.push(&datagram).unwrap() {
            return (decode_payload(&payload).unwrap(), datagrams);
        }
    }
}

fn handler(port: u16, chunker: Chunker, compress: bool) -> GelfHandler {
    let options = GelfOptions {
        localname: Some("udp-test".to_string()),
        compress,
        ..GelfOptions::default()
    };
    GelfHandler::new(options, UdpTransport::new("127.0.0.1", port, chunker)).unwrap()
}

fn noise(len: usize) -> String {
    (0..len)
        .map(|_| char::from(b'a' + rand::random::<u8>() % 26))
        .collect()
}

#[tokio::test]
async fn test_small_message_is_one_compressed_datagram() {
    let (socket, port) = receiver().await;
    let handler = handler(port, Chunker::default(), true);

    let record = LogRecord::new("udp.app", Level::Info, "hello graylog").with_extra("region", "eu-west");
    handler.emit(&record).await.unwrap();

    let datagram = recv(&socket).await.unwrap();
    assert_eq!(datagram[0], 0x78);

    let gelf = decode_payload(&datagram).unwrap();
    assert_eq!(gelf["short_message"], json!("hello graylog"));
    assert_eq!(gelf["host"], json!("udp-test"));
    assert_eq!(gelf["level"], json!(6));
    assert_eq!(gelf["_region"], json!("eu-west"));
}

#[tokio::test]
async fn test_large_message_is_chunked() {
    let (socket, port) = receiver().await;
    let handler = handler(port, Chunker::new(64, OverflowPolicy::Warn), true);

    let body = noise(2000);
    handler
        .emit(&LogRecord::new("udp.app", Level::Debug, body.clone()))
        .await
        .unwrap();

    let (gelf, datagrams) = recv_message(&socket).await;
    assert!(datagrams > 1);
    assert_eq!(gelf["short_message"], json!(body));
}

#[tokio::test]
async fn test_chunk_overflow_is_dropped_with_warn_policy() {
    let (socket, port) = receiver().await;
    let handler = handler(port, Chunker::new(2, OverflowPolicy::Warn), false);

    handler
        .emit(&LogRecord::new("udp.app", Level::Info, "x".repeat(400)))
        .await
        .unwrap();

    assert!(recv(&socket).await.is_none());
}

#[tokio::test]
async fn test_chunk_overflow_is_truncated_with_truncate_policy() {
    let (socket, port) = receiver().await;
    let handler = handler(port, Chunker::new(16, OverflowPolicy::Truncate), false);

    handler
        .emit(&LogRecord::new("udp.app", Level::Info, "y".repeat(4000)))
        .await
        .unwrap();

    let (gelf, datagrams) = recv_message(&socket).await;
    assert!(datagrams <= 128);
    assert_eq!(gelf["_chunk_overflow"], json!("True"));
    assert_eq!(gelf["level"], json!(3));
    assert_eq!(gelf["facility"], json!("udp.app"));
    assert!(gelf["short_message"].as_str().unwrap().len() < 4000);
}
