mod common;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use common::fast_policy;
use ledger_sync::{
    ContinuationToken, Cursor, FetchErrorKind, HttpPageSource, PageFetcher, PageQuery, PageSource,
    TimestampFilter,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// По одному заготовленному ответу на соединение, по порядку. Возвращает
/// увиденные строки запросов.
async fn serve(responses: Vec<(u16, String)>) -> (SocketAddr, JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        let mut seen = Vec::new();
        for (status, body) in responses {
            let (mut conn, _) = listener.accept().await.unwrap();

            let mut head = Vec::new();
            let mut buf = [0u8; 1024];
            while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = conn.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                head.extend_from_slice(&buf[..n]);
            }
            let head = String::from_utf8_lossy(&head).to_string();
            seen.push(head.lines().next().unwrap_or_default().to_string());

            let reason = if status == 200 { "OK" } else { "Error" };
            let resp = format!(
                "HTTP/1.1 {status} {reason}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            conn.write_all(resp.as_bytes()).await.unwrap();
            let _ = conn.shutdown().await;
        }
        seen
    });

    (addr, handle)
}

fn source(addr: SocketAddr) -> HttpPageSource {
    let http = reqwest::Client::builder()
        .no_proxy()
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap();
    HttpPageSource::with_client(format!("http://{addr}/api/v1/transactions"), http)
}

const PAGE: &str = r#"{
    "transactions": [
        {"consensus_timestamp": "110.0", "name": "CRYPTOTRANSFER"},
        {"consensus_timestamp": "120.0", "name": "CRYPTOTRANSFER"}
    ],
    "links": {"next": "/api/v1/transactions?account.id=0.0.7&limit=2&order=asc&timestamp=gt:120.0"}
}"#;

#[tokio::test]
async fn sends_filter_params_and_parses_page() {
    let (addr, server) = serve(vec![(200, PAGE.to_string())]).await;
    let query = PageQuery::new("0.0.7", 2)
        .with_timestamp(Some(TimestampFilter::After(Cursor::new("105.0"))));

    let page = source(addr).fetch_page(&query).await.unwrap();

    assert_eq!(page.records.len(), 2);
    assert_eq!(page.records[0].consensus_timestamp(), "110.0");
    assert_eq!(page.next, Some(ContinuationToken::parse("gt:120.0").unwrap()));

    let lines = server.await.unwrap();
    assert_eq!(
        lines,
        ["GET /api/v1/transactions?account.id=0.0.7&limit=2&order=asc&timestamp=gt%3A105.0 HTTP/1.1"]
    );
}

#[tokio::test]
async fn non_success_status_is_transient() {
    let (addr, server) = serve(vec![(503, "{\"_status\":\"unavailable\"}".into())]).await;

    let err = source(addr).fetch_page(&PageQuery::new("0.0.7", 100)).await.unwrap_err();
    assert_eq!(err.kind(), FetchErrorKind::Transient);
    assert!(err.message().starts_with("HTTP 503"), "{err}");
    server.await.unwrap();
}

#[tokio::test]
async fn unexpected_body_is_protocol_error() {
    let (addr, server) = serve(vec![(200, "{\"links\":{\"next\":null}}".into())]).await;

    let err = source(addr).fetch_page(&PageQuery::new("0.0.7", 100)).await.unwrap_err();
    assert_eq!(err.kind(), FetchErrorKind::Protocol);
    server.await.unwrap();
}

#[tokio::test]
async fn refused_connection_is_transient() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = source(addr).fetch_page(&PageQuery::new("0.0.7", 100)).await.unwrap_err();
    assert_eq!(err.kind(), FetchErrorKind::Transient);
}

#[tokio::test]
async fn fetcher_retries_over_http() {
    let (addr, server) = serve(vec![
        (500, "oops".into()),
        (502, "bad gateway".into()),
        (200, PAGE.to_string()),
    ])
    .await;
    let fetcher = PageFetcher::new(Arc::new(source(addr)), fast_policy(3));

    let page = fetcher.fetch(&PageQuery::new("0.0.7", 2)).await.unwrap();
    assert_eq!(page.records.len(), 2);
    assert_eq!(server.await.unwrap().len(), 3);
}
