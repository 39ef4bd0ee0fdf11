//! Prometheus HTTP API wire format against a local TCP server

use chrono::{TimeZone, Utc};
use contextprio::telemetry::{
    MetricKind, MetricsBackend, PrometheusBackend, QueryResult, TelemetryClient,
};
use contextprio::TelemetryError;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Serve one canned HTTP response per connection; yields the request heads seen.
async fn serve(responses: Vec<(u16, &'static str)>) -> (String, JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = format!("http://{}", listener.local_addr().unwrap());

    let handle = tokio::spawn(async move {
        let mut heads = Vec::new();
        for (status, body) in responses {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 1024];
            while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
            }
            heads.push(String::from_utf8_lossy(&buf).to_string());

            let reply = format!(
                "HTTP/1.1 {} X\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(reply.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
        }
        heads
    });

    (address, handle)
}

fn backend(address: &str) -> PrometheusBackend {
    PrometheusBackend::new(address, Duration::from_secs(2), Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_instant_query_request_and_decode() {
    let (address, server) = serve(vec![(
        200,
        r#"{"status":"success","data":{"resultType":"vector","result":[{"metric":{"node":"w1"},"value":[1714557600,"0.75"]}]}}"#,
    )])
    .await;
    let backend = backend(&format!("{}/", address));

    let at = Utc.timestamp_opt(1_714_557_600, 0).unwrap();
    let response = backend.instant_query("node_load1{node=\"w1\"}", at).await.unwrap();
    match response.result {
        QueryResult::Vector(samples) => {
            assert_eq!(samples.len(), 1);
            assert_eq!(samples[0].value, 0.75);
        }
        other => panic!("unexpected result {:?}", other),
    }

    let heads = server.await.unwrap();
    let request_line = heads[0].lines().next().unwrap();
    assert!(
        request_line.starts_with("GET /api/v1/query?query=node_load1"),
        "{}",
        request_line
    );
    assert!(request_line.contains("time=1714557600.000"), "{}", request_line);
}

#[tokio::test]
async fn test_client_rejects_two_series() {
    let (address, server) = serve(vec![(
        200,
        r#"{"status":"success","data":{"resultType":"vector","result":[
            {"metric":{"device":"eth0"},"value":[1714557600,"10"]},
            {"metric":{"device":"eth1"},"value":[1714557600,"20"]}]}}"#,
    )])
    .await;
    let client = TelemetryClient::new(
        Arc::new(backend(&address)),
        "eth0".to_string(),
        Duration::from_secs(300),
    );

    let err = client.fetch(MetricKind::Bandwidth, "w1").await.unwrap_err();
    assert!(matches!(
        err,
        TelemetryError::ResultCardinalityMismatch { expected: 1, got: 2, .. }
    ));
    server.await.unwrap();
}

#[tokio::test]
async fn test_error_statuses() {
    let (address, server) = serve(vec![
        (
            400,
            r#"{"status":"error","errorType":"bad_data","error":"invalid parameter \"query\""}"#,
        ),
        (503, "service unavailable"),
        (200, "<html>not prometheus</html>"),
    ])
    .await;
    let backend = backend(&address);
    let now = Utc::now();

    let rejected = backend.instant_query("up{", now).await.unwrap_err();
    assert!(matches!(
        rejected,
        TelemetryError::QueryRejected { ref error_type, .. } if error_type == "bad_data"
    ));

    let unavailable = backend.instant_query("up", now).await.unwrap_err();
    assert!(matches!(unavailable, TelemetryError::BackendUnreachable(_)));

    let garbled = backend.instant_query("up", now).await.unwrap_err();
    assert!(matches!(garbled, TelemetryError::MalformedResponse(_)));

    server.await.unwrap();
}

#[tokio::test]
async fn test_connection_refused_is_unreachable() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let address = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let err = backend(&address)
        .instant_query("up", Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, TelemetryError::BackendUnreachable(_)));
}
