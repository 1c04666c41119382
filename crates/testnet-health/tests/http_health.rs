//! Waits against a real HTTP health endpoint served from a local listener.

use std::sync::Arc;
use std::sync::Once;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use testnet_core::WaitConfig;
use testnet_health::{HealthWaiter, HttpHealthCheck, WaitContext, WaitError, wait_for_healthy};

static TRACING_INIT: Once = Once::new();

/// Controlled by `RUST_LOG` (e.g. `RUST_LOG=testnet_health=debug`).
fn init_tracing() {
    TRACING_INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init()
            .ok();
    });
}

fn response(status: &str) -> String {
    format!("HTTP/1.1 {status}\r\ncontent-length: 0\r\nconnection: close\r\n\r\n")
}

/// Serve `statuses` in order, repeating the last one. Returns the address
/// and a counter of requests served.
async fn serve(statuses: Vec<&'static str>) -> (String, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    let served = Arc::new(AtomicUsize::new(0));
    let counter = served.clone();

    tokio::spawn(async move {
        loop {
            let Ok((mut stream, _)) = listener.accept().await else {
                break;
            };
            let n = counter.fetch_add(1, Ordering::SeqCst);
            let status = statuses
                .get(n)
                .or_else(|| statuses.last())
                .copied()
                .unwrap_or("200 OK");

            let mut buf = vec![0u8; 4096];
            let mut read = 0;
            while !buf[..read].windows(4).any(|w| w == b"\r\n\r\n") {
                match stream.read(&mut buf[read..]).await {
                    Ok(0) | Err(_) => break,
                    Ok(len) => read += len,
                }
            }
            let _ = stream.write_all(response(status).as_bytes()).await;
            let _ = stream.shutdown().await;
        }
    });

    (addr, served)
}

#[tokio::test]
async fn healthy_endpoint_returns_immediately() {
    init_tracing();
    let (addr, served) = serve(vec!["200 OK"]).await;
    let check = HttpHealthCheck::new("node-1", Some(addr));
    let ctx = WaitContext::with_timeout(Duration::from_secs(5));

    wait_for_healthy(&ctx, &check).await.unwrap();
    assert_eq!(served.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn service_unavailable_is_retried() {
    init_tracing();
    let (addr, served) = serve(vec![
        "503 Service Unavailable",
        "503 Service Unavailable",
        "200 OK",
    ])
    .await;
    let check = HttpHealthCheck::new("node-1", Some(addr));
    let ctx = WaitContext::with_timeout(Duration::from_secs(5));

    wait_for_healthy(&ctx, &check).await.unwrap();
    assert_eq!(served.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn missing_endpoint_is_fatal() {
    init_tracing();
    let (addr, served) = serve(vec!["404 Not Found"]).await;
    let check = HttpHealthCheck::new("node-1", Some(addr));
    let ctx = WaitContext::with_timeout(Duration::from_secs(5));

    let err = wait_for_healthy(&ctx, &check).await.unwrap_err();
    assert!(matches!(err, WaitError::HealthCheck { .. }), "got {err:?}");
    assert!(err.to_string().contains("404"));
    assert_eq!(served.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn unstarted_node_times_out() {
    init_tracing();
    let check = HttpHealthCheck::new("node-1", None);
    let ctx = WaitContext::with_timeout(Duration::from_millis(200));

    let err = wait_for_healthy(&ctx, &check).await.unwrap_err();
    assert!(err.is_timeout(), "got {err:?}");
    assert_eq!(err.node_id().as_str(), "node-1");
}

#[tokio::test]
async fn configured_path_and_interval() {
    init_tracing();
    let (addr, served) = serve(vec!["503 Service Unavailable", "200 OK"]).await;
    let config = WaitConfig::from_toml_str(
        r#"
[health]
poll_interval = "20ms"
probe_timeout = "1s"
health_path = "/healthz"
"#,
    )
    .unwrap();
    let waiter = HealthWaiter::from_config(&config).unwrap();
    let check = HttpHealthCheck::from_config("node-1", Some(addr), &config).unwrap();
    let ctx = WaitContext::with_timeout(Duration::from_secs(5));

    waiter.wait_for_healthy(&ctx, &check).await.unwrap();
    assert_eq!(waiter.poll_interval(), Duration::from_millis(20));
    assert_eq!(served.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn network_of_nodes_becomes_healthy() {
    init_tracing();
    let mut checks = Vec::new();
    for (i, statuses) in [vec!["200 OK"], vec!["503 Service Unavailable", "200 OK"]]
        .into_iter()
        .enumerate()
    {
        let (addr, _) = serve(statuses).await;
        checks.push(HttpHealthCheck::new(format!("node-{i}"), Some(addr)));
    }
    let ctx = WaitContext::with_timeout(Duration::from_secs(5));

    testnet_health::wait_for_all_healthy(&ctx, &checks).await.unwrap();
}

/// Accept connections and hold them open without ever responding.
async fn serve_silent() -> (String, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    let accepted = Arc::new(AtomicUsize::new(0));
    let counter = accepted.clone();

    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((stream, _)) = listener.accept().await {
            counter.fetch_add(1, Ordering::SeqCst);
            held.push(stream);
        }
    });

    (addr, accepted)
}

#[tokio::test]
async fn hung_endpoint_is_abandoned_after_probe_timeout() {
    init_tracing();
    let (addr, accepted) = serve_silent().await;
    let check = HttpHealthCheck::new("node-1", Some(addr)).with_timeout(Duration::from_millis(100));
    let ctx = WaitContext::with_timeout(Duration::from_secs(1));

    let err = wait_for_healthy(&ctx, &check).await.unwrap_err();
    assert!(err.is_timeout(), "got {err:?}");
    // Each abandoned check frees the loop to try again.
    let checks = accepted.load(Ordering::SeqCst);
    assert!(checks >= 3, "checks {checks}");
}

#[tokio::test]
async fn hung_endpoint_is_bounded_by_wait_deadline() {
    init_tracing();
    let (addr, accepted) = serve_silent().await;
    // Default probe timeout (2s) outlasts the wait deadline.
    let check = HttpHealthCheck::new("node-1", Some(addr));
    let start = std::time::Instant::now();
    let ctx = WaitContext::with_timeout(Duration::from_millis(200));

    let err = wait_for_healthy(&ctx, &check).await.unwrap_err();
    let elapsed = start.elapsed();
    assert!(err.is_timeout(), "got {err:?}");
    assert!(elapsed >= Duration::from_millis(200), "elapsed {elapsed:?}");
    assert!(elapsed < Duration::from_secs(1), "elapsed {elapsed:?}");
    assert_eq!(accepted.load(Ordering::SeqCst), 1);
}
