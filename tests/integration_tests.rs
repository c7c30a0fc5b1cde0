//! Integration tests for metrod.
//!
//! These drive the scrape server over a real TCP socket.

use metrod::registry::{LabelSet, Registry};
use metrod::server::ScrapeServer;
use metrod::util::ShutdownSignal;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

/// Start a scrape server on an ephemeral port.
async fn start_server(registry: Arc<Registry>) -> (SocketAddr, ShutdownSignal) {
    let server = ScrapeServer::new(
        "127.0.0.1:0".parse().unwrap(),
        "/metrics".to_string(),
        registry,
    );
    let bound = server.bind().await.expect("failed to bind");
    let addr = bound.local_addr().expect("failed to get local addr");

    let shutdown = ShutdownSignal::new();
    tokio::spawn(bound.run(shutdown.subscribe()));

    (addr, shutdown)
}

/// Issue one HTTP GET and return the full raw response.
async fn http_get(addr: SocketAddr, path: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.expect("failed to connect");
    let request = format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n");
    stream
        .write_all(request.as_bytes())
        .await
        .expect("failed to write request");

    let mut response = String::new();
    stream
        .read_to_string(&mut response)
        .await
        .expect("failed to read response");
    response
}

/// The exposition body, with the server's own scrape-counter family
/// filtered out so repeated scrapes can be compared.
fn app_metric_lines(response: &str) -> Vec<&str> {
    let body = response.split("\r\n\r\n").nth(1).unwrap_or("");
    body.lines()
        .filter(|line| !line.contains("metrod_scrapes_total"))
        .collect()
}

#[tokio::test]
async fn test_scrape_end_to_end() {
    let registry = Arc::new(Registry::new());
    for _ in 0..3 {
        registry
            .inc_counter(
                "http_requests_total",
                LabelSet::from_pairs([("method", "GET")]).unwrap(),
                1,
            )
            .unwrap();
    }
    registry
        .set_gauge("queue_depth", LabelSet::empty(), 4.5)
        .unwrap();

    let (addr, shutdown) = start_server(Arc::clone(&registry)).await;
    let response = http_get(addr, "/metrics").await;

    assert!(response.starts_with("HTTP/1.1 200 OK"));
    assert!(response.contains("content-type: text/plain; version=0.0.4"));
    assert!(response.contains("http_requests_total{method=\"GET\"} 3\n"));
    assert!(response.contains("queue_depth 4.5\n"));
    assert!(response.contains("metrod_scrapes_total 1\n"));

    shutdown.shutdown();
}

#[tokio::test]
async fn test_scrape_output_is_stable_without_mutation() {
    let registry = Arc::new(Registry::new());
    registry
        .set_gauge(
            "temperature",
            LabelSet::from_pairs([("room", "attic")]).unwrap(),
            19.25,
        )
        .unwrap();

    let (addr, shutdown) = start_server(Arc::clone(&registry)).await;
    let first = http_get(addr, "/metrics").await;
    let second = http_get(addr, "/metrics").await;

    assert_eq!(app_metric_lines(&first), app_metric_lines(&second));

    shutdown.shutdown();
}

#[tokio::test]
async fn test_concurrent_producers_and_scrapes() {
    const TASKS: usize = 8;
    const INCREMENTS: u64 = 500;

    let registry = Arc::new(Registry::new());
    let (addr, shutdown) = start_server(Arc::clone(&registry)).await;

    let mut producers = Vec::new();
    for _ in 0..TASKS {
        let registry = Arc::clone(&registry);
        producers.push(tokio::spawn(async move {
            for _ in 0..INCREMENTS {
                registry
                    .inc_counter("ops_total", LabelSet::empty(), 1)
                    .unwrap();
            }
        }));
    }

    // Scrape while producers run; output must be well-formed either way.
    let mid_scrape = http_get(addr, "/metrics").await;
    assert!(mid_scrape.starts_with("HTTP/1.1 200 OK"));

    for producer in producers {
        producer.await.unwrap();
    }

    let final_scrape = http_get(addr, "/metrics").await;
    let expected = format!("ops_total {}\n", TASKS as u64 * INCREMENTS);
    assert!(final_scrape.contains(&expected));

    shutdown.shutdown();
}

#[tokio::test]
async fn test_unknown_path_and_health() {
    let registry = Arc::new(Registry::new());
    let (addr, shutdown) = start_server(registry).await;

    let missing = http_get(addr, "/nope").await;
    assert!(missing.starts_with("HTTP/1.1 404"));

    let health = http_get(addr, "/health").await;
    assert!(health.starts_with("HTTP/1.1 200 OK"));
    assert!(health.ends_with("OK\n"));

    shutdown.shutdown();
}

#[test]
fn test_config_parsing() {
    use metrod::config::load_config;
    use std::io::Write;
    use tempfile::NamedTempFile;

    let config_content = r#"
server:
  listen: "127.0.0.1:0"
  path: /metrics
log:
  level: info
"#;

    let mut temp_file = NamedTempFile::new().expect("failed to create temp file");
    temp_file
        .write_all(config_content.as_bytes())
        .expect("failed to write config");

    let config = load_config(temp_file.path()).expect("failed to load config");
    assert_eq!(config.server.path, "/metrics");
    assert_eq!(config.server.listen, "127.0.0.1:0".parse().unwrap());
}
