//! Scrape HTTP server.
//!
//! Serves the exposition body on a configurable endpoint.

use crate::exposition::render_metrics;
use crate::registry::{LabelSet, Registry};
use bytes::Bytes;
use http_body_util::Full;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::{debug, error, info};

/// Counter of scrape requests served, kept in the same registry we expose.
const SCRAPES_TOTAL: &str = "metrod_scrapes_total";

/// HTTP server answering collector scrapes.
pub struct ScrapeServer {
    /// Address to bind.
    address: SocketAddr,
    /// Path for the metrics endpoint.
    path: String,
    /// The registry to snapshot on each scrape.
    registry: Arc<Registry>,
}

impl ScrapeServer {
    /// Create a new scrape server.
    pub fn new(address: SocketAddr, path: String, registry: Arc<Registry>) -> Self {
        Self {
            address,
            path,
            registry,
        }
    }

    /// Bind the listening socket.
    ///
    /// Split from [`BoundScrapeServer::run`] so callers can fail fast on a
    /// bad address and learn the actual port when binding to port 0.
    pub async fn bind(self) -> std::io::Result<BoundScrapeServer> {
        let listener = TcpListener::bind(self.address).await?;

        info!(address = %listener.local_addr()?, path = %self.path, "scrape server started");

        Ok(BoundScrapeServer {
            listener,
            path: self.path,
            registry: self.registry,
        })
    }
}

/// A scrape server with its socket already bound.
pub struct BoundScrapeServer {
    listener: TcpListener,
    path: String,
    registry: Arc<Registry>,
}

impl BoundScrapeServer {
    /// The address the server is actually listening on.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serve scrapes until the shutdown signal fires.
    ///
    /// Per-connection errors are logged and do not stop the accept loop.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        let listener = self.listener;
        let registry = self.registry;
        let path = Arc::new(self.path);

        loop {
            tokio::select! {
                accept_result = listener.accept() => {
                    match accept_result {
                        Ok((stream, _addr)) => {
                            let registry = Arc::clone(&registry);
                            let path = Arc::clone(&path);

                            tokio::spawn(async move {
                                let io = TokioIo::new(stream);
                                let service = service_fn(move |req| {
                                    let registry = Arc::clone(&registry);
                                    let path = Arc::clone(&path);
                                    async move {
                                        handle_request(req, &registry, &path)
                                    }
                                });

                                if let Err(e) = http1::Builder::new()
                                    .serve_connection(io, service)
                                    .await
                                {
                                    debug!(error = %e, "scrape connection error");
                                }
                            });
                        }
                        Err(e) => {
                            error!(error = %e, "failed to accept scrape connection");
                        }
                    }
                }

                _ = shutdown.recv() => {
                    info!("scrape server shutting down");
                    break;
                }
            }
        }
    }
}

/// Handle one incoming scrape request.
fn handle_request<B>(
    req: Request<B>,
    registry: &Registry,
    metrics_path: &str,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let path = req.uri().path();
    let method = req.method();

    debug!(path = %path, method = %method, "scrape request");

    if method != Method::GET {
        return Ok(Response::builder()
            .status(StatusCode::METHOD_NOT_ALLOWED)
            .body(Full::new(Bytes::from("Method not allowed\n")))
            .unwrap());
    }

    if path == metrics_path {
        if let Err(e) = registry.inc_counter(SCRAPES_TOTAL, LabelSet::empty(), 1) {
            error!(error = %e, "failed to count scrape");
        }

        match render_metrics(registry) {
            Ok((body, content_type)) => Ok(Response::builder()
                .status(StatusCode::OK)
                .header("content-type", content_type)
                .body(Full::new(body))
                .unwrap()),
            Err(e) => {
                error!(error = %e, "failed to render metrics");
                Ok(Response::builder()
                    .status(StatusCode::INTERNAL_SERVER_ERROR)
                    .body(Full::new(Bytes::from("Failed to render metrics\n")))
                    .unwrap())
            }
        }
    } else if path == "/health" || path == "/healthz" {
        Ok(Response::builder()
            .status(StatusCode::OK)
            .body(Full::new(Bytes::from("OK\n")))
            .unwrap())
    } else if path == "/" {
        let body = format!(
            "metrod scrape server\n\nEndpoints:\n  {} - metrics exposition\n  /health - health check\n",
            metrics_path
        );
        Ok(Response::builder()
            .status(StatusCode::OK)
            .header("content-type", "text/plain")
            .body(Full::new(Bytes::from(body)))
            .unwrap())
    } else {
        Ok(Response::builder()
            .status(StatusCode::NOT_FOUND)
            .body(Full::new(Bytes::from("Not found\n")))
            .unwrap())
    }
}
