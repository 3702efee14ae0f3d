// ────────────────────────────────
// src/server/builder.rs
// ────────────────────────────────
use anyhow::{Context, Result};
use hyper::{server::conn::Http, Body, Request, Response};
use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tower::Service;

const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Builder pattern so `main.rs` can inject the dashboard handler.
pub struct ServerBuilder<H>
where
    H: Service<Request<Body>, Response = Response<Body>> + Send + Clone + 'static,
    H::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    H::Future: Send + 'static,
{
    addr: SocketAddr,
    handler: Option<H>,
}

impl<H> ServerBuilder<H>
where
    H: Service<Request<Body>, Response = Response<Body>> + Send + Clone + 'static,
    H::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    H::Future: Send + 'static,
{
    pub fn new(addr: SocketAddr) -> Self {
        Self { addr, handler: None }
    }

    pub fn with_handler(mut self, handler: H) -> Self {
        self.handler = Some(handler);
        self
    }

    /// Bind the listener. Split from [`Bound::serve`] so callers can learn
    /// the actual port when binding to port 0.
    pub async fn bind(self) -> Result<Bound<H>> {
        let handler = self
            .handler
            .context("handler must be set via with_handler()")?;

        let listener = TcpListener::bind(self.addr)
            .await
            .with_context(|| format!("Failed to bind {}", self.addr))?;

        Ok(Bound { listener, handler })
    }
}

pub struct Bound<H> {
    listener: TcpListener,
    handler: H,
}

impl<H> Bound<H>
where
    H: Service<Request<Body>, Response = Response<Body>> + Send + Clone + 'static,
    H::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    H::Future: Send + 'static,
{
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept connections until `shutdown` resolves, one Tokio task per
    /// connection. Once it fires, open connections finish their in-flight
    /// request before this returns.
    pub async fn serve<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        tracing::info!("HTTP server listening on {}", self.local_addr()?);
        tokio::pin!(shutdown);

        let (drain_tx, drain_rx) = watch::channel(false);
        let mut connections = JoinSet::new();

        loop {
            let (stream, peer) = tokio::select! {
                accepted = self.listener.accept() => match accepted {
                    Ok(accepted) => accepted,
                    Err(err) => {
                        // EMFILE and friends clear up once connections close.
                        tracing::warn!(%err, "accept error");
                        tokio::time::sleep(ACCEPT_BACKOFF).await;
                        continue;
                    }
                },
                Some(_) = connections.join_next(), if !connections.is_empty() => continue,
                _ = &mut shutdown => break,
            };
            let svc = self.handler.clone();
            let mut drain = drain_rx.clone();

            connections.spawn(async move {
                let conn = Http::new().serve_connection(stream, svc);
                tokio::pin!(conn);
                let mut draining = false;

                loop {
                    tokio::select! {
                        res = conn.as_mut() => {
                            if let Err(err) = res {
                                tracing::warn!(%peer, %err, "connection error");
                            }
                            break;
                        }
                        changed = drain.changed(), if !draining => {
                            draining = true;
                            if changed.is_ok() {
                                conn.as_mut().graceful_shutdown();
                            }
                        }
                    }
                }
            });
        }

        tracing::info!(
            "HTTP server stopped accepting connections, draining {}",
            connections.len()
        );
        let _ = drain_tx.send(true);
        while connections.join_next().await.is_some() {}
        tracing::info!("HTTP server drained");
        Ok(())
    }
}
