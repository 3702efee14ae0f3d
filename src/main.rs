// src/main.rs
use anyhow::Result;
use hyper::{Body, Request, Response, Server, StatusCode};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};

use service_status_hub::{
    config,
    dashboard::Dashboard,
    metrics::MetricsRegistry,
    server::{RequestHandler, ServerBuilder},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("service_status_hub=debug".parse()?)
                .add_directive("hyper=info".parse()?),
        )
        .init();

    // Load configuration
    let config_path = std::env::args().nth(1);
    let config = Arc::new(config::resolve_config(config_path.as_deref()).await?);

    for service in &config.services {
        info!(
            "Monitoring {} at {} (ui: {})",
            service.name, service.api_url, service.ui_url
        );
    }

    // Start metrics server if enabled
    let metrics = if config.metrics.enabled {
        let registry = MetricsRegistry::new()?;
        let collector = registry.collector();
        let metrics_addr: SocketAddr = ([0, 0, 0, 0], config.metrics.port).into();
        start_metrics_server(metrics_addr, registry, config.metrics.path.clone()).await?;
        Some(collector)
    } else {
        None
    };

    let dashboard = Arc::new(Dashboard::new(config.clone(), metrics)?);
    let handler = RequestHandler::new(dashboard);

    info!("Starting dashboard on {}", config.server.listen_addr);

    ServerBuilder::new(config.server.listen_addr)
        .with_handler(handler)
        .bind()
        .await?
        .serve(shutdown_signal())
        .await?;

    info!("Dashboard stopped");
    Ok(())
}

async fn start_metrics_server(
    addr: SocketAddr,
    registry: MetricsRegistry,
    path: String,
) -> Result<()> {
    let registry = Arc::new(registry);
    let metrics_path = Arc::new(path);
    let service_path = metrics_path.clone();

    let make_service = hyper::service::make_service_fn(move |_| {
        let registry = registry.clone();
        let path = service_path.clone();

        async move {
            Ok::<_, Infallible>(hyper::service::service_fn(move |req: Request<Body>| {
                let registry = registry.clone();
                let path = path.clone();

                async move {
                    let (status, content_type, body) = if req.uri().path() != path.as_str() {
                        (StatusCode::NOT_FOUND, "text/plain", Body::from("Not Found"))
                    } else {
                        match registry.gather() {
                            Ok(metrics) => (
                                StatusCode::OK,
                                "text/plain; version=0.0.4",
                                Body::from(metrics),
                            ),
                            Err(e) => {
                                error!("Failed to encode metrics: {}", e);
                                (
                                    StatusCode::INTERNAL_SERVER_ERROR,
                                    "text/plain",
                                    Body::from("Failed to encode metrics"),
                                )
                            }
                        }
                    };

                    let mut response = Response::new(body);
                    *response.status_mut() = status;
                    response.headers_mut().insert(
                        hyper::header::CONTENT_TYPE,
                        hyper::header::HeaderValue::from_static(content_type),
                    );
                    Ok::<_, Infallible>(response)
                }
            }))
        }
    });

    let server = Server::try_bind(&addr)?.serve(make_service);

    info!(
        "Metrics server listening on http://{}{}",
        addr,
        metrics_path.as_str()
    );

    tokio::spawn(async move {
        if let Err(e) = server.await {
            error!("Metrics server error: {}", e);
        }
    });

    Ok(())
}

// Graceful shutdown handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
