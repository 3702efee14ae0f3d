//! demos/mock_service.rs
//! Stand-in for one of the monitored APIs.
//! Run: cargo run --example mock_service -- <neuro|trends> [port]

use hyper::{
    service::{make_service_fn, service_fn},
    Body, Method, Request, Response, Server, StatusCode,
};
use rand::Rng;
use std::{
    convert::Infallible,
    net::SocketAddr,
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};
use tokio::time::sleep;

#[derive(Clone, Copy, PartialEq)]
enum Kind {
    Neuro,
    Trends,
}

#[derive(Clone)]
struct MockState {
    kind: Kind,
    req_counter: Arc<AtomicU64>,
    healthy_flag: Arc<AtomicBool>,
    jitter_ms: u64,
}

fn json(status: StatusCode, body: serde_json::Value) -> Response<Body> {
    let mut response = Response::new(Body::from(body.to_string()));
    *response.status_mut() = status;
    response.headers_mut().insert(
        hyper::header::CONTENT_TYPE,
        hyper::header::HeaderValue::from_static("application/json"),
    );
    response
}

async fn handle(req: Request<Body>, state: MockState) -> Result<Response<Body>, Infallible> {
    state.req_counter.fetch_add(1, Ordering::SeqCst);

    if state.jitter_ms > 0 {
        let delay = rand::thread_rng().gen_range(0..=state.jitter_ms);
        sleep(Duration::from_millis(delay)).await;
    }

    let timestamp = chrono::Utc::now().to_rfc3339();
    let response = match (req.method(), req.uri().path(), state.kind) {
        (&Method::GET, "/health", _) if !state.healthy_flag.load(Ordering::SeqCst) => json(
            StatusCode::SERVICE_UNAVAILABLE,
            serde_json::json!({"detail": "unhealthy"}),
        ),
        (&Method::GET, "/health", Kind::Neuro) => json(
            StatusCode::OK,
            serde_json::json!({"version": "1.0.0", "model_loaded": true, "timestamp": timestamp}),
        ),
        (&Method::GET, "/health", Kind::Trends) => json(
            StatusCode::OK,
            serde_json::json!({
                "version": "1.0.0",
                "services": {"database": "up", "redis": "up", "kafka": "up"},
                "timestamp": timestamp
            }),
        ),
        (&Method::POST, "/predict/tabular", Kind::Neuro) => json(
            StatusCode::OK,
            serde_json::json!({"prediction": "MCI", "confidence": 0.78}),
        ),
        (&Method::GET, "/topics/top", Kind::Trends) => json(
            StatusCode::OK,
            serde_json::json!({"topics": [
                {"topic_id": 1, "keywords": ["rust", "async"]},
                {"topic_id": 2, "keywords": ["tokio", "hyper"]}
            ]}),
        ),
        _ => json(StatusCode::NOT_FOUND, serde_json::json!({"detail": "Not Found"})),
    };

    Ok(response)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let kind = match std::env::args().nth(1).as_deref() {
        Some("trends") => Kind::Trends,
        _ => Kind::Neuro,
    };
    let default_port = if kind == Kind::Trends { 9002 } else { 9001 };
    let port: u16 = match std::env::args().nth(2) {
        Some(arg) => arg.parse()?,
        None => default_port,
    };
    let jitter_ms = std::env::var("JITTER_MS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);
    let flip_secs: u64 = std::env::var("FLIP_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);

    let state = MockState {
        kind,
        req_counter: Arc::new(AtomicU64::new(0)),
        healthy_flag: Arc::new(AtomicBool::new(true)),
        jitter_ms,
    };

    // Optionally toggle health so the dashboard has something to show
    if flip_secs > 0 {
        let st = state.clone();
        tokio::spawn(async move {
            loop {
                sleep(Duration::from_secs(flip_secs)).await;
                let cur = st.healthy_flag.load(Ordering::SeqCst);
                st.healthy_flag.store(!cur, Ordering::SeqCst);
                println!(
                    "health flipped -> {} after {} requests",
                    if !cur { "healthy" } else { "unhealthy" },
                    st.req_counter.load(Ordering::SeqCst)
                );
            }
        });
    }

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let make_svc = make_service_fn(move |_conn| {
        let st = state.clone();
        async move { Ok::<_, Infallible>(service_fn(move |req| handle(req, st.clone()))) }
    });

    println!("Mock service on http://{}  [jitter={}ms flip={}s]", addr, jitter_ms, flip_secs);

    Server::bind(&addr).serve(make_svc).await?;
    Ok(())
}
