// src/server/handler.rs
use hyper::header::HeaderValue;
use hyper::{Body, Request, Response};
use std::convert::Infallible;
use std::sync::Arc;
use tower::Service;
use tracing::Instrument;
use uuid::Uuid;

use crate::dashboard::Dashboard;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Clone)]
pub struct RequestHandler {
    dashboard: Arc<Dashboard>,
}

impl RequestHandler {
    pub fn new(dashboard: Arc<Dashboard>) -> Self {
        Self { dashboard }
    }
}

impl Service<Request<Body>> for RequestHandler {
    type Response = Response<Body>;
    type Error = Infallible;
    type Future = futures::future::BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &mut self,
        _cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        std::task::Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let dashboard = self.dashboard.clone();
        let request_id = Uuid::new_v4();
        let span = tracing::info_span!(
            "request",
            id = %request_id,
            method = %req.method(),
            path = %req.uri().path(),
        );

        Box::pin(
            async move {
                let mut response = match dashboard.handle(req).await {
                    Ok(response) => response,
                    Err(e) => {
                        if e.status().is_server_error() {
                            tracing::error!(%e, "dashboard error");
                        } else {
                            tracing::debug!(%e, "rejected request");
                        }
                        Response::from(e)
                    }
                };

                if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
                    response.headers_mut().insert(REQUEST_ID_HEADER, value);
                }
                tracing::debug!(status = %response.status(), "request complete");
                Ok(response)
            }
            .instrument(span),
        )
    }
}
