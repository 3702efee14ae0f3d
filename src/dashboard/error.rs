// src/dashboard/error.rs
use hyper::header::{HeaderValue, ALLOW, CONTENT_TYPE};
use hyper::{Body, Method, Response, StatusCode};

#[derive(Debug, thiserror::Error)]
pub enum HubError {
    #[error("No route for {0}")]
    NotFound(String),

    #[error("Unknown service {0:?}")]
    UnknownService(String),

    #[error("Method {method} not allowed for {path}")]
    MethodNotAllowed {
        method: Method,
        path: String,
        allow: &'static str,
    },

    #[error("Failed to build response: {0}")]
    Response(#[from] hyper::http::Error),

    #[error("Failed to encode status: {0}")]
    Encode(#[from] serde_json::Error),
}

impl HubError {
    pub fn status(&self) -> StatusCode {
        match self {
            HubError::NotFound(_) | HubError::UnknownService(_) => StatusCode::NOT_FOUND,
            HubError::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            HubError::Response(_) | HubError::Encode(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// Convert HubError to a plain-text response
impl From<HubError> for Response<Body> {
    fn from(err: HubError) -> Self {
        let status = err.status();
        let message = match status {
            StatusCode::INTERNAL_SERVER_ERROR => "Internal server error".to_string(),
            _ => err.to_string(),
        };

        let mut response = Response::new(Body::from(message));
        *response.status_mut() = status;
        response.headers_mut().insert(
            CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        if let HubError::MethodNotAllowed { allow, .. } = err {
            response
                .headers_mut()
                .insert(ALLOW, HeaderValue::from_static(allow));
        }
        response
    }
}
