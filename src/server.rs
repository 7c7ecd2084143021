//! HTTP adapter serving the chat-completion compatible API.
//!
//! Routes:
//! - `POST /v1/chat/completions`, `POST /chat/completions`
//! - `GET /v1/models`, `GET /models`
//! - `GET /health`
//! - `POST /analyze-code` (`{"code": ...}` -> `{"suggestions": [...]}`)

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use http_body_util::{BodyExt, Full};
use hyper::body::{Body, Bytes, Incoming};
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use crate::analyze::{Analyzer, Finding};
use crate::chat::{self, AnalysisRequest, AnalysisResponse, ChatCompletionRequest};
use crate::config::Settings;
use crate::validate::validate_code_size;

/// API errors, rendered as `{"error": {"message": ..., "type": ...}}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Bad request: {message}")]
    BadRequest { message: String },

    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Method not allowed: {message}")]
    MethodNotAllowed { message: String },

    #[error("Payload too large: {message}")]
    PayloadTooLarge { message: String },

    #[error("Internal server error: {message}")]
    InternalServerError { message: String },

    #[error("Serde JSON error: {0}")]
    SerdeJsonError(#[from] serde_json::Error),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::InternalServerError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::SerdeJsonError(_) => StatusCode::BAD_REQUEST,
        }
    }

    pub fn error_type(&self) -> &'static str {
        match self {
            ApiError::BadRequest { .. } => "bad_request",
            ApiError::NotFound { .. } => "not_found",
            ApiError::MethodNotAllowed { .. } => "method_not_allowed",
            ApiError::PayloadTooLarge { .. } => "payload_too_large",
            ApiError::InternalServerError { .. } => "internal_server_error",
            ApiError::SerdeJsonError(_) => "invalid_json",
        }
    }

    fn into_response(self) -> Response<Full<Bytes>> {
        let body = serde_json::json!({
            "error": {
                "message": self.to_string(),
                "type": self.error_type(),
            }
        });
        json_response(self.status_code(), &body)
    }
}

/// Shared state for request handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    analyzer: Analyzer,
    model_id: String,
    max_code_size: usize,
}

impl AppState {
    pub fn new(settings: &Settings) -> Self {
        Self {
            analyzer: settings.analyzer(),
            model_id: settings.model_id.clone(),
            max_code_size: settings.max_code_size,
        }
    }

    /// Analyze on the blocking pool so parsing never stalls the reactor.
    async fn analyze(&self, code: String) -> Result<Vec<Finding>, ApiError> {
        validate_code_size(&code, self.max_code_size)
            .map_err(|message| ApiError::PayloadTooLarge { message })?;

        let analyzer = self.analyzer.clone();
        tokio::task::spawn_blocking(move || analyzer.analyze(&code))
            .await
            .map_err(|e| ApiError::InternalServerError {
                message: format!("analysis task failed: {}", e),
            })
    }
}

/// Route a request to its handler. Errors become JSON error responses.
pub async fn route<B>(state: &AppState, req: Request<B>) -> Response<Full<Bytes>>
where
    B: Body,
    B::Error: std::fmt::Display,
{
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    debug!("Routing request: {} {}", method, path);

    let result = match (method.clone(), path.as_str()) {
        (Method::POST, "/v1/chat/completions" | "/chat/completions") => {
            chat_completion(state, req).await
        }
        (Method::GET, "/v1/models" | "/models") => {
            Ok(json_response(StatusCode::OK, &chat::model_list(&state.model_id)))
        }
        (Method::GET, "/health") => Ok(json_response(StatusCode::OK, &chat::health(&state.model_id))),
        (Method::POST, "/analyze-code") => analyze_code(state, req).await,
        (
            _,
            "/v1/chat/completions" | "/chat/completions" | "/v1/models" | "/models" | "/health"
            | "/analyze-code",
        ) => Err(ApiError::MethodNotAllowed {
            message: format!("{} {}", method, path),
        }),
        _ => Err(ApiError::NotFound { message: path.clone() }),
    };

    match result {
        Ok(response) => response,
        Err(e) => {
            warn!("Request {} {} failed: {}", method, path, e);
            e.into_response()
        }
    }
}

async fn chat_completion<B>(state: &AppState, req: Request<B>) -> Result<Response<Full<Bytes>>, ApiError>
where
    B: Body,
    B::Error: std::fmt::Display,
{
    let request: ChatCompletionRequest = read_json(req).await?;
    let code = request
        .code()
        .ok_or_else(|| ApiError::BadRequest {
            message: chat::ChatError::NoMessages.to_string(),
        })?
        .to_string();

    let findings = state.analyze(code.clone()).await?;
    let response = chat::build_response(&code, &findings, &state.model_id, std::time::SystemTime::now());
    Ok(json_response(StatusCode::OK, &response))
}

async fn analyze_code<B>(state: &AppState, req: Request<B>) -> Result<Response<Full<Bytes>>, ApiError>
where
    B: Body,
    B::Error: std::fmt::Display,
{
    let request: AnalysisRequest = read_json(req).await?;
    let suggestions = state.analyze(request.code).await?;
    Ok(json_response(StatusCode::OK, &AnalysisResponse { suggestions }))
}

async fn read_json<T, B>(req: Request<B>) -> Result<T, ApiError>
where
    T: DeserializeOwned,
    B: Body,
    B::Error: std::fmt::Display,
{
    let bytes = req
        .into_body()
        .collect()
        .await
        .map_err(|e| ApiError::BadRequest {
            message: format!("failed to read request body: {}", e),
        })?
        .to_bytes();
    Ok(serde_json::from_slice(&bytes)?)
}

fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<Full<Bytes>> {
    let (status, payload) = match serde_json::to_vec(body) {
        Ok(payload) => (status, payload),
        Err(e) => {
            error!("Failed to serialize response: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                br#"{"error":{"message":"serialization failed","type":"internal_server_error"}}"#.to_vec(),
            )
        }
    };

    let mut response = Response::new(Full::new(Bytes::from(payload)));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

/// Serve the API until Ctrl-C.
pub async fn run(settings: Settings) -> anyhow::Result<()> {
    let bind_address: SocketAddr = settings
        .bind_address
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid bind address {:?}: {}", settings.bind_address, e))?;

    let listener = TcpListener::bind(bind_address).await?;
    let state = Arc::new(AppState::new(&settings));

    info!("Python code advisor listening on http://{}", bind_address);
    info!("Serving model {}", state.model_id);

    loop {
        let (stream, remote_addr) = tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok(conn) => conn,
                Err(e) => {
                    error!("Failed to accept connection: {}", e);
                    continue;
                }
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down");
                return Ok(());
            }
        };

        let io = TokioIo::new(stream);
        let state = state.clone();

        tokio::task::spawn(async move {
            let service = service_fn(move |req: Request<Incoming>| {
                let state = state.clone();
                async move { Ok::<_, Infallible>(route(&state, req).await) }
            });

            if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                error!("Error serving connection from {}: {}", remote_addr, err);
            }
        });
    }
}
