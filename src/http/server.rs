//! HTTP server setup and alarm handlers.
//!
//! # Responsibilities
//! - Create the Axum router with the alarm endpoints
//! - Serve HTTP/1.1 and cleartext HTTP/2 on one listener
//! - Wire up middleware (request ID, tracing, timeout, body limit)
//! - Validate alarm payloads, check the shared token, hand mail to the mailer
//!
//! # Design Decisions
//! - Timeouts and oversized bodies are answered with the same JSON error
//!   body as handler failures

use std::sync::Arc;

use axum::{
    body::Bytes,
    error_handling::HandleErrorLayer,
    extract::{rejection::BytesRejection, DefaultBodyLimit, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    BoxError, Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::{timeout::error::Elapsed, timeout::TimeoutLayer, ServiceBuilder};
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::alarm::{AlarmMail, AlarmParams, Mailer};
use crate::config::HttpSettings;
use crate::http::request::{request_id, MakeRequestUuid};
use crate::http::response::AppError;
use crate::observability::metrics;
use crate::validation::Validator;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub validator: Validator,
    pub mailer: Arc<dyn Mailer>,
    /// `From` address of alarm mails.
    pub sender: Arc<str>,
    pub receivers: Arc<[String]>,
    /// Shared secret every alarm must carry.
    pub token: Arc<str>,
}

/// HTTP server for the alarm relay.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server.
    pub fn new(state: AppState, settings: &HttpSettings) -> Self {
        Self {
            router: Self::build_router(state, settings),
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState, settings: &HttpSettings) -> Router {
        Router::new()
            .route("/ping", get(ping))
            .route("/alarms", post(send_alarm))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(HandleErrorLayer::new(middleware_error))
                    .layer(TimeoutLayer::new(settings.timeout))
                    .layer(DefaultBodyLimit::max(settings.body_limit)),
            )
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn ping() -> &'static str {
    "pong"
}

/// Render failures raised by the middleware stack itself.
async fn middleware_error(err: BoxError) -> AppError {
    if err.is::<Elapsed>() {
        tracing::warn!("Request timed out");
        AppError::Timeout
    } else {
        tracing::error!(error = %err, "Unhandled middleware error");
        AppError::Internal(err.to_string())
    }
}

/// `POST /alarms`: validate, authenticate, send.
async fn send_alarm(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<StatusCode, AppError> {
    let request_id = request_id(&headers);
    let mut params = AlarmParams::default();

    let result = match body {
        Ok(body) => deliver(&state, &mut params, &body).await,
        Err(rejection) => Err(rejection.into()),
    };
    match &result {
        Ok(()) => {
            metrics::record_alarm("sent");
            tracing::info!(
                request_id = %request_id,
                service = %params.service,
                category = %params.category,
                result = 0,
                "tracker"
            );
        }
        Err(err) => {
            metrics::record_alarm(outcome(err));
            tracing::info!(
                request_id = %request_id,
                service = %params.service,
                category = %params.category,
                result = 1,
                error = %err,
                "tracker"
            );
        }
    }

    result.map(|()| StatusCode::NO_CONTENT)
}

async fn deliver(state: &AppState, params: &mut AlarmParams, body: &[u8]) -> Result<(), AppError> {
    state.validator.validate(params, body)?;

    if params.token != *state.token {
        return Err(AppError::InvalidToken);
    }

    let mail = AlarmMail::from_params(&state.sender, &state.receivers, params);
    if let Err(err) = state.mailer.send(&mail).await {
        metrics::record_mail_failure();
        tracing::error!(error = %err, subject = %mail.subject, "Failed to send alarm mail");
        return Err(err.into());
    }
    Ok(())
}

fn outcome(err: &AppError) -> &str {
    match err {
        AppError::Validation(err) => err.category(),
        AppError::InvalidToken => "invalid-token",
        AppError::Mail(_) => "mail",
        AppError::Body(_) => "body",
        AppError::Timeout => "timeout",
        AppError::Internal(_) => "internal",
    }
}
