//! HTTP surface: `POST /generate` and `GET /health`

use std::any::Any;
use std::sync::Arc;
use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::{DefaultBodyLimit, State};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use log::{error, info, warn};
use tokio::net::TcpListener;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{self, CorsLayer};
use crate::client::Gateway;
use crate::error::Error;
use crate::response::GatewayResponse;

pub async fn health() -> &'static str
{   "OK"
}

/// The body is taken raw so that malformed JSON and oversized bodies get
/// the gateway's own envelope instead of the extractor's plain-text one.
pub async fn generate(
  State(gateway): State<Arc<Gateway>>
, body: Result<Bytes, BytesRejection>
) -> GatewayResponse
{   match body
    {   Ok(body) => gateway.handle(&body).await
      , Err(rejection) => {
          warn!("Rejected request body: {}", rejection.body_text());
          GatewayResponse::rejected(rejection.status())
        }
    }
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response
{   let detail = if let Some(s) = err.downcast_ref::<String>()
    {   s.as_str()
    } else if let Some(s) = err.downcast_ref::<&str>()
    {   *s
    } else
    {   "unknown panic"
    };
    error!("Unhandled error in request handler: {}", detail);
    GatewayResponse::internal().into_response()
}

/// Build the application router around a shared gateway
pub fn router(gateway: Arc<Gateway>) -> Router
{   let max_payload = gateway.config().server.max_payload_bytes;
    Router::new()
      .route("/generate", post(generate))
      .route("/health", get(health))
      .layer(DefaultBodyLimit::max(max_payload))
      .layer(CatchPanicLayer::custom(handle_panic))
      .layer(
        CorsLayer::new()
          .allow_origin(cors::Any)
          .allow_headers(cors::Any)
          .allow_methods(cors::Any),
      )
      .with_state(gateway)
}

/// Bind the configured address and serve until the process exits
pub async fn serve(gateway: Arc<Gateway>) -> Result<(), Error>
{   let addr = format!(
      "{}:{}",
      gateway.config().server.host,
      gateway.config().server.port
    );
    let listener = TcpListener::bind(&addr).await.map_err(|e| {
      Error::InvalidConfiguration(
        format!("failed to bind {}: {}", addr, e)
      )
    })?;
    info!("Listening on http://{}", addr);
    axum::serve(listener, router(gateway))
      .await
      .map_err(|e| Error::Other(format!("server error: {}", e)))
}
