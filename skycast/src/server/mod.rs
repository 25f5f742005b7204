//! HTTP endpoint for the chat integration.
//!
//! Everything goes through `GET /?zip=<command>`; the reply is plain text,
//! except for stored images which are served with their own content type.

mod command;
mod service;
mod store;

use std::io;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::provider::AsyncHttpClient;

pub use command::{Command, HELP_TEXT};
pub use service::{Reply, ServerError, ServiceSettings, WeatherService};
pub use store::{ImageKind, ImageStore, StoredImage};

#[derive(Debug, Deserialize)]
struct CommandParams {
    #[serde(default)]
    zip: String,
}

/// Builds the router around a shared service.
pub fn router<C>(service: Arc<WeatherService<C>>) -> Router
where
    C: AsyncHttpClient + 'static,
{
    Router::new()
        .route("/", get(handle_command::<C>))
        .with_state(service)
}

/// Serves until `shutdown` is cancelled.
pub async fn serve<C>(
    listener: TcpListener,
    service: Arc<WeatherService<C>>,
    shutdown: CancellationToken,
) -> io::Result<()>
where
    C: AsyncHttpClient + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "Weather endpoint listening");
    }
    axum::serve(listener, router(service))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
}

async fn handle_command<C>(
    State(service): State<Arc<WeatherService<C>>>,
    Query(params): Query<CommandParams>,
) -> Response
where
    C: AsyncHttpClient + 'static,
{
    match Command::parse(&params.zip) {
        Command::Image(id) => serve_image(&service, &id),
        command => text(StatusCode::OK, service.respond(command).await),
    }
}

fn serve_image<C: AsyncHttpClient>(service: &WeatherService<C>, id: &str) -> Response {
    match service.images().get(id) {
        Some(image) => {
            debug!(id, bytes = image.bytes.len(), "Serving stored image");
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, image.kind.content_type())],
                image.bytes,
            )
                .into_response()
        }
        None => text(StatusCode::NOT_FOUND, "image not found".to_string()),
    }
}

fn text(status: StatusCode, body: String) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        body,
    )
        .into_response()
}
