//! HTTP front end: routes, shared state and server setup.

use std::num::NonZeroU16;
use std::sync::Arc;

use axum::Router;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};
use tracing::{error, info};

use crate::catalog::Catalog;
use crate::constants::SESSION_INACTIVITY_HOURS;
use crate::fonts::FontBook;
use crate::generator::ImageGenerator;
use crate::session::Studios;

mod captions;
mod csrf;
mod designs;
pub(crate) mod flash;
mod gallery;
mod images;
mod middleware;
mod prelude;
mod views;

#[derive(Clone, Debug)]
pub(crate) struct AppState {
    catalog: Arc<Catalog>,
    fonts: Arc<FontBook>,
    generator: ImageGenerator,
    studios: Arc<Studios>,
}

impl AppState {
    pub(crate) fn new(catalog: Catalog, fonts: FontBook, generator: ImageGenerator) -> Self {
        Self {
            catalog: Arc::new(catalog),
            fonts: Arc::new(fonts),
            generator,
            studios: Arc::new(Studios::default()),
        }
    }
}

fn create_router() -> Router<AppState> {
    let sessions = SessionManagerLayer::new(MemoryStore::default())
        .with_secure(false)
        .with_expiry(Expiry::OnInactivity(time::Duration::hours(
            SESSION_INACTIVITY_HOURS,
        )));

    Router::new()
        .route("/", axum::routing::get(views::create_page))
        .route("/generate", axum::routing::post(views::generate_handler))
        .route("/remix", axum::routing::post(views::remix_handler))
        .route("/surprise", axum::routing::post(views::surprise_handler))
        .route("/templates", axum::routing::get(gallery::templates_page))
        .route(
            "/templates/select",
            axum::routing::post(gallery::select_template_handler),
        )
        .route("/designs", axum::routing::get(designs::history_page))
        .route(
            "/designs/clear",
            axum::routing::post(designs::clear_history_handler),
        )
        .route("/designs/{id}", axum::routing::get(designs::design_page))
        .route(
            "/designs/{id}/download/{format}",
            axum::routing::get(designs::download_handler),
        )
        .route(
            "/captions",
            axum::routing::get(captions::captions_page).post(captions::captions_handler),
        )
        .route("/static/styles.css", axum::routing::get(styles_handler))
        .layer(sessions)
        .layer(TraceLayer::new_for_http())
}

async fn styles_handler() -> impl IntoResponse {
    const STYLES: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/static/styles.css"));
    ([(CONTENT_TYPE, "text/css")], STYLES)
}

/// Starts the web server and serves until it fails.
pub async fn setup_server(
    listen_addr: &str,
    port: NonZeroU16,
    catalog: Catalog,
    fonts: FontBook,
    generator: ImageGenerator,
) -> Result<(), anyhow::Error> {
    let app = create_router().with_state(AppState::new(catalog, fonts, generator));

    let addr = format!("{}:{}", listen_addr, port);
    info!("Starting server on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    if let Err(err) = axum::serve(listener, app).await {
        error!("Server error: {}", err);
    }
    Ok(())
}
