pub use crate::common::RouteResult;

use std::{path::Path, sync::Arc};

use axum::{
    routing::{get_service, MethodRouter},
    Router,
};
use directory::{client::Client, database::Database};
use tokio::net::TcpListener;
use tower_cookies::CookieManagerLayer;
use tower_http::{
    services::{ServeDir, ServeFile},
    trace::{DefaultMakeSpan, TraceLayer},
};

use crate::{config::WebConfig, session::Sessions};

pub mod api;
pub mod common;
pub mod config;
pub mod hateoas;
pub mod middleware;
pub mod session;

#[derive(Clone)]
pub struct WebState<D>
where
    D: Database + 'static,
{
    pub lab_client: Client<D>,
    pub sessions: Arc<Sessions>,
}

impl<D> WebState<D>
where
    D: Database + 'static,
{
    pub fn new(lab_client: Client<D>, sessions: Sessions) -> Self {
        Self {
            lab_client,
            sessions: Arc::new(sessions),
        }
    }
}

/// The complete application: the json api below `/api` and the static
/// front-end for every other path.
pub fn router<D>(state: WebState<D>, static_dir: &Path) -> Router
where
    D: Database + 'static,
{
    Router::new()
        .nest_service("/api", api::routes(state))
        .fallback_service(static_content(static_dir))
        .layer(CookieManagerLayer::new())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(tracing::Level::INFO)),
        )
}

pub async fn start_web_server<D>(config: WebConfig, state: WebState<D>) -> std::io::Result<()>
where
    D: Database + 'static,
{
    let routes = router(state, &config.static_dir);

    let listener = TcpListener::bind(&config.bind_address).await?;
    log::info!("listening on {}", config.bind_address);
    axum::serve(listener, routes.into_make_service()).await?;

    Ok(())
}

fn static_content(static_dir: &Path) -> MethodRouter {
    get_service(
        ServeDir::new(static_dir)
            .not_found_service(ServeFile::new(static_dir.join("error404.html"))),
    )
}
