use axum::{routing::on, Router};
use directory::database::Database;

use crate::{
    common::{route_not_found, METHOD_FILTER_ALL},
    middleware::base_url::base_url_middleware,
    session, WebState,
};

pub mod admin;
pub mod labs;
pub mod types;

macro_rules! resource {
    ($($arg:tt)*) => {
        crate::api::resource!("/v1{}", format_args!($($arg)*))
    };
}
pub(crate) use resource;

pub(crate) fn routes<D>(state: WebState<D>) -> Router
where
    D: Database + 'static,
{
    Router::new()
        .nest_service("/labs", labs::routes(state.clone()))
        .nest_service("/types", types::routes(state.clone()))
        .nest_service("/admin", admin::routes(state.clone()))
        .nest_service("/session", session::routes(state))
        .layer(axum::middleware::from_fn(base_url_middleware))
        .fallback_service(on(METHOD_FILTER_ALL, route_not_found))
}
