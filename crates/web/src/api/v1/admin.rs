use std::sync::Arc;

use axum::{
    extract::{OriginalUri, Path, State},
    http::{Method, StatusCode},
    routing::{get, on},
    Extension, Json, Router,
};
use directory::database::Database;
use model::{
    lab::{Lab, LabPayload},
    WithId,
};
use utility::{id::Id, let_also::LetAlso};

use crate::{
    common::{
        route_not_found, schema, HateoasResult, RouteErrorResponse, RouteResult,
        Success, VecResponse, METHOD_FILTER_ALL,
    },
    hateoas,
    middleware::base_url::BaseUrl,
    session::AdminSession,
    WebState,
};

use super::labs::lab_hateoas;

pub(crate) fn routes<D>(state: WebState<D>) -> Router
where
    D: Database + 'static,
{
    Router::new()
        .route("/labs/schema", get(schema::<LabPayload>))
        .route(
            "/labs/:id",
            get(get_lab::<D>).put(update_lab::<D>).delete(delete_lab::<D>),
        )
        .route("/labs", get(get_labs::<D>).post(create_lab::<D>))
        .with_state(state)
        .fallback_service(on(METHOD_FILTER_ALL, route_not_found))
}

async fn get_labs<D: Database + 'static>(
    OriginalUri(original_uri): OriginalUri,
    AdminSession(_admin): AdminSession,
    State(WebState { lab_client, .. }): State<WebState<D>>,
    Extension(base_url): Extension<Arc<BaseUrl>>,
) -> HateoasResult<VecResponse<hateoas::Response<WithId<Lab>>>> {
    lab_client
        .get_labs_for_admin()
        .await
        .map(|labs| {
            labs.into_iter()
                .map(|lab| lab_hateoas(lab, base_url.clone()))
                .collect::<Vec<_>>()
                .let_owned(|data| VecResponse::new(data).hateoas().json())
        })
        .map_err(|why| {
            RouteErrorResponse::from(why)
                .with_method(&Method::GET)
                .with_uri(original_uri.path())
        })
}

async fn get_lab<D: Database + 'static>(
    OriginalUri(original_uri): OriginalUri,
    AdminSession(_admin): AdminSession,
    Path(id): Path<String>,
    State(WebState { lab_client, .. }): State<WebState<D>>,
    Extension(base_url): Extension<Arc<BaseUrl>>,
) -> HateoasResult<WithId<Lab>> {
    lab_client
        .get_lab(Id::new(id))
        .await
        .map(|lab| lab_hateoas(lab, base_url).json())
        .map_err(|why| {
            RouteErrorResponse::from(why)
                .with_method(&Method::GET)
                .with_uri(original_uri.path())
        })
}

async fn create_lab<D: Database + 'static>(
    OriginalUri(original_uri): OriginalUri,
    AdminSession(admin): AdminSession,
    State(WebState { lab_client, .. }): State<WebState<D>>,
    Extension(base_url): Extension<Arc<BaseUrl>>,
    Json(payload): Json<LabPayload>,
) -> RouteResult<(StatusCode, Json<hateoas::Response<WithId<Lab>>>)> {
    lab_client
        .create_lab(&admin, payload)
        .await
        .map(|lab| (StatusCode::CREATED, lab_hateoas(lab, base_url).json()))
        .map_err(|why| {
            RouteErrorResponse::from(why)
                .with_method(&Method::POST)
                .with_uri(original_uri.path())
        })
}

async fn update_lab<D: Database + 'static>(
    OriginalUri(original_uri): OriginalUri,
    AdminSession(admin): AdminSession,
    Path(id): Path<String>,
    State(WebState { lab_client, .. }): State<WebState<D>>,
    Extension(base_url): Extension<Arc<BaseUrl>>,
    Json(payload): Json<LabPayload>,
) -> HateoasResult<WithId<Lab>> {
    lab_client
        .update_lab(&admin, Id::new(id), payload)
        .await
        .map(|lab| lab_hateoas(lab, base_url).json())
        .map_err(|why| {
            RouteErrorResponse::from(why)
                .with_method(&Method::PUT)
                .with_uri(original_uri.path())
        })
}

async fn delete_lab<D: Database + 'static>(
    OriginalUri(original_uri): OriginalUri,
    AdminSession(admin): AdminSession,
    Path(id): Path<String>,
    State(WebState { lab_client, .. }): State<WebState<D>>,
) -> RouteResult<Json<Success>> {
    lab_client
        .delete_lab(&admin, Id::new(id))
        .await
        .map(|_| Success::json())
        .map_err(|why| {
            RouteErrorResponse::from(why)
                .with_method(&Method::DELETE)
                .with_uri(original_uri.path())
        })
}
