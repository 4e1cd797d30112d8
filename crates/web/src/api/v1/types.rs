use axum::{
    extract::{OriginalUri, State},
    http::Method,
    routing::{get, on},
    Json, Router,
};
use directory::database::Database;
use model::{lab_type::LabType, WithId};

use crate::{
    common::{route_not_found, RouteErrorResponse, RouteResult, VecResponse, METHOD_FILTER_ALL},
    WebState,
};

pub(crate) fn routes<D>(state: WebState<D>) -> Router
where
    D: Database + 'static,
{
    Router::new()
        .route("/", get(get_lab_types::<D>))
        .with_state(state)
        .fallback_service(on(METHOD_FILTER_ALL, route_not_found))
}

/// Every known lab type, also the ones no lab uses anymore. The admin form
/// offers these as suggestions.
async fn get_lab_types<D: Database + 'static>(
    OriginalUri(original_uri): OriginalUri,
    State(WebState { lab_client, .. }): State<WebState<D>>,
) -> RouteResult<Json<VecResponse<WithId<LabType>>>> {
    lab_client
        .get_lab_types()
        .await
        .map(|types| VecResponse::new(types).json())
        .map_err(|why| {
            RouteErrorResponse::from(why)
                .with_method(&Method::GET)
                .with_uri(original_uri.path())
        })
}
