use std::sync::Arc;

use axum::{
    extract::{OriginalUri, Path, State},
    http::Method,
    routing::{get, on},
    Extension, Router,
};
use directory::database::Database;
use model::{lab::Lab, WithId};
use utility::{
    id::Id,
    let_also::LetAlso,
    url::{photo_url, website_url},
};

use crate::{
    common::{
        route_not_found, schema, HateoasResult, RouteErrorResponse, VecResponse,
        METHOD_FILTER_ALL,
    },
    hateoas,
    middleware::base_url::BaseUrl,
    WebState,
};

macro_rules! resource {
    ($($arg:tt)*) => {
        crate::api::v1::resource!("/labs{}", format_args!($($arg)*))
    };
}
pub(crate) use resource;

pub(crate) fn routes<D>(state: WebState<D>) -> Router
where
    D: Database + 'static,
{
    Router::new()
        .route("/schema", get(schema::<Lab>))
        .route("/:id", get(get_lab::<D>))
        .route("/", get(get_labs::<D>))
        .with_state(state)
        .fallback_service(on(METHOD_FILTER_ALL, route_not_found))
}

async fn get_labs<D: Database + 'static>(
    OriginalUri(original_uri): OriginalUri,
    State(WebState { lab_client, .. }): State<WebState<D>>,
    Extension(base_url): Extension<Arc<BaseUrl>>,
) -> HateoasResult<VecResponse<hateoas::Response<WithId<Lab>>>> {
    lab_client
        .get_labs_for_map()
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

/// Wraps a lab with its own location and the resolved urls of its photos
/// and website.
pub(crate) fn lab_hateoas(
    lab: WithId<Lab>,
    base_url: Arc<BaseUrl>,
) -> hateoas::Response<WithId<Lab>> {
    let self_link = resource!("/{}", lab.id);
    let lab_photo = photo_url(&lab.content.lab_photo_url);
    let head1_photo = lab.content.head1_photo_url.as_deref().and_then(photo_url);
    let head2_photo = lab.content.head2_photo_url.as_deref().and_then(photo_url);
    let website = lab.content.website_url.as_deref().and_then(website_url);

    hateoas::Response::builder(lab, base_url)
        .link("self", self_link)
        .link_extern_option("labPhoto", lab_photo)
        .link_extern_option("head1Photo", head1_photo)
        .link_extern_option("head2Photo", head2_photo)
        .link_extern_option("website", website)
        .build()
}

#[cfg(test)]
mod tests {
    use axum::http::{HeaderMap, HeaderValue};
    use model::ExampleData;

    use super::*;

    #[test]
    fn links_resolve_photos_and_website() {
        let mut headers = HeaderMap::new();
        headers.insert("host", HeaderValue::from_static("peta.example"));
        let base_url = Arc::new(BaseUrl::from_headers(&headers));

        let mut lab = Lab::example_data();
        lab.head1_photo_url = Some("https://cdn.example/head.jpg".to_owned());
        let response = lab_hateoas(WithId::new(Id::new("lab-1".to_owned()), lab), base_url);

        assert_eq!(
            response.link("self"),
            Some("http://peta.example/api/v1/labs/lab-1")
        );
        assert_eq!(
            response.link("labPhoto"),
            Some("https://drive.google.com/thumbnail?id=1PWxeE1axIWMnoB_example&sz=w400")
        );
        assert_eq!(
            response.link("head1Photo"),
            Some("https://cdn.example/head.jpg")
        );
        assert_eq!(response.link("head2Photo"), None);
        assert_eq!(
            response.link("website"),
            Some("https://labkesda.jabarprov.go.id")
        );
    }
}
