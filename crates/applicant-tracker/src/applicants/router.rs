use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use super::cache::PageCache;
use super::domain::{ApplicantId, ApplicantPatch, ApplicantSubmission, PageRequest};
use super::repository::ApplicantRepository;
use super::service::{ApplicantService, ApplicantServiceError};

/// Router builder exposing the applicant CRUD endpoints.
pub fn applicant_router<R, C>(service: Arc<ApplicantService<R, C>>) -> Router
where
    R: ApplicantRepository + 'static,
    C: PageCache + 'static,
{
    Router::new()
        .route(
            "/applicants",
            post(create_handler::<R, C>).get(list_handler::<R, C>),
        )
        .route(
            "/applicants/:id",
            get(get_handler::<R, C>)
                .put(update_handler::<R, C>)
                .delete(delete_handler::<R, C>),
        )
        .with_state(service)
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ListParams {
    page: Option<String>,
    limit: Option<String>,
}

fn error_response(status: StatusCode, message: &str, uri: &Uri) -> Response {
    let payload = json!({
        "error": message,
        "path": uri.path(),
    });
    (status, Json(payload)).into_response()
}

fn service_error_response(err: ApplicantServiceError, uri: &Uri) -> Response {
    let status = match &err {
        ApplicantServiceError::Validation(_) => StatusCode::BAD_REQUEST,
        ApplicantServiceError::Conflict => StatusCode::CONFLICT,
        ApplicantServiceError::NotFound => StatusCode::NOT_FOUND,
        ApplicantServiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    error_response(status, &err.to_string(), uri)
}

fn invalid_body(rejection: JsonRejection, uri: &Uri) -> Response {
    warn!(path = uri.path(), error = %rejection.body_text(), "failed to parse request body");
    error_response(StatusCode::BAD_REQUEST, "Invalid request body", uri)
}

/// Identifiers that are not integers cannot exist in the store.
fn parse_id(raw: &str) -> Result<ApplicantId, ApplicantServiceError> {
    raw.trim()
        .parse::<i64>()
        .map(ApplicantId)
        .map_err(|_| ApplicantServiceError::NotFound)
}

pub(crate) async fn create_handler<R, C>(
    State(service): State<Arc<ApplicantService<R, C>>>,
    uri: Uri,
    body: Result<Json<ApplicantSubmission>, JsonRejection>,
) -> Response
where
    R: ApplicantRepository + 'static,
    C: PageCache + 'static,
{
    let Json(submission) = match body {
        Ok(body) => body,
        Err(rejection) => return invalid_body(rejection, &uri),
    };

    match service.create(submission).await {
        Ok(applicant) => (StatusCode::CREATED, Json(applicant)).into_response(),
        Err(err) => service_error_response(err, &uri),
    }
}

pub(crate) async fn list_handler<R, C>(
    State(service): State<Arc<ApplicantService<R, C>>>,
    uri: Uri,
    query: Result<Query<ListParams>, QueryRejection>,
) -> Response
where
    R: ApplicantRepository + 'static,
    C: PageCache + 'static,
{
    let request = match query {
        Ok(Query(params)) => {
            PageRequest::from_query(params.page.as_deref(), params.limit.as_deref())
        }
        Err(rejection) => {
            warn!(
                path = uri.path(),
                error = %rejection.body_text(),
                "ignoring unreadable query string"
            );
            PageRequest::default()
        }
    };
    match service.list(request).await {
        Ok(page) => (StatusCode::OK, Json(page)).into_response(),
        Err(err) => service_error_response(err, &uri),
    }
}

pub(crate) async fn get_handler<R, C>(
    State(service): State<Arc<ApplicantService<R, C>>>,
    uri: Uri,
    Path(id): Path<String>,
) -> Response
where
    R: ApplicantRepository + 'static,
    C: PageCache + 'static,
{
    let result = match parse_id(&id) {
        Ok(id) => service.get(id).await,
        Err(err) => Err(err),
    };

    match result {
        Ok(applicant) => (StatusCode::OK, Json(applicant)).into_response(),
        Err(err) => service_error_response(err, &uri),
    }
}

pub(crate) async fn update_handler<R, C>(
    State(service): State<Arc<ApplicantService<R, C>>>,
    uri: Uri,
    Path(id): Path<String>,
    body: Result<Json<ApplicantPatch>, JsonRejection>,
) -> Response
where
    R: ApplicantRepository + 'static,
    C: PageCache + 'static,
{
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(err) => return service_error_response(err, &uri),
    };
    let Json(patch) = match body {
        Ok(body) => body,
        Err(rejection) => {
            // A missing record wins over an unreadable body.
            if let Err(err) = service.get(id).await {
                return service_error_response(err, &uri);
            }
            return invalid_body(rejection, &uri);
        }
    };

    match service.update(id, patch).await {
        Ok(applicant) => (StatusCode::OK, Json(applicant)).into_response(),
        Err(err) => service_error_response(err, &uri),
    }
}

pub(crate) async fn delete_handler<R, C>(
    State(service): State<Arc<ApplicantService<R, C>>>,
    uri: Uri,
    Path(id): Path<String>,
) -> Response
where
    R: ApplicantRepository + 'static,
    C: PageCache + 'static,
{
    let result = match parse_id(&id) {
        Ok(id) => service.delete(id).await,
        Err(err) => Err(err),
    };

    match result {
        Ok(()) => {
            let payload = json!({ "message": "Applicant deleted successfully" });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(err) => service_error_response(err, &uri),
    }
}
