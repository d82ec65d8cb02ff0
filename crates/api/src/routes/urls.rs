//! Shortening, redirect, listing and deletion endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::http::header::{CONTENT_TYPE, LOCATION};
use axum::response::{IntoResponse, Response};
use batch_delete::BatchDeleter;
use common::{DeletionRequest, ShortCode};
use domain::{BatchItem, LinkService, Resolution};
use serde::{Deserialize, Serialize};
use url_store::UrlStore;

use super::owner::{Owner, OwnerSigner};
use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<S: UrlStore> {
    pub links: LinkService<S>,
    pub deleter: BatchDeleter<S>,
    pub signer: OwnerSigner,
    pub base_url: String,
}

impl<S: UrlStore> AppState<S> {
    /// Renders the public short URL of a code.
    pub fn short_url(&self, code: &ShortCode) -> String {
        format!("{}/{}", self.base_url, code)
    }
}

// -- Request types --

#[derive(Deserialize)]
pub struct ShortenRequest {
    pub url: String,
}

#[derive(Deserialize)]
pub struct BatchShortenItem {
    #[serde(default)]
    pub correlation_id: Option<String>,
    pub original_url: String,
}

// -- Response types --

#[derive(Serialize)]
pub struct ShortenResponse {
    pub result: String,
}

#[derive(Serialize)]
pub struct BatchShortenedItem {
    pub correlation_id: String,
    pub short_url: String,
}

#[derive(Serialize)]
pub struct OwnedUrl {
    pub short_url: String,
    pub original_url: String,
}

fn created_or_conflict(created: bool) -> StatusCode {
    if created {
        StatusCode::CREATED
    } else {
        StatusCode::CONFLICT
    }
}

// -- Handlers --

/// POST / — shorten the URL sent as plain text.
#[tracing::instrument(skip(state, body))]
pub async fn shorten_text<S: UrlStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    owner: Owner,
    body: String,
) -> Result<Response, ApiError> {
    let shortened = state.links.shorten(&owner.0, &body).await?;

    Ok((
        created_or_conflict(shortened.created),
        [(CONTENT_TYPE, "text/plain; charset=utf-8")],
        state.short_url(&shortened.code),
    )
        .into_response())
}

/// POST /api/shorten — shorten the URL of a JSON request.
#[tracing::instrument(skip(state, req))]
pub async fn shorten_json<S: UrlStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    owner: Owner,
    Json(req): Json<ShortenRequest>,
) -> Result<(StatusCode, Json<ShortenResponse>), ApiError> {
    let shortened = state.links.shorten(&owner.0, &req.url).await?;

    Ok((
        created_or_conflict(shortened.created),
        Json(ShortenResponse {
            result: state.short_url(&shortened.code),
        }),
    ))
}

/// POST /api/shorten/batch — shorten several URLs at once.
#[tracing::instrument(skip(state, items), fields(items = items.len()))]
pub async fn shorten_batch<S: UrlStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    owner: Owner,
    Json(items): Json<Vec<BatchShortenItem>>,
) -> Result<(StatusCode, Json<Vec<BatchShortenedItem>>), ApiError> {
    if items.is_empty() {
        return Err(ApiError::BadRequest("Batch is empty".to_string()));
    }

    let items = items
        .into_iter()
        .map(|item| BatchItem {
            correlation_id: item.correlation_id,
            original_url: item.original_url,
        })
        .collect();
    let shortening = state.links.shorten_batch(&owner.0, items).await?;

    let response = shortening
        .items
        .iter()
        .map(|item| BatchShortenedItem {
            correlation_id: item.correlation_id.clone(),
            short_url: state.short_url(&item.code),
        })
        .collect();

    Ok((created_or_conflict(shortening.stored), Json(response)))
}

/// GET /{code} — redirect to the original URL.
#[tracing::instrument(skip(state))]
pub async fn redirect<S: UrlStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(code): Path<String>,
) -> Result<Response, ApiError> {
    match state.links.resolve(&ShortCode::new(code)).await? {
        Resolution::Redirect(url) => {
            Ok((StatusCode::TEMPORARY_REDIRECT, [(LOCATION, url)]).into_response())
        }
        Resolution::Gone => Ok(StatusCode::GONE.into_response()),
    }
}

/// GET /api/user/urls — list the caller's live links.
#[tracing::instrument(skip(state))]
pub async fn list<S: UrlStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    owner: Owner,
) -> Result<Response, ApiError> {
    let records = state.links.list(&owner.0).await?;
    if records.is_empty() {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }

    let urls: Vec<OwnedUrl> = records
        .into_iter()
        .map(|record| OwnedUrl {
            short_url: state.short_url(&record.code),
            original_url: record.original_url,
        })
        .collect();

    Ok(Json(urls).into_response())
}

/// DELETE /api/user/urls — soft-delete the caller's links in the background.
///
/// Answers `202 Accepted` right away; the batch commits or rolls back on its
/// own and its result is only visible in logs and metrics.
#[tracing::instrument(skip(state, codes), fields(codes = codes.len()))]
pub async fn delete<S: UrlStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    owner: Owner,
    Json(codes): Json<Vec<String>>,
) -> StatusCode {
    let requests = DeletionRequest::for_owner(&owner.0, codes);
    let _batch = state.deleter.spawn(requests);
    StatusCode::ACCEPTED
}

/// GET /ping — checks that the store answers.
pub async fn ping<S: UrlStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<StatusCode, ApiError> {
    state
        .links
        .ping()
        .await
        .map_err(|e| ApiError::Internal(format!("Store unreachable: {e}")))?;
    Ok(StatusCode::OK)
}
