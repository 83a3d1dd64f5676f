use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use foodgram_common::catalog;
use foodgram_common::model::TagDraft;
use foodgram_common::policy::{self, Capability};
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::catalog::{CreateTagRequest, TagResponse, UpdateTagRequest};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/",
    tag = "Tags",
    operation_id = "listTags",
    summary = "List tags",
    description = "Returns every tag ordered by id. No authentication required.",
    responses(
        (status = 200, description = "All tags", body = Vec<TagResponse>),
    ),
)]
#[instrument(skip(state))]
pub async fn list_tags(State(state): State<AppState>) -> Result<Json<Vec<TagResponse>>, AppError> {
    let tags = catalog::list_tags(&*state.store).await?;
    Ok(Json(tags.into_iter().map(TagResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Tags",
    operation_id = "getTag",
    summary = "Get a tag",
    params(("id" = i32, Path, description = "Tag ID")),
    responses(
        (status = 200, description = "Tag", body = TagResponse),
        (status = 404, description = "Tag not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(tag_id = id))]
pub async fn get_tag(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<TagResponse>, AppError> {
    let tag = catalog::get_tag(&*state.store, id).await?;
    Ok(Json(tag.into()))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Tags",
    operation_id = "createTag",
    summary = "Create a tag",
    description = "Staff only. Name, color and slug must each be unique.",
    request_body = CreateTagRequest,
    responses(
        (status = 201, description = "Tag created", body = TagResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR, CONFLICT)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(slug = %payload.slug))]
pub async fn create_tag(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateTagRequest>,
) -> Result<impl IntoResponse, AppError> {
    let draft = TagDraft::from(payload);
    let tag = catalog::create_tag(&*state.store, &auth_user.actor(), &draft).await?;
    Ok((StatusCode::CREATED, Json(TagResponse::from(tag))))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Tags",
    operation_id = "updateTag",
    summary = "Update a tag",
    description = "Staff only. Omitted fields keep their current value.",
    params(("id" = i32, Path, description = "Tag ID")),
    request_body = UpdateTagRequest,
    responses(
        (status = 200, description = "Tag updated", body = TagResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR, CONFLICT)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Tag not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(tag_id = id))]
pub async fn update_tag(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateTagRequest>,
) -> Result<Json<TagResponse>, AppError> {
    let actor = auth_user.actor();
    policy::catalog(Some(&actor), Capability::Write).require()?;

    let existing = catalog::get_tag(&*state.store, id).await?;
    let draft = payload.merge(existing);
    let tag = catalog::update_tag(&*state.store, &actor, id, &draft).await?;
    Ok(Json(tag.into()))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Tags",
    operation_id = "deleteTag",
    summary = "Delete a tag",
    description = "Staff only. The tag is detached from every recipe carrying it.",
    params(("id" = i32, Path, description = "Tag ID")),
    responses(
        (status = 204, description = "Tag deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Tag not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(tag_id = id))]
pub async fn delete_tag(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    catalog::delete_tag(&*state.store, &auth_user.actor(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}
