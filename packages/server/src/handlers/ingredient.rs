use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use foodgram_common::catalog;
use foodgram_common::model::IngredientDraft;
use foodgram_common::policy::{self, Capability};
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::catalog::{
    CreateIngredientRequest, IngredientListQuery, IngredientResponse, UpdateIngredientRequest,
};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/",
    tag = "Ingredients",
    operation_id = "listIngredients",
    summary = "List or search ingredients",
    description = "Returns ingredients ordered by name. `name` filters by case-insensitive prefix. \
        No authentication required.",
    params(IngredientListQuery),
    responses(
        (status = 200, description = "Matching ingredients", body = Vec<IngredientResponse>),
    ),
)]
#[instrument(skip(state, query), fields(name = ?query.name))]
pub async fn list_ingredients(
    State(state): State<AppState>,
    Query(query): Query<IngredientListQuery>,
) -> Result<Json<Vec<IngredientResponse>>, AppError> {
    let items = catalog::list_ingredients(&*state.store, query.name.as_deref()).await?;
    Ok(Json(items.into_iter().map(IngredientResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Ingredients",
    operation_id = "getIngredient",
    summary = "Get an ingredient",
    params(("id" = i32, Path, description = "Ingredient ID")),
    responses(
        (status = 200, description = "Ingredient", body = IngredientResponse),
        (status = 404, description = "Ingredient not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(ingredient_id = id))]
pub async fn get_ingredient(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<IngredientResponse>, AppError> {
    let item = catalog::get_ingredient(&*state.store, id).await?;
    Ok(Json(item.into()))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Ingredients",
    operation_id = "createIngredient",
    summary = "Create an ingredient",
    description = "Staff only. Ingredient names are unique.",
    request_body = CreateIngredientRequest,
    responses(
        (status = 201, description = "Ingredient created", body = IngredientResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR, CONFLICT)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(name = %payload.name))]
pub async fn create_ingredient(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateIngredientRequest>,
) -> Result<impl IntoResponse, AppError> {
    let draft = IngredientDraft::from(payload);
    let item = catalog::create_ingredient(&*state.store, &auth_user.actor(), &draft).await?;
    Ok((StatusCode::CREATED, Json(IngredientResponse::from(item))))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Ingredients",
    operation_id = "updateIngredient",
    summary = "Update an ingredient",
    description = "Staff only. Omitted fields keep their current value.",
    params(("id" = i32, Path, description = "Ingredient ID")),
    request_body = UpdateIngredientRequest,
    responses(
        (status = 200, description = "Ingredient updated", body = IngredientResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR, CONFLICT)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Ingredient not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(ingredient_id = id))]
pub async fn update_ingredient(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateIngredientRequest>,
) -> Result<Json<IngredientResponse>, AppError> {
    let actor = auth_user.actor();
    policy::catalog(Some(&actor), Capability::Write).require()?;

    let existing = catalog::get_ingredient(&*state.store, id).await?;
    let draft = payload.merge(existing);
    let item = catalog::update_ingredient(&*state.store, &actor, id, &draft).await?;
    Ok(Json(item.into()))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Ingredients",
    operation_id = "deleteIngredient",
    summary = "Delete an ingredient",
    description = "Staff only. The ingredient is dropped from every recipe that lists it.",
    params(("id" = i32, Path, description = "Ingredient ID")),
    responses(
        (status = 204, description = "Ingredient deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Ingredient not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(ingredient_id = id))]
pub async fn delete_ingredient(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    catalog::delete_ingredient(&*state.store, &auth_user.actor(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}
