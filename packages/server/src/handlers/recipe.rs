use axum::Json;
use axum::extract::{DefaultBodyLimit, Path, State};
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use axum_extra::extract::Query;
use foodgram_common::model::RecipeRelation;
use foodgram_common::recipe::{self, RecipeQuery};
use foodgram_common::{image, relation, shopping_list};
use tracing::{info, instrument};

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::recipe::RecipeSubmission;
use crate::models::recipe::{
    RecipeBody, RecipeListQuery, RecipeMinified, RecipeOperation, RecipeRequest, RecipeResponse,
};
use crate::state::AppState;

/// Body limit for recipe payloads. Base64 inflates the image by a third.
pub fn recipe_body_limit(max_image_size: u64) -> DefaultBodyLimit {
    let limit = max_image_size.saturating_mul(4) / 3 + 64 * 1024;
    DefaultBodyLimit::max(usize::try_from(limit).unwrap_or(usize::MAX))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Recipes",
    operation_id = "listRecipes",
    summary = "List recipes",
    description = "Returns recipes newest first. `tags` may be repeated and matches recipes carrying \
        ANY of the slugs. `is_favorited` and `is_in_shopping_cart` only apply to authenticated callers.",
    params(RecipeListQuery),
    responses(
        (status = 200, description = "Matching recipes", body = Vec<RecipeResponse>),
        (status = 401, description = "Invalid token (TOKEN_INVALID)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, auth_user, query), fields(author = ?query.author))]
pub async fn list_recipes(
    auth_user: Option<AuthUser>,
    State(state): State<AppState>,
    Query(query): Query<RecipeListQuery>,
) -> Result<Json<Vec<RecipeResponse>>, AppError> {
    let viewer = auth_user.as_ref().map(AuthUser::actor);
    let query = RecipeQuery {
        author_id: query.author,
        tag_slugs: query.tags,
        is_favorited: query.is_favorited,
        is_in_shopping_cart: query.is_in_shopping_cart,
    };
    let cards = recipe::list(&*state.store, viewer.as_ref(), &query).await?;
    let storage = &state.config.storage;
    Ok(Json(
        cards
            .into_iter()
            .map(|card| RecipeResponse::from_card(card, storage))
            .collect(),
    ))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Recipes",
    operation_id = "getRecipe",
    summary = "Get a recipe",
    params(("id" = i32, Path, description = "Recipe ID")),
    responses(
        (status = 200, description = "Recipe", body = RecipeResponse),
        (status = 401, description = "Invalid token (TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Recipe not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, auth_user), fields(recipe_id = id))]
pub async fn get_recipe(
    auth_user: Option<AuthUser>,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<RecipeBody>, AppError> {
    let viewer = auth_user.as_ref().map(AuthUser::actor);
    let card = recipe::get(&*state.store, viewer.as_ref(), id).await?;
    Ok(Json(RecipeBody::render(
        RecipeOperation::Read,
        card,
        &state.config.storage,
    )))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Recipes",
    operation_id = "createRecipe",
    summary = "Create a recipe",
    description = "Creates a recipe authored by the caller. Accepts JSON with the image as a \
        `data:image/<ext>;base64,...` URI, or `multipart/form-data` with an `image` file part. \
        At least one tag and one ingredient are required; ids may not repeat.",
    request_body(content = RecipeRequest, content_type = "application/json"),
    responses(
        (status = 201, description = "Recipe created", body = RecipeResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, submission), fields(user_id = auth_user.user_id))]
pub async fn create_recipe(
    auth_user: AuthUser,
    State(state): State<AppState>,
    submission: RecipeSubmission,
) -> Result<impl IntoResponse, AppError> {
    let (draft, decoded) = submission.into_draft()?;
    recipe::validate_draft(&draft)?;
    image::save(&*state.images, &decoded).await?;

    let card = recipe::create(&*state.store, &auth_user.actor(), draft).await?;
    Ok((
        StatusCode::CREATED,
        Json(RecipeBody::render(
            RecipeOperation::Create,
            card,
            &state.config.storage,
        )),
    ))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Recipes",
    operation_id = "updateRecipe",
    summary = "Update a recipe",
    description = "Author or staff only. Omitted fields keep their value; `tags` and \
        `ingredients`, when present, replace the stored sets entirely.",
    params(("id" = i32, Path, description = "Recipe ID")),
    request_body(content = RecipeRequest, content_type = "application/json"),
    responses(
        (status = 200, description = "Recipe updated", body = RecipeResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Recipe not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, submission), fields(recipe_id = id))]
pub async fn update_recipe(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    submission: RecipeSubmission,
) -> Result<Json<RecipeBody>, AppError> {
    let actor = auth_user.actor();

    let image_key = match &submission.image {
        Some(decoded) => {
            recipe::ensure_can_modify(&*state.store, &actor, id).await?;
            Some(image::save(&*state.images, decoded).await?)
        }
        None => None,
    };

    let patch = submission.into_patch(image_key);
    let card = recipe::update(&*state.store, &actor, id, patch).await?;
    Ok(Json(RecipeBody::render(
        RecipeOperation::Update,
        card,
        &state.config.storage,
    )))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Recipes",
    operation_id = "deleteRecipe",
    summary = "Delete a recipe",
    description = "Author or staff only. Also removes the recipe from every favorites list and cart.",
    params(("id" = i32, Path, description = "Recipe ID")),
    responses(
        (status = 204, description = "Recipe deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Recipe not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(recipe_id = id))]
pub async fn delete_recipe(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    recipe::delete(&*state.store, &auth_user.actor(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn add_relation(
    state: &AppState,
    auth_user: &AuthUser,
    kind: RecipeRelation,
    op: RecipeOperation,
    id: i32,
) -> Result<(StatusCode, Json<RecipeBody>), AppError> {
    let card = relation::add(&*state.store, &auth_user.actor(), kind, id).await?;
    Ok((
        StatusCode::CREATED,
        Json(RecipeBody::render(op, card, &state.config.storage)),
    ))
}

async fn remove_relation(
    state: &AppState,
    auth_user: &AuthUser,
    kind: RecipeRelation,
    id: i32,
) -> Result<StatusCode, AppError> {
    relation::remove(&*state.store, &auth_user.actor(), kind, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/{id}/favorite",
    tag = "Recipes",
    operation_id = "addFavorite",
    summary = "Add a recipe to favorites",
    params(("id" = i32, Path, description = "Recipe ID")),
    responses(
        (status = 201, description = "Recipe favorited", body = RecipeMinified),
        (status = 400, description = "Already favorited (CONFLICT)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Recipe not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(recipe_id = id))]
pub async fn add_favorite(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    add_relation(
        &state,
        &auth_user,
        RecipeRelation::Favorite,
        RecipeOperation::Favorite,
        id,
    )
    .await
}

#[utoipa::path(
    delete,
    path = "/{id}/favorite",
    tag = "Recipes",
    operation_id = "removeFavorite",
    summary = "Remove a recipe from favorites",
    params(("id" = i32, Path, description = "Recipe ID")),
    responses(
        (status = 204, description = "Recipe removed from favorites"),
        (status = 400, description = "Not in favorites (CONFLICT)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Recipe not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(recipe_id = id))]
pub async fn remove_favorite(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    remove_relation(&state, &auth_user, RecipeRelation::Favorite, id).await
}

#[utoipa::path(
    post,
    path = "/{id}/shopping_cart",
    tag = "Recipes",
    operation_id = "addToShoppingCart",
    summary = "Add a recipe to the shopping cart",
    params(("id" = i32, Path, description = "Recipe ID")),
    responses(
        (status = 201, description = "Recipe added to cart", body = RecipeMinified),
        (status = 400, description = "Already in cart (CONFLICT)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Recipe not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(recipe_id = id))]
pub async fn add_to_shopping_cart(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    add_relation(
        &state,
        &auth_user,
        RecipeRelation::ShoppingCart,
        RecipeOperation::ShoppingCart,
        id,
    )
    .await
}

#[utoipa::path(
    delete,
    path = "/{id}/shopping_cart",
    tag = "Recipes",
    operation_id = "removeFromShoppingCart",
    summary = "Remove a recipe from the shopping cart",
    params(("id" = i32, Path, description = "Recipe ID")),
    responses(
        (status = 204, description = "Recipe removed from cart"),
        (status = 400, description = "Not in cart (CONFLICT)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Recipe not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(recipe_id = id))]
pub async fn remove_from_shopping_cart(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    remove_relation(&state, &auth_user, RecipeRelation::ShoppingCart, id).await
}

#[utoipa::path(
    get,
    path = "/download_shopping_cart",
    tag = "Recipes",
    operation_id = "downloadShoppingCart",
    summary = "Download the shopping list",
    description = "Sums ingredient amounts over every recipe in the caller's cart, grouped by \
        name and unit, and returns them as a plain-text attachment.",
    responses(
        (status = 200, description = "Shopping list", content_type = "text/plain", body = String),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn download_shopping_cart(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let items = shopping_list::build(&*state.store, &auth_user.actor()).await?;
    info!(items = items.len(), "Shopping list rendered");

    let filename = format!("{}_shopping_list.txt", auth_user.username);
    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, content_disposition_value(&filename)),
        ],
        shopping_list::render(&items),
    ))
}

/// `attachment` disposition with an ASCII fallback and an RFC 5987 `filename*`.
fn content_disposition_value(filename: &str) -> String {
    let ascii: String = filename
        .chars()
        .map(|c| {
            if c.is_ascii_graphic() && c != '"' && c != '\\' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let encoded: String = filename
        .bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'.' | b'-' | b'_' | b'~' => {
                (b as char).to_string()
            }
            _ => format!("%{b:02X}"),
        })
        .collect();
    format!("attachment; filename=\"{ascii}\"; filename*=UTF-8''{encoded}")
}
