use chrono::{DateTime, Utc};
use foodgram_common::model::{IngredientLine, IngredientSpec, Recipe};
use foodgram_common::recipe::RecipeCard;
use serde::{Deserialize, Serialize};

use super::catalog::TagResponse;
use super::shared::{number_or_string, optional_number_or_string, query_flag};
use super::user::UserResponse;
use crate::config::StorageConfig;

/// One `{id, amount}` entry of a recipe payload.
#[derive(Clone, Copy, Deserialize, utoipa::ToSchema)]
pub struct IngredientAmountRequest {
    /// Ingredient ID.
    #[schema(example = 17)]
    pub id: i32,
    /// Quantity in the ingredient's unit (1-1000). Numeric strings are accepted.
    #[serde(deserialize_with = "number_or_string")]
    #[schema(value_type = i32, example = 200)]
    pub amount: i32,
}

impl From<IngredientAmountRequest> for IngredientSpec {
    fn from(r: IngredientAmountRequest) -> Self {
        Self {
            ingredient_id: r.id,
            amount: r.amount,
        }
    }
}

/// Recipe body for create (all fields required) and PATCH (omitted fields keep
/// their stored value; `tags` and `ingredients` replace the whole set).
#[derive(Deserialize, Default, utoipa::ToSchema)]
pub struct RecipeRequest {
    pub ingredients: Option<Vec<IngredientAmountRequest>>,
    /// Tag IDs.
    #[schema(example = json!([1, 2]))]
    pub tags: Option<Vec<i32>>,
    /// `data:image/<png|jpeg|jpg|gif|webp>;base64,<payload>`.
    #[schema(example = "data:image/png;base64,iVBORw0KGgo=")]
    pub image: Option<String>,
    #[schema(example = "Pancakes")]
    pub name: Option<String>,
    #[schema(example = "Mix everything and fry.")]
    pub text: Option<String>,
    /// Minutes (1-500).
    #[serde(default, deserialize_with = "optional_number_or_string")]
    #[schema(value_type = Option<i32>, example = 20)]
    pub cooking_time: Option<i32>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct RecipeIngredientResponse {
    #[schema(example = 17)]
    pub id: i32,
    #[schema(example = "flour")]
    pub name: String,
    #[schema(example = "g")]
    pub measurement_unit: String,
    #[schema(example = 200)]
    pub amount: i32,
}

impl From<IngredientLine> for RecipeIngredientResponse {
    fn from(line: IngredientLine) -> Self {
        Self {
            id: line.ingredient.id,
            name: line.ingredient.name,
            measurement_unit: line.ingredient.measurement_unit,
            amount: line.amount,
        }
    }
}

/// Full recipe representation.
#[derive(Serialize, utoipa::ToSchema)]
pub struct RecipeResponse {
    pub id: i32,
    pub tags: Vec<TagResponse>,
    pub author: UserResponse,
    /// Lines in submission order.
    pub ingredients: Vec<RecipeIngredientResponse>,
    /// Always `false` for anonymous callers.
    pub is_favorited: bool,
    /// Always `false` for anonymous callers.
    pub is_in_shopping_cart: bool,
    pub name: String,
    /// Public URL of the stored image.
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
    pub created_at: DateTime<Utc>,
}

impl RecipeResponse {
    pub fn from_card(card: RecipeCard, storage: &StorageConfig) -> Self {
        let r = card.recipe;
        Self {
            id: r.id,
            tags: r.tags.into_iter().map(TagResponse::from).collect(),
            author: card.author.into(),
            ingredients: r
                .ingredients
                .into_iter()
                .map(RecipeIngredientResponse::from)
                .collect(),
            is_favorited: card.is_favorited,
            is_in_shopping_cart: card.is_in_shopping_cart,
            image: storage.image_url(&r.image),
            name: r.name,
            text: r.text,
            cooking_time: r.cooking_time,
            created_at: r.created_at,
        }
    }
}

/// Short recipe representation used in favorites, cart and subscription feeds.
#[derive(Serialize, utoipa::ToSchema)]
pub struct RecipeMinified {
    pub id: i32,
    pub name: String,
    pub image: String,
    pub cooking_time: i32,
}

impl RecipeMinified {
    pub fn new(recipe: &Recipe, storage: &StorageConfig) -> Self {
        Self {
            id: recipe.id,
            name: recipe.name.clone(),
            image: storage.image_url(&recipe.image),
            cooking_time: recipe.cooking_time,
        }
    }
}

/// What a handler did with a recipe.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecipeOperation {
    Read,
    Create,
    Update,
    Favorite,
    ShoppingCart,
    SubscriptionFeed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecipeShape {
    Full,
    Minified,
}

pub fn shape_for(op: RecipeOperation) -> RecipeShape {
    match op {
        RecipeOperation::Read | RecipeOperation::Create | RecipeOperation::Update => {
            RecipeShape::Full
        }
        RecipeOperation::Favorite
        | RecipeOperation::ShoppingCart
        | RecipeOperation::SubscriptionFeed => RecipeShape::Minified,
    }
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(untagged)]
pub enum RecipeBody {
    Full(RecipeResponse),
    Minified(RecipeMinified),
}

impl RecipeBody {
    pub fn render(op: RecipeOperation, card: RecipeCard, storage: &StorageConfig) -> Self {
        match shape_for(op) {
            RecipeShape::Full => RecipeBody::Full(RecipeResponse::from_card(card, storage)),
            RecipeShape::Minified => {
                RecipeBody::Minified(RecipeMinified::new(&card.recipe, storage))
            }
        }
    }
}

/// Query parameters for recipe listing.
#[derive(Deserialize, Default, utoipa::IntoParams)]
pub struct RecipeListQuery {
    /// Author user ID.
    #[param(example = 3)]
    pub author: Option<i32>,
    /// Tag slug; repeat to match recipes carrying ANY of the slugs.
    #[serde(default)]
    #[param(example = json!(["breakfast", "dinner"]))]
    pub tags: Vec<String>,
    /// `1` to list only the caller's favorites. Ignored for anonymous callers.
    #[serde(default, deserialize_with = "query_flag")]
    #[param(value_type = Option<String>, example = "1")]
    pub is_favorited: bool,
    /// `1` to list only recipes in the caller's cart. Ignored for anonymous callers.
    #[serde(default, deserialize_with = "query_flag")]
    #[param(value_type = Option<String>, example = "0")]
    pub is_in_shopping_cart: bool,
}
