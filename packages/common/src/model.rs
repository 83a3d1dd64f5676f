//! Plain data structs shared by every store backend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The identity a request acts as.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Actor {
    pub user_id: i32,
    pub is_staff: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i32,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_staff: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_staff: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: i32,
    pub name: String,
    /// Hex color, `#abc` or `#aabbcc`.
    pub color: String,
    pub slug: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct TagDraft {
    pub name: String,
    pub color: String,
    pub slug: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    pub id: i32,
    pub name: String,
    pub measurement_unit: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct IngredientDraft {
    pub name: String,
    pub measurement_unit: String,
}

/// One (ingredient, amount) line of a stored recipe.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct IngredientLine {
    pub ingredient: Ingredient,
    pub amount: i32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Recipe {
    pub id: i32,
    pub author_id: i32,
    pub name: String,
    /// Stored asset key (`<sha256>.<ext>`).
    pub image: String,
    pub text: String,
    /// Minutes, 1-500.
    pub cooking_time: i32,
    pub created_at: DateTime<Utc>,
    /// Ordered by tag id.
    pub tags: Vec<Tag>,
    /// Ordered as submitted.
    pub ingredients: Vec<IngredientLine>,
}

/// Requested ingredient line in a create/update payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub struct IngredientSpec {
    pub ingredient_id: i32,
    pub amount: i32,
}

/// Complete writable state of a recipe. Stores persist it as a whole.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecipeDraft {
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
    pub tag_ids: Vec<i32>,
    pub ingredients: Vec<IngredientSpec>,
}

/// Partial update; `None` keeps the stored value.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RecipePatch {
    pub name: Option<String>,
    pub image: Option<String>,
    pub text: Option<String>,
    pub cooking_time: Option<i32>,
    pub tag_ids: Option<Vec<i32>>,
    pub ingredients: Option<Vec<IngredientSpec>>,
}

/// Backend-level recipe query. All present criteria must hold.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RecipeFilter {
    pub author_id: Option<i32>,
    /// Matches recipes carrying any of these slugs. Empty means no tag filter.
    pub tag_slugs: Vec<String>,
    pub favorited_by: Option<i32>,
    pub in_cart_of: Option<i32>,
    pub limit: Option<u64>,
}

/// Per-user recipe membership sets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RecipeRelation {
    Favorite,
    ShoppingCart,
}

impl RecipeRelation {
    pub fn label(self) -> &'static str {
        match self {
            RecipeRelation::Favorite => "favorites",
            RecipeRelation::ShoppingCart => "shopping cart",
        }
    }
}

/// A single ingredient line of a recipe in somebody's cart, flattened.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CartLine {
    pub name: String,
    pub measurement_unit: String,
    pub amount: i64,
}
