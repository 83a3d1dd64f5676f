use foodgram_common::model::{Ingredient, IngredientDraft, Tag, TagDraft};
use serde::{Deserialize, Serialize};

#[derive(Serialize, utoipa::ToSchema)]
pub struct TagResponse {
    #[schema(example = 1)]
    pub id: i32,
    #[schema(example = "Breakfast")]
    pub name: String,
    #[schema(example = "#E26C2D")]
    pub color: String,
    #[schema(example = "breakfast")]
    pub slug: String,
}

impl From<Tag> for TagResponse {
    fn from(t: Tag) -> Self {
        Self {
            id: t.id,
            name: t.name,
            color: t.color,
            slug: t.slug,
        }
    }
}

/// Request body for tag creation.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateTagRequest {
    /// Unique display name (1-50 characters).
    #[schema(example = "Breakfast")]
    pub name: String,
    /// Unique hex color, `#rgb` or `#rrggbb`.
    #[schema(example = "#E26C2D")]
    pub color: String,
    /// Unique slug of letters, digits, `-` and `_`.
    #[schema(example = "breakfast")]
    pub slug: String,
}

impl From<CreateTagRequest> for TagDraft {
    fn from(r: CreateTagRequest) -> Self {
        Self {
            name: r.name,
            color: r.color,
            slug: r.slug,
        }
    }
}

/// PATCH body for tags; omitted fields keep their value.
#[derive(Deserialize, Default, utoipa::ToSchema)]
pub struct UpdateTagRequest {
    pub name: Option<String>,
    pub color: Option<String>,
    pub slug: Option<String>,
}

impl UpdateTagRequest {
    pub fn merge(self, existing: Tag) -> TagDraft {
        TagDraft {
            name: self.name.unwrap_or(existing.name),
            color: self.color.unwrap_or(existing.color),
            slug: self.slug.unwrap_or(existing.slug),
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct IngredientResponse {
    #[schema(example = 17)]
    pub id: i32,
    #[schema(example = "flour")]
    pub name: String,
    #[schema(example = "g")]
    pub measurement_unit: String,
}

impl From<Ingredient> for IngredientResponse {
    fn from(i: Ingredient) -> Self {
        Self {
            id: i.id,
            name: i.name,
            measurement_unit: i.measurement_unit,
        }
    }
}

/// Request body for ingredient creation.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateIngredientRequest {
    /// Unique name (1-200 characters).
    #[schema(example = "flour")]
    pub name: String,
    #[schema(example = "g")]
    pub measurement_unit: String,
}

impl From<CreateIngredientRequest> for IngredientDraft {
    fn from(r: CreateIngredientRequest) -> Self {
        Self {
            name: r.name,
            measurement_unit: r.measurement_unit,
        }
    }
}

#[derive(Deserialize, Default, utoipa::ToSchema)]
pub struct UpdateIngredientRequest {
    pub name: Option<String>,
    pub measurement_unit: Option<String>,
}

impl UpdateIngredientRequest {
    pub fn merge(self, existing: Ingredient) -> IngredientDraft {
        IngredientDraft {
            name: self.name.unwrap_or(existing.name),
            measurement_unit: self.measurement_unit.unwrap_or(existing.measurement_unit),
        }
    }
}

/// Query parameters for ingredient listing.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct IngredientListQuery {
    /// Case-insensitive name prefix.
    #[param(example = "fl")]
    pub name: Option<String>,
}
