use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tag")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub name: String,
    /// Uppercase hex, e.g. `#E26C2D`.
    #[sea_orm(unique)]
    pub color: String,
    #[sea_orm(unique)]
    pub slug: String,

    #[sea_orm(has_many, via = "recipe_tag")]
    pub recipes: HasMany<super::recipe::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for foodgram_common::model::Tag {
    fn from(m: Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            color: m.color,
            slug: m.slug,
        }
    }
}
