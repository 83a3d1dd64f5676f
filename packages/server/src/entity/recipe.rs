use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "recipe")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(indexed)]
    pub author_id: i32,
    #[sea_orm(belongs_to, from = "author_id", to = "id", on_delete = "Cascade")]
    pub author: HasOne<super::user::Entity>,

    pub name: String,
    /// Asset key, `<sha256 hex>.<ext>`.
    pub image: String,
    #[sea_orm(column_type = "Text")]
    pub text: String,
    /// Minutes.
    pub cooking_time: i32,

    #[sea_orm(has_many)]
    pub lines: HasMany<super::recipe_ingredient::Entity>,

    #[sea_orm(has_many, via = "recipe_tag")]
    pub tags: HasMany<super::tag::Entity>,

    #[sea_orm(indexed)]
    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
