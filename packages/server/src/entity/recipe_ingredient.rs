use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One ingredient line of a recipe. `(recipe_id, ingredient_id)` is unique.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "recipe_ingredient")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub recipe_id: i32,
    #[sea_orm(primary_key)]
    pub ingredient_id: i32,
    #[sea_orm(belongs_to, from = "recipe_id", to = "id", on_delete = "Cascade")]
    pub recipe: HasOne<super::recipe::Entity>,
    #[sea_orm(belongs_to, from = "ingredient_id", to = "id", on_delete = "Cascade")]
    pub ingredient: HasOne<super::ingredient::Entity>,

    pub amount: i32,
    /// 0-based submission order.
    pub position: i32,
}

impl ActiveModelBehavior for ActiveModel {}
