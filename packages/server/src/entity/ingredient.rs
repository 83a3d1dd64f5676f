use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ingredient")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub name: String,
    pub measurement_unit: String,

    #[sea_orm(has_many)]
    pub lines: HasMany<super::recipe_ingredient::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for foodgram_common::model::Ingredient {
    fn from(m: Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            measurement_unit: m.measurement_unit,
        }
    }
}
