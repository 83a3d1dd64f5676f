use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// `user_id` follows `author_id`. The two ids never match.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "subscription")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub user_id: i32,
    #[sea_orm(primary_key)]
    pub author_id: i32,
    #[sea_orm(
        belongs_to,
        relation_enum = "Follower",
        from = "user_id",
        to = "id",
        on_delete = "Cascade"
    )]
    pub follower: HasOne<super::user::Entity>,
    #[sea_orm(
        belongs_to,
        relation_enum = "Author",
        from = "author_id",
        to = "id",
        on_delete = "Cascade"
    )]
    pub author: HasOne<super::user::Entity>,

    #[sea_orm(indexed)]
    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
