use foodgram_common::users::{AuthorFeed, UserCard};
use serde::{Deserialize, Serialize};

use super::recipe::RecipeMinified;
use super::shared::Pagination;
use crate::config::StorageConfig;

#[derive(Serialize, utoipa::ToSchema)]
pub struct UserResponse {
    #[schema(example = 3)]
    pub id: i32,
    #[schema(example = "vpupkin@yandex.ru")]
    pub email: String,
    #[schema(example = "vasya.pupkin")]
    pub username: String,
    #[schema(example = "Vasya")]
    pub first_name: String,
    #[schema(example = "Pupkin")]
    pub last_name: String,
    /// Whether the caller follows this user. `false` for anonymous callers.
    pub is_subscribed: bool,
}

impl From<UserCard> for UserResponse {
    fn from(card: UserCard) -> Self {
        let u = card.user;
        Self {
            id: u.id,
            email: u.email,
            username: u.username,
            first_name: u.first_name,
            last_name: u.last_name,
            is_subscribed: card.is_subscribed,
        }
    }
}

/// A followed author with their latest recipes.
#[derive(Serialize, utoipa::ToSchema)]
pub struct SubscriptionResponse {
    #[serde(flatten)]
    pub author: UserResponse,
    pub recipes: Vec<RecipeMinified>,
    /// Total number of recipes by this author.
    #[schema(example = 12)]
    pub recipes_count: u64,
}

impl SubscriptionResponse {
    pub fn from_feed(feed: AuthorFeed, storage: &StorageConfig) -> Self {
        Self {
            author: feed.author.into(),
            recipes: feed
                .recipes
                .iter()
                .map(|r| RecipeMinified::new(r, storage))
                .collect(),
            recipes_count: feed.recipes_count,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct SubscriptionListResponse {
    pub data: Vec<SubscriptionResponse>,
    pub pagination: Pagination,
}

/// Query parameters for the subscription list.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct SubscriptionListQuery {
    /// 1-based page number.
    #[param(example = 1)]
    pub page: Option<u64>,
    /// Authors per page (1-100, default 6).
    #[param(example = 6)]
    pub limit: Option<u64>,
    /// Maximum recipes shown per author (0-1000). All recipes when omitted.
    #[param(example = 3)]
    pub recipes_limit: Option<u64>,
}

#[derive(Deserialize, utoipa::IntoParams)]
pub struct SubscribeQuery {
    /// Maximum recipes shown for the author (0-1000). All recipes when omitted.
    #[param(example = 3)]
    pub recipes_limit: Option<u64>,
}
