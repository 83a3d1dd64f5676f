//! Repository interface. Operations in this crate only talk to these traits,
//! so the persistence backend can be swapped (PostgreSQL in the server,
//! [`crate::memory::MemoryStore`] for tests and throwaway instances).

use std::collections::HashSet;

use async_trait::async_trait;

use crate::error::DomainResult;
use crate::model::{
    CartLine, Ingredient, IngredientDraft, NewUser, Recipe, RecipeDraft, RecipeFilter,
    RecipeRelation, Tag, TagDraft, User,
};

#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn list_tags(&self) -> DomainResult<Vec<Tag>>;

    async fn get_tag(&self, id: i32) -> DomainResult<Option<Tag>>;

    /// Tags whose id is in `ids`. Missing ids are silently skipped.
    async fn find_tags(&self, ids: &[i32]) -> DomainResult<Vec<Tag>>;

    /// Fails with `Conflict` when name, color or slug is taken.
    async fn insert_tag(&self, draft: &TagDraft) -> DomainResult<Tag>;

    async fn update_tag(&self, id: i32, draft: &TagDraft) -> DomainResult<Option<Tag>>;

    /// Returns `false` if the tag did not exist.
    async fn delete_tag(&self, id: i32) -> DomainResult<bool>;

    /// Ordered by name. The prefix match is case-insensitive.
    async fn list_ingredients(&self, name_prefix: Option<&str>) -> DomainResult<Vec<Ingredient>>;

    async fn get_ingredient(&self, id: i32) -> DomainResult<Option<Ingredient>>;

    async fn find_ingredients(&self, ids: &[i32]) -> DomainResult<Vec<Ingredient>>;

    /// Fails with `Conflict` when the name is taken.
    async fn insert_ingredient(&self, draft: &IngredientDraft) -> DomainResult<Ingredient>;

    async fn update_ingredient(
        &self,
        id: i32,
        draft: &IngredientDraft,
    ) -> DomainResult<Option<Ingredient>>;

    /// Cascades to recipe lines referencing the ingredient.
    async fn delete_ingredient(&self, id: i32) -> DomainResult<bool>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get_user(&self, id: i32) -> DomainResult<Option<User>>;

    async fn find_users(&self, ids: &[i32]) -> DomainResult<Vec<User>>;

    /// Ordered by id.
    async fn list_users(&self) -> DomainResult<Vec<User>>;

    /// Fails with `Conflict` when email or username is taken.
    async fn insert_user(&self, new_user: &NewUser) -> DomainResult<User>;
}

#[async_trait]
pub trait RecipeStore: Send + Sync {
    /// Persists the recipe, its lines and tag links as one atomic unit.
    async fn insert_recipe(&self, author_id: i32, draft: &RecipeDraft) -> DomainResult<Recipe>;

    /// Overwrites scalar fields and replaces the whole line and tag sets
    /// atomically. `NotFound` if the recipe is gone.
    async fn replace_recipe(&self, id: i32, draft: &RecipeDraft) -> DomainResult<Recipe>;

    /// Cascades to lines, tag links, favorites and cart entries.
    async fn delete_recipe(&self, id: i32) -> DomainResult<bool>;

    async fn get_recipe(&self, id: i32) -> DomainResult<Option<Recipe>>;

    /// Newest first.
    async fn list_recipes(&self, filter: &RecipeFilter) -> DomainResult<Vec<Recipe>>;

    async fn count_recipes_by(&self, author_id: i32) -> DomainResult<u64>;
}

#[async_trait]
pub trait RelationStore: Send + Sync {
    /// Returns `false` when the pair already exists.
    async fn add_recipe_relation(
        &self,
        kind: RecipeRelation,
        user_id: i32,
        recipe_id: i32,
    ) -> DomainResult<bool>;

    /// Returns `false` when the pair did not exist.
    async fn remove_recipe_relation(
        &self,
        kind: RecipeRelation,
        user_id: i32,
        recipe_id: i32,
    ) -> DomainResult<bool>;

    /// The subset of `recipe_ids` related to `user_id` under `kind`.
    async fn related_recipes(
        &self,
        kind: RecipeRelation,
        user_id: i32,
        recipe_ids: &[i32],
    ) -> DomainResult<HashSet<i32>>;

    /// Returns `false` when already subscribed.
    async fn add_subscription(&self, user_id: i32, author_id: i32) -> DomainResult<bool>;

    /// Returns `false` when not subscribed.
    async fn remove_subscription(&self, user_id: i32, author_id: i32) -> DomainResult<bool>;

    /// The subset of `author_ids` that `user_id` follows.
    async fn subscribed_authors(
        &self,
        user_id: i32,
        author_ids: &[i32],
    ) -> DomainResult<HashSet<i32>>;

    /// Followed authors, newest subscription first, plus the total count.
    async fn list_subscriptions(
        &self,
        user_id: i32,
        offset: u64,
        limit: u64,
    ) -> DomainResult<(Vec<User>, u64)>;

    /// All ingredient lines of every recipe in the user's cart.
    async fn cart_lines(&self, user_id: i32) -> DomainResult<Vec<CartLine>>;
}

/// Everything the HTTP layer needs from a backend.
pub trait Store: CatalogStore + UserStore + RecipeStore + RelationStore {}

impl<T> Store for T where T: CatalogStore + UserStore + RecipeStore + RelationStore {}
