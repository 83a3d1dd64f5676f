//! Favorites, shopping-cart membership and author subscriptions.
//!
//! Every toggle is a single existence-check-then-mutate against the store;
//! backends enforce pair uniqueness, so a lost race surfaces as `Conflict`.

use tracing::info;

use crate::error::{DomainError, DomainResult};
use crate::model::{Actor, RecipeRelation};
use crate::recipe::{self, RecipeCard};
use crate::store::Store;
use crate::users::{self, AuthorFeed};

/// Adds `recipe_id` to the actor's favorites or cart and returns the updated card.
pub async fn add<S: Store + ?Sized>(
    store: &S,
    actor: &Actor,
    kind: RecipeRelation,
    recipe_id: i32,
) -> DomainResult<RecipeCard> {
    let found = store
        .get_recipe(recipe_id)
        .await?
        .ok_or(DomainError::NotFound("Recipe"))?;

    if !store
        .add_recipe_relation(kind, actor.user_id, recipe_id)
        .await?
    {
        return Err(DomainError::Conflict(format!(
            "Recipe is already in {}",
            kind.label()
        )));
    }
    info!(recipe_id, user_id = actor.user_id, kind = kind.label(), "Recipe added");
    recipe::single_card(store, Some(actor), found).await
}

pub async fn remove<S: Store + ?Sized>(
    store: &S,
    actor: &Actor,
    kind: RecipeRelation,
    recipe_id: i32,
) -> DomainResult<()> {
    if store.get_recipe(recipe_id).await?.is_none() {
        return Err(DomainError::NotFound("Recipe"));
    }
    if !store
        .remove_recipe_relation(kind, actor.user_id, recipe_id)
        .await?
    {
        return Err(DomainError::Conflict(format!(
            "Recipe is not in {}",
            kind.label()
        )));
    }
    info!(recipe_id, user_id = actor.user_id, kind = kind.label(), "Recipe removed");
    Ok(())
}

/// Follows `author_id` and returns the author's feed entry.
pub async fn subscribe<S: Store + ?Sized>(
    store: &S,
    actor: &Actor,
    author_id: i32,
    recipes_limit: Option<u64>,
) -> DomainResult<AuthorFeed> {
    users::validate_recipes_limit(recipes_limit)?;

    let author = store
        .get_user(author_id)
        .await?
        .ok_or(DomainError::NotFound("User"))?;
    if author.id == actor.user_id {
        return Err(DomainError::validation(
            "author",
            "Cannot subscribe to yourself",
        ));
    }
    if !store.add_subscription(actor.user_id, author_id).await? {
        return Err(DomainError::Conflict(
            "Already subscribed to this author".into(),
        ));
    }
    info!(author_id, user_id = actor.user_id, "Subscribed");

    users::author_feed(store, Some(actor), author, recipes_limit).await
}

pub async fn unsubscribe<S: Store + ?Sized>(
    store: &S,
    actor: &Actor,
    author_id: i32,
) -> DomainResult<()> {
    if store.get_user(author_id).await?.is_none() {
        return Err(DomainError::NotFound("User"));
    }
    if author_id == actor.user_id {
        return Err(DomainError::validation(
            "author",
            "Cannot unsubscribe from yourself",
        ));
    }
    if !store.remove_subscription(actor.user_id, author_id).await? {
        return Err(DomainError::Conflict(
            "Not subscribed to this author".into(),
        ));
    }
    info!(author_id, user_id = actor.user_id, "Unsubscribed");
    Ok(())
}
