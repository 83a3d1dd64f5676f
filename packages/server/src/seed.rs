use std::path::Path;

use anyhow::Context;
use foodgram_common::model::IngredientDraft;
use foodgram_common::{Store, catalog};
use sea_orm::sea_query::{Index, IndexCreateStatement, PostgresQueryBuilder};
use sea_orm::{ConnectionTrait, DatabaseConnection, DbErr};
use tracing::{info, warn};

use crate::entity::{favorite, recipe, recipe_ingredient, shopping_cart, subscription};

/// Reads a JSON array of `{name, measurement_unit}` objects.
pub async fn read_ingredients(path: &Path) -> anyhow::Result<Vec<IngredientDraft>> {
    let raw = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_slice(&raw)
        .with_context(|| format!("Invalid ingredient list in {}", path.display()))
}

/// Imports an ingredient file. Names already present are left untouched.
pub async fn load_ingredients<S: Store + ?Sized>(store: &S, path: &Path) -> anyhow::Result<u32> {
    let drafts = read_ingredients(path).await?;
    let inserted = catalog::import_ingredients(store, &drafts)
        .await
        .with_context(|| format!("Failed to import {}", path.display()))?;
    info!(
        file = %path.display(),
        total = drafts.len(),
        inserted,
        "Ingredient file loaded"
    );
    Ok(inserted)
}

/// Ensure required database indexes exist.
///
/// SeaORM's schema-sync doesn't support composite non-unique indexes,
/// so we create them manually on startup.
pub async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    // Author pages and subscription feeds:
    // SELECT ... FROM recipe WHERE author_id = ? ORDER BY created_at DESC
    ensure_index(
        db,
        "idx_recipe_author_created",
        Index::create()
            .table(recipe::Entity)
            .col(recipe::Column::AuthorId)
            .col(recipe::Column::CreatedAt)
            .to_owned(),
    )
    .await;

    // Subscription list, newest first.
    ensure_index(
        db,
        "idx_subscription_user_created",
        Index::create()
            .table(subscription::Entity)
            .col(subscription::Column::UserId)
            .col(subscription::Column::CreatedAt)
            .to_owned(),
    )
    .await;

    // Reverse lookups by recipe, used by the `is_favorited` and
    // `is_in_shopping_cart` flags and by cascades.
    ensure_index(
        db,
        "idx_favorite_recipe",
        Index::create()
            .table(favorite::Entity)
            .col(favorite::Column::RecipeId)
            .to_owned(),
    )
    .await;
    ensure_index(
        db,
        "idx_shopping_cart_recipe",
        Index::create()
            .table(shopping_cart::Entity)
            .col(shopping_cart::Column::RecipeId)
            .to_owned(),
    )
    .await;
    ensure_index(
        db,
        "idx_recipe_ingredient_ingredient",
        Index::create()
            .table(recipe_ingredient::Entity)
            .col(recipe_ingredient::Column::IngredientId)
            .to_owned(),
    )
    .await;

    Ok(())
}

async fn ensure_index(db: &DatabaseConnection, name: &str, mut stmt: IndexCreateStatement) {
    let sql = stmt
        .if_not_exists()
        .name(name)
        .to_string(PostgresQueryBuilder);

    match db.execute_unprepared(&sql).await {
        Ok(_) => info!("Ensured index {} exists", name),
        Err(e) => warn!("Failed to create index {}: {}", name, e),
    }
}
