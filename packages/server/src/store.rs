//! PostgreSQL backend for the domain store traits.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::Utc;
use foodgram_common::error::{DomainError, DomainResult};
use foodgram_common::model::{
    CartLine, Ingredient, IngredientDraft, IngredientLine, NewUser, Recipe, RecipeDraft,
    RecipeFilter, RecipeRelation, Tag, TagDraft, User,
};
use foodgram_common::store::{CatalogStore, RecipeStore, RelationStore, UserStore};
use sea_orm::prelude::Expr;
use sea_orm::sea_query::{Func, LikeExpr, LockType, Query as SeaQuery};
use sea_orm::*;

use crate::entity::{
    favorite, ingredient, recipe, recipe_ingredient, recipe_tag, shopping_cart, subscription, tag,
    user,
};
use crate::models::shared::escape_like;

fn backend(err: DbErr) -> DomainError {
    DomainError::Backend(err.to_string())
}

/// Maps a unique-constraint violation onto `Conflict`, anything else onto `Backend`.
fn conflict_or_backend(err: DbErr, message: &str) -> DomainError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => DomainError::Conflict(message.to_string()),
        _ => backend(err),
    }
}

#[derive(Clone)]
pub struct SeaOrmStore {
    db: DatabaseConnection,
}

impl SeaOrmStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

/// Attaches tags and ordered ingredient lines to recipe rows, keeping row order.
async fn load_recipes<C: ConnectionTrait>(
    conn: &C,
    rows: Vec<recipe::Model>,
) -> Result<Vec<Recipe>, DbErr> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<i32> = rows.iter().map(|r| r.id).collect();

    let links = recipe_tag::Entity::find()
        .filter(recipe_tag::Column::RecipeId.is_in(ids.clone()))
        .all(conn)
        .await?;
    let tag_ids: HashSet<i32> = links.iter().map(|l| l.tag_id).collect();
    let tags: HashMap<i32, Tag> = tag::Entity::find()
        .filter(tag::Column::Id.is_in(tag_ids))
        .all(conn)
        .await?
        .into_iter()
        .map(|t| (t.id, Tag::from(t)))
        .collect();

    let lines = recipe_ingredient::Entity::find()
        .filter(recipe_ingredient::Column::RecipeId.is_in(ids))
        .order_by_asc(recipe_ingredient::Column::RecipeId)
        .order_by_asc(recipe_ingredient::Column::Position)
        .all(conn)
        .await?;
    let ingredient_ids: HashSet<i32> = lines.iter().map(|l| l.ingredient_id).collect();
    let ingredients: HashMap<i32, Ingredient> = ingredient::Entity::find()
        .filter(ingredient::Column::Id.is_in(ingredient_ids))
        .all(conn)
        .await?
        .into_iter()
        .map(|i| (i.id, Ingredient::from(i)))
        .collect();

    let mut tags_by_recipe: HashMap<i32, Vec<Tag>> = HashMap::new();
    for link in links {
        if let Some(t) = tags.get(&link.tag_id) {
            tags_by_recipe.entry(link.recipe_id).or_default().push(t.clone());
        }
    }
    let mut lines_by_recipe: HashMap<i32, Vec<IngredientLine>> = HashMap::new();
    for line in lines {
        if let Some(i) = ingredients.get(&line.ingredient_id) {
            lines_by_recipe
                .entry(line.recipe_id)
                .or_default()
                .push(IngredientLine {
                    ingredient: i.clone(),
                    amount: line.amount,
                });
        }
    }

    Ok(rows
        .into_iter()
        .map(|row| {
            let mut tags = tags_by_recipe.remove(&row.id).unwrap_or_default();
            tags.sort_by_key(|t| t.id);
            Recipe {
                id: row.id,
                author_id: row.author_id,
                name: row.name,
                image: row.image,
                text: row.text,
                cooking_time: row.cooking_time,
                created_at: row.created_at,
                tags,
                ingredients: lines_by_recipe.remove(&row.id).unwrap_or_default(),
            }
        })
        .collect())
}

async fn load_recipe<C: ConnectionTrait>(conn: &C, id: i32) -> Result<Option<Recipe>, DbErr> {
    let Some(row) = recipe::Entity::find_by_id(id).one(conn).await? else {
        return Ok(None);
    };
    Ok(load_recipes(conn, vec![row]).await?.pop())
}

/// Maps a foreign-key violation onto a validation error on `field`. A tag or
/// ingredient deleted after the reference check surfaces here.
fn missing_reference(err: DbErr, field: &'static str, message: &str) -> DomainError {
    match err.sql_err() {
        Some(SqlErr::ForeignKeyConstraintViolation(_)) => DomainError::validation(field, message),
        _ => backend(err),
    }
}

/// Inserts the tag links and ingredient lines of `draft` for `recipe_id`.
async fn insert_recipe_children<C: ConnectionTrait>(
    conn: &C,
    recipe_id: i32,
    draft: &RecipeDraft,
) -> DomainResult<()> {
    if !draft.tag_ids.is_empty() {
        let links = draft.tag_ids.iter().map(|&tag_id| recipe_tag::ActiveModel {
            recipe_id: Set(recipe_id),
            tag_id: Set(tag_id),
        });
        recipe_tag::Entity::insert_many(links)
            .exec_without_returning(conn)
            .await
            .map_err(|e| missing_reference(e, "tags", "Unknown tag"))?;
    }
    if !draft.ingredients.is_empty() {
        let lines = draft
            .ingredients
            .iter()
            .enumerate()
            .map(|(position, spec)| recipe_ingredient::ActiveModel {
                recipe_id: Set(recipe_id),
                ingredient_id: Set(spec.ingredient_id),
                amount: Set(spec.amount),
                position: Set(position as i32),
            });
        recipe_ingredient::Entity::insert_many(lines)
            .exec_without_returning(conn)
            .await
            .map_err(|e| missing_reference(e, "ingredients", "Unknown ingredient"))?;
    }
    Ok(())
}

async fn delete_recipe_children<C: ConnectionTrait>(conn: &C, recipe_id: i32) -> Result<(), DbErr> {
    recipe_tag::Entity::delete_many()
        .filter(recipe_tag::Column::RecipeId.eq(recipe_id))
        .exec(conn)
        .await?;
    recipe_ingredient::Entity::delete_many()
        .filter(recipe_ingredient::Column::RecipeId.eq(recipe_id))
        .exec(conn)
        .await?;
    Ok(())
}

async fn find_recipe_for_update(
    txn: &DatabaseTransaction,
    id: i32,
) -> Result<Option<recipe::Model>, DbErr> {
    recipe::Entity::find_by_id(id)
        .lock(LockType::Update)
        .one(txn)
        .await
}

fn recipe_fk_violation(err: DbErr) -> DomainError {
    match err.sql_err() {
        Some(SqlErr::ForeignKeyConstraintViolation(_)) => DomainError::NotFound("Recipe"),
        _ => backend(err),
    }
}

#[async_trait]
impl CatalogStore for SeaOrmStore {
    async fn list_tags(&self) -> DomainResult<Vec<Tag>> {
        let tags = tag::Entity::find()
            .order_by_asc(tag::Column::Id)
            .all(&self.db)
            .await
            .map_err(backend)?;
        Ok(tags.into_iter().map(Tag::from).collect())
    }

    async fn get_tag(&self, id: i32) -> DomainResult<Option<Tag>> {
        let tag = tag::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(backend)?;
        Ok(tag.map(Tag::from))
    }

    async fn find_tags(&self, ids: &[i32]) -> DomainResult<Vec<Tag>> {
        let tags = tag::Entity::find()
            .filter(tag::Column::Id.is_in(ids.to_vec()))
            .order_by_asc(tag::Column::Id)
            .all(&self.db)
            .await
            .map_err(backend)?;
        Ok(tags.into_iter().map(Tag::from).collect())
    }

    async fn insert_tag(&self, draft: &TagDraft) -> DomainResult<Tag> {
        let model = tag::ActiveModel {
            name: Set(draft.name.clone()),
            color: Set(draft.color.clone()),
            slug: Set(draft.slug.clone()),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .map_err(|e| conflict_or_backend(e, "Tag with this name, color or slug already exists"))?;
        Ok(model.into())
    }

    async fn update_tag(&self, id: i32, draft: &TagDraft) -> DomainResult<Option<Tag>> {
        let Some(existing) = tag::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(backend)?
        else {
            return Ok(None);
        };
        let mut active: tag::ActiveModel = existing.into();
        active.name = Set(draft.name.clone());
        active.color = Set(draft.color.clone());
        active.slug = Set(draft.slug.clone());
        let model = active.update(&self.db).await.map_err(|e| {
            conflict_or_backend(e, "Tag with this name, color or slug already exists")
        })?;
        Ok(Some(model.into()))
    }

    async fn delete_tag(&self, id: i32) -> DomainResult<bool> {
        let txn = self.db.begin().await.map_err(backend)?;
        recipe_tag::Entity::delete_many()
            .filter(recipe_tag::Column::TagId.eq(id))
            .exec(&txn)
            .await
            .map_err(backend)?;
        let result = tag::Entity::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(backend)?;
        txn.commit().await.map_err(backend)?;
        Ok(result.rows_affected > 0)
    }

    async fn list_ingredients(&self, name_prefix: Option<&str>) -> DomainResult<Vec<Ingredient>> {
        let mut select = ingredient::Entity::find();
        if let Some(prefix) = name_prefix {
            let term = escape_like(prefix.trim());
            if !term.is_empty() {
                select = select.filter(
                    Expr::expr(Func::lower(Expr::col(ingredient::Column::Name)))
                        .like(LikeExpr::new(format!("{}%", term.to_lowercase())).escape('\\')),
                );
            }
        }
        let rows = select
            .order_by_asc(ingredient::Column::Name)
            .order_by_asc(ingredient::Column::Id)
            .all(&self.db)
            .await
            .map_err(backend)?;
        Ok(rows.into_iter().map(Ingredient::from).collect())
    }

    async fn get_ingredient(&self, id: i32) -> DomainResult<Option<Ingredient>> {
        let row = ingredient::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(backend)?;
        Ok(row.map(Ingredient::from))
    }

    async fn find_ingredients(&self, ids: &[i32]) -> DomainResult<Vec<Ingredient>> {
        let rows = ingredient::Entity::find()
            .filter(ingredient::Column::Id.is_in(ids.to_vec()))
            .all(&self.db)
            .await
            .map_err(backend)?;
        Ok(rows.into_iter().map(Ingredient::from).collect())
    }

    async fn insert_ingredient(&self, draft: &IngredientDraft) -> DomainResult<Ingredient> {
        let model = ingredient::ActiveModel {
            name: Set(draft.name.clone()),
            measurement_unit: Set(draft.measurement_unit.clone()),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .map_err(|e| conflict_or_backend(e, "Ingredient with this name already exists"))?;
        Ok(model.into())
    }

    async fn update_ingredient(
        &self,
        id: i32,
        draft: &IngredientDraft,
    ) -> DomainResult<Option<Ingredient>> {
        let Some(existing) = ingredient::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(backend)?
        else {
            return Ok(None);
        };
        let mut active: ingredient::ActiveModel = existing.into();
        active.name = Set(draft.name.clone());
        active.measurement_unit = Set(draft.measurement_unit.clone());
        let model = active
            .update(&self.db)
            .await
            .map_err(|e| conflict_or_backend(e, "Ingredient with this name already exists"))?;
        Ok(Some(model.into()))
    }

    async fn delete_ingredient(&self, id: i32) -> DomainResult<bool> {
        let txn = self.db.begin().await.map_err(backend)?;
        recipe_ingredient::Entity::delete_many()
            .filter(recipe_ingredient::Column::IngredientId.eq(id))
            .exec(&txn)
            .await
            .map_err(backend)?;
        let result = ingredient::Entity::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(backend)?;
        txn.commit().await.map_err(backend)?;
        Ok(result.rows_affected > 0)
    }
}

#[async_trait]
impl UserStore for SeaOrmStore {
    async fn get_user(&self, id: i32) -> DomainResult<Option<User>> {
        let row = user::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(backend)?;
        Ok(row.map(User::from))
    }

    async fn find_users(&self, ids: &[i32]) -> DomainResult<Vec<User>> {
        let rows = user::Entity::find()
            .filter(user::Column::Id.is_in(ids.to_vec()))
            .order_by_asc(user::Column::Id)
            .all(&self.db)
            .await
            .map_err(backend)?;
        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn list_users(&self) -> DomainResult<Vec<User>> {
        let rows = user::Entity::find()
            .order_by_asc(user::Column::Id)
            .all(&self.db)
            .await
            .map_err(backend)?;
        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn insert_user(&self, new_user: &NewUser) -> DomainResult<User> {
        let model = user::ActiveModel {
            email: Set(new_user.email.clone()),
            username: Set(new_user.username.clone()),
            first_name: Set(new_user.first_name.clone()),
            last_name: Set(new_user.last_name.clone()),
            is_staff: Set(new_user.is_staff),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .map_err(|e| conflict_or_backend(e, "User with this email or username already exists"))?;
        Ok(model.into())
    }
}

#[async_trait]
impl RecipeStore for SeaOrmStore {
    async fn insert_recipe(&self, author_id: i32, draft: &RecipeDraft) -> DomainResult<Recipe> {
        let txn = self.db.begin().await.map_err(backend)?;

        let row = recipe::ActiveModel {
            author_id: Set(author_id),
            name: Set(draft.name.clone()),
            image: Set(draft.image.clone()),
            text: Set(draft.text.clone()),
            cooking_time: Set(draft.cooking_time),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(backend)?;
        insert_recipe_children(&txn, row.id, draft).await?;

        let recipe = load_recipes(&txn, vec![row])
            .await
            .map_err(backend)?
            .pop()
            .ok_or_else(|| DomainError::Backend("inserted recipe vanished".into()))?;
        txn.commit().await.map_err(backend)?;
        Ok(recipe)
    }

    async fn replace_recipe(&self, id: i32, draft: &RecipeDraft) -> DomainResult<Recipe> {
        let txn = self.db.begin().await.map_err(backend)?;

        let existing = find_recipe_for_update(&txn, id)
            .await
            .map_err(backend)?
            .ok_or(DomainError::NotFound("Recipe"))?;
        let mut active: recipe::ActiveModel = existing.into();
        active.name = Set(draft.name.clone());
        active.image = Set(draft.image.clone());
        active.text = Set(draft.text.clone());
        active.cooking_time = Set(draft.cooking_time);
        let row = active.update(&txn).await.map_err(backend)?;

        delete_recipe_children(&txn, id).await.map_err(backend)?;
        insert_recipe_children(&txn, id, draft).await?;

        let recipe = load_recipes(&txn, vec![row])
            .await
            .map_err(backend)?
            .pop()
            .ok_or(DomainError::NotFound("Recipe"))?;
        txn.commit().await.map_err(backend)?;
        Ok(recipe)
    }

    async fn delete_recipe(&self, id: i32) -> DomainResult<bool> {
        let txn = self.db.begin().await.map_err(backend)?;

        if find_recipe_for_update(&txn, id)
            .await
            .map_err(backend)?
            .is_none()
        {
            return Ok(false);
        }
        favorite::Entity::delete_many()
            .filter(favorite::Column::RecipeId.eq(id))
            .exec(&txn)
            .await
            .map_err(backend)?;
        shopping_cart::Entity::delete_many()
            .filter(shopping_cart::Column::RecipeId.eq(id))
            .exec(&txn)
            .await
            .map_err(backend)?;
        delete_recipe_children(&txn, id).await.map_err(backend)?;
        recipe::Entity::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(backend)?;

        txn.commit().await.map_err(backend)?;
        Ok(true)
    }

    async fn get_recipe(&self, id: i32) -> DomainResult<Option<Recipe>> {
        load_recipe(&self.db, id).await.map_err(backend)
    }

    async fn list_recipes(&self, filter: &RecipeFilter) -> DomainResult<Vec<Recipe>> {
        let mut select = recipe::Entity::find();

        if let Some(author_id) = filter.author_id {
            select = select.filter(recipe::Column::AuthorId.eq(author_id));
        }
        if !filter.tag_slugs.is_empty() {
            select = select.filter(
                recipe::Column::Id.in_subquery(
                    SeaQuery::select()
                        .column(recipe_tag::Column::RecipeId)
                        .from(recipe_tag::Entity)
                        .and_where(
                            recipe_tag::Column::TagId.in_subquery(
                                SeaQuery::select()
                                    .column(tag::Column::Id)
                                    .from(tag::Entity)
                                    .and_where(tag::Column::Slug.is_in(filter.tag_slugs.clone()))
                                    .to_owned(),
                            ),
                        )
                        .to_owned(),
                ),
            );
        }
        if let Some(user_id) = filter.favorited_by {
            select = select.filter(
                recipe::Column::Id.in_subquery(
                    SeaQuery::select()
                        .column(favorite::Column::RecipeId)
                        .from(favorite::Entity)
                        .and_where(favorite::Column::UserId.eq(user_id))
                        .to_owned(),
                ),
            );
        }
        if let Some(user_id) = filter.in_cart_of {
            select = select.filter(
                recipe::Column::Id.in_subquery(
                    SeaQuery::select()
                        .column(shopping_cart::Column::RecipeId)
                        .from(shopping_cart::Entity)
                        .and_where(shopping_cart::Column::UserId.eq(user_id))
                        .to_owned(),
                ),
            );
        }

        let rows = select
            .order_by_desc(recipe::Column::CreatedAt)
            .order_by_desc(recipe::Column::Id)
            .limit(filter.limit)
            .all(&self.db)
            .await
            .map_err(backend)?;
        load_recipes(&self.db, rows).await.map_err(backend)
    }

    async fn count_recipes_by(&self, author_id: i32) -> DomainResult<u64> {
        recipe::Entity::find()
            .filter(recipe::Column::AuthorId.eq(author_id))
            .count(&self.db)
            .await
            .map_err(backend)
    }
}

#[async_trait]
impl RelationStore for SeaOrmStore {
    async fn add_recipe_relation(
        &self,
        kind: RecipeRelation,
        user_id: i32,
        recipe_id: i32,
    ) -> DomainResult<bool> {
        let now = Utc::now();
        let result = match kind {
            RecipeRelation::Favorite => favorite::ActiveModel {
                user_id: Set(user_id),
                recipe_id: Set(recipe_id),
                created_at: Set(now),
            }
            .insert(&self.db)
            .await
            .map(|_| ()),
            RecipeRelation::ShoppingCart => shopping_cart::ActiveModel {
                user_id: Set(user_id),
                recipe_id: Set(recipe_id),
                created_at: Set(now),
            }
            .insert(&self.db)
            .await
            .map(|_| ()),
        };
        match result {
            Ok(()) => Ok(true),
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                tracing::debug!(user_id, recipe_id, "Relation insert lost a race");
                Ok(false)
            }
            Err(e) => Err(recipe_fk_violation(e)),
        }
    }

    async fn remove_recipe_relation(
        &self,
        kind: RecipeRelation,
        user_id: i32,
        recipe_id: i32,
    ) -> DomainResult<bool> {
        let result = match kind {
            RecipeRelation::Favorite => {
                favorite::Entity::delete_many()
                    .filter(favorite::Column::UserId.eq(user_id))
                    .filter(favorite::Column::RecipeId.eq(recipe_id))
                    .exec(&self.db)
                    .await
            }
            RecipeRelation::ShoppingCart => {
                shopping_cart::Entity::delete_many()
                    .filter(shopping_cart::Column::UserId.eq(user_id))
                    .filter(shopping_cart::Column::RecipeId.eq(recipe_id))
                    .exec(&self.db)
                    .await
            }
        }
        .map_err(backend)?;
        Ok(result.rows_affected > 0)
    }

    async fn related_recipes(
        &self,
        kind: RecipeRelation,
        user_id: i32,
        recipe_ids: &[i32],
    ) -> DomainResult<HashSet<i32>> {
        if recipe_ids.is_empty() {
            return Ok(HashSet::new());
        }
        let ids = recipe_ids.to_vec();
        let related: HashSet<i32> = match kind {
            RecipeRelation::Favorite => favorite::Entity::find()
                .filter(favorite::Column::UserId.eq(user_id))
                .filter(favorite::Column::RecipeId.is_in(ids))
                .all(&self.db)
                .await
                .map_err(backend)?
                .into_iter()
                .map(|row| row.recipe_id)
                .collect(),
            RecipeRelation::ShoppingCart => shopping_cart::Entity::find()
                .filter(shopping_cart::Column::UserId.eq(user_id))
                .filter(shopping_cart::Column::RecipeId.is_in(ids))
                .all(&self.db)
                .await
                .map_err(backend)?
                .into_iter()
                .map(|row| row.recipe_id)
                .collect(),
        };
        Ok(related)
    }

    async fn add_subscription(&self, user_id: i32, author_id: i32) -> DomainResult<bool> {
        let result = subscription::ActiveModel {
            user_id: Set(user_id),
            author_id: Set(author_id),
            created_at: Set(Utc::now()),
        }
        .insert(&self.db)
        .await;
        match result {
            Ok(_) => Ok(true),
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                tracing::debug!(user_id, author_id, "Subscription insert lost a race");
                Ok(false)
            }
            Err(e) => Err(backend(e)),
        }
    }

    async fn remove_subscription(&self, user_id: i32, author_id: i32) -> DomainResult<bool> {
        let result = subscription::Entity::delete_many()
            .filter(subscription::Column::UserId.eq(user_id))
            .filter(subscription::Column::AuthorId.eq(author_id))
            .exec(&self.db)
            .await
            .map_err(backend)?;
        Ok(result.rows_affected > 0)
    }

    async fn subscribed_authors(
        &self,
        user_id: i32,
        author_ids: &[i32],
    ) -> DomainResult<HashSet<i32>> {
        if author_ids.is_empty() {
            return Ok(HashSet::new());
        }
        let rows = subscription::Entity::find()
            .filter(subscription::Column::UserId.eq(user_id))
            .filter(subscription::Column::AuthorId.is_in(author_ids.to_vec()))
            .all(&self.db)
            .await
            .map_err(backend)?;
        Ok(rows.into_iter().map(|row| row.author_id).collect())
    }

    async fn list_subscriptions(
        &self,
        user_id: i32,
        offset: u64,
        limit: u64,
    ) -> DomainResult<(Vec<User>, u64)> {
        let query = subscription::Entity::find().filter(subscription::Column::UserId.eq(user_id));
        let total = query.clone().count(&self.db).await.map_err(backend)?;

        let author_ids: Vec<i32> = query
            .order_by_desc(subscription::Column::CreatedAt)
            .order_by_desc(subscription::Column::AuthorId)
            .offset(offset)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(backend)?
            .into_iter()
            .map(|row| row.author_id)
            .collect();

        let mut authors: HashMap<i32, User> = user::Entity::find()
            .filter(user::Column::Id.is_in(author_ids.clone()))
            .all(&self.db)
            .await
            .map_err(backend)?
            .into_iter()
            .map(|u| (u.id, User::from(u)))
            .collect();
        let page = author_ids
            .into_iter()
            .filter_map(|id| authors.remove(&id))
            .collect();
        Ok((page, total))
    }

    async fn cart_lines(&self, user_id: i32) -> DomainResult<Vec<CartLine>> {
        let lines = recipe_ingredient::Entity::find()
            .filter(
                recipe_ingredient::Column::RecipeId.in_subquery(
                    SeaQuery::select()
                        .column(shopping_cart::Column::RecipeId)
                        .from(shopping_cart::Entity)
                        .and_where(shopping_cart::Column::UserId.eq(user_id))
                        .to_owned(),
                ),
            )
            .all(&self.db)
            .await
            .map_err(backend)?;
        let ids: HashSet<i32> = lines.iter().map(|l| l.ingredient_id).collect();
        let ingredients: HashMap<i32, ingredient::Model> = ingredient::Entity::find()
            .filter(ingredient::Column::Id.is_in(ids))
            .all(&self.db)
            .await
            .map_err(backend)?
            .into_iter()
            .map(|i| (i.id, i))
            .collect();

        Ok(lines
            .into_iter()
            .filter_map(|line| {
                ingredients.get(&line.ingredient_id).map(|i| CartLine {
                    name: i.name.clone(),
                    measurement_unit: i.measurement_unit.clone(),
                    amount: i64::from(line.amount),
                })
            })
            .collect())
    }
}
