//! In-process store backend.
//!
//! All state lives behind one mutex, so every trait call is atomic and the
//! uniqueness rules of the relational schema hold without transactions.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use crate::error::{DomainError, DomainResult};
use crate::model::{
    CartLine, Ingredient, IngredientDraft, IngredientLine, IngredientSpec, NewUser, Recipe,
    RecipeDraft, RecipeFilter, RecipeRelation, Tag, TagDraft, User,
};
use crate::store::{CatalogStore, RecipeStore, RelationStore, UserStore};

#[derive(Clone, Debug)]
struct RecipeRow {
    id: i32,
    author_id: i32,
    name: String,
    image: String,
    text: String,
    cooking_time: i32,
    created_at: chrono::DateTime<Utc>,
    tag_ids: Vec<i32>,
    lines: Vec<IngredientSpec>,
}

#[derive(Default)]
struct State {
    last_id: i32,
    users: BTreeMap<i32, User>,
    tags: BTreeMap<i32, Tag>,
    ingredients: BTreeMap<i32, Ingredient>,
    recipes: BTreeMap<i32, RecipeRow>,
    favorites: BTreeSet<(i32, i32)>,
    cart: BTreeSet<(i32, i32)>,
    /// (follower, author) -> insertion sequence.
    subscriptions: BTreeMap<(i32, i32), u64>,
    subscription_seq: u64,
}

impl State {
    fn next_id(&mut self) -> i32 {
        self.last_id += 1;
        self.last_id
    }

    fn relation_set(&mut self, kind: RecipeRelation) -> &mut BTreeSet<(i32, i32)> {
        match kind {
            RecipeRelation::Favorite => &mut self.favorites,
            RecipeRelation::ShoppingCart => &mut self.cart,
        }
    }

    fn tag_conflict(&self, draft: &TagDraft, except: Option<i32>) -> Option<&'static str> {
        self.tags
            .values()
            .filter(|t| Some(t.id) != except)
            .find_map(|t| {
                if t.name == draft.name {
                    Some("name")
                } else if t.color == draft.color {
                    Some("color")
                } else if t.slug == draft.slug {
                    Some("slug")
                } else {
                    None
                }
            })
    }

    fn ingredient_name_taken(&self, name: &str, except: Option<i32>) -> bool {
        self.ingredients
            .values()
            .any(|i| Some(i.id) != except && i.name == name)
    }

    fn materialize(&self, row: &RecipeRow) -> Recipe {
        let mut tags: Vec<Tag> = row
            .tag_ids
            .iter()
            .filter_map(|id| self.tags.get(id).cloned())
            .collect();
        tags.sort_by_key(|t| t.id);
        let ingredients = row
            .lines
            .iter()
            .filter_map(|spec| {
                self.ingredients
                    .get(&spec.ingredient_id)
                    .map(|ingredient| IngredientLine {
                        ingredient: ingredient.clone(),
                        amount: spec.amount,
                    })
            })
            .collect();
        Recipe {
            id: row.id,
            author_id: row.author_id,
            name: row.name.clone(),
            image: row.image.clone(),
            text: row.text.clone(),
            cooking_time: row.cooking_time,
            created_at: row.created_at,
            tags,
            ingredients,
        }
    }

    fn matches(&self, row: &RecipeRow, filter: &RecipeFilter) -> bool {
        if filter.author_id.is_some_and(|a| a != row.author_id) {
            return false;
        }
        if !filter.tag_slugs.is_empty() {
            let has_tag = row.tag_ids.iter().any(|id| {
                self.tags
                    .get(id)
                    .is_some_and(|t| filter.tag_slugs.contains(&t.slug))
            });
            if !has_tag {
                return false;
            }
        }
        if filter
            .favorited_by
            .is_some_and(|u| !self.favorites.contains(&(u, row.id)))
        {
            return false;
        }
        if filter
            .in_cart_of
            .is_some_and(|u| !self.cart.contains(&(u, row.id)))
        {
            return false;
        }
        true
    }

    fn check_recipe_refs(&self, draft: &RecipeDraft) -> DomainResult<()> {
        if let Some(id) = draft.tag_ids.iter().find(|id| !self.tags.contains_key(id)) {
            return Err(DomainError::validation("tags", format!("Unknown tag id {id}")));
        }
        if let Some(spec) = draft
            .ingredients
            .iter()
            .find(|s| !self.ingredients.contains_key(&s.ingredient_id))
        {
            return Err(DomainError::validation(
                "ingredients",
                format!("Unknown ingredient id {}", spec.ingredient_id),
            ));
        }
        Ok(())
    }
}

/// Store kept entirely in memory. Selected with `database.url = "memory://"`.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn list_tags(&self) -> DomainResult<Vec<Tag>> {
        Ok(self.state.lock().await.tags.values().cloned().collect())
    }

    async fn get_tag(&self, id: i32) -> DomainResult<Option<Tag>> {
        Ok(self.state.lock().await.tags.get(&id).cloned())
    }

    async fn find_tags(&self, ids: &[i32]) -> DomainResult<Vec<Tag>> {
        let state = self.state.lock().await;
        Ok(state
            .tags
            .values()
            .filter(|t| ids.contains(&t.id))
            .cloned()
            .collect())
    }

    async fn insert_tag(&self, draft: &TagDraft) -> DomainResult<Tag> {
        let mut state = self.state.lock().await;
        if let Some(field) = state.tag_conflict(draft, None) {
            return Err(DomainError::Conflict(format!("Tag with this {field} already exists")));
        }
        let tag = Tag {
            id: state.next_id(),
            name: draft.name.clone(),
            color: draft.color.clone(),
            slug: draft.slug.clone(),
        };
        state.tags.insert(tag.id, tag.clone());
        Ok(tag)
    }

    async fn update_tag(&self, id: i32, draft: &TagDraft) -> DomainResult<Option<Tag>> {
        let mut state = self.state.lock().await;
        if !state.tags.contains_key(&id) {
            return Ok(None);
        }
        if let Some(field) = state.tag_conflict(draft, Some(id)) {
            return Err(DomainError::Conflict(format!("Tag with this {field} already exists")));
        }
        let tag = Tag {
            id,
            name: draft.name.clone(),
            color: draft.color.clone(),
            slug: draft.slug.clone(),
        };
        state.tags.insert(id, tag.clone());
        Ok(Some(tag))
    }

    async fn delete_tag(&self, id: i32) -> DomainResult<bool> {
        let mut state = self.state.lock().await;
        if state.tags.remove(&id).is_none() {
            return Ok(false);
        }
        for row in state.recipes.values_mut() {
            row.tag_ids.retain(|t| *t != id);
        }
        Ok(true)
    }

    async fn list_ingredients(&self, name_prefix: Option<&str>) -> DomainResult<Vec<Ingredient>> {
        let state = self.state.lock().await;
        let prefix = name_prefix.map(str::to_lowercase);
        let mut out: Vec<Ingredient> = state
            .ingredients
            .values()
            .filter(|i| {
                prefix
                    .as_deref()
                    .is_none_or(|p| i.name.to_lowercase().starts_with(p))
            })
            .cloned()
            .collect();
        out.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(out)
    }

    async fn get_ingredient(&self, id: i32) -> DomainResult<Option<Ingredient>> {
        Ok(self.state.lock().await.ingredients.get(&id).cloned())
    }

    async fn find_ingredients(&self, ids: &[i32]) -> DomainResult<Vec<Ingredient>> {
        let state = self.state.lock().await;
        Ok(state
            .ingredients
            .values()
            .filter(|i| ids.contains(&i.id))
            .cloned()
            .collect())
    }

    async fn insert_ingredient(&self, draft: &IngredientDraft) -> DomainResult<Ingredient> {
        let mut state = self.state.lock().await;
        if state.ingredient_name_taken(&draft.name, None) {
            return Err(DomainError::Conflict(
                "Ingredient with this name already exists".into(),
            ));
        }
        let ingredient = Ingredient {
            id: state.next_id(),
            name: draft.name.clone(),
            measurement_unit: draft.measurement_unit.clone(),
        };
        state.ingredients.insert(ingredient.id, ingredient.clone());
        Ok(ingredient)
    }

    async fn update_ingredient(
        &self,
        id: i32,
        draft: &IngredientDraft,
    ) -> DomainResult<Option<Ingredient>> {
        let mut state = self.state.lock().await;
        if !state.ingredients.contains_key(&id) {
            return Ok(None);
        }
        if state.ingredient_name_taken(&draft.name, Some(id)) {
            return Err(DomainError::Conflict(
                "Ingredient with this name already exists".into(),
            ));
        }
        let ingredient = Ingredient {
            id,
            name: draft.name.clone(),
            measurement_unit: draft.measurement_unit.clone(),
        };
        state.ingredients.insert(id, ingredient.clone());
        Ok(Some(ingredient))
    }

    async fn delete_ingredient(&self, id: i32) -> DomainResult<bool> {
        let mut state = self.state.lock().await;
        if state.ingredients.remove(&id).is_none() {
            return Ok(false);
        }
        for row in state.recipes.values_mut() {
            row.lines.retain(|l| l.ingredient_id != id);
        }
        Ok(true)
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn get_user(&self, id: i32) -> DomainResult<Option<User>> {
        Ok(self.state.lock().await.users.get(&id).cloned())
    }

    async fn find_users(&self, ids: &[i32]) -> DomainResult<Vec<User>> {
        let state = self.state.lock().await;
        Ok(state
            .users
            .values()
            .filter(|u| ids.contains(&u.id))
            .cloned()
            .collect())
    }

    async fn list_users(&self) -> DomainResult<Vec<User>> {
        Ok(self.state.lock().await.users.values().cloned().collect())
    }

    async fn insert_user(&self, new_user: &NewUser) -> DomainResult<User> {
        let mut state = self.state.lock().await;
        if state
            .users
            .values()
            .any(|u| u.email == new_user.email || u.username == new_user.username)
        {
            return Err(DomainError::Conflict(
                "User with this email or username already exists".into(),
            ));
        }
        let user = User {
            id: state.next_id(),
            email: new_user.email.clone(),
            username: new_user.username.clone(),
            first_name: new_user.first_name.clone(),
            last_name: new_user.last_name.clone(),
            is_staff: new_user.is_staff,
            created_at: Utc::now(),
        };
        state.users.insert(user.id, user.clone());
        Ok(user)
    }
}

#[async_trait]
impl RecipeStore for MemoryStore {
    async fn insert_recipe(&self, author_id: i32, draft: &RecipeDraft) -> DomainResult<Recipe> {
        let mut state = self.state.lock().await;
        if !state.users.contains_key(&author_id) {
            return Err(DomainError::NotFound("User"));
        }
        state.check_recipe_refs(draft)?;
        let row = RecipeRow {
            id: state.next_id(),
            author_id,
            name: draft.name.clone(),
            image: draft.image.clone(),
            text: draft.text.clone(),
            cooking_time: draft.cooking_time,
            created_at: Utc::now(),
            tag_ids: draft.tag_ids.clone(),
            lines: draft.ingredients.clone(),
        };
        let recipe = state.materialize(&row);
        state.recipes.insert(row.id, row);
        Ok(recipe)
    }

    async fn replace_recipe(&self, id: i32, draft: &RecipeDraft) -> DomainResult<Recipe> {
        let mut state = self.state.lock().await;
        state.check_recipe_refs(draft)?;
        let row = state
            .recipes
            .get_mut(&id)
            .ok_or(DomainError::NotFound("Recipe"))?;
        row.name = draft.name.clone();
        row.image = draft.image.clone();
        row.text = draft.text.clone();
        row.cooking_time = draft.cooking_time;
        row.tag_ids = draft.tag_ids.clone();
        row.lines = draft.ingredients.clone();
        let row = row.clone();
        Ok(state.materialize(&row))
    }

    async fn delete_recipe(&self, id: i32) -> DomainResult<bool> {
        let mut state = self.state.lock().await;
        if state.recipes.remove(&id).is_none() {
            return Ok(false);
        }
        state.favorites.retain(|(_, r)| *r != id);
        state.cart.retain(|(_, r)| *r != id);
        Ok(true)
    }

    async fn get_recipe(&self, id: i32) -> DomainResult<Option<Recipe>> {
        let state = self.state.lock().await;
        Ok(state.recipes.get(&id).map(|row| state.materialize(row)))
    }

    async fn list_recipes(&self, filter: &RecipeFilter) -> DomainResult<Vec<Recipe>> {
        let state = self.state.lock().await;
        let mut rows: Vec<&RecipeRow> = state
            .recipes
            .values()
            .filter(|row| state.matches(row, filter))
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        let limit = filter.limit.map_or(usize::MAX, |l| l as usize);
        Ok(rows
            .into_iter()
            .take(limit)
            .map(|row| state.materialize(row))
            .collect())
    }

    async fn count_recipes_by(&self, author_id: i32) -> DomainResult<u64> {
        let state = self.state.lock().await;
        Ok(state
            .recipes
            .values()
            .filter(|r| r.author_id == author_id)
            .count() as u64)
    }
}

#[async_trait]
impl RelationStore for MemoryStore {
    async fn add_recipe_relation(
        &self,
        kind: RecipeRelation,
        user_id: i32,
        recipe_id: i32,
    ) -> DomainResult<bool> {
        let mut state = self.state.lock().await;
        if !state.recipes.contains_key(&recipe_id) {
            return Err(DomainError::NotFound("Recipe"));
        }
        Ok(state.relation_set(kind).insert((user_id, recipe_id)))
    }

    async fn remove_recipe_relation(
        &self,
        kind: RecipeRelation,
        user_id: i32,
        recipe_id: i32,
    ) -> DomainResult<bool> {
        let mut state = self.state.lock().await;
        Ok(state.relation_set(kind).remove(&(user_id, recipe_id)))
    }

    async fn related_recipes(
        &self,
        kind: RecipeRelation,
        user_id: i32,
        recipe_ids: &[i32],
    ) -> DomainResult<HashSet<i32>> {
        let mut state = self.state.lock().await;
        let set = state.relation_set(kind);
        Ok(recipe_ids
            .iter()
            .copied()
            .filter(|id| set.contains(&(user_id, *id)))
            .collect())
    }

    async fn add_subscription(&self, user_id: i32, author_id: i32) -> DomainResult<bool> {
        let mut state = self.state.lock().await;
        if state.subscriptions.contains_key(&(user_id, author_id)) {
            return Ok(false);
        }
        state.subscription_seq += 1;
        let seq = state.subscription_seq;
        state.subscriptions.insert((user_id, author_id), seq);
        Ok(true)
    }

    async fn remove_subscription(&self, user_id: i32, author_id: i32) -> DomainResult<bool> {
        let mut state = self.state.lock().await;
        Ok(state.subscriptions.remove(&(user_id, author_id)).is_some())
    }

    async fn subscribed_authors(
        &self,
        user_id: i32,
        author_ids: &[i32],
    ) -> DomainResult<HashSet<i32>> {
        let state = self.state.lock().await;
        Ok(author_ids
            .iter()
            .copied()
            .filter(|id| state.subscriptions.contains_key(&(user_id, *id)))
            .collect())
    }

    async fn list_subscriptions(
        &self,
        user_id: i32,
        offset: u64,
        limit: u64,
    ) -> DomainResult<(Vec<User>, u64)> {
        let state = self.state.lock().await;
        let mut followed: Vec<(u64, i32)> = state
            .subscriptions
            .iter()
            .filter(|((follower, _), _)| *follower == user_id)
            .map(|((_, author), seq)| (*seq, *author))
            .collect();
        followed.sort_by(|a, b| b.0.cmp(&a.0));
        let total = followed.len() as u64;
        let page = followed
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .filter_map(|(_, author)| state.users.get(&author).cloned())
            .collect();
        Ok((page, total))
    }

    async fn cart_lines(&self, user_id: i32) -> DomainResult<Vec<CartLine>> {
        let state = self.state.lock().await;
        let mut out = Vec::new();
        for &(_, recipe_id) in state.cart.range((user_id, i32::MIN)..=(user_id, i32::MAX)) {
            let Some(row) = state.recipes.get(&recipe_id) else {
                continue;
            };
            for spec in &row.lines {
                if let Some(ingredient) = state.ingredients.get(&spec.ingredient_id) {
                    out.push(CartLine {
                        name: ingredient.name.clone(),
                        measurement_unit: ingredient.measurement_unit.clone(),
                        amount: i64::from(spec.amount),
                    });
                }
            }
        }
        Ok(out)
    }
}
