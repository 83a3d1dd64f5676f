//! Recipe aggregate operations: create, replace-on-update, delete, read.

use std::collections::{HashMap, HashSet};

use tracing::{info, warn};

use crate::error::{DomainError, DomainResult};
use crate::model::{
    Actor, IngredientSpec, Recipe, RecipeDraft, RecipeFilter, RecipePatch, RecipeRelation,
};
use crate::policy::{self, Capability};
use crate::store::Store;
use crate::users::{self, UserCard};

pub const MIN_COOKING_TIME: i32 = 1;
pub const MAX_COOKING_TIME: i32 = 500;
pub const MIN_AMOUNT: i32 = 1;
pub const MAX_AMOUNT: i32 = 1000;

/// A recipe as seen by one particular caller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecipeCard {
    pub recipe: Recipe,
    pub author: UserCard,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
}

/// Caller-facing list query.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RecipeQuery {
    pub author_id: Option<i32>,
    pub tag_slugs: Vec<String>,
    /// Only recipes the caller favorited. Ignored for anonymous callers.
    pub is_favorited: bool,
    /// Only recipes in the caller's cart. Ignored for anonymous callers.
    pub is_in_shopping_cart: bool,
}

/// Checks everything that can be checked without the store.
pub fn validate_draft(draft: &RecipeDraft) -> DomainResult<()> {
    let name = draft.name.trim();
    if name.is_empty() || name.chars().count() > 200 {
        return Err(DomainError::validation("name", "Name must be 1-200 characters"));
    }
    let text = draft.text.trim();
    if text.is_empty() || text.chars().count() > 5000 {
        return Err(DomainError::validation("text", "Text must be 1-5000 characters"));
    }
    if draft.image.is_empty() {
        return Err(DomainError::validation("image", "Image is required"));
    }
    if !(MIN_COOKING_TIME..=MAX_COOKING_TIME).contains(&draft.cooking_time) {
        return Err(DomainError::validation(
            "cooking_time",
            format!("Cooking time must be {MIN_COOKING_TIME}-{MAX_COOKING_TIME} minutes"),
        ));
    }

    if draft.tag_ids.is_empty() {
        return Err(DomainError::validation("tags", "At least one tag is required"));
    }
    let mut seen = HashSet::new();
    for &id in &draft.tag_ids {
        if !seen.insert(id) {
            return Err(DomainError::validation("tags", format!("Duplicate tag {id}")));
        }
    }

    validate_ingredient_specs(&draft.ingredients)
}

fn validate_ingredient_specs(specs: &[IngredientSpec]) -> DomainResult<()> {
    if specs.is_empty() {
        return Err(DomainError::validation(
            "ingredients",
            "At least one ingredient is required",
        ));
    }
    let mut seen = HashSet::new();
    for spec in specs {
        if !(MIN_AMOUNT..=MAX_AMOUNT).contains(&spec.amount) {
            return Err(DomainError::validation(
                "ingredients",
                format!(
                    "Amount of ingredient {} must be {MIN_AMOUNT}-{MAX_AMOUNT}",
                    spec.ingredient_id
                ),
            ));
        }
        if !seen.insert(spec.ingredient_id) {
            return Err(DomainError::validation(
                "ingredients",
                format!("Duplicate ingredient {}", spec.ingredient_id),
            ));
        }
    }
    Ok(())
}

/// Every referenced tag and ingredient must exist.
async fn check_references<S: Store + ?Sized>(store: &S, draft: &RecipeDraft) -> DomainResult<()> {
    let found: HashSet<i32> = store
        .find_tags(&draft.tag_ids)
        .await?
        .into_iter()
        .map(|t| t.id)
        .collect();
    let missing: Vec<i32> = draft
        .tag_ids
        .iter()
        .copied()
        .filter(|id| !found.contains(id))
        .collect();
    if !missing.is_empty() {
        return Err(DomainError::validation(
            "tags",
            format!("Unknown tag ids: {missing:?}"),
        ));
    }

    let ids: Vec<i32> = draft.ingredients.iter().map(|s| s.ingredient_id).collect();
    let found: HashSet<i32> = store
        .find_ingredients(&ids)
        .await?
        .into_iter()
        .map(|i| i.id)
        .collect();
    let missing: Vec<i32> = ids.into_iter().filter(|id| !found.contains(id)).collect();
    if !missing.is_empty() {
        return Err(DomainError::validation(
            "ingredients",
            format!("Unknown ingredient ids: {missing:?}"),
        ));
    }
    Ok(())
}

fn normalized(draft: RecipeDraft) -> RecipeDraft {
    RecipeDraft {
        name: draft.name.trim().to_string(),
        text: draft.text.trim().to_string(),
        ..draft
    }
}

/// Fills the gaps of a patch from the stored recipe.
pub fn merge_patch(existing: &Recipe, patch: RecipePatch) -> RecipeDraft {
    RecipeDraft {
        name: patch.name.unwrap_or_else(|| existing.name.clone()),
        image: patch.image.unwrap_or_else(|| existing.image.clone()),
        text: patch.text.unwrap_or_else(|| existing.text.clone()),
        cooking_time: patch.cooking_time.unwrap_or(existing.cooking_time),
        tag_ids: patch
            .tag_ids
            .unwrap_or_else(|| existing.tags.iter().map(|t| t.id).collect()),
        ingredients: patch.ingredients.unwrap_or_else(|| {
            existing
                .ingredients
                .iter()
                .map(|line| IngredientSpec {
                    ingredient_id: line.ingredient.id,
                    amount: line.amount,
                })
                .collect()
        }),
    }
}

pub async fn create<S: Store + ?Sized>(
    store: &S,
    actor: &Actor,
    draft: RecipeDraft,
) -> DomainResult<RecipeCard> {
    validate_draft(&draft)?;
    check_references(store, &draft).await?;

    let recipe = store
        .insert_recipe(actor.user_id, &normalized(draft))
        .await?;
    info!(
        recipe_id = recipe.id,
        author_id = actor.user_id,
        ingredients = recipe.ingredients.len(),
        "Recipe created"
    );

    single_card(store, Some(actor), recipe).await
}

/// Loads the recipe and checks that `actor` may modify it.
pub async fn ensure_can_modify<S: Store + ?Sized>(
    store: &S,
    actor: &Actor,
    id: i32,
) -> DomainResult<Recipe> {
    let existing = store
        .get_recipe(id)
        .await?
        .ok_or(DomainError::NotFound("Recipe"))?;
    policy::recipe(Some(actor), existing.author_id, Capability::Write).require()?;
    Ok(existing)
}

pub async fn update<S: Store + ?Sized>(
    store: &S,
    actor: &Actor,
    id: i32,
    patch: RecipePatch,
) -> DomainResult<RecipeCard> {
    let existing = ensure_can_modify(store, actor, id).await?;

    let draft = merge_patch(&existing, patch);
    validate_draft(&draft)?;
    check_references(store, &draft).await?;

    let recipe = store.replace_recipe(id, &normalized(draft)).await?;
    info!(recipe_id = id, user_id = actor.user_id, "Recipe replaced");

    single_card(store, Some(actor), recipe).await
}

pub async fn delete<S: Store + ?Sized>(store: &S, actor: &Actor, id: i32) -> DomainResult<()> {
    ensure_can_modify(store, actor, id).await?;

    if !store.delete_recipe(id).await? {
        return Err(DomainError::NotFound("Recipe"));
    }
    info!(recipe_id = id, user_id = actor.user_id, "Recipe deleted");
    Ok(())
}

pub async fn get<S: Store + ?Sized>(
    store: &S,
    viewer: Option<&Actor>,
    id: i32,
) -> DomainResult<RecipeCard> {
    let recipe = store
        .get_recipe(id)
        .await?
        .ok_or(DomainError::NotFound("Recipe"))?;
    single_card(store, viewer, recipe).await
}

pub async fn list<S: Store + ?Sized>(
    store: &S,
    viewer: Option<&Actor>,
    query: &RecipeQuery,
) -> DomainResult<Vec<RecipeCard>> {
    let viewer_id = viewer.map(|a| a.user_id);
    let filter = RecipeFilter {
        author_id: query.author_id,
        tag_slugs: query.tag_slugs.clone(),
        favorited_by: viewer_id.filter(|_| query.is_favorited),
        in_cart_of: viewer_id.filter(|_| query.is_in_shopping_cart),
        limit: None,
    };
    let recipes = store.list_recipes(&filter).await?;
    cards(store, viewer, recipes).await
}

pub(crate) async fn single_card<S: Store + ?Sized>(
    store: &S,
    viewer: Option<&Actor>,
    recipe: Recipe,
) -> DomainResult<RecipeCard> {
    cards(store, viewer, vec![recipe])
        .await?
        .pop()
        .ok_or_else(|| DomainError::Backend("recipe author is missing".into()))
}

/// Decorates recipes with author cards and the viewer's relation flags.
pub async fn cards<S: Store + ?Sized>(
    store: &S,
    viewer: Option<&Actor>,
    recipes: Vec<Recipe>,
) -> DomainResult<Vec<RecipeCard>> {
    let recipe_ids: Vec<i32> = recipes.iter().map(|r| r.id).collect();
    let mut author_ids: Vec<i32> = recipes.iter().map(|r| r.author_id).collect();
    author_ids.sort_unstable();
    author_ids.dedup();

    let authors: HashMap<i32, UserCard> = users::cards(store, viewer, &author_ids)
        .await?
        .into_iter()
        .map(|card| (card.user.id, card))
        .collect();

    let (favorited, in_cart) = match viewer {
        Some(actor) => (
            store
                .related_recipes(RecipeRelation::Favorite, actor.user_id, &recipe_ids)
                .await?,
            store
                .related_recipes(RecipeRelation::ShoppingCart, actor.user_id, &recipe_ids)
                .await?,
        ),
        None => (HashSet::new(), HashSet::new()),
    };

    let mut out = Vec::with_capacity(recipes.len());
    for recipe in recipes {
        let Some(author) = authors.get(&recipe.author_id).cloned() else {
            warn!(recipe_id = recipe.id, author_id = recipe.author_id, "Recipe author missing");
            continue;
        };
        out.push(RecipeCard {
            is_favorited: favorited.contains(&recipe.id),
            is_in_shopping_cart: in_cart.contains(&recipe.id),
            author,
            recipe,
        });
    }
    Ok(out)
}
