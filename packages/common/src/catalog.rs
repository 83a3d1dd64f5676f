//! Tag and ingredient curation.

use tracing::info;

use crate::error::{DomainError, DomainResult};
use crate::model::{Actor, Ingredient, IngredientDraft, Tag, TagDraft};
use crate::policy::{self, Capability};
use crate::store::Store;

/// `#rgb` or `#rrggbb`.
pub fn is_hex_color(color: &str) -> bool {
    match color.strip_prefix('#') {
        Some(digits) => {
            (digits.len() == 3 || digits.len() == 6)
                && digits.chars().all(|c| c.is_ascii_hexdigit())
        }
        None => false,
    }
}

fn is_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

pub fn validate_tag(draft: &TagDraft) -> DomainResult<()> {
    let name = draft.name.trim();
    if name.is_empty() || name.chars().count() > 50 {
        return Err(DomainError::validation("name", "Name must be 1-50 characters"));
    }
    if !is_hex_color(&draft.color) {
        return Err(DomainError::validation(
            "color",
            "Color must be a hex value like #E26C2D",
        ));
    }
    if !is_slug(&draft.slug) || draft.slug.len() > 50 {
        return Err(DomainError::validation(
            "slug",
            "Slug must be 1-50 letters, digits, hyphens or underscores",
        ));
    }
    Ok(())
}

pub fn validate_ingredient(draft: &IngredientDraft) -> DomainResult<()> {
    let name = draft.name.trim();
    if name.is_empty() || name.chars().count() > 200 {
        return Err(DomainError::validation("name", "Name must be 1-200 characters"));
    }
    let unit = draft.measurement_unit.trim();
    if unit.is_empty() || unit.chars().count() > 200 {
        return Err(DomainError::validation(
            "measurement_unit",
            "Measurement unit must be 1-200 characters",
        ));
    }
    Ok(())
}

fn normalized_tag(draft: &TagDraft) -> TagDraft {
    TagDraft {
        name: draft.name.trim().to_string(),
        color: draft.color.to_uppercase(),
        slug: draft.slug.clone(),
    }
}

fn normalized_ingredient(draft: &IngredientDraft) -> IngredientDraft {
    IngredientDraft {
        name: draft.name.trim().to_string(),
        measurement_unit: draft.measurement_unit.trim().to_string(),
    }
}

pub async fn list_tags<S: Store + ?Sized>(store: &S) -> DomainResult<Vec<Tag>> {
    store.list_tags().await
}

pub async fn get_tag<S: Store + ?Sized>(store: &S, id: i32) -> DomainResult<Tag> {
    store.get_tag(id).await?.ok_or(DomainError::NotFound("Tag"))
}

pub async fn list_ingredients<S: Store + ?Sized>(
    store: &S,
    name_prefix: Option<&str>,
) -> DomainResult<Vec<Ingredient>> {
    let prefix = name_prefix.map(str::trim).filter(|p| !p.is_empty());
    store.list_ingredients(prefix).await
}

pub async fn get_ingredient<S: Store + ?Sized>(store: &S, id: i32) -> DomainResult<Ingredient> {
    store
        .get_ingredient(id)
        .await?
        .ok_or(DomainError::NotFound("Ingredient"))
}

pub async fn create_tag<S: Store + ?Sized>(
    store: &S,
    actor: &Actor,
    draft: &TagDraft,
) -> DomainResult<Tag> {
    policy::catalog(Some(actor), Capability::Write).require()?;
    validate_tag(draft)?;
    let tag = store.insert_tag(&normalized_tag(draft)).await?;
    info!(tag_id = tag.id, slug = %tag.slug, "Tag created");
    Ok(tag)
}

pub async fn update_tag<S: Store + ?Sized>(
    store: &S,
    actor: &Actor,
    id: i32,
    draft: &TagDraft,
) -> DomainResult<Tag> {
    policy::catalog(Some(actor), Capability::Write).require()?;
    validate_tag(draft)?;
    store
        .update_tag(id, &normalized_tag(draft))
        .await?
        .ok_or(DomainError::NotFound("Tag"))
}

pub async fn delete_tag<S: Store + ?Sized>(store: &S, actor: &Actor, id: i32) -> DomainResult<()> {
    policy::catalog(Some(actor), Capability::Write).require()?;
    if !store.delete_tag(id).await? {
        return Err(DomainError::NotFound("Tag"));
    }
    info!(tag_id = id, "Tag deleted");
    Ok(())
}

pub async fn create_ingredient<S: Store + ?Sized>(
    store: &S,
    actor: &Actor,
    draft: &IngredientDraft,
) -> DomainResult<Ingredient> {
    policy::catalog(Some(actor), Capability::Write).require()?;
    validate_ingredient(draft)?;
    let ingredient = store.insert_ingredient(&normalized_ingredient(draft)).await?;
    info!(ingredient_id = ingredient.id, "Ingredient created");
    Ok(ingredient)
}

pub async fn update_ingredient<S: Store + ?Sized>(
    store: &S,
    actor: &Actor,
    id: i32,
    draft: &IngredientDraft,
) -> DomainResult<Ingredient> {
    policy::catalog(Some(actor), Capability::Write).require()?;
    validate_ingredient(draft)?;
    store
        .update_ingredient(id, &normalized_ingredient(draft))
        .await?
        .ok_or(DomainError::NotFound("Ingredient"))
}

pub async fn delete_ingredient<S: Store + ?Sized>(
    store: &S,
    actor: &Actor,
    id: i32,
) -> DomainResult<()> {
    policy::catalog(Some(actor), Capability::Write).require()?;
    if !store.delete_ingredient(id).await? {
        return Err(DomainError::NotFound("Ingredient"));
    }
    info!(ingredient_id = id, "Ingredient deleted");
    Ok(())
}

/// Bulk-loads ingredients for operators. Existing names are skipped, so the
/// import can be re-run. Returns how many rows were inserted.
pub async fn import_ingredients<S: Store + ?Sized>(
    store: &S,
    drafts: &[IngredientDraft],
) -> DomainResult<u32> {
    let mut inserted = 0u32;
    for draft in drafts {
        validate_ingredient(draft)?;
        match store.insert_ingredient(&normalized_ingredient(draft)).await {
            Ok(_) => inserted += 1,
            Err(DomainError::Conflict(_)) => {}
            Err(e) => return Err(e),
        }
    }
    if inserted > 0 {
        info!("Imported {} new ingredients", inserted);
    }
    Ok(inserted)
}
