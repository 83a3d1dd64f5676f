//! User profiles and subscription feeds.

use tracing::info;

use crate::error::{DomainError, DomainResult};
use crate::model::{Actor, NewUser, Recipe, RecipeFilter, User};
use crate::store::Store;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserCard {
    pub user: User,
    /// Whether the viewer follows this user. Always `false` for anonymous viewers.
    pub is_subscribed: bool,
}

/// A followed author together with their latest recipes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthorFeed {
    pub author: UserCard,
    pub recipes: Vec<Recipe>,
    pub recipes_count: u64,
}

/// Upper bound for `recipes_limit` on feed entries.
pub const MAX_RECIPES_LIMIT: u64 = 1000;

pub fn validate_recipes_limit(recipes_limit: Option<u64>) -> DomainResult<()> {
    match recipes_limit {
        Some(n) if n > MAX_RECIPES_LIMIT => Err(DomainError::validation(
            "recipes_limit",
            format!("recipes_limit must be 0-{MAX_RECIPES_LIMIT}"),
        )),
        _ => Ok(()),
    }
}

fn is_username(name: &str) -> bool {
    !name.is_empty()
        && name.chars().count() <= 150
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '.' | '@' | '+' | '-' | '_'))
}

pub fn validate_new_user(user: &NewUser) -> DomainResult<()> {
    let email = user.email.trim();
    match email.split_once('@') {
        Some((local, domain))
            if !local.is_empty() && domain.contains('.') && email.len() <= 254 => {}
        _ => return Err(DomainError::validation("email", "Enter a valid email address")),
    }
    if !is_username(&user.username) {
        return Err(DomainError::validation(
            "username",
            "Username must be 1-150 letters, digits or . @ + - _",
        ));
    }
    for (field, value) in [("first_name", &user.first_name), ("last_name", &user.last_name)] {
        let value = value.trim();
        if value.is_empty() || value.chars().count() > 150 {
            return Err(DomainError::validation(field, "Must be 1-150 characters"));
        }
    }
    Ok(())
}

/// Creates an account. Accounts are provisioned by operators, not by clients.
pub async fn provision<S: Store + ?Sized>(store: &S, new_user: &NewUser) -> DomainResult<User> {
    validate_new_user(new_user)?;
    let user = store
        .insert_user(&NewUser {
            email: new_user.email.trim().to_lowercase(),
            username: new_user.username.clone(),
            first_name: new_user.first_name.trim().to_string(),
            last_name: new_user.last_name.trim().to_string(),
            is_staff: new_user.is_staff,
        })
        .await?;
    info!(user_id = user.id, username = %user.username, is_staff = user.is_staff, "User created");
    Ok(user)
}

/// Cards for `ids`, in the order the store returns them (by id).
pub async fn cards<S: Store + ?Sized>(
    store: &S,
    viewer: Option<&Actor>,
    ids: &[i32],
) -> DomainResult<Vec<UserCard>> {
    let users = store.find_users(ids).await?;
    decorate(store, viewer, users).await
}

async fn decorate<S: Store + ?Sized>(
    store: &S,
    viewer: Option<&Actor>,
    users: Vec<User>,
) -> DomainResult<Vec<UserCard>> {
    let followed = match viewer {
        Some(actor) => {
            let ids: Vec<i32> = users.iter().map(|u| u.id).collect();
            store.subscribed_authors(actor.user_id, &ids).await?
        }
        None => Default::default(),
    };
    Ok(users
        .into_iter()
        .map(|user| UserCard {
            is_subscribed: followed.contains(&user.id),
            user,
        })
        .collect())
}

pub async fn get<S: Store + ?Sized>(
    store: &S,
    viewer: Option<&Actor>,
    id: i32,
) -> DomainResult<UserCard> {
    cards(store, viewer, &[id])
        .await?
        .pop()
        .ok_or(DomainError::NotFound("User"))
}

pub async fn list<S: Store + ?Sized>(
    store: &S,
    viewer: Option<&Actor>,
) -> DomainResult<Vec<UserCard>> {
    let users = store.list_users().await?;
    decorate(store, viewer, users).await
}

/// Builds the feed entry for one author. `recipes_limit = None` returns all recipes.
pub async fn author_feed<S: Store + ?Sized>(
    store: &S,
    viewer: Option<&Actor>,
    author: User,
    recipes_limit: Option<u64>,
) -> DomainResult<AuthorFeed> {
    let recipes = store
        .list_recipes(&RecipeFilter {
            author_id: Some(author.id),
            limit: recipes_limit,
            ..Default::default()
        })
        .await?;
    let recipes_count = store.count_recipes_by(author.id).await?;
    let author = decorate(store, viewer, vec![author])
        .await?
        .pop()
        .ok_or(DomainError::NotFound("User"))?;
    Ok(AuthorFeed {
        author,
        recipes,
        recipes_count,
    })
}

/// One page of the authors `actor` follows. Returns the page and the total count.
pub async fn subscriptions<S: Store + ?Sized>(
    store: &S,
    actor: &Actor,
    offset: u64,
    limit: u64,
    recipes_limit: Option<u64>,
) -> DomainResult<(Vec<AuthorFeed>, u64)> {
    validate_recipes_limit(recipes_limit)?;

    let (authors, total) = store
        .list_subscriptions(actor.user_id, offset, limit)
        .await?;
    let mut feeds = Vec::with_capacity(authors.len());
    for author in authors {
        feeds.push(author_feed(store, Some(actor), author, recipes_limit).await?);
    }
    Ok((feeds, total))
}
