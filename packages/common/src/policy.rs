//! Per-request authorization predicates.
//!
//! Each resource type gets one function taking the actor, the resource owner
//! (where relevant) and the requested capability. Building blocks compose
//! with [`Access::and`] / [`Access::or`].
//!
//! Favorites, cart entries and subscriptions have no predicate here: those
//! operations take an authenticated [`Actor`] and only ever touch rows keyed
//! by `actor.user_id`.

use crate::error::{DomainError, DomainResult};
use crate::model::Actor;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Capability {
    Read,
    Write,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Access {
    Allow,
    Deny,
}

impl Access {
    pub fn from_bool(allowed: bool) -> Self {
        if allowed { Access::Allow } else { Access::Deny }
    }

    pub fn and(self, other: Access) -> Access {
        Access::from_bool(self.is_allowed() && other.is_allowed())
    }

    pub fn or(self, other: Access) -> Access {
        Access::from_bool(self.is_allowed() || other.is_allowed())
    }

    pub fn is_allowed(self) -> bool {
        self == Access::Allow
    }

    /// `Ok(())` on allow, `PermissionDenied` otherwise.
    pub fn require(self) -> DomainResult<()> {
        match self {
            Access::Allow => Ok(()),
            Access::Deny => Err(DomainError::PermissionDenied),
        }
    }
}

pub fn staff(actor: Option<&Actor>) -> Access {
    Access::from_bool(actor.is_some_and(|a| a.is_staff))
}

pub fn owner(actor: Option<&Actor>, owner_id: i32) -> Access {
    Access::from_bool(actor.is_some_and(|a| a.user_id == owner_id))
}

/// Tags and ingredients: anyone reads, staff writes.
pub fn catalog(actor: Option<&Actor>, capability: Capability) -> Access {
    match capability {
        Capability::Read => Access::Allow,
        Capability::Write => staff(actor),
    }
}

/// Recipes: anyone reads, the author or staff writes.
pub fn recipe(actor: Option<&Actor>, author_id: i32, capability: Capability) -> Access {
    match capability {
        Capability::Read => Access::Allow,
        Capability::Write => owner(actor, author_id).or(staff(actor)),
    }
}
