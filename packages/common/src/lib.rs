pub mod catalog;
pub mod error;
pub mod image;
pub mod memory;
pub mod model;
pub mod policy;
pub mod recipe;
pub mod relation;
pub mod shopping_list;
pub mod storage;
pub mod store;
pub mod users;

pub use error::{DomainError, DomainResult};
pub use store::Store;
