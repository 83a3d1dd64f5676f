mod catalog;
mod common;
mod recipe;
mod relationship;
mod shopping_cart;
