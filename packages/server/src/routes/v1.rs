use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::config::AppConfig;
use crate::handlers::{ingredient, recipe, tag, user};
use crate::state::AppState;

pub fn routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest("/tags", tag_routes())
        .nest("/ingredients", ingredient_routes())
        .nest("/recipes", recipe_routes(config))
        .nest("/users", user_routes())
}

fn tag_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(tag::list_tags, tag::create_tag))
        .routes(routes!(tag::get_tag, tag::update_tag, tag::delete_tag))
}

fn ingredient_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            ingredient::list_ingredients,
            ingredient::create_ingredient
        ))
        .routes(routes!(
            ingredient::get_ingredient,
            ingredient::update_ingredient,
            ingredient::delete_ingredient
        ))
}

fn recipe_routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    let writes = OpenApiRouter::new()
        .routes(routes!(recipe::list_recipes, recipe::create_recipe))
        .routes(routes!(
            recipe::get_recipe,
            recipe::update_recipe,
            recipe::delete_recipe
        ))
        .layer(recipe::recipe_body_limit(config.storage.max_image_size));

    let relations = OpenApiRouter::new()
        .routes(routes!(recipe::download_shopping_cart))
        .routes(routes!(recipe::add_favorite, recipe::remove_favorite))
        .routes(routes!(
            recipe::add_to_shopping_cart,
            recipe::remove_from_shopping_cart
        ));

    writes.merge(relations)
}

fn user_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(user::list_users))
        .routes(routes!(user::me))
        .routes(routes!(user::list_subscriptions))
        .routes(routes!(user::get_user))
        .routes(routes!(user::subscribe, user::unsubscribe))
}
