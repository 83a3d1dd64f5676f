use serde_json::json;

use crate::common::{TestApp, TestUser, routes};

async fn author_with_recipe(app: &TestApp) -> (TestUser, i32) {
    let admin = app.create_user("admin", true).await;
    let tag = app.create_tag(&admin.token, "lunch").await;
    let rice = app.create_ingredient(&admin.token, "rice", "g").await;
    let author = app.create_user("author", false).await;
    let recipe = app
        .create_recipe(&author.token, "Risotto", &[tag], &[(rice, 150)])
        .await;
    (author, recipe)
}

mod favorites {
    use super::*;

    #[tokio::test]
    async fn add_returns_minified_recipe() {
        let app = TestApp::spawn().await;
        let (_, recipe) = author_with_recipe(&app).await;
        let fan = app.create_user("fan", false).await;

        let res = app
            .post_with_token(&routes::favorite(recipe), &json!({}), &fan.token)
            .await;
        assert_eq!(res.status, 201, "{}", res.text);
        let keys: Vec<&str> = res
            .body
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(keys.len(), 4);
        for key in ["id", "name", "image", "cooking_time"] {
            assert!(keys.contains(&key), "missing {key}");
        }

        let detail = app.get_with_token(&routes::recipe(recipe), &fan.token).await;
        assert_eq!(detail.body["is_favorited"], true);
        assert_eq!(detail.body["is_in_shopping_cart"], false);
    }

    #[tokio::test]
    async fn adding_twice_and_removing_twice_conflict() {
        let app = TestApp::spawn().await;
        let (_, recipe) = author_with_recipe(&app).await;
        let fan = app.create_user("fan", false).await;

        let first = app
            .post_with_token(&routes::favorite(recipe), &json!({}), &fan.token)
            .await;
        assert_eq!(first.status, 201);
        let again = app
            .post_with_token(&routes::favorite(recipe), &json!({}), &fan.token)
            .await;
        assert_eq!(again.status, 400);
        assert_eq!(again.body["code"], "CONFLICT");

        let removed = app.delete_with_token(&routes::favorite(recipe), &fan.token).await;
        assert_eq!(removed.status, 204);
        let again = app.delete_with_token(&routes::favorite(recipe), &fan.token).await;
        assert_eq!(again.status, 400);
        assert_eq!(again.body["code"], "CONFLICT");
    }

    #[tokio::test]
    async fn missing_recipe_is_not_found() {
        let app = TestApp::spawn().await;
        let fan = app.create_user("fan", false).await;

        let res = app
            .post_with_token(&routes::favorite(777), &json!({}), &fan.token)
            .await;
        assert_eq!(res.status, 404);
    }
}

mod cart {
    use super::*;

    #[tokio::test]
    async fn cart_toggles_like_favorites() {
        let app = TestApp::spawn().await;
        let (_, recipe) = author_with_recipe(&app).await;
        let shopper = app.create_user("shopper", false).await;

        let res = app
            .post_with_token(&routes::shopping_cart(recipe), &json!({}), &shopper.token)
            .await;
        assert_eq!(res.status, 201);
        assert_eq!(res.body["id"], recipe);

        let res = app
            .post_with_token(&routes::shopping_cart(recipe), &json!({}), &shopper.token)
            .await;
        assert_eq!(res.status, 400);

        let listed = app
            .get_with_token(
                &format!("{}?is_in_shopping_cart=1", routes::RECIPES),
                &shopper.token,
            )
            .await;
        assert_eq!(listed.body.as_array().unwrap().len(), 1);

        let res = app
            .delete_with_token(&routes::shopping_cart(recipe), &shopper.token)
            .await;
        assert_eq!(res.status, 204);
    }

    #[tokio::test]
    async fn deleting_recipe_empties_carts() {
        let app = TestApp::spawn().await;
        let (author, recipe) = author_with_recipe(&app).await;
        let shopper = app.create_user("shopper", false).await;
        app.post_with_token(&routes::shopping_cart(recipe), &json!({}), &shopper.token)
            .await;

        let res = app.delete_with_token(&routes::recipe(recipe), &author.token).await;
        assert_eq!(res.status, 204);

        let listed = app
            .get_with_token(
                &format!("{}?is_in_shopping_cart=1", routes::RECIPES),
                &shopper.token,
            )
            .await;
        assert!(listed.body.as_array().unwrap().is_empty());
    }
}

mod subscriptions {
    use super::*;

    #[tokio::test]
    async fn subscribe_returns_author_with_limited_recipes() {
        let app = TestApp::spawn().await;
        let (author, _) = author_with_recipe(&app).await;
        let reader = app.create_user("reader", false).await;

        let res = app
            .post_with_token(
                &format!("{}?recipes_limit=0", routes::subscribe(author.id)),
                &json!({}),
                &reader.token,
            )
            .await;
        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["id"], author.id);
        assert_eq!(res.body["username"], "author");
        assert_eq!(res.body["is_subscribed"], true);
        assert_eq!(res.body["recipes_count"], 1);
        assert!(res.body["recipes"].as_array().unwrap().is_empty());

        let profile = app.get_with_token(&routes::user(author.id), &reader.token).await;
        assert_eq!(profile.body["is_subscribed"], true);
    }

    #[tokio::test]
    async fn cannot_subscribe_to_self() {
        let app = TestApp::spawn().await;
        let me = app.create_user("me", false).await;

        let res = app
            .post_with_token(&routes::subscribe(me.id), &json!({}), &me.token)
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn double_subscribe_and_double_unsubscribe_conflict() {
        let app = TestApp::spawn().await;
        let (author, _) = author_with_recipe(&app).await;
        let reader = app.create_user("reader", false).await;

        let res = app
            .post_with_token(&routes::subscribe(author.id), &json!({}), &reader.token)
            .await;
        assert_eq!(res.status, 201);
        let res = app
            .post_with_token(&routes::subscribe(author.id), &json!({}), &reader.token)
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "CONFLICT");

        let res = app
            .delete_with_token(&routes::subscribe(author.id), &reader.token)
            .await;
        assert_eq!(res.status, 204);
        let res = app
            .delete_with_token(&routes::subscribe(author.id), &reader.token)
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "CONFLICT");
    }

    #[tokio::test]
    async fn subscription_list_is_paginated_newest_first() {
        let app = TestApp::spawn().await;
        let reader = app.create_user("reader", false).await;
        let mut authors = Vec::new();
        for name in ["ann", "ben", "cid"] {
            let author = app.create_user(name, false).await;
            let res = app
                .post_with_token(&routes::subscribe(author.id), &json!({}), &reader.token)
                .await;
            assert_eq!(res.status, 201);
            authors.push(author.id);
        }

        let page = app
            .get_with_token(&format!("{}?page=1&limit=2", routes::SUBSCRIPTIONS), &reader.token)
            .await;
        assert_eq!(page.status, 200, "{}", page.text);
        assert_eq!(page.body["pagination"]["total"], 3);
        assert_eq!(page.body["pagination"]["total_pages"], 2);
        let ids: Vec<i64> = page.body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|a| a["id"].as_i64().unwrap())
            .collect();
        assert_eq!(ids, [authors[2], authors[1]].map(i64::from));

        let rest = app
            .get_with_token(&format!("{}?page=2&limit=2", routes::SUBSCRIPTIONS), &reader.token)
            .await;
        assert_eq!(rest.body["data"][0]["id"], authors[0]);
    }

    #[tokio::test]
    async fn page_size_is_bounded() {
        let app = TestApp::spawn().await;
        let reader = app.create_user("reader", false).await;

        let res = app
            .get_with_token(&format!("{}?limit=101", routes::SUBSCRIPTIONS), &reader.token)
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.body["field"], "limit");

        let res = app
            .get_with_token(&format!("{}?page=0", routes::SUBSCRIPTIONS), &reader.token)
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.body["field"], "page");
    }

    #[tokio::test]
    async fn huge_page_is_a_validation_error() {
        let app = TestApp::spawn().await;
        let reader = app.create_user("reader", false).await;

        for page in [u64::MAX, (1 << 62) + 1] {
            let res = app
                .get_with_token(
                    &format!("{}?page={page}&limit=2", routes::SUBSCRIPTIONS),
                    &reader.token,
                )
                .await;
            assert_eq!(res.status, 400, "page={page}: {}", res.text);
            assert_eq!(res.body["code"], "VALIDATION_ERROR");
            assert_eq!(res.body["field"], "page");
        }
    }

    #[tokio::test]
    async fn recipes_limit_is_bounded() {
        let app = TestApp::spawn().await;
        let (author, _) = author_with_recipe(&app).await;
        let reader = app.create_user("reader", false).await;

        let res = app
            .post_with_token(
                &format!("{}?recipes_limit={}", routes::subscribe(author.id), u64::MAX),
                &json!({}),
                &reader.token,
            )
            .await;
        assert_eq!(res.status, 400, "{}", res.text);
        assert_eq!(res.body["field"], "recipes_limit");

        let res = app
            .post_with_token(
                &format!("{}?recipes_limit=1000", routes::subscribe(author.id)),
                &json!({}),
                &reader.token,
            )
            .await;
        assert_eq!(res.status, 201, "{}", res.text);

        let res = app
            .get_with_token(
                &format!("{}?recipes_limit={}", routes::SUBSCRIPTIONS, u64::MAX),
                &reader.token,
            )
            .await;
        assert_eq!(res.status, 400, "{}", res.text);
        assert_eq!(res.body["field"], "recipes_limit");

        let res = app
            .get_with_token(&format!("{}?recipes_limit=1001", routes::SUBSCRIPTIONS), &reader.token)
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.body["field"], "recipes_limit");
    }
}
