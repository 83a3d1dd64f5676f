use foodgram_common::error::DomainError;
use foodgram_common::model::{IngredientSpec, RecipeDraft};
use foodgram_common::storage::AssetKey;
use foodgram_common::store::RecipeStore;
use foodgram_server::store::SeaOrmStore;
use serde_json::{Value, json};

use crate::common::{PIXEL_PNG, TestApp, TestUser, png_data_uri, recipe_body, routes};

/// Staff account, a regular cook, two tags and two ingredients.
struct Kitchen {
    admin: TestUser,
    cook: TestUser,
    breakfast: i32,
    dinner: i32,
    flour: i32,
    sugar: i32,
}

async fn kitchen(app: &TestApp) -> Kitchen {
    let admin = app.create_user("admin", true).await;
    let cook = app.create_user("cook", false).await;
    let breakfast = app.create_tag(&admin.token, "breakfast").await;
    let dinner = app.create_tag(&admin.token, "dinner").await;
    let flour = app.create_ingredient(&admin.token, "flour", "g").await;
    let sugar = app.create_ingredient(&admin.token, "sugar", "g").await;
    Kitchen {
        admin,
        cook,
        breakfast,
        dinner,
        flour,
        sugar,
    }
}

fn ids(list: &Value) -> Vec<i64> {
    list.as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].as_i64().unwrap())
        .collect()
}

mod create {
    use super::*;

    #[tokio::test]
    async fn json_payload_creates_full_recipe() {
        let app = TestApp::spawn().await;
        let k = kitchen(&app).await;

        let res = app
            .post_with_token(
                routes::RECIPES,
                &recipe_body("Pancakes", &[k.breakfast], &[(k.flour, 200), (k.sugar, 30)]),
                &k.cook.token,
            )
            .await;
        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["name"], "Pancakes");
        assert_eq!(res.body["cooking_time"], 20);
        assert_eq!(res.body["author"]["id"], k.cook.id);
        assert_eq!(res.body["author"]["is_subscribed"], false);
        assert_eq!(res.body["is_favorited"], false);
        assert_eq!(res.body["is_in_shopping_cart"], false);
        assert_eq!(res.body["tags"][0]["slug"], "breakfast");
        assert_eq!(
            res.body["ingredients"],
            json!([
                {"id": k.flour, "name": "flour", "measurement_unit": "g", "amount": 200},
                {"id": k.sugar, "name": "sugar", "measurement_unit": "g", "amount": 30},
            ])
        );

        let key = AssetKey::for_content(PIXEL_PNG, "png");
        let url = res.body["image"].as_str().unwrap();
        assert_eq!(url, format!("/media/recipes/{key}"));
        // The media URL maps one-to-one onto the images directory.
        let relative = url.strip_prefix("/media/recipes/").unwrap();
        let stored = app.images_dir.path().join(relative);
        assert_eq!(std::fs::read(stored).unwrap(), PIXEL_PNG);
    }

    #[tokio::test]
    async fn multipart_payload_creates_recipe() {
        let app = TestApp::spawn().await;
        let k = kitchen(&app).await;

        let image = reqwest::multipart::Part::bytes(PIXEL_PNG.to_vec())
            .file_name("pie.png")
            .mime_str("image/png")
            .unwrap();
        let form = reqwest::multipart::Form::new()
            .text("name", "Pie")
            .text("text", "Bake it.")
            .text("cooking_time", "45")
            .text("tags", k.breakfast.to_string())
            .text("tags", k.dinner.to_string())
            .text(
                "ingredients",
                json!([{"id": k.flour, "amount": "300"}]).to_string(),
            )
            .part("image", image);

        let res = app
            .multipart_with_token(routes::RECIPES, form, &k.cook.token)
            .await;
        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["cooking_time"], 45);
        assert_eq!(res.body["tags"].as_array().unwrap().len(), 2);
        assert_eq!(res.body["ingredients"][0]["amount"], 300);
    }

    #[tokio::test]
    async fn missing_field_is_named() {
        let app = TestApp::spawn().await;
        let k = kitchen(&app).await;

        let mut body = recipe_body("Toast", &[k.breakfast], &[(k.flour, 50)]);
        body.as_object_mut().unwrap().remove("tags");

        let res = app
            .post_with_token(routes::RECIPES, &body, &k.cook.token)
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        assert_eq!(res.body["field"], "tags");
    }

    #[tokio::test]
    async fn empty_ingredients_are_rejected() {
        let app = TestApp::spawn().await;
        let k = kitchen(&app).await;

        let res = app
            .post_with_token(
                routes::RECIPES,
                &recipe_body("Air", &[k.breakfast], &[]),
                &k.cook.token,
            )
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.body["field"], "ingredients");
    }

    #[tokio::test]
    async fn duplicate_ingredient_is_rejected() {
        let app = TestApp::spawn().await;
        let k = kitchen(&app).await;

        let res = app
            .post_with_token(
                routes::RECIPES,
                &recipe_body("Double", &[k.breakfast], &[(k.flour, 1), (k.flour, 2)]),
                &k.cook.token,
            )
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.body["field"], "ingredients");
    }

    #[tokio::test]
    async fn unknown_tag_is_rejected() {
        let app = TestApp::spawn().await;
        let k = kitchen(&app).await;

        let res = app
            .post_with_token(
                routes::RECIPES,
                &recipe_body("Mystery", &[9999], &[(k.flour, 10)]),
                &k.cook.token,
            )
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.body["field"], "tags");
    }

    #[tokio::test]
    async fn reference_deleted_before_insert_is_a_validation_error() {
        let app = TestApp::spawn().await;
        let k = kitchen(&app).await;
        let store = SeaOrmStore::new(app.db.clone());

        // Skips the domain reference check, as a concurrent delete would.
        let draft = |tag_ids: Vec<i32>, ingredient_id: i32| RecipeDraft {
            name: "Ghost".into(),
            image: AssetKey::for_content(PIXEL_PNG, "png").to_string(),
            text: "Nothing here.".into(),
            cooking_time: 5,
            tag_ids,
            ingredients: vec![IngredientSpec {
                ingredient_id,
                amount: 1,
            }],
        };

        let err = store
            .insert_recipe(k.cook.id, &draft(vec![9999], k.flour))
            .await
            .unwrap_err();
        assert!(
            matches!(err, DomainError::Validation { field: "tags", .. }),
            "{err:?}"
        );

        let err = store
            .insert_recipe(k.cook.id, &draft(vec![k.breakfast], 9999))
            .await
            .unwrap_err();
        assert!(
            matches!(err, DomainError::Validation { field: "ingredients", .. }),
            "{err:?}"
        );

        let listed = app.get_without_token(routes::RECIPES).await;
        assert_eq!(listed.body, json!([]));
    }

    #[tokio::test]
    async fn unsupported_image_type_is_rejected() {
        let app = TestApp::spawn().await;
        let k = kitchen(&app).await;

        let mut body = recipe_body("Svg", &[k.breakfast], &[(k.flour, 10)]);
        body["image"] = json!("data:image/svg+xml;base64,PHN2Zy8+");

        let res = app
            .post_with_token(routes::RECIPES, &body, &k.cook.token)
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.body["field"], "image");
    }

    #[tokio::test]
    async fn cooking_time_out_of_range_is_rejected() {
        let app = TestApp::spawn().await;
        let k = kitchen(&app).await;

        let mut body = recipe_body("Slow", &[k.breakfast], &[(k.flour, 10)]);
        body["cooking_time"] = json!(0);

        let res = app
            .post_with_token(routes::RECIPES, &body, &k.cook.token)
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.body["field"], "cooking_time");
    }

    #[tokio::test]
    async fn anonymous_cannot_create() {
        let app = TestApp::spawn().await;
        let k = kitchen(&app).await;

        let res = app
            .post_without_token(
                routes::RECIPES,
                &recipe_body("Nope", &[k.breakfast], &[(k.flour, 10)]),
            )
            .await;
        assert_eq!(res.status, 401);
    }
}

mod update {
    use super::*;

    #[tokio::test]
    async fn ingredients_are_replaced_and_other_fields_kept() {
        let app = TestApp::spawn().await;
        let k = kitchen(&app).await;
        let id = app
            .create_recipe(&k.cook.token, "Bread", &[k.breakfast], &[(k.flour, 500)])
            .await;

        let res = app
            .patch_with_token(
                &routes::recipe(id),
                &json!({"ingredients": [{"id": k.sugar, "amount": 5}], "tags": [k.dinner]}),
                &k.cook.token,
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["name"], "Bread");
        assert_eq!(res.body["ingredients"].as_array().unwrap().len(), 1);
        assert_eq!(res.body["ingredients"][0]["id"], k.sugar);
        assert_eq!(res.body["tags"][0]["id"], k.dinner);
    }

    #[tokio::test]
    async fn new_image_replaces_old() {
        let app = TestApp::spawn().await;
        let k = kitchen(&app).await;
        let id = app
            .create_recipe(&k.cook.token, "Bread", &[k.breakfast], &[(k.flour, 500)])
            .await;

        let gif = "data:image/gif;base64,R0lGODlhAQABAAAAACw=";
        let res = app
            .patch_with_token(&routes::recipe(id), &json!({"image": gif}), &k.cook.token)
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert!(res.body["image"].as_str().unwrap().ends_with(".gif"));
    }

    #[tokio::test]
    async fn other_users_cannot_edit_but_staff_can() {
        let app = TestApp::spawn().await;
        let k = kitchen(&app).await;
        let stranger = app.create_user("stranger", false).await;
        let id = app
            .create_recipe(&k.cook.token, "Soup", &[k.dinner], &[(k.flour, 10)])
            .await;

        let res = app
            .patch_with_token(&routes::recipe(id), &json!({"name": "Mine"}), &stranger.token)
            .await;
        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");

        let res = app
            .patch_with_token(&routes::recipe(id), &json!({"image": png_data_uri()}), &stranger.token)
            .await;
        assert_eq!(res.status, 403);

        let res = app.delete_with_token(&routes::recipe(id), &stranger.token).await;
        assert_eq!(res.status, 403);

        let res = app.get_with_token(&routes::recipe(id), &stranger.token).await;
        assert_eq!(res.status, 200);

        let res = app
            .patch_with_token(&routes::recipe(id), &json!({"name": "Staff soup"}), &k.admin.token)
            .await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["name"], "Staff soup");
        assert_eq!(res.body["author"]["id"], k.cook.id);
    }

    #[tokio::test]
    async fn updating_missing_recipe_is_not_found() {
        let app = TestApp::spawn().await;
        let k = kitchen(&app).await;

        let res = app
            .patch_with_token(&routes::recipe(4040), &json!({"name": "x"}), &k.cook.token)
            .await;
        assert_eq!(res.status, 404);
    }
}

mod delete {
    use super::*;

    #[tokio::test]
    async fn author_can_delete() {
        let app = TestApp::spawn().await;
        let k = kitchen(&app).await;
        let id = app
            .create_recipe(&k.cook.token, "Salad", &[k.dinner], &[(k.sugar, 1)])
            .await;

        let res = app.delete_with_token(&routes::recipe(id), &k.cook.token).await;
        assert_eq!(res.status, 204);

        let res = app.get_without_token(&routes::recipe(id)).await;
        assert_eq!(res.status, 404);
    }
}

mod list {
    use super::*;

    #[tokio::test]
    async fn newest_first_and_filtered_by_author_and_tags() {
        let app = TestApp::spawn().await;
        let k = kitchen(&app).await;
        let first = app
            .create_recipe(&k.cook.token, "Porridge", &[k.breakfast], &[(k.flour, 1)])
            .await;
        let second = app
            .create_recipe(&k.admin.token, "Stew", &[k.dinner], &[(k.flour, 1)])
            .await;
        let third = app
            .create_recipe(&k.cook.token, "Omelette", &[k.breakfast, k.dinner], &[(k.sugar, 1)])
            .await;

        let all = app.get_without_token(routes::RECIPES).await;
        assert_eq!(all.status, 200);
        assert_eq!(ids(&all.body), [third, second, first].map(i64::from));

        let by_author = app
            .get_without_token(&format!("{}?author={}", routes::RECIPES, k.cook.id))
            .await;
        assert_eq!(ids(&by_author.body), [third, first].map(i64::from));

        let dinner = app
            .get_without_token(&format!("{}?tags=dinner", routes::RECIPES))
            .await;
        assert_eq!(ids(&dinner.body), [third, second].map(i64::from));

        let either = app
            .get_without_token(&format!("{}?tags=dinner&tags=breakfast", routes::RECIPES))
            .await;
        assert_eq!(ids(&either.body), [third, second, first].map(i64::from));
    }

    #[tokio::test]
    async fn favorited_filter_applies_to_caller_only() {
        let app = TestApp::spawn().await;
        let k = kitchen(&app).await;
        let liked = app
            .create_recipe(&k.admin.token, "Waffles", &[k.breakfast], &[(k.flour, 1)])
            .await;
        app.create_recipe(&k.admin.token, "Fries", &[k.dinner], &[(k.flour, 1)])
            .await;
        let res = app.post_with_token(&routes::favorite(liked), &json!({}), &k.cook.token).await;
        assert_eq!(res.status, 201);

        let mine = app
            .get_with_token(&format!("{}?is_favorited=1", routes::RECIPES), &k.cook.token)
            .await;
        assert_eq!(ids(&mine.body), [i64::from(liked)]);
        assert_eq!(mine.body[0]["is_favorited"], true);

        let anonymous = app
            .get_without_token(&format!("{}?is_favorited=1", routes::RECIPES))
            .await;
        let list = anonymous.body.as_array().unwrap();
        assert_eq!(list.len(), 2);
        assert!(list.iter().all(|r| r["is_favorited"] == false));
        assert!(list.iter().all(|r| r["is_in_shopping_cart"] == false));
    }

    #[tokio::test]
    async fn malformed_token_is_rejected_on_public_routes() {
        let app = TestApp::spawn().await;

        let res = app.get_with_token(routes::RECIPES, "not-a-jwt").await;
        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_INVALID");
    }
}
