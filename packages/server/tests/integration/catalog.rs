use serde_json::json;

use crate::common::{TestApp, routes};

mod tags {
    use super::*;

    #[tokio::test]
    async fn staff_can_create_and_anyone_can_read_tags() {
        let app = TestApp::spawn().await;
        let admin = app.create_user("admin", true).await;

        let res = app
            .post_with_token(
                routes::TAGS,
                &json!({"name": "Breakfast", "color": "#e26c2d", "slug": "breakfast"}),
                &admin.token,
            )
            .await;
        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["color"], "#E26C2D");
        let id = res.id();

        let list = app.get_without_token(routes::TAGS).await;
        assert_eq!(list.status, 200);
        assert_eq!(list.body.as_array().unwrap().len(), 1);

        let one = app.get_without_token(&routes::tag(id)).await;
        assert_eq!(one.status, 200);
        assert_eq!(one.body["slug"], "breakfast");
    }

    #[tokio::test]
    async fn regular_user_cannot_create_tags() {
        let app = TestApp::spawn().await;
        let cook = app.create_user("cook", false).await;

        let res = app
            .post_with_token(
                routes::TAGS,
                &json!({"name": "Lunch", "color": "#fff", "slug": "lunch"}),
                &cook.token,
            )
            .await;
        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");
    }

    #[tokio::test]
    async fn creating_without_token_is_unauthorized() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::TAGS,
                &json!({"name": "Lunch", "color": "#fff", "slug": "lunch"}),
            )
            .await;
        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_MISSING");
    }

    #[tokio::test]
    async fn duplicate_slug_is_a_conflict() {
        let app = TestApp::spawn().await;
        let admin = app.create_user("admin", true).await;
        app.create_tag(&admin.token, "dinner").await;

        let res = app
            .post_with_token(
                routes::TAGS,
                &json!({"name": "Supper", "color": "#000000", "slug": "dinner"}),
                &admin.token,
            )
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "CONFLICT");
    }

    #[tokio::test]
    async fn invalid_color_is_reported_on_its_field() {
        let app = TestApp::spawn().await;
        let admin = app.create_user("admin", true).await;

        let res = app
            .post_with_token(
                routes::TAGS,
                &json!({"name": "Lunch", "color": "red", "slug": "lunch"}),
                &admin.token,
            )
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        assert_eq!(res.body["field"], "color");
    }

    #[tokio::test]
    async fn patch_keeps_omitted_fields() {
        let app = TestApp::spawn().await;
        let admin = app.create_user("admin", true).await;
        let id = app.create_tag(&admin.token, "brunch").await;

        let res = app
            .patch_with_token(&routes::tag(id), &json!({"name": "Late breakfast"}), &admin.token)
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["name"], "Late breakfast");
        assert_eq!(res.body["slug"], "brunch");
    }

    #[tokio::test]
    async fn deleted_tag_is_gone() {
        let app = TestApp::spawn().await;
        let admin = app.create_user("admin", true).await;
        let id = app.create_tag(&admin.token, "snack").await;

        let res = app.delete_with_token(&routes::tag(id), &admin.token).await;
        assert_eq!(res.status, 204);

        let res = app.get_without_token(&routes::tag(id)).await;
        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }
}

mod ingredients {
    use super::*;

    #[tokio::test]
    async fn name_filter_matches_prefix_case_insensitively() {
        let app = TestApp::spawn().await;
        let admin = app.create_user("admin", true).await;
        for (name, unit) in [("flour", "g"), ("flaxseed", "g"), ("milk", "ml")] {
            app.create_ingredient(&admin.token, name, unit).await;
        }

        let res = app
            .get_without_token(&format!("{}?name=FL", routes::INGREDIENTS))
            .await;
        assert_eq!(res.status, 200);
        let names: Vec<&str> = res
            .body
            .as_array()
            .unwrap()
            .iter()
            .map(|i| i["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, ["flaxseed", "flour"]);

        let all = app.get_without_token(routes::INGREDIENTS).await;
        assert_eq!(all.body.as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn prefix_wildcards_are_literal() {
        let app = TestApp::spawn().await;
        let admin = app.create_user("admin", true).await;
        app.create_ingredient(&admin.token, "salt", "g").await;

        let res = app
            .get_without_token(&format!("{}?name=%25", routes::INGREDIENTS))
            .await;
        assert_eq!(res.status, 200);
        assert!(res.body.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn duplicate_name_is_a_conflict() {
        let app = TestApp::spawn().await;
        let admin = app.create_user("admin", true).await;
        app.create_ingredient(&admin.token, "sugar", "g").await;

        let res = app
            .post_with_token(
                routes::INGREDIENTS,
                &json!({"name": "sugar", "measurement_unit": "kg"}),
                &admin.token,
            )
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "CONFLICT");
    }

    #[tokio::test]
    async fn staff_can_update_and_delete() {
        let app = TestApp::spawn().await;
        let admin = app.create_user("admin", true).await;
        let cook = app.create_user("cook", false).await;
        let id = app.create_ingredient(&admin.token, "butter", "g").await;

        let res = app
            .patch_with_token(
                &routes::ingredient(id),
                &json!({"measurement_unit": "tbsp"}),
                &cook.token,
            )
            .await;
        assert_eq!(res.status, 403);

        let res = app
            .patch_with_token(
                &routes::ingredient(id),
                &json!({"measurement_unit": "tbsp"}),
                &admin.token,
            )
            .await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["name"], "butter");
        assert_eq!(res.body["measurement_unit"], "tbsp");

        let res = app.delete_with_token(&routes::ingredient(id), &admin.token).await;
        assert_eq!(res.status, 204);
        let res = app.get_without_token(&routes::ingredient(id)).await;
        assert_eq!(res.status, 404);
    }
}
