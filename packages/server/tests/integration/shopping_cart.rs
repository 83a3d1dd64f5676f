use serde_json::json;

use crate::common::{TestApp, routes};

#[tokio::test]
async fn download_sums_amounts_across_recipes() {
    let app = TestApp::spawn().await;
    let admin = app.create_user("admin", true).await;
    let cook = app.create_user("cook", false).await;
    let tag = app.create_tag(&admin.token, "baking").await;
    let flour = app.create_ingredient(&admin.token, "flour", "g").await;
    let sugar = app.create_ingredient(&admin.token, "sugar", "g").await;

    let a = app
        .create_recipe(&admin.token, "Bread", &[tag], &[(flour, 200)])
        .await;
    let b = app
        .create_recipe(&admin.token, "Cake", &[tag], &[(flour, 300), (sugar, 50)])
        .await;
    for id in [a, b] {
        let res = app
            .post_with_token(&routes::shopping_cart(id), &json!({}), &cook.token)
            .await;
        assert_eq!(res.status, 201);
    }

    let res = app
        .get_with_token(routes::DOWNLOAD_SHOPPING_CART, &cook.token)
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(
        res.content_type.as_deref(),
        Some("text/plain; charset=utf-8")
    );
    let disposition = res.content_disposition.unwrap();
    assert!(disposition.starts_with("attachment;"), "{disposition}");
    assert!(disposition.contains("cook_shopping_list.txt"), "{disposition}");

    let flour_line = res.text.lines().find(|l| l.contains("flour")).unwrap();
    assert!(flour_line.contains("500"), "{flour_line}");
    let sugar_line = res.text.lines().find(|l| l.contains("sugar")).unwrap();
    assert!(sugar_line.contains("50"), "{sugar_line}");
    assert!(res.text.find("flour").unwrap() < res.text.find("sugar").unwrap());
}

#[tokio::test]
async fn empty_cart_downloads_header_only() {
    let app = TestApp::spawn().await;
    let cook = app.create_user("cook", false).await;

    let res = app
        .get_with_token(routes::DOWNLOAD_SHOPPING_CART, &cook.token)
        .await;
    assert_eq!(res.status, 200);
    assert!(res.text.starts_with("Shopping list"));
    assert_eq!(res.text.trim().lines().count(), 1);
}

#[tokio::test]
async fn download_requires_a_token() {
    let app = TestApp::spawn().await;

    let res = app.get_without_token(routes::DOWNLOAD_SHOPPING_CART).await;
    assert_eq!(res.status, 401);
    assert_eq!(res.body["code"], "TOKEN_MISSING");
}
