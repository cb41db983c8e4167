mod common;

use common::{assert_status, body, TestApp};
use serde_json::{json, Value};
use warp::http::StatusCode;

fn names(value: &Value) -> Vec<&str> {
    value
        .as_array()
        .unwrap()
        .iter()
        .map(|ingredient| ingredient["name"].as_str().unwrap())
        .collect()
}

#[tokio::test]
async fn test_login_required() {
    let app = TestApp::new();

    let res = app
        .send(warp::test::request().method("GET").path("/ingredients/"))
        .await;

    assert_status(&res, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_retrieve_ingredient_list() {
    let app = TestApp::new();
    let token = app.login("test@londonappdev.com").await;

    for name in ["Kale", "Salt"] {
        let res = app
            .json("POST", "/ingredients/", &token, &json!({ "name": name }))
            .await;
        assert_status(&res, StatusCode::CREATED);
    }

    let res = app.get("/ingredients", &token).await;

    assert_status(&res, StatusCode::OK);
    assert_eq!(names(&body(&res)), vec!["Salt", "Kale"]);
}

#[tokio::test]
async fn test_ingredients_limited_to_user() {
    let app = TestApp::new();
    let other = app.login("other@londonappdev.com").await;
    let token = app.login("test@londonappdev.com").await;

    app.json("POST", "/ingredients/", &other, &json!({ "name": "Vinegar" }))
        .await;
    app.json("POST", "/ingredients/", &token, &json!({ "name": "Tumeric" }))
        .await;

    let res = app.get("/ingredients/", &token).await;

    assert_eq!(names(&body(&res)), vec!["Tumeric"]);
}

#[tokio::test]
async fn test_create_ingredient_invalid() {
    let app = TestApp::new();
    let token = app.login("test@londonappdev.com").await;

    let res = app
        .json("POST", "/ingredients/", &token, &json!({ "name": "   " }))
        .await;

    assert_status(&res, StatusCode::BAD_REQUEST);
    assert!(body(&app.get("/ingredients/", &token).await)
        .as_array()
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_retrieve_ingredients_assigned_unique() {
    let app = TestApp::new();
    let token = app.login("test@londonappdev.com").await;

    let eggs = body(
        &app.json("POST", "/ingredients/", &token, &json!({ "name": "Eggs" }))
            .await,
    );
    app.json("POST", "/ingredients/", &token, &json!({ "name": "Cheese" }))
        .await;

    for title in ["Eggs benedict", "Green eggs on toast"] {
        let res = app
            .json(
                "POST",
                "/recipes/",
                &token,
                &json!({
                    "title": title,
                    "time_minutes": 20,
                    "price": "4.00",
                    "ingredients": [eggs["id"]],
                }),
            )
            .await;
        assert_status(&res, StatusCode::CREATED);
    }

    let res = app.get("/ingredients/?assigned_only=1", &token).await;

    assert_status(&res, StatusCode::OK);
    assert_eq!(names(&body(&res)), vec!["Eggs"]);
}
