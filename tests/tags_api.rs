mod common;

use common::{assert_status, body, TestApp};
use serde_json::{json, Value};
use warp::http::StatusCode;

fn names(value: &Value) -> Vec<&str> {
    value
        .as_array()
        .unwrap()
        .iter()
        .map(|tag| tag["name"].as_str().unwrap())
        .collect()
}

#[tokio::test]
async fn test_login_required() {
    let app = TestApp::new();

    let res = app
        .send(warp::test::request().method("GET").path("/tags/"))
        .await;

    assert_status(&res, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_retrieve_tags() {
    let app = TestApp::new();
    let token = app.login("test@londonappdev.com").await;

    for name in ["Vegan", "Dessert"] {
        let res = app.json("POST", "/tags/", &token, &json!({ "name": name })).await;
        assert_status(&res, StatusCode::CREATED);
    }

    let res = app.get("/tags/", &token).await;

    assert_status(&res, StatusCode::OK);
    assert_eq!(names(&body(&res)), vec!["Vegan", "Dessert"]);
}

#[tokio::test]
async fn test_tags_limited_to_user() {
    let app = TestApp::new();
    let other = app.login("other@londonappdev.com").await;
    let token = app.login("test@londonappdev.com").await;

    app.json("POST", "/tags/", &other, &json!({ "name": "Fruity" }))
        .await;
    let created = app
        .json("POST", "/tags/", &token, &json!({ "name": "Comfort Food" }))
        .await;
    assert_status(&created, StatusCode::CREATED);
    assert_eq!(body(&created)["name"], "Comfort Food");

    let res = app.get("/tags/", &token).await;

    assert_eq!(names(&body(&res)), vec!["Comfort Food"]);
}

#[tokio::test]
async fn test_create_tag_invalid() {
    let app = TestApp::new();
    let token = app.login("test@londonappdev.com").await;

    let res = app.json("POST", "/tags/", &token, &json!({ "name": "" })).await;

    assert_status(&res, StatusCode::BAD_REQUEST);
    assert!(body(&res).get("name").is_some());
    assert!(body(&app.get("/tags/", &token).await)
        .as_array()
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_retrieve_tags_assigned_to_recipes() {
    let app = TestApp::new();
    let token = app.login("test@londonappdev.com").await;

    let breakfast = body(
        &app.json("POST", "/tags/", &token, &json!({ "name": "Breakfast" }))
            .await,
    );
    app.json("POST", "/tags/", &token, &json!({ "name": "Lunch" }))
        .await;

    let res = app
        .json(
            "POST",
            "/recipes/",
            &token,
            &json!({
                "title": "Coriander eggs on toast",
                "time_minutes": 10,
                "price": "5.00",
                "tags": [breakfast["id"]],
            }),
        )
        .await;
    assert_status(&res, StatusCode::CREATED);

    let res = app.get("/tags/?assigned_only=1", &token).await;

    assert_status(&res, StatusCode::OK);
    assert_eq!(names(&body(&res)), vec!["Breakfast"]);
}

#[tokio::test]
async fn test_retrieve_tags_assigned_unique() {
    let app = TestApp::new();
    let token = app.login("test@londonappdev.com").await;

    let breakfast = body(
        &app.json("POST", "/tags/", &token, &json!({ "name": "Breakfast" }))
            .await,
    );
    app.json("POST", "/tags/", &token, &json!({ "name": "Lunch" }))
        .await;

    for title in ["Pancakes", "Porridge"] {
        let res = app
            .json(
                "POST",
                "/recipes/",
                &token,
                &json!({
                    "title": title,
                    "time_minutes": 5,
                    "price": "3.00",
                    "tags": [breakfast["id"]],
                }),
            )
            .await;
        assert_status(&res, StatusCode::CREATED);
    }

    let res = app.get("/tags/?assigned_only=1", &token).await;

    assert_eq!(body(&res).as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_assigned_only_rejects_other_values() {
    let app = TestApp::new();
    let token = app.login("test@londonappdev.com").await;

    let res = app.get("/tags/?assigned_only=yes", &token).await;

    assert_status(&res, StatusCode::BAD_REQUEST);
    assert!(body(&res).get("assigned_only").is_some());

    let res = app.get("/tags/?assigned_only=0", &token).await;
    assert_status(&res, StatusCode::OK);
}
