//! Category and item CRUD with scoped uniqueness.

mod common;

use axum::http::{Method, StatusCode};
use common::{response_json, TestApp};
use serde_json::json;

async fn create_category(app: &TestApp, token: &str, name: &str) -> i64 {
    let response = app
        .request(
            Method::POST,
            "/api/v1/categories",
            Some(json!({ "name": name })),
            Some(token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    response_json(response).await["category"]["id"]
        .as_i64()
        .unwrap()
}

#[tokio::test]
async fn duplicate_category_name_is_rejected() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;
    create_category(&app, &token, "Shirts").await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/categories",
            Some(json!({ "name": "SHIRTS" })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let payload = response_json(response).await;
    assert_eq!(payload["errors"]["name"][0], "Category 'SHIRTS' already exists.");
}

#[tokio::test]
async fn item_field_validation_reports_every_bad_field() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;
    let category = create_category(&app, &token, "Bedding").await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/items",
            Some(json!({
                "category": category,
                "name": "  ",
                "washing_price": "-1.00",
                "drycleaning_price": "-2.00",
                "pieces": 0,
            })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let payload = response_json(response).await;
    let errors = payload["errors"].as_object().unwrap();
    assert!(errors.contains_key("name"));
    assert!(errors.contains_key("washing_price"));
    assert!(errors.contains_key("drycleaning_price"));
    assert!(errors.contains_key("pieces"));
}

#[tokio::test]
async fn item_names_are_unique_per_category_only() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;
    let shirts = create_category(&app, &token, "Shirts").await;
    let bedding = create_category(&app, &token, "Bedding").await;

    let item = json!({
        "category": shirts,
        "name": "Standard",
        "washing_price": "2.50",
        "drycleaning_price": "4.00",
        "pieces": 1,
    });
    let response = app
        .request(Method::POST, "/api/v1/items", Some(item.clone()), Some(&token))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    // Same name in the same category: rejected.
    let response = app
        .request(Method::POST, "/api/v1/items", Some(item), Some(&token))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Same name in another category: fine.
    let response = app
        .request(
            Method::POST,
            "/api/v1/items",
            Some(json!({
                "category": bedding,
                "name": "standard",
                "washing_price": "6.00",
                "drycleaning_price": "9.00",
                "pieces": 2,
            })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn item_create_against_missing_category_is_a_field_error() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/items",
            Some(json!({
                "category": 42,
                "name": "Duvet",
                "washing_price": "8.00",
                "drycleaning_price": "12.00",
                "pieces": 1,
            })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let payload = response_json(response).await;
    assert_eq!(payload["errors"]["category"][0], "Category does not exist.");
}

#[tokio::test]
async fn category_detail_embeds_items_and_list_filters_by_category() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;
    let shirts = create_category(&app, &token, "Shirts").await;
    let bedding = create_category(&app, &token, "Bedding").await;

    for (category, name) in [(shirts, "Oxford"), (shirts, "Polo"), (bedding, "Duvet")] {
        let response = app
            .request(
                Method::POST,
                "/api/v1/items",
                Some(json!({
                    "category": category,
                    "name": name,
                    "washing_price": "3.00",
                    "drycleaning_price": "5.00",
                    "pieces": 1,
                })),
                Some(&token),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/categories/{shirts}"),
            None,
            Some(&token),
        )
        .await;
    let payload = response_json(response).await;
    assert_eq!(payload["items"].as_array().unwrap().len(), 2);
    assert_eq!(payload["items"][0]["category_name"], "Shirts");

    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/items?category={bedding}"),
            None,
            Some(&token),
        )
        .await;
    let items = response_json(response).await;
    let items = items.as_array().unwrap().clone();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["name"], "Duvet");
}

#[tokio::test]
async fn deleting_a_category_cascades_to_its_items() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;
    let category = create_category(&app, &token, "Curtains").await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/items",
            Some(json!({
                "category": category,
                "name": "Pair",
                "washing_price": "10.00",
                "drycleaning_price": "15.00",
                "pieces": 2,
            })),
            Some(&token),
        )
        .await;
    let item_id = response_json(response).await["item"]["id"].as_i64().unwrap();

    let response = app
        .request(
            Method::DELETE,
            &format!("/api/v1/categories/{category}"),
            None,
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/items/{item_id}"),
            None,
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn item_update_moves_between_categories_with_uniqueness_check() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;
    let shirts = create_category(&app, &token, "Shirts").await;
    let bedding = create_category(&app, &token, "Bedding").await;

    let mut ids = Vec::new();
    for (category, name) in [(shirts, "Standard"), (bedding, "Standard")] {
        let response = app
            .request(
                Method::POST,
                "/api/v1/items",
                Some(json!({
                    "category": category,
                    "name": name,
                    "washing_price": "3.00",
                    "drycleaning_price": "5.00",
                    "pieces": 1,
                })),
                Some(&token),
            )
            .await;
        ids.push(response_json(response).await["item"]["id"].as_i64().unwrap());
    }

    // Moving the shirts item into bedding collides with its namesake.
    let response = app
        .request(
            Method::PATCH,
            &format!("/api/v1/items/{}", ids[0]),
            Some(json!({ "category": bedding })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Renaming first makes the move legal.
    let response = app
        .request(
            Method::PATCH,
            &format!("/api/v1/items/{}", ids[0]),
            Some(json!({ "category": bedding, "name": "Standard Shirt" })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let payload = response_json(response).await;
    assert_eq!(payload["item"]["category_name"], "Bedding");
}
