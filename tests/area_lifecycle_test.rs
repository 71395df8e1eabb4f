//! Area CRUD and slot-grid provisioning.

mod common;

use axum::http::{Method, StatusCode};
use common::{response_json, TestApp};
use laundromat_api::entities::time_slot::WEEKLY_SLOT_COUNT;
use serde_json::json;

#[tokio::test]
async fn creating_an_area_provisions_the_full_inactive_grid() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/areas",
            Some(json!({ "name": "Zone 1" })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let payload = response_json(response).await;
    assert_eq!(payload["message"], "Area created successfully.");
    let area_id = payload["area"]["id"].as_i64().unwrap();

    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/areas/{area_id}/time-slots"),
            None,
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let slots = response_json(response).await;
    let slots = slots.as_array().unwrap();
    assert_eq!(slots.len(), WEEKLY_SLOT_COUNT);
    assert!(slots.iter().all(|slot| slot["is_active"] == false));
}

#[tokio::test]
async fn duplicate_area_name_is_rejected_case_insensitively() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/areas",
            Some(json!({ "name": "Zone 1" })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .request(
            Method::POST,
            "/api/v1/areas",
            Some(json!({ "name": "  zone 1 " })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let payload = response_json(response).await;
    assert_eq!(payload["errors"]["name"][0], "Area 'zone 1' already exists.");

    // The original record is unchanged and still the only one.
    let response = app
        .request(Method::GET, "/api/v1/areas", None, Some(&token))
        .await;
    let areas = response_json(response).await;
    let areas = areas.as_array().unwrap().clone();
    assert_eq!(areas.len(), 1);
    assert_eq!(areas[0]["name"], "Zone 1");
}

#[tokio::test]
async fn blank_area_name_is_rejected() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/areas",
            Some(json!({ "name": "   " })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let payload = response_json(response).await;
    assert_eq!(payload["errors"]["name"][0], "Area name is required.");
}

#[tokio::test]
async fn rename_rejects_other_areas_name_but_allows_own() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;

    for name in ["North", "South"] {
        let response = app
            .request(
                Method::POST,
                "/api/v1/areas",
                Some(json!({ "name": name })),
                Some(&token),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = app
        .request(Method::GET, "/api/v1/areas", None, Some(&token))
        .await;
    let areas = response_json(response).await;
    let south_id = areas
        .as_array()
        .unwrap()
        .iter()
        .find(|a| a["name"] == "South")
        .unwrap()["id"]
        .as_i64()
        .unwrap();

    // Renaming onto an existing name fails...
    let response = app
        .request(
            Method::PATCH,
            &format!("/api/v1/areas/{south_id}"),
            Some(json!({ "name": "north" })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // ...but re-submitting its own name (case change) is fine.
    let response = app
        .request(
            Method::PUT,
            &format!("/api/v1/areas/{south_id}"),
            Some(json!({ "name": "SOUTH" })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let payload = response_json(response).await;
    assert_eq!(payload["area"]["name"], "SOUTH");
}

#[tokio::test]
async fn area_deletion_is_blocked_while_postcodes_reference_it() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/areas",
            Some(json!({ "name": "Central" })),
            Some(&token),
        )
        .await;
    let area_id = response_json(response).await["area"]["id"].as_i64().unwrap();

    let response = app
        .request(
            Method::POST,
            "/api/v1/postcodes",
            Some(json!({ "postcode": "sw1a 1aa", "area": area_id })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let postcode = response_json(response).await;
    assert_eq!(postcode["postcode"]["postcode"], "SW1A 1AA");
    let postcode_id = postcode["postcode"]["id"].as_i64().unwrap();

    let response = app
        .request(
            Method::DELETE,
            &format!("/api/v1/areas/{area_id}"),
            None,
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .request(
            Method::DELETE,
            &format!("/api/v1/postcodes/{postcode_id}"),
            None,
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .request(
            Method::DELETE,
            &format!("/api/v1/areas/{area_id}"),
            None,
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    // The grid went with the area.
    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/time-slots?area={area_id}"),
            None,
            Some(&token),
        )
        .await;
    let slots = response_json(response).await;
    assert_eq!(slots.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn area_detail_embeds_postcodes() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/areas",
            Some(json!({ "name": "Docklands" })),
            Some(&token),
        )
        .await;
    let area_id = response_json(response).await["area"]["id"].as_i64().unwrap();

    for code in ["E14 5AB", "E14 9GE"] {
        let response = app
            .request(
                Method::POST,
                "/api/v1/postcodes",
                Some(json!({ "postcode": code, "area": area_id })),
                Some(&token),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/areas/{area_id}"),
            None,
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let payload = response_json(response).await;
    assert_eq!(payload["postcodes"].as_array().unwrap().len(), 2);
    assert_eq!(payload["postcodes"][0]["postcode"], "E14 5AB");
}

#[tokio::test]
async fn admin_endpoints_require_authentication() {
    let app = TestApp::new().await;

    let response = app.request(Method::GET, "/api/v1/areas", None, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .request(
            Method::POST,
            "/api/v1/areas",
            Some(json!({ "name": "Zone 1" })),
            Some("not-a-real-token"),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .request(Method::GET, "/api/v1/areas/1", None, None)
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn missing_area_returns_not_found() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;

    let response = app
        .request(Method::GET, "/api/v1/areas/999", None, Some(&token))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
