//! Single and bulk time-slot toggling.

mod common;

use axum::http::{Method, StatusCode};
use common::{response_json, TestApp};
use laundromat_api::entities::time_slot::SLOT_BANDS;
use serde_json::{json, Value};

async fn create_area(app: &TestApp, token: &str, name: &str) -> i64 {
    let response = app
        .request(
            Method::POST,
            "/api/v1/areas",
            Some(json!({ "name": name })),
            Some(token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    response_json(response).await["area"]["id"].as_i64().unwrap()
}

async fn area_slots(app: &TestApp, token: &str, area_id: i64) -> Vec<Value> {
    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/areas/{area_id}/time-slots"),
            None,
            Some(token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    response_json(response).await.as_array().unwrap().clone()
}

#[tokio::test]
async fn toggling_one_slot_leaves_siblings_untouched() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;
    let area_id = create_area(&app, &token, "Zone 1").await;

    let slots = area_slots(&app, &token, area_id).await;
    let slot_id = slots[0]["id"].as_i64().unwrap();

    let response = app
        .request(
            Method::PATCH,
            &format!("/api/v1/areas/{area_id}/time-slots/{slot_id}"),
            Some(json!({ "is_active": true })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let payload = response_json(response).await;
    assert_eq!(payload["time_slot"]["id"].as_i64().unwrap(), slot_id);
    assert_eq!(payload["time_slot"]["is_active"], true);

    let slots = area_slots(&app, &token, area_id).await;
    let active: Vec<_> = slots.iter().filter(|s| s["is_active"] == true).collect();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0]["id"].as_i64().unwrap(), slot_id);
}

#[tokio::test]
async fn toggling_a_slot_of_another_area_is_not_found() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;
    let first = create_area(&app, &token, "Zone 1").await;
    let second = create_area(&app, &token, "Zone 2").await;

    let foreign_slot = area_slots(&app, &token, second).await[0]["id"]
        .as_i64()
        .unwrap();

    let response = app
        .request(
            Method::PATCH,
            &format!("/api/v1/areas/{first}/time-slots/{foreign_slot}"),
            Some(json!({ "is_active": true })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Nothing flipped anywhere.
    let slots = area_slots(&app, &token, second).await;
    assert!(slots.iter().all(|s| s["is_active"] == false));
}

#[tokio::test]
async fn bulk_day_toggle_reports_exact_count_and_spares_other_days() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;
    let area_id = create_area(&app, &token, "Zone 1").await;

    let response = app
        .request(
            Method::PATCH,
            &format!("/api/v1/areas/{area_id}/time-slots/day/2"),
            Some(json!({ "is_active": true })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let payload = response_json(response).await;
    assert_eq!(payload["updated_count"].as_u64().unwrap(), SLOT_BANDS.len() as u64);
    assert_eq!(payload["day_display"], "Wednesday");

    let slots = area_slots(&app, &token, area_id).await;
    for slot in &slots {
        let expected = slot["day_of_week"].as_i64().unwrap() == 2;
        assert_eq!(slot["is_active"].as_bool().unwrap(), expected);
    }
}

#[tokio::test]
async fn bulk_day_toggle_is_uniform_even_when_slots_disagree() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;
    let area_id = create_area(&app, &token, "Zone 1").await;

    // Activate one Monday slot by hand, then deactivate the whole day.
    let monday_slot = area_slots(&app, &token, area_id)
        .await
        .iter()
        .find(|s| s["day_of_week"] == 0)
        .unwrap()["id"]
        .as_i64()
        .unwrap();
    let response = app
        .request(
            Method::PATCH,
            &format!("/api/v1/areas/{area_id}/time-slots/{monday_slot}"),
            Some(json!({ "is_active": true })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .request(
            Method::PATCH,
            &format!("/api/v1/areas/{area_id}/time-slots/day/0"),
            Some(json!({ "is_active": false })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    // Every Monday row was written, active or not.
    let payload = response_json(response).await;
    assert_eq!(payload["updated_count"].as_u64().unwrap(), SLOT_BANDS.len() as u64);

    let slots = area_slots(&app, &token, area_id).await;
    assert!(slots.iter().all(|s| s["is_active"] == false));
}

#[tokio::test]
async fn day_out_of_range_is_a_validation_error() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;
    let area_id = create_area(&app, &token, "Zone 1").await;

    for day in [7, -1] {
        let response = app
            .request(
                Method::PATCH,
                &format!("/api/v1/areas/{area_id}/time-slots/day/{day}"),
                Some(json!({ "is_active": true })),
                Some(&token),
            )
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
async fn bulk_toggle_on_missing_area_is_not_found() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;

    let response = app
        .request(
            Method::PATCH,
            "/api/v1/areas/999/time-slots/day/1",
            Some(json!({ "is_active": true })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn slot_list_filters_combine() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;
    let area_id = create_area(&app, &token, "Zone 1").await;
    create_area(&app, &token, "Zone 2").await;

    let response = app
        .request(
            Method::PATCH,
            &format!("/api/v1/areas/{area_id}/time-slots/day/4"),
            Some(json!({ "is_active": true })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/time-slots?area={area_id}&is_active=true"),
            None,
            Some(&token),
        )
        .await;
    let slots = response_json(response).await;
    let slots = slots.as_array().unwrap().clone();
    assert_eq!(slots.len(), SLOT_BANDS.len());
    assert!(slots.iter().all(|s| s["day_of_week"] == 4));

    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/time-slots?area={area_id}&day_of_week=4&is_active=false"),
            None,
            Some(&token),
        )
        .await;
    let slots = response_json(response).await;
    assert_eq!(slots.as_array().unwrap().len(), 0);
}
