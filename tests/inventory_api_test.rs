//! Integration tests for inventory listing, stock classification, and
//! manual stock adjustments.

mod common;

use axum::http::{Method, StatusCode};
use common::{response_json, TestApp};
use rust_decimal_macros::dec;
use serde_json::json;
use uuid::Uuid;

async fn seed_tiers(app: &TestApp) {
    // in stock: 10 >= 4, low: 0 < 2 < 5, out: 0
    app.seed_product("Rice", dec!(50), 10, 4).await;
    app.seed_product("Eggs", dec!(8), 2, 5).await;
    app.seed_product("Milk", dec!(90), 0, 3).await;
}

#[tokio::test]
async fn inventory_reports_stock_tiers() {
    let app = TestApp::new().await;
    seed_tiers(&app).await;

    let inventory = response_json(
        app.request_authenticated(Method::GET, "/api/v1/inventory", None)
            .await,
    )
    .await;
    let items = inventory.as_array().unwrap();
    assert_eq!(items.len(), 3);

    let status_of = |name: &str| {
        items
            .iter()
            .find(|p| p["name"] == json!(name))
            .map(|p| p["stock_status"].clone())
            .unwrap()
    };
    assert_eq!(status_of("Rice"), json!("in_stock"));
    assert_eq!(status_of("Eggs"), json!("low_stock"));
    assert_eq!(status_of("Milk"), json!("out_of_stock"));
}

#[tokio::test]
async fn inventory_filters_by_tier_and_search() {
    let app = TestApp::new().await;
    seed_tiers(&app).await;

    let low = response_json(
        app.request_authenticated(Method::GET, "/api/v1/inventory?status=low_stock", None)
            .await,
    )
    .await;
    let low = low.as_array().unwrap();
    assert_eq!(low.len(), 1);
    assert_eq!(low[0]["name"], json!("Eggs"));

    let searched = response_json(
        app.request_authenticated(Method::GET, "/api/v1/inventory?search=ric", None)
            .await,
    )
    .await;
    let searched = searched.as_array().unwrap();
    assert_eq!(searched.len(), 1);
    assert_eq!(searched[0]["name"], json!("Rice"));
}

#[tokio::test]
async fn summary_counts_each_tier() {
    let app = TestApp::new().await;
    seed_tiers(&app).await;

    let summary = response_json(
        app.request_authenticated(Method::GET, "/api/v1/inventory/summary", None)
            .await,
    )
    .await;
    assert_eq!(summary["total_products"], json!(3));
    assert_eq!(summary["in_stock"], json!(1));
    assert_eq!(summary["low_stock"], json!(1));
    assert_eq!(summary["out_of_stock"], json!(1));
}

#[tokio::test]
async fn low_stock_lists_low_and_out_tiers() {
    let app = TestApp::new().await;
    seed_tiers(&app).await;

    let low = response_json(
        app.request_authenticated(Method::GET, "/api/v1/inventory/low-stock", None)
            .await,
    )
    .await;
    let names: Vec<_> = low
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names.len(), 2);
    assert!(names.contains(&"Eggs".to_string()));
    assert!(names.contains(&"Milk".to_string()));
}

#[tokio::test]
async fn adjust_stock_sets_and_shifts_levels() {
    let app = TestApp::new().await;
    let product = app.seed_product("Sugar", dec!(30), 5, 2).await;

    // Absolute set
    let set = response_json(
        app.request_authenticated(
            Method::POST,
            &format!("/api/v1/inventory/{}/adjust", product.id),
            Some(json!({ "set_quantity": 12 })),
        )
        .await,
    )
    .await;
    assert_eq!(set["stock_quantity"], json!(12));

    // Relative delta, floored at zero
    let floored = response_json(
        app.request_authenticated(
            Method::POST,
            &format!("/api/v1/inventory/{}/adjust", product.id),
            Some(json!({ "delta": -20 })),
        )
        .await,
    )
    .await;
    assert_eq!(floored["stock_quantity"], json!(0));
}

#[tokio::test]
async fn adjust_rejects_ambiguous_input() {
    let app = TestApp::new().await;
    let product = app.seed_product("Flour", dec!(40), 5, 2).await;

    let response = app
        .request_authenticated(
            Method::POST,
            &format!("/api/v1/inventory/{}/adjust", product.id),
            Some(json!({ "set_quantity": 3, "delta": 1 })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn adjust_unknown_product_is_not_found() {
    let app = TestApp::new().await;

    let response = app
        .request_authenticated(
            Method::POST,
            &format!("/api/v1/inventory/{}/adjust", Uuid::new_v4()),
            Some(json!({ "delta": 1 })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deactivated_products_leave_the_inventory() {
    let app = TestApp::new().await;
    let product = app.seed_product("Vinegar", dec!(25), 6, 2).await;

    let delete = app
        .request_authenticated(
            Method::DELETE,
            &format!("/api/v1/products/{}", product.id),
            None,
        )
        .await;
    assert_eq!(delete.status(), StatusCode::NO_CONTENT);

    let inventory = response_json(
        app.request_authenticated(Method::GET, "/api/v1/inventory", None)
            .await,
    )
    .await;
    assert!(inventory.as_array().unwrap().is_empty());

    // Soft delete keeps the row reachable by id
    let fetched = response_json(
        app.request_authenticated(
            Method::GET,
            &format!("/api/v1/products/{}", product.id),
            None,
        )
        .await,
    )
    .await;
    assert_eq!(fetched["is_active"], json!(false));
}
