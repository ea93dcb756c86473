//! Integration tests for the checkout flow: cart submission, stock
//! decrements, receipt issuance, and validation failures, exercised through
//! the public HTTP surface against a real (SQLite) database.

mod common;

use axum::http::{Method, StatusCode};
use common::{response_json, TestApp};
use rust_decimal_macros::dec;
use serde_json::json;

fn cart_payload(product_a: &serde_json::Value, product_b: &serde_json::Value) -> serde_json::Value {
    json!({
        "lines": [
            {
                "product_id": product_a,
                "product_name": "Instant Coffee",
                "quantity": 2,
                "unit_price": "10"
            },
            {
                "product_id": product_b,
                "product_name": "Canned Tuna",
                "quantity": 1,
                "unit_price": "25"
            }
        ],
        "payment_method": "Cash",
        "subtotal": "45",
        "tax_amount": "0",
        "total_amount": "45",
        "amount_tendered": "50"
    })
}

#[tokio::test]
async fn checkout_creates_transaction_items_and_decrements_stock() {
    let app = TestApp::new().await;
    let product_a = app.seed_product("Instant Coffee", dec!(10), 5, 2).await;
    let product_b = app.seed_product("Canned Tuna", dec!(25), 1, 5).await;

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/checkout",
            Some(cart_payload(
                &json!(product_a.id.to_string()),
                &json!(product_b.id.to_string()),
            )),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = response_json(response).await;
    let receipt = body["receipt_number"].as_str().expect("receipt number");
    assert!(receipt.starts_with("RCP-"));
    let suffix = receipt.rsplit('-').next().unwrap();
    assert_eq!(suffix.len(), 9);
    assert_eq!(body["change_due"], json!("5"));
    assert_eq!(body["transaction"]["cashier_name"], json!("Test Cashier"));
    assert_eq!(body["transaction"]["status"], json!("completed"));
    let transaction_id = body["transaction"]["id"].as_str().unwrap().to_string();

    // Stock decremented, floored at zero for the fully sold product
    let inventory = app
        .request_authenticated(Method::GET, "/api/v1/inventory", None)
        .await;
    let inventory = response_json(inventory).await;
    let stock_of = |name: &str| {
        inventory
            .as_array()
            .unwrap()
            .iter()
            .find(|p| p["name"] == json!(name))
            .map(|p| p["stock_quantity"].as_i64().unwrap())
            .unwrap()
    };
    assert_eq!(stock_of("Instant Coffee"), 3);
    assert_eq!(stock_of("Canned Tuna"), 0);

    // Exactly one transaction with two line items, subtotal = qty x price
    let detail = app
        .request_authenticated(
            Method::GET,
            &format!("/api/v1/transactions/{}", transaction_id),
            None,
        )
        .await;
    assert_eq!(detail.status(), StatusCode::OK);
    let detail = response_json(detail).await;
    let items = detail["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["subtotal"], json!("20"));
    assert_eq!(items[1]["subtotal"], json!("25"));

    // Sold-out product now reports the out tier
    let tuna = inventory
        .as_array()
        .unwrap()
        .iter()
        .find(|p| p["name"] == json!("Canned Tuna"))
        .unwrap();
    assert_eq!(tuna["stock_quantity"], json!(0));
}

#[tokio::test]
async fn checkout_requires_authentication() {
    let app = TestApp::new().await;

    let response = app
        .request(Method::POST, "/api/v1/checkout", Some(json!({})), None)
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn empty_cart_is_rejected() {
    let app = TestApp::new().await;

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/checkout",
            Some(json!({
                "lines": [],
                "payment_method": "Cash",
                "subtotal": "0",
                "tax_amount": "0",
                "total_amount": "0",
                "amount_tendered": "0"
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = response_json(response).await;
    assert!(body["message"].as_str().unwrap().contains("Cart is empty"));
}

#[tokio::test]
async fn short_cash_tender_is_rejected() {
    let app = TestApp::new().await;
    let product = app.seed_product("Cooking Oil", dec!(120), 4, 2).await;

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/checkout",
            Some(json!({
                "lines": [{
                    "product_id": product.id.to_string(),
                    "product_name": "Cooking Oil",
                    "quantity": 1,
                    "unit_price": "120"
                }],
                "payment_method": "Cash",
                "subtotal": "120",
                "tax_amount": "0",
                "total_amount": "120",
                "amount_tendered": "100"
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Nothing was written: no transactions, stock untouched
    let transactions = response_json(
        app.request_authenticated(Method::GET, "/api/v1/transactions", None)
            .await,
    )
    .await;
    assert_eq!(transactions["total"], json!(0));

    let product_after = response_json(
        app.request_authenticated(
            Method::GET,
            &format!("/api/v1/products/{}", product.id),
            None,
        )
        .await,
    )
    .await;
    assert_eq!(product_after["stock_quantity"], json!(4));
}

#[tokio::test]
async fn gcash_payment_reports_no_change() {
    let app = TestApp::new().await;
    let product = app.seed_product("Bottled Water", dec!(15), 10, 3).await;

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/checkout",
            Some(json!({
                "lines": [{
                    "product_id": product.id.to_string(),
                    "product_name": "Bottled Water",
                    "quantity": 2,
                    "unit_price": "15"
                }],
                "payment_method": "GCash",
                "subtotal": "30",
                "tax_amount": "0",
                "total_amount": "30"
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = response_json(response).await;
    assert!(body["change_due"].is_null());
    assert_eq!(body["transaction"]["payment_method"], json!("GCash"));
}

#[tokio::test]
async fn overselling_clamps_stock_at_zero() {
    let app = TestApp::new().await;
    let product = app.seed_product("Ice Candy", dec!(5), 2, 1).await;

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/checkout",
            Some(json!({
                "lines": [{
                    "product_id": product.id.to_string(),
                    "product_name": "Ice Candy",
                    "quantity": 6,
                    "unit_price": "5"
                }],
                "payment_method": "Cash",
                "subtotal": "30",
                "tax_amount": "0",
                "total_amount": "30",
                "amount_tendered": "30"
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let product_after = response_json(
        app.request_authenticated(
            Method::GET,
            &format!("/api/v1/products/{}", product.id),
            None,
        )
        .await,
    )
    .await;
    assert_eq!(product_after["stock_quantity"], json!(0));
    assert_eq!(product_after["stock_status"], json!("out_of_stock"));
}

#[tokio::test]
async fn identical_carts_accumulate_into_distinct_transactions() {
    let app = TestApp::new().await;
    let product = app.seed_product("Laundry Soap", dec!(20), 10, 2).await;

    let payload = json!({
        "lines": [{
            "product_id": product.id.to_string(),
            "product_name": "Laundry Soap",
            "quantity": 3,
            "unit_price": "20"
        }],
        "payment_method": "Cash",
        "subtotal": "60",
        "tax_amount": "0",
        "total_amount": "60",
        "amount_tendered": "100"
    });

    let first = response_json(
        app.request_authenticated(Method::POST, "/api/v1/checkout", Some(payload.clone()))
            .await,
    )
    .await;
    let second = response_json(
        app.request_authenticated(Method::POST, "/api/v1/checkout", Some(payload))
            .await,
    )
    .await;

    assert_ne!(first["transaction"]["id"], second["transaction"]["id"]);
    assert_ne!(first["receipt_number"], second["receipt_number"]);

    let product_after = response_json(
        app.request_authenticated(
            Method::GET,
            &format!("/api/v1/products/{}", product.id),
            None,
        )
        .await,
    )
    .await;
    assert_eq!(product_after["stock_quantity"], json!(4));

    let transactions = response_json(
        app.request_authenticated(Method::GET, "/api/v1/transactions", None)
            .await,
    )
    .await;
    assert_eq!(transactions["total"], json!(2));
}
