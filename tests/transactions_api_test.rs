//! Integration tests for transaction history: listing, filtering, detail,
//! administrative deletion, and CSV export.

mod common;

use axum::http::{Method, StatusCode};
use common::{response_json, response_text, TestApp};
use rust_decimal_macros::dec;
use serde_json::json;

async fn complete_sale(app: &TestApp, product_name: &str, quantity: i64, unit_price: &str) -> serde_json::Value {
    let product = app
        .seed_product(product_name, unit_price.parse().unwrap(), 50, 5)
        .await;

    let subtotal =
        unit_price.parse::<rust_decimal::Decimal>().unwrap() * rust_decimal::Decimal::from(quantity);
    let payload = json!({
        "lines": [{
            "product_id": product.id.to_string(),
            "product_name": product_name,
            "quantity": quantity,
            "unit_price": unit_price
        }],
        "payment_method": "Cash",
        "subtotal": subtotal.to_string(),
        "tax_amount": "0",
        "total_amount": subtotal.to_string(),
        "amount_tendered": (subtotal + dec!(100)).to_string()
    });

    let response = app
        .request_authenticated(Method::POST, "/api/v1/checkout", Some(payload))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    response_json(response).await
}

#[tokio::test]
async fn history_lists_sales_newest_first() {
    let app = TestApp::new().await;
    complete_sale(&app, "Noodles", 2, "12").await;
    complete_sale(&app, "Sardines", 1, "28").await;

    let body = response_json(
        app.request_authenticated(Method::GET, "/api/v1/transactions", None)
            .await,
    )
    .await;
    assert_eq!(body["total"], json!(2));
    assert_eq!(body["page"], json!(1));
    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert!(items
        .iter()
        .all(|t| t["cashier_name"] == json!("Test Cashier")));
}

#[tokio::test]
async fn history_searches_by_receipt_number() {
    let app = TestApp::new().await;
    let sale = complete_sale(&app, "Crackers", 1, "18").await;
    complete_sale(&app, "Juice", 1, "22").await;

    let receipt = sale["receipt_number"].as_str().unwrap();
    let body = response_json(
        app.request_authenticated(
            Method::GET,
            &format!("/api/v1/transactions?search={}", receipt),
            None,
        )
        .await,
    )
    .await;
    assert_eq!(body["total"], json!(1));
    assert_eq!(body["items"][0]["receipt_number"], json!(receipt));
}

#[tokio::test]
async fn detail_includes_line_items() {
    let app = TestApp::new().await;
    let sale = complete_sale(&app, "Soy Sauce", 3, "15").await;
    let id = sale["transaction"]["id"].as_str().unwrap();

    let detail = response_json(
        app.request_authenticated(Method::GET, &format!("/api/v1/transactions/{}", id), None)
            .await,
    )
    .await;
    assert_eq!(detail["id"], json!(id));
    let items = detail["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["product_name"], json!("Soy Sauce"));
    assert_eq!(items[0]["quantity"], json!(3));
}

#[tokio::test]
async fn delete_removes_transaction_and_items() {
    let app = TestApp::new().await;
    let sale = complete_sale(&app, "Garlic", 1, "10").await;
    let id = sale["transaction"]["id"].as_str().unwrap().to_string();

    let delete = app
        .request_authenticated(Method::DELETE, &format!("/api/v1/transactions/{}", id), None)
        .await;
    assert_eq!(delete.status(), StatusCode::NO_CONTENT);

    let listing = response_json(
        app.request_authenticated(Method::GET, "/api/v1/transactions", None)
            .await,
    )
    .await;
    assert_eq!(listing["total"], json!(0));

    let detail = app
        .request_authenticated(Method::GET, &format!("/api/v1/transactions/{}", id), None)
        .await;
    assert_eq!(detail.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn export_returns_csv_with_receipts() {
    let app = TestApp::new().await;
    let sale = complete_sale(&app, "Pepper", 1, "35").await;
    let receipt = sale["receipt_number"].as_str().unwrap().to_string();

    let response = app
        .request_authenticated(Method::GET, "/api/v1/transactions/export", None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok()),
        Some("text/csv")
    );

    let csv = response_text(response).await;
    let mut lines = csv.lines();
    assert_eq!(
        lines.next(),
        Some("receipt_number,created_at,cashier_name,payment_method,status,subtotal,tax_amount,total_amount")
    );
    assert!(csv.contains(&receipt));
    assert!(csv.contains("Cash"));
}

#[tokio::test]
async fn transactions_are_scoped_to_the_operator() {
    let app = TestApp::new().await;
    complete_sale(&app, "Cheese", 1, "55").await;

    // A second operator sees an empty history
    let other = app
        .state
        .auth
        .register(pos_api::auth::SignupInput {
            email: "second@example.com".to_string(),
            password: "another-password".to_string(),
            full_name: "Second Operator".to_string(),
            store_name: None,
        })
        .await
        .expect("register second operator");
    let other_token = app
        .state
        .auth
        .issue_token(other.id, Some("Second Operator".to_string()), None)
        .unwrap()
        .access_token;

    let body = response_json(
        app.request(
            Method::GET,
            "/api/v1/transactions",
            None,
            Some(&other_token),
        )
        .await,
    )
    .await;
    assert_eq!(body["total"], json!(0));
}
