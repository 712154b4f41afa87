//! End-to-end flows against a running server.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database (stockroom-cli migrate)
//! - The server running (cargo run -p stockroom-server)
//!
//! Run with: cargo test -p stockroom-integration-tests -- --ignored

#![allow(clippy::unwrap_used)]

use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use stockroom_integration_tests::base_url;
use uuid::Uuid;

const PASSWORD: &str = "Inv0ice#Pass";

struct TestUser {
    id: i64,
    token: String,
}

/// Register a fresh user and log in.
async fn signed_up_user(client: &Client) -> TestUser {
    let base_url = base_url();
    let unique = Uuid::new_v4();
    let email = format!("flow-{}@example.com", unique.simple());
    let phone = format!("{:012}", unique.as_u128() % 1_000_000_000_000);

    let resp = client
        .post(format!("{base_url}/user-registration"))
        .json(&json!({
            "name": "Flow Tester",
            "email": email,
            "phone": phone,
            "password": PASSWORD,
            "confirmPassword": PASSWORD,
        }))
        .send()
        .await
        .expect("Failed to register");
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = client
        .post(format!("{base_url}/login"))
        .json(&json!({"email": email, "password": PASSWORD}))
        .send()
        .await
        .expect("Failed to log in")
        .json()
        .await
        .expect("Login body");
    let token = body["token"].as_str().expect("token").to_string();

    let profile: Value = client
        .get(format!("{base_url}/profile"))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to load profile")
        .json()
        .await
        .expect("Profile body");

    TestUser {
        id: profile["data"]["id"].as_i64().expect("user id"),
        token,
    }
}

async fn add_product(client: &Client, user: &TestUser, product_id: i64, quantity: i32, price: &str) {
    let resp = client
        .post(format!("{}/add-product", base_url()))
        .bearer_auth(&user.token)
        .json(&json!({
            "productId": product_id,
            "name": format!("Product {product_id}"),
            "quantity": quantity,
            "price": price,
            "description": "Integration test product",
        }))
        .send()
        .await
        .expect("Failed to add product");
    assert_eq!(resp.status(), StatusCode::OK);
}

async fn inventory_ids(client: &Client, user: &TestUser) -> Vec<i64> {
    let body: Value = client
        .get(format!("{}/inventory-list/{}", base_url(), user.id))
        .bearer_auth(&user.token)
        .send()
        .await
        .expect("Failed to list inventory")
        .json()
        .await
        .expect("Inventory body");

    body["data"]
        .as_array()
        .expect("inventory array")
        .iter()
        .map(|item| item["id"].as_i64().expect("inventory id"))
        .collect()
}

fn amount(value: &Value) -> f64 {
    value.as_str().expect("decimal string").parse().expect("decimal")
}

#[tokio::test]
#[ignore = "Requires running stockroom server and PostgreSQL"]
async fn test_invoice_lifecycle() {
    let client = Client::new();
    let base_url = base_url();
    let user = signed_up_user(&client).await;

    add_product(&client, &user, 1, 2, "10.50").await;
    add_product(&client, &user, 2, 1, "14.00").await;
    let ids = inventory_ids(&client, &user).await;
    assert_eq!(ids.len(), 2);

    // Create
    let resp = client
        .post(format!("{base_url}/create-invoice"))
        .bearer_auth(&user.token)
        .json(&json!({"userId": user.id, "inventoryIds": ids}))
        .send()
        .await
        .expect("Failed to create invoice");
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    let invoice_id = body["invoice"]["id"].as_i64().unwrap();
    assert!((amount(&body["invoice"]["totalAmount"]) - 35.0).abs() < f64::EPSILON);

    // Consumed rows are gone
    assert!(inventory_ids(&client, &user).await.is_empty());

    // View
    let body: Value = client
        .get(format!("{base_url}/view-invoice/{invoice_id}"))
        .bearer_auth(&user.token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["data"]["user"]["id"].as_i64(), Some(user.id));
    assert_eq!(body["data"]["products"].as_array().unwrap().len(), 2);

    // List
    let body: Value = client
        .get(format!("{base_url}/invoice-list/{}", user.id))
        .bearer_auth(&user.token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["data"][0]["id"].as_i64(), Some(invoice_id));

    // Reusing consumed rows fails
    let resp = client
        .post(format!("{base_url}/create-invoice"))
        .bearer_auth(&user.token)
        .json(&json!({"userId": user.id, "inventoryIds": ids}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    // Delete
    let resp = client
        .delete(format!("{base_url}/invoice-delete/{invoice_id}"))
        .bearer_auth(&user.token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client
        .get(format!("{base_url}/view-invoice/{invoice_id}"))
        .bearer_auth(&user.token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = client
        .get(format!("{base_url}/invoice-list/{}", user.id))
        .bearer_auth(&user.token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires running stockroom server and PostgreSQL"]
async fn test_foreign_inventory_is_rejected_atomically() {
    let client = Client::new();
    let base_url = base_url();
    let alice = signed_up_user(&client).await;
    let bob = signed_up_user(&client).await;

    add_product(&client, &alice, 3, 1, "5.00").await;
    add_product(&client, &bob, 4, 1, "7.00").await;
    let alice_ids = inventory_ids(&client, &alice).await;
    let bob_ids = inventory_ids(&client, &bob).await;

    let mixed: Vec<i64> = alice_ids.iter().chain(&bob_ids).copied().collect();
    let resp = client
        .post(format!("{base_url}/create-invoice"))
        .bearer_auth(&alice.token)
        .json(&json!({"userId": alice.id, "inventoryIds": mixed}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    // Nothing was consumed
    assert_eq!(inventory_ids(&client, &alice).await, alice_ids);
    assert_eq!(inventory_ids(&client, &bob).await, bob_ids);

    // Non-admins cannot read another user's inventory
    let resp = client
        .get(format!("{base_url}/inventory-list/{}", bob.id))
        .bearer_auth(&alice.token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore = "Requires running stockroom server and PostgreSQL"]
async fn test_adding_same_product_accumulates_quantity() {
    let client = Client::new();
    let user = signed_up_user(&client).await;

    add_product(&client, &user, 5, 2, "3.25").await;
    add_product(&client, &user, 5, 3, "3.25").await;

    let body: Value = client
        .get(format!("{}/inventory-list/{}", base_url(), user.id))
        .bearer_auth(&user.token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let items = body["data"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["quantity"].as_i64(), Some(5));
}

#[tokio::test]
#[ignore = "Requires running stockroom server and PostgreSQL"]
async fn test_duplicate_registration_conflicts() {
    let client = Client::new();
    let base_url = base_url();
    let email = format!("dup-{}@example.com", Uuid::new_v4().simple());
    let form = json!({
        "name": "Dup Tester",
        "email": email,
        "phone": format!("{:011}", Uuid::new_v4().as_u128() % 100_000_000_000),
        "password": PASSWORD,
        "confirmPassword": PASSWORD,
    });

    let first = client
        .post(format!("{base_url}/user-registration"))
        .json(&form)
        .send()
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let second = client
        .post(format!("{base_url}/user-registration"))
        .json(&form)
        .send()
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::CONFLICT);
}
