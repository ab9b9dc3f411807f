//! Integration tests for the Tillpoint API
//!
//! Drive the real router end to end over the in-memory backend: login and
//! token handling, role gating, the checkout flow, soft deletion, returns,
//! handovers, and the dashboard aggregates.

mod common;

use axum::http::StatusCode;
use common::{request, TestContext, PASSWORD};
use serde_json::json;
use tillpoint_shared::storage::Storage;

#[tokio::test]
async fn login_returns_token_and_profiles() {
    let ctx = TestContext::new().await;

    let (status, body) = request(
        &ctx.app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({
            "shop_id": "testshop",
            "username": "admin",
            "password": PASSWORD,
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["token"].as_str().unwrap().len() > 20);
    assert_eq!(body["user"]["username"], "admin");
    assert_eq!(body["user"]["role"], "admin");
    assert_eq!(body["tenant"]["subdomain"], "testshop");
    assert_eq!(body["tenant"]["primary_color"], "#1976D2");

    // the token works against a protected endpoint
    let token = body["token"].as_str().unwrap();
    let (status, me) = request(&ctx.app, "GET", "/api/auth/me", Some(token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["user"]["id"], body["user"]["id"]);
    assert_eq!(me["tenant"]["name"], "Test Shop");
}

#[tokio::test]
async fn login_failures_do_not_leak_which_field_was_wrong() {
    let ctx = TestContext::new().await;

    let attempts = [
        json!({"shop_id": "nosuchshop", "username": "admin", "password": PASSWORD}),
        json!({"shop_id": "testshop", "username": "nobody", "password": PASSWORD}),
        json!({"shop_id": "testshop", "username": "admin", "password": "wrong-password"}),
    ];

    let mut messages = Vec::new();
    for attempt in attempts {
        let (status, body) =
            request(&ctx.app, "POST", "/api/auth/login", None, Some(attempt)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        messages.push(body["message"].as_str().unwrap().to_string());
    }

    // identical answer for unknown shop, unknown user, and wrong password
    assert_eq!(messages[0], messages[1]);
    assert_eq!(messages[1], messages[2]);
}

#[tokio::test]
async fn protected_endpoints_require_a_valid_token() {
    let ctx = TestContext::new().await;

    let (status, _) = request(&ctx.app, "GET", "/api/products", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = request(
        &ctx.app,
        "GET",
        "/api/products",
        Some("not-a-real-token"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn product_creation_is_admin_only() {
    let ctx = TestContext::new().await;
    let admin_token = ctx.token_for(&ctx.admin);
    let cashier_token = ctx.token_for(&ctx.cashier);

    let new_product = json!({
        "name": "Chips",
        "sku": "CH-1",
        "category": "snacks",
        "price_cents": 199,
        "stock": 30,
    });

    // cashier is rejected
    let (status, _) = request(
        &ctx.app,
        "POST",
        "/api/products",
        Some(&cashier_token),
        Some(new_product.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // admin succeeds
    let (status, created) = request(
        &ctx.app,
        "POST",
        "/api/products",
        Some(&admin_token),
        Some(new_product),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["name"], "Chips");

    // and the product shows up in the listing
    let (status, listed) = request(
        &ctx.app,
        "GET",
        "/api/products",
        Some(&cashier_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = listed
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    assert!(names.contains(&"Chips"));
}

#[tokio::test]
async fn checkout_decrements_stock_and_totals_add_up() {
    let ctx = TestContext::new().await;
    let token = ctx.token_for(&ctx.cashier);

    let (status, receipt) = request(
        &ctx.app,
        "POST",
        "/api/transactions",
        Some(&token),
        Some(json!({
            "items": [
                {"product_id": ctx.cola.id, "quantity": 2},
                {"product_id": ctx.bread.id, "quantity": 3},
            ],
            "payment_method": "cash",
            "customer_name": "Walk-in",
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let transaction = &receipt["transaction"];
    // 2 × $2.50 + 3 × $1.50 = $9.50, 12.5% tax
    assert_eq!(transaction["subtotal_cents"], 950);
    assert_eq!(transaction["tax_cents"], 119);
    assert_eq!(
        transaction["total_cents"].as_i64().unwrap(),
        transaction["subtotal_cents"].as_i64().unwrap()
            + transaction["tax_cents"].as_i64().unwrap()
    );
    assert_eq!(transaction["status"], "completed");
    assert_eq!(receipt["items"].as_array().unwrap().len(), 2);

    // stock moved by exactly the purchased quantities
    let (_, products) = request(&ctx.app, "GET", "/api/products", Some(&token), None).await;
    for product in products.as_array().unwrap() {
        match product["name"].as_str().unwrap() {
            "Cola" => assert_eq!(product["stock"], 48),
            "Bread" => assert_eq!(product["stock"], 22),
            other => panic!("unexpected product {other}"),
        }
    }

    // the detail endpoint returns the same sale with its items
    let id = transaction["id"].as_str().unwrap();
    let (status, detail) = request(
        &ctx.app,
        "GET",
        &format!("/api/transactions/{id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["transaction"]["id"], transaction["id"]);
    assert_eq!(detail["items"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn checkout_is_refused_by_staff_role() {
    let ctx = TestContext::new().await;

    // staff can browse but not sell
    let staff = ctx
        .storage
        .create_user(tillpoint_shared::models::user::CreateUser {
            tenant_id: ctx.tenant.id,
            username: "shelf".to_string(),
            email: None,
            password_hash: "$argon2id$placeholder".to_string(),
            first_name: None,
            last_name: None,
            role: None, // defaults to staff
        })
        .await
        .unwrap();
    let token = ctx.token_for(&staff);

    let (status, _) = request(
        &ctx.app,
        "POST",
        "/api/transactions",
        Some(&token),
        Some(json!({
            "items": [{"product_id": ctx.cola.id, "quantity": 1}],
            "payment_method": "cash",
        })),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn overselling_fails_with_bad_request_and_no_side_effects() {
    let ctx = TestContext::new().await;
    let token = ctx.token_for(&ctx.cashier);

    let (status, body) = request(
        &ctx.app,
        "POST",
        "/api/transactions",
        Some(&token),
        Some(json!({
            "items": [{"product_id": ctx.bread.id, "quantity": 9999}],
            "payment_method": "card",
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");

    let (_, transactions) = request(&ctx.app, "GET", "/api/transactions", Some(&token), None).await;
    assert!(transactions.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn soft_deleted_product_leaves_history_intact() {
    let ctx = TestContext::new().await;
    let admin_token = ctx.token_for(&ctx.admin);

    // sell one cola first
    let (_, receipt) = request(
        &ctx.app,
        "POST",
        "/api/transactions",
        Some(&admin_token),
        Some(json!({
            "items": [{"product_id": ctx.cola.id, "quantity": 1}],
            "payment_method": "cash",
        })),
    )
    .await;
    let transaction_id = receipt["transaction"]["id"].as_str().unwrap().to_string();

    // delete it
    let (status, body) = request(
        &ctx.app,
        "DELETE",
        &format!("/api/products/{}", ctx.cola.id),
        Some(&admin_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Product deleted successfully");

    // gone from the listing
    let (_, products) = request(&ctx.app, "GET", "/api/products", Some(&admin_token), None).await;
    assert!(products
        .as_array()
        .unwrap()
        .iter()
        .all(|p| p["name"] != "Cola"));

    // but the historical sale still references it
    let (status, detail) = request(
        &ctx.app,
        "GET",
        &format!("/api/transactions/{transaction_id}"),
        Some(&admin_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        detail["items"][0]["product_id"].as_str().unwrap(),
        ctx.cola.id.to_string()
    );
}

#[tokio::test]
async fn full_return_refunds_what_was_paid() {
    let ctx = TestContext::new().await;
    let token = ctx.token_for(&ctx.cashier);

    let (_, receipt) = request(
        &ctx.app,
        "POST",
        "/api/transactions",
        Some(&token),
        Some(json!({
            "items": [{"product_id": ctx.cola.id, "quantity": 2}],
            "payment_method": "mobile_money",
        })),
    )
    .await;
    let transaction = &receipt["transaction"];

    let (status, return_record) = request(
        &ctx.app,
        "POST",
        "/api/returns",
        Some(&token),
        Some(json!({
            "transaction_id": transaction["id"],
            "reason": "damaged packaging",
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        return_record["refund_amount_cents"],
        transaction["total_cents"]
    );
    assert_eq!(return_record["refund_method"], "mobile_money");

    // listed for admin/cashier
    let (status, returns) = request(&ctx.app, "GET", "/api/returns", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(returns.as_array().unwrap().len(), 1);

    // the transaction now shows as refunded
    let id = transaction["id"].as_str().unwrap();
    let (_, detail) = request(
        &ctx.app,
        "GET",
        &format!("/api/transactions/{id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(detail["transaction"]["status"], "refunded");
}

#[tokio::test]
async fn kpis_report_todays_numbers() {
    let ctx = TestContext::new().await;
    let token = ctx.token_for(&ctx.cashier);

    let mut expected_sales = 0i64;
    for _ in 0..3 {
        let (_, receipt) = request(
            &ctx.app,
            "POST",
            "/api/transactions",
            Some(&token),
            Some(json!({
                "items": [{"product_id": ctx.cola.id, "quantity": 1}],
                "payment_method": "cash",
            })),
        )
        .await;
        expected_sales += receipt["transaction"]["total_cents"].as_i64().unwrap();
    }

    let (status, kpis) = request(&ctx.app, "GET", "/api/dashboard/kpis", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(kpis["today_transactions"], 3);
    assert_eq!(kpis["today_sales_cents"].as_i64().unwrap(), expected_sales);
    assert_eq!(kpis["active_staff"], 2);
}

#[tokio::test]
async fn sales_report_covers_inclusive_date_range() {
    let ctx = TestContext::new().await;
    let token = ctx.token_for(&ctx.cashier);

    request(
        &ctx.app,
        "POST",
        "/api/transactions",
        Some(&token),
        Some(json!({
            "items": [{"product_id": ctx.bread.id, "quantity": 2}],
            "payment_method": "cash",
        })),
    )
    .await;

    let today = chrono::Utc::now().date_naive();
    let (status, rows) = request(
        &ctx.app,
        "GET",
        &format!("/api/reports/sales?start_date={today}&end_date={today}"),
        Some(&token),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["date"].as_str().unwrap(), today.to_string());
    assert_eq!(rows[0]["count"], 1);

    // reversed range is rejected
    let (status, _) = request(
        &ctx.app,
        "GET",
        "/api/reports/sales?start_date=2026-02-01&end_date=2026-01-01",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn barcode_lookup_finds_the_product() {
    let ctx = TestContext::new().await;
    let token = ctx.token_for(&ctx.cashier);

    let (status, product) = request(
        &ctx.app,
        "GET",
        "/api/products/barcode/4006381333931",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(product["name"], "Cola");

    let (status, _) = request(
        &ctx.app,
        "GET",
        "/api/products/barcode/0000000000000",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn handover_lifecycle_over_the_api() {
    let ctx = TestContext::new().await;
    let token = ctx.token_for(&ctx.cashier);

    let (status, handover) = request(
        &ctx.app,
        "POST",
        "/api/handovers",
        Some(&token),
        Some(json!({
            "shift_date": chrono::Utc::now(),
            "expected_cents": 50_000,
            "actual_cents": 49_500,
            "denominations": {"2000": 20, "500": 19},
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(handover["difference_cents"], -500);
    assert_eq!(handover["is_submitted"], false);

    // the supervisor signs off with a corrected count
    let id = handover["id"].as_str().unwrap();
    let (status, updated) = request(
        &ctx.app,
        "PUT",
        &format!("/api/handovers/{id}"),
        Some(&token),
        Some(json!({
            "actual_cents": 50_000,
            "supervisor_id": ctx.admin.id,
            "is_submitted": true,
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["difference_cents"], 0);
    assert_eq!(updated["is_submitted"], true);

    let (status, listed) = request(&ctx.app, "GET", "/api/handovers", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn user_management_is_admin_only_and_never_leaks_hashes() {
    let ctx = TestContext::new().await;
    let admin_token = ctx.token_for(&ctx.admin);
    let cashier_token = ctx.token_for(&ctx.cashier);

    let new_user = json!({
        "username": "attendant1",
        "password": "floor-staff-pw1",
        "role": "sales_attendant",
    });

    let (status, _) = request(
        &ctx.app,
        "POST",
        "/api/users",
        Some(&cashier_token),
        Some(new_user.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, created) = request(
        &ctx.app,
        "POST",
        "/api/users",
        Some(&admin_token),
        Some(new_user),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["role"], "sales_attendant");
    assert!(created.get("password_hash").is_none());

    let (status, users) = request(&ctx.app, "GET", "/api/users", Some(&admin_token), None).await;
    assert_eq!(status, StatusCode::OK);
    let users = users.as_array().unwrap();
    assert_eq!(users.len(), 3);
    assert!(users.iter().all(|u| u.get("password_hash").is_none()));

    // a duplicate username in the same shop conflicts
    let (status, _) = request(
        &ctx.app,
        "POST",
        "/api/users",
        Some(&admin_token),
        Some(json!({
            "username": "attendant1",
            "password": "another-pw-123",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn health_endpoint_is_public() {
    let ctx = TestContext::new().await;

    let (status, body) = request(&ctx.app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["storage"], "memory");
}
