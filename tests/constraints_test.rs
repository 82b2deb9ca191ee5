mod common;

use assert_matches::assert_matches;
use common::TestApp;
use serde_json::json;
use storefront_admin::{
    db::rows,
    errors::{ConstraintKind, ServiceError},
};

fn values(value: serde_json::Value) -> storefront_admin::db::RowValues {
    value.as_object().cloned().expect("object literal")
}

#[tokio::test]
async fn review_rating_outside_range_is_rejected() {
    let app = TestApp::new().await;

    for rating in [0, 6] {
        let (status, body) = app
            .post(
                "/api/v1/tables/reviews/rows",
                json!({"values": {
                    "product_id": 1,
                    "customer_id": 2,
                    "rating": rating,
                    "comment": "out of range"
                }}),
            )
            .await;
        assert_eq!(status, 422, "rating {rating}: {body}");
        assert_eq!(body["details"]["constraint"], "check");
    }
    assert_eq!(app.count("reviews").await, 3);
}

#[tokio::test]
async fn review_rating_inside_range_is_accepted() {
    let app = TestApp::new().await;

    let (status, body) = app
        .post(
            "/api/v1/tables/reviews/rows",
            json!({"values": {"product_id": 4, "customer_id": 3, "rating": 1}}),
        )
        .await;
    assert_eq!(status, 201, "{body}");
    assert_eq!(body["data"]["id"], 4);
    assert_eq!(body["data"]["rating"], 1);
}

#[tokio::test]
async fn fractional_rating_is_rejected_before_insert() {
    let app = TestApp::new().await;

    let (status, body) = app
        .post(
            "/api/v1/tables/reviews/rows",
            json!({"values": {"product_id": 1, "customer_id": 3, "rating": 4.7}}),
        )
        .await;
    assert_eq!(status, 400, "{body}");
    assert!(body["message"].as_str().unwrap().contains("rating"));

    let err = rows::update(
        &*app.state.db,
        "reviews",
        &values(json!({"rating": "4.5"})),
        &values(json!({"id": 1})),
    )
    .await
    .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));
    assert_eq!(app.count("reviews").await, 3);
}

#[tokio::test]
async fn duplicate_customer_email_is_rejected() {
    let app = TestApp::new().await;

    let err = rows::insert(
        &*app.state.db,
        "customers",
        &values(json!({"name": "Copy", "email": "ivan.petrov@example.com"})),
    )
    .await
    .unwrap_err();
    assert_matches!(
        err,
        ServiceError::ConstraintViolation {
            kind: ConstraintKind::Unique,
            ..
        }
    );

    let (status, body) = app
        .post(
            "/api/v1/tables/customers/rows",
            json!({"values": {"name": "Copy", "email": "maria.sidorova@example.com"}}),
        )
        .await;
    assert_eq!(status, 409, "{body}");
    assert_eq!(app.count("customers").await, 3);
}

#[tokio::test]
async fn dangling_references_are_rejected() {
    let app = TestApp::new().await;

    let cases = [
        (
            "order_items",
            json!({"order_id": 99, "product_id": 1, "quantity": 1, "unit_price": 10}),
        ),
        (
            "order_items",
            json!({"order_id": 1, "product_id": 99, "quantity": 1, "unit_price": 10}),
        ),
        (
            "reviews",
            json!({"product_id": 99, "customer_id": 1, "rating": 4}),
        ),
        (
            "reviews",
            json!({"product_id": 1, "customer_id": 99, "rating": 4}),
        ),
        ("orders", json!({"customer_id": 42, "total_amount": 5})),
    ];

    for (table, row) in cases {
        let err = rows::insert(&*app.state.db, table, &values(row.clone()))
            .await
            .unwrap_err();
        assert_matches!(
            err,
            ServiceError::ConstraintViolation {
                kind: ConstraintKind::ForeignKey,
                ..
            },
            "{table} {row}"
        );
    }
    assert_eq!(app.count("order_items").await, 4);
    assert_eq!(app.count("reviews").await, 3);
    assert_eq!(app.count("orders").await, 3);
}

#[tokio::test]
async fn generated_columns_cannot_be_written() {
    let app = TestApp::new().await;

    let (status, body) = app
        .post(
            "/api/v1/tables/order_items/rows",
            json!({"values": {
                "order_id": 2, "product_id": 1, "quantity": 1,
                "unit_price": 10, "line_total": 999
            }}),
        )
        .await;
    assert_eq!(status, 400, "{body}");
    assert!(body["message"].as_str().unwrap().contains("generated"));
}

#[tokio::test]
async fn missing_required_column_is_rejected() {
    let app = TestApp::new().await;

    let err = rows::insert(
        &*app.state.db,
        "products",
        &values(json!({"description": "no name or price"})),
    )
    .await
    .unwrap_err();
    assert_matches!(
        err,
        ServiceError::ConstraintViolation {
            kind: ConstraintKind::NotNull,
            ..
        }
    );
}
