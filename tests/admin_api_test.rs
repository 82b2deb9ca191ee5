mod common;

use axum::http::{Method, StatusCode};
use common::TestApp;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use storefront_admin::middleware_helpers::REQUEST_ID_HEADER;

fn names(list: &Value, key: &str) -> Vec<String> {
    list.as_array()
        .unwrap()
        .iter()
        .filter_map(|item| item[key].as_str().map(str::to_string))
        .collect()
}

fn decimal(value: &Value) -> Decimal {
    value.as_str().unwrap().parse().unwrap()
}

#[tokio::test]
async fn service_endpoints_respond() {
    let app = TestApp::new().await;

    let (status, body) = app.get("/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "storefront-admin up");

    let (status, body) = app.get("/test").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "App is running");
    assert_eq!(body["status"], "OK");
    assert!(body["timestamp"].is_string());

    let (status, body) = app.get("/health/live").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["alive"], true);

    let (status, body) = app.get("/health/details").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "up");
    assert_eq!(body["details"]["database"]["status"], "up");
    assert_eq!(body["details"]["storage"]["status"], "up");

    let (status, body) = app.get("/api/v1/status").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["database"]["connected"], true);
    assert_eq!(body["data"]["database"]["tables"], 6);
    assert_eq!(body["data"]["database"]["total_records"], 19);

    let (status, body) = app.get("/api-docs/openapi.json").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/api/v1/query"].is_object());
}

#[tokio::test]
async fn static_files_are_served() {
    let app = TestApp::new().await;
    std::fs::write(app.state.storage.static_dir().join("hello.txt"), "hi there").unwrap();

    let (status, body) = app.get("/static/hello.txt").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "hi there");

    let (status, _) = app.get("/static/missing.css").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn responses_carry_request_ids() {
    let app = TestApp::new().await;

    let response = app.request(Method::GET, "/api/v1/tables", None).await;
    assert!(response.headers().contains_key(REQUEST_ID_HEADER));

    let response = app
        .request(Method::GET, "/api/v1/tables/carts", None)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let header = response.headers()[REQUEST_ID_HEADER]
        .to_str()
        .unwrap()
        .to_string();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["request_id"], header);
    assert_eq!(body["error"], "Not Found");
}

#[tokio::test]
async fn lists_tables_with_row_counts() {
    let app = TestApp::new().await;

    let (status, body) = app.get("/api/v1/tables").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let tables = &body["data"]["tables"];
    assert_eq!(
        names(tables, "name"),
        vec!["customers", "order_items", "orders", "products", "reviews", "suppliers"]
    );
    let counts: Vec<u64> = tables
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["row_count"].as_u64().unwrap())
        .collect();
    assert_eq!(counts, vec![3, 4, 3, 4, 3, 2]);
    assert_eq!(body["data"]["total_records"], 19);
}

#[tokio::test]
async fn describes_columns_and_references() {
    let app = TestApp::new().await;

    let (status, body) = app.get("/api/v1/tables/orders").await;
    assert_eq!(status, StatusCode::OK);
    let orders = &body["data"];
    assert_eq!(orders["row_count"], 3);
    assert_eq!(orders["primary_key"], json!(["id"]));
    assert_eq!(
        names(&orders["columns"], "name"),
        vec![
            "id",
            "customer_id",
            "order_date",
            "total_amount",
            "is_paid",
            "is_delivered",
            "delivery_address"
        ]
    );
    assert_eq!(
        orders["foreign_keys"],
        json!([{
            "table": "orders",
            "column": "customer_id",
            "foreign_table": "customers",
            "foreign_column": "id"
        }])
    );
    assert_eq!(names(&orders["referenced_by"], "table"), vec!["order_items"]);

    let (_, body) = app.get("/api/v1/tables/customers").await;
    let mut referencing = names(&body["data"]["referenced_by"], "table");
    referencing.sort();
    assert_eq!(referencing, vec!["orders", "reviews"]);
    assert_eq!(body["data"]["foreign_keys"], json!([]));

    let (_, body) = app.get("/api/v1/tables/order_items").await;
    let line_total = body["data"]["columns"]
        .as_array()
        .unwrap()
        .iter()
        .find(|c| c["name"] == "line_total")
        .cloned()
        .unwrap();
    assert_eq!(line_total["generated"], true);
}

#[tokio::test]
async fn unknown_identifiers_are_rejected() {
    let app = TestApp::new().await;

    let (status, _) = app.get("/api/v1/tables/carts").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.get("/api/v1/tables/seaql_migrations%3B%20DROP/rows").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .post(
            "/api/v1/tables/products/rows",
            json!({"values": {"name": "X", "price": 1, "color": "red"}}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("color"));

    let (status, _) = app
        .patch(
            "/api/v1/tables/products/rows",
            json!({"values": {"price": 1}, "filter": {"id\" OR 1=1 --": 1}}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(app.count("products").await, 4);
}

#[tokio::test]
async fn pages_are_clamped() {
    let app = TestApp::new().await;

    let (status, body) = app.get("/api/v1/tables/products/rows").await;
    assert_eq!(status, StatusCode::OK);
    let page = &body["data"];
    assert_eq!(page["pagination"]["page"], 1);
    assert_eq!(page["pagination"]["per_page"], 200);
    assert_eq!(page["pagination"]["total"], 4);
    assert_eq!(page["pagination"]["total_pages"], 1);
    let ids: Vec<i64> = page["rows"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![1, 2, 3, 4]);

    let (_, body) = app
        .get("/api/v1/tables/products/rows?page=9&per_page=3")
        .await;
    assert_eq!(body["data"]["pagination"]["page"], 2);
    assert_eq!(body["data"]["pagination"]["total_pages"], 2);
    assert_eq!(body["data"]["rows"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"]["rows"][0]["name"], "27-inch Monitor");

    let (_, body) = app
        .get("/api/v1/tables/products/rows?page=0&per_page=100000")
        .await;
    assert_eq!(body["data"]["pagination"]["page"], 1);
    assert_eq!(body["data"]["pagination"]["per_page"], 1000);
}

#[tokio::test]
async fn inserts_return_the_stored_row() {
    let app = TestApp::new().await;

    let (status, body) = app
        .post(
            "/api/v1/tables/suppliers/rows",
            json!({"values": {"company_name": "Acme Parts", "email": "sales@acme.test"}}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["id"], 3);
    assert_eq!(body["data"]["company_name"], "Acme Parts");
    assert!(body["data"]["contact_person"].is_null());

    let (status, _) = app
        .post("/api/v1/tables/suppliers/rows", json!({"values": {}}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn decimal_columns_keep_their_digits() {
    let app = TestApp::new().await;

    let (status, body) = app.get("/api/v1/tables/products/rows").await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let laptop = &body["data"]["rows"][0];
    assert_eq!(laptop["price"], "74999.99");
    assert_eq!(decimal(&laptop["weight"]), dec!(2.100));
    assert_eq!(laptop["is_available"], true);

    let (_, body) = app.get("/api/v1/tables/order_items/rows").await;
    assert_eq!(body["data"]["rows"][0]["line_total"], "74999.99");
    assert_eq!(decimal(&body["data"]["rows"][2]["line_total"]), dec!(11980.00));

    let (status, body) = app
        .post(
            "/api/v1/tables/products/rows",
            json!({"values": {"name": "Cable", "price": "0.10", "weight": 0.25}}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(decimal(&body["data"]["price"]), dec!(0.10));
    assert_eq!(decimal(&body["data"]["weight"]), dec!(0.25));
    assert_eq!(body["data"]["stock_quantity"], 0);
}

#[tokio::test]
async fn updates_skip_empty_values() {
    let app = TestApp::new().await;

    let (status, body) = app
        .patch(
            "/api/v1/tables/products/rows",
            json!({
                "values": {"stock_quantity": 25, "description": "", "weight": null},
                "filter": {"id": 4}
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["updated"], 1);

    let (_, body) = app
        .post(
            "/api/v1/query",
            json!({"sql": "SELECT stock_quantity, description FROM products WHERE id = ?", "params": [4]}),
        )
        .await;
    let row = &body["data"]["rows"][0];
    assert_eq!(row["stock_quantity"], 25);
    assert_eq!(row["description"], "IPS panel, 2560x1440");
}

#[tokio::test]
async fn updates_require_values_and_filter() {
    let app = TestApp::new().await;

    let (status, _) = app
        .patch(
            "/api/v1/tables/products/rows",
            json!({"values": {"description": ""}, "filter": {"id": 1}}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .patch(
            "/api/v1/tables/products/rows",
            json!({"values": {"stock_quantity": 0}, "filter": {}}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .patch(
            "/api/v1/tables/products/rows",
            json!({"values": {"stock_quantity": 0}, "filter": {"id": 99}}),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn safe_delete_refuses_referenced_rows() {
    let app = TestApp::new().await;

    let (status, body) = app
        .post(
            "/api/v1/tables/customers/rows/delete",
            json!({"filter": {"id": 1}}),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT, "{body}");
    assert_eq!(
        body["details"]["dependencies"],
        json!([
            {"table": "orders", "column": "customer_id", "count": 2},
            {"table": "reviews", "column": "customer_id", "count": 2}
        ])
    );
    assert_eq!(app.count("customers").await, 3);
    assert_eq!(app.count("orders").await, 3);
}

#[tokio::test]
async fn safe_delete_removes_unreferenced_rows() {
    let app = TestApp::new().await;

    let (status, body) = app
        .post(
            "/api/v1/tables/customers/rows/delete",
            json!({"filter": {"id": 3}}),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["deleted"], 1);
    assert_eq!(body["data"]["cascaded"], json!([]));
    assert_eq!(app.count("customers").await, 2);

    let (status, _) = app
        .post(
            "/api/v1/tables/customers/rows/delete",
            json!({"filter": {"id": 3}}),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn cascade_delete_removes_dependents() {
    let app = TestApp::new().await;

    let (status, body) = app
        .post(
            "/api/v1/tables/customers/rows/delete",
            json!({"filter": {"id": 1}, "cascade": true}),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["deleted"], 1);
    assert_eq!(
        body["data"]["cascaded"],
        json!([
            {"table": "order_items", "column": "order_id", "count": 3},
            {"table": "orders", "column": "customer_id", "count": 2},
            {"table": "reviews", "column": "customer_id", "count": 2}
        ])
    );

    assert_eq!(app.count("customers").await, 2);
    assert_eq!(app.count("orders").await, 1);
    assert_eq!(app.count("order_items").await, 1);
    assert_eq!(app.count("reviews").await, 1);
    // unrelated tables untouched
    assert_eq!(app.count("products").await, 4);
}

#[tokio::test]
async fn query_console_returns_rows_or_affected_count() {
    let app = TestApp::new().await;

    let (status, body) = app
        .post(
            "/api/v1/query",
            json!({"sql": "SELECT name FROM customers WHERE is_active = ? ORDER BY id", "params": [true]}),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["kind"], "rows");
    assert_eq!(body["data"]["count"], 2);
    assert_eq!(body["data"]["rows"][1]["name"], "Maria Sidorova");

    let (status, body) = app
        .post(
            "/api/v1/query",
            json!({"sql": "UPDATE products SET stock_quantity = stock_quantity + 1 WHERE is_available = ?", "params": [true]}),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["kind"], "executed");
    assert_eq!(body["data"]["rows_affected"], 3);

    let (status, body) = app
        .post("/api/v1/query", json!({"sql": "SELEC broken"}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("syntax"));

    let (status, _) = app.post("/api/v1/query", json!({"sql": "   "})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn query_console_returns_aggregates() {
    let app = TestApp::new().await;

    let (status, body) = app
        .post("/api/v1/query", json!({"sql": "SELECT COUNT(*) FROM customers"}))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["rows"], json!([{"COUNT(*)": 3}]));

    let (_, body) = app
        .post(
            "/api/v1/query",
            json!({"sql": "SELECT COUNT(*) AS n, 1.5 AS f, 'x' AS s, NULL AS z"}),
        )
        .await;
    assert_eq!(body["data"]["rows"], json!([{"n": 1, "f": 1.5, "s": "x", "z": null}]));

    let (_, body) = app
        .post(
            "/api/v1/query",
            json!({"sql": "SELECT SUM(quantity) AS units, MAX(id) AS last FROM order_items WHERE order_id = ?", "params": [1]}),
        )
        .await;
    assert_eq!(body["data"]["rows"], json!([{"units": 2, "last": 2}]));
}

#[tokio::test]
async fn query_console_skips_leading_comments() {
    let app = TestApp::new().await;

    let (status, body) = app
        .post(
            "/api/v1/query",
            json!({"sql": "-- list\nSELECT id FROM customers ORDER BY id"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["kind"], "rows");
    assert_eq!(body["data"]["rows"], json!([{"id": 1}, {"id": 2}, {"id": 3}]));

    let (_, body) = app
        .post(
            "/api/v1/query",
            json!({"sql": "/* totals */ SELECT COUNT(*) AS n FROM orders"}),
        )
        .await;
    assert_eq!(body["data"]["rows"][0]["n"], 3);
}

#[tokio::test]
async fn drop_table_removes_it_from_catalog() {
    let app = TestApp::new().await;

    let (status, body) = app.json(Method::DELETE, "/api/v1/tables/suppliers", None).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["dropped"], "suppliers");

    let (status, _) = app.get("/api/v1/tables/suppliers").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.json(Method::DELETE, "/api/v1/tables/suppliers", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
