use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::{TestRequest, TestResponse, TestServer};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use tradepost_core::{Order, OrderStatus};
use tradepost_node::identity::USER_ID_HEADER;
use tradepost_node::{build_state, create_router, save_state, AppState, NodeConfig};
use uuid::Uuid;

fn server() -> TestServer {
    TestServer::new(create_router(AppState::in_memory(64))).unwrap()
}

fn as_user(request: TestRequest, user_id: Uuid) -> TestRequest {
    request.add_header(
        HeaderName::from_static(USER_ID_HEADER),
        HeaderValue::from_str(&user_id.to_string()).unwrap(),
    )
}

async fn register(server: &TestServer, name: &str, role: &str) -> Uuid {
    let response = server
        .post("/api/v1/users")
        .json(&json!({
            "name": name,
            "email": format!("{}@example.com", name.to_lowercase()),
            "role": role,
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    response.json::<Value>()["id"].as_str().unwrap().parse().unwrap()
}

async fn create_item(server: &TestServer, employee: Uuid, name: &str, quantity: u32) -> Uuid {
    let response = as_user(server.post("/api/v1/items"), employee)
        .json(&json!({
            "name": name,
            "description": format!("A {}", name),
            "quantity": quantity,
            "price": "10.00",
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    response.json::<Value>()["id"].as_str().unwrap().parse().unwrap()
}

async fn place(server: &TestServer, customer: Uuid, item_id: Uuid, quantity: u32) -> TestResponse {
    as_user(server.post("/api/v1/orders"), customer)
        .json(&json!({ "item_id": item_id, "quantity": quantity }))
        .await
}

async fn act(server: &TestServer, user: Uuid, order_id: Uuid, action: &str) -> TestResponse {
    as_user(server.post(&format!("/api/v1/orders/{}/{}", order_id, action)), user).await
}

fn message(response: &TestResponse) -> String {
    response.json::<Value>()["message"].as_str().unwrap_or_default().to_string()
}

#[tokio::test]
async fn test_health_check() {
    let server = server();
    let response = server.get("/health").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<Value>()["status"], "healthy");
}

#[tokio::test]
async fn test_requests_without_known_caller_are_rejected() {
    let server = server();

    let response = server.get("/api/v1/orders/mine").await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(message(&response), "Unauthenticated");

    let response = as_user(server.get("/api/v1/me"), Uuid::new_v4()).await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);

    let response = server
        .get("/api/v1/me")
        .add_header(
            HeaderName::from_static(USER_ID_HEADER),
            HeaderValue::from_static("not-a-uuid"),
        )
        .await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_accept_then_receive_flow() {
    let server = server();
    let employee = register(&server, "Erin", "employee").await;
    let customer = register(&server, "Carl", "customer").await;
    let item = create_item(&server, employee, "Kettle", 5).await;

    let response = place(&server, customer, item, 3).await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    assert_eq!(message(&response), "Order placed and employee notified!");
    let order_id = response.json::<Value>()["order"]["id"].as_str().unwrap().parse::<Uuid>().unwrap();

    // only two left
    let response = place(&server, customer, item, 3).await;
    assert_eq!(response.status_code(), StatusCode::CONFLICT);
    assert_eq!(message(&response), "Not enough quantity available.");

    let inbox = as_user(server.get("/api/v1/notifications"), employee).await.json::<Value>();
    assert_eq!(inbox.as_array().unwrap().len(), 1);
    assert_eq!(inbox[0]["customer_name"], "Carl");
    assert_eq!(inbox[0]["item_name"], "Kettle");
    assert_eq!(inbox[0]["status"], "pending");

    let response = act(&server, employee, order_id, "accept").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(message(&response), "Order accepted.");

    for action in ["accept", "decline"] {
        let response = act(&server, employee, order_id, action).await;
        assert_eq!(response.status_code(), StatusCode::CONFLICT);
        assert_eq!(message(&response), "Order already processed.");
    }

    let inbox = as_user(server.get("/api/v1/notifications"), employee).await.json::<Value>();
    assert!(inbox.as_array().unwrap().is_empty());

    let accepted = as_user(server.get("/api/v1/orders/accepted"), employee).await.json::<Value>();
    assert_eq!(accepted[0]["id"], order_id.to_string());
    assert_eq!(accepted[0]["customer_name"], "Carl");

    let response = act(&server, customer, order_id, "received").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(message(&response), "Order marked as received.");

    let response = act(&server, customer, order_id, "received").await;
    assert_eq!(response.status_code(), StatusCode::CONFLICT);

    let ledger = as_user(server.get("/api/v1/transactions"), employee).await.json::<Value>();
    assert_eq!(ledger.as_array().unwrap().len(), 1);
    assert_eq!(ledger[0]["status"], "accepted");
    assert_eq!(ledger[0]["quantity"], 3);

    let mine = as_user(server.get("/api/v1/orders/mine"), customer).await.json::<Value>();
    assert_eq!(mine[0]["status"], "completed");
    assert_eq!(mine[0]["employee_name"], "Erin");
    let price: Decimal = serde_json::from_value(mine[0]["item"]["price"].clone()).unwrap();
    assert_eq!(price, Decimal::new(1000, 2));
}

#[tokio::test]
async fn test_decline_records_one_transaction() {
    let server = server();
    let employee = register(&server, "Erin", "employee").await;
    let customer = register(&server, "Carl", "customer").await;
    let item = create_item(&server, employee, "Kettle", 1).await;

    let placed = place(&server, customer, item, 1).await.json::<Value>();
    let order: Order = serde_json::from_value(placed["order"].clone()).unwrap();
    assert_eq!(order.status, OrderStatus::Pending);

    let response = act(&server, employee, order.id, "decline").await;
    assert_eq!(message(&response), "Order declined.");

    let response = act(&server, customer, order.id, "received").await;
    assert_eq!(response.status_code(), StatusCode::CONFLICT);
    assert_eq!(message(&response), "Only accepted orders can be marked as received.");

    let ledger = as_user(server.get("/api/v1/transactions"), employee)
        .add_query_param("order_id", order.id)
        .await
        .json::<Value>();
    assert_eq!(ledger.as_array().unwrap().len(), 1);
    assert_eq!(ledger[0]["status"], "declined");
}

#[tokio::test]
async fn test_placement_failures() {
    let server = server();
    let employee = register(&server, "Erin", "employee").await;
    let customer = register(&server, "Carl", "customer").await;
    let item = create_item(&server, employee, "Kettle", 4).await;

    let response = place(&server, customer, Uuid::new_v4(), 1).await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

    let response = place(&server, customer, item, 0).await;
    assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);

    let response = place(&server, employee, item, 1).await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);

    let response = as_user(server.post("/api/v1/orders"), customer)
        .content_type("application/json")
        .bytes("{\"item_id\":".into())
        .await;
    assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(message(&response).starts_with("Invalid body"));

    // released items cannot be ordered
    let response = as_user(server.post(&format!("/api/v1/items/{}/reassign", item)), employee)
        .json(&json!({ "employee_id": null }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let response = place(&server, customer, item, 1).await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(message(&response), "Item does not have an associated employee.");

    let mine = as_user(server.get("/api/v1/orders/mine"), customer).await.json::<Value>();
    assert!(mine.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_only_assigned_employee_decides() {
    let server = server();
    let owner = register(&server, "Erin", "employee").await;
    let other = register(&server, "Finn", "employee").await;
    let customer = register(&server, "Carl", "customer").await;
    let item = create_item(&server, owner, "Kettle", 2).await;

    let order_id = place(&server, customer, item, 1).await.json::<Value>()["order"]["id"]
        .as_str()
        .unwrap()
        .parse::<Uuid>()
        .unwrap();

    let response = act(&server, other, order_id, "accept").await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);

    let response = act(&server, customer, order_id, "accept").await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);

    let response = as_user(server.get(&format!("/api/v1/orders/{}", order_id)), other).await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);

    let response = as_user(server.get(&format!("/api/v1/orders/{}", order_id)), owner).await;
    assert_eq!(response.status_code(), StatusCode::OK);

    // the rejected attempts left the order pending
    let inbox = as_user(server.get("/api/v1/notifications"), owner).await.json::<Value>();
    assert_eq!(inbox.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_concurrent_orders_never_oversell() {
    let server = server();
    let employee = register(&server, "Erin", "employee").await;
    let customer = register(&server, "Carl", "customer").await;
    let item = create_item(&server, employee, "Kettle", 3).await;

    let attempts = (0..8).map(|_| place(&server, customer, item, 1));
    let responses = futures::future::join_all(attempts).await;

    let created = responses
        .iter()
        .filter(|r| r.status_code() == StatusCode::CREATED)
        .count();
    let conflicts = responses
        .iter()
        .filter(|r| r.status_code() == StatusCode::CONFLICT)
        .count();
    assert_eq!((created, conflicts), (3, 5));

    let for_sale = as_user(server.get("/api/v1/items/for-sale"), customer).await.json::<Value>();
    assert!(for_sale.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_catalog_ownership() {
    let server = server();
    let owner = register(&server, "Erin", "employee").await;
    let other = register(&server, "Finn", "employee").await;
    let customer = register(&server, "Carl", "customer").await;
    let item = create_item(&server, owner, "Kettle", 2).await;

    let response = as_user(server.post("/api/v1/items"), customer)
        .json(&json!({ "name": "Mug", "description": "A mug", "quantity": 1, "price": "3.50" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);

    let response = as_user(server.post("/api/v1/items"), owner)
        .json(&json!({ "name": "Mug", "description": "A mug", "quantity": 1, "price": "-1" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);

    let update = json!({ "name": "Big Kettle", "description": "Bigger", "quantity": 9, "price": "12.00" });
    let response = as_user(server.put(&format!("/api/v1/items/{}", item)), other)
        .json(&update)
        .await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);

    let response = as_user(server.put(&format!("/api/v1/items/{}", item)), owner)
        .json(&update)
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<Value>()["quantity"], 9);

    let mine = as_user(server.get("/api/v1/items"), owner).await.json::<Value>();
    assert_eq!(mine[0]["name"], "Big Kettle");
    let theirs = as_user(server.get("/api/v1/items"), other).await.json::<Value>();
    assert!(theirs.as_array().unwrap().is_empty());

    let response = as_user(server.delete(&format!("/api/v1/items/{}", item)), other).await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);

    let response = as_user(server.delete(&format!("/api/v1/items/{}", Uuid::new_v4())), owner).await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_deleted_item_renders_unknown() {
    let server = server();
    let employee = register(&server, "Erin", "employee").await;
    let customer = register(&server, "Carl", "customer").await;
    let item = create_item(&server, employee, "Kettle", 2).await;
    place(&server, customer, item, 1).await;

    let response = as_user(server.delete(&format!("/api/v1/items/{}", item)), employee).await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(message(&response), "Item deleted successfully");

    let mine = as_user(server.get("/api/v1/orders/mine"), customer).await.json::<Value>();
    assert_eq!(mine[0]["item"]["name"], "Unknown");
    assert!(mine[0]["item"]["price"].is_null());

    let inbox = as_user(server.get("/api/v1/notifications"), employee).await.json::<Value>();
    assert_eq!(inbox[0]["message"], "New order placed by Carl for item Unknown");
}

#[tokio::test]
async fn test_reassignment_keeps_existing_orders() {
    let server = server();
    let first = register(&server, "Erin", "employee").await;
    let second = register(&server, "Finn", "employee").await;
    let customer = register(&server, "Carl", "customer").await;
    let item = create_item(&server, first, "Kettle", 2).await;

    let old_order = place(&server, customer, item, 1).await.json::<Value>()["order"]["id"].clone();

    let response = as_user(server.post(&format!("/api/v1/items/{}/reassign", item)), first)
        .json(&json!({ "employee_id": second }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<Value>()["employee_id"], second.to_string());

    let new_order = place(&server, customer, item, 1).await.json::<Value>()["order"].clone();
    assert_eq!(new_order["employee_id"], second.to_string());

    let first_inbox = as_user(server.get("/api/v1/notifications"), first).await.json::<Value>();
    assert_eq!(first_inbox[0]["order_id"], old_order);
    let second_inbox = as_user(server.get("/api/v1/notifications"), second).await.json::<Value>();
    assert_eq!(second_inbox[0]["order_id"], new_order["id"]);
}

#[tokio::test]
async fn test_register_validation_and_duplicates() {
    let server = server();
    register(&server, "Erin", "employee").await;

    let response = server
        .post("/api/v1/users")
        .json(&json!({ "name": "Erin Two", "email": "erin@example.com", "role": "customer" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CONFLICT);
    assert_eq!(message(&response), "The email has already been taken.");

    let response = server
        .post("/api/v1/users")
        .json(&json!({ "name": "", "email": "x@example.com", "role": "customer" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);

    let response = server
        .post("/api/v1/users")
        .json(&json!({ "name": "X", "email": "x@example.com", "role": "admin" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_snapshot_survives_restart() {
    let path = std::env::temp_dir().join(format!("tradepost-node-{}.json", Uuid::new_v4()));
    let config = NodeConfig {
        data_file: Some(path.clone()),
        ..NodeConfig::default()
    };

    let state = build_state(&config).await.unwrap();
    let server = TestServer::new(create_router(state.clone())).unwrap();
    let employee = register(&server, "Erin", "employee").await;
    let customer = register(&server, "Carl", "customer").await;
    let item = create_item(&server, employee, "Kettle", 2).await;
    place(&server, customer, item, 1).await;
    save_state(&state, &path).await.unwrap();

    let restored = build_state(&config).await.unwrap();
    let _ = std::fs::remove_file(&path);
    let server = TestServer::new(create_router(restored)).unwrap();

    let inbox = as_user(server.get("/api/v1/notifications"), employee).await.json::<Value>();
    assert_eq!(inbox.as_array().unwrap().len(), 1);
    let mine = as_user(server.get("/api/v1/orders/mine"), customer).await.json::<Value>();
    assert_eq!(mine[0]["item"]["name"], "Kettle");
}
