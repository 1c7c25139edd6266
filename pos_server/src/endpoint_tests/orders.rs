use actix_web::{http::StatusCode, web::ServiceConfig};
use pos_engine::{
    db_types::{NewOrder, PaymentMethod, PaymentStatus, StockSnapshot, Vnd},
    traits::{OrderCancelled, OrderCreated},
    OrderFlowError,
};
use serde_json::Value;

use super::{
    helpers::{customer, get_request, order, post_request, put_request, register_apis},
    mocks::MockPosStore,
};
use crate::routes::{health, CancelOrderRoute, CreateOrderRoute, OrderByIdRoute, OrderStatusRoute, OrdersRoute};

const CASH_ORDER: &str = r#"{
    "phone": "0901234567",
    "name": "Lan",
    "payment_method": "cash",
    "products": [{"product_id": 1, "product_name": "Cà phê sữa", "quantity": 2, "price_at_order": 29000}]
}"#;

#[actix_web::test]
async fn health_check() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request("/health", |cfg| {
        cfg.service(health);
    })
    .await
    .expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "👍️\n");
}

#[actix_web::test]
async fn create_cash_order() {
    let _ = env_logger::try_init().ok();
    let (status, body) = post_request("/orders", CASH_ORDER, &[], configure_create).await.expect("Request failed");
    assert_eq!(status, StatusCode::CREATED);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["orderId"], 101);
    assert_eq!(body["totalAmount"], 58_000);
    assert_eq!(body["payment"]["status"], "paid");
    assert_eq!(body["customer"]["phone"], "0901234567");
    assert_eq!(body["updatedProducts"][0]["stock_quantity"], 8);
}

#[actix_web::test]
async fn create_order_with_wrong_total() {
    let _ = env_logger::try_init().ok();
    let body = CASH_ORDER.replace("\"payment_method\"", "\"total_amount\": 50000, \"payment_method\"");
    let (status, body) =
        post_request("/orders", &body, &[], configure_untouched_create).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("does not match the line items"), "{body}");
}

#[actix_web::test]
async fn create_order_with_unreadable_body() {
    let _ = env_logger::try_init().ok();
    let body = r#"{"phone": "0901234567", "payment_method": "cheque"}"#;
    let (status, _) = post_request("/orders", body, &[], configure_untouched_create).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn create_order_out_of_stock() {
    let _ = env_logger::try_init().ok();
    let (status, body) =
        post_request("/orders", CASH_ORDER, &[], configure_out_of_stock).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["error"], "Not enough stock for Cà phê sữa. Requested 2, but only 1 left.");
}

#[actix_web::test]
async fn fetch_missing_order() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request("/orders/999", configure_missing_order).await.expect("Request failed");
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("Order #999 does not exist"), "{body}");
}

#[actix_web::test]
async fn order_list_rejects_unknown_status() {
    let _ = env_logger::try_init().ok();
    let (status, _) =
        get_request("/orders?payment_status=pending,refunded", configure_untouched_list).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn cancel_pending_order() {
    let _ = env_logger::try_init().ok();
    let (status, body) = put_request("/orders/55/cancel", configure_cancel).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"success":true,"message":"Order #55 was cancelled. Stock restored for 1 products."}"#);
}

#[actix_web::test]
async fn cancel_paid_order_is_a_conflict() {
    let _ = env_logger::try_init().ok();
    let (status, body) = put_request("/orders/56/cancel", configure_cancel).await.expect("Request failed");
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body.contains("Order #56 is paid"), "{body}");
}

#[actix_web::test]
async fn order_status_without_waiting() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request("/orders/55/status", configure_status).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["payment_status"], "pending");
    assert_eq!(body["is_terminal"], false);
}

fn configure_create(cfg: &mut ServiceConfig) {
    let mut store = MockPosStore::new();
    store
        .expect_insert_order()
        .withf(|new_order: &NewOrder, total: &Vnd| {
            new_order.name.as_deref() == Some("Lan") && *total == Vnd::from(58_000)
        })
        .times(1)
        .returning(|_, _| {
            Ok(OrderCreated {
                order: order(101, PaymentMethod::Cash, PaymentStatus::Paid, 58_000),
                customer: customer(),
                lines: vec![],
                updated_products: vec![StockSnapshot {
                    id: 1,
                    name: "Cà phê sữa".into(),
                    stock_quantity: 8,
                    manage_stock: true,
                }],
            })
        });
    register_apis(cfg, store, MockPosStore::new());
    cfg.service(CreateOrderRoute::<MockPosStore>::new());
}

fn configure_untouched_create(cfg: &mut ServiceConfig) {
    let mut store = MockPosStore::new();
    store.expect_insert_order().never();
    register_apis(cfg, store, MockPosStore::new());
    cfg.service(CreateOrderRoute::<MockPosStore>::new());
}

fn configure_out_of_stock(cfg: &mut ServiceConfig) {
    let mut store = MockPosStore::new();
    store.expect_insert_order().returning(|_, _| {
        Err(OrderFlowError::InsufficientStock {
            product_id: 1,
            product: "Cà phê sữa".into(),
            requested: 2,
            available: 1,
        })
    });
    register_apis(cfg, store, MockPosStore::new());
    cfg.service(CreateOrderRoute::<MockPosStore>::new());
}

fn configure_missing_order(cfg: &mut ServiceConfig) {
    let mut store = MockPosStore::new();
    store.expect_fetch_order_details().returning(|_| Ok(None));
    register_apis(cfg, store, MockPosStore::new());
    cfg.service(OrderByIdRoute::<MockPosStore>::new());
}

fn configure_untouched_list(cfg: &mut ServiceConfig) {
    let mut store = MockPosStore::new();
    store.expect_search_orders().never();
    register_apis(cfg, store, MockPosStore::new());
    cfg.service(OrdersRoute::<MockPosStore>::new());
}

fn configure_cancel(cfg: &mut ServiceConfig) {
    let mut store = MockPosStore::new();
    store.expect_cancel_order().returning(|id| match id {
        55 => Ok(OrderCancelled {
            order: order(55, PaymentMethod::Wallet, PaymentStatus::Cancelled, 45_000),
            restored: vec![StockSnapshot { id: 2, name: "Bánh mì".into(), stock_quantity: 3, manage_stock: true }],
        }),
        _ => Err(OrderFlowError::InvalidState { order_id: id, status: PaymentStatus::Paid, action: "cancelled" }),
    });
    register_apis(cfg, store, MockPosStore::new());
    cfg.service(CancelOrderRoute::<MockPosStore>::new());
}

fn configure_status(cfg: &mut ServiceConfig) {
    let mut store = MockPosStore::new();
    store
        .expect_fetch_order()
        .returning(|id| Ok(Some(order(id, PaymentMethod::BankTransfer, PaymentStatus::Pending, 45_000))));
    register_apis(cfg, store, MockPosStore::new());
    cfg.service(OrderStatusRoute::<MockPosStore>::new());
}
