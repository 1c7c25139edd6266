use actix_web::{
    body::MessageBody,
    http::StatusCode,
    test,
    test::TestRequest,
    web,
    web::ServiceConfig,
    App,
};
use chrono::{TimeZone, Utc};
use log::debug;
use pos_engine::{
    db_types::{Customer, NewTransaction, Order, PaymentMethod, PaymentStatus, Role, Transaction, Vnd},
    events::EventProducers,
    OrderFlowApi,
    PaymentReconciler,
    ReconcilerConfig,
};

use crate::{config::ServerOptions, endpoint_tests::mocks::MockPosStore};

pub const CALLBACK_KEY: &str = "endpoint-test-key2";

/// Registers the engine APIs the way the server does for each worker. Each API gets its own store so that a test
/// only sets expectations on the one its route talks to.
pub fn register_apis(cfg: &mut ServiceConfig, orders_store: MockPosStore, ledger_store: MockPosStore) {
    let orders_api = OrderFlowApi::new(orders_store, EventProducers::default());
    let reconciler = PaymentReconciler::new(
        ledger_store,
        ReconcilerConfig::new(CALLBACK_KEY, Vnd::from(1_000)),
        EventProducers::default(),
    );
    cfg.app_data(web::Data::new(orders_api))
        .app_data(web::Data::new(reconciler))
        .app_data(web::Data::new(ServerOptions::default()));
}

pub async fn get_request(path: &str, configure: fn(&mut ServiceConfig)) -> Result<(StatusCode, String), String> {
    let req = TestRequest::get().uri(path).to_request();
    send(req, configure).await
}

pub async fn post_request(
    path: &str,
    body: &str,
    headers: &[(&str, &str)],
    configure: fn(&mut ServiceConfig),
) -> Result<(StatusCode, String), String> {
    let mut req = TestRequest::post().uri(path).insert_header(("Content-Type", "application/json"));
    for (name, value) in headers {
        req = req.insert_header((*name, *value));
    }
    let req = req.set_payload(body.to_string()).to_request();
    send(req, configure).await
}

pub async fn put_request(path: &str, configure: fn(&mut ServiceConfig)) -> Result<(StatusCode, String), String> {
    let req = TestRequest::put().uri(path).to_request();
    send(req, configure).await
}

async fn send(req: actix_http::Request, configure: fn(&mut ServiceConfig)) -> Result<(StatusCode, String), String> {
    let app = App::new().configure(configure);
    let service = test::init_service(app).await;
    debug!("Making request");
    let (_, res) = test::try_call_service(&service, req).await.map_err(|e| e.to_string())?.into_parts();
    let status = res.status();
    let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
    Ok((status, body))
}

pub fn customer() -> Customer {
    Customer {
        id: 7,
        name: "Lan".into(),
        phone: "0901234567".into(),
        role: Role::Customer,
        created_at: Utc.with_ymd_and_hms(2024, 6, 12, 8, 0, 0).unwrap(),
    }
}

pub fn order(id: i64, method: PaymentMethod, status: PaymentStatus, total: i64) -> Order {
    let ts = Utc.with_ymd_and_hms(2024, 6, 12, 9, 30, 0).unwrap();
    Order {
        id,
        user_id: 7,
        total_amount: Vnd::from(total),
        payment_method: method,
        payment_status: status,
        note: None,
        created_at: ts,
        updated_at: ts,
    }
}

/// The row a ledger would store for `new`.
pub fn stored_transaction(id: i64, new: NewTransaction) -> Transaction {
    Transaction {
        id,
        order_id: new.order_id,
        app_trans_id: new.app_trans_id,
        channel: new.channel,
        provider_token: new.provider_token,
        amount: new.amount,
        description: new.description,
        status: new.status,
        settlement_id: new.settlement_id,
        payment_time: new.payment_time,
        created_at: Utc.with_ymd_and_hms(2024, 6, 12, 9, 31, 0).unwrap(),
    }
}
