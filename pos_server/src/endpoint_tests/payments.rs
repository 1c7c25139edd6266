use actix_web::{http::StatusCode, web, web::ServiceConfig};
use pos_common::{calculate_hmac, Secret};
use pos_engine::{
    db_types::{NewTransaction, PaymentMethod, PaymentStatus, TransactionStatus, Vnd},
    traits::{
        BankSettlementResult,
        BankTransfer,
        WalletPaymentRequest,
        WalletPaymentSession,
        WalletProviderError,
        WalletSettlementResult,
    },
    OrderFlowError,
};
use serde_json::{json, Value};

use super::{
    helpers::{order, post_request, register_apis, stored_transaction, CALLBACK_KEY},
    mocks::{MockPosStore, MockWallet},
};
use crate::{
    middleware::{HmacMiddlewareFactory, BANK_SIGNATURE_HEADER},
    routes::{
        BankWebhookRoute,
        LegacyWalletPaymentRoute,
        RecordTransactionRoute,
        WalletCallbackRoute,
        WalletPaymentRoute,
    },
};

const WEBHOOK_SECRET: &str = "payhook-endpoint-secret";

fn callback_body(key: &str) -> String {
    let data = json!({
        "app_id": 2554,
        "app_trans_id": "240612_42_1",
        "app_time": 1718150400000i64,
        "amount": 45000,
        "zp_trans_id": 240612000000123i64,
        "server_time": 1718150460000i64,
        "channel": 38
    })
    .to_string();
    let mac = calculate_hmac(key, data.as_bytes());
    json!({ "data": data, "mac": mac, "type": 1 }).to_string()
}

fn bank_body(event: &str, amount: i64) -> String {
    json!({
        "event": event,
        "transaction": { "transactionId": "FT24164000001", "amountVND": amount, "bank": "VCB", "description": "DH 42" },
        "timestamp": "2024-06-12T09:35:00Z"
    })
    .to_string()
}

//----------------------------------------------   Wallet callback  ----------------------------------------------------

#[actix_web::test]
async fn wallet_callback_with_valid_mac() {
    let _ = env_logger::try_init().ok();
    let (status, body) =
        post_request("/zalopay/callback", &callback_body(CALLBACK_KEY), &[], configure_callback).await.unwrap();
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"return_code":1,"return_message":"OK"}"#);
}

#[actix_web::test]
async fn wallet_callback_with_forged_mac() {
    let _ = env_logger::try_init().ok();
    let (status, body) =
        post_request("/zalopay/callback", &callback_body("not-the-key"), &[], configure_untouched_callback)
            .await
            .unwrap();
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"return_code":-1,"return_message":"Invalid MAC"}"#);
}

#[actix_web::test]
async fn wallet_callback_with_garbage_body() {
    let _ = env_logger::try_init().ok();
    let (status, body) =
        post_request("/zalopay/callback", "data=abc&mac=def", &[], configure_untouched_callback).await.unwrap();
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["return_code"], -1);
}

#[actix_web::test]
async fn wallet_callback_storage_failure_asks_for_retry() {
    let _ = env_logger::try_init().ok();
    let (status, body) =
        post_request("/zalopay/callback", &callback_body(CALLBACK_KEY), &[], configure_failing_callback).await.unwrap();
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, r#"{"return_code":-1,"return_message":"Server Error"}"#);
}

fn configure_callback(cfg: &mut ServiceConfig) {
    let mut ledger = MockPosStore::new();
    ledger
        .expect_settle_wallet_payment()
        .withf(|s| s.app_trans_id == "240612_42_1" && s.order_hint == Some(42) && s.settlement_id == "240612000000123")
        .times(1)
        .returning(|s| {
            let mut tx = NewTransaction::pending(42, s.app_trans_id, PaymentMethod::Wallet, s.amount);
            tx.status = TransactionStatus::Success;
            let transaction = stored_transaction(3, tx);
            let order = order(42, PaymentMethod::Wallet, PaymentStatus::Paid, 45_000);
            Ok(WalletSettlementResult::Paid { order, transaction })
        });
    register_apis(cfg, MockPosStore::new(), ledger);
    cfg.service(WalletCallbackRoute::<MockPosStore>::new());
}

fn configure_untouched_callback(cfg: &mut ServiceConfig) {
    let mut ledger = MockPosStore::new();
    ledger.expect_settle_wallet_payment().never();
    register_apis(cfg, MockPosStore::new(), ledger);
    cfg.service(WalletCallbackRoute::<MockPosStore>::new());
}

fn configure_failing_callback(cfg: &mut ServiceConfig) {
    let mut ledger = MockPosStore::new();
    ledger
        .expect_settle_wallet_payment()
        .returning(|_| Err(OrderFlowError::DatabaseError("database is locked".into())));
    register_apis(cfg, MockPosStore::new(), ledger);
    cfg.service(WalletCallbackRoute::<MockPosStore>::new());
}

//----------------------------------------------   Bank webhook  ----------------------------------------------------

#[actix_web::test]
async fn bank_webhook_without_a_match_is_acknowledged() {
    let _ = env_logger::try_init().ok();
    let (status, body) =
        post_request("/webhook/payhook", &bank_body("transaction.detected", 77_000), &[], configure_bank_no_match)
            .await
            .unwrap();
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"success":false,"message":"No matching pending order found","amount":77000}"#);
}

#[actix_web::test]
async fn bank_webhook_pays_matching_order() {
    let _ = env_logger::try_init().ok();
    let (status, body) =
        post_request("/webhook/payhook", &bank_body("transaction.detected", 45_500), &[], configure_bank_match)
            .await
            .unwrap();
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"success":true,"message":"Order payment confirmed","orderId":42,"amount":45500}"#);
}

#[actix_web::test]
async fn bank_webhook_with_unknown_event() {
    let _ = env_logger::try_init().ok();
    let (status, body) =
        post_request("/webhook/payhook", &bank_body("transaction.reversed", 45_000), &[], configure_bank_untouched)
            .await
            .unwrap();
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("Unknown event type: transaction.reversed"), "{body}");
}

#[actix_web::test]
async fn bank_webhook_with_zero_amount() {
    let _ = env_logger::try_init().ok();
    let (status, body) =
        post_request("/webhook/payhook", &bank_body("transaction.detected", 0), &[], configure_bank_untouched)
            .await
            .unwrap();
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("amountVND"), "{body}");
}

#[actix_web::test]
async fn signed_bank_webhook_requires_signature() {
    let _ = env_logger::try_init().ok();
    let body = bank_body("transaction.detected", 77_000);
    let err = post_request("/webhook/payhook", &body, &[], configure_signed_bank_untouched)
        .await
        .expect_err("Unsigned webhook should be rejected");
    assert_eq!(err, "No HMAC signature found.");

    let forged = calculate_hmac("some-other-secret", body.as_bytes());
    let headers = [(BANK_SIGNATURE_HEADER, forged.as_str())];
    let err = post_request("/webhook/payhook", &body, &headers, configure_signed_bank_untouched)
        .await
        .expect_err("Forged webhook should be rejected");
    assert_eq!(err, "Invalid HMAC signature.");
}

#[actix_web::test]
async fn signed_bank_webhook_passes_through() {
    let _ = env_logger::try_init().ok();
    let body = bank_body("transaction.detected", 77_000);
    let signature = calculate_hmac(WEBHOOK_SECRET, body.as_bytes());
    let headers = [(BANK_SIGNATURE_HEADER, signature.as_str())];
    let (status, reply) =
        post_request("/webhook/payhook", &body, &headers, configure_signed_bank_no_match).await.unwrap();
    assert_eq!(status, StatusCode::OK);
    assert!(reply.contains("No matching pending order found"), "{reply}");
}

fn bank_scope(cfg: &mut ServiceConfig, ledger: MockPosStore, hmac_checks: bool) {
    register_apis(cfg, MockPosStore::new(), ledger);
    let secret = Secret::new(WEBHOOK_SECRET.to_string());
    cfg.service(
        web::scope("/webhook")
            .wrap(HmacMiddlewareFactory::new(BANK_SIGNATURE_HEADER, secret, hmac_checks))
            .service(BankWebhookRoute::<MockPosStore>::new()),
    );
}

fn no_match_ledger() -> MockPosStore {
    let mut ledger = MockPosStore::new();
    ledger
        .expect_settle_bank_transfer()
        .withf(|t: &BankTransfer, tolerance: &Vnd| {
            t.transaction_id == "FT24164000001" && t.amount == Vnd::from(77_000) && *tolerance == Vnd::from(1_000)
        })
        .times(1)
        .returning(|_, _| Ok(BankSettlementResult::NoMatch));
    ledger
}

fn untouched_ledger() -> MockPosStore {
    let mut ledger = MockPosStore::new();
    ledger.expect_settle_bank_transfer().never();
    ledger
}

fn configure_bank_no_match(cfg: &mut ServiceConfig) {
    bank_scope(cfg, no_match_ledger(), false);
}

fn configure_bank_match(cfg: &mut ServiceConfig) {
    let mut ledger = MockPosStore::new();
    ledger.expect_settle_bank_transfer().times(1).returning(|_, _| {
        Ok(BankSettlementResult::Paid {
            order: order(42, PaymentMethod::BankTransfer, PaymentStatus::Paid, 45_000),
            transaction: None,
            ambiguous_matches: vec![],
        })
    });
    bank_scope(cfg, ledger, false);
}

fn configure_bank_untouched(cfg: &mut ServiceConfig) {
    bank_scope(cfg, untouched_ledger(), false);
}

fn configure_signed_bank_untouched(cfg: &mut ServiceConfig) {
    bank_scope(cfg, untouched_ledger(), true);
}

fn configure_signed_bank_no_match(cfg: &mut ServiceConfig) {
    bank_scope(cfg, no_match_ledger(), true);
}

//----------------------------------------------   Wallet payments  ----------------------------------------------------

#[actix_web::test]
async fn wallet_payment_charges_stored_total() {
    let _ = env_logger::try_init().ok();
    let (status, body) =
        post_request("/orders/42/wallet-payment", "{}", &[], configure_wallet_payment).await.unwrap();
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["order_id"], 42);
    assert_eq!(body["order_url"], "https://qr.example/pay/abc");
    assert!(body["app_trans_id"].as_str().unwrap().ends_with("_42_2"));
}

#[actix_web::test]
async fn legacy_wallet_payment_ignores_client_amount() {
    let _ = env_logger::try_init().ok();
    let (status, _) = post_request(
        "/zalopay/create-order",
        r#"{"orderId": 42, "amount": 1, "description": "Bàn 4"}"#,
        &[],
        configure_wallet_payment,
    )
    .await
    .unwrap();
    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn wallet_payment_provider_down() {
    let _ = env_logger::try_init().ok();
    let (status, body) =
        post_request("/orders/42/wallet-payment", "{}", &[], configure_wallet_provider_down).await.unwrap();
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body.contains("connection refused"), "{body}");
}

#[actix_web::test]
async fn wallet_payment_for_cash_order() {
    let _ = env_logger::try_init().ok();
    let (status, body) =
        post_request("/orders/43/wallet-payment", "{}", &[], configure_wallet_cash_order).await.unwrap();
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("not by wallet"), "{body}");
}

fn wallet_ledger(provider_up: bool) -> MockPosStore {
    let mut ledger = MockPosStore::new();
    ledger
        .expect_fetch_order()
        .returning(|id| Ok(Some(order(id, PaymentMethod::Wallet, PaymentStatus::Pending, 45_000))));
    ledger.expect_fetch_transactions_for_order().returning(|order_id| {
        let earlier = NewTransaction::pending(order_id, "240611_42_1", PaymentMethod::Wallet, Vnd::from(45_000));
        Ok(vec![stored_transaction(1, earlier)])
    });
    ledger
        .expect_insert_transaction()
        .withf(|t| t.status == TransactionStatus::Pending && t.app_trans_id.ends_with("_42_2"))
        .times(1)
        .returning(|t| Ok(stored_transaction(2, t)));
    if provider_up {
        ledger
            .expect_attach_provider_token()
            .withf(|id: &str, token: &str| id.ends_with("_42_2") && token == "tok-abc")
            .times(1)
            .returning(|id, token| {
                let row = NewTransaction::pending(42, id, PaymentMethod::Wallet, Vnd::from(45_000))
                    .with_provider_token(Some(token.to_string()));
                Ok(Some(stored_transaction(2, row)))
            });
        ledger.expect_discard_pending_transaction().never();
    } else {
        ledger.expect_attach_provider_token().never();
        ledger
            .expect_discard_pending_transaction()
            .withf(|id: &str| id.ends_with("_42_2"))
            .times(1)
            .returning(|_| Ok(true));
    }
    ledger
}

fn register_wallet_routes(cfg: &mut ServiceConfig, ledger: MockPosStore, wallet: MockWallet) {
    register_apis(cfg, MockPosStore::new(), ledger);
    cfg.app_data(web::Data::new(wallet))
        .service(WalletPaymentRoute::<MockPosStore, MockWallet>::new())
        .service(LegacyWalletPaymentRoute::<MockPosStore, MockWallet>::new());
}

fn configure_wallet_payment(cfg: &mut ServiceConfig) {
    let mut wallet = MockWallet::new();
    wallet
        .expect_create_payment()
        .withf(|req: &WalletPaymentRequest| req.amount == Vnd::from(45_000))
        .times(1)
        .returning(|_| {
            Ok(WalletPaymentSession {
                order_url: "https://qr.example/pay/abc".into(),
                provider_token: Some("tok-abc".into()),
                qr_code: None,
            })
        });
    register_wallet_routes(cfg, wallet_ledger(true), wallet);
}

fn configure_wallet_provider_down(cfg: &mut ServiceConfig) {
    let mut wallet = MockWallet::new();
    wallet.expect_create_payment().returning(|_| Err(WalletProviderError("connection refused".into())));
    register_wallet_routes(cfg, wallet_ledger(false), wallet);
}

fn configure_wallet_cash_order(cfg: &mut ServiceConfig) {
    let mut ledger = MockPosStore::new();
    ledger.expect_fetch_order().returning(|id| Ok(Some(order(id, PaymentMethod::Cash, PaymentStatus::Paid, 29_000))));
    ledger.expect_insert_transaction().never();
    let mut wallet = MockWallet::new();
    wallet.expect_create_payment().never();
    register_wallet_routes(cfg, ledger, wallet);
}

//----------------------------------------------   Ledger  ----------------------------------------------------

#[actix_web::test]
async fn manual_transaction_cannot_be_successful() {
    let _ = env_logger::try_init().ok();
    let (status, body) = post_request(
        "/transactions",
        r#"{"order_id": 42, "app_trans_id": "manual-1", "amount": 45000, "status": "success"}"#,
        &[],
        configure_manual_transaction,
    )
    .await
    .unwrap();
    // Unknown fields are ignored, so the row is recorded as pending
    assert_eq!(status, StatusCode::CREATED);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["status"], "pending");
    assert_eq!(body["channel"], "wallet");
}

fn configure_manual_transaction(cfg: &mut ServiceConfig) {
    let mut ledger = MockPosStore::new();
    ledger
        .expect_insert_transaction()
        .withf(|t| t.status == TransactionStatus::Pending && t.app_trans_id == "manual-1")
        .times(1)
        .returning(|t| Ok(stored_transaction(9, t)));
    register_apis(cfg, MockPosStore::new(), ledger);
    cfg.service(RecordTransactionRoute::<MockPosStore>::new());
}
