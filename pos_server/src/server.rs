use std::time::Duration;

use actix_web::{dev::Server, error::JsonPayloadError, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use log::*;
use pos_engine::{
    events::{EventHandlers, EventHooks, EventProducers},
    OrderFlowApi,
    PaymentReconciler,
    SqliteDatabase,
};

use crate::{
    config::{ServerConfig, ServerOptions},
    errors::ServerError,
    integrations::wallet::QrWalletProvider,
    middleware::{HmacMiddlewareFactory, BANK_SIGNATURE_HEADER},
    routes::{
        health,
        BankWebhookRoute,
        CancelOrderRoute,
        CreateOrderRoute,
        CustomerOrdersRoute,
        LegacyWalletPaymentRoute,
        OrderByIdRoute,
        OrderStatusRoute,
        OrderTransactionsRoute,
        OrdersRoute,
        PingRoute,
        RecordTransactionRoute,
        TransactionsRoute,
        WalletCallbackRoute,
        WalletPaymentRoute,
    },
};

const EVENT_BUFFER_SIZE: usize = 25;

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, config.max_connections)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.run_migrations().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let handlers = EventHandlers::new(EVENT_BUFFER_SIZE, announcement_hooks());
    let producers = handlers.producers();
    tokio::spawn(handlers.start_handlers());
    let srv = create_server_instance(config, db, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

/// Hooks that announce order state changes in the log. Integrations that need to react to payments (receipt
/// printers, kitchen displays) attach here.
fn announcement_hooks() -> EventHooks {
    let mut hooks = EventHooks::default();
    hooks
        .on_order_paid(|ev| {
            info!("📬️ Order #{} paid via {} ({})", ev.order.id, ev.channel, ev.order.total_amount);
            Box::pin(async {})
        })
        .on_order_cancelled(|ev| {
            info!("📬️ Order #{} cancelled. {} stock line(s) restored", ev.order.id, ev.restored.len());
            Box::pin(async {})
        });
    hooks
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let wallet = QrWalletProvider::new(config.wallet.clone())
        .map_err(|e| ServerError::ConfigurationError(format!("Wallet provider is misconfigured. {e}")))?;
    let options = ServerOptions::from_config(&config);
    let reconciler_config = config.reconciler_config();
    let webhook_config = config.bank_webhook.clone();
    let srv = HttpServer::new(move || {
        let orders_api = OrderFlowApi::new(db.clone(), producers.clone());
        let reconciler = PaymentReconciler::new(db.clone(), reconciler_config.clone(), producers.clone());
        let json_config = web::JsonConfig::default().error_handler(|err: JsonPayloadError, _req| {
            debug!("💻️ Rejecting request body. {err}");
            ServerError::InvalidRequestBody(err.to_string()).into()
        });
        let webhook_scope = web::scope("/webhook")
            .wrap(HmacMiddlewareFactory::new(
                BANK_SIGNATURE_HEADER,
                webhook_config.hmac_secret.clone(),
                webhook_config.hmac_checks,
            ))
            .service(BankWebhookRoute::<SqliteDatabase>::new());
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("pos::access_log"))
            .app_data(web::Data::new(orders_api))
            .app_data(web::Data::new(reconciler))
            .app_data(web::Data::new(wallet.clone()))
            .app_data(web::Data::new(options))
            .app_data(json_config)
            .service(health)
            .service(PingRoute::<SqliteDatabase>::new())
            .service(CreateOrderRoute::<SqliteDatabase>::new())
            .service(OrdersRoute::<SqliteDatabase>::new())
            .service(OrderByIdRoute::<SqliteDatabase>::new())
            .service(CancelOrderRoute::<SqliteDatabase>::new())
            .service(OrderStatusRoute::<SqliteDatabase>::new())
            .service(CustomerOrdersRoute::<SqliteDatabase>::new())
            .service(RecordTransactionRoute::<SqliteDatabase>::new())
            .service(TransactionsRoute::<SqliteDatabase>::new())
            .service(OrderTransactionsRoute::<SqliteDatabase>::new())
            .service(WalletPaymentRoute::<SqliteDatabase, QrWalletProvider>::new())
            .service(LegacyWalletPaymentRoute::<SqliteDatabase, QrWalletProvider>::new())
            .service(WalletCallbackRoute::<SqliteDatabase>::new())
            .service(webhook_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}
