//! Request handler definitions
//!
//! Define each route and it handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. Every database and provider call here is async, and the status
//! long-poll sleeps with `tokio::time::sleep`, so a waiting client never ties up a worker.
//!
//! Payment provider endpoints (the wallet callback and the bank webhook) answer in the shape their provider expects,
//! whatever happened internally. An outcome that is not an error for the provider, such as a duplicate or unmatched
//! confirmation, is acknowledged so the provider stops retrying.
use actix_web::{get, web, HttpRequest, HttpResponse, Responder};
use log::*;
use pos_engine::{
    order_objects::OrderQueryFilter,
    payment_objects::{BankWebhook, BankWebhookReply, TransactionQueryFilter, WalletCallback, WalletCallbackReply},
    traits::{BankSettlementResult, PaymentLedger, PosDatabase, WalletProvider},
    OrderFlowApi,
    OrderFlowError,
    PaymentReconciler,
};

use crate::{
    config::ServerOptions,
    data_objects::{
        CreateOrderRequest,
        CreateOrderResponse,
        JsonResponse,
        LegacyWalletPaymentParams,
        NewTransactionRequest,
        OrderDetailsResponse,
        OrderListParams,
        StatusParams,
        TransactionListParams,
        WalletPaymentParams,
    },
    errors::ServerError,
    helpers::get_remote_ip,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

route!(ping => Get "/ping" impl PosDatabase);
/// Like `/health`, but also checks that the database answers.
pub async fn ping<B: PosDatabase>(api: web::Data<OrderFlowApi<B>>) -> Result<HttpResponse, ServerError> {
    trace!("💻️ Received ping request");
    api.ping().await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success("pong")))
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(create_order => Post "/orders" impl PosDatabase);
/// Route handler for creating an order at the till.
///
/// Stock for every stock-managed product is reserved as part of the same database transaction that stores the order.
/// If any product is short, nothing is stored and the response names the product.
///
/// Cash orders are `paid` on creation. Wallet and bank-transfer orders start `pending` and are settled later by the
/// payment callbacks.
pub async fn create_order<B: PosDatabase>(
    body: web::Json<CreateOrderRequest>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let request = body.into_inner();
    debug!("💻️ POST new {} order for {}", request.payment_method, request.phone);
    let created = api.create_order(request.into()).await.map_err(|e| {
        debug!("💻️ Could not create order. {e}");
        ServerError::from(e)
    })?;
    Ok(HttpResponse::Created().json(CreateOrderResponse::from(created)))
}

route!(orders => Get "/orders" impl PosDatabase);
/// Order summaries, newest first. Accepts `customer_id`, `payment_method`, `payment_status` (comma-separated),
/// `since`, `until` and `limit` as query parameters.
pub async fn orders<B: PosDatabase>(
    query: web::Query<OrderListParams>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let filter = OrderQueryFilter::try_from(query.into_inner())?;
    debug!("💻️ GET orders ({filter:?})");
    let orders = api.search_orders(filter).await?;
    Ok(HttpResponse::Ok().json(orders))
}

route!(order_by_id => Get "/orders/{order_id}" impl PosDatabase);
pub async fn order_by_id<B: PosDatabase>(
    path: web::Path<i64>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    debug!("💻️ GET order #{order_id}");
    let details = api.fetch_order_details(order_id).await?;
    Ok(HttpResponse::Ok().json(OrderDetailsResponse::from(details)))
}

route!(cancel_order => Put "/orders/{order_id}/cancel" impl PosDatabase);
/// Cancels a pending order and returns its stock. Paid and already-cancelled orders are rejected with 409.
pub async fn cancel_order<B: PosDatabase>(
    path: web::Path<i64>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    debug!("💻️ PUT cancel order #{order_id}");
    let cancelled = api.cancel_order(order_id).await?;
    let message = format!("Order #{order_id} was cancelled. Stock restored for {} products.", cancelled.restored.len());
    Ok(HttpResponse::Ok().json(JsonResponse::success(message)))
}

route!(order_status => Get "/orders/{order_id}/status" impl PosDatabase);
/// The order's payment status. With `?wait=true`, the server re-reads the status at a fixed interval until it is final
/// or the configured number of attempts runs out.
pub async fn order_status<B: PosDatabase>(
    path: web::Path<i64>,
    query: web::Query<StatusParams>,
    options: web::Data<ServerOptions>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    let outcome = if query.wait {
        trace!("⏳️ Waiting for order #{order_id} to reach a final status");
        api.wait_for_terminal_status(order_id, &options.poll_policy).await?
    } else {
        api.order_status(order_id).await?
    };
    Ok(HttpResponse::Ok().json(outcome))
}

route!(customer_orders => Get "/customers/{customer_id}/orders" impl PosDatabase);
pub async fn customer_orders<B: PosDatabase>(
    path: web::Path<i64>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let customer_id = path.into_inner();
    debug!("💻️ GET orders for customer #{customer_id}");
    let orders = api.orders_for_customer(customer_id).await?;
    Ok(HttpResponse::Ok().json(orders))
}

//----------------------------------------------   Ledger  ----------------------------------------------------
route!(record_transaction => Post "/transactions" impl PaymentLedger);
/// Records a payment attempt by hand. The row is always `pending`.
pub async fn record_transaction<B: PaymentLedger>(
    body: web::Json<NewTransactionRequest>,
    api: web::Data<PaymentReconciler<B>>,
) -> Result<HttpResponse, ServerError> {
    let request = body.into_inner();
    debug!("💻️ POST transaction {} for order #{}", request.app_trans_id, request.order_id);
    let tx = api.record_transaction(request.into()).await?;
    Ok(HttpResponse::Created().json(tx))
}

route!(transactions => Get "/transactions" impl PaymentLedger);
pub async fn transactions<B: PaymentLedger>(
    query: web::Query<TransactionListParams>,
    api: web::Data<PaymentReconciler<B>>,
) -> Result<HttpResponse, ServerError> {
    let filter: TransactionQueryFilter = query.into_inner().into();
    debug!("💻️ GET transactions ({filter:?})");
    let rows = api.search_transactions(filter).await?;
    Ok(HttpResponse::Ok().json(rows))
}

route!(order_transactions => Get "/orders/{order_id}/transactions" impl PaymentLedger);
pub async fn order_transactions<B: PaymentLedger>(
    path: web::Path<i64>,
    api: web::Data<PaymentReconciler<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    debug!("💻️ GET transactions for order #{order_id}");
    let rows = api.transactions_for_order(order_id).await?;
    Ok(HttpResponse::Ok().json(rows))
}

//----------------------------------------------   Wallet  ----------------------------------------------------
route!(wallet_payment => Post "/orders/{order_id}/wallet-payment" impl PaymentLedger, WalletProvider);
/// Opens a QR-wallet payment for a pending wallet order. The amount charged is the stored order total.
///
/// Provider failures come back as 502. The order stays `pending` and the call can be retried.
pub async fn wallet_payment<B, P>(
    path: web::Path<i64>,
    body: Option<web::Json<WalletPaymentParams>>,
    api: web::Data<PaymentReconciler<B>>,
    provider: web::Data<P>,
) -> Result<HttpResponse, ServerError>
where
    B: PaymentLedger,
    P: WalletProvider,
{
    let order_id = path.into_inner();
    let description = body.and_then(|b| b.into_inner().description);
    debug!("💻️ POST wallet payment for order #{order_id}");
    let started = api.initiate_wallet_payment(order_id, provider.as_ref(), description).await?;
    Ok(HttpResponse::Ok().json(started))
}

route!(legacy_wallet_payment => Post "/zalopay/create-order" impl PaymentLedger, WalletProvider);
/// The storefront's original wallet-payment entry point. Same behaviour as `POST /orders/{id}/wallet-payment`.
pub async fn legacy_wallet_payment<B, P>(
    body: web::Json<LegacyWalletPaymentParams>,
    api: web::Data<PaymentReconciler<B>>,
    provider: web::Data<P>,
) -> Result<HttpResponse, ServerError>
where
    B: PaymentLedger,
    P: WalletProvider,
{
    let params = body.into_inner();
    if let Some(amount) = params.amount {
        debug!("💻️ Ignoring client amount {amount} for order #{}. The stored total is charged.", params.order_id);
    }
    let started = api.initiate_wallet_payment(params.order_id, provider.as_ref(), params.description).await?;
    Ok(HttpResponse::Ok().json(started))
}

route!(wallet_callback => Post "/zalopay/callback" impl PaymentLedger);
/// The QR-wallet provider's payment confirmation.
///
/// The provider requires `{return_code, return_message}` in every reply. `return_code: 1` tells it to stop retrying,
/// and is sent for every verified callback, including duplicates and callbacks that match no order. A bad signature or
/// unreadable body is answered with `-1` and HTTP 400. Storage failures get `-1` and HTTP 500 so that the provider
/// tries again later.
pub async fn wallet_callback<B: PaymentLedger>(body: web::Bytes, api: web::Data<PaymentReconciler<B>>) -> HttpResponse {
    let callback = match serde_json::from_slice::<WalletCallback>(&body) {
        Ok(c) => c,
        Err(e) => {
            warn!("💻️ Could not read wallet callback body. {e}");
            return HttpResponse::BadRequest().json(WalletCallbackReply::rejected("Invalid callback body"));
        },
    };
    match api.handle_wallet_callback(&callback).await {
        Ok(_) => HttpResponse::Ok().json(WalletCallbackReply::ok()),
        Err(OrderFlowError::AuthenticationError(_)) => {
            HttpResponse::BadRequest().json(WalletCallbackReply::rejected("Invalid MAC"))
        },
        Err(OrderFlowError::ValidationError(msg)) => {
            HttpResponse::BadRequest().json(WalletCallbackReply::rejected(msg))
        },
        Err(e) => {
            error!("💻️ Wallet callback could not be processed. {e}");
            HttpResponse::InternalServerError().json(WalletCallbackReply::rejected("Server Error"))
        },
    }
}

//----------------------------------------------   Bank  ----------------------------------------------------
route!(bank_webhook => Post "/payhook" impl PaymentLedger);
/// The bank-transfer notifier's webhook.
///
/// Every well-formed notification gets HTTP 200, matched or not, so the notifier does not retry forever. An unknown
/// event type or missing transaction data is a 400.
pub async fn bank_webhook<B: PaymentLedger>(
    req: HttpRequest,
    body: web::Json<BankWebhook>,
    options: web::Data<ServerOptions>,
    api: web::Data<PaymentReconciler<B>>,
) -> Result<HttpResponse, ServerError> {
    let hook = body.into_inner();
    let peer = get_remote_ip(&req, options.use_x_forwarded_for, options.use_forwarded);
    let peer = peer.map(|ip| ip.to_string()).unwrap_or_else(|| "unknown".into());
    debug!("💻️ Bank webhook {} received from {peer}", hook.event);
    let (result, amount) = api.handle_bank_webhook(hook).await?;
    let reply = match result {
        BankSettlementResult::Paid { order, .. } => BankWebhookReply {
            success: true,
            message: "Order payment confirmed".into(),
            order_id: Some(order.id),
            amount: Some(amount),
        },
        BankSettlementResult::Replayed { transaction } => BankWebhookReply {
            success: true,
            message: "Transaction already processed".into(),
            order_id: Some(transaction.order_id),
            amount: Some(transaction.amount),
        },
        BankSettlementResult::NoMatch => BankWebhookReply {
            success: false,
            message: "No matching pending order found".into(),
            order_id: None,
            amount: Some(amount),
        },
    };
    Ok(HttpResponse::Ok().json(reply))
}
