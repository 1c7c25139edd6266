use std::fmt::Debug;

use chrono::Utc;
use log::*;
use pos_common::{verify_hmac, Secret};

use crate::{
    db_types::{NewTransaction, Order, PaymentMethod, PaymentStatus, Transaction, TransactionStatus, Vnd},
    events::{EventProducers, OrderPaidEvent},
    helpers::{new_correlation_id, parse_correlation_id},
    payment_objects::{
        BankWebhook,
        TransactionQueryFilter,
        WalletCallback,
        WalletCallbackData,
        WalletPaymentStarted,
        BANK_EVENT_TRANSACTION_DETECTED,
    },
    traits::{
        BankSettlementResult,
        BankTransfer,
        OrderFlowError,
        PaymentLedger,
        WalletPaymentRequest,
        WalletProvider,
        WalletSettlement,
        WalletSettlementResult,
    },
};

pub const DEFAULT_BANK_MATCH_TOLERANCE: i64 = 1_000;
/// How many consecutive attempt numbers a wallet initiation tries before giving up.
const MAX_ATTEMPT_RESERVATIONS: i64 = 8;

/// Credentials and matching rules for the reconciler. Supplied at construction, so that each channel can be exercised
/// with its own test keys.
#[derive(Debug, Clone)]
pub struct ReconcilerConfig {
    /// Verifies the wallet provider's callback signatures
    pub callback_key: Secret<String>,
    /// How far a bank transfer amount may stray from an order total and still match it
    pub bank_match_tolerance: Vnd,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self { callback_key: Secret::default(), bank_match_tolerance: Vnd::from(DEFAULT_BANK_MATCH_TOLERANCE) }
    }
}

impl ReconcilerConfig {
    pub fn new<S: Into<String>>(callback_key: S, bank_match_tolerance: Vnd) -> Self {
        Self { callback_key: Secret::new(callback_key.into()), bank_match_tolerance }
    }
}

/// `PaymentReconciler` applies payment confirmations from the wallet callback and the bank-transfer webhook to orders
/// and the transaction ledger, and opens wallet payment sessions.
///
/// Every confirmation path is idempotent. An order is paid at most once, however many times, in whatever order, and
/// through whichever channel confirmations arrive.
pub struct PaymentReconciler<B> {
    db: B,
    config: ReconcilerConfig,
    producers: EventProducers,
}

impl<B> Debug for PaymentReconciler<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PaymentReconciler(tolerance: {})", self.config.bank_match_tolerance)
    }
}

impl<B> PaymentReconciler<B> {
    pub fn new(db: B, config: ReconcilerConfig, producers: EventProducers) -> Self {
        if config.callback_key.is_unset() {
            warn!("💸️ No wallet callback key is configured. Every wallet callback will be rejected.");
        }
        Self { db, config, producers }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn config(&self) -> &ReconcilerConfig {
        &self.config
    }
}

impl<B> PaymentReconciler<B>
where B: PaymentLedger
{
    /// Handles a wallet provider callback.
    ///
    /// The signature is checked over the raw `data` string before anything else. A bad signature is an
    /// [`OrderFlowError::AuthenticationError`], and `data` that can't be parsed is a
    /// [`OrderFlowError::ValidationError`]. Neither changes any state.
    ///
    /// Every other outcome, including duplicates and confirmations for orders that are no longer pending, is returned
    /// as `Ok` so the caller can acknowledge it and stop the provider from retrying.
    pub async fn handle_wallet_callback(
        &self,
        callback: &WalletCallback,
    ) -> Result<WalletSettlementResult, OrderFlowError> {
        let key = self.config.callback_key.reveal();
        if key.is_empty() || !verify_hmac(key, callback.data.as_bytes(), &callback.mac) {
            warn!("💸️ Wallet callback rejected. The MAC does not match.");
            return Err(OrderFlowError::AuthenticationError("Invalid MAC".into()));
        }
        let data: WalletCallbackData = serde_json::from_str(&callback.data).map_err(|e| {
            warn!("💸️ Wallet callback has a valid MAC, but its data could not be read. {e}");
            OrderFlowError::ValidationError(format!("Invalid callback data. {e}"))
        })?;
        let amount = Vnd::from(data.amount);
        let settlement = WalletSettlement {
            app_trans_id: data.app_trans_id.clone(),
            order_hint: parse_correlation_id(&data.app_trans_id).map(|c| c.order_id),
            settlement_id: data.settlement_id(),
            amount,
            paid_at: data.paid_at(),
        };
        let result = self.db.settle_wallet_payment(settlement).await?;
        let id = data.app_trans_id.as_str();
        match &result {
            WalletSettlementResult::Paid { order, transaction } => {
                if transaction.amount != amount {
                    warn!(
                        "💸️ Wallet payment {id} settled {amount}, but {} was requested for order #{}",
                        transaction.amount, order.id
                    );
                }
                info!("💸️ Order #{} paid by wallet ({id}, {amount})", order.id);
                self.call_order_paid_hook(order, PaymentMethod::Wallet).await;
            },
            WalletSettlementResult::AlreadySettled { transaction } => {
                debug!("💸️ Repeat callback for {id}. Order #{} is unchanged", transaction.order_id);
            },
            WalletSettlementResult::OrderNotPending { transaction, status } => {
                warn!(
                    "💸️ Wallet payment {id} settled for order #{}, which is already {status}. Manual review is needed.",
                    transaction.order_id
                );
            },
            WalletSettlementResult::DuplicatePayment { order_id, app_trans_id } => {
                warn!(
                    "💸️ Order #{order_id} was already paid, but the wallet reports another payment ({app_trans_id}, \
                     {amount}). This payment needs a refund."
                );
            },
            WalletSettlementResult::Unmatched => {
                warn!("💸️ Wallet payment {id} ({amount}) does not match any order. Manual review is needed.");
            },
        }
        Ok(result)
    }

    /// Handles a bank-transfer notification.
    ///
    /// Only `transaction.detected` events are processed, and they must carry a transaction id and an amount.
    /// Anything else is a [`OrderFlowError::ValidationError`]. A notification that matches no order is not an error.
    pub async fn handle_bank_webhook(&self, hook: BankWebhook) -> Result<(BankSettlementResult, Vnd), OrderFlowError> {
        if hook.event != BANK_EVENT_TRANSACTION_DETECTED {
            warn!("💸️ Unknown bank webhook event type: {}", hook.event);
            return Err(OrderFlowError::ValidationError(format!("Unknown event type: {}", hook.event)));
        }
        let tx = hook.transaction.ok_or_else(|| missing_bank_data("transaction"))?;
        let transaction_id =
            tx.transaction_id.filter(|s| !s.trim().is_empty()).ok_or_else(|| missing_bank_data("transactionId"))?;
        let amount = tx.amount_vnd.filter(|a| *a > 0).map(Vnd::from).ok_or_else(|| missing_bank_data("amountVND"))?;
        let transfer = BankTransfer { transaction_id, amount, bank: tx.bank, description: tx.description };
        let id = transfer.transaction_id.clone();
        let result = self.db.settle_bank_transfer(transfer, self.config.bank_match_tolerance).await?;
        match &result {
            BankSettlementResult::Paid { order, transaction, ambiguous_matches } => {
                info!("💸️ Order #{} paid by bank transfer {id} ({amount})", order.id);
                if transaction.is_none() {
                    warn!("💸️ Bank transfer {id} paid order #{}, but is missing from the ledger", order.id);
                }
                if !ambiguous_matches.is_empty() {
                    warn!(
                        "💸️ Bank transfer {id} ({amount}) also matched pending orders {ambiguous_matches:?}. Order #{} \
                         was chosen as the most recent. Please check these by hand.",
                        order.id
                    );
                }
                self.call_order_paid_hook(order, PaymentMethod::BankTransfer).await;
            },
            BankSettlementResult::Replayed { transaction } => {
                debug!("💸️ Bank transfer {id} was already applied to order #{}", transaction.order_id);
            },
            BankSettlementResult::NoMatch => {
                warn!("💸️ No pending bank-transfer order matches {id} ({amount}). Manual review is needed.");
            },
        }
        Ok((result, amount))
    }

    async fn call_order_paid_hook(&self, order: &Order, channel: PaymentMethod) {
        for emitter in &self.producers.order_paid_producer {
            debug!("💸️ Notifying order paid hook subscribers");
            emitter.publish_event(OrderPaidEvent::new(order.clone(), channel)).await;
        }
    }

    /// Opens a wallet payment session for a pending wallet order and records it in the ledger as `pending`.
    ///
    /// The ledger row is reserved before the provider is called, so concurrent initiations for the same order always
    /// get distinct correlation ids. The amount charged is always the order's stored total. If the provider fails, the
    /// error is returned as [`OrderFlowError::ExternalServiceError`], the reserved row is discarded, and the order
    /// stays `pending`.
    pub async fn initiate_wallet_payment<P: WalletProvider>(
        &self,
        order_id: i64,
        provider: &P,
        description: Option<String>,
    ) -> Result<WalletPaymentStarted, OrderFlowError> {
        let order = self.db.fetch_order(order_id).await?.ok_or(OrderFlowError::OrderNotFound(order_id))?;
        if order.payment_method != PaymentMethod::Wallet {
            return Err(OrderFlowError::ValidationError(format!(
                "Order #{order_id} is paid by {}, not by wallet",
                order.payment_method
            )));
        }
        if order.payment_status != PaymentStatus::Pending {
            return Err(OrderFlowError::InvalidState { order_id, status: order.payment_status, action: "paid" });
        }
        let description = description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| format!("Payment for order #{order_id}"));
        let app_trans_id = self.reserve_wallet_attempt(&order, &description).await?;
        let request =
            WalletPaymentRequest { app_trans_id: app_trans_id.clone(), amount: order.total_amount, description };
        trace!("💸️ Opening wallet payment {app_trans_id} for order #{order_id}");
        let session = match provider.create_payment(request).await {
            Ok(session) => session,
            Err(e) => {
                warn!("💸️ The wallet provider could not open payment {app_trans_id}. {e}");
                if let Err(db_err) = self.db.discard_pending_transaction(&app_trans_id).await {
                    error!("💸️ Could not discard the reserved ledger row {app_trans_id}. {db_err}");
                }
                return Err(OrderFlowError::ExternalServiceError(e.to_string()));
            },
        };
        if let Some(token) = session.provider_token.as_deref() {
            self.db.attach_provider_token(&app_trans_id, token).await?;
        }
        info!("💸️ Wallet payment {app_trans_id} opened for order #{order_id} ({})", order.total_amount);
        Ok(WalletPaymentStarted { order_id, app_trans_id, order_url: session.order_url, qr_code: session.qr_code })
    }

    /// Inserts the `pending` ledger row for the next wallet attempt on `order` and returns its correlation id.
    ///
    /// The attempt number starts after the rows already on the ledger. If another initiation took that number first,
    /// the next one is tried.
    async fn reserve_wallet_attempt(&self, order: &Order, description: &str) -> Result<String, OrderFlowError> {
        let order_id = order.id;
        let recorded = self.db.fetch_transactions_for_order(order_id).await?.len() as i64;
        for attempt in (recorded + 1)..=(recorded + MAX_ATTEMPT_RESERVATIONS) {
            let app_trans_id = new_correlation_id(order_id, attempt, Utc::now());
            let record =
                NewTransaction::pending(order_id, app_trans_id.clone(), PaymentMethod::Wallet, order.total_amount)
                    .with_description(description);
            match self.db.insert_transaction(record).await {
                Ok(_) => return Ok(app_trans_id),
                Err(OrderFlowError::TransactionAlreadyExists(_)) => {
                    debug!("💸️ Attempt {attempt} for order #{order_id} was taken. Trying the next one.");
                },
                Err(e) => return Err(e),
            }
        }
        Err(OrderFlowError::ExternalServiceError(format!(
            "Could not reserve a wallet payment attempt for order #{order_id}"
        )))
    }

    /// Records a payment attempt in the ledger by hand.
    ///
    /// Manual rows are always `pending`. Only a verified confirmation can settle a transaction.
    pub async fn record_transaction(&self, transaction: NewTransaction) -> Result<Transaction, OrderFlowError> {
        if transaction.app_trans_id.trim().is_empty() {
            return Err(OrderFlowError::ValidationError("A correlation id is required".into()));
        }
        if transaction.amount < Vnd::from(0) {
            return Err(OrderFlowError::ValidationError("A transaction amount cannot be negative".into()));
        }
        if transaction.status != TransactionStatus::Pending {
            return Err(OrderFlowError::ValidationError(
                "Transactions can only be recorded as pending. Settlement comes from the payment channels.".into(),
            ));
        }
        let tx = self.db.insert_transaction(transaction).await?;
        debug!("💸️ Transaction {} recorded for order #{}", tx.app_trans_id, tx.order_id);
        Ok(tx)
    }

    pub async fn transactions_for_order(&self, order_id: i64) -> Result<Vec<Transaction>, OrderFlowError> {
        if self.db.fetch_order(order_id).await?.is_none() {
            return Err(OrderFlowError::OrderNotFound(order_id));
        }
        self.db.fetch_transactions_for_order(order_id).await
    }

    pub async fn search_transactions(&self, query: TransactionQueryFilter) -> Result<Vec<Transaction>, OrderFlowError> {
        self.db.search_transactions(query).await
    }
}

fn missing_bank_data(field: &str) -> OrderFlowError {
    warn!("💸️ Bank webhook is missing {field}");
    OrderFlowError::ValidationError(format!("Missing required transaction data: {field}"))
}
