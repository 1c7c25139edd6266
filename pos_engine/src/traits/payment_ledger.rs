use crate::{
    db_types::{NewTransaction, Transaction, Vnd},
    payment_objects::TransactionQueryFilter,
    traits::{
        data_objects::{BankSettlementResult, BankTransfer, WalletSettlement, WalletSettlementResult},
        OrderFlowError,
        OrderManagement,
    },
};

/// The transaction ledger, and the atomic settlement operations the payment reconciler is built on.
///
/// The hard guarantee every implementation must give: at most one ledger row per order ever reaches `success`, and an
/// order moves to `paid` only from `pending`, no matter how often or in what order confirmations arrive.
#[allow(async_fn_in_trait)]
pub trait PaymentLedger: Clone + OrderManagement {
    /// Appends a row to the ledger. Fails with [`OrderFlowError::TransactionAlreadyExists`] if the correlation id is
    /// taken, and [`OrderFlowError::OrderNotFound`] if the order does not exist.
    async fn insert_transaction(&self, transaction: NewTransaction) -> Result<Transaction, OrderFlowError>;

    async fn fetch_transaction(&self, app_trans_id: &str) -> Result<Option<Transaction>, OrderFlowError>;

    async fn fetch_transactions_for_order(&self, order_id: i64) -> Result<Vec<Transaction>, OrderFlowError>;

    /// Attaches the wallet provider's session token to a ledger row. Returns `None` if the row does not exist.
    async fn attach_provider_token(
        &self,
        app_trans_id: &str,
        provider_token: &str,
    ) -> Result<Option<Transaction>, OrderFlowError>;

    /// Deletes a ledger row that never got past `pending`. Settled rows are never removed. Returns `true` if a row
    /// was deleted.
    async fn discard_pending_transaction(&self, app_trans_id: &str) -> Result<bool, OrderFlowError>;

    /// Ledger rows matching the filter, newest first.
    async fn search_transactions(&self, query: TransactionQueryFilter) -> Result<Vec<Transaction>, OrderFlowError>;

    /// Applies a verified wallet confirmation in one atomic unit: settles the ledger row for the correlation id
    /// (creating it for `order_hint` if it was never recorded), then moves the order from `pending` to `paid`.
    async fn settle_wallet_payment(
        &self,
        settlement: WalletSettlement,
    ) -> Result<WalletSettlementResult, OrderFlowError>;

    /// Pays the most recent `pending` bank-transfer order whose total is within `tolerance` of the transfer amount,
    /// and records the transfer in the ledger on a best-effort basis.
    async fn settle_bank_transfer(
        &self,
        transfer: BankTransfer,
        tolerance: Vnd,
    ) -> Result<BankSettlementResult, OrderFlowError>;
}
