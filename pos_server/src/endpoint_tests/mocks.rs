use mockall::mock;
use pos_engine::{
    db_types::{Customer, NewOrder, NewTransaction, Order, OrderLine, Product, Transaction, Vnd},
    order_objects::{OrderDetails, OrderQueryFilter, OrderSummary},
    payment_objects::TransactionQueryFilter,
    traits::{
        BankSettlementResult,
        BankTransfer,
        OrderCancelled,
        OrderCreated,
        OrderManagement,
        PaymentLedger,
        PosDatabase,
        WalletPaymentRequest,
        WalletPaymentSession,
        WalletProvider,
        WalletProviderError,
        WalletSettlement,
        WalletSettlementResult,
    },
    OrderFlowError,
};

mock! {
    pub PosStore {}
    impl Clone for PosStore {
        fn clone(&self) -> Self;
    }
    impl OrderManagement for PosStore {
        async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, OrderFlowError>;
        async fn fetch_order_lines(&self, order_id: i64) -> Result<Vec<OrderLine>, OrderFlowError>;
        async fn fetch_order_details(&self, order_id: i64) -> Result<Option<OrderDetails>, OrderFlowError>;
        async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<OrderSummary>, OrderFlowError>;
        async fn fetch_customer(&self, customer_id: i64) -> Result<Option<Customer>, OrderFlowError>;
        async fn fetch_customer_by_phone(&self, phone: &str) -> Result<Option<Customer>, OrderFlowError>;
        async fn fetch_product(&self, product_id: i64) -> Result<Option<Product>, OrderFlowError>;
    }
    impl PosDatabase for PosStore {
        fn url(&self) -> &str;
        async fn ping(&self) -> Result<(), OrderFlowError>;
        async fn insert_order(&self, order: NewOrder, total_amount: Vnd) -> Result<OrderCreated, OrderFlowError>;
        async fn cancel_order(&self, order_id: i64) -> Result<OrderCancelled, OrderFlowError>;
    }
    impl PaymentLedger for PosStore {
        async fn insert_transaction(&self, transaction: NewTransaction) -> Result<Transaction, OrderFlowError>;
        async fn fetch_transaction(&self, app_trans_id: &str) -> Result<Option<Transaction>, OrderFlowError>;
        async fn fetch_transactions_for_order(&self, order_id: i64) -> Result<Vec<Transaction>, OrderFlowError>;
        async fn attach_provider_token(&self, app_trans_id: &str, provider_token: &str) -> Result<Option<Transaction>, OrderFlowError>;
        async fn discard_pending_transaction(&self, app_trans_id: &str) -> Result<bool, OrderFlowError>;
        async fn search_transactions(&self, query: TransactionQueryFilter) -> Result<Vec<Transaction>, OrderFlowError>;
        async fn settle_wallet_payment(&self, settlement: WalletSettlement) -> Result<WalletSettlementResult, OrderFlowError>;
        async fn settle_bank_transfer(&self, transfer: BankTransfer, tolerance: Vnd) -> Result<BankSettlementResult, OrderFlowError>;
    }
}

mock! {
    pub Wallet {}
    impl WalletProvider for Wallet {
        async fn create_payment(&self, request: WalletPaymentRequest) -> Result<WalletPaymentSession, WalletProviderError>;
    }
}
