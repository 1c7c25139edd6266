use thiserror::Error;

#[derive(Debug, Error)]
pub enum WalletApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Could not reach the wallet provider: {0}")]
    RequestError(String),
    #[error("Invalid response from the wallet provider: {0}")]
    ResponseError(String),
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
    #[error("Request failed. Error {status}. {message}")]
    QueryError { status: u16, message: String },
    #[error("The wallet provider rejected the payment order. Code {code}. {message}")]
    Rejected { code: i64, message: String },
}
