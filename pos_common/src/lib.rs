mod vnd;

pub mod helpers;
pub mod op;
mod secret;

pub use helpers::{calculate_hmac, parse_boolean_flag, verify_hmac};
pub use secret::Secret;
pub use vnd::{Vnd, VndConversionError, VND_CURRENCY_CODE};
