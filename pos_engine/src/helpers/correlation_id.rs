//! Wallet correlation ids
//!
//! Every wallet payment attempt is given a correlation id (the provider calls it `app_trans_id`) of the form
//!
//! ```text
//!    yyMMdd_{order_id}_{attempt}
//! ```
//!
//! The date is the shop's local (UTC+7) calendar date, which the provider requires as the prefix. `attempt` counts
//! the payment sessions opened for the order, starting at 1, so a customer who abandons a QR code can be given a
//! fresh one. Ids of the older `yyMMdd_{order_id}` form are still recognised.
use chrono::{DateTime, FixedOffset, Utc};
use regex::Regex;

/// UTC+7, the provider's reference timezone.
const SHOP_UTC_OFFSET_SECS: i32 = 7 * 3600;

pub fn new_correlation_id(order_id: i64, attempt: i64, now: DateTime<Utc>) -> String {
    let date = match FixedOffset::east_opt(SHOP_UTC_OFFSET_SECS) {
        Some(tz) => now.with_timezone(&tz).format("%y%m%d").to_string(),
        None => now.format("%y%m%d").to_string(),
    };
    format!("{date}_{order_id}_{attempt}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CorrelationId {
    pub order_id: i64,
    pub attempt: Option<i64>,
}

/// Recovers the order id (and attempt number, if present) from a wallet correlation id.
pub fn parse_correlation_id(id: &str) -> Option<CorrelationId> {
    let pattern = Regex::new(r"^\d{6}_(\d+)(?:_(\d+))?$").ok()?;
    let captures = pattern.captures(id.trim())?;
    let order_id = captures.get(1)?.as_str().parse::<i64>().ok()?;
    let attempt = match captures.get(2) {
        Some(m) => Some(m.as_str().parse::<i64>().ok()?),
        None => None,
    };
    Some(CorrelationId { order_id, attempt })
}
