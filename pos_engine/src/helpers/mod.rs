mod correlation_id;

pub use correlation_id::{new_correlation_id, parse_correlation_id, CorrelationId};
