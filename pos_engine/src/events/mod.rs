//! Engine events
//!
//! The order flow and reconciliation APIs publish an event whenever an order actually changes state. Duplicate or
//! rejected confirmations never produce one.
mod channel;
mod event_types;
mod hooks;

pub use channel::{EventHandler, EventProducer, Handler};
pub use event_types::{OrderCancelledEvent, OrderPaidEvent};
pub use hooks::{EventHandlers, EventHooks, EventProducers};
