mod hmac;

pub use hmac::{HmacMiddlewareFactory, HmacMiddlewareService, BANK_SIGNATURE_HEADER};
