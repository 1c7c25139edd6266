use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Parse a boolean flag from a string value, or return the given default value otherwise.
pub fn parse_boolean_flag(value: Option<String>, default: bool) -> bool {
    let value = match value {
        Some(v) => v,
        None => return default,
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}

/// Calculates the HMAC-SHA256 of `data` using `key`, and returns it as a lowercase hex string.
pub fn calculate_hmac(key: &str, data: &[u8]) -> String {
    // HMAC accepts keys of any length, so this can't fail
    let mut mac = HmacSha256::new_from_slice(key.as_bytes()).expect("HMAC can take a key of any size");
    mac.update(data);
    hex::encode(mac.finalize().into_bytes())
}

/// Checks a hex-encoded HMAC-SHA256 signature over `data` in constant time.
///
/// Returns false for signatures that are not valid hex.
pub fn verify_hmac(key: &str, data: &[u8], signature: &str) -> bool {
    let Ok(expected) = hex::decode(signature.trim()) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(key.as_bytes()) else {
        return false;
    };
    mac.update(data);
    mac.verify_slice(&expected).is_ok()
}
