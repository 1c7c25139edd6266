use std::{env, time::Duration};

use log::*;
use pos_common::{parse_boolean_flag, Secret, Vnd};
use pos_engine::{order_objects::PollPolicy, ReconcilerConfig, DEFAULT_BANK_MATCH_TOLERANCE};
use wallet_tools::WalletConfig;

const DEFAULT_POS_HOST: &str = "127.0.0.1";
const DEFAULT_POS_PORT: u16 = 8380;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/pos_store.db";
const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_POLL_INTERVAL_MS: u64 = 3_000;
const DEFAULT_POLL_MAX_ATTEMPTS: u32 = 20;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub max_connections: u32,
    /// If true, the X-Forwarded-For header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_x_forwarded_for: bool,
    /// If true, the Forwarded header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_forwarded: bool,
    /// QR-wallet provider credentials and endpoints
    pub wallet: WalletConfig,
    /// How far a bank transfer may differ from an order total and still be matched to it
    pub bank_match_tolerance: Vnd,
    /// Bank-webhook signing configuration
    pub bank_webhook: BankWebhookConfig,
    /// Bounds for `GET /orders/{id}/status?wait=true`
    pub poll_policy: PollPolicy,
}

#[derive(Clone, Debug, Default)]
pub struct BankWebhookConfig {
    pub hmac_secret: Secret<String>,
    pub hmac_checks: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_POS_HOST.to_string(),
            port: DEFAULT_POS_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            use_x_forwarded_for: false,
            use_forwarded: false,
            wallet: WalletConfig::default(),
            bank_match_tolerance: Vnd::from(DEFAULT_BANK_MATCH_TOLERANCE),
            bank_webhook: BankWebhookConfig::default(),
            poll_policy: PollPolicy::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("POS_HOST").ok().unwrap_or_else(|| DEFAULT_POS_HOST.into());
        let port = parse_env("POS_PORT", DEFAULT_POS_PORT);
        let database_url = env::var("POS_DATABASE_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ POS_DATABASE_URL is not set. Using the default, {DEFAULT_DATABASE_URL}.");
            DEFAULT_DATABASE_URL.to_string()
        });
        let max_connections = parse_env("POS_DB_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS);
        let use_x_forwarded_for = parse_boolean_flag(env::var("POS_USE_X_FORWARDED_FOR").ok(), false);
        let use_forwarded = parse_boolean_flag(env::var("POS_USE_FORWARDED").ok(), false);
        let wallet = WalletConfig::new_from_env_or_default();
        let bank_match_tolerance = Vnd::from(parse_env("POS_BANK_MATCH_TOLERANCE", DEFAULT_BANK_MATCH_TOLERANCE));
        let bank_webhook = BankWebhookConfig::from_env_or_default();
        let interval = Duration::from_millis(parse_env("POS_POLL_INTERVAL_MS", DEFAULT_POLL_INTERVAL_MS));
        let max_attempts = parse_env("POS_POLL_MAX_ATTEMPTS", DEFAULT_POLL_MAX_ATTEMPTS);
        let poll_policy = PollPolicy::new(interval, max_attempts);
        info!("🪛️ Status polls wait at most {:?} for a final status", poll_policy.budget());
        Self {
            host,
            port,
            database_url,
            max_connections,
            use_x_forwarded_for,
            use_forwarded,
            wallet,
            bank_match_tolerance,
            bank_webhook,
            poll_policy,
        }
    }

    /// The credentials and matching rules handed to the payment reconciler.
    pub fn reconciler_config(&self) -> ReconcilerConfig {
        ReconcilerConfig { callback_key: self.wallet.key2.clone(), bank_match_tolerance: self.bank_match_tolerance }
    }
}

impl BankWebhookConfig {
    pub fn from_env_or_default() -> Self {
        let secret = env::var("POS_BANK_WEBHOOK_SECRET").ok().filter(|s| !s.is_empty());
        let hmac_checks = parse_boolean_flag(env::var("POS_BANK_WEBHOOK_HMAC_CHECKS").ok(), secret.is_some());
        match (&secret, hmac_checks) {
            (None, true) => error!(
                "🪛️ POS_BANK_WEBHOOK_HMAC_CHECKS is on, but POS_BANK_WEBHOOK_SECRET is not set. Every bank webhook \
                 will be rejected."
            ),
            (_, false) => {
                warn!("🪛️ Bank webhook signatures are not checked. Anyone who can reach the server can mark orders paid.")
            },
            (Some(_), true) => info!("🪛️ Bank webhook signatures will be checked"),
        }
        Self { hmac_secret: Secret::new(secret.unwrap_or_default()), hmac_checks }
    }
}

fn parse_env<T>(name: &str, default: T) -> T
where
    T: std::str::FromStr + std::fmt::Display,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(s) => s.parse::<T>().unwrap_or_else(|e| {
            error!("🪛️ {s} is not a valid value for {name}. {e} Using the default, {default}, instead.");
            default
        }),
        Err(_) => default,
    }
}

//-------------------------------------------------  ServerOptions  ----------------------------------------------------
/// A subset of the server configuration that is used to configure the server's behaviour. Generally we try to keep this
/// as small as possible, and exclude secrets to avoid passing sensitive information around the system.
#[derive(Clone, Copy, Debug, Default)]
pub struct ServerOptions {
    pub use_x_forwarded_for: bool,
    pub use_forwarded: bool,
    pub poll_policy: PollPolicy,
}

impl ServerOptions {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            use_x_forwarded_for: config.use_x_forwarded_for,
            use_forwarded: config.use_forwarded,
            poll_policy: config.poll_policy,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parse_env_falls_back_on_bad_values() {
        env::set_var("POS_TEST_PARSE_PORT", "eighty");
        assert_eq!(parse_env("POS_TEST_PARSE_PORT", 8380u16), 8380);
        env::set_var("POS_TEST_PARSE_PORT", "9000");
        assert_eq!(parse_env("POS_TEST_PARSE_PORT", 8380u16), 9000);
        assert_eq!(parse_env("POS_TEST_PARSE_UNSET", 7u32), 7);
    }

    #[test]
    fn reconciler_gets_the_callback_key() {
        let mut config = ServerConfig::default();
        config.wallet.key2 = Secret::new("k2".to_string());
        config.bank_match_tolerance = Vnd::from(500);
        let rc = config.reconciler_config();
        assert_eq!(rc.callback_key.reveal(), "k2");
        assert_eq!(rc.bank_match_tolerance, Vnd::from(500));
    }
}
