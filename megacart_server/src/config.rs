use std::{env, time::Duration};

use log::*;
use mc_common::{parse_boolean_flag, parse_env_value, CommissionRate, Secret, DEFAULT_CURRENCY_CODE};
use megacart_engine::{gateway::RazorpayConfig, MarketConfig};

const DEFAULT_MCS_HOST: &str = "127.0.0.1";
const DEFAULT_MCS_PORT: u16 = 8460;
const DEFAULT_RAZORPAY_URL: &str = "https://api.razorpay.com";
const DEFAULT_OPERATOR_EMAIL: &str = "operator@megacart.local";
const DEFAULT_CREDIT_RETRY_INTERVAL: Duration = Duration::from_secs(300);
const DEFAULT_DB_CONNECTIONS: u32 = 25;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub max_db_connections: u32,
    pub razorpay: GatewayConfig,
    pub market: MarketConfig,
    pub identity: IdentityConfig,
    /// How often the server retries vendor ledger credits that could not be applied at settlement time.
    pub credit_retry_interval: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_MCS_HOST.to_string(),
            port: DEFAULT_MCS_PORT,
            database_url: String::default(),
            max_db_connections: DEFAULT_DB_CONNECTIONS,
            razorpay: GatewayConfig::default(),
            market: MarketConfig::default(),
            identity: IdentityConfig::default(),
            credit_retry_interval: DEFAULT_CREDIT_RETRY_INTERVAL,
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("MCS_HOST").ok().unwrap_or_else(|| DEFAULT_MCS_HOST.into());
        let port = env::var("MCS_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for MCS_PORT. {e} Using the default, {DEFAULT_MCS_PORT}, instead."
                    );
                    DEFAULT_MCS_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_MCS_PORT);
        let database_url = env::var("MCS_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ MCS_DATABASE_URL is not set. Please set it to the URL for the MegaCart database.");
            String::default()
        });
        let max_db_connections =
            parse_env_value(env::var("MCS_MAX_DB_CONNECTIONS").ok()).unwrap_or(DEFAULT_DB_CONNECTIONS);
        let credit_retry_interval = env::var("MCS_CREDIT_RETRY_INTERVAL")
            .map_err(|_| {
                info!(
                    "🪛️ MCS_CREDIT_RETRY_INTERVAL is not set. Using the default value of {} s.",
                    DEFAULT_CREDIT_RETRY_INTERVAL.as_secs()
                )
            })
            .and_then(|s| {
                s.parse::<u64>()
                    .map(Duration::from_secs)
                    .map_err(|e| warn!("🪛️ Invalid configuration value for MCS_CREDIT_RETRY_INTERVAL. {e}"))
            })
            .ok()
            .filter(|d| !d.is_zero())
            .unwrap_or(DEFAULT_CREDIT_RETRY_INTERVAL);
        Self {
            host,
            port,
            database_url,
            max_db_connections,
            razorpay: GatewayConfig::from_env_or_defaults(),
            market: market_config_from_env(),
            identity: IdentityConfig::from_env_or_defaults(),
            credit_retry_interval,
        }
    }
}

fn market_config_from_env() -> MarketConfig {
    let commission = match env::var("MCS_COMMISSION_RATE") {
        Ok(s) => s.parse::<CommissionRate>().unwrap_or_else(|e| {
            warn!("🪛️ Invalid configuration value for MCS_COMMISSION_RATE. {e}. Using the default rate.");
            CommissionRate::default()
        }),
        Err(_) => {
            info!("🪛️ MCS_COMMISSION_RATE is not set. Using the default rate of {}.", CommissionRate::default());
            CommissionRate::default()
        },
    };
    let currency = env::var("MCS_CURRENCY").ok().unwrap_or_else(|| DEFAULT_CURRENCY_CODE.to_string());
    let operator_email = env::var("MCS_OPERATOR_EMAIL").ok().unwrap_or_else(|| {
        warn!("🪛️ MCS_OPERATOR_EMAIL is not set. Order summaries will go to {DEFAULT_OPERATOR_EMAIL}");
        DEFAULT_OPERATOR_EMAIL.to_string()
    });
    MarketConfig { currency, commission, operator_email }
}

//-------------------------------------------------  GatewayConfig  ----------------------------------------------------
#[derive(Clone, Debug)]
pub struct GatewayConfig {
    pub key_id: String,
    pub key_secret: Secret<String>,
    pub base_url: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self { key_id: String::default(), key_secret: Secret::default(), base_url: DEFAULT_RAZORPAY_URL.to_string() }
    }
}

impl GatewayConfig {
    pub fn from_env_or_defaults() -> Self {
        let key_id = env::var("MCS_RAZORPAY_KEY_ID").ok().unwrap_or_else(|| {
            error!("🪛️ MCS_RAZORPAY_KEY_ID is not set. Checkouts will fail until it is configured.");
            String::default()
        });
        let key_secret = env::var("MCS_RAZORPAY_KEY_SECRET").ok().unwrap_or_else(|| {
            error!("🪛️ MCS_RAZORPAY_KEY_SECRET is not set. Payments cannot be verified until it is configured.");
            String::default()
        });
        let base_url = env::var("MCS_RAZORPAY_BASE_URL").ok().unwrap_or_else(|| DEFAULT_RAZORPAY_URL.into());
        Self { key_id, key_secret: Secret::new(key_secret), base_url }
    }

    pub fn razorpay_config(&self) -> RazorpayConfig {
        let mut config = RazorpayConfig::new(self.key_id.clone(), self.key_secret.reveal().clone());
        config.base_url = self.base_url.clone();
        config
    }
}

//-------------------------------------------------  IdentityConfig  ---------------------------------------------------
/// Settings for trusting the `x-principal` header set by the upstream identity service.
#[derive(Clone, Debug, Default)]
pub struct IdentityConfig {
    /// The key the identity service signs principal headers with.
    pub secret: Secret<String>,
    /// If false, principal headers are accepted without a signature. **DANGER**: only ever do this in development.
    pub signature_checks: bool,
}

impl IdentityConfig {
    pub fn new<S: Into<String>>(secret: S, signature_checks: bool) -> Self {
        Self { secret: Secret::new(secret.into()), signature_checks }
    }

    pub fn from_env_or_defaults() -> Self {
        let secret = env::var("MCS_IDENTITY_SECRET").ok().unwrap_or_else(|| {
            error!("🪛️ MCS_IDENTITY_SECRET is not set. No signed principal header will be accepted.");
            String::default()
        });
        let signature_checks = parse_boolean_flag(env::var("MCS_IDENTITY_CHECKS").ok(), true);
        if !signature_checks {
            warn!(
                "🚨️🚨️🚨️ Principal signature checks are DISABLED. Anyone can act as any buyer, vendor or admin. Never \
                 run a production server like this. 🚨️🚨️🚨️"
            );
        }
        Self { secret: Secret::new(secret), signature_checks }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn gateway_config_carries_base_url() {
        let config = GatewayConfig {
            key_id: "rzp_test_1".into(),
            key_secret: Secret::new("shh".to_string()),
            base_url: "http://localhost:9999".into(),
        };
        let rp = config.razorpay_config();
        assert_eq!(rp.key_id, "rzp_test_1");
        assert_eq!(rp.key_secret.reveal(), "shh");
        assert_eq!(rp.base_url, "http://localhost:9999");
    }

    #[test]
    fn secrets_are_not_printed() {
        let config = IdentityConfig::new("super-secret", true);
        let printed = format!("{config:?}");
        assert!(!printed.contains("super-secret"));
    }
}
