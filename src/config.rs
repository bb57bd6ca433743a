use {std::env, thiserror::Error};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has invalid value {value:?}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: &'static str,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaypalMode {
    Sandbox,
    Live,
}

impl PaypalMode {
    pub fn api_base(&self) -> &'static str {
        match self {
            Self::Sandbox => "https://api-m.sandbox.paypal.com",
            Self::Live => "https://api-m.paypal.com",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub base_url: String,
    pub app_env: AppEnv,
    pub stripe_secret_key: String,
    pub stripe_webhook_secret: Option<String>,
    pub paypal_client_id: String,
    pub paypal_client_secret: String,
    pub paypal_mode: PaypalMode,
    /// Accept unsigned Stripe webhooks. Only ever true outside production
    /// with no webhook secret configured.
    pub allow_unverified_webhooks: bool,
}

impl Config {
    /// Read configuration from the process environment (after `.env`).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let required = |name: &'static str| var(name).ok_or(ConfigError::Missing(name));

        let port = match var("PORT") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                name: "PORT",
                value: raw,
                reason: "expected a port number",
            })?,
            None => 3000,
        };

        let app_env = match var("APP_ENV").as_deref() {
            None | Some("development") => AppEnv::Development,
            Some("production") => AppEnv::Production,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: "APP_ENV",
                    value: other.to_string(),
                    reason: "expected development or production",
                });
            }
        };

        let paypal_mode = match var("PAYPAL_MODE").as_deref() {
            None | Some("sandbox") => PaypalMode::Sandbox,
            Some("live") => PaypalMode::Live,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: "PAYPAL_MODE",
                    value: other.to_string(),
                    reason: "expected sandbox or live",
                });
            }
        };

        let stripe_webhook_secret = var("STRIPE_WEBHOOK_SECRET");
        if app_env == AppEnv::Production && stripe_webhook_secret.is_none() {
            return Err(ConfigError::Missing("STRIPE_WEBHOOK_SECRET"));
        }

        let allow_flag = match var("ALLOW_UNVERIFIED_WEBHOOKS").as_deref() {
            None | Some("false") | Some("0") => false,
            Some("true") | Some("1") => true,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: "ALLOW_UNVERIFIED_WEBHOOKS",
                    value: other.to_string(),
                    reason: "expected true or false",
                });
            }
        };
        let allow_unverified_webhooks =
            allow_flag && app_env != AppEnv::Production && stripe_webhook_secret.is_none();

        let base_url = var("BASE_URL")
            .unwrap_or_else(|| format!("http://localhost:{port}"))
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            port,
            base_url,
            app_env,
            stripe_secret_key: required("STRIPE_SECRET_KEY")?,
            stripe_webhook_secret,
            paypal_client_id: required("PAYPAL_CLIENT_ID")?,
            paypal_client_secret: required("PAYPAL_CLIENT_SECRET")?,
            paypal_mode,
            allow_unverified_webhooks,
        })
    }
}
