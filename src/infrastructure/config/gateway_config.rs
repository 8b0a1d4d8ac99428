use crate::domain::basket::BasketImages;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::security::Secret;
use crate::domain::value_objects::OrderStatus;
use crate::infrastructure::config::secret_file;
use std::path::PathBuf;
use std::sync::Arc;

const DEFAULT_COUNTRY: &str = "RO";
const DEFAULT_SECRET_FILE: &str = ".oderopay_secret";
const PRODUCTION_API_URL: &str = "https://api.oderopay.com.ro";
const STAGING_API_URL: &str = "https://api-stg.oderopay.com.ro";

/// 商户凭证
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MerchantCredentials {
    pub merchant_id: String,
    pub merchant_token: String,
}

/// OderoPay 环境
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Production,
    Staging,
}

/// 三个可配置的订单状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusTargets {
    /// 跳转到支付页时设置的状态
    pub on_process: OrderStatus,
    pub on_success: OrderStatus,
    pub on_failed: OrderStatus,
}

/// 配置问题（后台提示）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigIssue {
    InvalidCurrency,
    MissingMerchantId,
    MissingMerchantToken,
}

impl ConfigIssue {
    pub fn message(&self) -> &'static str {
        match self {
            ConfigIssue::InvalidCurrency => {
                "Your store uses a currency that OderoPay doesn't support yet."
            }
            ConfigIssue::MissingMerchantId => "You forgot to fill your merchant ID.",
            ConfigIssue::MissingMerchantToken => "You forgot to fill your merchant token.",
        }
    }
}

/// 网关配置
///
/// 启动时加载一次，之后只读，通过 `Arc` 传给各组件。
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub enabled: bool,
    pub title: String,
    pub description: String,
    pub merchant_name: String,
    pub live: MerchantCredentials,
    pub sandbox_credentials: MerchantCredentials,
    pub sandbox: bool,
    pub statuses: StatusTargets,
    pub secret: Secret,
    /// 防重放令牌的签名密钥，未配置时使用 `secret`
    pub nonce_salt: Option<Secret>,
    pub enable_logging: bool,
    pub store_currency: String,
    pub available_currencies: Vec<String>,
    /// `CC` 或 `CC:STATE`
    pub default_country: String,
    /// 对外可访问的站点地址，不带末尾 "/"
    pub site_url: String,
    pub assets_url: String,
    pub api_url: Option<String>,
}

fn parse_bool(key: &str, value: Option<String>, default: bool) -> DomainResult<bool> {
    let Some(value) = value else {
        return Ok(default);
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "" => Ok(default),
        "yes" | "true" | "1" | "on" => Ok(true),
        "no" | "false" | "0" | "off" => Ok(false),
        other => Err(DomainError::ConfigurationError(format!(
            "{} must be yes or no, got {}",
            key, other
        ))),
    }
}

impl GatewayConfig {
    pub fn from_env() -> DomainResult<Arc<Self>> {
        Self::from_lookup(|key| std::env::var(key).ok()).map(Arc::new)
    }

    /// 从任意键值来源加载配置
    pub fn from_lookup<F>(lookup: F) -> DomainResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let text = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let site_url = text("ODERO_SITE_URL", "http://localhost:3000")
            .trim_end_matches('/')
            .to_string();
        let assets_url = get("ODERO_ASSETS_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| format!("{}/assets", site_url));

        let secret = match get("ODERO_SECRET_KEY").map(|raw| Secret::new(&raw)) {
            Some(secret) if !secret.is_empty() => secret,
            _ => {
                let path = PathBuf::from(text("ODERO_SECRET_FILE", DEFAULT_SECRET_FILE));
                secret_file::load_or_create(&path)?
            }
        };

        let available_currencies = text("ODERO_AVAILABLE_CURRENCIES", "RON,EUR")
            .split(',')
            .map(|c| c.trim().to_ascii_uppercase())
            .filter(|c| !c.is_empty())
            .collect();

        Ok(Self {
            enabled: parse_bool("ODERO_ENABLED", get("ODERO_ENABLED"), true)?,
            title: text("ODERO_TITLE", "OderoPay"),
            description: text("ODERO_DESCRIPTION", ""),
            merchant_name: get("ODERO_MERCHANT_NAME")
                .or_else(|| get("ODERO_STORE_NAME"))
                .unwrap_or_default(),
            live: MerchantCredentials {
                merchant_id: text("ODERO_MERCHANT_ID", ""),
                merchant_token: text("ODERO_MERCHANT_TOKEN", ""),
            },
            sandbox_credentials: MerchantCredentials {
                merchant_id: text("ODERO_MERCHANT_ID_SANDBOX", ""),
                merchant_token: text("ODERO_MERCHANT_TOKEN_SANDBOX", ""),
            },
            sandbox: parse_bool("ODERO_SANDBOX", get("ODERO_SANDBOX"), true)?,
            statuses: StatusTargets {
                on_process: OrderStatus::new(text("ODERO_STATUS_ON_PROCESS", "on-hold")),
                on_success: OrderStatus::new(text("ODERO_STATUS_ON_SUCCESS", "processing")),
                on_failed: OrderStatus::new(text("ODERO_STATUS_ON_FAILED", "failed")),
            },
            secret,
            nonce_salt: get("ODERO_NONCE_SALT").map(|raw| Secret::new(&raw)),
            enable_logging: parse_bool("ODERO_ENABLE_LOGGING", get("ODERO_ENABLE_LOGGING"), false)?,
            store_currency: text("ODERO_STORE_CURRENCY", "RON").to_ascii_uppercase(),
            available_currencies,
            default_country: text("ODERO_DEFAULT_COUNTRY", DEFAULT_COUNTRY),
            site_url,
            assets_url,
            api_url: get("ODERO_API_URL").map(|url| url.trim_end_matches('/').to_string()),
        })
    }

    pub fn environment(&self) -> Environment {
        if self.sandbox {
            Environment::Staging
        } else {
            Environment::Production
        }
    }

    /// 当前环境使用的商户凭证
    pub fn active_credentials(&self) -> &MerchantCredentials {
        if self.sandbox {
            &self.sandbox_credentials
        } else {
            &self.live
        }
    }

    pub fn api_base_url(&self) -> &str {
        match (&self.api_url, self.environment()) {
            (Some(url), _) => url.as_str(),
            (None, Environment::Production) => PRODUCTION_API_URL,
            (None, Environment::Staging) => STAGING_API_URL,
        }
    }

    /// 沙箱模式下总是记录日志
    pub fn logging_enabled(&self) -> bool {
        self.sandbox || self.enable_logging
    }

    /// 店铺默认国家（alpha-2）
    pub fn default_country(&self) -> String {
        self.default_country
            .split(':')
            .next()
            .map(|c| c.trim().to_ascii_uppercase())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| DEFAULT_COUNTRY.to_string())
    }

    pub fn token_key(&self) -> &[u8] {
        self.nonce_salt
            .as_ref()
            .filter(|salt| !salt.is_empty())
            .unwrap_or(&self.secret)
            .expose()
            .as_bytes()
    }

    /// 检查网关是否可以使用
    pub fn check_requirements(&self) -> Vec<ConfigIssue> {
        let credentials = self.active_credentials();
        let mut issues = Vec::new();

        if !self.available_currencies.contains(&self.store_currency) {
            issues.push(ConfigIssue::InvalidCurrency);
        }
        if credentials.merchant_id.is_empty() {
            issues.push(ConfigIssue::MissingMerchantId);
        }
        if credentials.merchant_token.is_empty() {
            issues.push(ConfigIssue::MissingMerchantToken);
        }

        issues
    }

    /// 结账页是否展示本网关
    pub fn is_available(&self) -> bool {
        self.enabled && self.check_requirements().is_empty()
    }

    /// 正式环境凭证是否缺失
    pub fn needs_setup(&self) -> bool {
        self.live.merchant_id.is_empty() || self.live.merchant_token.is_empty()
    }

    /// 需要在 OderoPay 商户后台登记的回调地址
    pub fn webhook_url(&self) -> String {
        format!(
            "{}/api/webhooks/oderopay?secret_key={}",
            self.site_url,
            self.secret.expose()
        )
    }

    pub fn basket_images(&self) -> BasketImages {
        BasketImages {
            shipping: Some(format!("{}/images/cargo.webp", self.assets_url)),
            tax: Some(format!("{}/images/tax.png", self.assets_url)),
            discount: Some(format!("{}/images/voucher.png", self.assets_url)),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::{config_with, sandbox_config};
    use super::*;

    #[test]
    fn test_defaults() {
        let config = sandbox_config();

        assert!(config.enabled);
        assert!(config.sandbox);
        assert_eq!(config.statuses.on_process.as_str(), "on-hold");
        assert_eq!(config.statuses.on_success.as_str(), "processing");
        assert_eq!(config.statuses.on_failed.as_str(), "failed");
        assert_eq!(config.site_url, "https://shop.example");
        assert_eq!(config.assets_url, "https://shop.example/assets");
        assert_eq!(config.api_base_url(), STAGING_API_URL);
        assert_eq!(config.active_credentials().merchant_id, "M-SANDBOX");
        assert!(config.logging_enabled());
        assert!(config.is_available());
        assert!(config.needs_setup());
    }

    #[test]
    fn test_live_mode_requires_live_credentials() {
        let config = config_with(&[("ODERO_SANDBOX", "no")]);

        assert_eq!(
            config.check_requirements(),
            vec![ConfigIssue::MissingMerchantId, ConfigIssue::MissingMerchantToken]
        );
        assert!(!config.is_available());
        assert!(!config.logging_enabled());
    }

    #[test]
    fn test_unsupported_currency() {
        let config = config_with(&[("ODERO_STORE_CURRENCY", "usd")]);

        assert_eq!(config.check_requirements(), vec![ConfigIssue::InvalidCurrency]);
        assert!(!config.is_available());
    }

    #[test]
    fn test_disabled_gateway_is_unavailable() {
        let config = config_with(&[("ODERO_ENABLED", "no")]);

        assert!(config.check_requirements().is_empty());
        assert!(!config.is_available());
    }

    #[test]
    fn test_default_country_strips_state() {
        assert_eq!(config_with(&[("ODERO_DEFAULT_COUNTRY", "bg:SF")]).default_country(), "BG");
        assert_eq!(config_with(&[("ODERO_DEFAULT_COUNTRY", ":")]).default_country(), "RO");
        assert_eq!(sandbox_config().default_country(), "RO");
    }

    #[test]
    fn test_status_targets_accept_platform_prefix() {
        let config = config_with(&[("ODERO_STATUS_ON_SUCCESS", "wc-completed")]);

        assert_eq!(config.statuses.on_success.as_str(), "completed");
    }

    #[test]
    fn test_invalid_bool_is_rejected() {
        let values = [("ODERO_SECRET_KEY", "x"), ("ODERO_SANDBOX", "maybe")];
        let result = GatewayConfig::from_lookup(|key| {
            values
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        });

        assert!(matches!(result, Err(DomainError::ConfigurationError(_))));
    }

    #[test]
    fn test_token_key_prefers_nonce_salt() {
        let config = config_with(&[("ODERO_NONCE_SALT", "salty")]);
        assert_eq!(config.token_key(), b"salty");
        assert_eq!(sandbox_config().token_key(), b"testsecret");
    }

    #[test]
    fn test_webhook_url_carries_secret() {
        assert_eq!(
            sandbox_config().webhook_url(),
            "https://shop.example/api/webhooks/oderopay?secret_key=testsecret"
        );
    }
}
