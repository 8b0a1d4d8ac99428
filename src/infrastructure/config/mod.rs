pub mod gateway_config;
pub mod secret_file;

pub use gateway_config::{ConfigIssue, Environment, GatewayConfig, MerchantCredentials, StatusTargets};
