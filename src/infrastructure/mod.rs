pub mod adapters;
pub mod config;

pub use adapters::{InMemoryOrderStore, MySqlOrderStore, OderoPayAdapter, StaticCountryDirectory};
pub use config::GatewayConfig;
