pub mod in_memory_order_store;
pub mod mysql_order_store;
pub mod oderopay_adapter;
pub mod static_country_directory;

pub use in_memory_order_store::InMemoryOrderStore;
pub use mysql_order_store::MySqlOrderStore;
pub use oderopay_adapter::OderoPayAdapter;
pub use static_country_directory::StaticCountryDirectory;
