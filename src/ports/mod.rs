pub mod country_directory_port;
pub mod oderopay_port;
pub mod order_store_port;

pub use country_directory_port::{Country, CountryDirectoryPort};
pub use oderopay_port::{
    CreatePaymentOutcome, OderoPayPort, PaymentIntent, PaymentNotification, ProcessorPayment,
    WebhookMessage,
};
pub use order_store_port::OrderStorePort;
