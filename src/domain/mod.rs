pub mod basket;
pub mod entities;
pub mod errors;
pub mod payment_request;
pub mod security;
pub mod value_objects;

pub use basket::{Basket, BasketImages, BasketLine, build_basket};
pub use entities::{Address, GATEWAY_ID, ODERO_PAYMENT_KEY, Order, OrderItem, OrderNote, TaxTotal};
pub use errors::{DomainError, DomainResult};
pub use payment_request::{BillingInformation, Customer, DeliveryInformation, PaymentRequest};
pub use security::{CALLBACK_ACTION, ReplayTokens, Secret};
pub use value_objects::{Money, OrderStatus, PaymentStatus};
