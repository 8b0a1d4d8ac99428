pub mod assembler;
pub mod dto;
pub mod notification_gate;
pub mod payment_service;
pub mod reconciler;

pub use assembler::{PaymentRequestAssembler, normalize_phone};
pub use dto::{CheckoutResponse, ErrorResponse, GatewayStatusResponse, WebhookQuery};
pub use notification_gate::{NotificationGate, WebhookCredentials, WebhookOutcome};
pub use payment_service::PaymentService;
pub use reconciler::{ReconcileOutcome, StatusReconciler};
