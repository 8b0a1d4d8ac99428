use super::handlers::*;
use crate::ports::{OderoPayPort, OrderStorePort};
use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

pub fn create_router<P: OderoPayPort, S: OrderStorePort>(state: AppState<P, S>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/gateway", get(gateway_status::<P, S>))
        .route("/api/orders/:order_id/checkout", post(checkout::<P, S>))
        .route("/api/webhooks/oderopay", post(oderopay_webhook::<P, S>))
        .route("/wc/odero/:order_id/verify", get(verify_payment::<P, S>))
        .route("/wc/odero/:order_id/verify/", get(verify_payment::<P, S>))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
