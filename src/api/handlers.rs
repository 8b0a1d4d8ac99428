use crate::application::{
    ErrorResponse, NotificationGate, PaymentService, WebhookCredentials, WebhookOutcome,
    WebhookQuery,
};
use crate::domain::errors::DomainError;
use crate::ports::{OderoPayPort, OrderStorePort};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Redirect, Response},
};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// 应用状态
pub struct AppState<P: OderoPayPort, S: OrderStorePort> {
    pub payment_service: Arc<PaymentService<P, S>>,
    pub notification_gate: Arc<NotificationGate<P, S>>,
}

impl<P: OderoPayPort, S: OrderStorePort> Clone for AppState<P, S> {
    fn clone(&self) -> Self {
        Self {
            payment_service: self.payment_service.clone(),
            notification_gate: self.notification_gate.clone(),
        }
    }
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, code: &str, e: &DomainError) -> ApiError {
    (status, Json(ErrorResponse::new(code, e.to_string())))
}

/// 订单ID只允许字母、数字和 "-"
fn is_valid_order_id(order_id: &str) -> bool {
    !order_id.is_empty() && order_id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

/// 网关状态
pub async fn gateway_status<P: OderoPayPort, S: OrderStorePort>(
    State(state): State<AppState<P, S>>,
) -> impl IntoResponse {
    Json(state.payment_service.gateway_status())
}

/// 结账
pub async fn checkout<P: OderoPayPort, S: OrderStorePort>(
    State(state): State<AppState<P, S>>,
    Path(order_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    info!("Received checkout request for order: {}", order_id);

    state
        .payment_service
        .process_payment(&order_id)
        .await
        .map(|response| (StatusCode::OK, Json(response)))
        .map_err(|e| {
            error!("Checkout error: {}", e);
            let status = match e {
                DomainError::GatewayUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
                DomainError::OrderNotFound(_) => StatusCode::NOT_FOUND,
                DomainError::UnknownCountry(_) => StatusCode::UNPROCESSABLE_ENTITY,
                DomainError::PaymentRejected(_) => StatusCode::PAYMENT_REQUIRED,
                DomainError::ProcessorError(_) | DomainError::HttpError(_) => {
                    StatusCode::BAD_GATEWAY
                }
                DomainError::ValidationError(_) => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            api_error(status, "CHECKOUT_ERROR", &e)
        })
}

/// OderoPay 回调
pub async fn oderopay_webhook<P: OderoPayPort, S: OrderStorePort>(
    State(state): State<AppState<P, S>>,
    Query(query): Query<WebhookQuery>,
    body: String,
) -> Response {
    info!("Received OderoPay webhook");

    let credentials = WebhookCredentials {
        token: query.token.as_deref(),
        secret_key: query.secret_key.as_deref(),
    };

    match state.notification_gate.handle(&credentials, &body).await {
        Ok(outcome) => {
            if let WebhookOutcome::Unrecognized(kind) = &outcome {
                debug!("Webhook ignored, unrecognized type {:?}", kind);
            }
            StatusCode::OK.into_response()
        }
        Err(DomainError::SecurityCheckFailed) => {
            (StatusCode::FORBIDDEN, "Security check").into_response()
        }
        Err(e @ (DomainError::SerializationError(_) | DomainError::ValidationError(_))) => {
            warn!("Malformed webhook payload: {}", e);
            api_error(StatusCode::BAD_REQUEST, "INVALID_REQUEST", &e).into_response()
        }
        Err(e) => {
            error!("Webhook handling error: {}", e);
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "WEBHOOK_ERROR", &e).into_response()
        }
    }
}

/// 顾客从支付页返回
pub async fn verify_payment<P: OderoPayPort, S: OrderStorePort>(
    State(state): State<AppState<P, S>>,
    Path(order_id): Path<String>,
) -> Result<Redirect, ApiError> {
    info!("Received payment verification for order: {}", order_id);

    if !is_valid_order_id(&order_id) {
        let e = DomainError::ValidationError(format!("Invalid order id: {}", order_id));
        return Err(api_error(StatusCode::BAD_REQUEST, "INVALID_ORDER_ID", &e));
    }

    state
        .payment_service
        .verify_payment(&order_id)
        .await
        .map(|view_url| Redirect::to(&view_url))
        .map_err(|e| {
            error!("Payment verification error: {}", e);
            let status = match e {
                DomainError::OrderNotFound(_) => StatusCode::NOT_FOUND,
                DomainError::MissingPaymentId(_) => StatusCode::CONFLICT,
                DomainError::ProcessorError(_) | DomainError::HttpError(_) => {
                    StatusCode::BAD_GATEWAY
                }
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            api_error(status, "VERIFY_ERROR", &e)
        })
}

/// 健康检查
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}
