use crate::application::reconciler::{ReconcileOutcome, StatusReconciler};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::security::{CALLBACK_ACTION, ReplayTokens, Secret, sanitize_key};
use crate::ports::{OderoPayPort, OrderStorePort, WebhookMessage};
use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// 回调请求携带的凭证
#[derive(Debug, Clone, Copy, Default)]
pub struct WebhookCredentials<'a> {
    /// 防重放令牌（`_token`）
    pub token: Option<&'a str>,
    pub secret_key: Option<&'a str>,
}

/// 回调处理结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    Processed(ReconcileOutcome),
    /// 通知中的订单不存在
    OrderNotFound(String),
    /// 未识别的消息类型
    Unrecognized(String),
}

/// 回调入口
///
/// 先校验令牌和密钥，两者都通过后才解析请求体。
pub struct NotificationGate<P: OderoPayPort, S: OrderStorePort> {
    processor: Arc<P>,
    store: Arc<S>,
    reconciler: Arc<StatusReconciler<S>>,
    secret: Secret,
    tokens: ReplayTokens,
}

impl<P: OderoPayPort, S: OrderStorePort> NotificationGate<P, S> {
    pub fn new(
        processor: Arc<P>,
        store: Arc<S>,
        reconciler: Arc<StatusReconciler<S>>,
        secret: Secret,
        tokens: ReplayTokens,
    ) -> Self {
        Self {
            processor,
            store,
            reconciler,
            secret,
            tokens,
        }
    }

    /// 校验回调凭证，失败时不区分是哪一项
    pub fn authorize(&self, credentials: &WebhookCredentials<'_>) -> DomainResult<()> {
        let token = credentials.token.unwrap_or_default();
        if !self.tokens.verify(token, CALLBACK_ACTION, Utc::now()) {
            error!(severity = "critical", "CALLBACK ATTACK! invalid replay token");
            return Err(DomainError::SecurityCheckFailed);
        }

        let secret_key = sanitize_key(credentials.secret_key.unwrap_or_default());
        if !self.secret.matches(&secret_key) {
            error!(severity = "critical", "CALLBACK ATTACK! secret key mismatch");
            return Err(DomainError::SecurityCheckFailed);
        }

        Ok(())
    }

    /// 处理回调通知
    pub async fn handle(
        &self,
        credentials: &WebhookCredentials<'_>,
        body: &str,
    ) -> DomainResult<WebhookOutcome> {
        self.authorize(credentials)?;

        let payload: Value = serde_json::from_str(body)?;
        info!("Received payload: {}", payload);

        match self.processor.decode_webhook(&payload).await? {
            WebhookMessage::Payment(notification) => {
                let Some(order) = self.store.find_by_id(&notification.ext_order_id).await? else {
                    warn!(
                        "Notification for unknown order {}, ignoring",
                        notification.ext_order_id
                    );
                    return Ok(WebhookOutcome::OrderNotFound(notification.ext_order_id));
                };

                let outcome = self
                    .reconciler
                    .reconcile(&order, &notification.status, notification.payment_id.as_deref())
                    .await?;
                debug!("Notification for order {} reconciled: {:?}", order.id, outcome);

                Ok(WebhookOutcome::Processed(outcome))
            }
            WebhookMessage::Unknown { kind } => {
                info!("Unrecognized notification type: {:?}", kind);
                Ok(WebhookOutcome::Unrecognized(kind))
            }
        }
    }
}
