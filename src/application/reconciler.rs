use crate::domain::entities::{GATEWAY_ID, Order};
use crate::domain::errors::DomainResult;
use crate::domain::value_objects::PaymentStatus;
use crate::infrastructure::config::GatewayConfig;
use crate::ports::OrderStorePort;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// 对账结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// 订单不是本网关支付的，忽略
    Skipped,
    /// 平台仍为 INITIATED，订单保持等待状态
    Pending,
    Succeeded {
        status_changed: bool,
        stock_reduced: bool,
    },
    Failed {
        status_changed: bool,
    },
    /// 订单已支付成功，忽略后到的失败状态
    AlreadyPaid,
}

/// 订单状态对账
pub struct StatusReconciler<S: OrderStorePort> {
    store: Arc<S>,
    config: Arc<GatewayConfig>,
}

impl<S: OrderStorePort> StatusReconciler<S> {
    pub fn new(store: Arc<S>, config: Arc<GatewayConfig>) -> Self {
        Self { store, config }
    }

    /// 按平台上报的支付状态更新订单
    pub async fn reconcile(
        &self,
        order: &Order,
        status: &PaymentStatus,
        payment_id: Option<&str>,
    ) -> DomainResult<ReconcileOutcome> {
        if !order.is_paid_with(GATEWAY_ID) {
            info!(
                "Callback received but skipped: order {} paid with {:?}",
                order.id, order.payment_method
            );
            return Ok(ReconcileOutcome::Skipped);
        }

        if let Some(payment_id) = payment_id.filter(|id| !id.is_empty()) {
            if !self.store.add_payment_id(&order.id, payment_id).await? {
                debug!(
                    "Order {} keeps payment id {:?}, ignoring {}",
                    order.id,
                    order.odero_payment_id(),
                    payment_id
                );
            }
        }

        let statuses = &self.config.statuses;
        match status {
            PaymentStatus::Initiated => {
                debug!("Payment for order {} still initiated", order.id);
                Ok(ReconcileOutcome::Pending)
            }
            PaymentStatus::Success => {
                let status_changed = self
                    .store
                    .update_status(&order.id, &statuses.on_success, "Payment Success.")
                    .await?;
                let stock_reduced = self.store.reduce_stock_once(&order.id).await?;

                info!(
                    "Order update (success): {} -> {} (status changed: {}, stock reduced: {})",
                    order.id, statuses.on_success, status_changed, stock_reduced
                );
                Ok(ReconcileOutcome::Succeeded {
                    status_changed,
                    stock_reduced,
                })
            }
            PaymentStatus::Failed(raw) => {
                if order.status == statuses.on_success {
                    warn!(
                        "Order {} already paid, ignoring payment status {}",
                        order.id, raw
                    );
                    return Ok(ReconcileOutcome::AlreadyPaid);
                }

                let status_changed = self
                    .store
                    .update_status(&order.id, &statuses.on_failed, "Payment failed.")
                    .await?;

                error!(
                    "Order update (failed): {} -> {} (payment status {})",
                    order.id, statuses.on_failed, raw
                );
                Ok(ReconcileOutcome::Failed { status_changed })
            }
        }
    }
}
