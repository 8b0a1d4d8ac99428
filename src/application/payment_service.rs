use crate::application::assembler::PaymentRequestAssembler;
use crate::application::dto::{CheckoutResponse, GatewayStatusResponse};
use crate::application::reconciler::{ReconcileOutcome, StatusReconciler};
use crate::domain::basket::build_basket;
use crate::domain::entities::{GATEWAY_ID, Order};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::security::{CALLBACK_ACTION, ReplayTokens};
use crate::infrastructure::config::GatewayConfig;
use crate::ports::{CountryDirectoryPort, CreatePaymentOutcome, OderoPayPort, OrderStorePort};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// 支付服务
pub struct PaymentService<P: OderoPayPort, S: OrderStorePort> {
    processor: Arc<P>,
    store: Arc<S>,
    reconciler: Arc<StatusReconciler<S>>,
    assembler: PaymentRequestAssembler,
    config: Arc<GatewayConfig>,
    tokens: ReplayTokens,
}

impl<P: OderoPayPort, S: OrderStorePort> PaymentService<P, S> {
    pub fn new(
        processor: Arc<P>,
        store: Arc<S>,
        reconciler: Arc<StatusReconciler<S>>,
        countries: Arc<dyn CountryDirectoryPort>,
        config: Arc<GatewayConfig>,
    ) -> Self {
        Self {
            processor,
            store,
            reconciler,
            assembler: PaymentRequestAssembler::new(countries, config.clone()),
            tokens: ReplayTokens::new(config.token_key()),
            config,
        }
    }

    /// 网关状态及后台提示
    pub fn gateway_status(&self) -> GatewayStatusResponse {
        let config = &self.config;

        GatewayStatusResponse {
            id: GATEWAY_ID.to_string(),
            title: config.title.clone(),
            description: config.description.clone(),
            enabled: config.enabled,
            available: config.is_available(),
            sandbox: config.sandbox,
            needs_setup: config.needs_setup(),
            notices: config
                .check_requirements()
                .iter()
                .map(|issue| issue.message().to_string())
                .collect(),
        }
    }

    /// 结账：创建 OderoPay 支付并返回支付页地址
    pub async fn process_payment(&self, order_id: &str) -> DomainResult<CheckoutResponse> {
        info!("Processing payment for order: {}", order_id);

        // 1. 检查网关是否可用
        if !self.config.is_available() {
            let issues: Vec<&str> = self
                .config
                .check_requirements()
                .iter()
                .map(|issue| issue.message())
                .collect();
            let reason = if issues.is_empty() {
                "OderoPay is disabled".to_string()
            } else {
                issues.join(" ")
            };
            return Err(DomainError::GatewayUnavailable(reason));
        }

        // 2. 查找订单并设置支付方式
        let order = self
            .store
            .find_by_id(order_id)
            .await?
            .ok_or_else(|| DomainError::OrderNotFound(order_id.to_string()))?;
        self.store.set_payment_method(&order.id, GATEWAY_ID).await?;

        // 3. 组装支付请求，地址无法解析时订单状态不变
        let basket = build_basket(&order, &self.config.basket_images())?;
        let token = self.tokens.issue(CALLBACK_ACTION, Utc::now());
        let request = self.assembler.assemble(&order, basket, &token)?;
        debug!("OderoPay payment request: {}", serde_json::to_string(&request)?);

        // 4. 跳转前将订单置为等待支付
        self.store
            .update_status(&order.id, &self.config.statuses.on_process, "Awaiting payment.")
            .await?;

        // 5. 调用 OderoPay 创建支付
        let intent = match self.processor.create_payment(&request).await {
            Ok(CreatePaymentOutcome::Created(intent)) => intent,
            Ok(CreatePaymentOutcome::Rejected { message }) => {
                warn!("OderoPay rejected payment for order {}: {}", order.id, message);
                return Err(DomainError::PaymentRejected(message));
            }
            Err(e) => {
                error!("Payment creation failed for order {}: {}", order.id, e);
                return Err(e);
            }
        };

        // 重新结账会创建新的支付，以最新的支付ID为准
        self.store
            .replace_payment_id(&order.id, &intent.payment_id)
            .await?;

        info!(
            "Payment created for order {}: {}",
            order.id, intent.payment_id
        );
        Ok(CheckoutResponse::success(intent.redirect_url))
    }

    /// 顾客从支付页返回后主动查询支付状态，返回订单详情页地址
    pub async fn verify_payment(&self, order_id: &str) -> DomainResult<String> {
        info!("Verifying payment for order: {}", order_id);

        let order = self.find_for_verification(order_id).await?;
        let payment_id = order
            .odero_payment_id()
            .ok_or_else(|| DomainError::MissingPaymentId(order.id.clone()))?;

        let payment = self.processor.fetch_payment(payment_id).await?;
        info!(
            "Order update on redirect, OderoPay payment: {}",
            payment.raw
        );

        let outcome = self
            .reconciler
            .reconcile(&order, &payment.status, Some(payment.payment_id.as_str()))
            .await?;
        if outcome == ReconcileOutcome::Skipped {
            debug!("Order {} is not paid with OderoPay, nothing to verify", order.id);
        }

        Ok(order.view_url)
    }

    /// 回调地址中是订单号，找不到时再按ID查找
    async fn find_for_verification(&self, order_id: &str) -> DomainResult<Order> {
        if let Some(order) = self.store.find_by_order_number(order_id).await? {
            return Ok(order);
        }

        self.store
            .find_by_id(order_id)
            .await?
            .ok_or_else(|| DomainError::OrderNotFound(order_id.to_string()))
    }
}
