use crate::domain::PaymentRequest;
use crate::domain::errors::DomainResult;
use crate::domain::value_objects::PaymentStatus;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// 创建支付成功后平台返回的支付意图
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub payment_id: String,
    /// 托管支付页地址
    pub redirect_url: String,
}

/// 创建支付的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreatePaymentOutcome {
    Created(PaymentIntent),
    /// 平台拒绝，消息可直接展示给顾客
    Rejected { message: String },
}

/// 按支付ID查询到的支付
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessorPayment {
    pub payment_id: String,
    pub status: PaymentStatus,
    pub raw: serde_json::Value,
}

/// 支付回调通知
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentNotification {
    pub ext_order_id: String,
    pub payment_id: Option<String>,
    pub status: PaymentStatus,
    pub raw: serde_json::Value,
}

/// 解码后的回调消息
#[derive(Debug, Clone, PartialEq)]
pub enum WebhookMessage {
    Payment(PaymentNotification),
    /// 未识别的消息类型
    Unknown { kind: String },
}

/// OderoPay 端口接口
#[async_trait]
pub trait OderoPayPort: Send + Sync + 'static {
    /// 创建支付
    async fn create_payment(&self, request: &PaymentRequest) -> DomainResult<CreatePaymentOutcome>;

    /// 查询支付
    async fn fetch_payment(&self, payment_id: &str) -> DomainResult<ProcessorPayment>;

    /// 解码回调通知
    async fn decode_webhook(&self, payload: &serde_json::Value) -> DomainResult<WebhookMessage>;
}
