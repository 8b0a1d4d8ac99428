use crate::domain::basket::BasketLine;
use serde::Serialize;

/// 账单地址
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingInformation {
    pub address: String,
    pub city: String,
    /// ISO 3166-1 alpha-3
    pub country: String,
}

/// 收货地址
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryInformation {
    pub address: String,
    pub city: String,
    /// ISO 3166-1 alpha-3
    pub country: String,
    pub delivery_type: String,
}

/// 顾客信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub email: String,
    pub phone_number: String,
    pub delivery_information: DeliveryInformation,
    pub billing_information: BillingInformation,
}

/// 发往 OderoPay 的创建支付请求
///
/// 每次结账构建一次，不持久化。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    /// 两位小数字符串，等于各行合计之和
    pub amount: String,
    pub currency: String,
    pub ext_order_id: String,
    pub ext_order_url: String,
    pub return_url: String,
    pub success_url: String,
    pub fail_url: String,
    pub merchant_id: String,
    pub customer: Customer,
    pub products: Vec<BasketLine>,
}
