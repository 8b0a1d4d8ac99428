use crate::domain::value_objects::OrderStatus;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 本网关在宿主平台上的支付方式标识
pub const GATEWAY_ID: &str = "oderopay";

/// 订单元数据中保存 OderoPay 支付ID 的键
pub const ODERO_PAYMENT_KEY: &str = "odero_payment_id";

/// 订单地址
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub address_1: String,
    pub address_2: String,
    pub city: String,
    /// ISO 3166-1 alpha-2，可能为空
    pub country: Option<String>,
}

/// 订单商品行
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: String,
    pub name: String,
    /// 不含税单价
    pub unit_price_excl_tax: Decimal,
    pub quantity: u32,
    pub image_url: Option<String>,
}

/// 按税率汇总的税额
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxTotal {
    pub id: String,
    pub label: String,
    pub amount: Decimal,
}

/// 订单备注（状态变更时写入）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderNote {
    pub note: String,
    pub created_at: DateTime<Utc>,
}

/// 宿主平台订单
///
/// 订单由宿主平台维护，网关只读取它，唯二的写操作是附加支付ID和状态流转，
/// 都经由 `OrderStorePort` 完成。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// 订单ID（内部）
    pub id: String,

    /// 面向顾客的订单号
    pub order_number: String,

    /// ISO 4217 货币代码
    pub currency: String,

    /// 当前订单状态
    pub status: OrderStatus,

    /// 支付方式标识
    pub payment_method: Option<String>,

    pub billing: Address,
    pub shipping: Address,
    pub billing_email: Option<String>,
    pub billing_phone: Option<String>,
    pub shipping_phone: Option<String>,

    /// 配送方式名称，没有配送时为空
    pub shipping_method: Option<String>,

    pub items: Vec<OrderItem>,
    pub shipping_total: Decimal,
    pub tax_totals: Vec<TaxTotal>,
    pub discount_total: Decimal,

    /// 顾客查看订单的页面
    pub view_url: String,

    /// 订单元数据
    pub meta: HashMap<String, String>,

    /// 是否已扣减库存
    pub stock_reduced: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// 订单是否由本网关支付
    pub fn is_paid_with(&self, gateway_id: &str) -> bool {
        self.payment_method.as_deref() == Some(gateway_id)
    }

    /// 已关联的 OderoPay 支付ID
    pub fn odero_payment_id(&self) -> Option<&str> {
        self.meta
            .get(ODERO_PAYMENT_KEY)
            .map(String::as_str)
            .filter(|id| !id.is_empty())
    }

    /// 关联支付ID，先写入者生效
    ///
    /// 返回是否发生了写入。
    pub fn attach_payment_id(&mut self, payment_id: &str) -> bool {
        if payment_id.is_empty() || self.odero_payment_id().is_some() {
            return false;
        }
        self.meta
            .insert(ODERO_PAYMENT_KEY.to_string(), payment_id.to_string());
        self.updated_at = Utc::now();
        true
    }

    /// 用新创建的支付ID替换旧值，空值不写入
    pub fn replace_payment_id(&mut self, payment_id: &str) {
        if payment_id.is_empty() {
            return;
        }
        self.meta
            .insert(ODERO_PAYMENT_KEY.to_string(), payment_id.to_string());
        self.updated_at = Utc::now();
    }

    /// 变更状态，已处于目标状态时返回 false
    pub fn transition_to(&mut self, status: &OrderStatus) -> bool {
        if &self.status == status {
            return false;
        }
        self.status = status.clone();
        self.updated_at = Utc::now();
        true
    }

    /// 标记库存已扣减，只有第一次返回 true
    pub fn mark_stock_reduced(&mut self) -> bool {
        if self.stock_reduced {
            return false;
        }
        self.stock_reduced = true;
        self.updated_at = Utc::now();
        true
    }
}
