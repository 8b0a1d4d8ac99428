use crate::domain::errors::{DomainError, DomainResult};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// 支付平台上报的支付状态
///
/// 平台只约定 `INITIATED` 和 `SUCCESS` 两个值，其余一律视为失败，
/// 原始字符串保留在 `Failed` 中用于日志。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PaymentStatus {
    /// 已发起，顾客尚未完成支付
    Initiated,
    /// 支付成功
    Success,
    /// 支付失败或其他状态
    Failed(String),
}

impl From<String> for PaymentStatus {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_uppercase().as_str() {
            "INITIATED" => PaymentStatus::Initiated,
            "SUCCESS" => PaymentStatus::Success,
            _ => PaymentStatus::Failed(value),
        }
    }
}

impl From<&str> for PaymentStatus {
    fn from(value: &str) -> Self {
        PaymentStatus::from(value.to_string())
    }
}

impl From<PaymentStatus> for String {
    fn from(value: PaymentStatus) -> Self {
        value.to_string()
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentStatus::Initiated => write!(f, "INITIATED"),
            PaymentStatus::Success => write!(f, "SUCCESS"),
            PaymentStatus::Failed(raw) => write!(f, "{}", raw),
        }
    }
}

/// 宿主平台的订单状态（例如 `on-hold`、`processing`）
///
/// 目标状态由店铺配置决定，因此这里不做枚举。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderStatus(String);

impl OrderStatus {
    pub fn new(slug: impl Into<String>) -> Self {
        let slug = slug.into();
        // 宿主平台的状态键带 "wc-" 前缀，订单上存的是去掉前缀的值
        let slug = slug.strip_prefix("wc-").map(str::to_string).unwrap_or(slug);
        Self(slug)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 货币金额（以分为单位，避免浮点数精度问题）
///
/// 序列化为两位小数的字符串，例如 `"24.38"`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Money {
    /// 金额（分）
    pub amount_cents: i64,
}

impl Money {
    pub const ZERO: Money = Money { amount_cents: 0 };

    /// 创建新的金额对象（单位：分）
    pub fn from_cents(cents: i64) -> Self {
        Self { amount_cents: cents }
    }

    /// 从十进制金额创建，四舍五入（远离零）到两位小数
    pub fn from_decimal(amount: Decimal) -> DomainResult<Self> {
        let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        (rounded * Decimal::ONE_HUNDRED)
            .to_i64()
            .map(Self::from_cents)
            .ok_or_else(|| DomainError::ValidationError(format!("Amount out of range: {}", amount)))
    }

    /// 转换为分
    pub fn to_cents(&self) -> i64 {
        self.amount_cents
    }

    /// 转换为十进制金额
    pub fn to_decimal(&self) -> Decimal {
        Decimal::new(self.amount_cents, 2)
    }

    /// 单价乘以数量，溢出时返回校验错误
    pub fn checked_times(&self, quantity: i64) -> DomainResult<Self> {
        self.amount_cents
            .checked_mul(quantity)
            .map(Self::from_cents)
            .ok_or_else(|| {
                DomainError::ValidationError(format!("Amount out of range: {} x {}", self, quantity))
            })
    }

    /// 两个金额相加，溢出时返回校验错误
    pub fn checked_add(&self, rhs: Money) -> DomainResult<Self> {
        self.amount_cents
            .checked_add(rhs.amount_cents)
            .map(Self::from_cents)
            .ok_or_else(|| {
                DomainError::ValidationError(format!("Amount out of range: {} + {}", self, rhs))
            })
    }

    pub fn is_positive(&self) -> bool {
        self.amount_cents > 0
    }

    pub fn is_zero(&self) -> bool {
        self.amount_cents == 0
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.amount_cents < 0 { "-" } else { "" };
        let abs = self.amount_cents.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_money_rounds_half_up() {
        assert_eq!(Money::from_decimal(dec!(1.005)).unwrap().to_cents(), 101);
        assert_eq!(Money::from_decimal(dec!(1.004)).unwrap().to_cents(), 100);
        assert_eq!(Money::from_decimal(dec!(8.264462)).unwrap().to_cents(), 826);
    }

    #[test]
    fn test_money_display() {
        assert_eq!(Money::from_cents(2438).to_string(), "24.38");
        assert_eq!(Money::from_cents(5).to_string(), "0.05");
        assert_eq!(Money::from_cents(-5000).to_string(), "-50.00");
        assert_eq!(Money::ZERO.to_string(), "0.00");
    }

    #[test]
    fn test_money_checked_arithmetic() {
        let price = Money::from_cents(826);

        assert_eq!(price.checked_times(3).unwrap(), Money::from_cents(2478));
        assert_eq!(price.checked_times(-1).unwrap(), Money::from_cents(-826));
        assert_eq!(price.checked_add(Money::from_cents(174)).unwrap(), Money::from_cents(1000));
    }

    #[test]
    fn test_money_overflow_is_a_validation_error() {
        let huge = Money::from_cents(i64::MAX / 2);

        assert!(matches!(huge.checked_times(3), Err(DomainError::ValidationError(_))));
        assert!(matches!(
            Money::from_cents(i64::MAX).checked_add(Money::from_cents(1)),
            Err(DomainError::ValidationError(_))
        ));
        assert!(matches!(
            Money::from_cents(i64::MIN).checked_times(-1),
            Err(DomainError::ValidationError(_))
        ));
    }

    #[test]
    fn test_money_serializes_as_fixed_string() {
        let json = serde_json::to_string(&Money::from_cents(1000)).unwrap();
        assert_eq!(json, "\"10.00\"");
    }

    #[test]
    fn test_payment_status_parsing() {
        assert_eq!(PaymentStatus::from("INITIATED"), PaymentStatus::Initiated);
        assert_eq!(PaymentStatus::from("success"), PaymentStatus::Success);
        assert_eq!(
            PaymentStatus::from("FAILED"),
            PaymentStatus::Failed("FAILED".to_string())
        );

        let status: PaymentStatus = serde_json::from_str("\"SUCCESS\"").unwrap();
        assert_eq!(status, PaymentStatus::Success);
    }

    #[test]
    fn test_order_status_strips_platform_prefix() {
        assert_eq!(OrderStatus::new("wc-on-hold").as_str(), "on-hold");
        assert_eq!(OrderStatus::new("processing").as_str(), "processing");
    }
}
