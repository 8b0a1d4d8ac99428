use crate::domain::entities::Order;
use crate::domain::errors::DomainResult;
use crate::domain::value_objects::Money;
use serde::Serialize;

/// 购物篮中的一行（商品、运费、税或折扣）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BasketLine {
    pub ext_id: String,
    pub name: String,
    pub price: Money,
    /// 折扣行为 -1，其余为正数
    pub quantity: i64,
    pub total: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl BasketLine {
    fn new(
        ext_id: String,
        name: String,
        price: Money,
        quantity: i64,
        image_url: Option<String>,
    ) -> DomainResult<Self> {
        Ok(Self {
            total: price.checked_times(quantity)?,
            ext_id,
            name,
            price,
            quantity,
            image_url,
        })
    }
}

/// 合成行使用的图片
#[derive(Debug, Clone, Default)]
pub struct BasketImages {
    pub shipping: Option<String>,
    pub tax: Option<String>,
    pub discount: Option<String>,
}

/// 购物篮及其合计
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Basket {
    pub lines: Vec<BasketLine>,
    pub total: Money,
}

impl Basket {
    /// 申报金额，两位小数字符串
    pub fn declared_amount(&self) -> String {
        self.total.to_string()
    }
}

pub const SHIPPING_TAG: &str = "shipping";
pub const DISCOUNT_TAG: &str = "DISCOUNT";

/// 把订单拆成购物篮行
///
/// 合计由各行合计相加得出，不读取订单自身的总额。
pub fn build_basket(order: &Order, images: &BasketImages) -> DomainResult<Basket> {
    let mut lines = Vec::with_capacity(order.items.len() + order.tax_totals.len() + 2);

    for item in &order.items {
        let price = Money::from_decimal(item.unit_price_excl_tax)?;
        lines.push(BasketLine::new(
            item.product_id.clone(),
            item.name.clone(),
            price,
            i64::from(item.quantity),
            item.image_url.clone(),
        )?);
    }

    let shipping = Money::from_decimal(order.shipping_total)?;
    if shipping.is_positive() {
        let method = order
            .shipping_method
            .clone()
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| SHIPPING_TAG.to_string());
        lines.push(BasketLine::new(
            method.clone(),
            method,
            shipping,
            1,
            images.shipping.clone(),
        )?);
    }

    for tax in &order.tax_totals {
        let amount = Money::from_decimal(tax.amount)?;
        if amount.is_zero() {
            continue;
        }
        lines.push(BasketLine::new(
            tax.id.clone(),
            tax.label.clone(),
            amount,
            1,
            images.tax.clone(),
        )?);
    }

    let discount = Money::from_decimal(order.discount_total)?;
    if discount.is_positive() {
        lines.push(BasketLine::new(
            DISCOUNT_TAG.to_string(),
            DISCOUNT_TAG.to_string(),
            discount,
            -1,
            images.discount.clone(),
        )?);
    }

    let total = lines
        .iter()
        .try_fold(Money::ZERO, |sum, line| sum.checked_add(line.total))?;

    Ok(Basket { lines, total })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::fixtures::sample_order;
    use crate::domain::errors::DomainError;
    use crate::domain::entities::{OrderItem, TaxTotal};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn totals(basket: &Basket) -> Vec<String> {
        basket.lines.iter().map(|l| l.total.to_string()).collect()
    }

    #[test]
    fn test_items_shipping_and_tax() {
        let basket = build_basket(&sample_order(), &BasketImages::default()).unwrap();

        assert_eq!(totals(&basket), vec!["10.00", "10.00", "3.00", "1.38"]);
        assert_eq!(basket.declared_amount(), "24.38");
        assert_eq!(basket.lines[2].ext_id, "Flat rate");
        assert_eq!(basket.lines[3].ext_id, "RO-VAT");
    }

    #[test]
    fn test_discount_equal_to_subtotal_gives_zero() {
        let mut order = sample_order();
        order.items = vec![OrderItem {
            product_id: "7".to_string(),
            name: "Lamp".to_string(),
            unit_price_excl_tax: dec!(50),
            quantity: 1,
            image_url: None,
        }];
        order.shipping_total = Decimal::ZERO;
        order.tax_totals.clear();
        order.discount_total = dec!(50);

        let basket = build_basket(&order, &BasketImages::default()).unwrap();
        let discount = basket.lines.last().unwrap();

        assert_eq!(discount.ext_id, DISCOUNT_TAG);
        assert_eq!(discount.quantity, -1);
        assert_eq!(discount.price.to_string(), "50.00");
        assert_eq!(discount.total.to_string(), "-50.00");
        assert_eq!(basket.declared_amount(), "0.00");
    }

    #[test]
    fn test_zero_shipping_and_zero_tax_are_skipped() {
        let mut order = sample_order();
        order.shipping_total = Decimal::ZERO;
        order.tax_totals.push(TaxTotal {
            id: "ZERO".to_string(),
            label: "Zero rate".to_string(),
            amount: dec!(0.001),
        });
        order.tax_totals[0].amount = Decimal::ZERO;

        let basket = build_basket(&order, &BasketImages::default()).unwrap();

        assert_eq!(basket.lines.len(), 2);
        assert_eq!(basket.declared_amount(), "20.00");
    }

    #[test]
    fn test_multiple_tax_rates_are_additive() {
        let mut order = sample_order();
        order.tax_totals.push(TaxTotal {
            id: "RO-ECO".to_string(),
            label: "Eco tax".to_string(),
            amount: dec!(0.50),
        });

        let basket = build_basket(&order, &BasketImages::default()).unwrap();

        assert_eq!(basket.lines.len(), 5);
        assert_eq!(basket.declared_amount(), "24.88");
    }

    #[test]
    fn test_unit_price_rounded_before_multiplying() {
        let mut order = sample_order();
        order.items = vec![OrderItem {
            product_id: "9".to_string(),
            name: "Tea".to_string(),
            unit_price_excl_tax: dec!(8.264462),
            quantity: 3,
            image_url: None,
        }];
        order.shipping_total = Decimal::ZERO;
        order.tax_totals.clear();

        let basket = build_basket(&order, &BasketImages::default()).unwrap();

        assert_eq!(basket.lines[0].price.to_string(), "8.26");
        assert_eq!(basket.declared_amount(), "24.78");
    }

    #[test]
    fn test_declared_amount_matches_line_sum() {
        let mut order = sample_order();
        order.discount_total = dec!(4.555);
        order.shipping_total = dec!(2.499);

        let basket = build_basket(&order, &BasketImages::default()).unwrap();
        let sum: i64 = basket.lines.iter().map(|l| l.total.to_cents()).sum();

        assert_eq!(sum, basket.total.to_cents());
        assert_eq!(basket.declared_amount(), "19.32");
    }

    #[test]
    fn test_overflowing_amounts_are_rejected() {
        let mut order = sample_order();
        order.items[0].unit_price_excl_tax = Decimal::from(i64::MAX / 100);
        order.items[0].quantity = 2;

        let line_overflow = build_basket(&order, &BasketImages::default());

        order.items[0].quantity = 1;
        order.items[1].unit_price_excl_tax = Decimal::from(i64::MAX / 100);
        order.items[1].quantity = 1;

        let sum_overflow = build_basket(&order, &BasketImages::default());

        assert!(matches!(line_overflow, Err(DomainError::ValidationError(_))));
        assert!(matches!(sum_overflow, Err(DomainError::ValidationError(_))));
    }

    #[test]
    fn test_synthetic_lines_carry_images() {
        let mut order = sample_order();
        order.discount_total = dec!(1);
        let images = BasketImages {
            shipping: Some("https://shop.example/assets/images/cargo.webp".to_string()),
            tax: Some("https://shop.example/assets/images/tax.png".to_string()),
            discount: Some("https://shop.example/assets/images/voucher.png".to_string()),
        };

        let basket = build_basket(&order, &images).unwrap();

        assert_eq!(basket.lines[2].image_url, images.shipping);
        assert_eq!(basket.lines[3].image_url, images.tax);
        assert_eq!(basket.lines[4].image_url, images.discount);
    }
}
