use crate::domain::basket::Basket;
use crate::domain::entities::{Address, Order};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::payment_request::{
    BillingInformation, Customer, DeliveryInformation, PaymentRequest,
};
use crate::infrastructure::config::GatewayConfig;
use crate::ports::country_directory_port::{Country, CountryDirectoryPort};
use std::sync::Arc;

/// 没有配送方式时的配送类型
pub const NO_SHIPPING: &str = "no-shipping";

/// 支付验证回调路径前缀
pub const VERIFY_PATH_PREFIX: &str = "/wc/odero";

/// 给电话号码加上国际区号
///
/// 去掉已有的 `+区号`、`区号` 或开头的 `0` 后再加 `+区号`，重复调用结果不变。
pub fn normalize_phone(phone: &str, calling_code: &str) -> String {
    let code = calling_code.trim().trim_start_matches('+');
    let phone = phone.trim();
    if code.is_empty() {
        return phone.to_string();
    }

    let national = phone
        .strip_prefix('+')
        .and_then(|rest| rest.strip_prefix(code))
        .or_else(|| phone.strip_prefix(code))
        .or_else(|| phone.strip_prefix('0'))
        .unwrap_or(phone);

    format!("+{}{}", code, national)
}

/// 拼接地址两行，以单个空格分隔
fn join_street(first: &str, second: &str) -> String {
    [first.trim(), second.trim()]
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
}

fn prefer<'a>(primary: &'a str, fallback: &'a str) -> &'a str {
    if primary.trim().is_empty() { fallback } else { primary }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// 支付请求组装器
pub struct PaymentRequestAssembler {
    countries: Arc<dyn CountryDirectoryPort>,
    config: Arc<GatewayConfig>,
}

impl PaymentRequestAssembler {
    pub fn new(countries: Arc<dyn CountryDirectoryPort>, config: Arc<GatewayConfig>) -> Self {
        Self { countries, config }
    }

    /// 解析国家，订单未填写时使用店铺默认国家
    fn resolve_country(&self, address: &Address) -> DomainResult<Country> {
        let code = non_empty(&address.country)
            .map(str::to_string)
            .unwrap_or_else(|| self.config.default_country());

        self.countries
            .lookup(&code)
            .ok_or(DomainError::UnknownCountry(code))
    }

    /// 回调地址，同时用作 return / success / fail 地址
    pub fn callback_url(&self, order: &Order, token: &str) -> String {
        format!(
            "{}{}/{}/verify?_token={}",
            self.config.site_url, VERIFY_PATH_PREFIX, order.order_number, token
        )
    }

    pub fn assemble(&self, order: &Order, basket: Basket, token: &str) -> DomainResult<PaymentRequest> {
        let billing_country = self.resolve_country(&order.billing)?;
        let shipping_country = self.resolve_country(&order.shipping)?;
        let (billing, shipping) = (&order.billing, &order.shipping);

        let billing_information = BillingInformation {
            address: join_street(
                prefer(&billing.address_1, &shipping.address_1),
                prefer(&billing.address_2, &shipping.address_2),
            ),
            city: billing.city.trim().to_string(),
            country: billing_country.alpha3.clone(),
        };

        let delivery_information = DeliveryInformation {
            address: join_street(
                prefer(&shipping.address_1, &billing.address_1),
                prefer(&shipping.address_2, &billing.address_2),
            ),
            city: prefer(&shipping.city, &billing.city).trim().to_string(),
            country: shipping_country.alpha3,
            delivery_type: non_empty(&order.shipping_method)
                .unwrap_or(NO_SHIPPING)
                .to_string(),
        };

        let phone = non_empty(&order.billing_phone)
            .or_else(|| non_empty(&order.shipping_phone))
            .map(|phone| normalize_phone(phone, &billing_country.calling_code))
            .unwrap_or_default();

        let customer = Customer {
            email: non_empty(&order.billing_email).unwrap_or_default().to_string(),
            phone_number: phone,
            delivery_information,
            billing_information,
        };

        let callback_url = self.callback_url(order, token);

        Ok(PaymentRequest {
            amount: basket.declared_amount(),
            currency: order.currency.to_ascii_uppercase(),
            ext_order_id: order.id.clone(),
            ext_order_url: callback_url.clone(),
            return_url: callback_url.clone(),
            success_url: callback_url.clone(),
            fail_url: callback_url,
            merchant_id: self.config.active_credentials().merchant_id.clone(),
            customer,
            products: basket.lines,
        })
    }
}
