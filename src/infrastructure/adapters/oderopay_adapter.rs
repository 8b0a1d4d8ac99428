use crate::domain::PaymentRequest;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::value_objects::PaymentStatus;
use crate::infrastructure::config::GatewayConfig;
use crate::ports::oderopay_port::*;
use async_trait::async_trait;
use base64::Engine;
use hmac::{Hmac, Mac};
use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use sha2::Sha256;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

type HmacSha256 = Hmac<Sha256>;

/// 请求超时
const TIMEOUT: Duration = Duration::from_secs(15);

const USER_AGENT: &str = concat!("oderopay-gateway/", env!("CARGO_PKG_VERSION"));

/// OderoPay 适配器实现
#[derive(Clone)]
pub struct OderoPayAdapter {
    config: Arc<GatewayConfig>,
    client: Client,
}

impl OderoPayAdapter {
    pub fn new(config: Arc<GatewayConfig>) -> DomainResult<Self> {
        let client = Client::builder()
            .timeout(TIMEOUT)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self { config, client })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_base_url(), path)
    }

    /// 生成签名：HMAC-SHA256(商户令牌, 时间戳\n请求ID\n请求体)
    fn build_signature(&self, timestamp: &str, request_id: &str, body: &str) -> DomainResult<String> {
        let token = &self.config.active_credentials().merchant_token;
        let mut mac = HmacSha256::new_from_slice(token.as_bytes())
            .map_err(|e| DomainError::CryptoError(format!("HMAC init error: {}", e)))?;
        mac.update(format!("{}\n{}\n{}", timestamp, request_id, body).as_bytes());

        Ok(base64::engine::general_purpose::STANDARD.encode(mac.finalize().into_bytes()))
    }

    /// 添加认证头
    fn authorize(&self, builder: RequestBuilder, body: &str) -> DomainResult<RequestBuilder> {
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let request_id = uuid::Uuid::new_v4().to_string();
        let signature = self.build_signature(&timestamp, &request_id, body)?;

        Ok(builder
            .header("X-Merchant-Id", &self.config.active_credentials().merchant_id)
            .header("X-Merchant-Name", &self.config.merchant_name)
            .header("X-Request-Id", request_id)
            .header("X-Timestamp", timestamp)
            .header("X-Signature", signature)
            .header("Accept", "application/json"))
    }
}

fn message_of(body: &Value) -> Option<String> {
    body["message"]
        .as_str()
        .or_else(|| body["error"].as_str())
        .map(str::to_string)
        .filter(|m| !m.is_empty())
}

fn parse_create_response(body: &Value) -> CreatePaymentOutcome {
    let rejected = || CreatePaymentOutcome::Rejected {
        message: message_of(body).unwrap_or_else(|| "Payment could not be created".to_string()),
    };

    if body["success"].as_bool() == Some(false) {
        return rejected();
    }

    let data = &body["data"];
    match (data["paymentId"].as_str(), data["url"].as_str()) {
        (Some(payment_id), Some(url)) if !payment_id.is_empty() && !url.is_empty() => {
            CreatePaymentOutcome::Created(PaymentIntent {
                payment_id: payment_id.to_string(),
                redirect_url: url.to_string(),
            })
        }
        _ => rejected(),
    }
}

/// 解析查询支付响应，缺少状态时视为平台错误
fn parse_fetch_response(body: Value, payment_id: &str) -> DomainResult<ProcessorPayment> {
    let data = &body["data"];
    let status = data["status"]
        .as_str()
        .map(str::trim)
        .filter(|status| !status.is_empty())
        .ok_or_else(|| {
            error!("OderoPay payment {} response has no status: {}", payment_id, body);
            DomainError::ProcessorError(format!("Payment {} response has no status", payment_id))
        })?;

    let status = PaymentStatus::from(status);
    let payment_id = data["paymentId"].as_str().unwrap_or(payment_id).to_string();

    Ok(ProcessorPayment {
        payment_id,
        status,
        raw: body,
    })
}

fn parse_webhook(payload: &Value) -> DomainResult<WebhookMessage> {
    let kind = payload["type"].as_str().unwrap_or_default().trim();
    if !kind.eq_ignore_ascii_case("PAYMENT") {
        return Ok(WebhookMessage::Unknown {
            kind: kind.to_string(),
        });
    }

    let data = &payload["data"];
    let ext_order_id = data["extOrderId"]
        .as_str()
        .map(|id| id.trim().to_string())
        .or_else(|| data["extOrderId"].as_i64().map(|id| id.to_string()))
        .filter(|id| !id.is_empty())
        .ok_or_else(|| {
            DomainError::ValidationError("Missing extOrderId in notification".to_string())
        })?;

    let status = payload["status"]
        .as_str()
        .or_else(|| data["status"].as_str())
        .map(PaymentStatus::from)
        .ok_or_else(|| DomainError::ValidationError("Missing status in notification".to_string()))?;

    Ok(WebhookMessage::Payment(PaymentNotification {
        ext_order_id,
        payment_id: data["paymentId"].as_str().map(str::to_string),
        status,
        raw: payload.clone(),
    }))
}

#[async_trait]
impl OderoPayPort for OderoPayAdapter {
    /// 创建支付
    async fn create_payment(&self, request: &PaymentRequest) -> DomainResult<CreatePaymentOutcome> {
        let body_str = serde_json::to_string(request)?;
        debug!("OderoPay create payment body: {}", body_str);

        let builder = self
            .client
            .post(self.url("/v1/payments"))
            .header("Content-Type", "application/json");
        let response = self.authorize(builder, &body_str)?.body(body_str).send().await?;

        let status = response.status();
        let text = response.text().await?;
        let body: Value = serde_json::from_str(&text).unwrap_or(Value::Null);
        debug!("OderoPay create payment response: {} {}", status, text);

        if status.is_server_error() {
            error!("OderoPay API error: {} - {}", status, text);
            return Err(DomainError::ProcessorError(format!(
                "API returned {}: {}",
                status, text
            )));
        }
        if !status.is_success() {
            warn!("OderoPay rejected payment: {} - {}", status, text);
            return Ok(CreatePaymentOutcome::Rejected {
                message: message_of(&body).unwrap_or_else(|| format!("Payment rejected ({})", status)),
            });
        }

        Ok(parse_create_response(&body))
    }

    /// 查询支付
    async fn fetch_payment(&self, payment_id: &str) -> DomainResult<ProcessorPayment> {
        let builder = self.client.get(self.url(&format!("/v1/payments/{}", payment_id)));
        let response = self.authorize(builder, "")?.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(DomainError::ProcessorError(format!(
                "Fetch payment failed: {} - {}",
                status, error_text
            )));
        }

        let resp_json: Value = response.json().await?;
        parse_fetch_response(resp_json, payment_id)
    }

    /// 解码回调通知
    async fn decode_webhook(&self, payload: &Value) -> DomainResult<WebhookMessage> {
        parse_webhook(payload)
    }
}
