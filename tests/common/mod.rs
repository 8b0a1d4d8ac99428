#![allow(dead_code)]

use async_trait::async_trait;
use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{HeaderMap, Request, StatusCode};
use chrono::Utc;
use oderopay_gateway::api::{AppState, create_router};
use oderopay_gateway::application::{NotificationGate, PaymentService, StatusReconciler};
use oderopay_gateway::domain::{
    Address, CALLBACK_ACTION, DomainError, DomainResult, GATEWAY_ID, Order, OrderItem,
    OrderStatus, PaymentRequest, PaymentStatus, ReplayTokens, TaxTotal,
};
use oderopay_gateway::infrastructure::{
    GatewayConfig, InMemoryOrderStore, OderoPayAdapter, StaticCountryDirectory,
};
use oderopay_gateway::ports::{
    CreatePaymentOutcome, OderoPayPort, PaymentIntent, ProcessorPayment, WebhookMessage,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

pub const SECRET: &str = "integrationsecret";

/// 记录调用的假支付平台，回调解码使用真实适配器
pub struct FakeProcessor {
    decoder: OderoPayAdapter,
    create_result: Mutex<Result<CreatePaymentOutcome, String>>,
    fetch_status: Mutex<PaymentStatus>,
    pub created: Mutex<Vec<PaymentRequest>>,
    pub fetched: Mutex<Vec<String>>,
    pub decoded: AtomicUsize,
}

fn created(payment_id: &str) -> CreatePaymentOutcome {
    CreatePaymentOutcome::Created(PaymentIntent {
        payment_id: payment_id.to_string(),
        redirect_url: format!("https://pay.example/checkout/{}", payment_id),
    })
}

impl FakeProcessor {
    fn new(config: Arc<GatewayConfig>) -> Self {
        Self {
            decoder: OderoPayAdapter::new(config).unwrap(),
            create_result: Mutex::new(Ok(created("PAY-1"))),
            fetch_status: Mutex::new(PaymentStatus::Success),
            created: Mutex::new(Vec::new()),
            fetched: Mutex::new(Vec::new()),
            decoded: AtomicUsize::new(0),
        }
    }

    /// 之后的创建调用返回该支付ID
    pub fn create_with_id(&self, payment_id: &str) {
        *self.create_result.lock().unwrap() = Ok(created(payment_id));
    }

    pub fn reject_with(&self, message: &str) {
        *self.create_result.lock().unwrap() = Ok(CreatePaymentOutcome::Rejected {
            message: message.to_string(),
        });
    }

    pub fn fail_with(&self, message: &str) {
        *self.create_result.lock().unwrap() = Err(message.to_string());
    }

    pub fn set_fetch_status(&self, status: PaymentStatus) {
        *self.fetch_status.lock().unwrap() = status;
    }

    pub fn decoded(&self) -> usize {
        self.decoded.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> PaymentRequest {
        self.created.lock().unwrap().last().cloned().unwrap()
    }
}

#[async_trait]
impl OderoPayPort for FakeProcessor {
    async fn create_payment(&self, request: &PaymentRequest) -> DomainResult<CreatePaymentOutcome> {
        self.created.lock().unwrap().push(request.clone());
        self.create_result
            .lock()
            .unwrap()
            .clone()
            .map_err(DomainError::ProcessorError)
    }

    async fn fetch_payment(&self, payment_id: &str) -> DomainResult<ProcessorPayment> {
        self.fetched.lock().unwrap().push(payment_id.to_string());
        let status = self.fetch_status.lock().unwrap().clone();
        Ok(ProcessorPayment {
            payment_id: payment_id.to_string(),
            raw: json!({ "paymentId": payment_id, "status": status.to_string() }),
            status,
        })
    }

    async fn decode_webhook(&self, payload: &Value) -> DomainResult<WebhookMessage> {
        self.decoded.fetch_add(1, Ordering::SeqCst);
        self.decoder.decode_webhook(payload).await
    }
}

pub fn config(overrides: &[(&str, &str)]) -> GatewayConfig {
    let mut values: HashMap<String, String> = [
        ("ODERO_SECRET_KEY", SECRET),
        ("ODERO_MERCHANT_ID_SANDBOX", "M-TEST"),
        ("ODERO_MERCHANT_TOKEN_SANDBOX", "T-TEST"),
        ("ODERO_SITE_URL", "https://shop.example"),
    ]
    .iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    for (k, v) in overrides {
        values.insert(k.to_string(), v.to_string());
    }

    GatewayConfig::from_lookup(|key| values.get(key).cloned()).unwrap()
}

/// 两件商品、运费3、税1.38的订单
pub fn order(id: &str) -> Order {
    let now = Utc::now();
    Order {
        id: id.to_string(),
        order_number: id.to_string(),
        currency: "RON".to_string(),
        status: OrderStatus::new("pending"),
        payment_method: Some(GATEWAY_ID.to_string()),
        billing: Address {
            address_1: "Bulevardul Unirii 5".to_string(),
            address_2: String::new(),
            city: "Cluj-Napoca".to_string(),
            country: Some("RO".to_string()),
        },
        shipping: Address::default(),
        billing_email: Some("client@example.com".to_string()),
        billing_phone: Some("0740111222".to_string()),
        shipping_phone: None,
        shipping_method: Some("Curier".to_string()),
        items: vec![
            OrderItem {
                product_id: "p-1".to_string(),
                name: "Tricou".to_string(),
                unit_price_excl_tax: dec!(10),
                quantity: 1,
                image_url: None,
            },
            OrderItem {
                product_id: "p-2".to_string(),
                name: "Sosete".to_string(),
                unit_price_excl_tax: dec!(5),
                quantity: 2,
                image_url: None,
            },
        ],
        shipping_total: dec!(3),
        tax_totals: vec![TaxTotal {
            id: "RO-VAT".to_string(),
            label: "TVA".to_string(),
            amount: dec!(1.38),
        }],
        discount_total: Decimal::ZERO,
        view_url: format!("https://shop.example/my-account/view-order/{}/", id),
        meta: HashMap::new(),
        stock_reduced: false,
        created_at: now,
        updated_at: now,
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<InMemoryOrderStore>,
    pub processor: Arc<FakeProcessor>,
    pub config: Arc<GatewayConfig>,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).unwrap()
    }
}

impl TestApp {
    pub async fn new(config: GatewayConfig, orders: Vec<Order>) -> Self {
        let config = Arc::new(config);
        let store = Arc::new(InMemoryOrderStore::new());
        for order in orders {
            for item in &order.items {
                store.set_stock(&item.product_id, 10).await;
            }
            store.insert(order).await;
        }

        let processor = Arc::new(FakeProcessor::new(config.clone()));
        let reconciler = Arc::new(StatusReconciler::new(store.clone(), config.clone()));
        let notification_gate = Arc::new(NotificationGate::new(
            processor.clone(),
            store.clone(),
            reconciler.clone(),
            config.secret.clone(),
            ReplayTokens::new(config.token_key()),
        ));
        let payment_service = Arc::new(PaymentService::new(
            processor.clone(),
            store.clone(),
            reconciler,
            Arc::new(StaticCountryDirectory::new()),
            config.clone(),
        ));
        let router = create_router(AppState {
            payment_service,
            notification_gate,
        });

        Self {
            router,
            store,
            processor,
            config,
        }
    }

    pub async fn with_order(order: Order) -> Self {
        Self::new(config(&[]), vec![order]).await
    }

    /// 当前有效的防重放令牌
    pub fn token(&self) -> String {
        ReplayTokens::new(self.config.token_key()).issue(CALLBACK_ACTION, Utc::now())
    }

    pub async fn order(&self, id: &str) -> Order {
        use oderopay_gateway::ports::OrderStorePort;
        self.store.find_by_id(id).await.unwrap().unwrap()
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();

        TestResponse {
            status,
            headers,
            body: String::from_utf8(bytes.to_vec()).unwrap(),
        }
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.send(Request::builder().uri(uri).body(Body::empty()).unwrap()).await
    }

    pub async fn post(&self, uri: &str, body: &str) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    pub async fn checkout(&self, order_id: &str) -> TestResponse {
        self.post(&format!("/api/orders/{}/checkout", order_id), "").await
    }

    pub async fn webhook(&self, token: &str, secret_key: &str, body: &Value) -> TestResponse {
        let uri = format!(
            "/api/webhooks/oderopay?_token={}&secret_key={}",
            token, secret_key
        );
        self.post(&uri, &body.to_string()).await
    }
}

pub fn payment_webhook(order_id: &str, status: &str) -> Value {
    json!({
        "type": "PAYMENT",
        "status": status,
        "data": { "extOrderId": order_id, "paymentId": "PAY-1" }
    })
}
