use serde::{Deserialize, Serialize};

/// 结账响应
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutResponse {
    /// 固定为 "success"
    pub result: String,

    /// OderoPay 托管支付页地址
    pub redirect: String,
}

impl CheckoutResponse {
    pub fn success(redirect: String) -> Self {
        Self {
            result: "success".to_string(),
            redirect,
        }
    }
}

/// 网关状态
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayStatusResponse {
    pub id: String,
    pub title: String,
    pub description: String,
    pub enabled: bool,
    /// 结账页是否展示
    pub available: bool,
    pub sandbox: bool,
    pub needs_setup: bool,

    /// 后台提示
    pub notices: Vec<String>,
}

/// 回调请求的查询参数
#[derive(Debug, Default, Deserialize)]
pub struct WebhookQuery {
    #[serde(rename = "_token")]
    pub token: Option<String>,
    pub secret_key: Option<String>,
}

/// 错误响应
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: &str, message: String) -> Self {
        Self {
            error: error.to_string(),
            message,
        }
    }
}
