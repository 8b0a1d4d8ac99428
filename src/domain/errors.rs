use thiserror::Error;

/// 领域层错误类型
#[derive(Error, Debug)]
pub enum DomainError {
    /// 验证错误
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// 订单未找到
    #[error("Order not found: {0}")]
    OrderNotFound(String),

    /// 订单还没有关联 OderoPay 支付
    #[error("Order has no OderoPay payment: {0}")]
    MissingPaymentId(String),

    /// 网关配置不完整，结账时不可用
    #[error("Gateway unavailable: {0}")]
    GatewayUnavailable(String),

    /// 国家代码无法解析
    #[error("Unknown country code: {0}")]
    UnknownCountry(String),

    /// 支付平台拒绝创建支付（消息面向顾客）
    #[error("{0}")]
    PaymentRejected(String),

    /// OderoPay API错误
    #[error("OderoPay API error: {0}")]
    ProcessorError(String),

    /// 安全检查失败（令牌或密钥）
    #[error("Security check")]
    SecurityCheckFailed,

    /// 数据库错误
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    /// 序列化错误
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// HTTP请求错误
    #[error("HTTP request error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// 加密错误
    #[error("Cryptography error: {0}")]
    CryptoError(String),

    /// 配置错误
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// 内部错误
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// 领域结果类型
pub type DomainResult<T> = Result<T, DomainError>;
