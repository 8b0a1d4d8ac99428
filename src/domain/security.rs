use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use rand::RngCore;
use rand::rngs::OsRng;
use sha2::Sha256;
use std::fmt;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// 回调URL中防重放令牌对应的动作名
pub const CALLBACK_ACTION: &str = "odero_callback";

/// 令牌有效期（秒）
const TOKEN_LIFETIME_SECS: i64 = 24 * 60 * 60;

/// 令牌长度（十六进制字符）
const TOKEN_LEN: usize = 20;

/// 规范化外部传入的键值：转小写，只保留 `[a-z0-9_-]`
pub fn sanitize_key(raw: &str) -> String {
    raw.chars()
        .map(|c| c.to_ascii_lowercase())
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '_' || *c == '-')
        .collect()
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && bool::from(a.ct_eq(b))
}

/// 每个安装实例共享的密钥
///
/// 首次加载配置时生成并持久化，之后只读；比较时拒绝空值。
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: &str) -> Self {
        Self(sanitize_key(value))
    }

    /// 生成40位十六进制随机密钥
    pub fn generate() -> Self {
        let mut bytes = [0u8; 20];
        OsRng.fill_bytes(&mut bytes);
        Self(hex::encode(bytes))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    /// 与外部传入的密钥比较
    pub fn matches(&self, candidate: &str) -> bool {
        if self.0.is_empty() || candidate.is_empty() {
            return false;
        }
        constant_time_eq(self.0.as_bytes(), candidate.as_bytes())
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

/// 防重放令牌
///
/// 令牌按半个有效期为一个时间片计算，当前片和上一片签发的令牌都有效。
/// 这里只校验令牌是否有效，不记录是否已被使用。
#[derive(Clone)]
pub struct ReplayTokens {
    key: Vec<u8>,
}

impl ReplayTokens {
    pub fn new(key: &[u8]) -> Self {
        Self { key: key.to_vec() }
    }

    fn tick(now: DateTime<Utc>) -> i64 {
        let half = TOKEN_LIFETIME_SECS / 2;
        (now.timestamp() + half - 1).div_euclid(half)
    }

    fn digest(&self, tick: i64, action: &str) -> Option<String> {
        let mut mac = HmacSha256::new_from_slice(&self.key).ok()?;
        mac.update(format!("{}|{}", tick, action).as_bytes());
        let hex = hex::encode(mac.finalize().into_bytes());
        Some(hex[..TOKEN_LEN].to_string())
    }

    /// 签发令牌
    pub fn issue(&self, action: &str, now: DateTime<Utc>) -> String {
        self.digest(Self::tick(now), action).unwrap_or_default()
    }

    /// 校验令牌
    pub fn verify(&self, token: &str, action: &str, now: DateTime<Utc>) -> bool {
        let token = sanitize_key(token);
        if token.len() != TOKEN_LEN {
            return false;
        }

        let tick = Self::tick(now);
        [tick, tick - 1].iter().any(|t| {
            self.digest(*t, action)
                .is_some_and(|expected| constant_time_eq(expected.as_bytes(), token.as_bytes()))
        })
    }
}
