/// 国家信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Country {
    pub alpha2: String,
    pub alpha3: String,
    /// 国际电话区号，不带 "+"
    pub calling_code: String,
}

/// 国家代码查询端口
pub trait CountryDirectoryPort: Send + Sync {
    /// 按 alpha-2 代码查询（不区分大小写）
    fn lookup(&self, alpha2: &str) -> Option<Country>;
}
