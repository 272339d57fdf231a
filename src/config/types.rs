use crate::config::validation::{ValidationError, ValidationUtils, Validator};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 未指定埠號時使用的 Redis 預設埠
pub const DEFAULT_REDIS_PORT: u16 = 6379;

/// 應用程序配置結構
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApplicationConfig {
    pub redis: RedisConfig,
    #[serde(default)]
    pub log: LogConfig,
}

impl Validator for ApplicationConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        // 驗證各個部分的配置
        self.redis.validate()?;
        self.log.validate()?;

        Ok(())
    }
}

/// 日誌配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    pub level: String,
    pub format: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl Validator for LogConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        // 驗證日誌級別
        ValidationUtils::one_of(
            &self.level.to_lowercase(),
            &["trace", "debug", "info", "warn", "error"]
                .iter()
                .map(|s| s.to_string())
                .collect::<Vec<String>>(),
            "log.level",
        )?;

        // 驗證日誌格式
        ValidationUtils::one_of(
            &self.format.to_lowercase(),
            &["pretty", "json"]
                .iter()
                .map(|s| s.to_string())
                .collect::<Vec<String>>(),
            "log.format",
        )?;

        Ok(())
    }
}

/// Redis配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    pub url: String,
    pub pool_size: u32,
    pub connection_timeout_secs: u64,
    pub recycle_timeout_secs: u64,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self::from_host("localhost")
    }
}

impl RedisConfig {
    /// 以主機名稱建立配置，使用預設埠與其餘預設值
    pub fn from_host(host: &str) -> Self {
        Self {
            url: format!("redis://{}:{}", host, DEFAULT_REDIS_PORT),
            pool_size: 8,
            connection_timeout_secs: 5,
            recycle_timeout_secs: 60,
        }
    }

    /// 以完整 URL 建立配置
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// 獲取連接超時持續時間
    pub fn connection_timeout(&self) -> Duration {
        Duration::from_secs(self.connection_timeout_secs)
    }

    /// 獲取連接回收超時持續時間
    pub fn recycle_timeout(&self) -> Duration {
        Duration::from_secs(self.recycle_timeout_secs)
    }
}

impl Validator for RedisConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        // 驗證Redis配置
        ValidationUtils::not_empty(&self.url, "redis.url")?;
        ValidationUtils::redis_scheme(&self.url, "redis.url")?;
        ValidationUtils::in_range(self.pool_size, 1, 100, "redis.pool_size")?;
        ValidationUtils::in_range(
            self.connection_timeout_secs,
            1,
            60,
            "redis.connection_timeout_secs",
        )?;
        ValidationUtils::in_range(
            self.recycle_timeout_secs,
            1,
            3600,
            "redis.recycle_timeout_secs",
        )?;

        Ok(())
    }
}
