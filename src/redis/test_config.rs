//! 集中化的 Redis 測試配置
//!
//! 提供一致的測試環境配置，支援不同部署環境（本地開發、Docker 容器）

use crate::config::types::RedisConfig;
use crate::redis::pool::{ConnectionPool, RedisPool, RedisPoolError};
use std::sync::Arc;
use tracing::warn;

/// Redis 測試配置建構器
pub struct RedisTestConfig;

impl RedisTestConfig {
    /// 獲取測試用 Redis URL
    ///
    /// 優先級：
    /// 1. REDIS_TEST_URL 環境變數
    /// 2. REDIS_HOST 環境變數（只有主機名稱）
    /// 3. 檢測 Docker 環境使用 redis:6379
    /// 4. 預設 localhost:6379
    pub fn get_test_url() -> String {
        if let Ok(url) = std::env::var("REDIS_TEST_URL") {
            return url;
        }

        if let Ok(host) = std::env::var("REDIS_HOST") {
            return RedisConfig::from_host(&host).url;
        }

        if Self::is_docker_environment() {
            "redis://redis:6379".to_string()
        } else {
            "redis://localhost:6379".to_string()
        }
    }

    /// 檢測是否在 Docker 環境中執行
    fn is_docker_environment() -> bool {
        std::env::var("DOCKER_CONTAINER").is_ok() || std::path::Path::new("/.dockerenv").exists()
    }

    /// 建立標準測試 Redis 配置
    pub fn create_test_config() -> RedisConfig {
        RedisConfig {
            url: Self::get_test_url(),
            pool_size: 3,
            connection_timeout_secs: 2,
            recycle_timeout_secs: 60,
        }
    }

    /// 指向不會有伺服器監聽的位址
    pub fn unreachable_config() -> RedisConfig {
        RedisConfig {
            url: "redis://127.0.0.1:1".to_string(),
            pool_size: 1,
            connection_timeout_secs: 1,
            recycle_timeout_secs: 60,
        }
    }

    /// 建立測試用 Redis 連接池
    pub async fn create_test_pool() -> Result<Arc<ConnectionPool>, RedisPoolError> {
        let pool = ConnectionPool::new(Self::create_test_config()).await?;
        Ok(Arc::new(pool))
    }

    /// 測試用的唯一鍵，避免並行測試互相干擾
    pub fn unique_key(prefix: &str) -> String {
        format!("{}_{}", prefix, uuid::Uuid::new_v4())
    }

    /// 取得可用的測試連接池；Redis 不可用時記錄並回傳 None，讓測試略過
    pub async fn skip_if_redis_unavailable(test_name: &str) -> Option<Arc<ConnectionPool>> {
        match Self::create_test_pool().await {
            Ok(pool) if pool.check_health().await => Some(pool),
            _ => {
                warn!("略過 Redis 測試 '{}'：{} 無法連線", test_name, Self::get_test_url());
                eprintln!("skipping {}: Redis unavailable", test_name);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_get_test_url_precedence() {
        std::env::set_var("REDIS_TEST_URL", "redis://custom:1234");
        std::env::set_var("REDIS_HOST", "ignored");
        assert_eq!(RedisTestConfig::get_test_url(), "redis://custom:1234");

        std::env::remove_var("REDIS_TEST_URL");
        assert_eq!(RedisTestConfig::get_test_url(), "redis://ignored:6379");

        std::env::remove_var("REDIS_HOST");
    }

    #[test]
    fn test_create_test_config() {
        let config = RedisTestConfig::create_test_config();
        assert!(config.url.starts_with("redis://"));
        assert_eq!(config.pool_size, 3);
        assert_eq!(config.connection_timeout_secs, 2);
    }

    #[test]
    fn test_unique_key() {
        let a = RedisTestConfig::unique_key("k");
        let b = RedisTestConfig::unique_key("k");
        assert!(a.starts_with("k_"));
        assert_ne!(a, b);
    }
}
