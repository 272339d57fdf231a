#![allow(dead_code)]

use redis_adapter::{Client, RedisConfig};

/// 測試用 Redis 配置：REDIS_TEST_URL、REDIS_HOST、Docker、localhost 依序嘗試
pub fn test_config() -> RedisConfig {
    if let Ok(url) = std::env::var("REDIS_TEST_URL") {
        return RedisConfig::from_url(url);
    }
    if let Ok(host) = std::env::var("REDIS_HOST") {
        return RedisConfig::from_host(&host);
    }
    if std::path::Path::new("/.dockerenv").exists() {
        RedisConfig::from_host("redis")
    } else {
        RedisConfig::from_host("localhost")
    }
}

/// 連線到測試 Redis；無法連線時回傳 None 讓測試略過
pub async fn setup_client(test_name: &str) -> Option<Client> {
    let config = RedisConfig {
        connection_timeout_secs: 2,
        ..test_config()
    };
    let url = config.url.clone();

    let client = Client::connect(config)
        .await
        .expect("Failed to create Redis client");

    if client.test_connection().await {
        Some(client)
    } else {
        eprintln!("skipping {}: Redis at {} unavailable", test_name, url);
        None
    }
}

/// 測試用的唯一鍵
pub fn unique_key(prefix: &str) -> String {
    format!("{}_{}", prefix, uuid::Uuid::new_v4())
}
