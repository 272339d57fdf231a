// 模組定義
pub mod config;
pub mod redis;

pub use crate::config::RedisConfig;
pub use crate::redis::{Client, Command, Failable, RedisClientError, RedisOperations};
