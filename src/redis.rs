//! Redis轉接模組
//!
//! 每個操作直接轉交給 redis crate，並以統一的 `Failable` 結果回傳。
//! 連接由 deadpool-redis 連接池提供。

pub mod client;
pub mod command;
pub mod pool;

#[cfg(test)]
pub mod test_config;

pub use client::*;
pub use command::*;
pub use pool::*;
