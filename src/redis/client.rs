use crate::config::types::RedisConfig;
use crate::redis::command::{Command, SetOptions};
use crate::redis::pool::{ConnectionPool, RedisPool, RedisPoolError};
use async_trait::async_trait;
use deadpool_redis::Connection;
use redis::{cmd, pipe, AsyncCommands, RedisError, ToRedisArgs, Value};
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Redis客戶端錯誤
#[derive(Error, Debug)]
pub enum RedisClientError {
    /// Redis命令錯誤，包含伺服器錯誤與回應類型不符
    #[error("Redis命令錯誤: {0}")]
    CommandError(#[from] RedisError),

    /// 連接池錯誤
    #[error("Redis連接池錯誤: {0}")]
    PoolError(#[source] RedisPoolError),

    /// 客戶端已斷開連接
    #[error("Redis客戶端已斷開連接")]
    Disconnected,

    /// 呼叫參數無效，未送出命令
    #[error("無效的參數: {0}")]
    InvalidArgument(String),
}

impl From<RedisPoolError> for RedisClientError {
    fn from(error: RedisPoolError) -> Self {
        match error {
            RedisPoolError::Closed => RedisClientError::Disconnected,
            other => RedisClientError::PoolError(other),
        }
    }
}

/// 統一的成功/失敗結果：成功時攜帶回應，失敗時攜帶錯誤描述
pub type Failable<T> = Result<T, RedisClientError>;

/// 記錄命令失敗並轉換錯誤
fn command_failed(command: &str, err: RedisError) -> RedisClientError {
    error!("Redis命令 {} 執行失敗: {}", command, err);
    RedisClientError::CommandError(err)
}

/// 多鍵命令至少需要一個鍵
fn require_keys<'a, K: AsRef<str>>(keys: &'a [K], what: &str) -> Failable<Vec<&'a str>> {
    if keys.is_empty() {
        return Err(RedisClientError::InvalidArgument(format!("{} 至少需要一個鍵", what)));
    }
    Ok(keys.iter().map(|key| key.as_ref()).collect())
}

/// Redis操作特質
#[async_trait]
pub trait RedisOperations: Send + Sync + 'static {
    /// 執行PING命令
    async fn ping(&self) -> Failable<String>;

    /// 獲取鍵對應的值，鍵不存在時為 None
    async fn get<K: AsRef<str> + Send + Sync>(&self, key: K) -> Failable<Option<String>>;

    /// 設置鍵值對，成功時回傳 "OK"
    async fn set<K, V>(&self, key: K, value: V) -> Failable<Option<String>>
    where
        K: AsRef<str> + Send + Sync,
        V: ToRedisArgs + Send + Sync;

    /// 帶選項設置鍵值對；條件未滿足時回傳 None
    async fn set_with_options<K, V>(
        &self,
        key: K,
        value: V,
        options: SetOptions,
    ) -> Failable<Option<String>>
    where
        K: AsRef<str> + Send + Sync,
        V: ToRedisArgs + Send + Sync;

    /// 回傳存在的鍵數量，重複的鍵重複計算
    async fn exists<K: AsRef<str> + Send + Sync>(&self, keys: &[K]) -> Failable<i64>;

    /// 刪除鍵，回傳實際刪除的數量
    async fn remove<K: AsRef<str> + Send + Sync>(&self, keys: &[K]) -> Failable<i64>;

    /// 設置雜湊欄位，回傳新建立的欄位數
    async fn hash_set<K, F, V>(&self, key: K, field: F, value: V) -> Failable<i64>
    where
        K: AsRef<str> + Send + Sync,
        F: AsRef<str> + Send + Sync,
        V: ToRedisArgs + Send + Sync;

    /// 一次設置多個雜湊欄位
    async fn hash_set_many<K, F, V>(&self, key: K, items: &[(F, V)]) -> Failable<i64>
    where
        K: AsRef<str> + Send + Sync,
        F: AsRef<str> + Send + Sync,
        V: ToRedisArgs + Send + Sync;

    /// 獲取雜湊欄位
    async fn hash_get<K, F>(&self, key: K, field: F) -> Failable<Option<String>>
    where
        K: AsRef<str> + Send + Sync,
        F: AsRef<str> + Send + Sync;

    /// 獲取整個雜湊，鍵不存在時為空
    async fn hash_get_all<K: AsRef<str> + Send + Sync>(
        &self,
        key: K,
    ) -> Failable<HashMap<String, String>>;

    /// 刪除雜湊欄位，回傳實際刪除的數量
    async fn hash_remove<K, F>(&self, key: K, fields: &[F]) -> Failable<i64>
    where
        K: AsRef<str> + Send + Sync,
        F: AsRef<str> + Send + Sync;

    /// 檢查雜湊欄位是否存在
    async fn hash_exists<K, F>(&self, key: K, field: F) -> Failable<bool>
    where
        K: AsRef<str> + Send + Sync,
        F: AsRef<str> + Send + Sync;

    /// 以單次往返送出多個命令，依序回傳每個命令的回應
    async fn pipeline(&self, commands: &[Command]) -> Failable<Vec<Value>>;

    /// 以 MULTI/EXEC 包裝的管線
    async fn transaction(&self, commands: &[Command]) -> Failable<Vec<Value>>;

    /// 以管線批次 GET，結果以請求的鍵為索引
    async fn batch_get<K: AsRef<str> + Send + Sync>(
        &self,
        keys: &[K],
    ) -> Failable<HashMap<String, Option<String>>>;

    /// 斷開連接；本次呼叫關閉時為 true，早已關閉時為 false
    async fn disconnect(&self) -> Failable<bool>;
}

/// Redis客戶端實現
pub struct Client<P: RedisPool = ConnectionPool> {
    pool: P,
}

impl Client<ConnectionPool> {
    /// 創建新的Redis客戶端
    ///
    /// 不會立即連線，第一個命令才建立連接。
    pub async fn connect(config: RedisConfig) -> Failable<Self> {
        debug!("創建Redis客戶端: {}", config.url);
        let pool = ConnectionPool::new(config).await?;
        Ok(Self::with_pool(pool))
    }
}

impl<P: RedisPool> Client<P> {
    /// 以既有的連接池建立客戶端
    pub fn with_pool(pool: P) -> Self {
        Self { pool }
    }

    /// 客戶端是否已斷開
    pub fn is_disconnected(&self) -> bool {
        self.pool.is_closed()
    }

    /// 測試連接是否有效
    pub async fn test_connection(&self) -> bool {
        match self.ping().await {
            Ok(_) => true,
            Err(err) => {
                warn!("Redis連接測試失敗: {}", err);
                false
            }
        }
    }

    fn ensure_connected(&self) -> Failable<()> {
        if self.pool.is_closed() {
            return Err(RedisClientError::Disconnected);
        }
        Ok(())
    }

    async fn connection(&self) -> Failable<Connection> {
        self.ensure_connected()?;
        Ok(self.pool.get_conn().await?)
    }

    async fn run_pipeline(&self, commands: &[Command], atomic: bool) -> Failable<Vec<Value>> {
        self.ensure_connected()?;
        if commands.is_empty() {
            return Ok(Vec::new());
        }

        let mut pipeline = pipe();
        if atomic {
            pipeline.atomic();
        }
        for command in commands {
            pipeline.add_command(command.to_cmd()?);
        }

        debug!("Executing Redis pipeline: {} commands, atomic: {}", commands.len(), atomic);

        let mut conn = self.connection().await?;
        pipeline
            .query_async(&mut conn)
            .await
            .map_err(|err| command_failed(if atomic { "MULTI/EXEC" } else { "PIPELINE" }, err))
    }
}

#[async_trait]
impl<P: RedisPool> RedisOperations for Client<P> {
    async fn ping(&self) -> Failable<String> {
        let mut conn = self.connection().await?;
        debug!("Pinging Redis server");

        cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|err| command_failed("PING", err))
    }

    async fn get<K: AsRef<str> + Send + Sync>(&self, key: K) -> Failable<Option<String>> {
        let mut conn = self.connection().await?;
        debug!("Getting Redis key: {}", key.as_ref());

        conn.get(key.as_ref())
            .await
            .map_err(|err| command_failed("GET", err))
    }

    async fn set<K, V>(&self, key: K, value: V) -> Failable<Option<String>>
    where
        K: AsRef<str> + Send + Sync,
        V: ToRedisArgs + Send + Sync,
    {
        self.set_with_options(key, value, SetOptions::default()).await
    }

    async fn set_with_options<K, V>(
        &self,
        key: K,
        value: V,
        options: SetOptions,
    ) -> Failable<Option<String>>
    where
        K: AsRef<str> + Send + Sync,
        V: ToRedisArgs + Send + Sync,
    {
        let mut conn = self.connection().await?;
        debug!("Setting Redis key: {}, options: {:?}", key.as_ref(), options);

        let mut command = cmd("SET");
        command.arg(key.as_ref()).arg(value);
        options.apply(&mut command);

        command
            .query_async(&mut conn)
            .await
            .map_err(|err| command_failed("SET", err))
    }

    async fn exists<K: AsRef<str> + Send + Sync>(&self, keys: &[K]) -> Failable<i64> {
        let keys = require_keys(keys, "EXISTS")?;
        let mut conn = self.connection().await?;
        debug!("Checking if Redis keys exist: {:?}", keys);

        conn.exists(&keys)
            .await
            .map_err(|err| command_failed("EXISTS", err))
    }

    async fn remove<K: AsRef<str> + Send + Sync>(&self, keys: &[K]) -> Failable<i64> {
        let keys = require_keys(keys, "DEL")?;
        let mut conn = self.connection().await?;
        debug!("Deleting Redis keys: {:?}", keys);

        conn.del(&keys)
            .await
            .map_err(|err| command_failed("DEL", err))
    }

    async fn hash_set<K, F, V>(&self, key: K, field: F, value: V) -> Failable<i64>
    where
        K: AsRef<str> + Send + Sync,
        F: AsRef<str> + Send + Sync,
        V: ToRedisArgs + Send + Sync,
    {
        let mut conn = self.connection().await?;
        debug!("Setting Redis hash field: {} {}", key.as_ref(), field.as_ref());

        conn.hset(key.as_ref(), field.as_ref(), value)
            .await
            .map_err(|err| command_failed("HSET", err))
    }

    async fn hash_set_many<K, F, V>(&self, key: K, items: &[(F, V)]) -> Failable<i64>
    where
        K: AsRef<str> + Send + Sync,
        F: AsRef<str> + Send + Sync,
        V: ToRedisArgs + Send + Sync,
    {
        if items.is_empty() {
            return Err(RedisClientError::InvalidArgument(
                "HSET 至少需要一個欄位".to_string(),
            ));
        }
        let mut conn = self.connection().await?;
        debug!("Setting {} Redis hash fields: {}", items.len(), key.as_ref());

        let mut command = cmd("HSET");
        command.arg(key.as_ref());
        for (field, value) in items {
            command.arg(field.as_ref()).arg(value);
        }

        command
            .query_async(&mut conn)
            .await
            .map_err(|err| command_failed("HSET", err))
    }

    async fn hash_get<K, F>(&self, key: K, field: F) -> Failable<Option<String>>
    where
        K: AsRef<str> + Send + Sync,
        F: AsRef<str> + Send + Sync,
    {
        let mut conn = self.connection().await?;
        debug!("Getting Redis hash field: {} {}", key.as_ref(), field.as_ref());

        conn.hget(key.as_ref(), field.as_ref())
            .await
            .map_err(|err| command_failed("HGET", err))
    }

    async fn hash_get_all<K: AsRef<str> + Send + Sync>(
        &self,
        key: K,
    ) -> Failable<HashMap<String, String>> {
        let mut conn = self.connection().await?;
        debug!("Getting all Redis hash fields: {}", key.as_ref());

        conn.hgetall(key.as_ref())
            .await
            .map_err(|err| command_failed("HGETALL", err))
    }

    async fn hash_remove<K, F>(&self, key: K, fields: &[F]) -> Failable<i64>
    where
        K: AsRef<str> + Send + Sync,
        F: AsRef<str> + Send + Sync,
    {
        let fields = require_keys(fields, "HDEL")?;
        let mut conn = self.connection().await?;
        debug!("Deleting Redis hash fields: {} {:?}", key.as_ref(), fields);

        conn.hdel(key.as_ref(), &fields)
            .await
            .map_err(|err| command_failed("HDEL", err))
    }

    async fn hash_exists<K, F>(&self, key: K, field: F) -> Failable<bool>
    where
        K: AsRef<str> + Send + Sync,
        F: AsRef<str> + Send + Sync,
    {
        let mut conn = self.connection().await?;
        debug!("Checking Redis hash field: {} {}", key.as_ref(), field.as_ref());

        conn.hexists(key.as_ref(), field.as_ref())
            .await
            .map_err(|err| command_failed("HEXISTS", err))
    }

    async fn pipeline(&self, commands: &[Command]) -> Failable<Vec<Value>> {
        self.run_pipeline(commands, false).await
    }

    async fn transaction(&self, commands: &[Command]) -> Failable<Vec<Value>> {
        self.run_pipeline(commands, true).await
    }

    async fn batch_get<K: AsRef<str> + Send + Sync>(
        &self,
        keys: &[K],
    ) -> Failable<HashMap<String, Option<String>>> {
        self.ensure_connected()?;
        if keys.is_empty() {
            return Ok(HashMap::new());
        }

        let mut pipeline = pipe();
        for key in keys {
            pipeline.get(key.as_ref());
        }

        let mut conn = self.connection().await?;
        debug!("Batch getting {} Redis keys", keys.len());

        let values: Vec<Option<String>> = pipeline
            .query_async(&mut conn)
            .await
            .map_err(|err| command_failed("GET (batch)", err))?;

        Ok(keys
            .iter()
            .map(|key| key.as_ref().to_string())
            .zip(values)
            .collect())
    }

    async fn disconnect(&self) -> Failable<bool> {
        if self.pool.is_closed() {
            debug!("Redis客戶端已經斷開，略過");
            return Ok(false);
        }

        self.pool.close();
        info!("Redis客戶端已斷開連接");
        Ok(true)
    }
}
