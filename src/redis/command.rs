//! 管線命令與 SET 選項
//!
//! `Command` 以 `[名稱, 參數...]` 的形式描述單一 Redis 命令，供管線批次送出。

use crate::redis::client::RedisClientError;
use redis::{cmd, Cmd, ToRedisArgs};

/// 單一 Redis 命令，參數以編碼後的位元組保存
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    name: String,
    args: Vec<Vec<u8>>,
}

impl Command {
    /// 以命令名稱建立命令
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
        }
    }

    /// 從 `[名稱, 參數...]` 形式建立命令
    pub fn from_parts<I, S>(parts: I) -> Result<Self, RedisClientError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut parts = parts.into_iter().map(Into::into);
        let name = parts
            .next()
            .ok_or_else(|| RedisClientError::InvalidArgument("命令不可為空".to_string()))?;

        Ok(Self {
            name,
            args: parts.map(String::into_bytes).collect(),
        })
    }

    /// GET key
    pub fn get(key: impl Into<String>) -> Self {
        Self::new("GET").arg(key.into())
    }

    /// SET key value
    pub fn set(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new("SET").arg(key.into()).arg(value.into())
    }

    /// 追加參數；與 `redis::Cmd::arg` 相同，一個值可展開為多個參數
    pub fn arg<T: ToRedisArgs>(mut self, arg: T) -> Self {
        self.args.extend(arg.to_redis_args());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn args(&self) -> &[Vec<u8>] {
        &self.args
    }

    /// 轉換為 redis crate 的命令
    pub fn to_cmd(&self) -> Result<Cmd, RedisClientError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(RedisClientError::InvalidArgument(
                "命令名稱不可為空".to_string(),
            ));
        }

        let mut command = cmd(&name.to_uppercase());
        for arg in &self.args {
            command.arg(arg);
        }
        Ok(command)
    }
}

/// SET 的過期設定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiry {
    /// EX 秒
    Seconds(u64),
    /// PX 毫秒
    Milliseconds(u64),
    /// KEEPTTL，保留原有過期時間
    KeepTtl,
}

/// SET 的條件寫入
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetCondition {
    /// NX
    IfNotExists,
    /// XX
    IfExists,
}

/// SET 的附加選項
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SetOptions {
    pub expiry: Option<Expiry>,
    pub condition: Option<SetCondition>,
    /// GET，回傳鍵的舊值
    pub get: bool,
}

impl SetOptions {
    pub fn with_expiry(mut self, expiry: Expiry) -> Self {
        self.expiry = Some(expiry);
        self
    }

    pub fn with_condition(mut self, condition: SetCondition) -> Self {
        self.condition = Some(condition);
        self
    }

    pub fn with_get(mut self) -> Self {
        self.get = true;
        self
    }

    /// 將選項附加到 SET 命令之後
    pub(crate) fn apply(&self, command: &mut Cmd) {
        match self.expiry {
            Some(Expiry::Seconds(secs)) => {
                command.arg("EX").arg(secs);
            }
            Some(Expiry::Milliseconds(millis)) => {
                command.arg("PX").arg(millis);
            }
            Some(Expiry::KeepTtl) => {
                command.arg("KEEPTTL");
            }
            None => {}
        }

        match self.condition {
            Some(SetCondition::IfNotExists) => {
                command.arg("NX");
            }
            Some(SetCondition::IfExists) => {
                command.arg("XX");
            }
            None => {}
        }

        if self.get {
            command.arg("GET");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    /// 取出命令編碼後的參數
    fn encoded_args(command: &Cmd) -> Vec<String> {
        command
            .args_iter()
            .map(|arg| match arg {
                redis::Arg::Simple(bytes) => String::from_utf8_lossy(bytes).into_owned(),
                redis::Arg::Cursor => "<cursor>".to_string(),
            })
            .collect()
    }

    #[test]
    fn test_builder_and_parts_agree() {
        let built = Command::new("hset").arg("user:1").arg("age").arg(42);
        let parsed = Command::from_parts(["hset", "user:1", "age", "42"]).expect("應可解析");

        assert_eq!(built, parsed);
        assert_eq!(built.name(), "hset");
        assert_eq!(built.args(), [b"user:1".to_vec(), b"age".to_vec(), b"42".to_vec()]);
    }

    #[test]
    fn test_binary_args_are_preserved() {
        let payload = vec![0xffu8, 0x00, 0xfe];
        let command = Command::new("set").arg("blob").arg(payload.clone());

        assert_eq!(command.args().len(), 2);
        assert_eq!(command.args()[1], payload);

        let encoded: Vec<Vec<u8>> = command
            .to_cmd()
            .expect("應可轉換")
            .args_iter()
            .filter_map(|arg| match arg {
                redis::Arg::Simple(bytes) => Some(bytes.to_vec()),
                redis::Arg::Cursor => None,
            })
            .collect();
        assert_eq!(encoded, [b"SET".to_vec(), b"blob".to_vec(), payload]);
    }

    #[test]
    fn test_to_cmd_uppercases_name() {
        let command = Command::get("session:1").to_cmd().expect("應可轉換");
        assert_eq!(encoded_args(&command), ["GET", "session:1"]);
    }

    #[test]
    fn test_empty_command_rejected() {
        assert_matches!(
            Command::from_parts(Vec::<String>::new()),
            Err(RedisClientError::InvalidArgument(_))
        );
        assert_matches!(
            Command::new("  ").to_cmd().err(),
            Some(RedisClientError::InvalidArgument(_))
        );
    }

    #[test]
    fn test_set_options_order() {
        let mut command = cmd("SET");
        command.arg("k").arg("v");
        SetOptions::default()
            .with_expiry(Expiry::Seconds(30))
            .with_condition(SetCondition::IfNotExists)
            .with_get()
            .apply(&mut command);

        assert_eq!(encoded_args(&command), ["SET", "k", "v", "EX", "30", "NX", "GET"]);
    }

    #[test]
    fn test_default_set_options_add_nothing() {
        let mut command = cmd("SET");
        command.arg("k").arg("v");
        SetOptions::default().apply(&mut command);

        assert_eq!(encoded_args(&command), ["SET", "k", "v"]);
    }
}
