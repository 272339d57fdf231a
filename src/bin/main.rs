use anyhow::{anyhow, Result};
use clap::{Args, Parser, Subcommand};
use config::ConfigError;
use redis_adapter::config::{self as app_config, ApplicationConfig, LogConfig};
use redis_adapter::redis::{Client, Expiry, RedisOperations, SetCondition, SetOptions};
use serde_json::{json, Value as JsonValue};
use tracing::{debug, info, warn, Level};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Redis 轉接層命令列工具
#[derive(Debug, Parser)]
#[command(name = "redis_adapter", version, about)]
struct Cli {
    /// 覆蓋配置中的 Redis URL
    #[arg(long, global = true)]
    url: Option<String>,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Debug, Subcommand)]
enum CliCommand {
    /// PING
    Ping,
    /// GET key
    Get { key: String },
    /// SET key value
    Set(SetArgs),
    /// EXISTS key [key ...]
    Exists {
        #[arg(required = true)]
        keys: Vec<String>,
    },
    /// DEL key [key ...]
    Del {
        #[arg(required = true)]
        keys: Vec<String>,
    },
    /// HSET key field value
    Hset { key: String, field: String, value: String },
    /// HGET key field
    Hget { key: String, field: String },
    /// HGETALL key
    Hgetall { key: String },
    /// HDEL key field [field ...]
    Hdel {
        key: String,
        #[arg(required = true)]
        fields: Vec<String>,
    },
    /// HEXISTS key field
    Hexists { key: String, field: String },
    /// 以管線批次 GET
    BatchGet {
        #[arg(required = true)]
        keys: Vec<String>,
    },
}

#[derive(Debug, Args)]
struct SetArgs {
    key: String,
    value: String,
    /// 過期秒數
    #[arg(long)]
    ex: Option<u64>,
    /// 只在鍵不存在時設置
    #[arg(long, conflicts_with = "xx")]
    nx: bool,
    /// 只在鍵存在時設置
    #[arg(long)]
    xx: bool,
}

impl SetArgs {
    fn options(&self) -> SetOptions {
        let mut options = SetOptions::default();
        if let Some(secs) = self.ex {
            options = options.with_expiry(Expiry::Seconds(secs));
        }
        if self.nx {
            options = options.with_condition(SetCondition::IfNotExists);
        } else if self.xx {
            options = options.with_condition(SetCondition::IfExists);
        }
        options
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 初始化配置；有 --url 時配置檔可省略
    let loaded = app_config::init_config();
    let load_error = loaded.as_ref().err().map(ToString::to_string);
    let settings = resolve_config(loaded, cli.url.as_deref())?;

    // 初始化日誌系統
    init_logging(&settings.log)?;
    if let Some(reason) = load_error {
        warn!("無法載入配置檔，改用預設配置: {}", reason);
    }

    let client = Client::connect(settings.redis).await?;
    let outcome = run(&client, cli.command).await;
    client.disconnect().await?;

    let payload = outcome?;
    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(())
}

/// 合併載入的配置與 --url；配置載入失敗時只有在給了 --url 才以預設值繼續
fn resolve_config(
    loaded: Result<&ApplicationConfig, ConfigError>,
    url: Option<&str>,
) -> Result<ApplicationConfig, ConfigError> {
    let mut settings = match (loaded, url) {
        (Ok(settings), _) => settings.clone(),
        (Err(_), Some(_)) => ApplicationConfig::default(),
        (Err(err), None) => return Err(err),
    };

    if let Some(url) = url {
        settings.redis.url = url.to_string();
    }
    Ok(settings)
}

async fn run(client: &Client, command: CliCommand) -> Result<JsonValue> {
    debug!("執行命令: {:?}", command);

    let payload = match command {
        CliCommand::Ping => json!(client.ping().await?),
        CliCommand::Get { key } => json!(client.get(key).await?),
        CliCommand::Set(args) => json!(client.set_with_options(&args.key, &args.value, args.options()).await?),
        CliCommand::Exists { keys } => json!(client.exists(&keys).await?),
        CliCommand::Del { keys } => json!(client.remove(&keys).await?),
        CliCommand::Hset { key, field, value } => json!(client.hash_set(key, field, value).await?),
        CliCommand::Hget { key, field } => json!(client.hash_get(key, field).await?),
        CliCommand::Hgetall { key } => json!(client.hash_get_all(key).await?),
        CliCommand::Hdel { key, fields } => json!(client.hash_remove(key, &fields).await?),
        CliCommand::Hexists { key, field } => json!(client.hash_exists(key, field).await?),
        CliCommand::BatchGet { keys } => json!(client.batch_get(&keys).await?),
    };

    Ok(payload)
}

fn init_logging(log_config: &LogConfig) -> Result<()> {
    let level = match log_config.level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO, // 默認為INFO
    };

    // 日誌寫到 stderr，stdout 只輸出結果
    let builder = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env().add_directive(LevelFilter::from_level(level).into()))
        .with_writer(std::io::stderr);

    let result = if log_config.format.eq_ignore_ascii_case("json") {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    };
    result.map_err(|e| anyhow!("設置日誌系統失敗: {}", e))?;

    info!("日誌系統初始化完成");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_set_args_options() {
        let cli = Cli::parse_from(["redis_adapter", "set", "k", "v", "--ex", "10", "--nx"]);
        let CliCommand::Set(args) = cli.command else {
            panic!("應解析為 set");
        };
        assert_eq!(
            args.options(),
            SetOptions::default()
                .with_expiry(Expiry::Seconds(10))
                .with_condition(SetCondition::IfNotExists)
        );
    }

    #[test]
    fn test_url_without_config_file_uses_defaults() {
        let missing = Err(ConfigError::NotFound("config/development.toml".to_string()));
        let settings = resolve_config(missing, Some("redis://h:6379")).expect("有 --url 時應可繼續");

        assert_eq!(settings.redis.url, "redis://h:6379");
        assert_eq!(settings.redis.pool_size, ApplicationConfig::default().redis.pool_size);
    }

    #[test]
    fn test_missing_config_without_url_fails() {
        let missing = Err(ConfigError::NotFound("config/development.toml".to_string()));
        assert!(resolve_config(missing, None).is_err());
    }

    #[test]
    fn test_url_overrides_loaded_config() {
        let mut loaded = ApplicationConfig::default();
        loaded.redis.pool_size = 16;

        let settings = resolve_config(Ok(&loaded), Some("redis://other:6380")).expect("應可合併");
        assert_eq!(settings.redis.url, "redis://other:6380");
        assert_eq!(settings.redis.pool_size, 16);

        let unchanged = resolve_config(Ok(&loaded), None).expect("應可合併");
        assert_eq!(unchanged.redis.url, loaded.redis.url);
    }

    #[test]
    fn test_nx_and_xx_conflict() {
        assert!(Cli::try_parse_from(["redis_adapter", "set", "k", "v", "--nx", "--xx"]).is_err());
    }

    #[test]
    fn test_global_url_override() {
        let cli = Cli::parse_from(["redis_adapter", "batch-get", "a", "b", "--url", "redis://other:6379"]);
        assert_eq!(cli.url.as_deref(), Some("redis://other:6379"));
        assert!(matches!(cli.command, CliCommand::BatchGet { ref keys } if keys.len() == 2));
    }
}
