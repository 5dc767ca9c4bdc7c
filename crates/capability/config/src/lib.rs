//! 应用运行配置加载。

use std::env;

/// 配置加载错误。
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required env: {0}")]
    Missing(String),
    #[error("invalid value for {0}: {1}")]
    Invalid(String, String),
}

/// MQTT 发布链路配置。
#[derive(Debug, Clone)]
pub struct MqttConfig {
    pub enabled: bool,
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub client_id: String,
    pub topic_prefix: String,
    pub qos: u8,
    pub retain: bool,
    pub unpublish_delay_seconds: u64,
    /// 周期性全量同步间隔，`None` 表示关闭。
    pub full_resync_seconds: Option<u64>,
}

/// 应用运行配置。
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub http_addr: String,
    pub database_url: String,
    pub mqtt: MqttConfig,
}

impl AppConfig {
    /// 从环境变量读取配置。
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = env::var("HUB_DATABASE_URL")
            .map_err(|_| ConfigError::Missing("HUB_DATABASE_URL".to_string()))?;
        let http_addr = env::var("HUB_HTTP_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());

        Ok(Self {
            http_addr,
            database_url,
            mqtt: MqttConfig::from_env()?,
        })
    }
}

impl MqttConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let enabled = read_bool_with_default("HUB_MQTT_ENABLED", true);
        let host = env::var("HUB_MQTT_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = read_u16_with_default("HUB_MQTT_PORT", 1883)?;
        let username = read_optional("HUB_MQTT_USERNAME");
        let password = read_optional("HUB_MQTT_PASSWORD");
        if username.is_some() != password.is_some() {
            let key = if username.is_some() {
                "HUB_MQTT_PASSWORD"
            } else {
                "HUB_MQTT_USERNAME"
            };
            return Err(ConfigError::Missing(key.to_string()));
        }
        let client_id = read_optional("HUB_MQTT_CLIENT_ID")
            .unwrap_or_else(|| format!("hub-publisher-{}", uuid::Uuid::new_v4().simple()));
        let topic_prefix = env::var("HUB_MQTT_TOPIC_PREFIX")
            .map(|value| value.trim_end_matches('/').to_string())
            .unwrap_or_else(|_| "supla".to_string());
        if topic_prefix.is_empty() {
            return Err(ConfigError::Invalid(
                "HUB_MQTT_TOPIC_PREFIX".to_string(),
                topic_prefix,
            ));
        }
        let qos = read_u8_with_default("HUB_MQTT_QOS", 0)?;
        if qos > 2 {
            return Err(ConfigError::Invalid("HUB_MQTT_QOS".to_string(), qos.to_string()));
        }
        let retain = read_bool_with_default("HUB_MQTT_RETAIN", true);
        let unpublish_delay_seconds = read_u64_with_default("HUB_MQTT_UNPUBLISH_DELAY_SECONDS", 20)?;
        let full_resync_seconds =
            Some(read_u64_with_default("HUB_MQTT_FULL_RESYNC_SECONDS", 3600)?).filter(|value| *value > 0);

        Ok(Self {
            enabled,
            host,
            port,
            username,
            password,
            client_id,
            topic_prefix,
            qos,
            retain,
            unpublish_delay_seconds,
            full_resync_seconds,
        })
    }
}

fn read_u16_with_default(key: &str, default: u16) -> Result<u16, ConfigError> {
    let value = match env::var(key) {
        Ok(value) => value,
        Err(_) => return Ok(default),
    };
    value
        .parse::<u16>()
        .map_err(|_| ConfigError::Invalid(key.to_string(), value))
}

fn read_u8_with_default(key: &str, default: u8) -> Result<u8, ConfigError> {
    let value = match env::var(key) {
        Ok(value) => value,
        Err(_) => return Ok(default),
    };
    value
        .parse::<u8>()
        .map_err(|_| ConfigError::Invalid(key.to_string(), value))
}

fn read_u64_with_default(key: &str, default: u64) -> Result<u64, ConfigError> {
    let value = match env::var(key) {
        Ok(value) => value,
        Err(_) => return Ok(default),
    };
    value
        .parse::<u64>()
        .map_err(|_| ConfigError::Invalid(key.to_string(), value))
}

fn read_optional(key: &str) -> Option<String> {
    match env::var(key) {
        Ok(value) if !value.is_empty() => Some(value),
        _ => None,
    }
}

fn read_bool_with_default(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(value) => matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "on"),
        Err(_) => default,
    }
}
