//! Configuration management.

use std::env;
use std::time::Duration;

use crate::notifications::{AmqpSettings, BreakerConfig};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?} ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Which of the two binaries is loading the configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceKind {
    Pedido,
    Fleet,
}

impl ServiceKind {
    pub fn name(&self) -> &'static str {
        match self {
            ServiceKind::Pedido => "pedido-service",
            ServiceKind::Fleet => "fleet-service",
        }
    }

    fn default_port(&self) -> u16 {
        match self {
            ServiceKind::Pedido => 8083,
            ServiceKind::Fleet => 8082,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub service: ServiceKind,
    pub server: ServerConfig,
    pub database: Option<DatabaseConfig>,
    pub broker: BrokerConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone)]
pub struct BrokerConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub vhost: String,
    pub publish_timeout: Duration,
    pub breaker_threshold: u32,
    pub breaker_cooldown: Duration,
}

impl BrokerConfig {
    pub fn uri(&self) -> String {
        format!(
            "amqp://{}:{}@{}:{}/{}",
            urlencoding::encode(&self.username),
            urlencoding::encode(&self.password),
            self.host,
            self.port,
            urlencoding::encode(&self.vhost)
        )
    }

    pub fn amqp_settings(&self) -> AmqpSettings {
        AmqpSettings {
            uri: self.uri(),
            endpoint: format!("{}:{}{}", self.host, self.port, self.vhost),
            publish_timeout: self.publish_timeout,
            breaker: BreakerConfig {
                failure_threshold: self.breaker_threshold,
                cooldown: self.breaker_cooldown,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub format: LogFormat,
}

impl Config {
    pub fn from_env(service: ServiceKind) -> Result<Self, ConfigError> {
        Self::from_lookup(service, |key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup.
    pub fn from_lookup<F>(service: ServiceKind, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let server = ServerConfig {
            host: get("SERVER_HOST", "0.0.0.0"),
            port: parse(&lookup, "SERVER_PORT", service.default_port())?,
        };

        let database = match lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()) {
            Some(url) => Some(DatabaseConfig {
                url,
                max_connections: parse(&lookup, "DATABASE_MAX_CONNECTIONS", 10)?,
            }),
            None => None,
        };

        let broker = BrokerConfig {
            host: get("RABBITMQ_HOST", "localhost"),
            port: parse(&lookup, "RABBITMQ_PORT", 5672)?,
            username: get("RABBITMQ_USERNAME", "guest"),
            password: get("RABBITMQ_PASSWORD", "guest"),
            vhost: get("RABBITMQ_VHOST", "/"),
            publish_timeout: Duration::from_millis(parse(&lookup, "NOTIFICATIONS_PUBLISH_TIMEOUT_MS", 5000)?),
            breaker_threshold: parse(&lookup, "NOTIFICATIONS_BREAKER_THRESHOLD", 5)?,
            breaker_cooldown: Duration::from_secs(parse(&lookup, "NOTIFICATIONS_BREAKER_COOLDOWN_SECS", 30)?),
        };

        if broker.breaker_threshold == 0 {
            return Err(ConfigError::Invalid {
                key: "NOTIFICATIONS_BREAKER_THRESHOLD",
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        let format = match get("LOG_FORMAT", "pretty").to_ascii_lowercase().as_str() {
            "pretty" => LogFormat::Pretty,
            "json" => LogFormat::Json,
            other => {
                return Err(ConfigError::Invalid {
                    key: "LOG_FORMAT",
                    value: other.to_string(),
                    reason: "expected pretty or json".to_string(),
                })
            }
        };

        Ok(Self {
            service,
            server,
            database,
            broker,
            logging: LoggingConfig { format },
        })
    }
}

fn parse<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            value: raw.clone(),
            reason: e.to_string(),
        }),
    }
}
