use std::{env, path::PathBuf};

use chrono::Duration;

const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";
const DEFAULT_STATIC_DIR: &str = "./resources/www/";
const DEFAULT_SESSION_TTL_HOURS: i64 = 24;

/// Everything the session endpoints need to know about the administrator.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub admin_username: Option<String>,
    pub admin_password: Option<String>,
    pub secret: String,
    pub ttl: Duration,
}

impl SessionConfig {
    pub fn from_env() -> Self {
        let secret = env::var("SESSION_SECRET").ok().unwrap_or_else(|| {
            log::warn!(
                "SESSION_SECRET is not set, sessions will not survive a restart"
            );
            uuid::Uuid::new_v4().to_string()
        });

        let ttl_hours = match env::var("SESSION_TTL_HOURS") {
            Ok(value) => value.trim().parse().unwrap_or_else(|_| {
                log::warn!(
                    "SESSION_TTL_HOURS is not a number: {}, using {}",
                    value,
                    DEFAULT_SESSION_TTL_HOURS
                );
                DEFAULT_SESSION_TTL_HOURS
            }),
            Err(_) => DEFAULT_SESSION_TTL_HOURS,
        };

        Self {
            admin_username: non_empty_var("ADMIN_USERNAME"),
            admin_password: non_empty_var("ADMIN_PASSWORD"),
            secret,
            ttl: Duration::hours(ttl_hours),
        }
    }
}

#[derive(Debug, Clone)]
pub struct WebConfig {
    pub bind_address: String,
    pub static_dir: PathBuf,
    pub session: SessionConfig,
}

impl WebConfig {
    pub fn from_env() -> Self {
        Self {
            bind_address: non_empty_var("BIND_ADDRESS")
                .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_owned()),
            static_dir: non_empty_var("STATIC_DIR")
                .unwrap_or_else(|| DEFAULT_STATIC_DIR.to_owned())
                .into(),
            session: SessionConfig::from_env(),
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}
