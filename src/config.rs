use std::env;
use std::str::FromStr;

use crate::error::{AppError, AppResult};

/// Optional account created at startup so a fresh deployment has an administrator.
#[derive(Clone, Debug)]
pub struct BootstrapAdmin {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: String,
}

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub jwt_secret: String,
    pub jwt_expiration_hours: i64,
    pub server_host: String,
    pub server_port: u16,
    pub request_timeout_secs: u64,
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

impl Config {
    pub fn from_env() -> AppResult<Self> {
        dotenvy::dotenv().ok();

        let bootstrap_admin = match (env::var("ADMIN_EMAIL"), env::var("ADMIN_PASSWORD")) {
            (Ok(email), Ok(password)) => Some(BootstrapAdmin {
                name: env::var("ADMIN_NAME").unwrap_or_else(|_| "Admin".to_string()),
                email,
                password,
                phone: env::var("ADMIN_PHONE").unwrap_or_else(|_| "0000000000".to_string()),
            }),
            _ => None,
        };

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            database_max_connections: parsed_or("DATABASE_MAX_CONNECTIONS", 10)?,
            jwt_secret: required("JWT_SECRET")?,
            jwt_expiration_hours: parsed_or("JWT_EXPIRATION_HOURS", 24 * 7)?,
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            server_port: parsed_or("SERVER_PORT", 5000)?,
            request_timeout_secs: parsed_or("REQUEST_TIMEOUT_SECS", 30)?,
            bootstrap_admin,
        })
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

fn required(key: &str) -> AppResult<String> {
    env::var(key).map_err(|_| AppError::Internal(format!("{} must be set", key)))
}

fn parsed_or<T: FromStr>(key: &str, default: T) -> AppResult<T> {
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| AppError::Internal(format!("{} must be a number", key))),
        Err(_) => Ok(default),
    }
}
