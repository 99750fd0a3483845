use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    File,
    Sqlite,
}

impl std::str::FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(StoreBackend::Memory),
            "file" => Ok(StoreBackend::File),
            "sqlite" => Ok(StoreBackend::Sqlite),
            other => Err(format!("unknown store backend '{}'", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub jwt_secret: String,
    pub store_backend: StoreBackend,
    pub store_path: String,
    pub store_database_url: Option<String>,
    pub submit_webhook_url: Option<String>,
    pub submit_webhook_secret: Option<String>,
    pub public_rps: u32,
    pub api_rps: u32,
    pub welcome_grant_points: i64,
    pub feature_listing_cost: i64,
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let store_backend: StoreBackend = get_env_or("STORE_BACKEND", "file")
            .parse()
            .map_err(Error::Config)?;

        let store_database_url = env::var("STORE_DATABASE_URL").ok();
        if store_backend == StoreBackend::Sqlite && store_database_url.is_none() {
            return Err(Error::Config(
                "STORE_DATABASE_URL is required when STORE_BACKEND=sqlite".to_string(),
            ));
        }

        let submit_webhook_url = env::var("SUBMIT_WEBHOOK_URL").ok();
        if let Some(raw) = &submit_webhook_url {
            url::Url::parse(raw)
                .map_err(|e| Error::Config(format!("Invalid SUBMIT_WEBHOOK_URL: {}", e)))?;
        }

        Ok(Self {
            server_address: get_env("SERVER_ADDRESS")?,
            jwt_secret: get_env("JWT_SECRET")?,
            store_backend,
            store_path: get_env_or("STORE_PATH", "./data"),
            store_database_url,
            submit_webhook_url,
            submit_webhook_secret: env::var("SUBMIT_WEBHOOK_SECRET").ok(),
            public_rps: get_env_parse_or("PUBLIC_RPS", 50)?,
            api_rps: get_env_parse_or("API_RPS", 100)?,
            welcome_grant_points: get_env_parse_or("WELCOME_GRANT_POINTS", 100)?,
            feature_listing_cost: get_env_parse_or("FEATURE_LISTING_COST", 50)?,
        })
    }
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

fn get_env_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn get_env_parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
        Err(_) => Ok(default),
    }
}

pub fn init_config() -> Result<()> {
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| Error::Config("Configuration has already been initialized".to_string()))?;
    Ok(())
}

pub fn get_config() -> &'static Config {
    CONFIG
        .get()
        .expect("Configuration has not been initialized")
}
