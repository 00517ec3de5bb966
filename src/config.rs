use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;
use std::sync::OnceLock;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub database_url: String,
    pub jwt_secret: String,
    pub webhook_master_key: String,
    pub completion_api_key: String,
    pub payment_secret_key: String,
    pub payment_webhook_secret: String,
    pub payment_api_base: Option<String>,
    pub public_rps: u32,
    pub admin_rps: u32,
    pub session_ttl_minutes: i64,
    pub max_generated_questions: usize,
    pub uploads_dir: String,
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_address: get_env("SERVER_ADDRESS")?,
            database_url: get_env("DATABASE_URL")?,
            jwt_secret: get_env("JWT_SECRET")?,
            webhook_master_key: get_env("WEBHOOK_MASTER_KEY")?,
            completion_api_key: get_env("COMPLETION_API_KEY")?,
            payment_secret_key: get_env("PAYMENT_SECRET_KEY")?,
            payment_webhook_secret: get_env("PAYMENT_WEBHOOK_SECRET")?,
            payment_api_base: env::var("PAYMENT_API_BASE").ok(),
            public_rps: get_env_parse("PUBLIC_RPS")?,
            admin_rps: get_env_parse("ADMIN_RPS")?,
            session_ttl_minutes: get_env_parse("SESSION_TTL_MINUTES")?,
            max_generated_questions: get_env_parse("MAX_GENERATED_QUESTIONS")?,
            uploads_dir: env::var("UPLOADS_DIR").unwrap_or_else(|_| "./uploads".to_string()),
        })
    }
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

fn get_env_parse<T>(name: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw = get_env(name)?;
    raw.parse()
        .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e)))
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
