use std::time::Duration;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub llm: LlmConfig,
    pub cors_origins: Vec<String>,
    pub port: u16,
    pub rust_log: String,
}

/// Settings for the completions endpoint. Handed to `LlmClient::new`;
/// nothing in the services reads these from the environment.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Absent key is tolerated at startup and reported on the first AI call.
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            llm: LlmConfig {
                api_key: std::env::var("OPENAI_API_KEY")
                    .ok()
                    .filter(|k| !k.trim().is_empty()),
                base_url: env_or("OPENAI_BASE_URL", "https://api.openai.com/v1"),
                model: env_or("OPENAI_MODEL", "gpt-4"),
                temperature: env_or("AI_TEMPERATURE", "0.4")
                    .parse::<f32>()
                    .context("AI_TEMPERATURE must be a number")?,
                connect_timeout: Duration::from_secs(
                    env_or("AI_CONNECT_TIMEOUT_SECS", "10")
                        .parse::<u64>()
                        .context("AI_CONNECT_TIMEOUT_SECS must be a whole number of seconds")?,
                ),
                read_timeout: Duration::from_secs(
                    env_or("AI_TIMEOUT_SECS", "60")
                        .parse::<u64>()
                        .context("AI_TIMEOUT_SECS must be a whole number of seconds")?,
                ),
            },
            cors_origins: parse_origins(&env_or("CORS_ORIGINS", "http://localhost:3000")),
            port: env_or("PORT", "8080")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: env_or("RUST_LOG", "info"),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_origins_splits_and_trims() {
        let origins = parse_origins("http://a.test, http://b.test ,,");
        assert_eq!(origins, vec!["http://a.test", "http://b.test"]);
    }

    #[test]
    fn test_parse_origins_empty() {
        assert!(parse_origins("").is_empty());
    }
}
