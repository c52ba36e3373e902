use crate::constants;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// `None` keeps the problem store in memory.
    pub database_url: Option<String>,
    pub development: bool,
    pub max_body_bytes: usize,
    pub match_threshold: f64,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub server_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: constants::DEFAULT_HOST.to_string(),
            port: constants::DEFAULT_PORT,
            database_url: None,
            development: false,
            max_body_bytes: constants::MAX_BODY_BYTES,
            match_threshold: constants::DEFAULT_MATCH_THRESHOLD,
            openai_api_key: None,
            openai_model: constants::DEFAULT_OPENAI_MODEL.to_string(),
            server_url: constants::DEFAULT_SERVER_URL.to_string(),
        }
    }
}

impl Config {
    /// Build the configuration from the process environment, falling back to defaults.
    pub fn new() -> Self {
        let defaults = Self::default();

        let host = std::env::var("HOST").unwrap_or(defaults.host);
        let port: u16 = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(defaults.port);

        Self {
            server_url: std::env::var("SOLVY_SERVER_URL")
                .unwrap_or_else(|_| format!("http://{}:{}", host, port)),
            host,
            port,
            database_url: non_empty_var("DATABASE_URL"),
            development: std::env::var("SOLVY_ENV")
                .map(|v| v.eq_ignore_ascii_case("development"))
                .unwrap_or(false),
            max_body_bytes: std::env::var("MAX_BODY_BYTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_body_bytes),
            match_threshold: std::env::var("MATCH_THRESHOLD")
                .ok()
                .and_then(|v| v.parse::<f64>().ok())
                .filter(|t| (0.0..=1.0).contains(t))
                .unwrap_or(defaults.match_threshold),
            openai_api_key: non_empty_var("OPENAI_API_KEY"),
            openai_model: std::env::var("OPENAI_MODEL").unwrap_or(defaults.openai_model),
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_use_in_memory_store() {
        let config = Config::default();
        assert!(config.database_url.is_none());
        assert!(!config.development);
        assert_eq!(config.port, 5000);
        assert_eq!(config.max_body_bytes, 50 * 1024 * 1024);
    }
}
