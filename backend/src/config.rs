use std::env;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host (default: 0.0.0.0)
    pub host: String,
    /// Server port (default: 3000)
    pub port: u16,
    /// Auth0 tenant domain, used to derive the JWKS URI
    pub auth0_domain: String,
    /// Expected token audience (API identifier)
    pub auth0_audience: String,
    /// Expected token issuer URL
    pub auth0_issuer_url: String,
    /// SQLite database URL
    pub database_url: String,
    /// Log level (default: info)
    pub log_level: String,
    /// CORS allowed origins (comma-separated, default: *)
    pub cors_origins: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Config {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidPort)?,
            auth0_domain: env::var("AUTH0_DOMAIN")
                .map_err(|_| ConfigError::MissingEnvVar("AUTH0_DOMAIN"))?,
            auth0_audience: env::var("AUTH0_AUDIENCE")
                .map_err(|_| ConfigError::MissingEnvVar("AUTH0_AUDIENCE"))?,
            auth0_issuer_url: env::var("AUTH0_ISSUER_URL")
                .map_err(|_| ConfigError::MissingEnvVar("AUTH0_ISSUER_URL"))?,
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:./data/users.db".to_string()),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            cors_origins: env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string()),
        })
    }

    /// JWKS endpoint for the configured Auth0 tenant.
    pub fn jwks_uri(&self) -> String {
        format!(
            "https://{}/.well-known/jwks.json",
            self.auth0_domain.trim_end_matches('/')
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(&'static str),
    #[error("Invalid port number")]
    InvalidPort,
}
