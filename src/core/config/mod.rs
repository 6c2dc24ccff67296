use log::warn;

const DEFAULT_JWT_SECRET: &str = "dev-secret-key-change-in-production-minimum-32-chars";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database_url: String,
    pub jwt_secret: String,
    pub token_ttl_minutes: i64,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub base_url: String,
}

impl AppConfig {
    /// Build configuration from the process environment.
    ///
    /// `DATABASE_URL` is the only required variable; everything else has a
    /// development default.
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?;

        let host = std::env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = std::env::var("SERVER_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);
        let base_url = std::env::var("SERVER_BASE_URL")
            .unwrap_or_else(|_| format!("http://localhost:{}", port));

        let jwt_secret = std::env::var("JWT_SECRET").unwrap_or_else(|_| {
            warn!("JWT_SECRET not set, using default development secret - DO NOT USE IN PRODUCTION");
            DEFAULT_JWT_SECRET.to_string()
        });

        let token_ttl_minutes = std::env::var("TOKEN_TTL_MINUTES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(60);

        Ok(Self {
            server: ServerConfig {
                host,
                port,
                base_url,
            },
            database_url,
            jwt_secret,
            token_ttl_minutes,
        })
    }
}
