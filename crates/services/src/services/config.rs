use serde::{Deserialize, Serialize};

const HOST_ENV: &str = "PLANBOARD_HOST";
const PORT_ENV: &str = "PLANBOARD_PORT";
const PORT_FALLBACK_ENV: &str = "PORT";
const ENV_ENV: &str = "PLANBOARD_ENV";
const JWT_SECRET_ENV: &str = "PLANBOARD_JWT_SECRET";
const FRONTEND_URL_ENV: &str = "PLANBOARD_FRONTEND_URL";

const DEFAULT_PORT: u16 = 5000;
const DEFAULT_FRONTEND_URL: &str = "http://localhost:5173";
const DEV_JWT_SECRET: &str = "planboard-dev-secret";

/// Runtime configuration, resolved once at bootstrap from the environment.
/// Every key has a default so a bare `server` invocation works.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub jwt_secret: String,
    pub frontend_url: String,
}

impl Config {
    pub fn from_env() -> Self {
        let host = env_trimmed(HOST_ENV).unwrap_or_else(|| "127.0.0.1".to_string());

        let port = env_trimmed(PORT_ENV)
            .or_else(|| env_trimmed(PORT_FALLBACK_ENV))
            .and_then(|raw| match raw.parse::<u16>() {
                Ok(port) => Some(port),
                Err(err) => {
                    tracing::warn!(value = %raw, error = %err, "Invalid port; using default");
                    None
                }
            })
            .unwrap_or(DEFAULT_PORT);

        let environment = env_trimmed(ENV_ENV).unwrap_or_else(|| "production".to_string());

        let jwt_secret = env_trimmed(JWT_SECRET_ENV).unwrap_or_else(|| {
            tracing::warn!(
                "{JWT_SECRET_ENV} is not set; falling back to the development secret"
            );
            DEV_JWT_SECRET.to_string()
        });

        let frontend_url =
            env_trimmed(FRONTEND_URL_ENV).unwrap_or_else(|| DEFAULT_FRONTEND_URL.to_string());

        Self {
            host,
            port,
            environment,
            jwt_secret,
            frontend_url,
        }
    }

    pub fn dev_mode(&self) -> bool {
        self.environment == "development"
    }
}

fn env_trimmed(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
