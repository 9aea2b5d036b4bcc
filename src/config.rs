// Settings sourced from the process environment. Nothing here fails: a missing
// key or secret only matters once a login is attempted.

use std::env;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

pub const BASE_URL_VAR: &str = "SEESAW_BASE_URL";
pub const API_KEY_VAR: &str = "SEESAW_API_KEY";
pub const API_SECRET_VAR: &str = "SEESAW_API_SECRET";
pub const TOKEN_CACHE_VAR: &str = "SEESAW_TOKEN_CACHE";
pub const LOG_VAR: &str = "SEESAW_LOG";

const DEFAULT_BASE_URL: &str = "http://localhost:3000/v1";
const TOKEN_CACHE_FILE: &str = ".seesaw_token.json";

/// API key pair used for the agent login exchange.
#[derive(Clone, Default)]
pub struct Credentials {
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
}

impl Credentials {
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            api_secret: Some(api_secret.into()),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key)
            .field("api_secret", &self.api_secret.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub base_url: String,
    pub credentials: Credentials,
    pub token_cache: PathBuf,
    pub login_timeout: Duration,
    pub request_timeout: Duration,
    pub upload_timeout: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            credentials: Credentials::default(),
            token_cache: default_token_cache(),
            login_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(15),
            upload_timeout: Duration::from_secs(60),
        }
    }
}

impl Settings {
    /// Read settings from `SEESAW_*` variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Settings::default();
        Self {
            base_url: non_empty_var(BASE_URL_VAR).unwrap_or(defaults.base_url),
            credentials: Credentials {
                api_key: non_empty_var(API_KEY_VAR),
                api_secret: non_empty_var(API_SECRET_VAR),
            },
            token_cache: non_empty_var(TOKEN_CACHE_VAR)
                .map(PathBuf::from)
                .unwrap_or(defaults.token_cache),
            ..defaults
        }
    }

    /// Names of the variables the CLI refuses to start without.
    pub fn missing_env_vars() -> Vec<&'static str> {
        [BASE_URL_VAR, API_KEY_VAR, API_SECRET_VAR]
            .into_iter()
            .filter(|name| non_empty_var(name).is_none())
            .collect()
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn default_token_cache() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(env::temp_dir)
        .join(TOKEN_CACHE_FILE)
}

/// Install the stderr log subscriber. `SEESAW_LOG` wins over `level`.
pub fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_env(LOG_VAR).unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
