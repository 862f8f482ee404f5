use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

/// Application-level constants
pub const APP_NAME: &str = "MediMate";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default Gemini `generateContent` endpoint.
pub const DEFAULT_GEMINI_API_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent";

const DEFAULT_ORACLE_TIMEOUT_SECS: u64 = 60;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Default tracing filter when neither `MEDIMATE_LOG` nor `RUST_LOG` is set.
pub fn default_log_filter() -> &'static str {
    "medimate=info,medimate_lib=info,tower_http=warn"
}

/// Get the application data directory
/// ~/MediMate/ on all platforms, falling back to the working directory.
pub fn app_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Default location of the SQLite database.
pub fn default_db_path() -> PathBuf {
    app_data_dir().join("medimate.db")
}

/// Merge a `.env` file from the working directory (or a parent) into the
/// process environment. Variables already set win.
pub fn load_dotenv() -> Option<PathBuf> {
    dotenvy::dotenv().ok()
}

/// Tracing filter: `MEDIMATE_LOG`, then `RUST_LOG`, then the default.
pub fn log_filter() -> String {
    std::env::var("MEDIMATE_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .ok()
        .filter(|f| !f.trim().is_empty())
        .unwrap_or_else(|| default_log_filter().to_string())
}

/// Runtime configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub db_path: PathBuf,
    pub gemini_api_url: String,
    pub gemini_api_key: Option<String>,
    /// Upper bound on a single oracle round trip.
    pub oracle_timeout_secs: u64,
    pub max_upload_bytes: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            db_path: default_db_path(),
            gemini_api_url: DEFAULT_GEMINI_API_URL.to_string(),
            gemini_api_key: None,
            oracle_timeout_secs: DEFAULT_ORACLE_TIMEOUT_SECS,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl AppConfig {
    /// Load configuration from the process environment.
    ///
    /// Call [`load_dotenv`] first for `.env` values to be visible.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let gemini_api_key = lookup("GEMINI_API_KEY").filter(|k| !k.trim().is_empty());
        if gemini_api_key.is_none() {
            tracing::warn!("GEMINI_API_KEY not set; oracle requests will be unauthenticated");
        }

        Self {
            bind_addr: parse_or(&lookup, "MEDIMATE_BIND", defaults.bind_addr),
            db_path: lookup("MEDIMATE_DB_PATH")
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.db_path),
            gemini_api_url: lookup("GEMINI_API_URL")
                .filter(|u| !u.trim().is_empty())
                .unwrap_or(defaults.gemini_api_url),
            gemini_api_key,
            oracle_timeout_secs: parse_or(&lookup, "ORACLE_TIMEOUT_SECS", defaults.oracle_timeout_secs),
            max_upload_bytes: parse_or(&lookup, "MEDIMATE_MAX_UPLOAD_BYTES", defaults.max_upload_bytes),
        }
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => default,
        Some(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!(key, value = %raw, "Invalid config value, using default");
                default
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn app_data_dir_ends_with_app_name() {
        assert!(app_data_dir().ends_with("MediMate"));
    }

    #[test]
    fn default_db_path_under_app_data() {
        let db = default_db_path();
        assert!(db.starts_with(app_data_dir()));
        assert!(db.ends_with("medimate.db"));
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let config = AppConfig::from_lookup(|_| None);
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:8080");
        assert_eq!(config.gemini_api_url, DEFAULT_GEMINI_API_URL);
        assert!(config.gemini_api_key.is_none());
        assert_eq!(config.oracle_timeout_secs, 60);
        assert_eq!(config.max_upload_bytes, 10 * 1024 * 1024);
    }

    #[test]
    fn environment_overrides_defaults() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("MEDIMATE_BIND", "0.0.0.0:9000"),
            ("MEDIMATE_DB_PATH", "/tmp/test.db"),
            ("GEMINI_API_URL", "http://localhost:1234/generate"),
            ("GEMINI_API_KEY", "secret"),
            ("ORACLE_TIMEOUT_SECS", "5"),
        ]));
        assert_eq!(config.bind_addr.port(), 9000);
        assert_eq!(config.db_path, PathBuf::from("/tmp/test.db"));
        assert_eq!(config.gemini_api_url, "http://localhost:1234/generate");
        assert_eq!(config.gemini_api_key.as_deref(), Some("secret"));
        assert_eq!(config.oracle_timeout_secs, 5);
    }

    #[test]
    fn invalid_numbers_fall_back_to_defaults() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("ORACLE_TIMEOUT_SECS", "soon"),
            ("MEDIMATE_MAX_UPLOAD_BYTES", "-1"),
            ("MEDIMATE_BIND", "not an address"),
        ]));
        assert_eq!(config.oracle_timeout_secs, 60);
        assert_eq!(config.max_upload_bytes, 10 * 1024 * 1024);
        assert_eq!(config.bind_addr.port(), 8080);
    }

    #[test]
    fn blank_api_key_is_treated_as_missing() {
        let config = AppConfig::from_lookup(lookup_from(&[("GEMINI_API_KEY", "  ")]));
        assert!(config.gemini_api_key.is_none());
    }

    #[test]
    fn app_name_is_medimate() {
        assert_eq!(APP_NAME, "MediMate");
    }
}
