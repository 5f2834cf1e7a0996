use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub security: SecurityConfig,
    pub geocode: GeocodeConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub debug: bool,
    pub max_upload_bytes: usize,
    pub ui_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub database_path: PathBuf,
    pub uploads_dir: PathBuf,
    pub connection_timeout_secs: u64,
    pub max_connections: u32,
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Accepted for any tenant without an explicit key.
    pub global_api_key: Option<String>,
    /// Raw JSON object of tenant -> key, as supplied through the environment.
    pub tenant_keys_json: Option<String>,
    pub tenant_keys_file: Option<PathBuf>,
    pub admin_key: Option<String>,
    /// Leaves the admin endpoint open when no admin key is configured.
    pub admin_open: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocodeConfig {
    pub endpoint: String,
    pub user_agent: String,
    pub timeout_secs: u64,
    pub retries: u32,
}

impl GeocodeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl std::fmt::Debug for SecurityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecurityConfig")
            .field("global_api_key", &self.global_api_key.as_ref().map(|_| "[REDACTED]"))
            .field("tenant_keys_json", &self.tenant_keys_json.as_ref().map(|_| "[REDACTED]"))
            .field("tenant_keys_file", &self.tenant_keys_file)
            .field("admin_key", &self.admin_key.as_ref().map(|_| "[REDACTED]"))
            .field("admin_open", &self.admin_open)
            .finish()
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            _ => Environment::Development,
        };

        match environment {
            Environment::Production => Self::production(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Server overrides
        if let Ok(v) = env::var("PORT") {
            self.server.port = v.trim().parse().unwrap_or(self.server.port);
        }
        if let Ok(v) = env::var("CONTINUUM_DEBUG") {
            self.server.debug = parse_flag(&v);
        }
        if let Ok(v) = env::var("CONTINUUM_MAX_UPLOAD_BYTES") {
            self.server.max_upload_bytes = v.trim().parse().unwrap_or(self.server.max_upload_bytes);
        }
        if let Some(v) = non_empty_var("CONTINUUM_LIBRARY_UI") {
            self.server.ui_dir = PathBuf::from(v);
        }

        // Storage overrides
        if let Some(v) = non_empty_var("CONTINUUM_DB_PATH") {
            self.storage.database_path = PathBuf::from(v);
        }
        if let Some(v) = non_empty_var("CONTINUUM_LIBRARY_UPLOADS") {
            self.storage.uploads_dir = PathBuf::from(v);
        }
        if let Ok(v) = env::var("CONTINUUM_DB_TIMEOUT_SECS") {
            self.storage.connection_timeout_secs =
                v.trim().parse().unwrap_or(self.storage.connection_timeout_secs);
        }

        // Security overrides
        self.security.global_api_key = non_empty_var("CONTINUUM_API_KEY");
        self.security.tenant_keys_json = non_empty_var("CONTINUUM_TENANT_KEYS");
        self.security.tenant_keys_file = non_empty_var("CONTINUUM_TENANT_KEYS_FILE").map(PathBuf::from);
        self.security.admin_key = non_empty_var("CONTINUUM_ADMIN_KEY");
        if let Ok(v) = env::var("CONTINUUM_ADMIN_OPEN") {
            self.security.admin_open = parse_flag(&v);
        }

        // Geocode overrides
        if let Some(v) = non_empty_var("CONTINUUM_GEOCODE_URL") {
            self.geocode.endpoint = v;
        }
        if let Ok(v) = env::var("CONTINUUM_GEOCODE_TIMEOUT_SECS") {
            self.geocode.timeout_secs = v.trim().parse().unwrap_or(self.geocode.timeout_secs);
        }
        if let Ok(v) = env::var("CONTINUUM_GEOCODE_RETRIES") {
            self.geocode.retries = v.trim().parse().unwrap_or(self.geocode.retries);
        }

        self
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                port: 5050,
                debug: false,
                max_upload_bytes: 100 * 1024 * 1024, // 100MB
                ui_dir: PathBuf::from("library"),
            },
            storage: StorageConfig {
                database_path: PathBuf::from("continuum.db"),
                uploads_dir: PathBuf::from("library_uploads"),
                connection_timeout_secs: 30,
                max_connections: 5,
            },
            security: SecurityConfig::default(),
            geocode: GeocodeConfig::default(),
        }
    }

    pub fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                port: 5050,
                debug: false,
                max_upload_bytes: 100 * 1024 * 1024, // 100MB
                ui_dir: PathBuf::from("library"),
            },
            storage: StorageConfig {
                database_path: PathBuf::from("continuum.db"),
                uploads_dir: PathBuf::from("library_uploads"),
                connection_timeout_secs: 5,
                max_connections: 16,
            },
            security: SecurityConfig::default(),
            geocode: GeocodeConfig::default(),
        }
    }

    /// Filter directive used when `RUST_LOG` is not set.
    pub fn default_log_filter(&self) -> &'static str {
        if self.server.debug {
            "continuum_library=debug,tower_http=debug,info"
        } else {
            "info"
        }
    }
}

impl Default for GeocodeConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://nominatim.openstreetmap.org/search".to_string(),
            user_agent: "ContinuumLibrary/1.0".to_string(),
            timeout_secs: 10,
            retries: 1,
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.server.port, 5050);
        assert_eq!(config.storage.uploads_dir, PathBuf::from("library_uploads"));
        assert!(!config.security.admin_open);
        assert!(config.security.admin_key.is_none());
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.storage.connection_timeout_secs, 5);
        assert_eq!(config.geocode.retries, 1);
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("1"));
        assert!(parse_flag(" TRUE "));
        assert!(!parse_flag("0"));
        assert!(!parse_flag(""));
    }

    #[test]
    fn test_security_debug_redacts_secrets() {
        let security = SecurityConfig {
            global_api_key: Some("global-secret".to_string()),
            admin_key: Some("admin-secret".to_string()),
            ..SecurityConfig::default()
        };
        let rendered = format!("{:?}", security);
        assert!(!rendered.contains("global-secret"));
        assert!(!rendered.contains("admin-secret"));
        assert!(rendered.contains("[REDACTED]"));
    }
}
