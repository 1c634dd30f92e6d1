// ============================
// crates/backend-lib/src/config.rs
// ============================
//! Configuration management.
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use logincount_common::{DEFAULT_API_PORT, DEFAULT_PUSH_PORT};
use serde::{Deserialize, Serialize};

use crate::auth::{DEFAULT_LOG_N, DEFAULT_TOKEN_TTL};
use crate::error::AppError;

/// Default configuration file, read when present
pub const DEFAULT_CONFIG_FILE: &str = "logincount.toml";

/// Prefix of environment variables overriding settings
pub const ENV_PREFIX: &str = "LOGINCOUNT_";

const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Application settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    /// Bind address of the GraphQL endpoint
    pub api_addr: SocketAddr,
    /// Bind address of the push channel
    pub push_addr: SocketAddr,
    /// SQLite database file
    pub database_path: PathBuf,
    /// Log level used when `RUST_LOG` is unset
    pub log_level: String,
    /// Secret used to sign session tokens
    pub token_secret: String,
    /// Session token lifetime in seconds
    pub token_ttl_secs: u64,
    /// scrypt cost parameter (log2 of N)
    pub password_hash_log_n: u8,
    /// Accept tokens wrapped in double quotes, as sent by the legacy web client
    pub legacy_quoted_tokens: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_addr: SocketAddr::from(([127, 0, 0, 1], DEFAULT_API_PORT)),
            push_addr: SocketAddr::from(([127, 0, 0, 1], DEFAULT_PUSH_PORT)),
            database_path: PathBuf::from("mydb.sqlite"),
            log_level: "info".to_string(),
            token_secret: String::new(),
            token_ttl_secs: DEFAULT_TOKEN_TTL.as_secs(),
            password_hash_log_n: DEFAULT_LOG_N,
            legacy_quoted_tokens: false,
        }
    }
}

impl Settings {
    /// Load settings from defaults, `logincount.toml` and `LOGINCOUNT_*` variables
    pub fn load() -> Result<Self, AppError> {
        Self::figment(Path::new(DEFAULT_CONFIG_FILE)).extract().map_err(AppError::from)
    }

    /// Load settings reading the given TOML file instead of the default one
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, AppError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(AppError::Config(format!(
                "config file {} does not exist",
                path.display()
            )));
        }
        Self::figment(path).extract().map_err(AppError::from)
    }

    fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX))
    }

    /// Check the settings before any listener or database is opened
    pub fn validate(&self) -> Result<(), AppError> {
        if self.token_secret.trim().is_empty() {
            return Err(AppError::Config(format!(
                "token_secret must be set (e.g. via {ENV_PREFIX}TOKEN_SECRET)"
            )));
        }
        if self.token_ttl_secs == 0 {
            return Err(AppError::Config("token_ttl_secs must be positive".into()));
        }
        if !VALID_LOG_LEVELS.contains(&self.log_level.to_ascii_lowercase().as_str()) {
            return Err(AppError::Config(format!(
                "invalid log_level '{}'",
                self.log_level
            )));
        }
        // scrypt requires 0 < log_n < 64; above 20 a single hash takes seconds
        if self.password_hash_log_n == 0 || self.password_hash_log_n > 20 {
            return Err(AppError::Config(format!(
                "password_hash_log_n must be within 1..=20, got {}",
                self.password_hash_log_n
            )));
        }
        if self.api_addr == self.push_addr {
            return Err(AppError::Config(
                "api_addr and push_addr must differ".into(),
            ));
        }
        Ok(())
    }

    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    fn valid() -> Settings {
        Settings {
            token_secret: "test-secret".to_string(),
            ..Settings::default()
        }
    }

    #[test]
    fn test_settings_validation() {
        assert!(valid().validate().is_ok());

        // Missing secret
        assert!(Settings::default().validate().is_err());

        let mut invalid = valid();
        invalid.log_level = "loud".to_string();
        assert!(invalid.validate().is_err());

        let mut invalid = valid();
        invalid.token_ttl_secs = 0;
        assert!(invalid.validate().is_err());

        let mut invalid = valid();
        invalid.password_hash_log_n = 0;
        assert!(invalid.validate().is_err());

        let mut invalid = valid();
        invalid.push_addr = invalid.api_addr;
        assert!(invalid.validate().is_err());
    }

    #[test]
    fn test_defaults_match_legacy_deployment() {
        let settings = Settings::default();
        assert_eq!(settings.api_addr.port(), 4001);
        assert_eq!(settings.push_addr.port(), 3000);
        assert_eq!(settings.token_ttl(), Duration::from_secs(3600));
        assert_eq!(settings.token_ttl(), DEFAULT_TOKEN_TTL);
        assert_eq!(settings.password_hash_log_n, DEFAULT_LOG_N);
        assert_eq!(settings.database_path, PathBuf::from("mydb.sqlite"));
    }

    #[test]
    fn test_load_from_file_and_env() {
        Jail::expect_with(|jail| {
            jail.create_file(
                DEFAULT_CONFIG_FILE,
                r#"
                    api_addr = "0.0.0.0:8080"
                    token_secret = "from-file"
                    legacy_quoted_tokens = true
                "#,
            )?;
            jail.set_env("LOGINCOUNT_TOKEN_SECRET", "from-env");
            jail.set_env("LOGINCOUNT_TOKEN_TTL_SECS", "120");

            let settings = Settings::load().expect("settings load");
            assert_eq!(settings.api_addr.port(), 8080);
            assert_eq!(settings.token_secret, "from-env");
            assert_eq!(settings.token_ttl_secs, 120);
            assert!(settings.legacy_quoted_tokens);
            // untouched keys keep their defaults
            assert_eq!(settings.push_addr.port(), 3000);
            Ok(())
        });
    }

    #[test]
    fn test_load_from_missing_file() {
        Jail::expect_with(|_jail| {
            assert!(matches!(
                Settings::load_from("nope.toml"),
                Err(AppError::Config(_))
            ));
            Ok(())
        });
    }
}
