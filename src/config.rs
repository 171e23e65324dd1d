use std::net::SocketAddr;
use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "RecoveryTracker";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:5000";
const DEFAULT_SESSION_TTL_SECS: u64 = 8 * 60 * 60;
/// Longest login session accepted from configuration (30 days).
pub const MAX_SESSION_TTL_SECS: u64 = 30 * 24 * 60 * 60;
pub const DEFAULT_PASSWORD_ITERATIONS: u32 = 100_000;

/// Default `EnvFilter` directive when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "recovery_tracker_lib=info,recovery_tracker=info,tower_http=info"
}

/// Get the application data directory
/// ~/RecoveryTracker/ unless overridden by `RECOVERY_DATA_DIR`.
pub fn app_data_dir() -> Result<PathBuf, ConfigError> {
    let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
    Ok(home.join(APP_NAME))
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required setting {0}")]
    Missing(&'static str),
    #[error("Invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
    #[error("Cannot determine home directory")]
    NoHomeDir,
}

/// Credentials for the bootstrap admin account.
#[derive(Clone)]
pub struct AdminCredentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for AdminCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Runtime configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub data_dir: PathBuf,
    /// Built SPA assets. Served with an `index.html` fallback when set.
    pub static_dir: Option<PathBuf>,
    pub session_ttl_secs: u64,
    pub password_iterations: u32,
    pub admin: AdminCredentials,
}

impl AppConfig {
    /// Read configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// Admin credentials have no fallback: a missing or blank
    /// `ADMIN_USERNAME`/`ADMIN_PASSWORD` fails startup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind_raw = non_empty("RECOVERY_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.into());
        let bind_addr = bind_raw.parse().map_err(|_| ConfigError::Invalid {
            key: "RECOVERY_BIND_ADDR",
            value: bind_raw.clone(),
        })?;

        let data_dir = match non_empty("RECOVERY_DATA_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => app_data_dir()?,
        };

        let session_ttl_secs = parse_or(
            non_empty("RECOVERY_SESSION_TTL_SECS"),
            "RECOVERY_SESSION_TTL_SECS",
            DEFAULT_SESSION_TTL_SECS,
        )?;
        if session_ttl_secs == 0 || session_ttl_secs > MAX_SESSION_TTL_SECS {
            return Err(ConfigError::Invalid {
                key: "RECOVERY_SESSION_TTL_SECS",
                value: session_ttl_secs.to_string(),
            });
        }
        let password_iterations = parse_or(
            non_empty("RECOVERY_PASSWORD_ITERATIONS"),
            "RECOVERY_PASSWORD_ITERATIONS",
            DEFAULT_PASSWORD_ITERATIONS,
        )?;
        if password_iterations == 0 {
            return Err(ConfigError::Invalid {
                key: "RECOVERY_PASSWORD_ITERATIONS",
                value: "0".into(),
            });
        }

        let admin = AdminCredentials {
            username: non_empty("ADMIN_USERNAME").ok_or(ConfigError::Missing("ADMIN_USERNAME"))?,
            password: non_empty("ADMIN_PASSWORD").ok_or(ConfigError::Missing("ADMIN_PASSWORD"))?,
        };

        Ok(Self {
            bind_addr,
            data_dir,
            static_dir: non_empty("RECOVERY_STATIC_DIR").map(PathBuf::from),
            session_ttl_secs,
            password_iterations,
            admin,
        })
    }

    /// Path of the SQLite database file.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("recovery.db")
    }
}

fn parse_or<T: std::str::FromStr>(
    raw: Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
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
    fn missing_admin_password_fails_startup() {
        let result = AppConfig::from_lookup(lookup_from(&[
            ("ADMIN_USERNAME", "admin"),
            ("RECOVERY_DATA_DIR", "/tmp/rt"),
        ]));
        assert!(matches!(result, Err(ConfigError::Missing("ADMIN_PASSWORD"))));
    }

    #[test]
    fn blank_admin_username_is_missing() {
        let result = AppConfig::from_lookup(lookup_from(&[
            ("ADMIN_USERNAME", "   "),
            ("ADMIN_PASSWORD", "s3cret"),
            ("RECOVERY_DATA_DIR", "/tmp/rt"),
        ]));
        assert!(matches!(result, Err(ConfigError::Missing("ADMIN_USERNAME"))));
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("ADMIN_USERNAME", "admin"),
            ("ADMIN_PASSWORD", "s3cret"),
            ("RECOVERY_DATA_DIR", "/tmp/rt"),
        ]))
        .unwrap();
        assert_eq!(config.bind_addr.to_string(), DEFAULT_BIND_ADDR);
        assert_eq!(config.session_ttl_secs, DEFAULT_SESSION_TTL_SECS);
        assert_eq!(config.password_iterations, DEFAULT_PASSWORD_ITERATIONS);
        assert_eq!(config.database_path(), PathBuf::from("/tmp/rt/recovery.db"));
        assert!(config.static_dir.is_none());
    }

    #[test]
    fn session_ttl_must_be_bounded() {
        for ttl in ["0", "2592001", "18446744073709551615"] {
            let result = AppConfig::from_lookup(lookup_from(&[
                ("ADMIN_USERNAME", "admin"),
                ("ADMIN_PASSWORD", "s3cret"),
                ("RECOVERY_DATA_DIR", "/tmp/rt"),
                ("RECOVERY_SESSION_TTL_SECS", ttl),
            ]));
            assert!(
                matches!(result, Err(ConfigError::Invalid { key: "RECOVERY_SESSION_TTL_SECS", .. })),
                "{ttl} accepted"
            );
        }
        let config = AppConfig::from_lookup(lookup_from(&[
            ("ADMIN_USERNAME", "admin"),
            ("ADMIN_PASSWORD", "s3cret"),
            ("RECOVERY_DATA_DIR", "/tmp/rt"),
            ("RECOVERY_SESSION_TTL_SECS", "2592000"),
        ]))
        .unwrap();
        assert_eq!(config.session_ttl_secs, MAX_SESSION_TTL_SECS);
    }

    #[test]
    fn invalid_bind_addr_rejected() {
        let result = AppConfig::from_lookup(lookup_from(&[
            ("ADMIN_USERNAME", "admin"),
            ("ADMIN_PASSWORD", "s3cret"),
            ("RECOVERY_DATA_DIR", "/tmp/rt"),
            ("RECOVERY_BIND_ADDR", "not-an-addr"),
        ]));
        assert!(matches!(
            result,
            Err(ConfigError::Invalid { key: "RECOVERY_BIND_ADDR", .. })
        ));
    }

    #[test]
    fn zero_iterations_rejected() {
        let result = AppConfig::from_lookup(lookup_from(&[
            ("ADMIN_USERNAME", "admin"),
            ("ADMIN_PASSWORD", "s3cret"),
            ("RECOVERY_DATA_DIR", "/tmp/rt"),
            ("RECOVERY_PASSWORD_ITERATIONS", "0"),
        ]));
        assert!(result.is_err());
    }

    #[test]
    fn debug_output_redacts_password() {
        let creds = AdminCredentials {
            username: "admin".into(),
            password: "hunter2".into(),
        };
        let printed = format!("{creds:?}");
        assert!(!printed.contains("hunter2"));
    }
}
