use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

/// Config file looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "agworld-dashboard.toml";
pub const CONFIG_PATH_ENV: &str = "AGWORLD_DASHBOARD_CONFIG";
pub const PASSWORD_ENV: &str = "AGWORLD_DB_PASSWORD";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid colour for theme.{key}: {value:?}")]
    InvalidColor { key: &'static str, value: String },
}

// ---------------------------------------------------------------------------
// Config sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub source: SourceConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub display: DisplayConfig,

    #[serde(default)]
    pub theme: ThemeConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct DatabaseConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_db_name")]
    pub name: String,

    #[serde(default = "default_user")]
    pub user: String,

    /// Overridden by `AGWORLD_DB_PASSWORD` when set.
    #[serde(default)]
    pub password: Option<String>,

    /// Table (or view) holding the custom report.
    #[serde(default = "default_table")]
    pub table: String,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
pub struct SourceConfig {
    /// Read this CSV export instead of querying the database.
    #[serde(default)]
    pub snapshot: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
pub struct CacheConfig {
    /// Seconds before the loaded table is re-queried (0 = never).
    #[serde(default)]
    pub ttl_secs: u64,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct DisplayConfig {
    #[serde(default = "default_title")]
    pub title: String,

    #[serde(default = "default_logo")]
    pub logo: Option<PathBuf>,

    #[serde(default = "default_table_height")]
    pub table_height: f32,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ThemeConfig {
    #[serde(default = "default_site_bg")]
    pub site_bg: String,
    #[serde(default = "default_sidebar_bg")]
    pub sidebar_bg: String,
    #[serde(default = "default_text")]
    pub text: String,
    #[serde(default = "default_header")]
    pub header: String,
    #[serde(default = "default_header_text")]
    pub header_text: String,
    #[serde(default = "default_cell_bg")]
    pub cell_bg: String,
    #[serde(default = "default_text")]
    pub cell_text: String,
    #[serde(default = "default_border")]
    pub border: String,
}

// Default value functions
fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5432
}

fn default_db_name() -> String {
    "agworld".to_string()
}

fn default_user() -> String {
    "postgres".to_string()
}

fn default_table() -> String {
    "agworld_custom_report".to_string()
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_title() -> String {
    "🧑‍🌾 Agworld Observations Dashboard".to_string()
}

fn default_logo() -> Option<PathBuf> {
    Some(PathBuf::from("BfCo-logo-2k.png"))
}

fn default_table_height() -> f32 {
    400.0
}

fn default_site_bg() -> String {
    "#f5f7fa".to_string()
}

fn default_sidebar_bg() -> String {
    "#e2e8f0".to_string()
}

fn default_text() -> String {
    "#1f2937".to_string()
}

fn default_header() -> String {
    "#2563eb".to_string()
}

fn default_header_text() -> String {
    "#ffffff".to_string()
}

fn default_cell_bg() -> String {
    "#ffffff".to_string()
}

fn default_border() -> String {
    "#cccccc".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        DatabaseConfig {
            host: default_host(),
            port: default_port(),
            name: default_db_name(),
            user: default_user(),
            password: None,
            table: default_table(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        DisplayConfig {
            title: default_title(),
            logo: default_logo(),
            table_height: default_table_height(),
        }
    }
}

impl Default for ThemeConfig {
    fn default() -> Self {
        ThemeConfig {
            site_bg: default_site_bg(),
            sidebar_bg: default_sidebar_bg(),
            text: default_text(),
            header: default_header(),
            header_text: default_header_text(),
            cell_bg: default_cell_bg(),
            cell_text: default_text(),
            border: default_border(),
        }
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

impl Config {
    /// Resolve the config path: explicit argument, then `AGWORLD_DASHBOARD_CONFIG`,
    /// then `agworld-dashboard.toml` in the working directory.
    pub fn resolve_path(arg: Option<PathBuf>) -> PathBuf {
        arg.or_else(|| std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
    }

    /// Load from `path`. A missing file yields the defaults. The password
    /// environment variable is applied afterwards.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;
            Self::from_toml(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?
        } else {
            log::info!("No config at {}, using defaults", path.display());
            Config::default()
        };

        if let Ok(password) = std::env::var(PASSWORD_ENV) {
            config.database.password = Some(password);
        }
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// `None` when the cache never expires.
    pub fn cache_ttl(&self) -> Option<Duration> {
        (self.cache.ttl_secs > 0).then(|| Duration::from_secs(self.cache.ttl_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_gives_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.database.table, "agworld_custom_report");
        assert_eq!(config.database.port, 5432);
        assert_eq!(config.display.table_height, 400.0);
        assert_eq!(config.theme.header, "#2563eb");
        assert!(config.cache_ttl().is_none());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = Config::from_toml(
            r#"
            [database]
            host = "db.internal"
            port = 6543

            [source]
            snapshot = "report.csv"

            [cache]
            ttl_secs = 300
            "#,
        )
        .unwrap();
        assert_eq!(config.database.host, "db.internal");
        assert_eq!(config.database.port, 6543);
        assert_eq!(config.database.name, "agworld");
        assert_eq!(config.source.snapshot, Some(PathBuf::from("report.csv")));
        assert_eq!(config.cache_ttl(), Some(Duration::from_secs(300)));
    }

    #[test]
    fn missing_file_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.database.user, "postgres");
    }

    #[test]
    fn malformed_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[database\nhost = 1").unwrap();
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("bad.toml"));
    }

    // The only test that touches the process environment.
    #[test]
    fn environment_supplies_path_and_password() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("env.toml");
        std::fs::write(&path, "[database]\npassword = \"from-file\"\n").unwrap();

        std::env::set_var(CONFIG_PATH_ENV, &path);
        std::env::set_var(PASSWORD_ENV, "from-env");
        let resolved = Config::resolve_path(None);
        let config = Config::load(&resolved);
        std::env::remove_var(CONFIG_PATH_ENV);
        std::env::remove_var(PASSWORD_ENV);

        assert_eq!(resolved, path);
        assert_eq!(config.unwrap().database.password.as_deref(), Some("from-env"));
        assert_eq!(Config::resolve_path(None), PathBuf::from(DEFAULT_CONFIG_FILE));
    }

    #[test]
    fn explicit_path_wins() {
        let path = Config::resolve_path(Some(PathBuf::from("custom.toml")));
        assert_eq!(path, PathBuf::from("custom.toml"));
    }
}
