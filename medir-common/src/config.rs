//! Configuration loading and root folder resolution
//!
//! Bootstrap configuration comes from a TOML file. Every field has a built-in
//! default except the shared management password.
//!
//! # Settings Sources Priority
//!
//! 1. Command-line arguments
//! 2. Environment variables (MEDIR_ROOT_FOLDER, MEDIR_PASSWORD)
//! 3. TOML configuration file
//! 4. Built-in defaults (code constants)

use crate::session::SessionConfig;
use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Environment variable overriding the root folder
pub const ROOT_FOLDER_ENV: &str = "MEDIR_ROOT_FOLDER";

/// Environment variable carrying the shared management password
pub const PASSWORD_ENV: &str = "MEDIR_PASSWORD";

/// Specialties offered on the public search page when none are configured
pub const DEFAULT_SPECIALTIES: &[&str] = &[
    "Primary Care",
    "Dermatology (Skin)",
    "Nephrology (Kidney)",
    "Pediatrics",
    "Ophthalmology (Eye)",
    "Podiatry (feet)",
    "Vascular (Veins)",
    "Cardiology (Heart)",
    "Gastroenterology",
    "Family Practice",
    "Urology",
];

/// Configuration as read from the TOML file
#[derive(Debug, Clone, Deserialize, Default)]
pub struct TomlConfig {
    /// Folder holding the database and snapshot files
    #[serde(default)]
    pub root_folder: Option<PathBuf>,

    /// SQLite database file (relative paths resolve against the root folder)
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    /// Directory Snapshot JSON file (relative paths resolve against the root folder)
    #[serde(default)]
    pub snapshot_path: Option<PathBuf>,

    /// HTTP bind address
    #[serde(default)]
    pub host: Option<String>,

    /// HTTP server port
    #[serde(default)]
    pub port: Option<u16>,

    #[serde(default)]
    pub session: SessionSection,

    #[serde(default)]
    pub directory: DirectorySection,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// `[session]` table
#[derive(Debug, Clone, Deserialize)]
pub struct SessionSection {
    #[serde(default)]
    pub password: Option<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default)]
    pub renew_on_use: bool,
}

impl Default for SessionSection {
    fn default() -> Self {
        Self {
            password: None,
            timeout_secs: default_timeout_secs(),
            renew_on_use: false,
        }
    }
}

/// `[directory]` table
#[derive(Debug, Clone, Deserialize)]
pub struct DirectorySection {
    /// Specialty names offered as search shortcuts
    #[serde(default = "default_specialties")]
    pub specialties: Vec<String>,
}

impl Default for DirectorySection {
    fn default() -> Self {
        Self {
            specialties: default_specialties(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_specialties() -> Vec<String> {
    DEFAULT_SPECIALTIES.iter().map(|s| s.to_string()).collect()
}

fn default_log_level() -> String {
    "info".to_string()
}

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_DATABASE_FILE: &str = "medical.db";
pub const DEFAULT_SNAPSHOT_FILE: &str = "doctors_data.json";

/// Command-line configuration overrides
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub root_folder: Option<PathBuf>,
    pub database_path: Option<PathBuf>,
    pub snapshot_path: Option<PathBuf>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub password: Option<String>,
}

/// Fully resolved application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub root_folder: PathBuf,
    pub database_path: PathBuf,
    pub snapshot_path: PathBuf,
    pub host: String,
    pub port: u16,
    pub session: SessionConfig,
    pub known_specialties: Vec<String>,
    pub log_level: String,
}

impl Config {
    /// Load configuration from an explicit TOML file, the platform config file,
    /// or built-in defaults, then apply environment and command-line overrides.
    ///
    /// Fails when no management password is configured anywhere.
    pub fn load(config_path: Option<&Path>, overrides: ConfigOverrides) -> Result<Self> {
        Self::from_toml(load_toml_config(config_path)?, overrides)
    }

    /// Resolve a parsed TOML configuration against overrides and the environment
    pub fn from_toml(toml_config: TomlConfig, overrides: ConfigOverrides) -> Result<Self> {
        let root_folder = resolve_root_folder(
            overrides.root_folder.as_deref(),
            ROOT_FOLDER_ENV,
            toml_config.root_folder.as_deref(),
        );

        let database_path = resolve_under(
            &root_folder,
            overrides
                .database_path
                .or(toml_config.database_path)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE_FILE)),
        );
        let snapshot_path = resolve_snapshot_path(
            &root_folder,
            overrides.snapshot_path,
            toml_config.snapshot_path,
        );

        let password = overrides
            .password
            .or_else(|| std::env::var(PASSWORD_ENV).ok())
            .or(toml_config.session.password)
            .filter(|p| !p.is_empty())
            .ok_or_else(|| {
                Error::Config(format!(
                    "No management password configured (set [session].password or {})",
                    PASSWORD_ENV
                ))
            })?;

        let session = SessionConfig {
            password,
            timeout: Duration::from_secs(toml_config.session.timeout_secs),
            renew_on_use: toml_config.session.renew_on_use,
        };

        Ok(Config {
            root_folder,
            database_path,
            snapshot_path,
            host: overrides
                .host
                .or(toml_config.host)
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: overrides.port.or(toml_config.port).unwrap_or(DEFAULT_PORT),
            session,
            known_specialties: toml_config.directory.specialties,
            log_level: toml_config.logging.level,
        })
    }

    /// Create the root folder if it doesn't exist
    pub fn ensure_root_folder(&self) -> Result<()> {
        if !self.root_folder.exists() {
            std::fs::create_dir_all(&self.root_folder)?;
            info!("Created root folder: {}", self.root_folder.display());
        }
        Ok(())
    }
}

/// Read an explicit TOML file, else the platform config file, else defaults
pub fn load_toml_config(config_path: Option<&Path>) -> Result<TomlConfig> {
    match config_path {
        Some(path) => read_toml_config(path),
        None => match find_config_file() {
            Some(path) => read_toml_config(&path),
            None => {
                debug!("No config file found, using built-in defaults");
                Ok(TomlConfig::default())
            }
        },
    }
}

/// Snapshot file location; relative paths are taken under the root folder
pub fn resolve_snapshot_path(
    root_folder: &Path,
    cli_arg: Option<PathBuf>,
    toml_value: Option<PathBuf>,
) -> PathBuf {
    resolve_under(
        root_folder,
        cli_arg
            .or(toml_value)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SNAPSHOT_FILE)),
    )
}

/// Parse a TOML configuration file
pub fn read_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
    })?;
    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Failed to parse TOML: {}", e)))?;
    info!("Loaded TOML configuration from {}", path.display());
    Ok(config)
}

/// Root folder resolution priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. TOML config file
/// 4. OS-dependent compiled default (fallback)
pub fn resolve_root_folder(
    cli_arg: Option<&Path>,
    env_var_name: &str,
    toml_value: Option<&Path>,
) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(env_var_name) {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Some(path) = toml_value {
        return path.to_path_buf();
    }

    get_default_root_folder()
}

/// Locate the platform configuration file, if one exists
fn find_config_file() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("medir").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/medir/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// Get OS-dependent default root folder path
pub fn get_default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("medir"))
        .unwrap_or_else(|| PathBuf::from("./medir_data"))
}

fn resolve_under(root: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        root.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overrides_with_password() -> ConfigOverrides {
        ConfigOverrides {
            root_folder: Some(PathBuf::from("/srv/medir")),
            password: Some("letmein".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults_applied() {
        let config = Config::from_toml(TomlConfig::default(), overrides_with_password()).unwrap();

        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.host, DEFAULT_HOST);
        assert_eq!(config.session.timeout, Duration::from_secs(60));
        assert!(!config.session.renew_on_use);
        assert_eq!(config.database_path, PathBuf::from("/srv/medir/medical.db"));
        assert_eq!(config.snapshot_path, PathBuf::from("/srv/medir/doctors_data.json"));
        assert_eq!(config.known_specialties.len(), DEFAULT_SPECIALTIES.len());
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_toml_values_parsed() {
        let toml_config: TomlConfig = toml::from_str(
            r#"
            port = 8080
            snapshot_path = "/data/snapshot.json"

            [session]
            password = "from-file"
            timeout_secs = 120
            renew_on_use = true

            [directory]
            specialties = ["Urology"]
            "#,
        )
        .unwrap();

        let overrides = ConfigOverrides {
            root_folder: Some(PathBuf::from("/srv/medir")),
            ..Default::default()
        };
        let config = Config::from_toml(toml_config, overrides).unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.snapshot_path, PathBuf::from("/data/snapshot.json"));
        assert_eq!(config.session.timeout, Duration::from_secs(120));
        assert!(config.session.renew_on_use);
        assert_eq!(config.known_specialties, vec!["Urology".to_string()]);
    }

    #[test]
    fn test_cli_overrides_win() {
        let toml_config: TomlConfig = toml::from_str(
            r#"
            port = 8080
            [session]
            password = "from-file"
            "#,
        )
        .unwrap();

        let overrides = ConfigOverrides {
            port: Some(9000),
            ..overrides_with_password()
        };
        let config = Config::from_toml(toml_config, overrides).unwrap();

        assert_eq!(config.port, 9000);
        assert_eq!(config.session.password, "letmein");
    }

    #[test]
    fn test_empty_password_rejected() {
        let overrides = ConfigOverrides {
            password: Some(String::new()),
            ..overrides_with_password()
        };
        let result = Config::from_toml(TomlConfig::default(), overrides);
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_root_folder_cli_priority() {
        let resolved = resolve_root_folder(
            Some(Path::new("/from/cli")),
            "MEDIR_TEST_UNSET_VARIABLE",
            Some(Path::new("/from/toml")),
        );
        assert_eq!(resolved, PathBuf::from("/from/cli"));

        let resolved = resolve_root_folder(None, "MEDIR_TEST_UNSET_VARIABLE", Some(Path::new("/from/toml")));
        assert_eq!(resolved, PathBuf::from("/from/toml"));
    }

    #[test]
    fn test_explicit_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "snapshot_path = \"roster.json\"\n").unwrap();

        let toml_config = load_toml_config(Some(&path)).unwrap();
        let snapshot = resolve_snapshot_path(dir.path(), None, toml_config.snapshot_path);
        assert_eq!(snapshot, dir.path().join("roster.json"));

        assert!(matches!(
            load_toml_config(Some(&dir.path().join("missing.toml"))),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_default_root_folder() {
        let folder = get_default_root_folder();
        assert!(!folder.as_os_str().is_empty());
    }
}
