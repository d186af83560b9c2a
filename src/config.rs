use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

pub static CONFIG: OnceCell<Config> = OnceCell::new();

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LoggingConfig {
    pub roster: String,
}

impl LoggingConfig {
    const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];
    const ROSTER_LEVEL: &str = "info";

    fn default() -> Self {
        LoggingConfig {
            roster: Self::ROSTER_LEVEL.to_string(),
        }
    }

    /// Builds the flexi_logger spec string for this configuration
    pub fn logger_spec(&self) -> String {
        format!("roster={}", self.roster)
    }

    fn ensure_valid(&mut self) {
        let str_original = self.roster.clone();
        self.roster = self.roster.trim().to_ascii_lowercase();
        if !Self::LOG_LEVELS.contains(&self.roster.as_str()) {
            eprintln!(
                "Config error: roster log level of '{}' is invalid - using default of '{}'",
                str_original,
                Self::ROSTER_LEVEL
            );
            self.roster = Self::ROSTER_LEVEL.to_owned();
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    const DEFAULT_HOST: &str = "127.0.0.1";
    const DEFAULT_PORT: u16 = 8080;

    fn default() -> Self {
        ServerConfig {
            host: Self::DEFAULT_HOST.to_owned(),
            port: Self::DEFAULT_PORT,
        }
    }

    fn ensure_valid(&mut self) {
        if self.host.trim().is_empty() {
            eprintln!(
                "Config error: server host is empty - using default of '{}'",
                Self::DEFAULT_HOST
            );
            self.host = Self::DEFAULT_HOST.to_owned();
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DatabaseConfig {
    /// Directory holding the database file. Defaults to the project data directory.
    pub path: Option<PathBuf>,
    pub pool_size: u32,
}

impl DatabaseConfig {
    const DEFAULT_POOL_SIZE: u32 = 8;

    fn default() -> Self {
        DatabaseConfig {
            path: None,
            pool_size: Self::DEFAULT_POOL_SIZE,
        }
    }

    fn ensure_valid(&mut self) {
        if self.pool_size == 0 {
            eprintln!(
                "Config error: database pool_size of 0 is invalid - using default of '{}'",
                Self::DEFAULT_POOL_SIZE
            );
            self.pool_size = Self::DEFAULT_POOL_SIZE;
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ListingConfig {
    pub page_size: u32,
}

impl ListingConfig {
    const DEFAULT_PAGE_SIZE: u32 = 15;

    fn default() -> Self {
        ListingConfig {
            page_size: Self::DEFAULT_PAGE_SIZE,
        }
    }

    fn ensure_valid(&mut self) {
        if self.page_size == 0 {
            eprintln!(
                "Config error: listing page_size of 0 is invalid - using default of '{}'",
                Self::DEFAULT_PAGE_SIZE
            );
            self.page_size = Self::DEFAULT_PAGE_SIZE;
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Config {
    pub logging: LoggingConfig,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub listing: ListingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            logging: LoggingConfig::default(),
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            listing: ListingConfig::default(),
        }
    }
}

impl Config {
    const ENV_PREFIX: &str = "ROSTER_";

    /// Loads the configuration from a TOML file located in the app's data directory,
    /// overlaid with ROSTER_ environment variables.
    /// If the file is missing or fails to parse, defaults are used.
    /// Additionally, writes the default config to disk if no file exists.
    pub fn load_config(project_dirs: &ProjectDirs) -> Self {
        let config_path = project_dirs.data_local_dir().join("config.toml");
        let default_config = Config::default();

        if !config_path.exists() {
            Self::write_default(&config_path, &default_config);
        }

        Self::load_from(&config_path, default_config)
    }

    fn write_default(config_path: &Path, default_config: &Config) {
        if let Some(parent) = config_path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                eprintln!(
                    "Failed to create configuration directory {}: {}",
                    parent.display(),
                    e
                );
            }
        }
        match toml::to_string_pretty(default_config) {
            Ok(toml_string) => {
                if let Err(e) = fs::write(config_path, toml_string) {
                    eprintln!(
                        "Failed to write default config to {}: {}",
                        config_path.display(),
                        e
                    );
                }
            }
            Err(_) => eprintln!("Failed to serialize default config."),
        }
    }

    fn load_from(config_path: &Path, default_config: Config) -> Self {
        // Defaults, then the TOML file (if it exists), then the environment
        let figment = Figment::from(Serialized::defaults(default_config.clone()))
            .merge(Toml::file(config_path))
            .merge(Env::prefixed(Self::ENV_PREFIX).split("__"));

        let mut config = figment.extract().unwrap_or_else(|err| {
            eprintln!(
                "Could not load config file {}: {}. Using default configuration.",
                config_path.display(),
                err
            );
            default_config
        });

        config.ensure_valid();

        config
    }

    fn ensure_valid(&mut self) {
        self.logging.ensure_valid();
        self.server.ensure_valid();
        self.database.ensure_valid();
        self.listing.ensure_valid();
    }

    fn current() -> Config {
        CONFIG.get().cloned().unwrap_or_default()
    }

    pub fn get_server_host() -> String {
        Self::current().server.host
    }

    pub fn get_server_port() -> u16 {
        Self::current().server.port
    }

    pub fn get_page_size() -> u32 {
        Self::current().listing.page_size
    }

    pub fn get_pool_size() -> u32 {
        Self::current().database.pool_size
    }

    pub fn get_database_dir() -> Option<PathBuf> {
        Self::current().database.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_missing_file_uses_defaults() {
        Jail::expect_with(|jail| {
            let path = jail.directory().join("config.toml");
            let config = Config::load_from(&path, Config::default());
            assert_eq!(config, Config::default());
            Ok(())
        });
    }

    #[test]
    fn test_file_values_override_defaults() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r#"
                [server]
                host = "0.0.0.0"
                port = 9000

                [listing]
                page_size = 20
                "#,
            )?;
            let config = Config::load_from(&jail.directory().join("config.toml"), Config::default());
            assert_eq!(config.server.host, "0.0.0.0");
            assert_eq!(config.server.port, 9000);
            assert_eq!(config.listing.page_size, 20);
            assert_eq!(config.logging.roster, "info");
            Ok(())
        });
    }

    #[test]
    fn test_env_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", "[listing]\npage_size = 20\n")?;
            jail.set_env("ROSTER_LISTING__PAGE_SIZE", "40");
            let config = Config::load_from(&jail.directory().join("config.toml"), Config::default());
            assert_eq!(config.listing.page_size, 40);
            Ok(())
        });
    }

    #[test]
    fn test_invalid_values_fall_back() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                "[logging]\nroster = \" LOUD \"\n\n[listing]\npage_size = 0\n",
            )?;
            let config = Config::load_from(&jail.directory().join("config.toml"), Config::default());
            assert_eq!(config.logging.roster, "info");
            assert_eq!(config.listing.page_size, 15);
            Ok(())
        });
    }

    #[test]
    fn test_log_level_is_normalized() {
        let mut logging = LoggingConfig {
            roster: " DEBUG ".to_string(),
        };
        logging.ensure_valid();
        assert_eq!(logging.logger_spec(), "roster=debug");
    }
}
