use crate::error::DiscoveryError;
use anyhow::Result;
use directories::ProjectDirs;
use log::debug;
use patentsview::config::PatentsViewClientConfiguration;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs::{self, File};
use std::io::{self, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

pub const ENV_API_KEY: &str = "PATENTSVIEW_API_KEY";
pub const ENV_PATENTSVIEW_URL: &str = "PATENTSVIEW_URL";
pub const ENV_DB_HOST: &str = "DB_HOST";
pub const ENV_DB_PORT: &str = "DB_PORT";
pub const ENV_DB_NAME: &str = "DB_NAME";
pub const ENV_DB_USER: &str = "DB_USER";
pub const ENV_DB_PASSWORD: &str = "DB_PASSWORD";
pub const ENV_SERVER_ADDRESS: &str = "PATENT_SERVER_ADDRESS";
pub const ENV_MCP_ADDRESS: &str = "PATENT_MCP_ADDRESS";

/// Application configuration struct
/// Holds what we need to reach PatentsView and the database, and where to listen
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default)]
pub struct AppConfiguration {
    #[serde(default)]
    pub patentsview: PatentsViewClientConfiguration,
    #[serde(default)]
    pub database: DatabaseConfiguration,
    #[serde(default)]
    pub server: ServerConfiguration,
    #[serde(default)]
    pub mcp: McpConfiguration,
    #[serde(default)]
    pub docker: DockerConfiguration,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(default)]
pub struct DatabaseConfiguration {
    pub host: String,
    pub port: u16,
    pub name: String,
    pub user: String,
    pub password: String,
}

impl Default for DatabaseConfiguration {
    fn default() -> Self {
        DatabaseConfiguration {
            host: "localhost".into(),
            port: 5432,
            name: "patent_discovery".into(),
            user: "postgres".into(),
            password: "postgres".into(),
        }
    }
}

impl DatabaseConfiguration {
    /// The key/value connection string understood by `tokio_postgres`
    #[must_use]
    pub fn connection_string(&self) -> String {
        format!(
            "host={} port={} dbname={} user={} password={}",
            self.host, self.port, self.name, self.user, self.password
        )
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(default)]
pub struct ServerConfiguration {
    pub address: String,
}

impl Default for ServerConfiguration {
    fn default() -> Self {
        ServerConfiguration {
            address: "127.0.0.1:5000".into(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(default)]
pub struct McpConfiguration {
    pub address: String,
}

impl Default for McpConfiguration {
    fn default() -> Self {
        McpConfiguration {
            address: "127.0.0.1:8080".into(),
        }
    }
}

/// Where the database containers are described
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(default)]
pub struct DockerConfiguration {
    pub compose_file: String,
    pub postgres_service: String,
    pub neo4j_service: String,
    pub backup_dir: String,
}

impl Default for DockerConfiguration {
    fn default() -> Self {
        DockerConfiguration {
            compose_file: "docker-compose.yml".into(),
            postgres_service: "postgres".into(),
            neo4j_service: "neo4j".into(),
            backup_dir: "backups".into(),
        }
    }
}

/// Filename holding the application configuration parameters
#[must_use]
pub fn configuration_file() -> PathBuf {
    project_dirs().map_or_else(
        || PathBuf::from("patent-discovery.toml"),
        |dirs| dirs.preference_dir().join("config.toml"),
    )
}

/// Loads the configuration file, falling back to the defaults when there is none,
/// and applies the environment variable overrides.
///
/// # Errors
/// If the file exists but cannot be read or parsed, or an environment variable holds garbage
pub fn load() -> Result<AppConfiguration, DiscoveryError> {
    let config_path = configuration_file();
    let mut app_config = match read(&config_path) {
        Ok(cfg) => cfg,
        Err(DiscoveryError::ApplicationConfig { source, .. })
            if source.kind() == ErrorKind::NotFound =>
        {
            debug!(
                "No configuration file {}, using defaults",
                config_path.to_string_lossy()
            );
            AppConfiguration::default()
        }
        Err(e) => return Err(e),
    };
    apply_env_overrides(&mut app_config, |name| env::var(name).ok())?;
    Ok(app_config)
}

/// The defaults with the environment variable overrides, ignoring any configuration file
///
/// # Errors
/// If an environment variable holds garbage
pub fn from_env() -> Result<AppConfiguration, DiscoveryError> {
    let mut app_config = AppConfiguration::default();
    apply_env_overrides(&mut app_config, |name| env::var(name).ok())?;
    Ok(app_config)
}

#[allow(clippy::missing_errors_doc)]
pub fn save(cfg: &AppConfiguration) -> Result<(), DiscoveryError> {
    save_to(cfg, &configuration_file())
}

/// Writes `cfg` to `path`, creating the directory if need be
///
/// # Errors
/// If the directory or the file cannot be created
pub fn save_to(cfg: &AppConfiguration, path: &Path) -> Result<(), DiscoveryError> {
    create_configuration_file(cfg, path).map_err(|e| {
        debug!("Writing {} failed: {e:?}", path.to_string_lossy());
        DiscoveryError::ConfigFileCreation {
            path: path.into(),
            reason: format!("{e:#}"),
        }
    })
}

#[allow(clippy::missing_errors_doc)]
pub fn remove() -> io::Result<()> {
    fs::remove_file(configuration_file().as_path())
}

#[allow(clippy::missing_errors_doc)]
pub fn application_config_to_string(cfg: &AppConfiguration) -> Result<String> {
    Ok(toml::to_string::<AppConfiguration>(cfg)?)
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "patents", "discovery")
}

/// Reads the `AppConfiguration` struct from the supplied TOML file
pub(crate) fn read(path: &Path) -> Result<AppConfiguration, DiscoveryError> {
    let mut file = File::open(path).map_err(|source| DiscoveryError::ApplicationConfig {
        path: path.into(),
        source,
    })?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)
        .map_err(|source| DiscoveryError::ApplicationConfig {
            path: path.into(),
            source,
        })?;
    toml::from_str::<AppConfiguration>(&contents).map_err(|source| DiscoveryError::TomlParse {
        path: path.into(),
        source,
    })
}

/// Environment variables win over the configuration file
pub(crate) fn apply_env_overrides<F>(
    cfg: &mut AppConfiguration,
    lookup: F,
) -> Result<(), DiscoveryError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(key) = lookup(ENV_API_KEY) {
        cfg.patentsview.api_key = Some(key);
    }
    if let Some(url) = lookup(ENV_PATENTSVIEW_URL) {
        cfg.patentsview.url = url;
    }
    if let Some(host) = lookup(ENV_DB_HOST) {
        cfg.database.host = host;
    }
    if let Some(port) = lookup(ENV_DB_PORT) {
        cfg.database.port = port
            .trim()
            .parse()
            .map_err(|_| DiscoveryError::InvalidEnvironment {
                name: ENV_DB_PORT.to_string(),
                value: port.clone(),
            })?;
    }
    if let Some(name) = lookup(ENV_DB_NAME) {
        cfg.database.name = name;
    }
    if let Some(user) = lookup(ENV_DB_USER) {
        cfg.database.user = user;
    }
    if let Some(password) = lookup(ENV_DB_PASSWORD) {
        cfg.database.password = password;
    }
    if let Some(address) = lookup(ENV_SERVER_ADDRESS) {
        cfg.server.address = address;
    }
    if let Some(address) = lookup(ENV_MCP_ADDRESS) {
        cfg.mcp.address = address;
    }
    Ok(())
}

fn create_configuration_file(cfg: &AppConfiguration, path: &Path) -> Result<()> {
    if let Some(directory) = path.parent() {
        if !directory.as_os_str().is_empty() && !directory.try_exists()? {
            fs::create_dir_all(directory)?;
        }
    }

    let mut file = File::create(path)?;
    let toml = application_config_to_string(cfg)?;
    file.write_all(toml.as_bytes())?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn toml_parsing() {
        let toml_str = r#"
        [patentsview]
        api_key = "abc"
        max_pages = 2

        [database]
        host = "db.example.com"
        name = "patents"
        "#;

        let app_config: AppConfiguration = toml::from_str(toml_str).unwrap();
        assert_eq!(app_config.patentsview.api_key.as_deref(), Some("abc"));
        assert_eq!(app_config.patentsview.max_pages, 2);
        assert_eq!(app_config.patentsview.per_page, 100);
        assert_eq!(app_config.database.host, "db.example.com");
        assert_eq!(app_config.database.port, 5432);
    }

    /// Sections missing from the file on disk get reasonable defaults
    #[test]
    fn test_toml_parsing_with_defaults_generated() {
        let app_config: AppConfiguration = toml::from_str("").unwrap();
        assert_eq!(app_config, AppConfiguration::default());
        assert_eq!(app_config.server.address, "127.0.0.1:5000");
        assert_eq!(app_config.mcp.address, "127.0.0.1:8080");
        assert_eq!(app_config.docker.compose_file, "docker-compose.yml");
    }

    #[test]
    fn connection_string_from_defaults() {
        assert_eq!(
            DatabaseConfiguration::default().connection_string(),
            "host=localhost port=5432 dbname=patent_discovery user=postgres password=postgres"
        );
    }

    #[test]
    fn environment_overrides_file() {
        let vars: HashMap<&str, &str> = [
            (ENV_DB_HOST, "pg"),
            (ENV_DB_PORT, "6543"),
            (ENV_API_KEY, "key-from-env"),
        ]
        .into_iter()
        .collect();
        let mut cfg = AppConfiguration::default();
        apply_env_overrides(&mut cfg, |name| vars.get(name).map(|v| (*v).to_string())).unwrap();

        assert_eq!(cfg.database.host, "pg");
        assert_eq!(cfg.database.port, 6543);
        assert_eq!(cfg.patentsview.api_key.as_deref(), Some("key-from-env"));
        assert_eq!(cfg.database.user, "postgres");
    }

    #[test]
    fn garbage_port_is_rejected() {
        let mut cfg = AppConfiguration::default();
        let result = apply_env_overrides(&mut cfg, |name| {
            (name == ENV_DB_PORT).then(|| "fivefourthreetwo".to_string())
        });
        assert!(matches!(
            result,
            Err(DiscoveryError::InvalidEnvironment { ref name, .. }) if name == ENV_DB_PORT
        ));
    }

    #[test]
    fn test_write_and_read_toml_file() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let tmp_config_file = dir.path().join("nested").join("config.toml");

        let mut cfg = AppConfiguration::default();
        cfg.database.name = "patents_test".to_string();
        cfg.patentsview.api_key = Some("not_a_key".to_string());

        create_configuration_file(&cfg, &tmp_config_file)?;
        let result = read(&tmp_config_file)?;
        assert_eq!(cfg, result);
        Ok(())
    }

    #[test]
    fn failed_save_keeps_the_cause() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-directory");
        fs::write(&blocker, "").unwrap();
        let path = blocker.join("config.toml");

        match save_to(&AppConfiguration::default(), &path) {
            Err(DiscoveryError::ConfigFileCreation { path: failed, reason }) => {
                assert_eq!(failed, path);
                assert!(!reason.is_empty());
            }
            other => panic!("Expected ConfigFileCreation, got {other:?}"),
        }
    }

    #[test]
    fn saved_configuration_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut cfg = AppConfiguration::default();
        cfg.database.name = "saved".into();

        save_to(&cfg, &path).unwrap();
        assert_eq!(read(&path).unwrap(), cfg);
    }
}
