//! Configuration file handling.
//!
//! The configuration file is stored at `$UTILITIES_HOME/config.json` and names the configured
//! users, the address the web server binds to and the locations of the two secrets files: the
//! password hashes and the data store connection secrets.

use crate::auth::{hash_password, CredentialStore, UserEntry};
use crate::error::{ErrorType, IntoResult};
use crate::store::StoreSecrets;
use crate::{utils, Result};
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

const APP_NAME: &str = "utilities";
const CONFIG_VERSION: u8 = 1;
const SECRETS: &str = ".secrets";
const CONFIG_JSON: &str = "config.json";
const HASHED_PW_JSON: &str = "hashed_pw.json";
const STORE_JSON: &str = "store.json";

/// The default web server address.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8501";

/// The `Config` object represents the configuration of the app. You instantiate it by providing
/// the path to `$UTILITIES_HOME` and from there it loads `$UTILITIES_HOME/config.json`, the
/// credential store and the data store secrets.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    secrets: PathBuf,
    config_path: PathBuf,
    config_file: ConfigFile,
    credentials: Arc<CredentialStore>,
    store_secrets: StoreSecrets,
}

impl Config {
    /// Creates the home directory and its secrets subdirectory, then writes:
    /// - `config.json` naming `user` and `bind_addr`
    /// - `.secrets/hashed_pw.json` holding the argon2 hash of `password`
    /// - `.secrets/store.json` holding `store_secrets`
    ///
    /// # Errors
    /// - Returns an error if `config.json` already exists.
    /// - Returns an error if any file operations fail.
    pub async fn create(
        dir: impl Into<PathBuf>,
        user: UserEntry,
        password: &str,
        store_secrets: StoreSecrets,
        bind_addr: Option<String>,
    ) -> Result<Self> {
        let maybe_relative = dir.into();
        utils::make_dir(&maybe_relative)
            .await
            .context("Unable to create the utilities home directory")?;
        let root = utils::canonicalize(&maybe_relative).await?;

        let config_path = root.join(CONFIG_JSON);
        if config_path.exists() {
            bail!(
                "A config file already exists at '{}', refusing to overwrite it",
                config_path.display()
            );
        }

        let secrets_dir = root.join(SECRETS);
        utils::make_dir(&secrets_dir).await?;

        let hashes = vec![hash_password(password)?];
        utils::write_secret(&secrets_dir.join(HASHED_PW_JSON), &hashes).await?;
        utils::write_secret(&secrets_dir.join(STORE_JSON), &store_secrets).await?;

        let config_file = ConfigFile {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            bind_addr: bind_addr.unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            users: vec![user],
            credentials_path: None,
            store_secrets_path: None,
        };
        config_file.save(&config_path).await?;

        Self::load(root).await
    }

    /// This will
    /// - validate that `utilities_home` exists and that the config file exists
    /// - load the config file
    /// - load the password hashes and pair them with the configured users
    /// - load the data store secrets
    /// - return the loaded configuration object
    pub async fn load(utilities_home: impl Into<PathBuf>) -> Result<Self> {
        Self::load_inner(utilities_home.into())
            .await
            .pub_result(ErrorType::Config)
    }

    async fn load_inner(maybe_relative: PathBuf) -> Result<Self> {
        let root = utils::canonicalize(&maybe_relative)
            .await
            .context("The utilities home directory is missing")?;
        let _ = utils::read_dir(&root)
            .await
            .context("The utilities home directory is missing")?;

        let config_path = root.join(CONFIG_JSON);
        if !config_path.is_file() {
            bail!("The config file is missing '{}'", config_path.display())
        }
        let config_file = ConfigFile::load(&config_path).await?;

        let credentials_path = resolve(&root, config_file.credentials_path());
        let credentials = CredentialStore::load(&config_file.users, &credentials_path).await?;

        let store_path = resolve(&root, config_file.store_secrets_path());
        let store_secrets = utils::deserialize(&store_path)
            .await
            .context("Unable to load the data store secrets")?;

        let config = Self {
            secrets: root.join(SECRETS),
            root,
            config_path,
            config_file,
            credentials: Arc::new(credentials),
            store_secrets,
        };

        debug!(
            "Loaded configuration from {} with {} users",
            config.config_path.display(),
            config.credentials.len()
        );
        Ok(config)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn secrets(&self) -> &Path {
        &self.secrets
    }

    pub fn bind_addr(&self) -> &str {
        &self.config_file.bind_addr
    }

    pub fn users(&self) -> &[UserEntry] {
        &self.config_file.users
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    pub fn store_secrets(&self) -> &StoreSecrets {
        &self.store_secrets
    }

    /// Returns the stored `credentials_path` if it is absolute, otherwise resolves the relative
    /// path against the home directory.
    pub fn credentials_path(&self) -> PathBuf {
        resolve(&self.root, self.config_file.credentials_path())
    }

    /// Returns the stored `store_secrets_path` if it is absolute, otherwise resolves the relative
    /// path against the home directory.
    pub fn store_secrets_path(&self) -> PathBuf {
        resolve(&self.root, self.config_file.store_secrets_path())
    }
}

fn resolve(root: &Path, p: PathBuf) -> PathBuf {
    if p.is_absolute() {
        return p;
    }
    root.join(p)
}

/// Represents the serialization and deserialization format of the configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "utilities",
///   "config_version": 1,
///   "bind_addr": "127.0.0.1:8501",
///   "users": [
///     { "username": "pdemaers", "name": "Patrick Demaerschalk" }
///   ],
///   "credentials_path": ".secrets/hashed_pw.json",
///   "store_secrets_path": ".secrets/store.json"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
struct ConfigFile {
    /// Application name, should always be "utilities"
    app_name: String,

    /// Configuration file version
    config_version: u8,

    /// The address the web server listens on
    #[serde(default = "default_bind_addr")]
    bind_addr: String,

    /// The users allowed to log in. Their password hashes are held, in the same order, in the
    /// credentials file.
    users: Vec<UserEntry>,

    /// Path to the JSON array of password hashes (optional, relative to config.json or absolute)
    /// Defaults to $UTILITIES_HOME/.secrets/hashed_pw.json if not specified
    #[serde(skip_serializing_if = "Option::is_none")]
    credentials_path: Option<PathBuf>,

    /// Path to the data store secrets (optional, relative to config.json or absolute)
    /// Defaults to $UTILITIES_HOME/.secrets/store.json if not specified
    #[serde(skip_serializing_if = "Option::is_none")]
    store_secrets_path: Option<PathBuf>,
}

fn default_bind_addr() -> String {
    DEFAULT_BIND_ADDR.to_string()
}

impl ConfigFile {
    /// Loads a ConfigFile from the specified path.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, or if `app_name` is wrong.
    async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config: ConfigFile = utils::deserialize(path).await?;

        anyhow::ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );

        Ok(config)
    }

    /// Saves the ConfigFile to the specified path.
    async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let p = path.as_ref();
        let data = serde_json::to_string_pretty(self).context("Unable to serialize config")?;
        utils::write(p, data)
            .await
            .context("Unable to write config file")
    }

    fn credentials_path(&self) -> PathBuf {
        self.credentials_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(SECRETS).join(HASHED_PW_JSON))
    }

    fn store_secrets_path(&self) -> PathBuf {
        self.store_secrets_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(SECRETS).join(STORE_JSON))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn user() -> UserEntry {
        UserEntry {
            username: "pdemaers".into(),
            name: "Patrick Demaerschalk".into(),
        }
    }

    fn store_secrets() -> StoreSecrets {
        StoreSecrets {
            mongo_username: "meter".into(),
            mongo_password: "hunter2".into(),
            mongo_cluster_url: "cluster0.abcde.mongodb.net".into(),
            database_name: "utilities".into(),
            collection_name: "readings".into(),
        }
    }

    #[tokio::test]
    async fn test_config_create() {
        let dir = TempDir::new().unwrap();
        let home = dir.path().join("utilities_home");

        let config = Config::create(&home, user(), "s3cret", store_secrets(), None)
            .await
            .unwrap();

        assert_eq!(config.bind_addr(), DEFAULT_BIND_ADDR);
        assert_eq!(config.users(), &[user()]);
        assert_eq!(config.store_secrets(), &store_secrets());
        assert!(config.secrets().is_dir());
        assert!(config.credentials_path().is_file());
        assert!(config.store_secrets_path().is_file());
        assert!(config.credentials().verify("pdemaers", "s3cret").is_some());

        let reloaded = Config::load(&home).await.unwrap();
        assert_eq!(reloaded.root(), config.root());
        assert!(reloaded.credentials().verify("pdemaers", "s3cret").is_some());
    }

    #[tokio::test]
    async fn test_config_create_refuses_to_overwrite() {
        let dir = TempDir::new().unwrap();
        Config::create(dir.path(), user(), "a", store_secrets(), None)
            .await
            .unwrap();
        let second = Config::create(dir.path(), user(), "b", store_secrets(), None).await;
        assert!(second.unwrap_err().to_string().contains("already exists"));
    }

    #[tokio::test]
    async fn test_config_load_missing_home() {
        let dir = TempDir::new().unwrap();
        let err = Config::load(dir.path().join("nope")).await.unwrap_err();
        assert_eq!(ErrorType::of(&err), Some(ErrorType::Config));
    }

    #[tokio::test]
    async fn test_config_load_mismatched_hashes() {
        let dir = TempDir::new().unwrap();
        let config = Config::create(dir.path(), user(), "a", store_secrets(), None)
            .await
            .unwrap();
        utils::write(config.credentials_path(), "[]").await.unwrap();
        let err = Config::load(dir.path()).await.unwrap_err();
        assert_eq!(ErrorType::of(&err), Some(ErrorType::Config));
        assert!(format!("{err:#}").contains("0 password hashes but 1 users"));
    }

    #[tokio::test]
    async fn test_config_file_load_with_minimal_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        let json = r#"{
            "app_name": "utilities",
            "config_version": 1,
            "users": [{ "username": "pdemaers", "name": "P" }]
        }"#;
        utils::write(&config_path, json).await.unwrap();

        let config = ConfigFile::load(&config_path).await.unwrap();
        assert_eq!(config.bind_addr, DEFAULT_BIND_ADDR);
        assert_eq!(
            config.credentials_path(),
            PathBuf::from(SECRETS).join(HASHED_PW_JSON)
        );
        assert_eq!(
            config.store_secrets_path(),
            PathBuf::from(SECRETS).join(STORE_JSON)
        );
    }

    #[tokio::test]
    async fn test_config_file_load_invalid_app_name() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        let json = r#"{ "app_name": "meters", "config_version": 1, "users": [] }"#;
        utils::write(&config_path, json).await.unwrap();

        let result = ConfigFile::load(&config_path).await;
        assert!(result.unwrap_err().to_string().contains("Invalid app_name"));
    }

    #[test]
    fn test_config_file_serialization_omits_none_fields() {
        let config = ConfigFile {
            app_name: APP_NAME.into(),
            config_version: CONFIG_VERSION,
            bind_addr: DEFAULT_BIND_ADDR.into(),
            users: vec![user()],
            credentials_path: None,
            store_secrets_path: None,
        };
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("credentials_path"));
        assert!(!json.contains("store_secrets_path"));
    }
}
