//! These structs provide the CLI interface for the utilities app.

use clap::{Parser, Subcommand};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing_subscriber::filter::LevelFilter;

/// utilities: Record utility meter readings and look at them.
///
/// The purpose of this program is to serve a small web page, behind a login, where you can enter
/// your electricity and gas meter readings. Readings are stored in a MongoDB collection and can be
/// viewed as a table or as a chart of the gas counter over time.
///
/// Run `utilities init` once to create the configuration, then `utilities serve`.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the data directory and initialize the configuration files.
    ///
    /// This is the first command you should run. You need a few things ready beforehand.
    ///
    /// - Decide what directory you want to store configuration in and pass this as
    ///   --utilities-home. By default, it will be $HOME/utilities.
    ///
    /// - Choose the username, display name and password of the person who will log in.
    ///
    /// - Get the username, password and cluster address of your MongoDB Atlas database user, and
    ///   the names of the database and collection the readings should go to.
    ///
    Init(InitArgs),
    /// Print the argon2 hash of a password, for adding more users to the credentials file.
    HashPassword(HashPasswordArgs),
    /// Run the web server.
    Serve(ServeArgs),
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where configuration and secrets are held. Defaults to ~/utilities
    #[arg(long, env = "UTILITIES_HOME", default_value_t = default_utilities_home())]
    utilities_home: DisplayPath,
}

impl Common {
    pub fn new(log_level: LevelFilter, utilities_home: PathBuf) -> Self {
        Self {
            log_level,
            utilities_home: utilities_home.into(),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn utilities_home(&self) -> &DisplayPath {
        &self.utilities_home
    }
}

/// (Not shown): Args for the `utilities init` command.
#[derive(Debug, Parser, Clone)]
pub struct InitArgs {
    /// The login name of the user.
    #[arg(long)]
    username: String,

    /// The name shown to the user once logged in.
    #[arg(long)]
    name: String,

    /// The user's password. Only its argon2 hash is stored.
    #[arg(long, env = "UTILITIES_PASSWORD", hide_env_values = true)]
    password: String,

    /// The MongoDB database user.
    #[arg(long)]
    mongo_username: String,

    /// The MongoDB database user's password.
    #[arg(long, env = "UTILITIES_MONGO_PASSWORD", hide_env_values = true)]
    mongo_password: String,

    /// The cluster address, it looks like this: cluster0.abcde.mongodb.net
    #[arg(long)]
    mongo_cluster_url: String,

    /// The database holding the readings.
    #[arg(long)]
    database_name: String,

    /// The collection holding the readings.
    #[arg(long)]
    collection_name: String,

    /// The address the web server will listen on. Defaults to 127.0.0.1:8501
    #[arg(long)]
    bind_addr: Option<String>,
}

impl InitArgs {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        username: impl Into<String>,
        name: impl Into<String>,
        password: impl Into<String>,
        mongo_username: impl Into<String>,
        mongo_password: impl Into<String>,
        mongo_cluster_url: impl Into<String>,
        database_name: impl Into<String>,
        collection_name: impl Into<String>,
        bind_addr: Option<String>,
    ) -> Self {
        Self {
            username: username.into(),
            name: name.into(),
            password: password.into(),
            mongo_username: mongo_username.into(),
            mongo_password: mongo_password.into(),
            mongo_cluster_url: mongo_cluster_url.into(),
            database_name: database_name.into(),
            collection_name: collection_name.into(),
            bind_addr,
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn mongo_username(&self) -> &str {
        &self.mongo_username
    }

    pub fn mongo_password(&self) -> &str {
        &self.mongo_password
    }

    pub fn mongo_cluster_url(&self) -> &str {
        &self.mongo_cluster_url
    }

    pub fn database_name(&self) -> &str {
        &self.database_name
    }

    pub fn collection_name(&self) -> &str {
        &self.collection_name
    }

    pub fn bind_addr(&self) -> Option<&str> {
        self.bind_addr.as_deref()
    }
}

/// (Not shown): Args for the `utilities hash-password` command.
#[derive(Debug, Parser, Clone)]
pub struct HashPasswordArgs {
    /// The password to hash.
    #[arg(long, env = "UTILITIES_PASSWORD", hide_env_values = true)]
    password: String,
}

impl HashPasswordArgs {
    pub fn new(password: impl Into<String>) -> Self {
        Self {
            password: password.into(),
        }
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

/// (Not shown): Args for the `utilities serve` command.
#[derive(Debug, Parser, Clone, Default)]
pub struct ServeArgs {
    /// Overrides the address from config.json.
    #[arg(long)]
    bind_addr: Option<String>,
}

impl ServeArgs {
    pub fn new(bind_addr: Option<String>) -> Self {
        Self { bind_addr }
    }

    pub fn bind_addr(&self) -> Option<&str> {
        self.bind_addr.as_deref()
    }
}

fn default_utilities_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("utilities"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --utilities-home or UTILITIES_HOME instead of relying on the \
                default home directory. If you continue using the program right now, you may have \
                problems!",
            );
            PathBuf::from("utilities")
        }
    })
}

/// A path that implements `Display` so that clap can show it as a default value.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn new(path: PathBuf) -> Self {
        Self(path)
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_serve() {
        let args = Args::try_parse_from([
            "utilities",
            "--utilities-home",
            "/tmp/u",
            "--log-level",
            "debug",
            "serve",
            "--bind-addr",
            "0.0.0.0:9000",
        ])
        .unwrap();
        assert_eq!(args.common().log_level(), LevelFilter::DEBUG);
        assert_eq!(args.common().utilities_home().path(), Path::new("/tmp/u"));
        match args.command() {
            Command::Serve(serve) => assert_eq!(serve.bind_addr(), Some("0.0.0.0:9000")),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_init() {
        let args = Args::try_parse_from([
            "utilities",
            "init",
            "--username",
            "pdemaers",
            "--name",
            "Patrick",
            "--password",
            "pw",
            "--mongo-username",
            "meter",
            "--mongo-password",
            "mpw",
            "--mongo-cluster-url",
            "cluster0.abcde.mongodb.net",
            "--database-name",
            "utilities",
            "--collection-name",
            "readings",
        ])
        .unwrap();
        match args.command() {
            Command::Init(init) => {
                assert_eq!(init.username(), "pdemaers");
                assert_eq!(init.collection_name(), "readings");
                assert_eq!(init.bind_addr(), None);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_init_requires_collection() {
        let result = Args::try_parse_from(["utilities", "init", "--username", "x"]);
        assert!(result.is_err());
    }
}
