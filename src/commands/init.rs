use crate::args::InitArgs;
use crate::auth::UserEntry;
use crate::commands::Out;
use crate::error::{ErrorType, IntoResult};
use crate::store::StoreSecrets;
use crate::{Config, Result};
use anyhow::Context;
use std::path::Path;

/// Creates the home directory, its secrets subdirectory and:
/// - Creates an initial `config.json` naming the user and the bind address
/// - Stores the argon2 hash of the user's password in `.secrets/hashed_pw.json`
/// - Stores the MongoDB connection secrets in `.secrets/store.json`
///
/// # Arguments
/// - `utilities_home` - The directory that will be the root of the configuration, e.g.
///   `$HOME/utilities`
/// - `args` - The user and data store settings given on the command line.
///
/// # Errors
/// - Returns an error if `config.json` already exists or if any file operations fail.
pub async fn init(utilities_home: &Path, args: &InitArgs) -> Result<Out<()>> {
    let user = UserEntry {
        username: args.username().to_string(),
        name: args.name().to_string(),
    };
    let secrets = StoreSecrets {
        mongo_username: args.mongo_username().to_string(),
        mongo_password: args.mongo_password().to_string(),
        mongo_cluster_url: args.mongo_cluster_url().to_string(),
        database_name: args.database_name().to_string(),
        collection_name: args.collection_name().to_string(),
    };
    let config = Config::create(
        utilities_home,
        user,
        args.password(),
        secrets,
        args.bind_addr().map(String::from),
    )
    .await
    .context("Unable to create the utilities directory and configs")
    .pub_result(ErrorType::Config)?;
    Ok(format!(
        "Successfully created the utilities config at {}",
        config.config_path().display()
    )
    .into())
}
