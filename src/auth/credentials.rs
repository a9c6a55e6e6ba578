//! The credential store: a static mapping from username to display name and password hash,
//! loaded once at startup.

use crate::error::{ErrorType, IntoResult};
use crate::Result;
use anyhow::{anyhow, ensure, Context};
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use rand_core::OsRng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// A configured user, without the password hash.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct UserEntry {
    pub username: String,
    /// The name shown in the UI once logged in.
    pub name: String,
}

/// The resolved identity of a logged-in user.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct Identity {
    pub username: String,
    pub display_name: String,
}

#[derive(Debug, Clone)]
struct Credential {
    display_name: String,
    password_hash: String,
}

/// Maps usernames to display names and argon2 password hashes.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    users: HashMap<String, Credential>,
    /// Verified against when the username is unknown so that both failure kinds cost the same.
    dummy_hash: String,
}

impl CredentialStore {
    /// Builds the store by pairing `users` with `hashes` by position.
    ///
    /// # Errors
    /// - The two lists have different lengths.
    /// - A username appears twice.
    /// - A hash is not a valid PHC string.
    pub fn new(users: &[UserEntry], hashes: Vec<String>) -> Result<Self> {
        ensure!(
            users.len() == hashes.len(),
            "The credentials file holds {} password hashes but {} users are configured",
            hashes.len(),
            users.len()
        );
        let mut map = HashMap::with_capacity(users.len());
        for (user, password_hash) in users.iter().zip(hashes) {
            PasswordHash::new(&password_hash)
                .map_err(|e| anyhow!("{e}"))
                .with_context(|| format!("The password hash for '{}' is invalid", user.username))?;
            let previous = map.insert(
                user.username.clone(),
                Credential {
                    display_name: user.name.clone(),
                    password_hash,
                },
            );
            ensure!(
                previous.is_none(),
                "The username '{}' is configured more than once",
                user.username
            );
        }
        Ok(Self {
            users: map,
            dummy_hash: hash_password("dummy password for unknown users")?,
        })
    }

    /// Loads the JSON array of hashes at `path` and pairs it with `users`.
    pub async fn load(users: &[UserEntry], path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let hashes: Vec<String> = crate::utils::deserialize(path)
            .await
            .pub_result(ErrorType::Config)?;
        debug!("Loaded {} password hashes from {}", hashes.len(), path.display());
        Self::new(users, hashes)
            .with_context(|| format!("Invalid credentials file {}", path.display()))
            .pub_result(ErrorType::Config)
    }

    /// Returns the identity for `username` when `password` matches its hash. An unknown username
    /// and a wrong password both return `None`.
    pub fn verify(&self, username: &str, password: &str) -> Option<Identity> {
        match self.users.get(username) {
            Some(credential) => {
                if verify_password(password, &credential.password_hash) {
                    Some(Identity {
                        username: username.to_string(),
                        display_name: credential.display_name.clone(),
                    })
                } else {
                    None
                }
            }
            None => {
                let _ = verify_password(password, &self.dummy_hash);
                None
            }
        }
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

/// Hashes `password` with argon2 and a random salt, returning the PHC string.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow!("Unable to hash the password: {e}"))?;
    Ok(hash.to_string())
}

fn verify_password(password: &str, password_hash: &str) -> bool {
    match PasswordHash::new(password_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn users() -> Vec<UserEntry> {
        vec![UserEntry {
            username: "pdemaers".into(),
            name: "Patrick Demaerschalk".into(),
        }]
    }

    #[test]
    fn test_verify() {
        let store = CredentialStore::new(&users(), vec![hash_password("s3cret").unwrap()]).unwrap();
        let identity = store.verify("pdemaers", "s3cret").unwrap();
        assert_eq!(identity.display_name, "Patrick Demaerschalk");
        assert_eq!(identity.username, "pdemaers");
        assert!(store.verify("pdemaers", "wrong").is_none());
        assert!(store.verify("nobody", "s3cret").is_none());
        assert!(store.verify("", "").is_none());
    }

    #[test]
    fn test_cardinality_mismatch() {
        let err = CredentialStore::new(&users(), vec![]).unwrap_err();
        assert!(err.to_string().contains("0 password hashes but 1 users"));
        let two = vec![hash_password("a").unwrap(), hash_password("b").unwrap()];
        assert!(CredentialStore::new(&users(), two).is_err());
    }

    #[test]
    fn test_duplicate_username() {
        let mut u = users();
        u.push(u[0].clone());
        let hashes = vec![hash_password("a").unwrap(), hash_password("b").unwrap()];
        let err = CredentialStore::new(&u, hashes).unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn test_invalid_hash() {
        let err = CredentialStore::new(&users(), vec!["not-a-hash".into()]).unwrap_err();
        assert!(format!("{err:#}").contains("pdemaers"));
    }

    #[tokio::test]
    async fn test_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("hashed_pw.json");
        let json = serde_json::to_string(&vec![hash_password("pw").unwrap()]).unwrap();
        crate::utils::write(&path, json).await.unwrap();
        let store = CredentialStore::load(&users(), &path).await.unwrap();
        assert_eq!(store.len(), 1);
        assert!(store.verify("pdemaers", "pw").is_some());

        let missing = CredentialStore::load(&users(), dir.path().join("nope.json")).await;
        assert_eq!(ErrorType::of(&missing.unwrap_err()), Some(ErrorType::Config));
    }
}
