use crate::auth::hash_password;
use crate::commands::Out;
use crate::Result;

/// Hashes `password` with argon2. The hash is returned as the structured output so that it can be
/// appended to the credentials file by hand.
pub fn hash(password: &str) -> Result<Out<String>> {
    let phc = hash_password(password)?;
    Ok(Out::new(format!("Password hash: {phc}"), phc))
}
