//! Single-user authentication: the static credential store and the session context that records
//! the login status.

mod credentials;
mod session;

pub use credentials::{hash_password, CredentialStore, Identity, UserEntry};
pub use session::{AuthStatus, Session};
