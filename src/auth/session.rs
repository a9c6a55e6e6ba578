use crate::auth::{CredentialStore, Identity};
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// The outcome of the most recent login attempt in a session.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthStatus {
    /// Nothing has been submitted yet in this session.
    #[default]
    Pending,
    Authenticated,
    /// The username is unknown or the password did not match.
    Rejected,
}

serde_plain::derive_display_from_serialize!(AuthStatus);

/// The per-session authentication context. It is created when a session starts and holds the
/// login status and, when authenticated, the identity of the user.
#[derive(Debug, Clone)]
pub struct Session {
    id: Uuid,
    status: AuthStatus,
    identity: Option<Identity>,
}

impl Session {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            status: AuthStatus::Pending,
            identity: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn status(&self) -> AuthStatus {
        self.status
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.status == AuthStatus::Authenticated
    }

    /// Checks `username` and `password` against `credentials` and records the outcome. A failed
    /// attempt clears any identity from an earlier login.
    pub fn login(
        &mut self,
        credentials: &CredentialStore,
        username: &str,
        password: &str,
    ) -> AuthStatus {
        match credentials.verify(username, password) {
            Some(identity) => {
                info!("Logged in '{}'", identity.username);
                self.status = AuthStatus::Authenticated;
                self.identity = Some(identity);
            }
            None => {
                warn!("Rejected a login attempt");
                self.status = AuthStatus::Rejected;
                self.identity = None;
            }
        }
        self.status
    }

    /// Gives the session a new random id, so that an id seen before a login or a logout stops
    /// naming it.
    pub fn renew_id(&mut self) {
        self.id = Uuid::new_v4();
    }

    /// Returns the session to `Pending` and forgets the identity.
    pub fn logout(&mut self) {
        debug!("Logging out session {}", self.id);
        self.status = AuthStatus::Pending;
        self.identity = None;
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
