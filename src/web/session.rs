//! Server-side sessions keyed by an opaque id carried in a cookie.

use crate::auth::Session;
use axum::http::header::COOKIE;
use axum::http::HeaderMap;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::trace;
use uuid::Uuid;

/// The name of the cookie holding the session id.
pub const SESSION_COOKIE: &str = "utilities_session";

/// The authenticated sessions. Anonymous visitors get a `Pending` session that is never
/// registered, so only a successful login adds an entry and a logout removes it again. Sessions are
/// never expired; the cookie has no `Max-Age` so it lasts as long as the browser session.
#[derive(Debug, Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<Mutex<HashMap<Uuid, Session>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the session named by the request's cookie. A request without the cookie,
    /// or with an id that is not registered, gets a new `Pending` session that is not registered.
    pub async fn resume(&self, headers: &HeaderMap) -> Session {
        let sessions = self.sessions.lock().await;
        if let Some(session) = session_id(headers).and_then(|id| sessions.get(&id)) {
            return session.clone();
        }
        Session::new()
    }

    /// Registers a freshly authenticated session under a new id and drops the id it arrived with,
    /// so an id handed out before the login never names an authenticated session.
    pub async fn promote(&self, mut session: Session) -> Session {
        let mut sessions = self.sessions.lock().await;
        sessions.remove(&session.id());
        session.renew_id();
        trace!("Registering session {}", session.id());
        sessions.insert(session.id(), session.clone());
        session
    }

    /// Drops the session registered under `id`, if any.
    pub async fn discard(&self, id: Uuid) {
        if self.sessions.lock().await.remove(&id).is_some() {
            trace!("Dropped session {id}");
        }
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }
}

/// Reads the session id from the `Cookie` headers.
pub fn session_id(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| Uuid::parse_str(value.trim()).ok())
}

/// The `Set-Cookie` value for `session`.
pub fn cookie(session: &Session) -> String {
    format!(
        "{SESSION_COOKIE}={}; Path=/; HttpOnly; SameSite=Lax",
        session.id()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{hash_password, CredentialStore, UserEntry};
    use axum::http::HeaderValue;

    fn headers(cookie: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_str(cookie).unwrap());
        headers
    }

    #[test]
    fn test_session_id() {
        let id = Uuid::new_v4();
        let found = session_id(&headers(&format!("theme=dark; {SESSION_COOKIE}={id}")));
        assert_eq!(found, Some(id));
        assert_eq!(session_id(&headers("theme=dark")), None);
        assert_eq!(session_id(&headers(&format!("{SESSION_COOKIE}=junk"))), None);
        assert_eq!(session_id(&HeaderMap::new()), None);
    }

    #[test]
    fn test_cookie_round_trip() {
        let session = Session::new();
        let set_cookie = cookie(&session);
        let value = set_cookie.split(';').next().unwrap();
        assert_eq!(session_id(&headers(value)), Some(session.id()));
        assert!(set_cookie.contains("HttpOnly"));
    }

    fn cookie_header(session: &Session) -> HeaderMap {
        headers(&format!("{SESSION_COOKIE}={}", session.id()))
    }

    fn authenticated() -> Session {
        let users = vec![UserEntry {
            username: "pdemaers".into(),
            name: "Patrick Demaerschalk".into(),
        }];
        let creds = CredentialStore::new(&users, vec![hash_password("s3cret").unwrap()]).unwrap();
        let mut session = Session::new();
        session.login(&creds, "pdemaers", "s3cret");
        session
    }

    #[tokio::test]
    async fn test_anonymous_requests_are_not_registered() {
        let registry = SessionRegistry::new();
        for _ in 0..50 {
            let session = registry.resume(&HeaderMap::new()).await;
            assert!(!session.is_authenticated());
        }
        let unknown = Session::new();
        let again = registry.resume(&cookie_header(&unknown)).await;
        assert_ne!(again.id(), unknown.id());
        assert_eq!(registry.len().await, 0);
    }

    #[tokio::test]
    async fn test_promote_issues_new_id() {
        let registry = SessionRegistry::new();
        let before = authenticated();
        let promoted = registry.promote(before.clone()).await;
        assert_ne!(promoted.id(), before.id());
        assert_eq!(registry.len().await, 1);

        let resumed = registry.resume(&cookie_header(&promoted)).await;
        assert_eq!(resumed.id(), promoted.id());
        assert!(resumed.is_authenticated());

        // The id the browser held before logging in does not reach the authenticated session.
        let stale = registry.resume(&cookie_header(&before)).await;
        assert!(!stale.is_authenticated());
    }

    #[tokio::test]
    async fn test_logout_keeps_registry_flat() {
        let registry = SessionRegistry::new();
        let session = registry.promote(authenticated()).await;
        registry.discard(session.id()).await;
        assert_eq!(registry.len().await, 0);
        assert!(!registry
            .resume(&cookie_header(&session))
            .await
            .is_authenticated());

        // Logging in again after logging out replaces, never accumulates.
        for _ in 0..5 {
            let session = registry.promote(authenticated()).await;
            registry.discard(session.id()).await;
        }
        assert_eq!(registry.len().await, 0);
    }
}
