//! The web server: one page with a login gate and, once logged in, the menu and the three views.
//!
//! Every request is rendered top to bottom: the session is looked up, the selected view talks to
//! the data store and the whole page is returned as HTML.

mod handlers;
pub mod html;
pub mod session;

use crate::error::{ErrorType, IntoResult};
use crate::{Config, Mode, Result};
use anyhow::Context;
use axum::routing::{get, post};
use axum::Router;
use session::SessionRegistry;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, info};

/// State shared by all handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub mode: Mode,
    pub sessions: SessionRegistry,
}

impl AppState {
    pub fn new(config: Config, mode: Mode) -> Self {
        Self {
            config: Arc::new(config),
            mode,
            sessions: SessionRegistry::new(),
        }
    }
}

/// Builds the application routes.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/login", post(handlers::login))
        .route("/logout", post(handlers::logout))
        .route("/entry", post(handlers::entry_submit))
        .route("/table.csv", get(handlers::table_csv))
        .with_state(state)
}

/// A bound, not yet running, server.
pub struct Server {
    listener: TcpListener,
    local_addr: SocketAddr,
    router: Router,
}

impl Server {
    /// Binds `addr`. Port 0 picks a free port, see `local_addr`.
    pub async fn bind(config: Config, mode: Mode, addr: &str) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Unable to listen on {addr}"))
            .pub_result(ErrorType::Service)?;
        let local_addr = listener
            .local_addr()
            .context("Unable to read the bound address")
            .pub_result(ErrorType::Service)?;
        debug!("Bound {local_addr} in {mode:?} mode");
        Ok(Self {
            listener,
            local_addr,
            router: router(AppState::new(config, mode)),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Serves requests until the process exits.
    pub async fn run(self) -> Result<()> {
        self.run_until(std::future::pending()).await
    }

    /// Serves requests until `signal` completes, then finishes in-flight requests and returns.
    pub async fn run_until<F>(self, signal: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(signal)
            .await
            .context("The web server failed")
            .pub_result(ErrorType::Service)?;
        info!("Stopped serving on {}", self.local_addr);
        Ok(())
    }
}
