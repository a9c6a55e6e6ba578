use crate::commands::Out;
use crate::web::Server;
use crate::{Config, Mode, Result};
use tracing::info;

/// Binds the web server to `bind_addr`, or to the address in `config.json` when `None`, and
/// serves requests until the process is stopped with ctrl-c.
pub async fn serve(config: Config, mode: Mode, bind_addr: Option<&str>) -> Result<Out<()>> {
    let addr = bind_addr.unwrap_or(config.bind_addr()).to_string();
    let server = Server::bind(config, mode, &addr).await?;
    info!("Listening on http://{}", server.local_addr());
    server.run_until(shutdown_signal()).await?;
    Ok("The server has stopped".into())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        // Without a signal handler the server runs until killed.
        std::future::pending::<()>().await;
    }
}
