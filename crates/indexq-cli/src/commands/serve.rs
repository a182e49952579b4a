use anyhow::{Context, Result};
use indexq_core::Config;
use indexq_daemon::Server;
use std::sync::Arc;

pub async fn run(config: Config) -> Result<()> {
    let sessions = Arc::new(indexq_core::session_manager(&config));
    eprintln!("indexq serving on {}", config.listen_addr());
    eprintln!("  Build cache: {}", config.store.cache_root().display());

    let server = Server::new(config.daemon.clone(), sessions);
    server.serve().await.context("Query service failed")?;

    eprintln!("indexq stopped");
    Ok(())
}
