use toyhttpd::{Config, Server};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_level(true)
        .init();

    let cfg = Config::load()?;
    let port = cfg.port;

    let mut server = Server::from_fn(cfg, |req, res| {
        res.set_header("Content-Type", "text/plain; charset=utf-8")?;
        res.write("ToyHttpd\n")?;
        res.end_with(format!("{} {}\n", req.method(), req.target()))?;
        Ok(())
    });
    server.listen(port)?;

    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?
        .block_on(tokio::signal::ctrl_c())?;
    tracing::info!("Shutdown signal received");

    server.close()?;
    Ok(())
}
