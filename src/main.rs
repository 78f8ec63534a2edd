use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use szokincs::api_server;
use szokincs::trainer::TrainerStore;

#[derive(Parser)]
#[command(name = "szokincs", about = "Vocabulary trainer API server", version)]
struct Args {
    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 3000)]
    port: u16,

    /// Data directory (default: platform-local app data)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Word list imported on startup when the card set is empty
    #[arg(long)]
    seed_csv: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let data_dir = match args.data_dir {
        Some(dir) => dir,
        None => TrainerStore::default_data_dir()?,
    };
    let store = Arc::new(TrainerStore::open(data_dir).context("failed to open data directory")?);

    if store.card_count().await == 0 {
        if let Some(path) = &args.seed_csv {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            let summary = store.import_text(&text).await?;
            log::info!("seeded {} cards from {}", summary.inserted, path.display());
        }
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    let mut server = api_server::start_server(Arc::clone(&store), addr)
        .await
        .map_err(|err| anyhow::anyhow!("failed to start server: {err}"))?;
    log::info!("server running on port {}", server.port);

    tokio::signal::ctrl_c().await?;
    server.stop();
    Ok(())
}
