use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;

use ironfleet::api::HttpGameClient;
use ironfleet::fleet::FleetManager;
use ironfleet::gateway;
use ironfleet::settings::Settings;
use ironfleet::world::WorldAtlas;

/// Fleet controller for cooldown-gated game characters.
#[derive(Parser, Debug)]
#[command(name = "ironfleet", version, about)]
struct Cli {
    /// Gateway listen address (overrides GATEWAY_ADDR).
    #[arg(long)]
    bind: Option<SocketAddr>,

    /// Start every agent as soon as the roster is seeded.
    #[arg(long)]
    autostart: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("ironfleet=info")),
        )
        .init();

    let cli = Cli::parse();
    let mut settings = Settings::from_env()?;
    if let Some(bind) = cli.bind {
        settings.gateway_addr = bind;
    }

    let api = Arc::new(HttpGameClient::new(&settings.api));

    // The atlas must be fully loaded before any agent starts; a failed
    // load aborts startup.
    let atlas = Arc::new(WorldAtlas::load(api.as_ref()).await?);

    let manager = Arc::new(FleetManager::new(api, atlas, &settings));
    let seeded = manager.seed_roster().await?;
    tracing::info!("Fleet ready with {} agents", seeded);

    if cli.autostart {
        manager.start_all().await;
    }

    gateway::serve(settings.gateway_addr, Arc::clone(&manager)).await?;

    // The gateway exited on ctrl-c; wind the fleet down before leaving.
    manager.stop_all().await;
    Ok(())
}
