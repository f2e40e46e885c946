//! flock-sim - autonomous drone simulation loop

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use flock_gateway::{Gateway, HttpGateway};
use flock_sim::{config::Args, cycle::Simulation, init};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("flock_sim=info".parse()?),
        )
        .init();

    let args = Args::parse();
    let sim_config = args.sim_config();
    let gateway = HttpGateway::new(args.gateway_config());

    tracing::info!(
        interval_secs = sim_config.interval.as_secs(),
        "Starting drone simulation loop"
    );

    let drone = init::init_drone(&gateway)
        .await
        .context("drone initialization failed")?;
    tracing::info!(drone_id = drone.id, "drone ready");

    // Seeds the fixed operating boundary; fetched once at startup.
    let home = gateway
        .get_controller_location()
        .await
        .context("failed to fetch controller location")?;

    let mut simulation = Simulation::new(gateway, sim_config, home);
    simulation.run().await;

    Ok(())
}
