//! Join the discovery group from a shell: announce a service or watch one.

use std::time::Duration;

use agora_discovery::{Discovery, DiscoveryConfig, ServiceAnnouncement};
use anyhow::Context;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "discovery-probe", about = "Multicast discovery probe")]
struct Cli {
    /// Override the multicast group (host:port)
    #[arg(long)]
    group: Option<std::net::SocketAddrV4>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Announce a service until interrupted
    Announce {
        #[arg(long)]
        name: String,
        #[arg(long)]
        uri: String,
    },
    /// Print the live endpoints of a service every announce period
    Watch {
        #[arg(long)]
        name: String,
        /// Wait for at least this many endpoints before each print
        #[arg(long, default_value_t = 1)]
        min: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    agora_core::logging::init();
    let cli = Cli::parse();

    let mut config = DiscoveryConfig::from_settings().context("loading discovery settings")?;
    if let Some(group) = cli.group {
        config = config.with_group(group);
    }
    let period = config.announce_period();
    let discovery = Discovery::new(config);

    match cli.command {
        Command::Announce { name, uri } => {
            let announcement = ServiceAnnouncement::new(name, &uri)?;
            discovery.start(Some(announcement)).await?;
            tokio::signal::ctrl_c().await?;
        }
        Command::Watch { name, min } => {
            discovery.start(None).await?;
            loop {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => break,
                    live = discovery.lookup(&name, min, period) => {
                        let uris: Vec<&str> = live.iter().map(|u| u.as_str()).collect();
                        println!("{name}: {uris:?}");
                        if live.len() >= min {
                            tokio::time::sleep(period.max(Duration::from_millis(100))).await;
                        }
                    }
                }
            }
        }
    }

    discovery.shutdown().await;
    Ok(())
}
