use anyhow::{anyhow, Result};
use dockcrab::error::Error::DNSError;
use dockcrab::inventory::DynInventory;
use dockcrab::zone::synthesize;
use dockcrab::{Config, DockerInventory, Refresher, Resolver, Shared, SharedZone};
use is_terminal::IsTerminal;
use std::sync::Arc;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_init();

    let mut first_args = std::env::args().take(2);
    let (program_name, config_file) = (
        first_args.next().unwrap_or("dockcrab".to_string()),
        first_args.next(),
    );

    let config = config_init(&program_name, config_file)?;
    tracing::info!(
        "serving {} with ns1 at {}, refreshing every {:?}",
        config.domain,
        config.dns_ip,
        config.refresh_interval
    );

    // Serve the infrastructure records until the first refresh lands.
    let zone = SharedZone::new(synthesize(&[], &config));
    let inventory: DynInventory = Arc::new(DockerInventory::new(&config.docker_socket));
    let refresher = Refresher::new(config.clone(), inventory, zone.clone());
    let resolver = Resolver::new(zone);

    tracing::info!("inventory from {}", config.docker_socket.display());
    let refresh_handle = tokio::spawn(refresher.clone().run());

    tracing::info!("DNS listening on UDP {}", config.dns_udp_bind_addr());
    let dns_server = dockcrab::dns::new(config.clone(), resolver.clone()).await?;
    let dns_handle = tokio::spawn(dns_server.block_until_done());

    let api_handle = tokio::spawn({
        let config = config.clone();
        async move {
            match config.api_bind_addr {
                Some(addr) => {
                    tracing::info!("API listening on {addr}");
                    dockcrab::api::new(&config, addr, resolver, refresher).await
                }
                None => std::future::pending().await,
            }
        }
    });

    tokio::select! {
        _ = signal::ctrl_c() => {
            tracing::info!("quitting from signal");
        },
        Ok(dns_res) = dns_handle => {
            if let Err(err) = dns_res {
                return Err(DNSError(err).into())
            }
        }
        Ok(api_res) = api_handle => {
            if let Err(err) = api_res {
                return Err(err.into())
            }
        }
        res = refresh_handle => {
            return Err(anyhow!("refresh task stopped: {res:?}"))
        }
    }
    tracing::info!("goodbye");
    Ok(())
}

fn tracing_init() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_ansi(std::io::stdout().is_terminal()))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dockcrab=info".into()),
        )
        .init();
}

fn config_init(program_name: &str, config_file: Option<String>) -> Result<Shared> {
    let config = match config_file {
        Some(flag) if flag == "-h" || flag == "--help" => {
            return Err(anyhow!(
                "usage: {program_name} [/path/to/config.json]\n\
                 without a config file, settings are read from DOCKER_*_DNS variables"
            ))
        }
        Some(config_file) => {
            tracing::debug!("loaded config from {config_file}");
            Config::try_from_file(&config_file)?
        }
        None => {
            tracing::debug!("loaded config from environment");
            Config::from_env()?
        }
    };
    Ok(Arc::new(config))
}
