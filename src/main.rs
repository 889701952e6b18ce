use anyhow::Result;
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use shortly::analytics::{DisabledGeoResolver, GeoResolver, HttpGeoResolver};
use shortly::app::{create_app, AppState};
use shortly::clock::{Clock, SystemClock};
use shortly::config::Config;
use shortly::logging::{self, LogLevel, Package, RemoteLogger};
use shortly::registry::{RandomHexGenerator, Registry};
use shortly::service::{ServiceSettings, ShortenerService};
use shortly::sweeper::Sweeper;

#[derive(Parser)]
#[command(name = "shortly")]
#[command(about = "URL shortener with click analytics", long_about = None)]
struct Cli {
    /// Configuration file (TOML, YAML or JSON)
    #[arg(long, env = "SHORTLY_CONFIG")]
    config: Option<PathBuf>,
    /// Override `server.host`
    #[arg(long)]
    host: Option<String>,
    /// Override `server.port`
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    logging::init_tracing(&config.log_level);
    info!("Loaded configuration");

    let logger = RemoteLogger::new(&config.remote_log)?;
    if logger.is_remote() {
        info!("📡 Remote log delivery enabled");
    }

    let geo: Arc<dyn GeoResolver> = if config.geo.enabled {
        info!("🌍 Geo lookups via {}", config.geo.api_url);
        Arc::new(HttpGeoResolver::new(&config.geo)?)
    } else {
        info!("🌍 Geo lookups disabled");
        Arc::new(DisabledGeoResolver)
    };

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let registry = Arc::new(Registry::with_generator(
        Box::new(RandomHexGenerator),
        config.shortener.max_generation_attempts,
    ));
    let service = Arc::new(ShortenerService::new(
        Arc::clone(&registry),
        geo,
        clock,
        logger.clone(),
        ServiceSettings::from_config(&config),
    ));

    let sweeper = config.shortener.sweep_interval().map(|interval| {
        info!(
            "🧹 Sweeping expired links every {:?} (grace {:?})",
            interval,
            config.shortener.expiry_grace()
        );
        Sweeper::spawn(
            Arc::clone(&service),
            interval,
            config.shortener.expiry_grace(),
        )
    });

    let app = create_app(AppState::new(service, config.redirect_status));

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("🚀 Server listening on http://{}", addr);
    info!("   - Short links are issued under {}/r/...", config.base_url);
    logger.log(
        LogLevel::Info,
        Package::Config,
        format!("Server started on {addr}"),
    );

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    if let Some(sweeper) = sweeper {
        sweeper.shutdown().await;
    }
    info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!("Failed to listen for SIGTERM: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
