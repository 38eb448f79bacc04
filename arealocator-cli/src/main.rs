//! AreaLocator CLI - runs the geolocation HTTP service.
//!
//! Configuration is environment-style (see `arealocator::config`); every
//! setting can be overridden with a command-line flag. The district
//! dataset is loaded eagerly before the server starts so a missing or
//! malformed file fails the process instead of the first request.

mod error;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use arealocator::config::Config;
use arealocator::geocode::{GoogleMapsProvider, ProviderChain, ReqwestClient};
use arealocator::locator::Locator;
use arealocator::server;

use error::CliError;

#[derive(Debug, Parser)]
#[command(
    name = "arealocator",
    version,
    about = "Service-area lookup for user-entered addresses"
)]
struct Args {
    /// Listen address (overrides BIND_ADDR).
    #[arg(long)]
    bind: Option<SocketAddr>,

    /// Path to the district GeoJSON dataset (overrides DISTRICTS_FILE).
    #[arg(long)]
    districts_file: Option<PathBuf>,

    /// Google Maps API key (overrides GOOGLE_MAPS_API_KEY).
    #[arg(long)]
    api_key: Option<String>,

    /// Maximum number of cached lookups (overrides CACHE_MAX).
    #[arg(long)]
    cache_max: Option<usize>,

    /// Maximum cache entry age in milliseconds (overrides CACHE_MAX_AGE).
    #[arg(long)]
    cache_max_age_ms: Option<u64>,

    /// Per-call geocoding timeout in seconds (overrides GEOCODING_TIMEOUT).
    #[arg(long)]
    timeout_secs: Option<u64>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), CliError> {
    let config = apply_overrides(Config::from_env()?, &args);
    config.ensure_api_key()?;

    let client = ReqwestClient::with_timeout(config.geocoding_timeout.as_secs())
        .map_err(|e| CliError::Startup(e.to_string()))?;
    let chain = ProviderChain::new(vec![GoogleMapsProvider::new(
        client,
        config.google_maps_api_key.clone(),
    )]);
    let locator = Arc::new(Locator::new(
        chain,
        config.districts_file.clone(),
        config.cache.clone(),
    ));

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| CliError::RuntimeCreation(e.to_string()))?;

    runtime.block_on(async {
        locator
            .preload_districts()
            .await
            .map_err(|e| CliError::Startup(e.to_string()))?;
        info!(
            addr = %config.bind_addr,
            districts = %config.districts_file.display(),
            "starting geolocation service"
        );
        server::serve(locator, config.bind_addr)
            .await
            .map_err(CliError::Serve)
    })
}

/// Applies CLI flag overrides on top of the environment configuration.
fn apply_overrides(mut config: Config, args: &Args) -> Config {
    if let Some(bind) = args.bind {
        config = config.with_bind_addr(bind);
    }
    if let Some(path) = &args.districts_file {
        config = config.with_districts_file(path.clone());
    }
    if let Some(key) = &args.api_key {
        config = config.with_api_key(key.clone());
    }
    if let Some(secs) = args.timeout_secs {
        config = config.with_geocoding_timeout(Duration::from_secs(secs));
    }

    let mut cache = config.cache.clone();
    if let Some(max) = args.cache_max {
        cache = cache.with_max_entries(max);
    }
    if let Some(millis) = args.cache_max_age_ms {
        cache = cache.with_max_age(Duration::from_millis(millis));
    }
    config.with_cache(cache)
}
