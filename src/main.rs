//! Marquee - Movie catalog API server entry point.

use std::path::Path;

use anyhow::Result;
use argh::FromArgs;
use tracing_subscriber::EnvFilter;

use marquee::api;
use marquee::catalog::CatalogLoader;
use marquee::service::MovieService;

/// Marquee - blazingly fast movie catalog API over a static JSON dump
#[derive(FromArgs)]
struct Args {
    /// path to the movie metadata JSON file (default: movies_metadata.json)
    #[argh(positional)]
    dataset: Option<String>,

    /// port to listen on (default: $PORT or 3001)
    #[argh(option, short = 'p')]
    port: Option<u16>,

    /// address to bind (default: 0.0.0.0)
    #[argh(option)]
    host: Option<String>,

    /// directory with a built frontend to serve outside /api
    #[argh(option)]
    static_dir: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Args = argh::from_env();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let dataset = args.dataset.as_deref().unwrap_or("movies_metadata.json");
    let host = args.host.as_deref().unwrap_or("0.0.0.0");
    let port = args.port.or_else(env_port).unwrap_or(3001);

    // Warm the catalog before accepting traffic.
    let service = MovieService::new(CatalogLoader::new(dataset));
    service.warm().await;

    api::start_server(service, host, port, args.static_dir.as_deref().map(Path::new)).await
}

/// `PORT` environment variable, when set and parsable.
fn env_port() -> Option<u16> {
    std::env::var("PORT").ok()?.parse().ok()
}
