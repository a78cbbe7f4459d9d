use album_expander::{AppState, Args, CatalogClientImpl, Result};
use clap::Parser;
use log::info;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let default_filter = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let settings = args.expand_settings()?;
    let config = args.client_config();
    info!(
        "Using catalog at {} (page size {}, hydrate tracks: {}, infer artist genres: {})",
        config.api_base_url, settings.page_size, settings.hydrate_tracks, settings.infer_artist_genres
    );

    let http_client = http_client::native::NativeClient::new();
    let client = CatalogClientImpl::new(Box::new(http_client), config);

    album_expander::serve(args.listen_addr(), AppState::new(Arc::new(client), settings)).await
}
