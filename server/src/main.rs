use std::sync::Arc;

use anyhow::Context;
use axum::Extension;
use lut_manager_client::wallet::{KeypairWallet, Wallet};
use tower_http::cors::CorsLayer;
use tracing_subscriber::EnvFilter;

mod config;
mod error;
mod routes;
mod session;

use config::ServerConfig;
use session::ApiContext;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Inject environment variables
    let _ = dotenv::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::from_env()?;

    let wallet: Arc<dyn Wallet> = match &config.keypair_path {
        Some(path) => Arc::new(KeypairWallet::from_file(path)?),
        None => {
            tracing::warn!("LUT_KEYPAIR not set, running without a connected wallet");
            Arc::new(KeypairWallet::disconnected())
        }
    };
    if let Some(authority) = wallet.public_key() {
        tracing::info!(%authority, "wallet connected");
    }

    tracing::info!(
        network = %config.network.cluster,
        endpoint = %config.network.endpoint(),
        "connecting"
    );
    let context = ApiContext::new(config.network, wallet, config.extend_options);

    let app = routes::router()
        .layer(CorsLayer::permissive())
        .layer(Extension(context));

    let addr = config.listen_addr;
    tracing::info!("Listening on {addr}");
    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await
        .context("server error")
}
