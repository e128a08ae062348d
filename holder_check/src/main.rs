use std::sync::Arc;

use anyhow::Result;
use holder_check::server::{routes, AppContext};
use holder_check::{Config, HeliusClient, KnownAddressRegistry};
use log::info;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();

    let config = Config::from_env()?;
    let rpc = HeliusClient::new(config.rpc_url.clone(), config.request_timeout)?;

    let ctx = Arc::new(AppContext {
        rpc: Arc::new(rpc),
        registry: KnownAddressRegistry::global(),
        default_limit: config.holder_limit,
        max_pages: config.max_pages,
    });

    info!(
        "holder_check listening on {}:{} (limit {}, max pages {:?})",
        config.listen_address, config.listen_port, config.holder_limit, config.max_pages
    );
    warp::serve(routes(ctx))
        .run((config.listen_address, config.listen_port))
        .await;

    Ok(())
}
