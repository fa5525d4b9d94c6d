use log::error;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config_path = std::env::args()
        .nth(1)
        .map_or_else(statusping::config::default_config_path, PathBuf::from);

    let config = match statusping::Config::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load {}: {e}", config_path.display());
            std::process::exit(1);
        }
    };

    let token = CancellationToken::new();
    let shutdown = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            shutdown.cancel();
        }
    });

    match statusping::run(&config, &token).await {
        Ok(outcome) => std::process::exit(outcome.exit_code()),
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    }
}
