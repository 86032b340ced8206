use clap::Parser;
use deck_server::{Application, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::parse();

    let default_level = if config.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    log::info!("Starting pptx-service v{}", env!("CARGO_PKG_VERSION"));

    let application = Application::build(config).await?;
    application.run_until_stopped().await?;

    Ok(())
}
