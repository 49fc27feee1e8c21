use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use eyre::{Result, WrapErr};
use log::{info, warn};

use ytsum::Resolver;
use ytsum::config::{self, Config};
use ytsum::render::{HtmlTemplate, Render};
use ytsum::server::{self, AppState};
use ytsum::youtube::YouTubeProvider;

mod cli;

use cli::Cli;

fn setup_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    // Load config file (non-fatal if missing/invalid)
    let config = Config::load().unwrap_or_else(|e| {
        warn!("Ignoring config {}: {e:#}", config::config_path().display());
        Config::default()
    });

    // CLI flags take priority over the config file
    let listen = cli.listen.unwrap_or_else(|| config.listen());
    let languages = if cli.lang.is_empty() { config.languages() } else { cli.lang.clone() };
    let timeout = Duration::from_secs(cli.timeout.unwrap_or_else(|| config.timeout_secs()));

    let renderer: Arc<dyn Render> = match cli.template.as_ref().or(config.template.as_ref()) {
        Some(path) => Arc::new(HtmlTemplate::from_file(path)?),
        None => Arc::new(HtmlTemplate::embedded()?),
    };

    let provider = YouTubeProvider::new().wrap_err("failed to build HTTP client")?;
    let resolver = Resolver::new(Arc::new(provider), languages);
    info!("Preferred transcript languages: {:?}", resolver.languages());

    let state = AppState {
        resolver: Arc::new(resolver),
        renderer,
        timeout,
    };

    server::serve(listen, state).await
}
