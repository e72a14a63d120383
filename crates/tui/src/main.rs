use std::{fs::OpenOptions, path::Path, sync::Mutex};

use tally_tui::{
    app::App,
    config::{self, AppConfig},
    error::Result,
    session::{FileTokenStore, Session},
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let config = config::load()?;
    init_tracing(&config)?;
    tracing::info!(api_url = %config.api_url, "starting tally");

    let session = Session::restore(FileTokenStore::new(&config.session_file))?;
    let mut app = App::new(&config, session)?;
    let result = app.run().await;
    if let Err(err) = &result {
        tracing::error!("tally exited with error: {err}");
    }
    result
}

fn init_tracing(config: &AppConfig) -> Result<()> {
    if let Some(dir) = Path::new(&config.log_file).parent() {
        std::fs::create_dir_all(dir)?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_file)?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(format!(
            "tally={level},tally_tui={level}",
            level = config.log_level
        )))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}
