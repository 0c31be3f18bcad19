use eyre::Context;
use std::io::IsTerminal;
use std::sync::Arc;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use youtube_live_tools::{Settings, Toolbox, server};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with_ansi(std::io::stdout().is_terminal())
        .init();

    let settings = Settings::from_env().context("load settings")?;
    let toolbox = Toolbox::new(settings).context("wire up tool gateway")?;

    // A corrupt token store should stop the server here, not on the first
    // tool call.
    let accounts = toolbox.store().load().context("read token store")?;
    tracing::info!(accounts = accounts.len(), "token store loaded");

    server::serve(Arc::new(toolbox)).await.context("serve tools")
}
