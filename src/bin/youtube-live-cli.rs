//! Operator CLI for the tool gateway.
//!
//! `auth` drives the browser-based authorization flow end to end with a
//! short-lived redirect listener; the other commands are small wrappers over
//! the same tools the server exposes.

use eyre::Context;
use std::io::IsTerminal;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use youtube_live_tools::{Settings, Toolbox, callback};

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

    let mut args = std::env::args().skip(1);
    let command = args.next().unwrap_or_else(|| "accounts".to_string());
    match command.as_str() {
        "auth" => {
            let url = toolbox.oauth().authorization_url()?;
            eprintln!("Authorize this application in your browser:\n  {url}");
            if let Err(e) = webbrowser::open(url.as_str()) {
                tracing::warn!("could not open browser, follow the URL by hand: {e}");
            }
            let record = callback::receive_authorization(toolbox.oauth(), toolbox.settings())
                .await
                .context("complete authorization flow")?;
            eprintln!(
                "Connected {} ({}) as {}",
                record.channel_title, record.user_id, record.user_name
            );
        }
        "accounts" => {
            let listing = toolbox
                .dispatch("youtube_accounts_list", serde_json::json!({}))
                .await?;
            println!("{}", serde_json::to_string_pretty(&listing)?);
        }
        "activate" => {
            let Some(user_id) = args.next() else {
                eyre::bail!("usage: youtube-live-cli activate <user_id>");
            };
            toolbox
                .dispatch(
                    "youtube_accounts_set_active",
                    serde_json::json!({ "user_id": user_id }),
                )
                .await?;
            eprintln!("active account set to {user_id}");
        }
        "broadcasts" => {
            let status = args.next().unwrap_or_else(|| "upcoming".to_string());
            let listing = toolbox
                .dispatch(
                    "youtube_live_broadcasts_list_by_status",
                    serde_json::json!({ "broadcast_status": status }),
                )
                .await?;
            println!("{}", serde_json::to_string_pretty(&listing)?);
        }
        other => {
            eprintln!(
                "unknown command {other:?}; expected auth | accounts | activate <user_id> | broadcasts [status]"
            );
            std::process::exit(2);
        }
    }

    Ok(())
}
