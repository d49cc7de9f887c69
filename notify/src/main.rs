//! One-shot GitHub push notifier.
//!
//! Reads the push event payload named by `GITHUB_EVENT_PATH`, formats a
//! summary and posts it to the Discord webhook from
//! `DISCORD_WEBHOOK_URL`. Any failure exits non-zero without sending;
//! transport errors are not retried.

use std::process::ExitCode;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use push_notify::{build_message, event, send, NotifyConfig, NotifyError};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Notification failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), NotifyError> {
    let config = NotifyConfig::from_env()?;
    let push_event = event::read_event(&config.event_path)?;
    let message = build_message(&config, &push_event);
    send(&config.webhook_url, &message).await?;

    tracing::info!("Notification sent");
    Ok(())
}
