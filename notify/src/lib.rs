pub mod event;
pub mod message;

pub use event::{read_event, NotifyConfig, NotifyError, PushEvent};
pub use message::{build_message, WebhookMessage};

use std::time::Duration;

/// Bounded timeout on the single outbound webhook call.
pub const SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Post the message to the webhook. One attempt, no retry.
pub async fn send(webhook_url: &str, message: &WebhookMessage) -> Result<(), NotifyError> {
    let client = reqwest::Client::builder()
        .timeout(SEND_TIMEOUT)
        .build()
        .map_err(|e| NotifyError::Send(e.to_string()))?;

    client
        .post(webhook_url)
        .json(message)
        .send()
        .await
        .map_err(|e| NotifyError::Send(e.to_string()))?
        .error_for_status()
        .map_err(|e| NotifyError::Send(e.to_string()))?;

    Ok(())
}
