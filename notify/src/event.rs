use std::env;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// GitHub push event payload, parsed leniently: workflow-delivered events
/// occasionally miss fields, so everything defaults rather than failing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PushEvent {
    #[serde(rename = "ref")]
    pub git_ref: String,
    pub repository: Repository,
    pub commits: Vec<Commit>,
    pub pusher: Pusher,
    pub sender: Sender,
    pub compare: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Repository {
    pub name: String,
    pub full_name: String,
    pub html_url: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Commit {
    pub id: String,
    pub message: String,
    pub url: String,
    pub author: CommitAuthor,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CommitAuthor {
    pub name: String,
    pub username: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Pusher {
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Sender {
    pub login: String,
    pub html_url: String,
    pub avatar_url: String,
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(&'static str),
    #[error("Event file not readable: {0}")]
    EventUnreadable(String),
    #[error("Event payload not parsable: {0}")]
    EventInvalid(String),
    #[error("Webhook send failed: {0}")]
    Send(String),
}

/// Runtime configuration for one notification run, from environment
/// variables set by the CI workflow.
#[derive(Debug, Clone)]
pub struct NotifyConfig {
    /// Discord webhook URL to post to.
    pub webhook_url: String,
    /// Repository slug override (owner/name).
    pub repo_slug: Option<String>,
    /// Ref override; takes precedence over the payload's ref.
    pub ref_override: Option<String>,
    /// Compare-URL override; takes precedence over the payload's compare URL.
    pub compare_override: Option<String>,
    /// Path to the JSON event payload.
    pub event_path: PathBuf,
}

impl NotifyConfig {
    pub fn from_env() -> Result<Self, NotifyError> {
        let webhook_url = non_empty_var("DISCORD_WEBHOOK_URL")
            .ok_or(NotifyError::MissingEnvVar("DISCORD_WEBHOOK_URL"))?;
        let event_path = non_empty_var("GITHUB_EVENT_PATH")
            .ok_or(NotifyError::MissingEnvVar("GITHUB_EVENT_PATH"))?;

        Ok(NotifyConfig {
            webhook_url,
            repo_slug: non_empty_var("REPO"),
            ref_override: env::var("REF").ok(),
            compare_override: non_empty_var("COMPARE"),
            event_path: PathBuf::from(event_path),
        })
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.is_empty())
}

/// Read and parse the event payload file.
pub fn read_event(path: &Path) -> Result<PushEvent, NotifyError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| NotifyError::EventUnreadable(format!("{}: {}", path.display(), e)))?;
    serde_json::from_str(&raw).map_err(|e| NotifyError::EventInvalid(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_object_parses_with_defaults() {
        let event: PushEvent = serde_json::from_str("{}").unwrap();
        assert_eq!(event.git_ref, "");
        assert!(event.commits.is_empty());
        assert_eq!(event.repository.full_name, "");
        assert_eq!(event.compare, "");
    }

    #[test]
    fn test_full_payload_parses() {
        let raw = r#"{
            "ref": "refs/heads/main",
            "repository": {
                "name": "backend",
                "full_name": "acme/backend",
                "html_url": "https://github.com/acme/backend"
            },
            "commits": [{
                "id": "0123456789abcdef",
                "message": "Fix login\n\nDetails",
                "url": "https://github.com/acme/backend/commit/0123456",
                "author": { "name": "Ada", "username": "ada" }
            }],
            "pusher": { "name": "ada" },
            "sender": {
                "login": "ada",
                "html_url": "https://github.com/ada",
                "avatar_url": "https://avatars.example.com/ada"
            },
            "compare": "https://github.com/acme/backend/compare/a...b"
        }"#;

        let event: PushEvent = serde_json::from_str(raw).unwrap();
        assert_eq!(event.git_ref, "refs/heads/main");
        assert_eq!(event.commits.len(), 1);
        assert_eq!(event.commits[0].author.username.as_deref(), Some("ada"));
        assert_eq!(event.pusher.name, "ada");
    }

    #[test]
    fn test_read_event_missing_file_is_unreadable() {
        let err = read_event(Path::new("/nonexistent/event.json")).unwrap_err();
        assert!(matches!(err, NotifyError::EventUnreadable(_)));
    }

    #[test]
    fn test_read_event_invalid_json_is_invalid() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        let err = read_event(file.path()).unwrap_err();
        assert!(matches!(err, NotifyError::EventInvalid(_)));
    }

    #[test]
    fn test_read_event_round_trip() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"ref": "refs/heads/dev"}}"#).unwrap();
        let event = read_event(file.path()).unwrap();
        assert_eq!(event.git_ref, "refs/heads/dev");
    }
}
