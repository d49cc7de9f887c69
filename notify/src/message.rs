use chrono::Utc;
use serde::Serialize;

use crate::event::{NotifyConfig, PushEvent};

/// Rendered when the payload lists no commits (force pushes, tag pushes).
const NO_COMMITS_PLACEHOLDER: &str = "Aucun commit listé";

/// At most this many commits are rendered in the message body.
const MAX_COMMIT_LINES: usize = 10;

/// Discord webhook document.
#[derive(Debug, Serialize)]
pub struct WebhookMessage {
    pub username: String,
    pub embeds: Vec<Embed>,
}

#[derive(Debug, Serialize)]
pub struct Embed {
    pub title: String,
    pub url: String,
    pub description: String,
    pub fields: Vec<EmbedField>,
    pub author: EmbedAuthor,
    pub timestamp: String,
    pub footer: EmbedFooter,
}

#[derive(Debug, Serialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

#[derive(Debug, Serialize)]
pub struct EmbedAuthor {
    pub name: String,
    pub url: String,
    pub icon_url: String,
}

#[derive(Debug, Serialize)]
pub struct EmbedFooter {
    pub text: String,
}

/// Format a push event as a Discord webhook message.
pub fn build_message(config: &NotifyConfig, event: &PushEvent) -> WebhookMessage {
    let git_ref = config.ref_override.as_deref().unwrap_or(&event.git_ref);
    let branch = branch_name(git_ref);

    let lines: Vec<String> = event
        .commits
        .iter()
        .take(MAX_COMMIT_LINES)
        .map(commit_line)
        .collect();
    let description = if lines.is_empty() {
        NO_COMMITS_PLACEHOLDER.to_string()
    } else {
        lines.join("\n")
    };

    let repo_url = repo_url(config, event);
    let repo_name = config
        .repo_slug
        .clone()
        .unwrap_or_else(|| event.repository.full_name.clone());
    let title = format!("{} • push sur {}", repo_name, branch);

    let url = config
        .compare_override
        .clone()
        .or_else(|| non_empty(&event.compare))
        .unwrap_or_else(|| repo_url.clone());

    let pusher = non_empty(&event.pusher.name)
        .or_else(|| non_empty(&event.sender.login))
        .unwrap_or_else(|| "unknown".to_string());

    WebhookMessage {
        username: "GitHub".to_string(),
        embeds: vec![Embed {
            title,
            url,
            description,
            fields: vec![
                EmbedField {
                    name: "Branche".to_string(),
                    value: branch.to_string(),
                    inline: true,
                },
                EmbedField {
                    name: "Commits".to_string(),
                    value: event.commits.len().to_string(),
                    inline: true,
                },
                EmbedField {
                    name: "Pusher".to_string(),
                    value: pusher,
                    inline: true,
                },
            ],
            author: EmbedAuthor {
                name: repo_name,
                url: repo_url,
                icon_url: event.sender.avatar_url.clone(),
            },
            timestamp: Utc::now().to_rfc3339(),
            footer: EmbedFooter {
                text: "GitHub → Discord".to_string(),
            },
        }],
    }
}

/// Last `/`-delimited segment of the ref, `unknown` when empty.
fn branch_name(git_ref: &str) -> &str {
    match git_ref.rsplit('/').next() {
        Some(segment) if !segment.is_empty() => segment,
        _ => "unknown",
    }
}

/// `[<7-char short id>] <first message line, trimmed> — <author>`
fn commit_line(commit: &crate::event::Commit) -> String {
    let short: String = commit.id.chars().take(7).collect();
    let first_line = commit.message.split('\n').next().unwrap_or("").trim();
    let author = commit
        .author
        .username
        .as_deref()
        .filter(|u| !u.is_empty())
        .unwrap_or_else(|| {
            if commit.author.name.is_empty() {
                "unknown"
            } else {
                &commit.author.name
            }
        });
    format!("[{}] {} — {}", short, first_line, author)
}

fn repo_url(config: &NotifyConfig, event: &PushEvent) -> String {
    if !event.repository.html_url.is_empty() {
        return event.repository.html_url.clone();
    }
    match &config.repo_slug {
        Some(slug) => format!("https://github.com/{}", slug),
        None => String::new(),
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
