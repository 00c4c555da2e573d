/// Common structures shared by the digest pipeline
use serde::{Deserialize, Serialize};

pub const SUBJECT_PREFIX: &str = "Email Digest — ";
pub const NO_NEW_MAIL_SUBJECT: &str = "Email Digest — No new mail";

/// Metadata of one unread message, as fed to the summarizer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageSummary {
    /// Absent for fixture messages
    pub id: Option<String>,
    pub sender: String,
    pub subject: String,
    pub snippet: String,
}

impl MessageSummary {
    pub fn fixture(sender: &str, subject: &str, snippet: &str) -> Self {
        Self {
            id: None,
            sender: sender.to_string(),
            subject: subject.to_string(),
            snippet: snippet.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bullet {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub detail: String,
}

impl Bullet {
    pub fn new(title: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            detail: detail.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Digest {
    pub subject: String,
    pub bullets: Vec<Bullet>,
    /// The model answered but its content could not be read as bullets
    pub degraded: bool,
}

impl Digest {
    pub fn no_new_mail() -> Self {
        Self {
            subject: NO_NEW_MAIL_SUBJECT.to_string(),
            bullets: Vec::new(),
            degraded: false,
        }
    }
}

/// Outcome of one digest run, serialized as the `/api/cron` payload
#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    pub ok: bool,
    pub demo: bool,
    pub skipped_delivery: bool,
    #[serde(rename = "gmail_unread_count")]
    pub unread_count: usize,
    #[serde(flatten)]
    pub digest: Digest,
    pub html_preview: String,
    pub warnings: Vec<String>,
}
