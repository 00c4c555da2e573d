use thiserror::Error;

/// Failures that abort a digest run.
///
/// A malformed model reply is not an error: the summarizer degrades to an
/// empty bullet list and flags the digest instead.
#[derive(Debug, Error)]
pub enum DigestError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("credential exchange rejected: {0}")]
    Auth(String),

    #[error("unable to list unread messages: {0}")]
    List(String),

    #[error("unable to fetch message {id}: {reason}")]
    Fetch { id: String, reason: String },

    #[error("text generation failed: {0}")]
    Generation(String),

    #[error("unable to mark messages as read: {0}")]
    MarkRead(String),

    #[error("unable to render digest: {0}")]
    Render(#[from] minijinja::Error),
}

impl DigestError {
    /// Stable identifier used in the JSON error envelope.
    pub fn kind(&self) -> &'static str {
        match self {
            DigestError::Config(_) => "config",
            DigestError::Auth(_) => "auth",
            DigestError::List(_) => "list",
            DigestError::Fetch { .. } => "fetch",
            DigestError::Generation(_) => "generation",
            DigestError::MarkRead(_) => "mark_read",
            DigestError::Render(_) => "render",
        }
    }

    /// True when the failure came from an upstream service rather than from
    /// this process.
    pub fn is_upstream(&self) -> bool {
        !matches!(self, DigestError::Config(_) | DigestError::Render(_))
    }
}

pub type DigestResult<T> = Result<T, DigestError>;

/// Describe a transport-level reqwest failure without leaking URLs or bodies.
pub(crate) fn describe_transport(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        "request timed out".to_string()
    } else if error.is_connect() {
        "connection failed".to_string()
    } else if error.is_decode() {
        "unexpected response body".to_string()
    } else {
        "request failed".to_string()
    }
}
