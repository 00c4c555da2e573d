use anyhow::Result;

use crate::error::{DigestError, DigestResult};

pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4.1-mini";
pub const DEFAULT_MAX_RESULTS: u32 = 20;
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
pub const GMAIL_API_BASE: &str = "https://gmail.googleapis.com/gmail/v1";
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Clone)]
pub struct Config {
    pub google: GoogleConfig,
    pub openai: OpenAiConfig,
    pub digest: DigestConfig,
    pub server: ServerConfig,
    pub scheduler: SchedulerConfig,
    pub slack: Option<SlackConfig>,
}

#[derive(Debug, Clone)]
pub struct GoogleConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub refresh_token: Option<String>,
    pub token_url: String,
    pub gmail_api_base: String,
}

/// The three values required to mint an access token.
#[derive(Debug, Clone)]
pub struct GoogleCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
}

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
}

/// What to do when mark-as-read fails after the digest is already built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MarkReadFailure {
    /// Fail the whole run.
    #[default]
    Abort,
    /// Keep the digest and report the failure as a warning.
    Warn,
}

#[derive(Debug, Clone)]
pub struct DigestConfig {
    pub demo: bool,
    pub skip_delivery: bool,
    pub mark_as_read: bool,
    pub mark_read_failure: MarkReadFailure,
    pub max_results: u32,
    pub fetch_concurrency: usize,
}

impl Default for DigestConfig {
    fn default() -> Self {
        DigestConfig {
            demo: false,
            skip_delivery: false,
            mark_as_read: false,
            mark_read_failure: MarkReadFailure::Abort,
            max_results: DEFAULT_MAX_RESULTS,
            fetch_concurrency: 1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
}

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub enabled: bool,
    pub schedule_times: Vec<String>, // Format: "HH:MM" (e.g., ["07:00", "18:30"])
}

#[derive(Debug, Clone)]
pub struct SlackConfig {
    pub bot_token: String,
    pub channel_id: String,
}

impl Config {
    /// Build the configuration from the process environment.
    pub fn new() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let flag = |name: &str| parse_flag(var(name).as_deref());

        let mark_read_failure = match var("MARK_READ_FAILURE").map(|v| v.to_lowercase()).as_deref() {
            None | Some("abort") => MarkReadFailure::Abort,
            Some("warn") => MarkReadFailure::Warn,
            Some(other) => anyhow::bail!(
                "MARK_READ_FAILURE must be 'abort' or 'warn', got '{}'",
                other
            ),
        };

        let max_results = match var("GMAIL_MAX_RESULTS") {
            Some(v) => v
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| anyhow::anyhow!("GMAIL_MAX_RESULTS must be a positive integer, got '{}'", v))?,
            None => DEFAULT_MAX_RESULTS,
        };

        let fetch_concurrency = match var("FETCH_CONCURRENCY") {
            Some(v) => v
                .parse::<usize>()
                .map_err(|_| anyhow::anyhow!("FETCH_CONCURRENCY must be a positive integer, got '{}'", v))?
                .max(1),
            None => 1,
        };

        Ok(Config {
            google: GoogleConfig {
                client_id: var("GOOGLE_CLIENT_ID"),
                client_secret: var("GOOGLE_CLIENT_SECRET"),
                refresh_token: var("GOOGLE_REFRESH_TOKEN"),
                token_url: var("GOOGLE_TOKEN_URL")
                    .unwrap_or_else(|| GOOGLE_TOKEN_URL.to_string()),
                gmail_api_base: var("GMAIL_API_BASE")
                    .unwrap_or_else(|| GMAIL_API_BASE.to_string()),
            },
            openai: OpenAiConfig {
                api_key: var("OPENAI_API_KEY"),
                model: var("OPENAI_MODEL")
                    .unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
                base_url: var("OPENAI_BASE_URL")
                    .unwrap_or_else(|| OPENAI_BASE_URL.to_string()),
            },
            digest: DigestConfig {
                demo: flag("DEMO_MODE"),
                skip_delivery: flag("SKIP_DELIVERY"),
                mark_as_read: flag("MARK_AS_READ"),
                mark_read_failure,
                max_results,
                fetch_concurrency,
            },
            server: ServerConfig {
                bind_addr: var("BIND_ADDR")
                    .unwrap_or_else(|| "0.0.0.0:8080".to_string()),
            },
            scheduler: SchedulerConfig {
                enabled: flag("SCHEDULER_ENABLED"),
                schedule_times: var("SCHEDULER_TIMES")
                    .unwrap_or_else(|| "07:00".to_string())
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            },
            slack: match (var("SLACK_BOT_TOKEN"), var("SLACK_CHANNEL_ID")) {
                (Some(bot_token), Some(channel_id)) => Some(SlackConfig {
                    bot_token,
                    channel_id,
                }),
                _ => None,
            },
        })
    }

    /// Report the variables the configured mode needs but does not have.
    pub fn missing_vars(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();

        if !self.digest.demo {
            missing.extend(self.google.missing_vars());
        }
        if self.openai.api_key.is_none() {
            missing.push("OPENAI_API_KEY");
        }

        missing
    }

    /// Fail when a variable required by the configured mode is absent.
    pub fn check(&self) -> Result<()> {
        let missing = self.missing_vars();

        if !missing.is_empty() {
            anyhow::bail!(
                "Missing environment variables: {}\n\
                 \n\
                 Hints:\n\
                 1. Create a .env file with your credentials:\n\
                    GOOGLE_CLIENT_ID=...\n\
                    GOOGLE_CLIENT_SECRET=...\n\
                    GOOGLE_REFRESH_TOKEN=...\n\
                    OPENAI_API_KEY=...\n\
                 \n\
                 2. Or try the pipeline on fixtures first:\n\
                    DEMO_MODE=true OPENAI_API_KEY=... cargo run -- --once",
                missing.join(", ")
            );
        }

        Ok(())
    }
}

impl GoogleConfig {
    fn missing_vars(&self) -> Vec<&'static str> {
        [
            ("GOOGLE_CLIENT_ID", &self.client_id),
            ("GOOGLE_CLIENT_SECRET", &self.client_secret),
            ("GOOGLE_REFRESH_TOKEN", &self.refresh_token),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_none())
        .map(|(name, _)| name)
        .collect()
    }

    /// Resolve the refresh credentials, failing fast when any is absent.
    pub fn credentials(&self) -> DigestResult<GoogleCredentials> {
        match (&self.client_id, &self.client_secret, &self.refresh_token) {
            (Some(client_id), Some(client_secret), Some(refresh_token)) => Ok(GoogleCredentials {
                client_id: client_id.clone(),
                client_secret: client_secret.clone(),
                refresh_token: refresh_token.clone(),
            }),
            _ => Err(DigestError::Config(format!(
                "missing {}",
                self.missing_vars().join(", ")
            ))),
        }
    }
}

/// Boolean flags are true only for a case-insensitive "true".
fn parse_flag(value: Option<&str>) -> bool {
    value.map(|v| v.trim().eq_ignore_ascii_case("true")).unwrap_or(false)
}
