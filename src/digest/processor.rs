use std::sync::Arc;

use chrono::NaiveDate;
use log::{error, info, warn};

use crate::config::{Config, DigestConfig, MarkReadFailure};
use crate::error::{DigestError, DigestResult};
use crate::gmail_client::{fetch_summaries, GmailClient, MailboxApi};
use crate::html_renderer::render_html;
use crate::openai_client::{OpenAiClient, TextGenerator};
use crate::slack_notifier::SlackNotifier;
use crate::summarizer::Summarizer;
use crate::token_exchange::{AccessTokenSource, TokenExchanger};

use super::fixtures::demo_messages;
use super::models::{MessageSummary, RunResult};

/// Runs one digest: collect messages, summarize, render, then optionally
/// mark the messages as read.
///
/// Each run is a single pass with no state carried over to the next one.
pub struct DigestProcessor {
    config: DigestConfig,
    tokens: Option<Box<dyn AccessTokenSource>>,
    mailbox: Box<dyn MailboxApi>,
    generator: Box<dyn TextGenerator>,
    slack: Option<Arc<SlackNotifier>>,
}

impl DigestProcessor {
    pub fn new(
        config: DigestConfig,
        tokens: Option<Box<dyn AccessTokenSource>>,
        mailbox: Box<dyn MailboxApi>,
        generator: Box<dyn TextGenerator>,
    ) -> Self {
        DigestProcessor {
            config,
            tokens,
            mailbox,
            generator,
            slack: None,
        }
    }

    /// Wire the Gmail and OpenAI clients from the configuration.
    ///
    /// In live mode the Google credentials are checked here, before any
    /// network call is made.
    pub fn from_config(config: &Config, http: reqwest::Client) -> DigestResult<Self> {
        let tokens: Option<Box<dyn AccessTokenSource>> = if config.digest.demo {
            None
        } else {
            Some(Box::new(TokenExchanger::new(http.clone(), &config.google)?))
        };

        Ok(Self::new(
            config.digest.clone(),
            tokens,
            Box::new(GmailClient::new(http.clone(), &config.google)),
            Box::new(OpenAiClient::new(http, &config.openai)),
        ))
    }

    pub fn with_slack(mut self, slack: Option<Arc<SlackNotifier>>) -> Self {
        self.slack = slack;
        self
    }

    /// Run once and report a failure to Slack when configured
    pub async fn run_and_report(&self, today: NaiveDate) -> DigestResult<RunResult> {
        let result = self.run(today).await;

        if let Err(e) = &result {
            error!("❌ Digest run failed: {}", e);
            if let Some(slack) = &self.slack {
                slack.notify_run_failed(e).await;
            }
        }

        result
    }

    pub async fn run(&self, today: NaiveDate) -> DigestResult<RunResult> {
        let demo = self.config.demo;

        if demo {
            info!("🧪 Demo mode: summarizing fixture messages");
        } else {
            info!("🚀 Starting digest run on the live mailbox");
        }

        // 1. Collect messages
        let (messages, ids) = if demo {
            (demo_messages(), Vec::new())
        } else {
            self.collect_live_messages().await?
        };

        // 2. Summarize and render
        let digest = Summarizer::new(self.generator.as_ref())
            .summarize(&messages, today)
            .await?;

        let html_preview = render_html(&digest.subject, &digest.bullets)?;

        // 3. Mark as read, after the digest is built
        let mut warnings = Vec::new();

        if !demo && self.config.mark_as_read && !ids.is_empty() {
            if let Err(e) = self.mark_read(&ids).await {
                match self.config.mark_read_failure {
                    MarkReadFailure::Abort => return Err(e),
                    MarkReadFailure::Warn => {
                        warn!("⚠️  Keeping digest despite mark-as-read failure: {}", e);
                        if let Some(slack) = &self.slack {
                            slack.notify_mark_read_failed(ids.len(), &e).await;
                        }
                        warnings.push(e.to_string());
                    }
                }
            }
        }

        // 4. Delivery
        if self.config.skip_delivery {
            info!("Delivery skipped");
        } else {
            info!("ℹ️  No delivery channel configured, digest returned in the response only");
        }

        info!(
            "✅ Digest run completed: {} message(s), {} bullet(s){}",
            messages.len(),
            digest.bullets.len(),
            if digest.degraded { " (degraded)" } else { "" }
        );

        Ok(RunResult {
            ok: true,
            demo,
            skipped_delivery: self.config.skip_delivery,
            unread_count: messages.len(),
            digest,
            html_preview,
            warnings,
        })
    }

    fn token_source(&self) -> DigestResult<&dyn AccessTokenSource> {
        self.tokens
            .as_deref()
            .ok_or_else(|| DigestError::Config("no Gmail credentials configured".to_string()))
    }

    async fn collect_live_messages(&self) -> DigestResult<(Vec<MessageSummary>, Vec<String>)> {
        let tokens = self.token_source()?;
        let token = tokens.access_token().await?;

        let ids = self
            .mailbox
            .list_recent_unread_ids(&token, self.config.max_results)
            .await?;

        if ids.is_empty() {
            return Ok((Vec::new(), ids));
        }

        let messages = fetch_summaries(
            self.mailbox.as_ref(),
            &token,
            &ids,
            self.config.fetch_concurrency,
        )
        .await?;

        Ok((messages, ids))
    }

    async fn mark_read(&self, ids: &[String]) -> DigestResult<()> {
        // Tokens are re-minted, never reused from the collect step
        let token = self.token_source()?.access_token().await?;
        self.mailbox.mark_as_read(&token, ids).await
    }
}
