use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use futures::stream::{self, StreamExt, TryStreamExt};
use google_gmail1::api::{BatchModifyMessagesRequest, ListMessagesResponse, MessagePartHeader};
use log::{debug, info};
use serde::Deserialize;

use crate::config::GoogleConfig;
use crate::digest::MessageSummary;
use crate::error::{describe_transport, DigestError, DigestResult};

/// Unread, inbox-only messages received in the last 24 hours
pub const UNREAD_WINDOW_QUERY: &str = "newer_than:1d is:unread in:inbox";

const GMAIL_TIMEOUT: Duration = Duration::from_secs(20);

/// The parts of a `format=full` message the digest reads. Body parts are
/// left undecoded.
#[derive(Debug, Default, Deserialize)]
struct MessageMetadata {
    snippet: Option<String>,
    payload: Option<MessageHeaders>,
}

#[derive(Debug, Default, Deserialize)]
struct MessageHeaders {
    headers: Option<Vec<MessagePartHeader>>,
}

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = DigestResult<T>> + Send + 'a>>;

/// Mailbox operations needed by the digest
pub trait MailboxApi: Send + Sync {
    /// List unread message IDs in the unread window, in provider order
    fn list_recent_unread_ids<'a>(&'a self, token: &'a str, max_results: u32)
        -> BoxFuture<'a, Vec<String>>;

    /// Fetch sender, subject and snippet for one message
    fn get_message_summary<'a>(&'a self, token: &'a str, id: &'a str)
        -> BoxFuture<'a, MessageSummary>;

    /// Remove the UNREAD label from all given messages in one request
    fn mark_as_read<'a>(&'a self, token: &'a str, ids: &'a [String])
        -> BoxFuture<'a, ()>;
}

/// Gmail REST client authenticated with a bearer token per call
pub struct GmailClient {
    http: reqwest::Client,
    base_url: String,
}

impl GmailClient {
    pub fn new(http: reqwest::Client, config: &GoogleConfig) -> Self {
        GmailClient {
            http,
            base_url: format!("{}/users/me", config.gmail_api_base.trim_end_matches('/')),
        }
    }

    fn messages_url(&self) -> String {
        format!("{}/messages", self.base_url)
    }

    pub async fn list_recent_unread_ids(&self, token: &str, max_results: u32) -> DigestResult<Vec<String>> {
        info!("Searching for unread inbox emails from the last 24 hours");
        debug!("Search criteria: {} (max {})", UNREAD_WINDOW_QUERY, max_results);

        let response = self
            .http
            .get(self.messages_url())
            .bearer_auth(token)
            .timeout(GMAIL_TIMEOUT)
            .query(&[
                ("q", UNREAD_WINDOW_QUERY.to_string()),
                ("maxResults", max_results.to_string()),
            ])
            .send()
            .await
            .map_err(|e| DigestError::List(describe_transport(&e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            debug!("Gmail list error body: {}", body);
            return Err(DigestError::List(format!("Gmail returned {}", status.as_u16())));
        }

        let list = response
            .json::<ListMessagesResponse>()
            .await
            .map_err(|e| DigestError::List(describe_transport(&e)))?;

        let message_ids: Vec<String> = list
            .messages
            .unwrap_or_default()
            .into_iter()
            .filter_map(|msg| msg.id)
            .collect();

        info!("Found {} unread email(s)", message_ids.len());

        Ok(message_ids)
    }

    pub async fn get_message_summary(&self, token: &str, id: &str) -> DigestResult<MessageSummary> {
        debug!("Retrieving email metadata for ID: {}", id);

        let fetch_error = |reason: String| DigestError::Fetch {
            id: id.to_string(),
            reason,
        };

        let response = self
            .http
            .get(format!("{}/{}", self.messages_url(), id))
            .bearer_auth(token)
            .timeout(GMAIL_TIMEOUT)
            .query(&[("format", "full")])
            .send()
            .await
            .map_err(|e| fetch_error(describe_transport(&e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(fetch_error(format!("Gmail returned {}", status.as_u16())));
        }

        let message = response
            .json::<MessageMetadata>()
            .await
            .map_err(|e| fetch_error(describe_transport(&e)))?;

        Ok(summarize_message(id, message))
    }

    /// Fetch metadata for every ID with at most `concurrency` requests in
    /// flight. Output order always matches `ids`.
    pub async fn fetch_summaries(
        &self,
        token: &str,
        ids: &[String],
        concurrency: usize,
    ) -> DigestResult<Vec<MessageSummary>> {
        fetch_summaries(self, token, ids, concurrency).await
    }

    pub async fn mark_as_read(&self, token: &str, ids: &[String]) -> DigestResult<()> {
        if ids.is_empty() {
            debug!("No messages to mark as read");
            return Ok(());
        }

        info!("Marking {} email(s) as read", ids.len());

        let request = BatchModifyMessagesRequest {
            ids: Some(ids.to_vec()),
            remove_label_ids: Some(vec!["UNREAD".to_string()]),
            ..Default::default()
        };

        let response = self
            .http
            .post(format!("{}/batchModify", self.messages_url()))
            .bearer_auth(token)
            .timeout(GMAIL_TIMEOUT)
            .json(&request)
            .send()
            .await
            .map_err(|e| DigestError::MarkRead(describe_transport(&e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DigestError::MarkRead(format!("Gmail returned {}", status.as_u16())));
        }

        info!("✅ {} email(s) marked as read", ids.len());
        Ok(())
    }
}

impl MailboxApi for GmailClient {
    fn list_recent_unread_ids<'a>(&'a self, token: &'a str, max_results: u32)
        -> BoxFuture<'a, Vec<String>> {
        Box::pin(GmailClient::list_recent_unread_ids(self, token, max_results))
    }

    fn get_message_summary<'a>(&'a self, token: &'a str, id: &'a str)
        -> BoxFuture<'a, MessageSummary> {
        Box::pin(GmailClient::get_message_summary(self, token, id))
    }

    fn mark_as_read<'a>(&'a self, token: &'a str, ids: &'a [String])
        -> BoxFuture<'a, ()> {
        Box::pin(GmailClient::mark_as_read(self, token, ids))
    }
}

/// Fetch message metadata through any mailbox with bounded concurrency.
///
/// `buffered` yields results in input order, so the summaries line up with
/// `ids` whatever order the requests complete in. The first failure aborts.
pub async fn fetch_summaries<M: MailboxApi + ?Sized>(
    mailbox: &M,
    token: &str,
    ids: &[String],
    concurrency: usize,
) -> DigestResult<Vec<MessageSummary>> {
    stream::iter(ids.iter().cloned())
        .map(|id| async move { mailbox.get_message_summary(token, &id).await })
        .buffered(concurrency.max(1))
        .try_collect()
        .await
}

/// Extract the digest fields from a Gmail message
fn summarize_message(id: &str, message: MessageMetadata) -> MessageSummary {
    let mut sender = String::new();
    let mut subject = None;

    let headers = message
        .payload
        .and_then(|payload| payload.headers)
        .unwrap_or_default();

    for header in headers {
        if let (Some(name), Some(value)) = (header.name, header.value) {
            if name.eq_ignore_ascii_case("From") {
                sender = value;
            } else if name.eq_ignore_ascii_case("Subject") {
                subject = Some(value);
            }
        }
    }

    MessageSummary {
        id: Some(id.to_string()),
        sender,
        subject: subject.unwrap_or_else(|| "(no subject)".to_string()),
        snippet: message.snippet.unwrap_or_default(),
    }
}
