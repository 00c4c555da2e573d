// Shared fakes for the digest pipeline tests
#![allow(dead_code)]

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use maildigest::config::Config;
use maildigest::digest::MessageSummary;
use maildigest::error::{DigestError, DigestResult};
use maildigest::gmail_client::MailboxApi;
use maildigest::openai_client::TextGenerator;
use maildigest::token_exchange::AccessTokenSource;

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = DigestResult<T>> + Send + 'a>>;

pub fn config_from(pairs: &[(&str, &str)]) -> Config {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    Config::from_lookup(|name| vars.get(name).cloned()).expect("valid test configuration")
}

/// Counts calls and hands out numbered tokens ("token-1", "token-2", ...)
#[derive(Clone, Default)]
pub struct FakeTokens {
    pub calls: Arc<AtomicUsize>,
}

impl FakeTokens {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl AccessTokenSource for FakeTokens {
    fn access_token<'a>(&'a self) -> BoxFuture<'a, String> {
        Box::pin(async move {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(format!("token-{}", n))
        })
    }
}

#[derive(Clone, Default)]
pub struct FakeMailbox {
    pub ids: Vec<String>,
    /// Per-ID delay, to shuffle completion order under concurrency
    pub delays_ms: HashMap<String, u64>,
    pub failing_id: Option<String>,
    pub fail_mark_read: bool,
    pub list_calls: Arc<AtomicUsize>,
    pub get_calls: Arc<AtomicUsize>,
    pub marked: Arc<Mutex<Vec<(String, Vec<String>)>>>,
}

impl FakeMailbox {
    pub fn with_ids(ids: &[&str]) -> Self {
        FakeMailbox {
            ids: ids.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn mark_calls(&self) -> Vec<(String, Vec<String>)> {
        self.marked.lock().unwrap().clone()
    }
}

impl MailboxApi for FakeMailbox {
    fn list_recent_unread_ids<'a>(&'a self, _token: &'a str, max_results: u32) -> BoxFuture<'a, Vec<String>> {
        Box::pin(async move {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.ids.iter().take(max_results as usize).cloned().collect())
        })
    }

    fn get_message_summary<'a>(&'a self, _token: &'a str, id: &'a str) -> BoxFuture<'a, MessageSummary> {
        Box::pin(async move {
            self.get_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(ms) = self.delays_ms.get(id) {
                tokio::time::sleep(Duration::from_millis(*ms)).await;
            }
            if self.failing_id.as_deref() == Some(id) {
                return Err(DigestError::Fetch {
                    id: id.to_string(),
                    reason: "Gmail returned 404".to_string(),
                });
            }
            Ok(MessageSummary {
                id: Some(id.to_string()),
                sender: format!("sender-{}", id),
                subject: format!("subject-{}", id),
                snippet: format!("snippet-{}", id),
            })
        })
    }

    fn mark_as_read<'a>(&'a self, token: &'a str, ids: &'a [String]) -> BoxFuture<'a, ()> {
        Box::pin(async move {
            self.marked
                .lock()
                .unwrap()
                .push((token.to_string(), ids.to_vec()));
            if self.fail_mark_read {
                return Err(DigestError::MarkRead("Gmail returned 500".to_string()));
            }
            Ok(())
        })
    }
}

/// Returns a canned reply and records every prompt it receives
#[derive(Clone)]
pub struct FakeGenerator {
    pub reply: Result<String, String>,
    pub prompts: Arc<Mutex<Vec<String>>>,
}

impl FakeGenerator {
    pub fn replying(content: &str) -> Self {
        FakeGenerator {
            reply: Ok(content.to_string()),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn failing(reason: &str) -> Self {
        FakeGenerator {
            reply: Err(reason.to_string()),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

impl TextGenerator for FakeGenerator {
    fn generate<'a>(&'a self, _system: &'a str, prompt: &'a str) -> BoxFuture<'a, String> {
        Box::pin(async move {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.reply.clone().map_err(DigestError::Generation)
        })
    }
}

pub const STANDUP_REPLY: &str =
    r#"{"bullets":[{"title":"Standup notes","detail":"Auth shipped, analytics next"}]}"#;
