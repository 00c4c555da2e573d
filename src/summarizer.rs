use chrono::NaiveDate;
use indoc::formatdoc;
use log::{info, warn};
use serde_json::Value;

use crate::digest::{Bullet, Digest, MessageSummary, SUBJECT_PREFIX};
use crate::error::DigestResult;
use crate::openai_client::TextGenerator;

pub const SYSTEM_PROMPT: &str = "You summarize emails clearly and professionally.";

/// Turns message metadata into a bullet-point digest through a text generator
pub struct Summarizer<'g, G: TextGenerator + ?Sized> {
    generator: &'g G,
}

/// Result of reading the model's reply
#[derive(Debug, PartialEq)]
pub enum BulletParse {
    Parsed(Vec<Bullet>),
    /// The reply was not a JSON object holding a `bullets` array of objects
    Malformed(String),
}

impl<'g, G: TextGenerator + ?Sized> Summarizer<'g, G> {
    pub fn new(generator: &'g G) -> Self {
        Summarizer { generator }
    }

    pub async fn summarize(&self, messages: &[MessageSummary], today: NaiveDate) -> DigestResult<Digest> {
        if messages.is_empty() {
            info!("No messages to summarize");
            return Ok(Digest::no_new_mail());
        }

        let prompt = build_prompt(messages);
        let content = self.generator.generate(SYSTEM_PROMPT, &prompt).await?;

        let (bullets, degraded) = match parse_bullets(&content) {
            BulletParse::Parsed(bullets) => (bullets, false),
            BulletParse::Malformed(reason) => {
                warn!("⚠️  Unreadable digest from the model ({}), continuing with no bullets", reason);
                (Vec::new(), true)
            }
        };

        info!("Digest ready: {} bullet(s) for {} message(s)", bullets.len(), messages.len());

        Ok(Digest {
            subject: digest_subject(today),
            bullets,
            degraded,
        })
    }
}

pub fn digest_subject(today: NaiveDate) -> String {
    format!("{}{}", SUBJECT_PREFIX, today.format("%Y-%m-%d"))
}

/// Numbered "From / Subject / Snippet" blocks, in input order
pub fn format_messages(messages: &[MessageSummary]) -> String {
    messages
        .iter()
        .enumerate()
        .map(|(i, m)| {
            format!(
                "{}. From: {}\nSubject: {}\nSnippet: {}",
                i + 1,
                m.sender,
                m.subject,
                m.snippet
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn build_prompt(messages: &[MessageSummary]) -> String {
    formatdoc! {r#"
        You are an assistant that writes clear, helpful daily email digests.

        Summarize the following emails in 6–10 bullets.
        Each bullet should be:
        - one sentence
        - mention sender or subject
        - state the main point or request
        - optionally include what action the user should take

        Return valid JSON with this structure:
        {{
          "bullets": [
            {{"title": "", "detail": ""}}
          ]
        }}

        Emails:
        {items}
        "#,
        items = format_messages(messages)
    }
}

pub fn parse_bullets(content: &str) -> BulletParse {
    let value: Value = match serde_json::from_str(content) {
        Ok(value) => value,
        Err(e) => return BulletParse::Malformed(format!("invalid JSON: {}", e)),
    };

    let Some(items) = value.get("bullets").and_then(Value::as_array) else {
        return BulletParse::Malformed("no bullets array".to_string());
    };

    let mut bullets = Vec::with_capacity(items.len());
    for item in items {
        if !item.is_object() {
            return BulletParse::Malformed("bullet is not an object".to_string());
        }
        match serde_json::from_value::<Bullet>(item.clone()) {
            Ok(bullet) => bullets.push(bullet),
            Err(e) => return BulletParse::Malformed(format!("invalid bullet: {}", e)),
        }
    }

    BulletParse::Parsed(bullets)
}
