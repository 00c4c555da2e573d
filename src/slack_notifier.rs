use anyhow::{Context, Result};
use log::{error, info};
use slack_morphism::prelude::*;

use crate::config::SlackConfig;
use crate::error::DigestError;

/// Reports run failures to an operator channel. The digest itself is never
/// posted here.
pub struct SlackNotifier {
    client: SlackClient<SlackClientHyperHttpsConnector>,
    token: SlackApiToken,
    channel_id: SlackChannelId,
}

impl SlackNotifier {
    pub fn new(config: &SlackConfig) -> Result<Self> {
        info!("Initializing Slack notifier");

        let client = SlackClient::new(SlackClientHyperHttpsConnector::new()?);
        let token = SlackApiToken::new(config.bot_token.clone().into());
        let channel_id = SlackChannelId::new(config.channel_id.clone());

        Ok(SlackNotifier {
            client,
            token,
            channel_id,
        })
    }

    pub async fn send_message(&self, text: &str) -> Result<()> {
        let post_chat_req = SlackApiChatPostMessageRequest::new(
            self.channel_id.clone(),
            SlackMessageContent::new().with_text(text.to_string()),
        );

        let session = self.client.open_session(&self.token);

        session
            .chat_post_message(&post_chat_req)
            .await
            .context("Unable to send Slack message")?;

        Ok(())
    }

    /// Report a failed digest run. Errors are logged, not returned.
    pub async fn notify_run_failed(&self, err: &DigestError) {
        let text = format!(
            "❌ *Email digest run failed*\n\n\
             • Kind: `{}`\n\
             • Error: ```{}```",
            err.kind(),
            err
        );

        if let Err(e) = self.send_message(&text).await {
            error!("❌ Error sending Slack failure report: {}", e);
        }
    }

    /// Report a mark-as-read failure that was downgraded to a warning
    pub async fn notify_mark_read_failed(&self, message_count: usize, err: &DigestError) {
        let text = format!(
            "⚠️ *Digest built, but marking {} email(s) as read failed*\n\n\
             • Error: ```{}```",
            message_count, err
        );

        if let Err(e) = self.send_message(&text).await {
            error!("❌ Error sending Slack warning: {}", e);
        }
    }
}
