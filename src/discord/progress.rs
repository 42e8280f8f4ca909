use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serenity::all::{ChannelId, EditMessage, Http, MessageId};
use tracing::debug;

use super::embed::progress_embed;
use crate::blade::{Progress, SliceState};

/// Mirrors slice progress onto a Discord message by editing its embed.
/// Only state changes trigger an edit, keeping well under rate limits.
pub struct EmbedProgress {
    http: Arc<Http>,
    channel_id: ChannelId,
    message_id: MessageId,
    url: String,
    last: Mutex<Option<SliceState>>,
}

impl EmbedProgress {
    pub fn new(http: Arc<Http>, channel_id: ChannelId, message_id: MessageId, url: &str) -> Self {
        Self {
            http,
            channel_id,
            message_id,
            url: url.to_string(),
            last: Mutex::new(None),
        }
    }

    /// Record `state` and report whether it differs from the previous one.
    fn advance(&self, state: SliceState) -> bool {
        let Ok(mut last) = self.last.lock() else {
            return false;
        };
        if *last == Some(state) {
            return false;
        }
        *last = Some(state);
        true
    }

    /// Overwrite the embed unconditionally.
    pub async fn show(&self, state: SliceState, message: &str) {
        let embed = progress_embed(state, message, Some(&self.url));
        if let Err(e) = self
            .channel_id
            .edit_message(&self.http, self.message_id, EditMessage::new().embed(embed))
            .await
        {
            // Message deleted or permissions pulled; keep slicing regardless.
            debug!(error = %e, "progress embed edit failed");
        }
    }
}

#[async_trait]
impl Progress for EmbedProgress {
    async fn update(&self, state: SliceState, message: &str) {
        if self.advance(state) {
            self.show(state, message).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn progress() -> EmbedProgress {
        EmbedProgress::new(
            Arc::new(Http::new("")),
            ChannelId::new(1),
            MessageId::new(2),
            "https://sora.chatgpt.com/p/1",
        )
    }

    #[test]
    fn advance_only_on_state_change() {
        let p = progress();
        assert!(p.advance(SliceState::Queued));
        assert!(!p.advance(SliceState::Queued));
        assert!(p.advance(SliceState::Slicing));
        assert!(!p.advance(SliceState::Slicing));
        assert!(p.advance(SliceState::Queued));
    }
}
