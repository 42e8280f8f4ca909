//! Discord front end: watches for Sora links and relays clean videos back.
//!
//! Three triggers feed the same flow: mentioning the bot alongside Sora
//! links, prefix commands (see [`command`]), and the `/slice` slash command.

pub mod command;
pub mod embed;
pub mod progress;

use std::sync::Arc;

use anyhow::{Context as _, Result};
use async_trait::async_trait;
use serenity::all::{
    ChannelId, Command, CommandInteraction, CommandOptionType, Context, CreateAttachment,
    CreateCommand, CreateCommandOption, CreateEmbed, CreateInteractionResponse,
    CreateInteractionResponseMessage, CreateMessage, EventHandler, GatewayIntents, GuildId, Http,
    Interaction, Message, MessageId, ReactionType, Ready,
};
use serenity::Client;
use tracing::{info, warn};

use crate::blade::{Blade, SliceState, SlicedVideo};
use crate::consts::CLEAN_FILENAME;
use crate::detect::{find_video_urls, is_video_url};
use crate::error::SliceError;
use crate::history::{History, NewRecord, Source, Status};
use command::BotCommand;
use embed::{help_embed, progress_embed, status_embed, usage_embed};
use progress::EmbedProgress;

const SWORD: &str = "⚔️";
const DONE: &str = "✅";
const FAILED: &str = "❌";

const NOT_CONFIGURED: &str = "❌ SoraGiri is not configured (missing API key)";
const INVALID_URL: &str = "❌ Invalid URL. Must be from `sora.chatgpt.com`";

/// The bot's state, shared by every event handler invocation.
pub struct SoraBot {
    /// `None` when no API key is configured; the bot still answers `status`.
    blade: Option<Blade>,
    history: Option<History>,
    prefix: String,
    guild_id: Option<u64>,
}

impl SoraBot {
    pub fn new(
        blade: Option<Blade>,
        history: Option<History>,
        prefix: impl Into<String>,
        guild_id: Option<u64>,
    ) -> Self {
        Self {
            blade,
            history,
            prefix: prefix.into(),
            guild_id,
        }
    }

    /// Connect to the gateway and serve until Ctrl+C.
    pub async fn run(self, token: &str) -> Result<()> {
        let intents = GatewayIntents::GUILD_MESSAGES
            | GatewayIntents::DIRECT_MESSAGES
            | GatewayIntents::MESSAGE_CONTENT;

        let mut client = Client::builder(token, intents)
            .event_handler(self)
            .await
            .context("failed to create Discord client")?;

        let shard_manager = client.shard_manager.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("shutting down");
                shard_manager.shutdown_all().await;
            }
        });

        client.start().await.context("Discord client error")?;
        Ok(())
    }

    async fn register_commands(&self, ctx: &Context) {
        let commands = vec![
            CreateCommand::new("slice")
                .description("Remove watermark from a Sora video")
                .add_option(
                    CreateCommandOption::new(
                        CommandOptionType::String,
                        "url",
                        "The Sora video URL (sora.chatgpt.com/...)",
                    )
                    .required(true),
                ),
        ];

        let result = match self.guild_id {
            // Guild-scoped: instant propagation
            Some(id) => GuildId::new(id)
                .set_commands(&ctx.http, commands)
                .await
                .map(|_| ()),
            // Global: up to an hour to propagate
            None => Command::set_global_commands(&ctx.http, commands)
                .await
                .map(|_| ()),
        };
        match result {
            Ok(()) => info!(guild_id = ?self.guild_id, "registered slash commands"),
            Err(e) => warn!(error = %e, "failed to register slash commands"),
        }
    }

    async fn handle_command(&self, ctx: &Context, msg: &Message, command: BotCommand) {
        match command {
            BotCommand::Help => {
                let help = command::help_text(&self.prefix);
                reply_embed(ctx, msg, help_embed(&help)).await;
            }
            BotCommand::Status => {
                let completed = self
                    .history
                    .as_ref()
                    .and_then(|h| h.count(Status::Success).ok());
                reply_embed(ctx, msg, status_embed(self.blade.is_some(), completed)).await;
            }
            BotCommand::Slice(None) => {
                reply_embed(ctx, msg, usage_embed(&self.prefix)).await;
            }
            BotCommand::Slice(Some(url)) => {
                if self.blade.is_none() {
                    reply_text(ctx, msg, NOT_CONFIGURED).await;
                } else if !is_video_url(&url) {
                    reply_text(ctx, msg, INVALID_URL).await;
                } else {
                    self.slice_in_reply(ctx, msg, &url).await;
                }
            }
        }
    }

    /// Auto-detect Sora links when the bot is mentioned.
    async fn handle_mention(&self, ctx: &Context, msg: &Message) {
        let urls = find_video_urls(&msg.content);
        if urls.is_empty() {
            return;
        }
        if self.blade.is_none() {
            reply_text(ctx, msg, NOT_CONFIGURED).await;
            return;
        }
        info!(count = urls.len(), author = %msg.author.name, "sora links mentioned");
        for url in urls {
            self.slice_in_reply(ctx, msg, url).await;
        }
    }

    async fn slice_in_reply(&self, ctx: &Context, msg: &Message, url: &str) {
        let embed = progress_embed(SliceState::Initializing, "Preparing the blade...", Some(url));
        let builder = CreateMessage::new().embed(embed).reference_message(msg);
        match msg.channel_id.send_message(&ctx.http, builder).await {
            Ok(status) => {
                self.run_slice(&ctx.http, status.channel_id, status.id, url)
                    .await
            }
            Err(e) => warn!(error = %e, "failed to post progress message"),
        }
    }

    async fn handle_slash(&self, ctx: &Context, command: &CommandInteraction) {
        if command.data.name != "slice" {
            return;
        }
        let url = command
            .data
            .options
            .first()
            .and_then(|o| o.value.as_str())
            .unwrap_or("")
            .trim()
            .to_string();

        let rejection = if self.blade.is_none() {
            Some(NOT_CONFIGURED)
        } else if !is_video_url(&url) {
            Some(INVALID_URL)
        } else {
            None
        };
        if let Some(text) = rejection {
            let response = CreateInteractionResponse::Message(
                CreateInteractionResponseMessage::new()
                    .content(text)
                    .ephemeral(true),
            );
            if let Err(e) = command.create_response(&ctx.http, response).await {
                warn!(error = %e, "failed to answer slash command");
            }
            return;
        }

        let embed = progress_embed(SliceState::Initializing, "Preparing the blade...", Some(&url));
        let response = CreateInteractionResponse::Message(
            CreateInteractionResponseMessage::new().embed(embed),
        );
        if let Err(e) = command.create_response(&ctx.http, response).await {
            warn!(error = %e, "failed to answer slash command");
            return;
        }
        match command.get_response(&ctx.http).await {
            Ok(status) => {
                self.run_slice(&ctx.http, status.channel_id, status.id, &url)
                    .await
            }
            Err(e) => warn!(error = %e, "failed to fetch interaction response"),
        }
    }

    /// Drive one slice, mirroring progress onto the status message, then
    /// relay the clean video (or the failure) into the channel.
    async fn run_slice(
        &self,
        http: &Arc<Http>,
        channel_id: ChannelId,
        message_id: MessageId,
        url: &str,
    ) {
        let Some(blade) = &self.blade else {
            return;
        };

        react(http, channel_id, message_id, SWORD).await;

        let progress = EmbedProgress::new(Arc::clone(http), channel_id, message_id, url);
        let result = blade.slice_to_bytes(url, &progress).await;

        let outcome = match &result {
            Ok(video) => {
                self.deliver(http, channel_id, message_id, &progress, video)
                    .await
            }
            Err(e) => Err(e.to_string()),
        };

        match &outcome {
            Ok(()) => {
                unreact(http, channel_id, message_id, SWORD).await;
                react(http, channel_id, message_id, DONE).await;
            }
            Err(reason) => {
                progress
                    .show(
                        SliceState::Failed,
                        &format!("The blade could not complete the cut.\n`{reason}`"),
                    )
                    .await;
                unreact(http, channel_id, message_id, SWORD).await;
                react(http, channel_id, message_id, FAILED).await;
            }
        }

        self.record(url, &result, &outcome);
    }

    async fn deliver(
        &self,
        http: &Arc<Http>,
        channel_id: ChannelId,
        message_id: MessageId,
        progress: &EmbedProgress,
        video: &SlicedVideo,
    ) -> Result<(), String> {
        progress
            .show(SliceState::Complete, "Watermark has been severed.")
            .await;

        let attachment = CreateAttachment::bytes(video.bytes.clone(), CLEAN_FILENAME);
        let reply = CreateMessage::new()
            .content("Here's your clean cut:")
            .add_file(attachment)
            .reference_message((channel_id, message_id));

        channel_id
            .send_message(http, reply)
            .await
            .map(|_| ())
            .map_err(|e| {
                warn!(error = %e, bytes = video.bytes.len(), "upload failed");
                // Too large for the guild's upload limit; the link still works.
                format!("upload failed: {e}\n{}", video.output.output_url)
            })
    }

    fn record(
        &self,
        url: &str,
        result: &Result<SlicedVideo, SliceError>,
        outcome: &Result<(), String>,
    ) {
        let Some(history) = &self.history else {
            return;
        };
        let output = result.as_ref().ok().map(|v| &v.output);
        let (status, detail) = match outcome {
            Ok(()) => (
                Status::Success,
                output.map(|o| o.output_url.as_str()).unwrap_or_default(),
            ),
            Err(reason) => (Status::Failed, reason.as_str()),
        };
        let record = NewRecord {
            source: Source::Discord,
            url,
            task_id: output.map(|o| o.task_id.as_str()),
            status,
            detail,
            cost_time_ms: output.and_then(|o| o.cost_time_ms),
        };
        if let Err(e) = history.record(&record) {
            warn!(error = %e, "failed to record slice history");
        }
    }
}

#[async_trait]
impl EventHandler for SoraBot {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!(
            username = %ready.user.name,
            api = if self.blade.is_some() { "configured" } else { "NOT CONFIGURED" },
            "Discord bot connected, watching for Sora links"
        );
        self.register_commands(&ctx).await;
    }

    async fn message(&self, ctx: Context, msg: Message) {
        if msg.author.bot {
            return;
        }

        if let Some(command) = command::parse(&msg.content, &self.prefix) {
            self.handle_command(&ctx, &msg, command).await;
            return;
        }

        match msg.mentions_me(&ctx).await {
            Ok(true) => self.handle_mention(&ctx, &msg).await,
            Ok(false) => {}
            Err(e) => warn!(error = %e, "failed to check mentions"),
        }
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        if let Interaction::Command(command) = interaction {
            self.handle_slash(&ctx, &command).await;
        }
    }
}

async fn reply_text(ctx: &Context, msg: &Message, text: &str) {
    if let Err(e) = msg.reply(&ctx.http, text).await {
        warn!(error = %e, "failed to reply");
    }
}

async fn reply_embed(ctx: &Context, msg: &Message, embed: CreateEmbed) {
    let builder = CreateMessage::new().embed(embed).reference_message(msg);
    if let Err(e) = msg.channel_id.send_message(&ctx.http, builder).await {
        warn!(error = %e, "failed to reply");
    }
}

// Reactions are decoration; missing permissions shouldn't stop a slice.

async fn react(http: &Http, channel_id: ChannelId, message_id: MessageId, emoji: &str) {
    let reaction = ReactionType::Unicode(emoji.to_string());
    if let Err(e) = http.create_reaction(channel_id, message_id, &reaction).await {
        warn!(error = %e, emoji, "failed to add reaction");
    }
}

async fn unreact(http: &Http, channel_id: ChannelId, message_id: MessageId, emoji: &str) {
    let reaction = ReactionType::Unicode(emoji.to_string());
    if let Err(e) = http.delete_reaction_me(channel_id, message_id, &reaction).await {
        warn!(error = %e, emoji, "failed to remove reaction");
    }
}
