//! Progress embeds shown while a slice runs.

use serenity::all::{CreateEmbed, CreateEmbedFooter};

use crate::blade::SliceState;
use crate::detect::truncate_chars;

const EMBED_TITLE: &str = "⚔️ SoraGiri 空斬り";

/// Icon, heading and colour for a state.
pub fn style(state: SliceState) -> (&'static str, &'static str, u32) {
    match state {
        SliceState::Initializing => ("⚡", "Unsheathing...", 0x00FFFF),
        SliceState::Uploading => ("📤", "Uploading...", 0xFFFF00),
        SliceState::Queued => ("◈", "In Queue", 0xFF00FF),
        SliceState::Slicing => ("⚔️", "Slicing Watermark", 0xFF1493),
        SliceState::Downloading => ("📥", "Retrieving...", 0x00BFFF),
        SliceState::Complete => ("✅", "Slice Complete", 0x00FF00),
        SliceState::Failed => ("❌", "Slice Failed", 0xFF0000),
    }
}

/// Footer progress bar, if the state has one.
pub fn footer(state: SliceState) -> Option<&'static str> {
    match state {
        SliceState::Queued | SliceState::Slicing => Some("━━━━━━━━━━━━━━━━━━━━ ⚔"),
        SliceState::Complete => Some("━━━━━━━━━━━━━━━━━━━━ ✓"),
        _ => None,
    }
}

/// The target URL as shown in the embed field.
pub fn target_field(url: &str) -> String {
    format!("`{}...`", truncate_chars(url, 50))
}

pub fn progress_embed(state: SliceState, message: &str, url: Option<&str>) -> CreateEmbed {
    let (icon, title, colour) = style(state);
    let mut embed = CreateEmbed::new()
        .title(format!("{icon} SoraGiri 空斬り"))
        .description(format!("**{title}**\n{message}"))
        .colour(colour);

    if let Some(url) = url {
        embed = embed.field("Target", target_field(url), false);
    }
    if let Some(text) = footer(state) {
        embed = embed.footer(CreateEmbedFooter::new(text));
    }
    embed
}

/// Reply to a bare `!slice`.
pub fn usage_embed(prefix: &str) -> CreateEmbed {
    CreateEmbed::new()
        .title(EMBED_TITLE)
        .description(format!(
            "**Usage:** `{prefix}slice <sora_url>`\n\n\
             Provide a Sora video URL to slice the watermark."
        ))
        .colour(0x00FFFF)
}

/// Reply to `!help`.
pub fn help_embed(help: &str) -> CreateEmbed {
    CreateEmbed::new()
        .title(EMBED_TITLE)
        .description(help)
        .colour(0x00FFFF)
}

/// Reply to `!status`.
pub fn status_embed(api_configured: bool, completed: Option<u64>) -> CreateEmbed {
    let colour = if api_configured { 0x00FF00 } else { 0xFF0000 };
    let mut embed = CreateEmbed::new()
        .title("SoraGiri Status")
        .colour(colour)
        .field("Bot", "Online", true)
        .field(
            "Kie.ai API",
            if api_configured {
                "Connected"
            } else {
                "Not Configured"
            },
            true,
        );
    if let Some(n) = completed {
        embed = embed.field("Slices", n.to_string(), true);
    }
    embed.field(
        "How to use",
        "Mention me with a Sora video URL:\n`@SoraGiri https://sora.chatgpt.com/...`",
        false,
    )
}
