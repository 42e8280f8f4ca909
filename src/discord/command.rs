//! Prefix commands (`!slice <url>`, `!status`, ...).
//!
//! Commands are a static table with aliases; [`parse`] resolves a message
//! against it and [`help_text`] renders it.

/// What a prefix command asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotCommand {
    /// Slice a URL. `None` when the user forgot it.
    Slice(Option<String>),
    Status,
    Help,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Slice,
    Status,
    Help,
}

struct CommandDef {
    name: &'static str,
    aliases: &'static [&'static str],
    usage: &'static str,
    description: &'static str,
    kind: Kind,
}

const COMMANDS: &[CommandDef] = &[
    CommandDef {
        name: "slice",
        aliases: &["soragiri", "giri", "remove"],
        usage: "<sora_url>",
        description: "remove the watermark from a Sora video",
        kind: Kind::Slice,
    },
    CommandDef {
        name: "status",
        aliases: &[],
        usage: "",
        description: "show bot and API status",
        kind: Kind::Status,
    },
    CommandDef {
        name: "help",
        aliases: &["h"],
        usage: "",
        description: "show this help",
        kind: Kind::Help,
    },
];

/// Resolve `content` as a prefix command. Returns `None` for ordinary chat
/// and unknown commands.
pub fn parse(content: &str, prefix: &str) -> Option<BotCommand> {
    let rest = content.trim().strip_prefix(prefix)?;
    let mut parts = rest.split_whitespace();
    let name = parts.next()?.to_lowercase();

    let def = COMMANDS
        .iter()
        .find(|c| c.name == name || c.aliases.contains(&name.as_str()))?;

    Some(match def.kind {
        Kind::Slice => BotCommand::Slice(parts.next().map(clean_url)),
        Kind::Status => BotCommand::Status,
        Kind::Help => BotCommand::Help,
    })
}

/// Discord lets users suppress embeds with `<url>`; strip the brackets.
fn clean_url(arg: &str) -> String {
    arg.trim_start_matches('<').trim_end_matches('>').to_string()
}

/// One line per command, aliases in parentheses.
pub fn help_text(prefix: &str) -> String {
    let entries: Vec<(String, &str)> = COMMANDS
        .iter()
        .map(|c| {
            let mut label = format!("{prefix}{}", c.name);
            if !c.usage.is_empty() {
                label.push(' ');
                label.push_str(c.usage);
            }
            if !c.aliases.is_empty() {
                let aliases: Vec<String> =
                    c.aliases.iter().map(|a| format!("{prefix}{a}")).collect();
                label.push_str(&format!(" ({})", aliases.join(", ")));
            }
            (label, c.description)
        })
        .collect();

    let mut out = String::new();
    for (label, desc) in &entries {
        out.push_str(&format!("`{label}` {desc}\n"));
    }
    out.push_str("`/slice url:<sora_url>` same as above, as a slash command\n");
    out.push_str("Or mention me with a Sora link.\n");
    out
}
