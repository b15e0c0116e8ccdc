//! Local slash commands and chained-command resolution.
//!
//! A message that *is* a command (`/summarize some text`) runs its tool
//! directly, without a generation session. A message that *contains* inline
//! groups (`Explain (/summarize foo) briefly`) has each group executed and
//! spliced into the text before the model ever sees it.

use once_cell::sync::Lazy;
use regex::Regex;

use arbor_agent::{ToolCommand, ToolExecutor};
use arbor_core::AgentError;

static LOCAL_COMMAND: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^/([a-z-]+)\s*(.*)$").expect("local command pattern"));

// `[^()]*` keeps the match innermost, so nested groups resolve inside-out.
static CHAINED_COMMAND: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(\s*/([a-z-]+)(?:\s+([^()]*))?\s*\)").expect("chained command pattern"));

/// Resolution stops after this many splices even if groups remain, so
/// malformed or self-referencing input cannot spin.
pub const MAX_CHAIN_RESOLUTIONS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalCommand {
    pub tool_id: String,
    pub args: String,
}

/// A whole-message command: the input starts with `/<tool-id>`.
pub fn parse_local_command(input: &str) -> Option<LocalCommand> {
    let captures = LOCAL_COMMAND.captures(input.trim())?;
    Some(LocalCommand {
        tool_id: captures[1].to_ascii_lowercase(),
        args: captures[2].trim().to_string(),
    })
}

/// Execute inline `(/tool args)` groups innermost-first and splice each
/// result into the text. Tool failures splice as `[Error: …]` markers rather
/// than aborting, so the rest of the message survives.
pub async fn resolve_command_chain(input: &str, tools: &dyn ToolExecutor) -> String {
    let mut text = input.to_string();

    for iteration in 0..MAX_CHAIN_RESOLUTIONS {
        let Some(captures) = CHAINED_COMMAND.captures(&text) else {
            break;
        };
        let matched = captures.get(0).map(|m| m.range()).unwrap_or_default();
        let command = ToolCommand {
            tool_id: captures[1].to_ascii_lowercase(),
            args: captures
                .get(2)
                .map(|m| m.as_str().trim().to_string())
                .unwrap_or_default(),
        };

        let replacement = if !tools.supports(&command.tool_id) {
            format!(
                "[Error: {}]",
                AgentError::UnsupportedTool(command.tool_id.clone())
            )
        } else {
            let result = tools.execute(&command).await;
            if result.success {
                result.content
            } else {
                format!("[Error: {}]", result.content)
            }
        };

        tracing::debug!(
            tool_id = %command.tool_id,
            iteration,
            "resolve_command_chain: spliced inline command"
        );
        text.replace_range(matched, &replacement);
    }

    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_message_command_parses() {
        let command = parse_local_command("/summarize the attached brief").unwrap();
        assert_eq!(command.tool_id, "summarize");
        assert_eq!(command.args, "the attached brief");
    }

    #[test]
    fn prose_is_not_a_local_command() {
        assert!(parse_local_command("tell me about /summarize").is_none());
        assert!(parse_local_command("plain question").is_none());
    }

    #[test]
    fn args_may_be_empty() {
        let command = parse_local_command("/web-search").unwrap();
        assert_eq!(command.args, "");
    }

    #[test]
    fn chained_pattern_matches_innermost_group() {
        let captures = CHAINED_COMMAND
            .captures("outer (/summarize inner (/fetch-url url) tail)")
            .unwrap();
        assert_eq!(&captures[1], "fetch-url");
    }
}
