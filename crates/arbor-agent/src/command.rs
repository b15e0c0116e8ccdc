//! The textual tool-command protocol embedded in model output.
//!
//! A response whose first line matches `COMMAND: <tool-id> <args>` is a tool
//! invocation; anything else is a final answer. The pattern is intentionally
//! narrow and anchored; this is not a general parser.

use once_cell::sync::Lazy;
use regex::Regex;

static COMMAND_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)^COMMAND:\s*([a-z-]+)\s*(.*)$").expect("command pattern"));

/// Tools that create or modify documents; these gate on user confirmation
/// before executing.
pub const DESTRUCTIVE_TOOLS: &[&str] = &["generate-document", "write-file", "delete-file"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    pub tool_id: String,
    pub args: String,
}

/// Dedup key for loop detection within one turn. Two calls to the same tool
/// with identical arguments are assumed to be the model spinning.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ToolCallRecord {
    pub tool_id: String,
    pub args: String,
}

impl From<&ToolCommand> for ToolCallRecord {
    fn from(command: &ToolCommand) -> Self {
        Self {
            tool_id: command.tool_id.clone(),
            args: command.args.clone(),
        }
    }
}

/// Extract a structured tool invocation from a completed model response.
pub fn parse_tool_command(text: &str) -> Option<ToolCommand> {
    let captures = COMMAND_PATTERN.captures(text)?;
    Some(ToolCommand {
        tool_id: captures[1].to_ascii_lowercase(),
        args: captures[2].trim().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_anchored_command_line() {
        let command = parse_tool_command("COMMAND: web-search singapore contract law").unwrap();
        assert_eq!(command.tool_id, "web-search");
        assert_eq!(command.args, "singapore contract law");
    }

    #[test]
    fn id_is_case_insensitive_and_lowercased() {
        let command = parse_tool_command("command: Fetch-URL https://example.com").unwrap();
        assert_eq!(command.tool_id, "fetch-url");
    }

    #[test]
    fn args_span_multiple_lines() {
        let command = parse_tool_command("COMMAND: summarize line one\nline two").unwrap();
        assert_eq!(command.args, "line one\nline two");
    }

    #[test]
    fn prose_is_not_a_command() {
        assert!(parse_tool_command("Here is your answer.").is_none());
        // Not anchored at the start of the response.
        assert!(parse_tool_command("I will run COMMAND: web-search foo").is_none());
    }

    #[test]
    fn empty_args_are_allowed() {
        let command = parse_tool_command("COMMAND: web-search").unwrap();
        assert_eq!(command.args, "");
    }

    #[test]
    fn records_dedup_on_id_and_args() {
        let a = parse_tool_command("COMMAND: web-search foo").unwrap();
        let b = parse_tool_command("COMMAND: web-search foo").unwrap();
        let c = parse_tool_command("COMMAND: web-search bar").unwrap();
        assert_eq!(ToolCallRecord::from(&a), ToolCallRecord::from(&b));
        assert_ne!(ToolCallRecord::from(&a), ToolCallRecord::from(&c));
    }
}
