//! Splits message text into plain and fenced-code fragments for rendering.

const FENCE: &str = "```";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageFragment {
    Text(String),
    Code(String),
}

/// Splits `text` on ```` ``` ```` fences. Code bodies are trimmed; an unmatched fence stays text.
pub fn parse_message_content(text: &str) -> Vec<MessageFragment> {
    let mut fragments = Vec::new();
    let mut rest = text;
    while let Some(open) = rest.find(FENCE) {
        let body = &rest[open + FENCE.len()..];
        let Some(close) = body.find(FENCE) else {
            break;
        };
        if open > 0 {
            fragments.push(MessageFragment::Text(rest[..open].to_string()));
        }
        fragments.push(MessageFragment::Code(body[..close].trim().to_string()));
        rest = &body[close + FENCE.len()..];
    }
    if !rest.is_empty() {
        fragments.push(MessageFragment::Text(rest.to_string()));
    }
    fragments
}
