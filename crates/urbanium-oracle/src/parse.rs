//! Parsing oracle replies into proposals.
//!
//! Models are asked for a bare JSON object but do not always comply. The
//! parser tries, in order: the whole reply as JSON, the contents of a
//! fenced code block, and the first `{ .. }` span, each also with trailing
//! commas removed. As a last resort a reply that is nothing but an action
//! name is accepted. Vocabulary membership is not checked here; the
//! arbitrator does that against the citizen's available set.

use serde::Deserialize;
use urbanium_core::OracleProposal;
use urbanium_types::ActionType;

use crate::error::OracleClientError;

/// The JSON shape requested from the model.
#[derive(Debug, Deserialize)]
struct RawReply {
    #[serde(alias = "action_type")]
    action: String,
    #[serde(default)]
    reasoning: Option<String>,
    #[serde(default)]
    confidence: Option<serde_json::Value>,
}

/// Parse reply text into a proposal.
pub fn parse_reply(raw: &str) -> Result<OracleProposal, OracleClientError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(parse_error("empty reply"));
    }

    let candidates = [
        Some(trimmed),
        extract_json_from_codeblock(trimmed),
        extract_braced(trimmed),
    ];
    for candidate in candidates.into_iter().flatten() {
        if let Some(reply) = try_json(candidate) {
            return convert(reply);
        }
    }

    if let Some(action) = bare_action(trimmed) {
        return Ok(OracleProposal {
            action: action.as_str().to_owned(),
            reasoning: None,
            confidence: None,
        });
    }

    Err(parse_error(&format!("no usable JSON in reply: {trimmed}")))
}

fn try_json(text: &str) -> Option<RawReply> {
    serde_json::from_str::<RawReply>(text)
        .ok()
        .or_else(|| serde_json::from_str::<RawReply>(&strip_trailing_commas(text)).ok())
}

fn convert(reply: RawReply) -> Result<OracleProposal, OracleClientError> {
    let action = reply.action.trim();
    if action.is_empty() {
        return Err(parse_error("reply has an empty action"));
    }
    let confidence = reply.confidence.as_ref().and_then(|value| match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    });
    Ok(OracleProposal {
        action: action.to_owned(),
        reasoning: reply.reasoning.filter(|r| !r.trim().is_empty()),
        confidence,
    })
}

/// A reply consisting of only an action name, possibly quoted.
fn bare_action(text: &str) -> Option<ActionType> {
    let word = text
        .trim_matches(|c: char| matches!(c, '"' | '\'' | '`' | '.' | '!') || c.is_whitespace());
    ActionType::from_name(word)
}

/// Extract the body of a fenced code block (```json or plain ```).
fn extract_json_from_codeblock(text: &str) -> Option<&str> {
    let open = text.find("```")?;
    let after_fence = text.get(open.checked_add(3)?..)?;
    // Skip the info string (`json`, `JSON`, ...) up to the first newline.
    let body_start = after_fence.find('\n').and_then(|nl| nl.checked_add(1))?;
    let body = after_fence.get(body_start..)?;
    let close = body.find("```")?;
    body.get(..close).map(str::trim)
}

/// The span from the first `{` to the last `}`.
fn extract_braced(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    text.get(start..=end)
}

/// Remove commas directly followed (after whitespace) by `}` or `]`.
fn strip_trailing_commas(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for (index, c) in text.char_indices() {
        if c == ',' {
            let rest = text.get(index.saturating_add(1)..).unwrap_or("");
            if matches!(rest.trim_start().chars().next(), Some('}' | ']')) {
                continue;
            }
        }
        result.push(c);
    }
    result
}

fn parse_error(message: &str) -> OracleClientError {
    OracleClientError::Parse {
        message: message.to_owned(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parses_clean_json() {
        let proposal =
            parse_reply(r#"{"action": "rest", "reasoning": "worn out", "confidence": 0.9}"#)
                .unwrap();
        assert_eq!(proposal.action, "rest");
        assert_eq!(proposal.reasoning.as_deref(), Some("worn out"));
        assert!(proposal.confidence.is_some_and(|c| (c - 0.9).abs() < f64::EPSILON));
    }

    #[test]
    fn accepts_action_type_alias() {
        let proposal = parse_reply(r#"{"action_type": "JobSearch"}"#).unwrap();
        assert_eq!(proposal.action, "JobSearch");
        assert!(proposal.reasoning.is_none());
        assert!(proposal.confidence.is_none());
    }

    #[test]
    fn parses_fenced_code_block() {
        let raw = "Sure, here you go:\n\n```json\n{\"action\": \"eat\", \"reasoning\": \"hungry\"}\n```\nEnjoy.";
        let proposal = parse_reply(raw).unwrap();
        assert_eq!(proposal.action, "eat");
    }

    #[test]
    fn parses_first_brace_span_in_prose() {
        let raw = "I would pick {\"action\": \"socialize\", \"confidence\": \"0.4\"} today.";
        let proposal = parse_reply(raw).unwrap();
        assert_eq!(proposal.action, "socialize");
        assert!(proposal.confidence.is_some_and(|c| (c - 0.4).abs() < f64::EPSILON));
    }

    #[test]
    fn tolerates_trailing_commas() {
        let raw = "{\"action\": \"commute\", \"reasoning\": \"work is far\",}";
        assert_eq!(parse_reply(raw).unwrap().action, "commute");
    }

    #[test]
    fn accepts_bare_action_word() {
        let proposal = parse_reply("  \"work_shift\".  ").unwrap();
        assert_eq!(proposal.action, "work_shift");
    }

    #[test]
    fn unknown_text_is_a_parse_error() {
        assert!(matches!(
            parse_reply("I think they should take a long walk."),
            Err(OracleClientError::Parse { .. })
        ));
        assert!(matches!(parse_reply("   "), Err(OracleClientError::Parse { .. })));
        assert!(matches!(
            parse_reply(r#"{"action": "  "}"#),
            Err(OracleClientError::Parse { .. })
        ));
    }

    #[test]
    fn out_of_vocabulary_json_passes_through() {
        // Rejection happens in arbitration, against the available set.
        let proposal = parse_reply(r#"{"action": "dance"}"#).unwrap();
        assert_eq!(proposal.action, "dance");
    }

    #[test]
    fn codeblock_extraction() {
        assert_eq!(
            extract_json_from_codeblock("```json\n{\"a\": 1}\n```"),
            Some("{\"a\": 1}")
        );
        assert_eq!(
            extract_json_from_codeblock("```\n{\"a\": 1}\n```"),
            Some("{\"a\": 1}")
        );
        assert_eq!(extract_json_from_codeblock("no fence"), None);
    }

    #[test]
    fn trailing_comma_stripping() {
        assert_eq!(strip_trailing_commas(r#"{"a": 1, "b": 2,}"#), r#"{"a": 1, "b": 2}"#);
        assert_eq!(strip_trailing_commas("[1, 2, 3 ,\n]"), "[1, 2, 3 \n]");
        assert_eq!(strip_trailing_commas("a, b"), "a, b");
    }
}
