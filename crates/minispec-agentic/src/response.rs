//! Model response handling
//!
//! Models wrap answers in code fences, add prose, and disagree about
//! casing. The helpers here normalize completions into the three shapes the
//! engine consumes: plan text, verification judgments, and open-ended query
//! answers.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

/// Strip surrounding ``` fences from a model response, if present.
pub fn strip_code_blocks(text: &str) -> String {
    let text = text.trim();
    if text.starts_with("```") {
        let lines: Vec<&str> = text.lines().collect();
        if lines.len() > 2 {
            // Skip first line (```...) and last line (```)
            return lines[1..lines.len() - 1].join("\n").trim().to_string();
        }
        // Fences on a single line: ```tc,90```
        if lines.len() == 1 {
            if let Some(inner) = text
                .strip_prefix("```")
                .and_then(|t| t.strip_suffix("```"))
            {
                return inner.trim().to_string();
            }
        }
    }
    text.to_string()
}

/// Answer to an open-ended query.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryAnswer {
    Bool(bool),
    Text(String),
}

/// Coerce an open-ended query reply.
///
/// Exactly the literal text "true"/"false" (case-insensitive, after
/// trimming) becomes a boolean; anything else stays the raw string.
pub fn coerce_query_reply(reply: &str) -> QueryAnswer {
    let trimmed = reply.trim();
    if trimmed.eq_ignore_ascii_case("true") {
        QueryAnswer::Bool(true)
    } else if trimmed.eq_ignore_ascii_case("false") {
        QueryAnswer::Bool(false)
    } else {
        QueryAnswer::Text(trimmed.to_string())
    }
}

/// Structured judgment of whether a completed action satisfied the task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationResult {
    pub success: bool,
    #[serde(default)]
    pub explanation: Option<String>,
}

/// Parse a verification reply.
///
/// Accepts either a bare boolean literal (`True`, `false`) or a JSON object
/// `{"success": bool, "explanation": "..."}`; anything else is a malformed
/// response and an error, not a guess.
pub fn parse_verification(reply: &str) -> Result<VerificationResult> {
    let cleaned = strip_code_blocks(reply);
    let trimmed = cleaned.trim();

    if trimmed.eq_ignore_ascii_case("true") {
        return Ok(VerificationResult {
            success: true,
            explanation: None,
        });
    }
    if trimmed.eq_ignore_ascii_case("false") {
        return Ok(VerificationResult {
            success: false,
            explanation: None,
        });
    }

    serde_json::from_str::<VerificationResult>(trimmed)
        .map_err(|e| anyhow!("malformed verification response: {} (reply was: {})", e, trimmed))
}
