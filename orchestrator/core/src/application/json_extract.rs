// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! The forgiving JSON extractor shared by the LLM Client's structured
//! envelopes and the Agent Executor's action parser (spec §4.9, §6, §9
//! design notes): strip reasoning markers and markdown code fences, then
//! locate the first balanced `{...}` span and try to parse it.

use serde_json::Value;

/// Known reasoning-marker wrappers models emit around their real answer.
const REASONING_MARKERS: &[(&str, &str)] = &[
    ("<think>", "</think>"),
    ("<thinking>", "</thinking>"),
    ("<reasoning>", "</reasoning>"),
];

/// Strips `<think>...</think>`-style reasoning blocks from `text`.
pub fn strip_reasoning_markers(text: &str) -> String {
    let mut out = text.to_string();
    for (open, close) in REASONING_MARKERS {
        while let Some(start) = out.find(open) {
            if let Some(end) = out[start..].find(close) {
                let end = start + end + close.len();
                out.replace_range(start..end, "");
            } else {
                out.replace_range(start.., "");
                break;
            }
        }
    }
    out
}

/// Finds the first balanced `{...}` span in `text`, respecting string
/// literals and escapes so braces inside JSON string values don't confuse
/// the scan.
fn first_balanced_object(text: &str) -> Option<&str> {
    let bytes = text.as_bytes();
    let start = text.find('{')?;
    let mut depth = 0i32;
    let mut in_string = false;
    let mut escaped = false;
    let mut i = start;
    while i < bytes.len() {
        let c = bytes[i] as char;
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
        } else {
            match c {
                '"' => in_string = true,
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(&text[start..=i]);
                    }
                }
                _ => {}
            }
        }
        i += 1;
    }
    None
}

/// Strips reasoning markers, then markdown code fences, then locates and
/// parses the first balanced JSON object. Returns `None` on total failure —
/// callers are expected to model the outcome as the `{Valid | Invalid}` sum
/// type described in spec §9.
pub fn extract_first_json_object(text: &str) -> Option<Value> {
    let stripped = strip_reasoning_markers(text);
    let candidate = first_balanced_object(&stripped)?;
    serde_json::from_str(candidate).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_plain_object() {
        let v = extract_first_json_object(r#"{"tool":"whois","parameters":{}}"#).unwrap();
        assert_eq!(v["tool"], "whois");
    }

    #[test]
    fn tolerates_markdown_code_fence() {
        let text = "Here is the plan:\n```json\n{\"scan_plan\": [1, 2]}\n```\nDone.";
        let v = extract_first_json_object(text).unwrap();
        assert_eq!(v["scan_plan"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn strips_reasoning_markers_before_scanning() {
        let text = "<think>the user wants {not this}</think>{\"tool\":\"complete_task\"}";
        let v = extract_first_json_object(text).unwrap();
        assert_eq!(v["tool"], "complete_task");
    }

    #[test]
    fn ignores_braces_inside_string_values() {
        let text = r#"{"tool":"whois","parameters":{"note":"a{b}c"}}"#;
        let v = extract_first_json_object(text).unwrap();
        assert_eq!(v["parameters"]["note"], "a{b}c");
    }

    #[test]
    fn non_json_text_returns_none() {
        assert!(extract_first_json_object("Sorry, I cannot help with that.").is_none());
    }
}
