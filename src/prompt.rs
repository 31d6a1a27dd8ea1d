//! Prompt text for the LLM path and parsing of the hint JSON it returns.

use crate::{HintRequest, Hints};
use serde::Deserialize;

/// Four-level contract the model must follow.
pub const HINT_INSTRUCTIONS: &str = r#"Write exactly four progressive hints for this clue, each revealing a little more than the last:

1. hint1: point to the definition only. Quote or paraphrase the definition words; say nothing about the wordplay.
2. hint2: name the cryptic technique (anagram, hidden word, reversal, container, homophone, double definition, charade, deletion and so on) without any specifics.
3. hint3: describe the construction: which words are indicators and which are fodder or components. Never write the answer or any part of it; replace answer letters with [...].
4. hint4: the full explanation, including the answer and how the wordplay produces it.

Never put the answer in capital letters in hints 1 to 3.

Respond with only a JSON object of this shape and nothing else:
{"hint1": "...", "hint2": "...", "hint3": "...", "hint4": "..."}"#;

/// Builds the single user message sent for one clue.
pub fn build_hint_prompt(request: &HintRequest) -> String {
    let definition = request
        .definitions
        .iter()
        .map(|d| d.trim())
        .find(|d| !d.is_empty())
        .unwrap_or("unknown");
    let explanation = request
        .paragraphs
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n");
    let explanation = if explanation.is_empty() {
        "(no explanation available)".to_string()
    } else {
        explanation
    };
    format!(
        r#"You are helping someone solve a cryptic crossword clue without spoiling it.

## Clue
- Clue: {}
- Answer: {}
- Definition: {definition}

## Expert explanation

{explanation}

---

{HINT_INSTRUCTIONS}"#,
        request.clue_text().unwrap_or("unknown"),
        request.answer().unwrap_or("unknown"),
    )
}

#[derive(Debug, Default, Deserialize)]
struct HintFields {
    #[serde(default)]
    hint1: Option<String>,
    #[serde(default)]
    hint2: Option<String>,
    #[serde(default)]
    hint3: Option<String>,
    #[serde(default)]
    hint4: Option<String>,
}

/// Parses the model's reply into hints. Absent or null fields become empty
/// strings; anything that is not a JSON object is an error.
pub fn parse_hint_text(text: &str) -> Result<Hints, serde_json::Error> {
    let payload = json_payload(text);
    let fields: HintFields = match serde_json::from_str(payload) {
        Ok(fields) => fields,
        Err(err) => match outer_object(payload) {
            Some(object) if object != payload => serde_json::from_str(object)?,
            _ => return Err(err),
        },
    };
    let level = |hint: Option<String>| hint.map(|h| h.trim().to_string()).unwrap_or_default();
    Ok(Hints::new(
        level(fields.hint1),
        level(fields.hint2),
        level(fields.hint3),
        level(fields.hint4),
    ))
}

/// Body of the first fenced block, or the whole trimmed text.
fn json_payload(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(start) = trimmed.find("```") else {
        return trimmed;
    };
    let mut body = &trimmed[start + 3..];
    if body.starts_with(|c: char| c.is_ascii_alphabetic()) {
        body = body.split_once('\n').map_or("", |(_, rest)| rest);
    }
    match body.find("```") {
        Some(end) => body[..end].trim(),
        None => body.trim(),
    }
}

fn outer_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_embeds_everything_known() {
        let request = HintRequest::new(["An anagram of LATE.", "  "])
            .with_definitions(["old"])
            .with_clue("Story told late, oddly (4)")
            .with_answer("TALE");
        let prompt = build_hint_prompt(&request);
        assert!(prompt.contains("- Clue: Story told late, oddly (4)"));
        assert!(prompt.contains("- Answer: TALE"));
        assert!(prompt.contains("- Definition: old"));
        assert!(prompt.contains("An anagram of LATE."));
        assert!(prompt.contains(
            r#"{"hint1": "...", "hint2": "...", "hint3": "...", "hint4": "..."}"#
        ));
    }

    #[test]
    fn prompt_marks_unknowns() {
        let prompt = build_hint_prompt(&HintRequest::default());
        assert!(prompt.contains("- Clue: unknown"));
        assert!(prompt.contains("- Answer: unknown"));
        assert!(prompt.contains("(no explanation available)"));
    }

    #[test]
    fn parses_bare_json() {
        let hints =
            parse_hint_text(r#"{"hint1":"a","hint2":"b","hint3":"c","hint4":"d"}"#).unwrap();
        assert_eq!(hints.as_array(), &["a", "b", "c", "d"].map(String::from));
    }

    #[test]
    fn parses_fenced_json() {
        let text =
            "```json\n{\"hint1\": \"a\", \"hint2\": \"b\", \"hint3\": \"c\", \"hint4\": \"d\"}\n```";
        assert_eq!(parse_hint_text(text).unwrap().level(4), Some("d"));
        let bare_fence = "```\n{\"hint1\": \"x\"}\n```";
        assert_eq!(parse_hint_text(bare_fence).unwrap().level(1), Some("x"));
    }

    #[test]
    fn tolerates_surrounding_prose() {
        let text = "Here are the hints:\n{\"hint1\": \"a\", \"hint4\": \"d\"}\nGood luck!";
        let hints = parse_hint_text(text).unwrap();
        assert_eq!(hints.level(1), Some("a"));
        assert_eq!(hints.level(2), Some(""));
    }

    #[test]
    fn missing_and_null_fields_are_empty() {
        let hints = parse_hint_text(r#"{"hint1": "a", "hint3": null}"#).unwrap();
        assert_eq!(hints.iter().collect::<Vec<_>>(), vec!["a", "", "", ""]);
    }

    #[test]
    fn rejects_non_objects() {
        assert!(parse_hint_text("not json at all").is_err());
        assert!(parse_hint_text("[1, 2, 3]").is_err());
        assert!(parse_hint_text("").is_err());
    }
}
