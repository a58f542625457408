//! Best-effort extraction of question records from a model completion.

use mcqgen_core::{CompletionOutcome, FailureKind, Question};
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

pub const NO_JSON_FOUND: &str = "No valid JSON found in response";

/// The greedy `{ … }` span: first opening brace through last closing brace.
fn json_span(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (end > start).then(|| &raw[start..=end])
}

/// Interpret a raw completion.
///
/// Fails with [`FailureKind::NoJsonFound`] when there is no brace span and
/// [`FailureKind::JsonDecodeError`] when the span does not decode. A decoded
/// object without a `questions` array yields an empty question list.
/// Array elements that are not JSON objects are dropped; objects are kept
/// with their fields as the model wrote them. The raw text is kept on every
/// outcome.
pub fn parse_completion(raw: &str) -> CompletionOutcome {
    let Some(span) = json_span(raw) else {
        return CompletionOutcome::failed(FailureKind::NoJsonFound, NO_JSON_FOUND, raw);
    };

    let value: Value = match serde_json::from_str(span) {
        Ok(v) => v,
        Err(e) => {
            return CompletionOutcome::failed(
                FailureKind::JsonDecodeError,
                format!("JSON parsing error: {e}"),
                raw,
            )
        }
    };

    CompletionOutcome::parsed(extract_questions(&value), raw)
}

fn extract_questions(value: &Value) -> Vec<Question> {
    let Some(items) = value.get("questions").and_then(Value::as_array) else {
        return Vec::new();
    };

    items
        .iter()
        .enumerate()
        .filter_map(|(i, item)| {
            if !item.is_object() {
                warn!(index = i, "Dropping question that is not an object");
                return None;
            }
            match Question::deserialize(item) {
                Ok(q) => Some(q),
                Err(e) => {
                    warn!(index = i, error = %e, "Dropping malformed question");
                    None
                }
            }
        })
        .collect()
}
