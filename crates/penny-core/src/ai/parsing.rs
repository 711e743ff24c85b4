//! Tolerant parsing of model replies
//!
//! Model output is untrusted free text. The extractor takes the first
//! balanced `{...}` fragment that is a JSON object, or failing that, labeled `Type:` /
//! `Category:` / `Confidence:` lines. Every failure is
//! `Error::GenerationMalformed`.

use serde_json::Value;

use crate::error::{Error, Result};
use crate::models::{CategorySuggestion, Category, TransactionKind};

/// Raw fields pulled out of a reply, before validation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelFields {
    pub kind: Option<String>,
    pub category: Option<String>,
    pub confidence: Option<Value>,
}

/// Extract suggestion fields from a reply
pub fn parse_model_output(response: &str) -> Result<ModelFields> {
    let response = response.trim();

    if let Some(fragment) = first_json_object(response) {
        if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(fragment) {
            let text = |keys: &[&str]| {
                keys.iter()
                    .find_map(|k| map.get(*k))
                    .and_then(|v| v.as_str())
                    .map(|s| s.trim().to_string())
            };
            return Ok(ModelFields {
                kind: text(&["suggested_type", "type", "kind"]),
                category: text(&["suggested_category", "category"]),
                confidence: map.get("confidence").cloned(),
            });
        }
    }

    let fields = parse_labeled_lines(response);
    if fields == ModelFields::default() {
        return Err(Error::GenerationMalformed(
            "No structured payload in model reply".into(),
        ));
    }
    Ok(fields)
}

/// Parse and validate a category suggestion reply
pub fn parse_suggestion(response: &str) -> Result<CategorySuggestion> {
    validate_suggestion(parse_model_output(response)?)
}

/// Check extracted fields against the known kinds, categories and range
pub fn validate_suggestion(fields: ModelFields) -> Result<CategorySuggestion> {
    let malformed = |msg: String| Error::GenerationMalformed(msg);

    let kind: TransactionKind = fields
        .kind
        .ok_or_else(|| malformed("missing type".into()))?
        .parse()
        .map_err(malformed)?;

    let category: Category = fields
        .category
        .ok_or_else(|| malformed("missing category".into()))?
        .parse()
        .map_err(malformed)?;

    let confidence = match fields.confidence {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .ok_or_else(|| malformed("confidence is missing or not numeric".into()))?;

    if !(0.0..=1.0).contains(&confidence) {
        return Err(malformed(format!("confidence {} outside [0, 1]", confidence)));
    }

    Ok(CategorySuggestion {
        suggested_type: kind,
        suggested_category: category,
        confidence,
    })
}

/// First balanced `{...}` in the text that parses as a JSON object.
/// Braces inside JSON strings don't count.
pub fn first_json_object(text: &str) -> Option<&str> {
    text.match_indices('{').find_map(|(start, _)| {
        let fragment = balanced_from(&text[start..])?;
        matches!(serde_json::from_str::<Value>(fragment), Ok(Value::Object(_))).then_some(fragment)
    })
}

// `text` starts with `{`
fn balanced_from(text: &str) -> Option<&str> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[..=i]);
                }
            }
            _ => {}
        }
    }

    None
}

// First line for each label wins
fn parse_labeled_lines(text: &str) -> ModelFields {
    let mut fields = ModelFields::default();

    for line in text.lines() {
        let line = line.trim().trim_start_matches(['-', '*']).trim();
        let Some((label, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim().trim_matches(['"', '\'', '*', ',']).trim();
        if value.is_empty() {
            continue;
        }

        match label.trim().trim_matches('*').to_lowercase().as_str() {
            "type" | "suggested_type" | "kind" if fields.kind.is_none() => {
                fields.kind = Some(value.to_string());
            }
            "category" | "suggested_category" if fields.category.is_none() => {
                fields.category = Some(value.to_string());
            }
            "confidence" if fields.confidence.is_none() => {
                fields.confidence = Some(Value::String(value.to_string()));
            }
            _ => {}
        }
    }

    fields
}
