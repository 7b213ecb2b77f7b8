use super::types::{ExtractedFields, ExtractedParty};

/// Parse the model's answer into `ExtractedFields`.
///
/// Models are asked for bare JSON but frequently wrap it in prose or a
/// markdown fence, so this tries the raw answer first and then the slice
/// between the first `{` and the last `}`. Anything unparseable yields the
/// all-null fallback so the extraction stage always completes
/// deterministically.
pub fn parse_fields_response(response: &str) -> ExtractedFields {
    let trimmed = response.trim();

    if let Some(fields) = parse_json_object(trimmed) {
        return fields;
    }

    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if start < end {
            if let Some(fields) = parse_json_object(&trimmed[start..=end]) {
                return fields;
            }
        }
    }

    ExtractedFields::default()
}

fn parse_json_object(candidate: &str) -> Option<ExtractedFields> {
    let value: serde_json::Value = serde_json::from_str(candidate).ok()?;
    let obj = value.as_object()?;

    Some(ExtractedFields {
        total_amount: amount_lenient(obj.get("total_amount")),
        subject_matter: string_lenient(obj.get("subject_matter")),
        sign_date: string_lenient(obj.get("sign_date")),
        effective_date: string_lenient(obj.get("effective_date")),
        expire_date: string_lenient(obj.get("expire_date")),
        parties: parties_lenient(obj.get("parties")),
    })
}

/// Amounts come back as JSON numbers or as numeric strings ("150000.00").
fn amount_lenient(value: Option<&serde_json::Value>) -> Option<f64> {
    match value? {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().replace(',', "").parse().ok(),
        _ => None,
    }
}

fn string_lenient(value: Option<&serde_json::Value>) -> Option<String> {
    match value? {
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Parse the parties array leniently — skip items that fail to deserialize.
fn parties_lenient(value: Option<&serde_json::Value>) -> Vec<ExtractedParty> {
    match value.and_then(|v| v.as_array()) {
        None => vec![],
        Some(arr) => arr
            .iter()
            .filter_map(|v| serde_json::from_value(v.clone()).ok())
            .collect(),
    }
}
