/// Build the field-extraction prompt for a contract text.
///
/// Asks for exactly the five scalar fields and the parties array, JSON only.
/// Missing fields must come back as null so the parser can keep them null
/// instead of guessing.
pub fn build_extraction_prompt(text: &str) -> String {
    format!(
        r#"Extract the key information from the following contract text and answer with JSON only.

Contract text:
{text}

Extract these fields (use null when a field cannot be found):
{{
  "total_amount": total contract amount as a number,
  "subject_matter": what the contract is about,
  "sign_date": signing date (ISO format),
  "effective_date": effective date (ISO format),
  "expire_date": expiry date (ISO format),
  "parties": [
    {{
      "party_type": "甲方" or "乙方",
      "party_name": the party's registered name,
      "tax_number": tax number if present,
      "legal_representative": legal representative if present,
      "address": address if present
    }}
  ]
}}

Answer with the JSON object only, no explanations."#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_embeds_text_and_field_names() {
        let prompt = build_extraction_prompt("PURCHASE AGREEMENT between Acme and Beta");
        assert!(prompt.contains("PURCHASE AGREEMENT between Acme and Beta"));
        for field in ["total_amount", "subject_matter", "sign_date", "effective_date", "expire_date", "parties"] {
            assert!(prompt.contains(field), "missing {field}");
        }
    }
}
