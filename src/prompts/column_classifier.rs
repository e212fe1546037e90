//! Column classification prompts.
//!
//! The classifier asks three questions of the same shape: which of these raw
//! dataset columns relate to a reference list (accepted, ignored), and which
//! of the remaining ones are amenities.

use super::fill_template;

/// System prompt shared by all column classification calls
pub const SYSTEM_PROMPT: &str = "You are a helpful assistant that classifies hotel dataset fields.";

const OUTPUT_RULES: &str = r#"**Important:**
- ONLY return a plain JSON list of strings.
- Do NOT add any headings, explanations, code blocks or extra text."#;

/// Placeholders: {columns}, {kind}, {reference}, {output_rules}
const REFERENCE_TEMPLATE: &str = r#"You are given a list of original column names from a hotel dataset:
original_columns={columns}

You are given another list of columns:
{kind}_columns={reference}

Identify which columns in original_columns are related in context to columns in {kind}_columns.

Return a JSON list whose items are the exact column names from original_columns that refer to {kind}_columns.

{output_rules}"#;

/// Placeholders: {columns}, {output_rules}
const AMENITY_TEMPLATE: &str = r#"You are given a list of original column names from a hotel dataset:
original_columns={columns}

Identify which columns are related in context to amenities (like pool, gym, wifi, etc.). Exclude any column related to room category or other non-amenity features.

Return a JSON list of the exact column names that refer to amenities.

{output_rules}"#;

/// Placeholders: {columns}, {hint}, {output_rules}
const AMENITY_HINT_TEMPLATE: &str = r#"You are given a list of original column names from a hotel dataset:
original_columns={columns}

Return a JSON list of the exact column names that match either of these conditions:
1. The column is related in context to amenities (like pool, gym, wifi, etc.), excluding anything related to room category or other non-amenity features.
2. The column is related in context to amenities requested in the following user request:
"{hint}"

{output_rules}"#;

/// Build the prompt asking which columns relate to a reference list.
///
/// `kind` names the list in the prompt (`"accepted"` or `"ignored"`).
pub fn build_reference_prompt(kind: &str, columns: &[String], reference: &[String]) -> String {
    let columns = json_list(columns);
    let reference = json_list(reference);
    fill_template(
        REFERENCE_TEMPLATE,
        &[
            ("columns", columns.as_str()),
            ("kind", kind),
            ("reference", reference.as_str()),
            ("output_rules", OUTPUT_RULES),
        ],
    )
}

/// Build the amenity detection prompt, optionally biased by a user hint.
pub fn build_amenity_prompt(columns: &[String], hint: Option<&str>) -> String {
    let columns = json_list(columns);
    match hint.map(str::trim).filter(|h| !h.is_empty()) {
        Some(hint) => fill_template(
            AMENITY_HINT_TEMPLATE,
            &[("columns", columns.as_str()), ("hint", hint), ("output_rules", OUTPUT_RULES)],
        ),
        None => fill_template(
            AMENITY_TEMPLATE,
            &[("columns", columns.as_str()), ("output_rules", OUTPUT_RULES)],
        ),
    }
}

fn json_list(items: &[String]) -> String {
    serde_json::to_string(items).unwrap_or_else(|_| "[]".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cols(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_build_reference_prompt() {
        let prompt = build_reference_prompt("ignored", &cols(&["lat", "rating"]), &cols(&["latitude"]));
        assert!(prompt.contains(r#"original_columns=["lat","rating"]"#));
        assert!(prompt.contains(r#"ignored_columns=["latitude"]"#));
        assert!(prompt.contains("refer to ignored_columns"));
        assert!(!prompt.contains('{'));
    }

    #[test]
    fn test_build_amenity_prompt_with_and_without_hint() {
        let columns = cols(&["sauna"]);
        let plain = build_amenity_prompt(&columns, None);
        let blank = build_amenity_prompt(&columns, Some("  "));
        let hinted = build_amenity_prompt(&columns, Some("somewhere with a sauna"));

        assert_eq!(plain, blank);
        assert!(!plain.contains("user request"));
        assert!(hinted.contains(r#""somewhere with a sauna""#));
    }

    #[test]
    fn test_hint_placeholders_stay_literal() {
        let prompt = build_amenity_prompt(&cols(&["sauna"]), Some("sauna {output_rules}"));

        assert_eq!(prompt.matches(OUTPUT_RULES).count(), 1);
        assert!(prompt.contains(r#""sauna {output_rules}""#));
    }
}
