//! Prompt module for LLM-based operations.
//!
//! One template module per oracle task. Templates use `{placeholder}` markers
//! that the `build_*` functions fill in.

pub mod column_classifier;
pub mod hotel_ranker;
pub mod query_validator;

/// Replace `{key}` markers in a single pass over `template`.
///
/// Substituted text is never scanned again, so a query that happens to
/// contain `{hotels}` stays literal. Unknown markers are left as they are.
pub(crate) fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        let value = tail.find('}').and_then(|end| {
            let key = &tail[1..end];
            values
                .iter()
                .find(|(name, _)| *name == key)
                .map(|(_, value)| (*value, end))
        });
        match value {
            Some((value, end)) => {
                out.push_str(value);
                rest = &tail[end + 1..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}
