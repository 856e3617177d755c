//! Case file ingestion.
//!
//! A case file is either a JSON array or an object with a `cases` array.
//! Each element is a bare title string or a case object. A bad top-level
//! shape fails the whole load; a bad element is skipped on its own.

use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::case::{self, CaseDefinition, Verdict};
use crate::error::IngestError;

/// Cases read from one document, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestedCases {
    /// Every accepted title, including title-only entries.
    pub titles: Vec<String>,
    /// Definitions for object entries.
    pub definitions: Vec<CaseDefinition>,
}

impl IngestedCases {
    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }

    /// Title the caller should make active after merging.
    pub fn first_title(&self) -> Option<&str> {
        self.titles.first().map(String::as_str)
    }
}

/// Outcome of validating one array element.
enum Element {
    Title(String),
    Case(CaseDefinition),
    Skip(&'static str),
}

/// Parse a case document. Pure: merging into a registry is up to the caller.
pub fn ingest(raw_text: &str) -> Result<IngestedCases, IngestError> {
    let root: Value = serde_json::from_str(raw_text)?;
    let elements = match &root {
        Value::Array(items) => items,
        Value::Object(fields) => match fields.get("cases") {
            Some(Value::Array(items)) => items,
            _ => return Err(IngestError::Shape),
        },
        _ => return Err(IngestError::Shape),
    };

    let mut ingested = IngestedCases::default();
    for (index, element) in elements.iter().enumerate() {
        match validate_element(element) {
            Element::Title(title) => ingested.titles.push(title),
            Element::Case(definition) => {
                ingested.titles.push(definition.title.clone());
                ingested.definitions.push(definition);
            }
            Element::Skip(reason) => warn!(index, reason, "skipping case entry"),
        }
    }

    info!(
        titles = ingested.titles.len(),
        definitions = ingested.definitions.len(),
        "ingested case file"
    );
    Ok(ingested)
}

fn validate_element(element: &Value) -> Element {
    match element {
        Value::String(title) => Element::Title(title.clone()),
        Value::Object(fields) => match fields.get("title") {
            Some(Value::String(title)) if !title.is_empty() => {
                Element::Case(definition_from(title, fields))
            }
            _ => Element::Skip("object without a title"),
        },
        _ => Element::Skip("unsupported entry type"),
    }
}

fn definition_from(title: &str, fields: &Map<String, Value>) -> CaseDefinition {
    let description = match fields.get("description") {
        Some(Value::String(text)) => Some(text.clone()),
        _ => None,
    };

    let script = match fields.get("script") {
        Some(Value::Array(lines)) => {
            let lines: Vec<String> = lines
                .iter()
                .filter_map(|line| line.as_str().map(str::to_string))
                .collect();
            (!lines.is_empty()).then_some(lines)
        }
        _ => None,
    };

    let verdict = match fields.get("verdict") {
        Some(Value::Object(verdict)) => Some(verdict_from(verdict)),
        _ => None,
    };

    CaseDefinition {
        title: title.to_string(),
        description,
        script,
        verdict,
    }
}

/// Missing or empty `winner`/`rationale` take the built-in value. A missing
/// `reflection` also takes the built-in one. An explicit `null` reflection
/// means the verdict has none; it is not coerced to the text `"null"`.
fn verdict_from(fields: &Map<String, Value>) -> Verdict {
    let fallback = case::fallback_verdict();

    let winner = coerce(fields.get("winner"))
        .filter(|w| !w.trim().is_empty())
        .unwrap_or(fallback.winner);
    let rationale = coerce(fields.get("rationale"))
        .filter(|r| !r.trim().is_empty())
        .unwrap_or(fallback.rationale);
    let reflection = match fields.get("reflection") {
        None => fallback.reflection,
        Some(value) => coerce(Some(value)),
    };

    Verdict {
        winner,
        rationale,
        reflection,
    }
}

/// String form of a loosely typed field. `null` counts as absent.
fn coerce(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::CaseRegistry;

    #[test]
    fn test_bare_strings_become_titles_only() {
        let ingested = ingest(r#"["A", "B", "C"]"#).unwrap();
        assert_eq!(ingested.titles, vec!["A", "B", "C"]);
        assert!(ingested.definitions.is_empty());
    }

    #[test]
    fn test_title_only_object_falls_back_entirely() {
        let ingested = ingest(r#"{"cases": [{"title": "X"}]}"#).unwrap();
        assert_eq!(ingested.titles, vec!["X"]);
        assert_eq!(ingested.definitions, vec![CaseDefinition::new("X")]);

        let mut registry = CaseRegistry::new();
        registry.register(ingested.definitions, ingested.titles);
        assert_eq!(registry.resolve_verdict("X"), case::fallback_verdict());
        assert_eq!(registry.resolve_script("X"), case::fallback_script());
    }

    #[test]
    fn test_not_json_is_parse_error() {
        assert!(matches!(ingest("not json"), Err(IngestError::Parse(_))));
    }

    #[test]
    fn test_object_without_cases_is_shape_error() {
        assert!(matches!(ingest(r#"{"foo": 1}"#), Err(IngestError::Shape)));
        assert!(matches!(ingest(r#"{"cases": "nope"}"#), Err(IngestError::Shape)));
        assert!(matches!(ingest("42"), Err(IngestError::Shape)));
    }

    #[test]
    fn test_malformed_elements_are_skipped() {
        let ingested = ingest(
            r#"[1, null, {"description": "no title"}, {"title": ""}, {"title": 5}, {"title": "Kept"}]"#,
        )
        .unwrap();
        assert_eq!(ingested.titles, vec!["Kept"]);
    }

    #[test]
    fn test_every_bare_string_is_a_title() {
        let ingested = ingest(r#"["A", "", "   "]"#).unwrap();
        assert_eq!(ingested.titles, vec!["A", "", "   "]);
        assert!(ingested.definitions.is_empty());
    }

    #[test]
    fn test_whitespace_object_title_is_kept() {
        let ingested = ingest(r#"[{"title": "  "}]"#).unwrap();
        assert_eq!(ingested.titles, vec!["  "]);
        assert_eq!(ingested.definitions, vec![CaseDefinition::new("  ")]);
    }

    #[test]
    fn test_zero_valid_elements_is_success() {
        let ingested = ingest("[]").unwrap();
        assert!(ingested.is_empty());
        assert_eq!(ingested.first_title(), None);
    }

    #[test]
    fn test_script_filters_non_strings() {
        let ingested = ingest(r#"[{"title": "X", "script": ["one", 2, null, "three"]}]"#).unwrap();
        assert_eq!(
            ingested.definitions[0].script,
            Some(vec!["one".to_string(), "three".to_string()])
        );
    }

    #[test]
    fn test_script_of_only_non_strings_is_not_custom() {
        let ingested = ingest(r#"[{"title": "X", "script": [1, 2]}]"#).unwrap();
        assert_eq!(ingested.definitions[0].script, None);
    }

    #[test]
    fn test_non_string_description_is_dropped() {
        let ingested = ingest(r#"[{"title": "X", "description": 7}]"#).unwrap();
        assert_eq!(ingested.definitions[0].description, None);
    }

    #[test]
    fn test_partial_verdict_takes_fallback_fields() {
        let ingested = ingest(r#"[{"title": "X", "verdict": {"winner": "AI Model"}}]"#).unwrap();
        let verdict = ingested.definitions[0].verdict.clone().unwrap();
        let fallback = case::fallback_verdict();
        assert_eq!(verdict.winner, "AI Model");
        assert_eq!(verdict.rationale, fallback.rationale);
        assert_eq!(verdict.reflection, fallback.reflection);
    }

    #[test]
    fn test_verdict_fields_coerced_to_strings() {
        let ingested =
            ingest(r#"[{"title": "X", "verdict": {"winner": 3, "rationale": true, "reflection": ""}}]"#)
                .unwrap();
        let verdict = ingested.definitions[0].verdict.clone().unwrap();
        assert_eq!(verdict.winner, "3");
        assert_eq!(verdict.rationale, "true");
        assert_eq!(verdict.reflection, Some(String::new()));
    }

    #[test]
    fn test_null_reflection_means_none() {
        let ingested = ingest(r#"[{"title": "X", "verdict": {"reflection": null}}]"#).unwrap();
        assert_eq!(ingested.definitions[0].verdict.as_ref().unwrap().reflection, None);
    }

    #[test]
    fn test_non_object_verdict_is_dropped() {
        let ingested = ingest(r#"[{"title": "X", "verdict": "AI wins"}]"#).unwrap();
        assert_eq!(ingested.definitions[0].verdict, None);
    }
}
