//! Case registry: known titles plus any custom definitions.

use std::collections::HashMap;

use tracing::info;

use crate::case::{self, CaseDefinition, DEFAULT_CASES, ResolvedCase, Verdict};
use crate::ingest::IngestedCases;

/// Titles in selector order and the custom data loaded for some of them.
#[derive(Debug, Clone)]
pub struct CaseRegistry {
    titles: Vec<String>,
    definitions: HashMap<String, CaseDefinition>,
}

impl Default for CaseRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CaseRegistry {
    /// Registry holding only the built-in cases.
    pub fn new() -> Self {
        Self {
            titles: DEFAULT_CASES.iter().map(|t| t.to_string()).collect(),
            definitions: HashMap::new(),
        }
    }

    pub fn titles(&self) -> &[String] {
        &self.titles
    }

    pub fn contains(&self, title: &str) -> bool {
        self.titles.iter().any(|t| t == title)
    }

    pub fn definition(&self, title: &str) -> Option<&CaseDefinition> {
        self.definitions.get(title)
    }

    /// Merge titles (first-seen order, no duplicates) and definitions
    /// (last write wins).
    pub fn register(&mut self, definitions: Vec<CaseDefinition>, titles: Vec<String>) {
        let before = self.titles.len();
        for title in titles {
            if !self.contains(&title) {
                self.titles.push(title);
            }
        }
        let custom = definitions.len();
        for definition in definitions {
            self.definitions.insert(definition.title.clone(), definition);
        }
        info!(
            added_titles = self.titles.len() - before,
            definitions = custom,
            "registered cases"
        );
    }

    /// Merge an ingested case file, returning the title that should become
    /// active (the first one the file named), if any.
    pub fn merge(&mut self, ingested: IngestedCases) -> Option<String> {
        let first = ingested.first_title().map(str::to_string);
        self.register(ingested.definitions, ingested.titles);
        first
    }

    /// First title in selector order.
    pub fn select_default(&self) -> Option<&str> {
        self.titles.first().map(String::as_str)
    }

    pub fn resolve_description(&self, title: &str) -> String {
        self.definitions
            .get(title)
            .and_then(|d| d.description.as_deref())
            .filter(|d| !d.is_empty())
            .or_else(|| case::default_description(title))
            .unwrap_or_else(|| case::fallback_description())
            .to_string()
    }

    /// Never empty.
    pub fn resolve_script(&self, title: &str) -> Vec<String> {
        self.definitions
            .get(title)
            .and_then(|d| d.script.as_ref())
            .filter(|s| !s.is_empty())
            .cloned()
            .unwrap_or_else(case::fallback_script)
    }

    pub fn resolve_verdict(&self, title: &str) -> Verdict {
        self.definitions
            .get(title)
            .and_then(|d| d.verdict.clone())
            .unwrap_or_else(case::fallback_verdict)
    }

    /// Resolve every field of `title` at once.
    pub fn resolve(&self, title: &str) -> ResolvedCase {
        ResolvedCase {
            title: title.to_string(),
            description: self.resolve_description(title),
            script: self.resolve_script(title),
            verdict: self.resolve_verdict(title),
        }
    }
}
