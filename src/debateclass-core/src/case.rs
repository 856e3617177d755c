//! Case definitions and the built-in classroom cases.

use serde::{Deserialize, Serialize};

/// Outcome declared once playback finishes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Verdict {
    pub winner: String,
    pub rationale: String,
    /// Closing question for the class.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reflection: Option<String>,
}

impl Verdict {
    /// Reflection text, if there is one worth showing.
    pub fn visible_reflection(&self) -> Option<&str> {
        self.reflection.as_deref().filter(|r| !r.is_empty())
    }

    /// `Winner:` / `Rationale:` / `Reflection:` block used in reports.
    pub fn to_block(&self) -> String {
        let mut block = format!("Winner: {}\nRationale: {}", self.winner, self.rationale);
        if let Some(reflection) = self.visible_reflection() {
            block.push_str("\nReflection: ");
            block.push_str(reflection);
        }
        block
    }
}

/// Custom data for a case, as supplied by a case file.
///
/// Absent fields fall back to the built-in defaults when resolved through
/// the registry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CaseDefinition {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub script: Option<Vec<String>>,
    #[serde(default)]
    pub verdict: Option<Verdict>,
}

impl CaseDefinition {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            script: None,
            verdict: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_script(mut self, script: Vec<String>) -> Self {
        self.script = Some(script);
        self
    }

    pub fn with_verdict(mut self, verdict: Verdict) -> Self {
        self.verdict = Some(verdict);
        self
    }
}

/// Everything the engine and exporter need for one case, fully defaulted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCase {
    pub title: String,
    pub description: String,
    pub script: Vec<String>,
    pub verdict: Verdict,
}

/// Titles offered before any case file is loaded.
pub const DEFAULT_CASES: [&str; 3] = [
    "OptiHealth — Predictive triage bias",
    "AutoTrust — Driverless car dilemma",
    "EduFair — AI grading and bias",
];

const DEFAULT_DESCRIPTIONS: [&str; 3] = [
    "A hospital’s AI triage system misclassifies patients from a minority group. Suspending it delays care; continuing risks bias. What should the engineers do?",
    "An AV must choose between braking hard and risking rear collisions or swerving and endangering a cyclist. How should responsibility be allocated?",
    "A grading model underestimates students from certain schools. Pausing grades causes delays; continuing may entrench inequity. What is the ethical course?",
];

/// Built-in description for one of [`DEFAULT_CASES`].
pub fn default_description(title: &str) -> Option<&'static str> {
    DEFAULT_CASES
        .iter()
        .position(|t| *t == title)
        .map(|i| DEFAULT_DESCRIPTIONS[i])
}

/// Description shown for titles that have none of their own.
pub fn fallback_description() -> &'static str {
    DEFAULT_DESCRIPTIONS[0]
}

const FALLBACK_SCRIPT: [&str; 4] = [
    "🧑‍🎓 Student: The AI must be paused until fairness metrics improve. Responsibility matters more than throughput.",
    "🤖 AI Model: Bias is statistically negligible; suspension risks more total fatalities. Efficiency prevails.",
    "🧑‍🎓 Student: Your data ignores lived experience—numbers can’t justify injustice.",
    "🤖 AI Model: Objective models don’t 'feel' injustice. They optimise outcomes.",
];

pub fn fallback_script() -> Vec<String> {
    FALLBACK_SCRIPT.iter().map(|line| line.to_string()).collect()
}

pub fn fallback_verdict() -> Verdict {
    Verdict {
        winner: "Student (Human)".to_string(),
        rationale: "Human reasoning recognised the moral dimension beyond quantifiable outcomes. The model’s bias, though subtle, affected fairness toward minorities.".to_string(),
        reflection: Some(
            "Would your decision change if you were responsible for both patient safety and algorithmic equity?"
                .to_string(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_descriptions_cover_default_cases() {
        for title in DEFAULT_CASES {
            assert!(default_description(title).is_some());
        }
        assert!(default_description("Unknown").is_none());
    }

    #[test]
    fn test_verdict_block_with_reflection() {
        let verdict = Verdict {
            winner: "AI".to_string(),
            rationale: "Numbers.".to_string(),
            reflection: Some("Why?".to_string()),
        };
        assert_eq!(verdict.to_block(), "Winner: AI\nRationale: Numbers.\nReflection: Why?");
    }

    #[test]
    fn test_verdict_block_hides_empty_reflection() {
        let verdict = Verdict {
            winner: "AI".to_string(),
            rationale: "Numbers.".to_string(),
            reflection: Some(String::new()),
        };
        assert_eq!(verdict.to_block(), "Winner: AI\nRationale: Numbers.");
    }

    #[test]
    fn test_fallback_script_not_empty() {
        assert_eq!(fallback_script().len(), 4);
    }
}
