//! Speakers and transcript messages.
//!
//! Script lines arrive as marker-prefixed strings. They are parsed into
//! [`Message`] once, and the marker form is only produced again when a line
//! is rendered for display or export.

use serde::{Deserialize, Serialize};

/// Who authored a transcript line.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Speaker {
    /// The human debater.
    Student,
    /// The scripted model debater.
    Ai,
    /// An argument injected by the person running the session.
    User,
}

impl Speaker {
    pub const ALL: [Speaker; 3] = [Speaker::Student, Speaker::Ai, Speaker::User];

    /// Leading symbol that tags a script line.
    pub fn marker(&self) -> &'static str {
        match self {
            Speaker::Student => "\u{1F9D1}\u{200D}\u{1F393}",
            Speaker::Ai => "\u{1F916}",
            Speaker::User => "\u{1F4AC}",
        }
    }

    /// Name used in scripted lines, e.g. `🤖 AI Model: ...`.
    pub fn display_name(&self) -> &'static str {
        match self {
            Speaker::Student => "Student",
            Speaker::Ai => "AI Model",
            Speaker::User => "You",
        }
    }

    /// ASCII label used in plain-text exports.
    pub fn plain_label(&self) -> &'static str {
        match self {
            Speaker::Student => "Student:",
            Speaker::Ai => "AI:",
            Speaker::User => "You:",
        }
    }

    /// Find the speaker whose marker starts `line`.
    pub fn from_marked(line: &str) -> Option<Speaker> {
        Speaker::ALL
            .into_iter()
            .find(|speaker| line.starts_with(speaker.marker()))
    }
}

/// A single transcript entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    /// `None` for lines that carry no recognised marker.
    pub speaker: Option<Speaker>,
    /// Line content after the marker and its spacing.
    pub text: String,
    /// The line exactly as displayed, marker and spacing included.
    pub raw: String,
}

impl Message {
    /// A line spoken by `speaker`, labelled the way scripted lines are.
    pub fn spoken(speaker: Speaker, body: impl AsRef<str>) -> Self {
        let text = format!("{}: {}", speaker.display_name(), body.as_ref());
        Self {
            speaker: Some(speaker),
            raw: format!("{} {}", speaker.marker(), text),
            text,
        }
    }

    /// Split a marker-prefixed script line into speaker and text.
    pub fn parse(line: &str) -> Self {
        match Speaker::from_marked(line) {
            Some(speaker) => Self {
                speaker: Some(speaker),
                text: line[speaker.marker().len()..].trim_start().to_string(),
                raw: line.to_string(),
            },
            None => Self {
                speaker: None,
                text: line.to_string(),
                raw: line.to_string(),
            },
        }
    }

    /// The marker-prefixed form, as the line was displayed.
    pub fn to_marked_line(&self) -> String {
        self.raw.clone()
    }
}
