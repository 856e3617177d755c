//! Plain-text rendering of transcripts and verdicts for export.
//!
//! Speaker markers become ASCII labels and the rest of the line is kept,
//! so `🤖 AI Model: x` exports as `AI: AI Model: x`. Typographic
//! punctuation becomes its ASCII form, and whatever is left outside
//! printable ASCII and Latin-1 is dropped after compatibility
//! decomposition. Every function here is total
//! and idempotent.

use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

use crate::case::Verdict;
use crate::participant::{Message, Speaker};

/// A leading marker and the whitespace after it.
static MARKER_PATTERNS: LazyLock<Vec<(Speaker, Regex)>> = LazyLock::new(|| {
    Speaker::ALL
        .into_iter()
        .filter_map(|speaker| {
            let pattern = format!(r"^{}\s*", regex::escape(speaker.marker()));
            Regex::new(&pattern).ok().map(|regex| (speaker, regex))
        })
        .collect()
});

/// Normalize a single line.
pub fn to_plain_line(line: &str) -> String {
    let labelled = replace_marker(line);
    let decomposed: String = labelled.nfkd().collect();
    let ascii_punctuation = de_smart(&decomposed);
    ascii_punctuation.chars().filter(|c| is_exportable(*c)).collect()
}

/// Normalize free text line by line.
pub fn to_plain_text(text: &str) -> String {
    text.split('\n').map(to_plain_line).collect::<Vec<_>>().join("\n")
}

/// Plain transcript, one message per line.
pub fn plain_transcript(messages: &[Message]) -> String {
    messages
        .iter()
        .map(|message| to_plain_text(&message.to_marked_line()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Transcript exactly as displayed, markers included.
pub fn raw_transcript(messages: &[Message]) -> String {
    messages
        .iter()
        .map(Message::to_marked_line)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Plain `Winner:` / `Rationale:` / `Reflection:` block.
pub fn plain_verdict(verdict: &Verdict) -> String {
    to_plain_text(&verdict.to_block())
}

fn replace_marker(line: &str) -> String {
    for (speaker, pattern) in MARKER_PATTERNS.iter() {
        if let Some(found) = pattern.find(line) {
            return format!("{} {}", speaker.plain_label(), &line[found.end()..]);
        }
    }
    line.to_string()
}

fn de_smart(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\u{201C}' | '\u{201D}' => out.push('"'),
            '\u{2018}' | '\u{2019}' => out.push('\''),
            '\u{2014}' => out.push_str("--"),
            '\u{2013}' => out.push('-'),
            other => out.push(other),
        }
    }
    out
}

/// Printable ASCII, Latin-1 supplement, tab, newline and carriage return.
/// Emoji, flags and symbol blocks all fall outside this set.
fn is_exportable(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\r' | '\u{20}'..='\u{7E}' | '\u{A0}'..='\u{FF}')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::case;
    use proptest::prelude::*;

    #[test]
    fn test_markers_become_ascii_labels() {
        assert_eq!(
            to_plain_line("🧑‍🎓 Student: Pause the model."),
            "Student: Student: Pause the model."
        );
        assert_eq!(
            to_plain_line("🤖 AI Model: Efficiency."),
            "AI: AI Model: Efficiency."
        );
        assert_eq!(to_plain_line("💬 You: why?"), "You: You: why?");
    }

    #[test]
    fn test_marker_without_label_keeps_remainder() {
        assert_eq!(to_plain_line("🤖Numbers win."), "AI: Numbers win.");
        assert_eq!(to_plain_line("🧑‍🎓   Stop."), "Student: Stop.");
    }

    #[test]
    fn test_marker_only_at_line_start() {
        assert_eq!(to_plain_line("Said 🤖 AI Model: hi"), "Said  AI Model: hi");
    }

    #[test]
    fn test_smart_punctuation() {
        assert_eq!(
            to_plain_line("“Quoted” ‘single’ em—dash en–dash"),
            "\"Quoted\" 'single' em--dash en-dash"
        );
    }

    #[test]
    fn test_emoji_and_flags_removed() {
        assert_eq!(to_plain_line("Win 🏆 for 🇬🇧 ☀ ✅"), "Win  for   ");
    }

    #[test]
    fn test_latin1_kept_and_accents_decomposed() {
        assert_eq!(to_plain_line("£5 ¿sí? café"), "£5 ¿si? cafe");
        assert_eq!(to_plain_line("ﬁne"), "fine");
    }

    #[test]
    fn test_control_whitespace_preserved() {
        assert_eq!(to_plain_text("a\tb\r\nc"), "a\tb\r\nc");
    }

    #[test]
    fn test_fallback_transcript_is_plain() {
        let messages: Vec<Message> = case::fallback_script()
            .iter()
            .map(|line| Message::parse(line))
            .collect();
        let plain = plain_transcript(&messages);
        let lines: Vec<&str> = plain.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("Student: Student: The AI must be paused"));
        assert!(lines[1].starts_with("AI: AI Model: Bias is statistically negligible"));
        assert!(lines[2].contains("experience--numbers can't"));
        assert!(plain.is_ascii());
    }

    #[test]
    fn test_raw_transcript_keeps_markers() {
        let messages = vec![Message::spoken(Speaker::User, "why?")];
        assert_eq!(raw_transcript(&messages), "💬 You: why?");
    }

    #[test]
    fn test_plain_verdict() {
        let plain = plain_verdict(&case::fallback_verdict());
        assert!(plain.starts_with("Winner: Student (Human)\nRationale: "));
        assert!(plain.contains("The model's bias"));
        assert!(plain.contains("\nReflection: Would your decision change"));
    }

    #[test]
    fn test_plain_verdict_without_reflection() {
        let verdict = Verdict {
            winner: "🤖 AI".to_string(),
            rationale: "—".to_string(),
            reflection: None,
        };
        assert_eq!(plain_verdict(&verdict), "Winner:  AI\nRationale: --");
    }

    fn fragment() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("🧑‍🎓 ".to_string()),
            Just("🤖".to_string()),
            Just("💬 You:".to_string()),
            Just("AI Model: ".to_string()),
            Just("“”‘’—–".to_string()),
            Just("\n".to_string()),
            Just("é ﬁ ½ \u{00A0}\r\t".to_string()),
            any::<String>(),
            "[a-zA-Z ]{0,12}",
        ]
    }

    fn mixed_text() -> impl Strategy<Value = String> {
        prop::collection::vec(fragment(), 0..10).prop_map(|parts| parts.concat())
    }

    proptest! {
        #[test]
        fn test_plain_text_idempotent(text in mixed_text()) {
            let once = to_plain_text(&text);
            prop_assert_eq!(to_plain_text(&once), once.clone());
            prop_assert!(once.chars().all(is_exportable));
            prop_assert!(!once.contains(['“', '”', '‘', '’', '—', '–']));
        }

        #[test]
        fn test_plain_transcript_idempotent(lines in prop::collection::vec(mixed_text(), 0..6)) {
            let messages: Vec<Message> = lines.iter().map(|line| Message::parse(line)).collect();
            let once = plain_transcript(&messages);
            prop_assert_eq!(to_plain_text(&once), once);
        }

        #[test]
        fn test_plain_verdict_idempotent(
            winner in mixed_text(),
            rationale in mixed_text(),
            reflection in proptest::option::of(mixed_text()),
        ) {
            let verdict = Verdict { winner, rationale, reflection };
            let once = plain_verdict(&verdict);
            prop_assert_eq!(to_plain_text(&once), once);
        }
    }
}
