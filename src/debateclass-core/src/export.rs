//! Debate reports.
//!
//! The engine hands an [`ExportRequest`] to an [`ExportAdapter`]. The
//! bundled [`TextReportExporter`] lays the report out as fixed-width pages
//! with `Page i / n` footers and writes it to disk.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use regex::Regex;
use tracing::info;

use crate::case::Verdict;
use crate::config::ExportConfig;
use crate::error::ExportError;
use crate::normalize::{plain_verdict, to_plain_text};
use crate::participant::Message;

static NON_ALPHANUMERIC: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]+").ok());

const REPORT_HEADING: &str = "AI Debate Report";
const SUMMARY_HEADING: &str = "AI Debate — Summary Example";
const SUMMARY_FILE: &str = "debate-summary-example.txt";
/// Lines that must fit on the page where the verdict heading starts.
const VERDICT_KEEP_LINES: usize = 5;

/// Which rendering of the transcript goes into the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportVariant {
    /// Markers and typographic punctuation as displayed.
    Raw,
    /// Normalized to ASCII and Latin-1.
    Plain,
}

impl ExportVariant {
    fn file_marker(&self) -> &'static str {
        match self {
            ExportVariant::Raw => "",
            ExportVariant::Plain => "plain-",
        }
    }
}

/// Everything a report needs, already rendered for its variant.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportRequest {
    pub title: String,
    pub student_role: String,
    pub ai_role: String,
    pub generated_at: DateTime<Utc>,
    pub transcript: Vec<String>,
    pub verdict: String,
    pub variant: ExportVariant,
}

impl ExportRequest {
    pub fn new(
        title: impl Into<String>,
        student_role: impl Into<String>,
        ai_role: impl Into<String>,
        transcript: &[Message],
        verdict: &Verdict,
        variant: ExportVariant,
    ) -> Self {
        let (transcript, verdict) = match variant {
            ExportVariant::Raw => (
                transcript.iter().map(Message::to_marked_line).collect(),
                verdict.to_block(),
            ),
            ExportVariant::Plain => (
                transcript
                    .iter()
                    .map(|message| to_plain_text(&message.to_marked_line()))
                    .collect(),
                plain_verdict(verdict),
            ),
        };

        Self {
            title: title.into(),
            student_role: student_role.into(),
            ai_role: ai_role.into(),
            generated_at: Utc::now(),
            transcript,
            verdict,
            variant,
        }
    }

    /// Pin the generation time.
    pub fn with_generated_at(mut self, generated_at: DateTime<Utc>) -> Self {
        self.generated_at = generated_at;
        self
    }

    /// `Case: … • Frameworks: … vs … • Generated: …`
    pub fn metadata_line(&self) -> String {
        let meta = format!(
            "Case: {}  •  Frameworks: {} vs {}  •  Generated: {}",
            self.title,
            self.student_role,
            self.ai_role,
            self.generated_at.to_rfc3339_opts(SecondsFormat::Millis, true)
        );
        match self.variant {
            ExportVariant::Raw => meta,
            ExportVariant::Plain => to_plain_text(&meta),
        }
    }

    /// File name without extension.
    pub fn file_stem(&self) -> String {
        format!(
            "debate-report-{}-{}{}",
            slugify(&self.title),
            self.variant.file_marker(),
            file_timestamp(&self.generated_at)
        )
    }
}

/// Lower-case, collapse non-alphanumeric runs into `-`, trim `-` at the ends.
pub fn slugify(title: &str) -> String {
    let lower = title.to_lowercase();
    let collapsed = match NON_ALPHANUMERIC.as_ref() {
        Some(re) => re.replace_all(&lower, "-").into_owned(),
        None => lower,
    };
    collapsed.trim_matches('-').to_string()
}

/// ISO-8601 timestamp that sorts and is safe in file names.
pub fn file_timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-")
}

/// Body of the summary example handout.
pub fn summary_example() -> Vec<String> {
    [
        "This is a template illustrating what the generated summary may look like.",
        "",
        "Case: OptiHealth — Predictive triage bias",
        "Frameworks: Student (Human) vs AI Model (Biased)",
        "",
        "Key Points:",
        "- Fairness vs efficiency trade-off must be made explicit.",
        "- Stakeholder impact and minority harm require front-seat consideration.",
        "- Pause-and-patch with continuous monitoring is defensible when risk is asymmetric.",
    ]
    .iter()
    .map(|line| line.to_string())
    .collect()
}

/// Renders and persists debate reports.
#[async_trait]
pub trait ExportAdapter: Send + Sync {
    /// Write a report, returning where it went.
    async fn export(&self, request: &ExportRequest) -> Result<PathBuf, ExportError>;

    /// Write the fixed summary example handout.
    async fn export_summary_example(&self) -> Result<PathBuf, ExportError>;
}

enum LayoutLine {
    Text(String),
    /// Start a new page unless this many lines still fit.
    KeepTogether(usize),
}

/// Plain-text paginated reports.
#[derive(Debug, Clone)]
pub struct TextReportExporter {
    output_dir: PathBuf,
    lines_per_page: usize,
    line_width: usize,
}

impl TextReportExporter {
    pub fn new(config: &ExportConfig) -> Self {
        Self {
            output_dir: config.output_dir.clone(),
            lines_per_page: config.lines_per_page.max(3),
            line_width: config.line_width.max(1),
        }
    }

    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = output_dir.into();
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Full report text, pages separated by form feeds.
    pub fn render(&self, request: &ExportRequest) -> String {
        let mut lines = vec![
            LayoutLine::Text(REPORT_HEADING.to_string()),
            LayoutLine::Text(String::new()),
        ];
        self.push_wrapped(&mut lines, &request.metadata_line());
        lines.push(LayoutLine::Text(String::new()));

        lines.push(LayoutLine::Text("Transcript".to_string()));
        if request.transcript.is_empty() {
            lines.push(LayoutLine::Text("(no messages)".to_string()));
        }
        for line in &request.transcript {
            self.push_wrapped(&mut lines, line);
        }

        lines.push(LayoutLine::Text(String::new()));
        lines.push(LayoutLine::KeepTogether(VERDICT_KEEP_LINES));
        lines.push(LayoutLine::Text("Verdict".to_string()));
        self.push_wrapped(&mut lines, &request.verdict);

        self.paginate(lines)
    }

    /// Summary example handout text.
    pub fn render_summary_example(&self) -> String {
        let mut lines = vec![
            LayoutLine::Text(SUMMARY_HEADING.to_string()),
            LayoutLine::Text(String::new()),
        ];
        for line in summary_example() {
            self.push_wrapped(&mut lines, &line);
        }
        self.paginate(lines)
    }

    fn push_wrapped(&self, lines: &mut Vec<LayoutLine>, text: &str) {
        for paragraph in text.split('\n') {
            lines.extend(
                wrap_text(paragraph, self.line_width)
                    .into_iter()
                    .map(LayoutLine::Text),
            );
        }
    }

    fn paginate(&self, lines: Vec<LayoutLine>) -> String {
        // Each page keeps its last two lines for the footer.
        let body = self.lines_per_page - 2;
        let mut pages: Vec<Vec<String>> = vec![Vec::new()];

        for line in lines {
            let used = pages.last().map_or(0, Vec::len);
            match line {
                LayoutLine::KeepTogether(needed) => {
                    if used > 0 && body - used < needed {
                        pages.push(Vec::new());
                    }
                }
                LayoutLine::Text(text) => {
                    if used == body {
                        pages.push(Vec::new());
                    }
                    if let Some(page) = pages.last_mut() {
                        page.push(text);
                    }
                }
            }
        }

        let total = pages.len();
        pages
            .into_iter()
            .enumerate()
            .map(|(index, mut page)| {
                page.resize(body, String::new());
                page.push(String::new());
                let footer = format!("Page {} / {}", index + 1, total);
                page.push(format!("{:>width$}", footer, width = self.line_width));
                page.join("\n")
            })
            .collect::<Vec<_>>()
            .join("\x0C")
    }

    async fn write(&self, file_name: &str, contents: String) -> Result<PathBuf, ExportError> {
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|e| {
                ExportError::Unavailable(format!(
                    "cannot use output directory '{}' ({}). Choose another with --out or export.output_dir",
                    self.output_dir.display(),
                    e
                ))
            })?;

        let path = self.output_dir.join(file_name);
        tokio::fs::write(&path, contents).await?;
        info!(path = %path.display(), "report written");
        Ok(path)
    }
}

#[async_trait]
impl ExportAdapter for TextReportExporter {
    async fn export(&self, request: &ExportRequest) -> Result<PathBuf, ExportError> {
        let contents = self.render(request);
        self.write(&format!("{}.txt", request.file_stem()), contents).await
    }

    async fn export_summary_example(&self) -> Result<PathBuf, ExportError> {
        let contents = self.render_summary_example();
        self.write(SUMMARY_FILE, contents).await
    }
}

/// Greedy word wrap. Words longer than `width` get a line of their own.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();
        if current_len > 0 && current_len + word_len + 1 > width {
            lines.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if current_len > 0 {
            current.push(' ');
            current_len += 1;
        }
        current.push_str(word);
        current_len += word_len;
    }

    lines.push(current);
    lines
}
