//! DebateClass CLI - Classroom Ethics Debate Player
//!
//! Plays a scripted student-versus-model debate in the terminal, takes
//! injected arguments from stdin, and writes reports once the verdict is in.

use clap::{Parser, ValueEnum};
use colored::Colorize;
use debateclass_core::export::wrap_text;
use debateclass_core::{
    CaseRegistry, Config, DebateError, ExportAdapter, ExportRequest, ExportVariant,
    PlaybackEngine, PlaybackEvent, PlaybackPhase, ResolvedCase, Speaker, TextReportExporter,
    TokioScheduler, default_config, ingest,
};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "debateclass",
    version,
    about = "Classroom debate player - watch a student and a model argue an ethical case",
    long_about = "Plays a scripted debate line by line. Type an argument and press Enter to inject it \
                  while the debate runs, or use :start, :reset, :demo and :quit."
)]
struct Cli {
    /// Case to play (defaults to the first known case, or the first loaded one)
    #[arg(short, long, value_name = "TITLE")]
    case: Option<String>,

    /// JSON case file to load before playing
    #[arg(long, value_name = "FILE")]
    cases: Option<PathBuf>,

    /// Framework label for the student side
    #[arg(long, value_name = "FRAMEWORK")]
    student_framework: Option<String>,

    /// Framework label for the model side
    #[arg(long, value_name = "FRAMEWORK")]
    ai_framework: Option<String>,

    /// TOML configuration file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print the known cases and exit
    #[arg(long)]
    list: bool,

    /// Write a report once the verdict is revealed
    #[arg(long, value_enum, value_name = "VARIANT")]
    export: Option<ExportChoice>,

    /// Directory for reports (overrides export.output_dir)
    #[arg(long, value_name = "DIR")]
    out: Option<PathBuf>,

    /// Write the summary example handout and exit
    #[arg(long)]
    summary_example: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ExportChoice {
    Raw,
    Plain,
    Both,
}

impl ExportChoice {
    fn variants(self) -> Vec<ExportVariant> {
        match self {
            ExportChoice::Raw => vec![ExportVariant::Raw],
            ExportChoice::Plain => vec![ExportVariant::Plain],
            ExportChoice::Both => vec![ExportVariant::Raw, ExportVariant::Plain],
        }
    }
}

/// A line typed during playback.
#[derive(Debug, PartialEq, Eq)]
enum Command {
    Start,
    Reset,
    Demo,
    Quit,
    Argument(String),
}

impl Command {
    fn parse(line: &str) -> Self {
        match line.trim() {
            ":start" => Command::Start,
            ":reset" => Command::Reset,
            ":demo" => Command::Demo,
            ":quit" | ":q" => Command::Quit,
            _ => Command::Argument(line.to_string()),
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => default_config(),
    };
    if let Some(out) = &cli.out {
        config.export.output_dir = out.clone();
    }
    let exporter = TextReportExporter::new(&config.export);

    if cli.summary_example {
        match exporter.export_summary_example().await {
            Ok(path) => println!("{} {}", "Summary example written:".green(), path.display()),
            Err(e) => report_export_failure(&e.into()),
        }
        return Ok(());
    }

    let mut registry = CaseRegistry::new();
    let mut active = registry.select_default().map(str::to_string);

    if let Some(path) = &cli.cases {
        match load_cases(&mut registry, path).await {
            Ok(Some(first)) => active = Some(first),
            Ok(None) => {
                eprintln!("{}", "Warning: the case file contained no usable cases.".yellow());
            }
            Err(e) => {
                eprintln!(
                    "{} Failed to load cases. Ensure it's valid JSON. ({})",
                    "Error:".red().bold(),
                    e
                );
                std::process::exit(1);
            }
        }
    }

    if let Some(title) = &cli.case {
        if !registry.contains(title) {
            return Err(DebateError::UnknownCase(format!(
                "'{}'. Known cases: {}",
                title,
                registry.titles().join(", ")
            ))
            .into());
        }
        active = Some(title.clone());
    }

    if cli.list {
        for title in registry.titles() {
            let marker = if Some(title) == active.as_ref() { "*" } else { " " };
            println!("{} {}", marker.bright_cyan(), title);
        }
        return Ok(());
    }

    let student_framework = cli
        .student_framework
        .clone()
        .unwrap_or_else(|| config.frameworks.default_student().to_string());
    let ai_framework = cli
        .ai_framework
        .clone()
        .unwrap_or_else(|| config.frameworks.default_ai().to_string());
    config.check_framework(true, &student_framework)?;
    config.check_framework(false, &ai_framework)?;

    let title = active.ok_or_else(|| DebateError::UnknownCase("no cases available".to_string()))?;
    let case = registry.resolve(&title);

    print_header(&case, &student_framework, &ai_framework);

    let (scheduler, mut timers) = TokioScheduler::new();
    let mut engine = PlaybackEngine::new(scheduler)
        .with_settings(config.playback.clone(), config.rebuttals.clone())
        .with_callback(create_console_callback());
    engine.start(&case);

    let mut input = spawn_input_reader();
    let mut input_open = true;

    loop {
        tokio::select! {
            Some(timer) = timers.recv() => {
                engine.handle_timer(timer);
                if engine.is_verdict_visible() {
                    break;
                }
            }
            line = input.recv(), if input_open => match line {
                Some(line) => match Command::parse(&line) {
                    Command::Start => engine.start(&case),
                    Command::Reset => engine.reset(),
                    Command::Demo => engine.run_demo(&case),
                    Command::Quit => break,
                    Command::Argument(text) => {
                        if engine.phase() != PlaybackPhase::Running {
                            println!("{}", "  (the debate is not running; argument ignored)".dimmed());
                        }
                        engine.inject_argument(&text);
                    }
                },
                None => input_open = false,
            },
        }

        if !input_open && engine.phase() == PlaybackPhase::Idle {
            break;
        }
    }

    if let (Some(choice), Some(verdict)) = (cli.export, engine.verdict()) {
        for variant in choice.variants() {
            let request = ExportRequest::new(
                &case.title,
                &student_framework,
                &ai_framework,
                engine.transcript(),
                verdict,
                variant,
            );
            match exporter.export(&request).await {
                Ok(path) => println!("{} {}", "Report written:".green(), path.display()),
                Err(e) => report_export_failure(&e.into()),
            }
        }
    }

    Ok(())
}

/// Forward stdin lines from a plain thread so a pending read never holds
/// up runtime shutdown.
fn spawn_input_reader() -> mpsc::UnboundedReceiver<String> {
    let (sender, receiver) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lines() {
            let Ok(line) = line else { break };
            if sender.send(line).is_err() {
                break;
            }
        }
    });
    receiver
}

/// Read, ingest and merge a case file. Returns the title to make active.
async fn load_cases(
    registry: &mut CaseRegistry,
    path: &Path,
) -> Result<Option<String>, Box<dyn std::error::Error>> {
    debug!(path = %path.display(), "loading case file");
    let text = tokio::fs::read_to_string(path).await?;
    let ingested = ingest(&text)?;
    Ok(registry.merge(ingested))
}

fn report_export_failure(error: &DebateError) {
    eprintln!("{} {}", "Export failed:".red().bold(), error);
}

fn print_header(case: &ResolvedCase, student_framework: &str, ai_framework: &str) {
    println!();
    println!("{}", "═".repeat(70).bright_blue());
    println!(
        "{}",
        format!("  {} - {}", "DebateClass".bold(), "AI Debate Engine, Classroom Edition")
            .bright_blue()
            .bold()
    );
    println!("{}", "═".repeat(70).bright_blue());
    println!();
    println!("{} {}", "Case:".bold(), case.title.bright_white());
    for line in wrap_text(&case.description, 66) {
        println!("  {}", line.dimmed());
    }
    println!();
    println!(
        "{} {} vs {}",
        "Frameworks:".bold(),
        student_framework.bright_green(),
        ai_framework.bright_red()
    );
    println!(
        "{}",
        "Type an argument and press Enter to inject it. Commands: :start :reset :demo :quit"
            .dimmed()
    );
    println!("{}", "─".repeat(70).dimmed());
}

/// Create a callback that prints playback events to the console.
fn create_console_callback() -> Box<dyn Fn(PlaybackEvent) + Send + Sync> {
    Box::new(move |event| match event {
        PlaybackEvent::Started { title, total } => {
            println!();
            println!(
                "{} {}",
                "▶".bright_cyan(),
                format!("Playing '{}' ({} turns)", title, total).bright_cyan().bold()
            );
            println!();
        }
        PlaybackEvent::MessageRevealed { message, progress } => {
            print_message(message.speaker, &message.to_marked_line());
            println!("  {}", progress_bar(progress).dimmed());
            println!();
        }
        PlaybackEvent::ArgumentInjected { messages } => {
            for message in messages {
                print_message(message.speaker, &message.to_marked_line());
            }
            println!();
        }
        PlaybackEvent::Completed => {
            println!("{}", "  The adjudicator is deliberating...".dimmed());
        }
        PlaybackEvent::VerdictRevealed { verdict } => {
            println!();
            println!("{}", "═".repeat(70).bright_magenta());
            println!("{}", "  🏆 Adjudicator's Verdict".bright_magenta().bold());
            println!("{}", "═".repeat(70).bright_magenta());
            println!("  {} {}", "Winner:".bold(), verdict.winner.bright_white());
            for line in wrap_text(&verdict.rationale, 66) {
                println!("  {}", line);
            }
            if let Some(reflection) = verdict.visible_reflection() {
                println!();
                for line in wrap_text(reflection, 66) {
                    println!("  {}", line.italic().dimmed());
                }
            }
            println!();
        }
        PlaybackEvent::Reset => {
            println!("{}", "  Session reset. Type :start to play again.".yellow());
        }
    })
}

fn print_message(speaker: Option<Speaker>, line: &str) {
    for (index, wrapped) in wrap_text(line, 66).into_iter().enumerate() {
        let indent = if index == 0 { "  " } else { "     " };
        let styled = match speaker {
            Some(Speaker::Student) => wrapped.bright_green(),
            Some(Speaker::Ai) => wrapped.bright_red(),
            Some(Speaker::User) => wrapped.bright_white().bold(),
            None => wrapped.normal(),
        };
        println!("{}{}", indent, styled);
    }
}

fn progress_bar(progress: f64) -> String {
    let width = 30;
    let filled = ((progress / 100.0) * width as f64).round() as usize;
    let filled = filled.min(width);
    format!(
        "[{}{}] {:>3.0}%",
        "#".repeat(filled),
        ".".repeat(width - filled),
        progress
    )
}
