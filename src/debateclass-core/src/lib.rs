//! DebateClass Core Library
//!
//! Scripted classroom debates: the case registry and case-file ingestion,
//! the timed playback engine, transcript normalization and report export.

pub mod case;
pub mod config;
pub mod error;
pub mod export;
pub mod ingest;
pub mod normalize;
pub mod participant;
pub mod playback;
pub mod registry;
pub mod scheduler;

pub use case::{CaseDefinition, ResolvedCase, Verdict};
pub use config::{Config, default_config};
pub use error::{DebateError, ExportError, IngestError};
pub use export::{ExportAdapter, ExportRequest, ExportVariant, TextReportExporter};
pub use ingest::{IngestedCases, ingest};
pub use participant::{Message, Speaker};
pub use playback::{PlaybackCallback, PlaybackEngine, PlaybackEvent, PlaybackPhase};
pub use registry::CaseRegistry;
pub use scheduler::{ManualScheduler, Scheduler, TimerId, TokioScheduler};
