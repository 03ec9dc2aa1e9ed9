//! Incremental log reconciliation for logtint
//!
//! This crate classifies log lines, renders them into a projection mounted on
//! a log surface, keeps that projection in sync as the source text grows or
//! is replaced, and gates change notifications into reconciliation passes.

mod bootstrap;
mod classifier;
mod config;
mod error;
mod gate;
mod mutation;
mod reconcile;
mod render;
mod state;
mod stylesheet;
mod surface;

pub use bootstrap::{BootstrapOutcome, bootstrap};
pub use classifier::{Classifier, Demotion, Rule, builtin_rules, classify};
pub use config::{ClassifierConfig, Config, DiscoveryConfig, TailConfig, TimingConfig};
pub use error::{ConfigError, ReconcileError, SurfaceError};
pub use gate::{
    ChangeTriggerGate, GateCore, GateDecision, GateStats, IgnoreReason, PassReport,
    PassReportReceiver, PassReportSender, Trigger,
};
pub use mutation::{MutationKind, MutationRecord, NodeInfo, NodeKind, Relevance};
pub use reconcile::{PassOutcome, Reconciler, ResetReason};
pub use render::{escape_html, render_line, sanitize, to_markup};
pub use state::{ReconcileStats, ReconciliationState};
pub use stylesheet::{
    PROJECTION_CLASS, STYLESHEET_ID, UNIT_CLASS, ensure_stylesheet, export_document, stylesheet,
};
pub use surface::{
    LogSurface, MemorySurface, MutationReceiver, MutationSender, SharedSurface, SurfaceLocator,
    SurfaceRegistry,
};

// Re-export types used in our public API
pub use logtint_types::{
    ContentFingerprint, DisplayUnit, LineKey, LogLine, ProjectionId, Severity, SeverityCounts,
    split_lines,
};
