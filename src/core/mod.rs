// src/core/mod.rs

/// Data structures shared by the pipeline, the reports and the UI,
/// such as `ReconReport`, `Severity` and the per-stage result structs.
pub mod models;

/// Typed errors for tools, the hosts file, configuration and reports.
pub mod error;

/// The seam through which every external tool is launched.
pub mod runner;

/// The pipeline stages and the orchestrator that runs them in order.
pub mod scanner;

/// Static catalogue of findings with explanations and next steps.
pub mod knowledge_base;

/// Derives findings and the summary score from a finished report.
pub mod analysis;

/// Text, JSON and HTML report writers.
pub mod report;
