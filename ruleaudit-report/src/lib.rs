//! Report rendering for analyzed rules.
//!
//! A deterministic markdown template is always available. When a generator
//! is configured its prose replaces the template, but every count in it is
//! reconciled against the analysis before it is returned. The crate also
//! hosts the HTTP API that exposes validation and reporting.

pub mod error;
pub mod generator;
pub mod prompt;
pub mod reconcile;
pub mod renderer;
pub mod service;
pub mod template;

pub use error::GeneratorError;
pub use generator::{ChatCompletionGenerator, GenerationRequest, ReportGenerator};
pub use reconcile::{reconcile, Reconciliation};
pub use renderer::{ReportRenderer, ReportSource, RuleReport};
pub use service::{ReportApiBuilder, ReportServiceConfig, ValidateResponse};
pub use template::render_template;
