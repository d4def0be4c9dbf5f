//! Lang Pipeline - identify the language of a sentence, then translate it
//!
//! This library provides the three HTTP services of the pipeline (front-end,
//! identify, translate) and a load generator that feeds them sentences taken
//! from an encyclopedia.

#![forbid(unsafe_code)]

pub mod cli;
pub mod core;
pub mod loadgen;
pub mod server;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export key types for convenience
pub use self::core::{
    client::LanguageProvider,
    config::PipelineConfig,
    errors::ServiceError,
    models::{ChatHistory, ModelId, SegmentPolicy},
    pipeline::{Pipeline, PipelineError, PipelineOutcome},
};

pub use loadgen::{LoadError, LoadGenerator};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
