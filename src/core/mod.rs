//! Core pipeline: configuration, errors, models, provider client, orchestration

pub mod client;
pub mod config;
pub mod errors;
pub mod models;
pub mod pipeline;
