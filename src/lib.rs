//! Analyze engineering drawings with a locally running vision language model.
//!
//! Images and a prompt are validated, base64 encoded and forwarded in a single
//! request to an Ollama-compatible backend; the model's text answer is
//! relayed back. Two front ends sit on top of the library: a command line tool
//! ([`cli`]) and a web UI with a small JSON API ([`web`]).

pub mod cli;
pub mod client;
pub mod codec;
pub mod config;
pub mod error;
pub mod messages;
pub mod model;
pub mod request;
pub mod staging;
pub mod web;

pub use client::{ConnectionState, InferenceClient};
pub use config::BackendConfig;
pub use error::AnalyzerError;
pub use request::{AnalysisRequest, AnalysisResponse};
