//! Language-model decision oracle for the Urbanium simulation.
//!
//! Implements the core `DecisionOracle` trait against any OpenAI-compatible
//! chat completions endpoint. The oracle is an untrusted suggestion source:
//! whatever it answers is checked by the arbitrator against the citizen's
//! available actions, and any fault falls back to the rule table.
//!
//! # Modules
//!
//! - [`config`] -- endpoint, model, and template settings
//! - [`error`] -- client errors and their mapping onto oracle faults
//! - [`prompt`] -- `minijinja` prompt templates
//! - [`parse`] -- tolerant reply parsing
//! - [`client`] -- the HTTP oracle itself

pub mod client;
pub mod config;
pub mod error;
pub mod parse;
pub mod prompt;

pub use client::LlmOracle;
pub use config::OracleConfig;
pub use error::OracleClientError;
pub use parse::parse_reply;
pub use prompt::{PromptEngine, RenderedPrompt};
