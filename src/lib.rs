//! Guidepost - streaming guidance server
//!
//! Streams model answers to a browser extension while extracting embedded
//! `ACTION:` highlight directives from the token stream, failing over
//! between a remote chat API, a local-network model server, and a built-in
//! answer table.

pub mod cli;
pub mod config;
pub mod directive;
pub mod error;
pub mod handlers;
pub mod inject;
pub mod knowledge;
pub mod middleware;
pub mod orchestrator;
pub mod providers;
pub mod telemetry;
