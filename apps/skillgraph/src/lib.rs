//! # skillgraph
//!
//! Application layer over `skillgraph-core`: the HTTP validation service,
//! the CLI and configuration loading.

pub mod api;
pub mod cli;
pub mod config;
