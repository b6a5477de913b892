//! Core types: errors, configuration, logging, HTTP client setup.

pub mod config;
pub mod errors;
pub mod http;
pub mod logging;
