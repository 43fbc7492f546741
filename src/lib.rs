//! Library entry point for the anchore-ci tool.

pub mod commands;
pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod manager;
pub mod model;
pub mod poll;
pub mod reports;
pub mod runner;
pub mod utils;
