#![forbid(unsafe_code)]

//! Scenario runner for the glitch-free propagation runtime.
//!
//! Each subcommand wires a small graph, attaches one terminal observer, sends
//! a sequence of root values, and prints every notification the observer
//! receives.

pub mod cli;
pub mod error;
pub mod logging;
pub mod output;
pub mod scenario;

pub use cli::{Cli, run, run_from_env};
pub use error::{DemoError, Result};
