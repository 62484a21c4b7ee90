//! CLI module for collage-maker
//!
//! This module is only available when the "cli" feature is enabled.

mod config;
#[path = "main.rs"]
mod main_impl;
mod progress;
mod shell;

pub use main_impl::{main, Cli, CliLayout};
