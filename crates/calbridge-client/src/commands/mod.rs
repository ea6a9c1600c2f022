//! One-shot subcommands.

pub mod config;
pub mod health;
pub mod login;
pub mod range;
