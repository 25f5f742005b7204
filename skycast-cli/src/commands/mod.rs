//! CLI subcommands.

pub mod common;
pub mod composite;
pub mod config;
pub mod serve;
pub mod tile;
