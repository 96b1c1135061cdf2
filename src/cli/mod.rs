//! CLI module for the geo semantic cache
//!
//! Provides subcommands:
//! - `serve`: run the HTTP API
//! - `resolve`: resolve one address and print the result as JSON

pub mod resolve;
pub mod serve;

use clap::{Parser, Subcommand};

/// Geocoding gateway with a semantic address cache
#[derive(Parser)]
#[command(name = "geo-semantic-cache")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP API server
    Serve,

    /// Resolve a single address and print it as JSON
    Resolve(resolve::ResolveArgs),
}
