//! CLI module for gridcast
//!
//! Provides subcommands:
//! - `serve`: HTTP forecast API
//! - `train`: build the model store from provider history

pub mod serve;
pub mod train;

use clap::{Parser, Subcommand};

/// District electricity forecasts: load, price and blackout chance
#[derive(Parser)]
#[command(name = "gridcast")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the forecast API server
    Serve,

    /// Fetch history, fit models and persist the model store
    Train(train::TrainArgs),
}
