//! Command-line interface definition for StoryMagic
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands to run the web service and to inspect the plan
//! catalog.

use clap::{Parser, Subcommand};

/// StoryMagic - personalized children's story service
#[derive(Parser, Debug, Clone)]
#[command(name = "storymagic")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub json_logs: bool,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for StoryMagic
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run the HTTP service
    Serve {
        /// Address to bind (overrides config and STORYMAGIC_HOST)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides config and PORT)
        #[arg(short, long)]
        port: Option<u16>,

        /// Ignore any database configuration and keep everything in memory
        #[arg(long)]
        memory_only: bool,
    },

    /// Print the subscription plan catalog
    Plans {
        /// Output as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: Some("config/config.yaml".to_string()),
            verbose: false,
            json_logs: false,
            command: Commands::Serve {
                host: None,
                port: None,
                memory_only: false,
            },
        }
    }
}
