use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "reelgate")]
#[command(author, version, about = "Rate-limited, cached gateway to a movie metadata API")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the JSON API server
    Serve {
        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Fetch one page of a listing, e.g. `popular-movies`
    List {
        /// Listing name
        category: String,

        /// Page number
        #[arg(long, default_value = "1")]
        page: u32,
    },

    /// Fetch details, credits and videos for one title
    Details {
        /// `movie` or `tv`
        kind: String,

        /// Upstream title id
        id: u64,
    },

    /// Search titles
    Search {
        /// Free-text query
        query: String,

        /// Page number
        #[arg(long, default_value = "1")]
        page: u32,

        /// `movie`, `tv` or `multi`
        #[arg(long, default_value = "multi")]
        kind: String,
    },

    /// Type-ahead suggestions for a query
    Suggest {
        /// Free-text query
        query: String,
    },

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}
