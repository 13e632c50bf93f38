//! Command-line argument parsing for codebuddy
//!
//! Provides clap-based CLI with subcommands and verbosity control.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// codebuddy - Chat with your codebase using local Ollama models
#[derive(Parser, Debug)]
#[command(name = "codebuddy")]
#[command(author = "Jerome (Kubashen) Naidoo")]
#[command(version)]
#[command(about = "Chat with your codebase: retrieval-augmented code analysis on local Ollama models", long_about = None)]
pub struct Args {
    /// Question about the codebase (runs the full index + ask pipeline)
    #[arg(value_name = "QUERY")]
    pub query: Option<String>,

    /// Corpus root for the full pipeline run
    #[arg(short, long, default_value = ".")]
    pub path: PathBuf,

    /// Chat model override
    #[arg(short, long)]
    pub model: Option<String>,

    /// Ollama host (overrides the config file)
    #[arg(long)]
    pub host: Option<String>,

    /// Ollama port (overrides the config file)
    #[arg(long)]
    pub port: Option<u16>,

    /// Verbosity level: -q (quiet), default (normal), -v (verbose)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress all output except results)
    #[arg(short, long)]
    pub quiet: bool,

    /// Subcommand
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Index a directory of source files into the vector store
    Index {
        /// Corpus root directory
        path: PathBuf,

        /// Drop any existing index before storing
        #[arg(long)]
        rebuild: bool,

        /// Chunk size in characters
        #[arg(long)]
        chunk_size: Option<usize>,

        /// Chunk overlap in characters
        #[arg(long)]
        chunk_overlap: Option<usize>,

        /// File extensions to accept (comma separated, e.g. .rs,.md)
        #[arg(long, value_delimiter = ',')]
        ext: Vec<String>,

        /// Save preprocessed document text into this directory
        #[arg(long)]
        save_docs: Option<PathBuf>,
    },

    /// Ask a question against the existing index
    Ask {
        /// The question
        query: String,

        /// Number of chunks to retrieve
        #[arg(short = 'k', long)]
        top_k: Option<usize>,

        /// Expand the answer with the elaboration prompt
        #[arg(long)]
        elaborate: bool,

        /// Also run the analysis agent over each retrieved document
        #[arg(long)]
        docs: bool,
    },

    /// Run the analysis workflow on a single file
    Analyze {
        /// Source file to analyze
        file: PathBuf,
    },

    /// Interactive chat over the indexed codebase
    Chat,

    /// List installed Ollama models
    Models,

    /// Run environment diagnostics
    Doctor,

    /// Display current configuration
    Config,
}

/// Verbosity level enum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
}

impl Args {
    /// Get verbosity level based on flags
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else if self.verbose > 0 {
            Verbosity::Verbose
        } else {
            Verbosity::Normal
        }
    }

    /// Check that a query or a subcommand (not both) was provided
    pub fn validate(&self) -> Result<(), String> {
        if self.command.is_none() && self.query.is_none() {
            return Err(
                "Query required. Use 'codebuddy <QUERY>' or run a subcommand; see --help."
                    .to_string(),
            );
        }

        if self.command.is_some() && self.query.is_some() {
            return Err("Cannot combine a query with a subcommand.".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_pipeline_invocation() {
        let args = Args::parse_from(["codebuddy", "What does the loader do?"]);
        assert_eq!(args.query.as_deref(), Some("What does the loader do?"));
        assert!(args.command.is_none());
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_query_required_without_subcommand() {
        let args = Args::parse_from(["codebuddy"]);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_query_conflicts_with_subcommand() {
        let mut args = Args::parse_from(["codebuddy", "models"]);
        args.query = Some("stray".to_string());
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_index_subcommand() {
        let args = Args::parse_from([
            "codebuddy", "index", "./src", "--rebuild", "--ext", ".rs,.toml",
        ]);

        match args.command {
            Some(Commands::Index {
                ref path,
                rebuild,
                ref ext,
                ..
            }) => {
                assert_eq!(path, &PathBuf::from("./src"));
                assert!(rebuild);
                assert_eq!(ext, &vec![".rs".to_string(), ".toml".to_string()]);
            }
            _ => panic!("expected index subcommand"),
        }
    }

    #[test]
    fn test_ask_subcommand_flags() {
        let args = Args::parse_from(["codebuddy", "ask", "how is config loaded?", "-k", "2", "--elaborate"]);

        match args.command {
            Some(Commands::Ask {
                ref query,
                top_k,
                elaborate,
                docs,
            }) => {
                assert_eq!(query, "how is config loaded?");
                assert_eq!(top_k, Some(2));
                assert!(elaborate);
                assert!(!docs);
            }
            _ => panic!("expected ask subcommand"),
        }
    }

    #[test]
    fn test_verbosity_levels() {
        let args = Args::parse_from(["codebuddy", "q"]);
        assert_eq!(args.verbosity(), Verbosity::Normal);

        let args = Args::parse_from(["codebuddy", "-v", "q"]);
        assert_eq!(args.verbosity(), Verbosity::Verbose);

        let args = Args::parse_from(["codebuddy", "-q", "q"]);
        assert_eq!(args.verbosity(), Verbosity::Quiet);
    }
}
