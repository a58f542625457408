use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Generate multiple-choice questions from documents with a language model.
///
/// Settings come from the environment (and `.env`); flags override them for
/// one run. Results are printed to stdout as JSON, logs go to stderr.
#[derive(Parser, Debug)]
#[command(name = "mcqgen", version, about = "Generate multiple-choice questions from documents")]
pub struct CliArgs {
    /// Config profile; env keys are looked up as {PROFILE}_{KEY} first
    #[arg(long, env = "MCQGEN_PROFILE", global = true)]
    pub profile: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate questions for one or more documents and store the results
    Generate {
        /// Documents to process, in order
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Questions (selected chunks) per document
        #[arg(long)]
        questions: Option<usize>,

        /// Maximum tokens per chunk
        #[arg(long)]
        chunk_size: Option<usize>,

        /// Tokens carried over between consecutive chunks
        #[arg(long)]
        overlap: Option<usize>,

        /// Seed for chunk selection, for reproducible runs
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Show how a document is chunked and which chunks would be picked
    Chunks {
        file: PathBuf,

        /// Seed for chunk selection
        #[arg(long)]
        seed: Option<u64>,
    },

    /// List stored question records, newest first
    List,

    /// Show a stored record
    Show {
        /// Record file name as printed by `list`
        record: String,

        /// Print the whole record instead of question summaries
        #[arg(long, conflicts_with = "reference")]
        full: bool,

        /// Print one entry, e.g. `mcq_results[0].questions[1]`
        #[arg(long = "ref")]
        reference: Option<String>,
    },

    /// Delete a stored record
    Delete {
        record: String,
    },

    /// Show which model the generator uses
    ModelInfo,

    /// Show the effective configuration (secrets redacted) and known profiles
    Config,
}
