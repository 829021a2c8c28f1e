use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "plugin-sorter", version)]
#[command(about = "Sort Bukkit plugin jars into a versioned repository and report the server versions they target")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Directory every staging and repository path must stay inside
    /// (default: $PLUGIN_SORTER_ROOT, else the current directory).
    #[arg(long, value_name = "DIR", global = true)]
    pub root: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Move every jar from the staging folder into plugins/<Name>/<version>/.
    Sort {
        /// Staging folder, relative to the root.
        #[arg(long, value_name = "DIR")]
        folder: Option<String>,

        #[arg(long, value_enum, default_value_t = ConflictPolicy::Prompt)]
        on_conflict: ConflictPolicy,
    },
    /// Print the server versions each jar's bytecode references.
    Report {
        /// Directory to scan recursively (default: the repository).
        #[arg(long, value_name = "DIR")]
        path: Option<PathBuf>,

        /// Worker threads (default: available parallelism).
        #[arg(short = 'j', long, value_name = "N")]
        workers: Option<usize>,

        #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum ConflictPolicy {
    Prompt,
    Overwrite,
    Skip,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}
