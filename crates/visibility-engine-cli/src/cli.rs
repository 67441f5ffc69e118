use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Compute when scheduled content blocks next change visibility.
///
/// Reads content blocks as JSON (the host's parsed-block format) and prints
/// results as JSON on stdout. Diagnostics go to stderr; set RUST_LOG to see
/// them.
#[derive(Parser, Debug)]
#[command(name = "visibility-schedule", version, about)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the next visibility transition of the content
    Next(EvalArgs),

    /// Print the next N transitions, following the wake-up chain
    Upcoming {
        #[command(flatten)]
        eval: EvalArgs,

        /// Number of transitions to list
        #[arg(long, short = 'n', default_value = "5")]
        count: usize,
    },

    /// Print the enabled schedules found in the content, in document order
    Extract(InputArgs),

    /// Force off the visibility controls that cannot work behind an edge cache
    RestrictSettings(InputArgs),
}

#[derive(Args, Debug)]
pub struct InputArgs {
    /// JSON input file ("-" or omitted reads stdin)
    #[arg(long, short = 'i')]
    pub input: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct EvalArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Reference instant, RFC 3339 (default: current system time)
    #[arg(long)]
    pub now: Option<String>,

    /// IANA timezone for wall-clock rules
    #[arg(long, short = 'z', default_value = "UTC")]
    pub timezone: String,
}
