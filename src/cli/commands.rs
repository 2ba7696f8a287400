use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Organization-wide GitHub technology inventory scanner
#[derive(Parser, Debug)]
#[command(
    name = "stackscan",
    about = "Organization-wide GitHub technology inventory scanner",
    version,
    author,
    long_about = "stackscan walks an organization's repositories through the GitHub \
                  GraphQL API in batches, extracts technology signals (languages, \
                  frameworks, IaC, CI/CD) and writes one aggregated JSON inventory \
                  to S3 or a local file. Configuration comes from the environment; \
                  flags override individual values."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(
        short = 'v',
        long,
        global = true,
        help = "Increase verbosity (can be used multiple times)"
    )]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Quiet mode - suppress non-error output"
    )]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(
        about = "Run a full inventory scan",
        long_about = "Resolves credentials, walks the organization's repository list \
                      page by page and writes the aggregated inventory document.\n\n\
                      Examples:\n  \
                      stackscan scan\n  \
                      stackscan scan --org acme --batch-size 50\n  \
                      stackscan scan --local --output /tmp/repositories.json"
    )]
    Scan(ScanArgs),

    #[command(
        about = "Check configuration and credential access",
        long_about = "Validates the environment configuration and verifies that the \
                      credential payload can be resolved, without issuing any \
                      repository queries.\n\n\
                      Examples:\n  \
                      stackscan check"
    )]
    Check(CheckArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct ScanArgs {
    #[arg(long, value_name = "ORG", help = "Organization slug (overrides GITHUB_ORG)")]
    pub org: Option<String>,

    #[arg(
        short = 'b',
        long,
        value_name = "N",
        help = "Repositories per page (overrides BATCH_SIZE)"
    )]
    pub batch_size: Option<u32>,

    #[arg(
        long,
        value_name = "N",
        help = "Attempts per page before giving up (overrides MAX_RETRIES)"
    )]
    pub max_retries: Option<u32>,

    #[arg(
        long,
        help = "Force the local-file destination regardless of ENVIRONMENT"
    )]
    pub local: bool,

    #[arg(
        short = 'o',
        long,
        value_name = "FILE",
        help = "Local output path (implies --local)"
    )]
    pub output: Option<PathBuf>,

    #[arg(
        long,
        value_name = "SECONDS",
        help = "Abort instead of retrying past this whole-run deadline"
    )]
    pub deadline_secs: Option<u64>,
}

#[derive(Parser, Debug, Clone)]
pub struct CheckArgs {}
