use clap::{Parser, Subcommand};

mod commands;
mod scenario;

#[derive(Parser)]
#[command(
    name = "storctl",
    about = "StorGrid: replica placement for replicated block storage",
    version,
    propagate_version = true,
)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Select storage pools for new replicas.
    ///
    /// Fails with "insufficient eligible storage pools" when no
    /// combination satisfies the filter.
    Select {
        /// Scenario file (TOML)
        #[arg(short, long)]
        scenario: String,
        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
        /// Give up after this many milliseconds (treated as infeasible)
        #[arg(long)]
        timeout_ms: Option<u64>,
    },
    /// Pick the node to remove a replica from.
    Deselect {
        /// Scenario file (TOML); its candidates are the pools in use
        #[arg(short, long)]
        scenario: String,
        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("storgrid={level}").parse()?)
                .add_directive(format!("storctl={level}").parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Select {
            scenario,
            format,
            timeout_ms,
        } => commands::select::select(&scenario, &format, timeout_ms),
        Commands::Deselect { scenario, format } => {
            commands::deselect::deselect(&scenario, &format)
        }
    }
}
