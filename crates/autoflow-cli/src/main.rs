#![forbid(unsafe_code)]

mod cmd;
mod output;

use autoflow_core::config::resolve_config;
use clap::{CommandFactory, Parser, Subcommand};
use output::OutputMode;
use std::env;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "af: drag reorder engine for AutoFlow boards",
    long_about = None
)]
struct Cli {
    #[arg(short, long)]
    verbose: bool,

    #[arg(long, global = true)]
    json: bool,

    /// Suppress the board echo after move and replay commands.
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Read",
        about = "Show a board",
        long_about = "Show every column of a board file with its cards and WIP status.",
        after_help = "EXAMPLES:\n    # Show a board\n    af show board.json\n\n    # Emit machine-readable output\n    af show board.json --json"
    )]
    Show(cmd::show::ShowArgs),

    #[command(
        next_help_heading = "Reorder",
        about = "Move a card",
        long_about = "Move a card to a column and insertion index, as a completed drag would.\n\
                      The index is counted before the card is removed from its column.",
        after_help = "EXAMPLES:\n    # Move card 3 in front of the card at index 1 of `todo`\n    af move board.json --item 3 --to todo --index 1\n\n    # Append to another column and save\n    af move board.json --item 3 --to done --write\n\n    # Emit machine-readable output\n    af move board.json --item 3 --to done --json"
    )]
    Move(cmd::move_cmd::MoveArgs),

    #[command(
        next_help_heading = "Reorder",
        about = "Move a column",
        long_about = "Move a column to a new position on the board.\n\
                      The index is counted before the column is removed.",
        after_help = "EXAMPLES:\n    # Make `done` the first column\n    af move-column board.json --container done --index 0\n\n    # Save the result\n    af move-column board.json --container done --index 0 --write"
    )]
    MoveColumn(cmd::move_cmd::MoveColumnArgs),

    #[command(
        next_help_heading = "Reorder",
        about = "Replay a gesture script",
        long_about = "Feed a recorded pointer-event script through the drag session controller\n\
                      and report every transition. With --write, each commit is saved as it\n\
                      happens; a failed save rolls the board back and aborts the replay.",
        after_help = "EXAMPLES:\n    # Dry-run a script\n    af replay board.json gestures.json\n\n    # Persist commits\n    af replay board.json gestures.json --write\n\n    # Emit machine-readable output\n    af replay board.json gestures.json --json"
    )]
    Replay(cmd::replay::ReplayArgs),

    #[command(
        next_help_heading = "Development",
        about = "Deterministic simulation campaigns",
        long_about = "Run or replay deterministic drag-gesture simulations checked by the reorder oracle.",
        after_help = "EXAMPLES:\n    # Run 100 seeds\n    af sim run --seeds 100\n\n    # Replay one seed\n    af sim replay --seed 7"
    )]
    Sim(cmd::sim::SimArgs),

    #[command(
        next_help_heading = "Development",
        about = "Generate shell completion scripts",
        long_about = "Generate shell completion scripts for supported shells.",
        after_help = "EXAMPLES:\n    # Generate bash completions\n    af completions bash\n\n    # Generate zsh completions\n    af completions zsh"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("AUTOFLOW_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "autoflow=debug,info"
        } else {
            "autoflow=info,warn"
        })
    });

    let format = env::var("AUTOFLOW_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    // Logs go to stderr so stdout stays parseable.
    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.verbose {
        info!("Verbose mode enabled");
    }

    let project_root = env::current_dir()?;
    let config = match resolve_config(&project_root, cli.json) {
        Ok(config) => config,
        Err(err) => {
            let output = if cli.json {
                OutputMode::Json
            } else {
                OutputMode::Text
            };
            return Err(cmd::fail_config(output, err));
        }
    };
    let output = OutputMode::from_resolved(&config.resolved_output);
    debug!(?output, "output mode resolved");

    match cli.command {
        Commands::Show(ref args) => cmd::show::run_show(args, output),
        Commands::Move(ref args) => cmd::move_cmd::run_move(args, output, cli.quiet),
        Commands::MoveColumn(ref args) => {
            cmd::move_cmd::run_move_column(args, output, cli.quiet)
        }
        Commands::Replay(ref args) => {
            cmd::replay::run_replay(args, &config.engine, output, cli.quiet)
        }
        Commands::Sim(ref args) => cmd::sim::run_sim(args, output),
        Commands::Completions(ref args) => {
            let mut command = Cli::command();
            cmd::completions::run_completions(args.shell, &mut command)
        }
    }
}
