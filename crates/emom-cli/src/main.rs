use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "emom-cli", version, about = "EMOM interval timer CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a workout in the foreground, printing events as JSON lines.
    ///
    /// While it runs, type `p` + Enter to pause or resume and `q` + Enter to stop.
    Run(commands::run::RunArgs),
    /// Workout totals and day streak
    Stats,
    /// Recorded workout sessions
    History {
        /// Include sessions that were started but never completed
        #[arg(long)]
        all: bool,
    },
    /// List the work/rest splits
    Splits,
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("EMOM_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_tracing();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Run(args) => commands::run::run(args),
        Commands::Stats => commands::stats::run(),
        Commands::History { all } => commands::history::run(all),
        Commands::Splits => commands::splits::run(),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
