use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "hardmode-cli", version, about = "75-day challenge tracker CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Program setup wizard
    Onboard {
        #[command(subcommand)]
        action: commands::onboard::OnboardAction,
    },
    /// Log tasks against the current day
    Log {
        /// User handle
        user: String,
        #[command(subcommand)]
        action: commands::log::LogAction,
    },
    /// Show today's checklist
    Status {
        /// User handle
        user: String,
    },
    /// Run one rollover check across all users
    Rollover {
        /// Evaluate at this RFC 3339 instant instead of now
        #[arg(long)]
        at: Option<String>,
    },
    /// Run one reminder-alert check across all users
    Alerts {
        /// Evaluate at this RFC 3339 instant instead of now
        #[arg(long)]
        at: Option<String>,
        /// Also run the near-deadline final warning
        #[arg(long)]
        deadline: bool,
    },
    /// Run the schedulers on an hourly loop
    Daemon,
    /// Engine configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Onboard { action } => commands::onboard::run(action),
        Commands::Log { user, action } => commands::log::run(&user, action),
        Commands::Status { user } => commands::status::run(&user),
        Commands::Rollover { at } => commands::rollover::run(at.as_deref()),
        Commands::Alerts { at, deadline } => commands::alerts::run(at.as_deref(), deadline),
        Commands::Daemon => commands::daemon::run(),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
