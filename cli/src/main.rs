use clap::{Parser, Subcommand};
use habitlog_core::config::TIMEZONE_ENV;
use habitlog_core::{Engine, EngineConfig};

mod commands;
mod util;

#[derive(Parser)]
#[command(
    name = "habitlog",
    version,
    about = "Habitlog CLI: run the habit validation engine over JSON snapshots and tool calls"
)]
struct Cli {
    /// Reference timezone for log timestamps (IANA name)
    #[arg(long, global = true, env = TIMEZONE_ENV)]
    timezone: Option<String>,

    /// Emit logs as JSON on stderr
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the agent tool definitions
    Tools,
    /// Show what the engine knows about a store snapshot
    Context {
        /// Snapshot JSON file (use '-' for stdin)
        #[arg(long)]
        snapshot: String,
    },
    /// Run one create_habit batch against a snapshot
    Create {
        /// Snapshot JSON file (use '-' for stdin)
        #[arg(long)]
        snapshot: String,
        /// Creation batch JSON file
        #[arg(long)]
        file: String,
        /// Unpersisted delta from an earlier run to continue from
        #[arg(long)]
        delta: Option<String>,
    },
    /// Run one insert_habit_data batch against a snapshot
    Log {
        /// Snapshot JSON file (use '-' for stdin)
        #[arg(long)]
        snapshot: String,
        /// Logging batch JSON file
        #[arg(long)]
        file: String,
        /// Unpersisted delta from an earlier run to continue from
        #[arg(long)]
        delta: Option<String>,
    },
    /// Replay a sequence of agent tool calls through one session
    Replay {
        /// Snapshot JSON file (use '-' for stdin)
        #[arg(long)]
        snapshot: String,
        /// JSON list of {"name", "arguments"} tool calls
        #[arg(long)]
        calls: String,
        /// Unpersisted delta from an earlier run to continue from
        #[arg(long)]
        delta: Option<String>,
    },
}

fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    util::init_tracing(cli.log_json);

    let file_config = util::load_cli_config(&util::config_path());
    let engine = Engine::new(EngineConfig {
        timezone: util::resolve_timezone(cli.timezone, file_config.as_ref()),
    });
    tracing::debug!(timezone = %engine.config().timezone, "engine configured");

    let code = match cli.command {
        Commands::Tools => commands::tools::run(),
        Commands::Context { snapshot } => commands::context::run(&snapshot),
        Commands::Create {
            snapshot,
            file,
            delta,
        } => commands::batch::create(&engine, &snapshot, &file, delta.as_deref()),
        Commands::Log {
            snapshot,
            file,
            delta,
        } => commands::batch::log(&engine, &snapshot, &file, delta.as_deref()),
        Commands::Replay {
            snapshot,
            calls,
            delta,
        } => commands::replay::run(&engine, &snapshot, &calls, delta.as_deref()),
    };

    std::process::exit(code);
}
