//! Load simulator CLI.
//!
//! Joins simulated participants to a meeting and keeps them connected until
//! Ctrl+C.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin nigiwai -- join "https://bbb.example.com/bigbluebutton/api/join?..." 10
//! cargo run --bin nigiwai -- custom-join --secret S --pw attendee 10 \
//!     --host https://bbb.example.com --meeting-id room1 --userdata "userdata-bbb_skip_check_audio=true"
//! ```

use clap::{Parser, Subcommand};

use nigiwai_shared::logger::setup_logger;
use nigiwai_simulator::{
    error::ValidationError,
    runner::{SimulatorConfig, custom_join_mode, join_mode, parse_participant_count, run_simulation},
};

#[derive(Parser, Debug)]
#[command(name = "nigiwai")]
#[command(about = "Load simulator joining many participants to a BigBlueButton meeting", long_about = None)]
struct Args {
    /// Default log level (overridden by RUST_LOG)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Join participants with an existing join URL
    Join {
        /// Join URL (http or https)
        join_url: String,

        /// Number of participants
        #[arg(value_parser = parse_count)]
        count: usize,

        /// Print per-participant progress
        #[arg(short, long)]
        verbose: bool,
    },
    /// Join participants with a join URL signed from the API secret
    CustomJoin {
        /// Shared secret of the server API
        #[arg(long, env = "NIGIWAI_SECRET", hide_env_values = true)]
        secret: String,

        /// Meeting password
        #[arg(long)]
        pw: String,

        /// Number of participants
        #[arg(value_parser = parse_count)]
        count: usize,

        /// Base URL of the server (e.g. https://bbb.example.com)
        #[arg(long, env = "NIGIWAI_HOST")]
        host: String,

        /// Meeting ID
        #[arg(long)]
        meeting_id: String,

        /// Extra join parameters as "key=value,key=value"
        #[arg(long)]
        userdata: Option<String>,

        /// Print per-participant progress
        #[arg(short, long)]
        verbose: bool,
    },
}

fn parse_count(value: &str) -> Result<usize, ValidationError> {
    parse_participant_count(value)
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), &args.log_level);

    let (mode, count, verbose) = match args.command {
        Command::Join {
            join_url,
            count,
            verbose,
        } => (join_mode(&join_url), count, verbose),
        Command::CustomJoin {
            secret,
            pw,
            count,
            host,
            meeting_id,
            userdata,
            verbose,
        } => (
            custom_join_mode(&host, &meeting_id, &pw, &secret, userdata.as_deref()),
            count,
            verbose,
        ),
    };

    let mode = match mode {
        Ok(mode) => mode,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let config = SimulatorConfig {
        verbose,
        ..SimulatorConfig::default()
    };
    let stopped = run_simulation(mode, count, config).await;
    tracing::debug!(stopped, "Simulator finished");
}
