//! deskrec CLI: drive the recording engine from the terminal.
//!
//! Usage:
//!   deskrec devices            List microphone input devices
//!   deskrec record [OPTIONS]   Record the desktop until Ctrl+C
//!   deskrec merge [OPTIONS]    Merge audio tracks into a video

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "deskrec",
    about = "Desktop recording orchestrated through an external encoder",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List microphone input devices
    Devices,

    /// Record the desktop (and optionally a microphone) until Ctrl+C
    Record {
        /// Output directory for this recording cycle
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Microphone device name to record alongside the screen
        #[arg(short, long)]
        mic: Option<String>,
    },

    /// Merge audio tracks into a video file's audio channel
    Merge {
        /// Base video file
        video: PathBuf,

        /// Merged output file
        #[arg(short, long)]
        output: PathBuf,

        /// Audio track as PATH=OFFSET_MS; repeatable
        #[arg(short, long = "track", value_name = "PATH=OFFSET_MS")]
        tracks: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = deskrec_common::config::AppConfig::load();

    let mut logging = config.logging.clone();
    if cli.verbose {
        logging.level = "debug".to_string();
    }
    deskrec_common::logging::init_logging(&logging);

    match cli.command {
        Commands::Devices => commands::devices::run(&config),
        Commands::Record { output, mic } => commands::record::run(output, mic, &config).await,
        Commands::Merge {
            video,
            output,
            tracks,
        } => commands::merge::run(video, output, tracks, &config).await,
    }
}
