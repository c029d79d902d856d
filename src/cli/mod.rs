use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::level_filters::LevelFilter;

use crate::{
    api,
    utils::{
        dir::create_application_default_path,
        logging::{enable_logging, SERVER_PREFIX},
    },
};

#[derive(Parser, Debug)]
#[command(name = "Devtimer", version, long_about = None)]
#[command(about = "Self-hosted time tracking API for coding activity", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(long, help = "Mirror logging to the console")]
    log: bool,
}

#[derive(Subcommand, Debug)]
#[command(version, about, long_about = None)]
enum Commands {
    #[command(about = "Run the API server in the current console")]
    Serve {
        #[arg(
            long,
            help = "Application directory. By default tries to save into $XDG_STATE_HOME or $HOME/.local/state"
        )]
        dir: Option<PathBuf>,
        #[arg(long, default_value_t = 7169, help = "Port the API listens on")]
        port: u16,
    },
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();

    let logging_level = if args.log {
        Some(LevelFilter::TRACE)
    } else {
        None
    };

    match args.commands {
        Commands::Serve { dir, port } => {
            let dir = dir.map_or_else(create_application_default_path, Ok)?;
            enable_logging(SERVER_PREFIX, &dir, logging_level, args.log)?;
            api::serve(dir, port).await
        }
    }
}
