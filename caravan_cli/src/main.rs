use clap::{Parser, Subcommand};
use mimalloc::MiMalloc;

use crate::{demo::DemoArgs, solve::SolveArgs};

mod demo;
mod parsers;
mod report;
mod solve;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Solves a routing problem read from a JSON file
    Solve {
        #[command(flatten)]
        args: SolveArgs,
    },
    /// Solves the built-in 157 stop pickup and delivery instance
    Demo {
        #[command(flatten)]
        args: DemoArgs,
    },
}

fn main() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_max_level(if cli.debug {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .init();

    match cli.command {
        Commands::Solve { args } => solve::run(args)?,
        Commands::Demo { args } => demo::run(args)?,
    }

    Ok(())
}
