//! EdgeRec CLI - trains CTR models from the command line.

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use edgerec_cli::{Cli, Commands};

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("edgerec=info".parse()?))
        .init();

    let cli = Cli::parse();

    info!("EdgeRec CLI starting...");

    match cli.command {
        Commands::Train(cmd) => {
            let report = cmd.run()?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    info!("EdgeRec CLI completed successfully");
    Ok(())
}
