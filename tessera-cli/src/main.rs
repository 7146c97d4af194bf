//! Tessera CLI - Command-line interface for Tessera migrations.

use clap::Parser;

use tessera_cli::cli::{Cli, Command};
use tessera_cli::commands;
use tessera_cli::error::CliResult;
use tessera_cli::{logging, output};

#[tokio::main]
async fn main() {
    logging::init();

    let code = match run().await {
        Ok(code) => code,
        Err(e) => {
            output::newline();
            let hint = e.hint();
            eprintln!("{:?}", miette::Report::new(e));
            if let Some(hint) = hint {
                output::dim(hint);
            }
            1
        }
    };

    std::process::exit(code);
}

async fn run() -> CliResult<i32> {
    let cli = Cli::parse();

    match cli.command {
        Command::Migrate(args) => commands::migrate::run(args).await,
        Command::Db(args) => commands::db::run(args).await,
    }
}
