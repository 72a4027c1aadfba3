pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "catalog",
    about = "Product catalog operator CLI",
    long_about = "Prepare the catalog database and inspect the configuration the server will run with.",
    after_help = "Examples:\n  catalog migrate\n  catalog seed\n  catalog --config deploy/catalog.toml config"
)]
pub struct Cli {
    #[arg(
        long,
        global = true,
        env = "CATALOG_CONFIG",
        help = "Config file to read instead of catalog.toml or config/catalog.toml"
    )]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Apply migrations, then insert the demo product catalog idempotently")]
    Seed,
    #[command(about = "Print the effective configuration with per-field source attribution")]
    Config,
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let config_path = cli.config.as_deref();

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(config_path),
        Command::Seed => commands::seed::run(config_path),
        Command::Config => commands::config::run(config_path),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
