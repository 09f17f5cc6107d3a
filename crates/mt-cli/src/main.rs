use std::fs;
use std::io::{self, Write};
use std::path::Path;

use anyhow::Context;
use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use mt_cli::{Cli, Commands, Config, commands};
use mt_db::Database;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match &cli.command {
        Some(Commands::Log(args)) => {
            let (mut db, _) = open_database(cli.config.as_deref())?;
            commands::log::run(&mut out, &mut db, args)
        }
        Some(Commands::Edit(args)) => {
            let (mut db, _) = open_database(cli.config.as_deref())?;
            commands::edit::run(&mut out, &mut db, args)
        }
        Some(Commands::Delete(args)) => {
            let (mut db, _) = open_database(cli.config.as_deref())?;
            commands::delete::run(&mut out, &mut db, args)
        }
        Some(Commands::Import(args)) => {
            let (mut db, _) = open_database(cli.config.as_deref())?;
            let stdin = io::stdin();
            commands::import::run(&mut out, stdin.lock(), &mut db, args)
        }
        Some(Commands::Events(args)) => {
            let (db, _) = open_database(cli.config.as_deref())?;
            let mut buffered = io::BufWriter::new(out);
            commands::events::run(&mut buffered, &db, args)?;
            if let Err(error) = buffered.flush() {
                if error.kind() != io::ErrorKind::BrokenPipe {
                    return Err(error).context("failed to flush output");
                }
            }
            Ok(())
        }
        Some(Commands::Stats(args)) => {
            let (db, _) = open_database(cli.config.as_deref())?;
            commands::stats::run(&mut out, &db, args)
        }
        Some(Commands::Sync(args)) => {
            let (mut db, config) = open_database(cli.config.as_deref())?;
            commands::sync::run(&mut out, &mut db, &config, args)
        }
        Some(Commands::Settings(args)) => {
            let (mut db, config) = open_database(cli.config.as_deref())?;
            commands::settings::run(&mut out, &mut db, &config, args)
        }
        Some(Commands::Status(args)) => {
            let (db, config) = open_database(cli.config.as_deref())?;
            commands::status::run(&mut out, &db, &config, args)
        }
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    }
}

fn open_database(config_path: Option<&Path>) -> anyhow::Result<(Database, Config)> {
    let config = Config::load(config_path).context("failed to load configuration")?;
    if let Some(parent) = config.database_path.parent() {
        fs::create_dir_all(parent).with_context(|| {
            format!("failed to create data directory {}", parent.display())
        })?;
    }
    let db = Database::open(&config.database_path).with_context(|| {
        format!("failed to open database at {}", config.database_path.display())
    })?;
    Ok((db, config))
}
