use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use spdlog::{info, warn};

use postfolio::export::{export_site, public_slugs};
use postfolio::logger::configure_logger;
use postfolio::repository::open_repository;
use postfolio::server::server_run;

use crate::config::{default_config_path, open_config};
use crate::config_data::write_sample_cfg;

mod config;
mod config_data;

const CFG_FILE_NAME: &str = "postfolio.toml";

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Config path
    #[arg(short, long)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Default)]
enum Command {
    /// Serves the site (default)
    #[default]
    Serve,
    /// Writes the static site into the export directory
    Export {
        /// Overrides the export directory of the configuration
        #[arg(short, long)]
        out_dir: Option<String>,
    },
    /// Prints the slug of every public post
    Slugs,
    /// Writes a sample configuration file
    InitConfig {
        /// Replaces an existing file
        #[arg(short, long)]
        force: bool,
    },
}

#[ntex::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config_path = args.config_path.map(PathBuf::from);
    let command = args.command.unwrap_or_default();

    if let Command::InitConfig { force } = command {
        let target = config_path.unwrap_or_else(default_config_path);
        if target.exists() && !force {
            return Err(anyhow!("{} already exists. Use --force to replace it", target.display()));
        }
        write_sample_cfg(&target)?;
        println!("Sample configuration written to {}", target.display());
        return Ok(());
    }

    let mut config = match open_config(config_path) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{}", err);
            eprintln!("Please run postfolio --help");
            return Ok(());
        }
    };

    if let Err(err) = configure_logger(&config) {
        warn!("Error creating logger sinks. Using console instead. Desc={}", err);
    }

    let repo = open_repository(&config).await
        .map_err(|e| anyhow!("Error opening the content source: {}", e))?;

    match command {
        Command::Serve => {
            info!("Starting Postfolio =-=-=-=-=-=-=-=-=-=-=-=-=-=-=-");
            info!("Listening on {}:{}", config.server.address, config.server.port);
            server_run(config, repo).await?;
        }
        Command::Export { out_dir } => {
            if let Some(out_dir) = out_dir {
                config.paths.export_dir = PathBuf::from(out_dir);
            }
            let summary = export_site(&config, &*repo).await?;
            println!("Exported {} pages and {} assets to {}",
                     summary.pages, summary.assets, config.paths.export_dir.display());
            for slug in summary.skipped {
                println!("Skipped {}", slug);
            }
        }
        Command::Slugs => {
            for slug in public_slugs(&*repo).await? {
                println!("{}", slug);
            }
        }
        Command::InitConfig { .. } => unreachable!("handled before loading the configuration"),
    }

    Ok(())
}
