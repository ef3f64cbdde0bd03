mod catalog;
mod command;
mod config;
mod error;
mod executor;
mod menu;
mod model;
mod sources;

use crate::catalog::Catalog;
use crate::config::{default_config_path, language, load_config, locale_from_env};
use crate::sources::{DesktopSource, Source, application_dirs};
use anyhow::Result;
use clap::Parser;
use log::{info, warn};
use std::path::PathBuf;

/// Pick a desktop application with a menu and launch it
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file to use instead of the default location
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Locale for localized names, e.g. "de" or "pt_BR.UTF-8"
    #[arg(short, long)]
    locale: Option<String>,

    /// Print the resolved command instead of running it
    #[arg(long)]
    dry_run: bool,

    /// Print the menu entries and exit
    #[arg(long, conflicts_with = "dump")]
    list: bool,

    /// Print the deduplicated catalog as JSON and exit
    #[arg(long)]
    dump: bool,

    /// Extra arguments passed to the menu command
    #[arg(last = true)]
    menu_args: Vec<String>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    // 1. Load Config
    let config_path = args.config.clone().unwrap_or_else(default_config_path);
    let config = load_config(&config_path)?;
    let locale = match &args.locale {
        Some(locale) => language(locale),
        None => locale_from_env(),
    };

    // 2. Scan application roots
    let roots = application_dirs(&config.general.extra_dirs);
    info!("Scanning {} roots with locale {:?}", roots.len(), locale);
    let entries = DesktopSource::new(roots.clone(), locale).scan()?;

    // 3. Deduplicate
    let catalog = Catalog::merge(entries, &roots, Vec::new(), &config.general.excludes);
    if catalog.is_empty() {
        warn!("No applications found");
    }

    if args.dump {
        let entries: Vec<_> = catalog.into_map().into_values().collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    let names = menu::menu_names(&catalog, &config);
    if args.list {
        for name in &names {
            println!("{}", name);
        }
        return Ok(());
    }

    // 4. Ask the menu
    let Some(selected) = menu::select(&config.general.menu_command, &args.menu_args, &names)? else {
        info!("Nothing selected");
        return Ok(());
    };

    // 5. Launch
    if args.dry_run {
        let launch = executor::resolve(&selected, &config, &catalog)?;
        println!("{}", launch.argv.join(" "));
        if let Some(dir) = &launch.working_dir {
            println!("cwd: {}", dir.display());
        }
        return Ok(());
    }

    match executor::run(&selected, &config, &catalog)? {}
}
