mod cli;
mod error;
mod installer;
mod manifest;
mod registry;
mod report;
mod settings;
mod source;
mod update;
mod workflow;

use clap::Parser;
use cli::{Cli, Commands};
use colored::Colorize;
use std::process;

fn main() {
    let cli = Cli::parse();

    if cli.verbose {
        unsafe {
            std::env::set_var("SHIMMY_VERBOSE", "1");
        }
    }

    let result = match cli.command {
        Commands::Update {
            check,
            unstable,
            names,
        } => workflow::execute_update(&cli.root, check, unstable, names),
        Commands::List => workflow::execute_list(&cli.root),
        Commands::Install { name, url } => workflow::execute_install(&cli.root, name, &url),
        Commands::Uninstall { names } => workflow::execute_uninstall(&cli.root, &names),
    };

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        process::exit(1);
    }
}
