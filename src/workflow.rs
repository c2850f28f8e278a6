use crate::error::{Result, ShimmyError};
use crate::installer::{Installer, ShimInstaller};
use crate::manifest::ManifestStore;
use crate::registry::RegistryFactory;
use crate::report::Reporter;
use crate::settings::Settings;
use crate::source::SourceRef;
use crate::update::{Filter, Mode, UpdateEngine};
use colored::Colorize;
use std::path::Path;
use std::sync::Arc;

/// Execute the update workflow (check or apply)
pub fn execute_update<P: AsRef<Path>>(
    root: P,
    check_only: bool,
    unstable: bool,
    names: Vec<String>,
) -> Result<()> {
    let root = root.as_ref();
    let mode = if check_only { Mode::Check } else { Mode::Apply };

    let headline = if check_only {
        "Checking for script updates..."
    } else {
        "Updating installed scripts..."
    };
    println!("{}", headline.cyan().bold());

    println!("\n{}", "1. Loading registry manifest...".yellow());
    let manifest = ManifestStore::new(root).load()?;
    println!(
        "{}",
        format!("✓ Found {} managed script(s)", manifest.len()).green()
    );

    println!("\n{}", "2. Reading configuration...".yellow());
    let settings = Settings::load(root)?;
    println!("{}", "✓ Configuration loaded".green());

    println!("\n{}", "3. Resolving latest versions...".yellow());
    let registry = RegistryFactory::create_router(settings.timeout())?;
    let installer = Arc::new(ShimInstaller::new(root, settings.runtime.clone()));
    let engine = UpdateEngine::new(registry, installer)
        .include_unstable(unstable || settings.resolver.include_unstable)
        .jobs(settings.resolver.jobs);

    let filter = if names.is_empty() {
        Filter::All
    } else {
        Filter::Names(names)
    };

    let candidates = engine.run(&manifest, &filter, mode);

    if Reporter::is_quiet(&candidates) {
        println!(
            "\n{}",
            "✨ All selected scripts are up to date!".green().bold()
        );
        return Ok(());
    }

    println!();
    Reporter::print(&candidates, mode);

    let updates = Reporter::update_count(&candidates);
    let failures = Reporter::failure_count(&candidates);

    match mode {
        Mode::Check => {
            println!("\n{}", format!("Found {} update(s)", updates).yellow());
            if updates > 0 {
                println!("{}", "To apply these updates, run:".dimmed());
                println!("  {}", "shimmy update".cyan());
            }
        }
        Mode::Apply => {
            println!("\n{}", format!("Applied {} update(s)", updates).green());
        }
    }

    if failures > 0 {
        println!("{}", format!("{} script(s) failed", failures).red());
    }

    Ok(())
}

/// Execute the list workflow - display all managed scripts
pub fn execute_list<P: AsRef<Path>>(root: P) -> Result<()> {
    println!("{}", "Listing installed scripts...".cyan().bold());

    let manifest = ManifestStore::new(root).load()?;

    if manifest.is_empty() {
        println!("\n{}", "No scripts installed".yellow());
        return Ok(());
    }

    println!();
    for script in manifest.scripts() {
        match script.source.pinned_version() {
            Some(version) => println!("  {} {}", script.name.cyan(), version.dimmed()),
            None => println!("  {}", script.name.cyan()),
        }
    }

    println!(
        "\n{}",
        format!("{} script(s) installed", manifest.len()).yellow()
    );

    Ok(())
}

/// Install a single script shim from a source URL
pub fn execute_install<P: AsRef<Path>>(root: P, name: Option<String>, url: &str) -> Result<()> {
    let root = root.as_ref();
    println!("{}", "Installing script shim...".cyan().bold());

    let source = SourceRef::parse(url)?;
    let name = match name {
        Some(name) => name,
        None => source.script_name().ok_or_else(|| {
            ShimmyError::Install(format!(
                "cannot derive a script name from '{}'; pass --name",
                url
            ))
        })?,
    };

    let settings = Settings::load(root)?;
    let installer = ShimInstaller::new(root, settings.runtime.clone());
    installer.install(&name, &source)?;

    println!(
        "{}",
        format!("✓ Installed '{}' from {}", name, source).green()
    );

    Ok(())
}

/// Remove script shims; unknown names are reported per entry, not fatal
pub fn execute_uninstall<P: AsRef<Path>>(root: P, names: &[String]) -> Result<()> {
    let root = root.as_ref();
    println!("{}", "Removing script shims...".cyan().bold());

    let settings = Settings::load(root)?;
    let installer = ShimInstaller::new(root, settings.runtime.clone());

    let mut failures = 0;
    for name in names {
        match installer.uninstall(name) {
            Ok(()) => println!("  {}", format!("✓ Removed '{}'", name).green()),
            Err(e) => {
                failures += 1;
                println!("  {}", format!("✗ {}", e).red());
            }
        }
    }

    if failures > 0 {
        println!("\n{}", format!("{} removal(s) failed", failures).red());
    }

    Ok(())
}
