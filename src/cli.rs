use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "shimmy",
    about = "Shimmy - a manager for script shims installed from versioned URLs",
    version,
    author
)]
pub struct Cli {
    /// Path to the script registry root (defaults to current directory)
    #[arg(short, long, global = true, default_value = ".")]
    pub root: String,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check installed scripts for newer versions and install them
    Update {
        /// Report available updates without installing them
        #[arg(long)]
        check: bool,

        /// Consider pre-release versions when picking the latest
        #[arg(long)]
        unstable: bool,

        /// Restrict the run to the named scripts
        #[arg(value_name = "NAME")]
        names: Vec<String>,
    },

    /// List installed scripts
    List,

    /// Install a script shim for a source URL
    Install {
        /// Override the script name derived from the URL
        #[arg(short, long)]
        name: Option<String>,

        /// Source URL, e.g. https://deno.land/x/udd@0.5.0/main.ts
        #[arg(value_name = "URL")]
        url: String,
    },

    /// Remove installed script shims
    Uninstall {
        /// Scripts to remove
        #[arg(value_name = "NAME", required = true)]
        names: Vec<String>,
    },
}
