use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use crosswind_core::{BuildMode, CONFIG_FILE};

#[derive(Parser, Debug)]
#[command(name = "crosswind")]
#[command(version)]
#[command(about = "Utility CSS generator, chunk-splitting bundler and dev server", long_about = None)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, global = true, default_value = CONFIG_FILE)]
    pub config: PathBuf,

    /// More log output (-v debug, -vv trace); RUST_LOG takes precedence
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Print the distinct candidate tokens found in content sources
    Scan,
    /// Generate the stylesheet only
    Css {
        /// Write to a file instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Production build: stylesheet, chunks and manifest
    Build {
        #[arg(long, value_enum, default_value_t = Mode::Production)]
        mode: Mode,
        /// Overrides `build.out_dir`
        #[arg(long)]
        out_dir: Option<PathBuf>,
        /// File names without content hashes
        #[arg(long)]
        readable: bool,
    },
    /// Print the module graph split into chunks
    Graph,
    /// Start the dev server
    Dev {
        #[arg(long)]
        host: Option<String>,
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    Production,
    Development,
}

impl From<Mode> for BuildMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Production => BuildMode::Production,
            Mode::Development => BuildMode::Development,
        }
    }
}
