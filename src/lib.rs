pub mod commands;
pub mod config;
pub mod model;
pub mod storage;
pub mod view;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use config::Config;
use std::path::PathBuf;
use view::{FilterMode, ViewMode};

/// Command-line interface.
#[derive(Parser, Debug)]
#[command(name = "zhist", version, about = "history command using sqlite")]
pub struct Cli {
    /// Path to the SQLite database (overrides zhist.toml)
    #[arg(long, env = "ZHIST_DB", global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize database
    Init,
    /// Add history to database
    Add {
        /// Command line as typed
        #[arg(short, long, allow_hyphen_values = true)]
        command: String,

        /// Directory the command ran in
        #[arg(short, long)]
        directory: String,

        /// Exit status of the command
        #[arg(short, long, allow_negative_numbers = true)]
        return_code: i32,
    },
    /// Load history file to database
    Load {
        /// History file name
        filename: PathBuf,
    },
    /// List history
    List(ListArgs),
}

#[derive(Args, Debug, Default)]
pub struct ListArgs {
    #[command(flatten)]
    pub filter: FilterFlags,

    #[command(flatten)]
    pub view: ViewFlags,
}

#[derive(Args, Debug, Default)]
#[group(multiple = false)]
pub struct FilterFlags {
    /// List all commands
    #[arg(short, long)]
    pub all: bool,

    /// List recent success commands
    #[arg(short, long)]
    pub recent: bool,
}

#[derive(Args, Debug, Default)]
#[group(multiple = false)]
pub struct ViewFlags {
    /// Escape newlines and tabs
    #[arg(short, long)]
    pub escape: bool,

    /// Emit `escaped<TAB>raw<NUL>` records for fzf
    #[arg(long)]
    pub fzf: bool,

    /// Omit multi-line commands, for zsh history files
    #[arg(long)]
    pub zsh_history: bool,
}

impl From<&FilterFlags> for FilterMode {
    fn from(flags: &FilterFlags) -> Self {
        if flags.all {
            Self::All
        } else if flags.recent {
            Self::Recent
        } else {
            Self::CurrentPath
        }
    }
}

impl From<&ViewFlags> for ViewMode {
    fn from(flags: &ViewFlags) -> Self {
        if flags.escape {
            Self::Escaped
        } else if flags.fzf {
            Self::Fzf
        } else if flags.zsh_history {
            Self::ZshHistory
        } else {
            Self::Normal
        }
    }
}

pub fn run(cli: Cli) -> Result<()> {
    let config = Config::load().with_db_path(cli.db);
    run_command(&config, cli.command)
}

pub fn run_command(config: &Config, command: Commands) -> Result<()> {
    match command {
        Commands::Init => commands::init(config),
        Commands::Add {
            command,
            directory,
            return_code,
        } => commands::add(config, &command, &directory, return_code),
        Commands::Load { filename } => commands::load(config, &filename).map(|_| ()),
        Commands::List(args) => {
            let cwd = std::env::current_dir().context("reading current directory")?;
            let stdout = std::io::stdout();
            commands::list(
                config,
                FilterMode::from(&args.filter),
                ViewMode::from(&args.view),
                &cwd,
                &mut stdout.lock(),
            )
        }
    }
}
