use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indexq_core::query::translate::split_list;
use indexq_core::store::{SymbolRoles, OPTION_NAMES};
use indexq_core::Config;
use indexq_daemon::Method;
use std::path::PathBuf;

mod commands;
mod logging;
mod output;

#[derive(Parser)]
#[command(name = "indexq")]
#[command(about = "Symbol index query service for build index stores", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: ./.indexq.toml or ~/.config/indexq/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Service host
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// Service port
    #[arg(short, long, global = true)]
    pub port: Option<u16>,

    /// Build cache root to search for index stores
    #[arg(long, global = true, env = "INDEXQ_CACHE_ROOT")]
    pub cache_root: Option<PathBuf>,

    /// Output format: text, json
    #[arg(short, long, default_value = "text", global = true)]
    pub format: OutputFormat,

    /// Also write logs to this file, rotating by size
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the query service
    Serve {
        /// Close connections idle for this many seconds (0 = never)
        #[arg(long)]
        idle_timeout: Option<u64>,
    },

    /// Load a project's index (blocks until it is ready)
    Load {
        /// Project name, matched against build cache entries
        project: String,
    },

    /// Show the symbols recorded on one line of a file
    Symbols {
        /// Path to the source file (absolute, or relative to the service's directory)
        file: String,

        /// 1-based line number
        #[arg(allow_negative_numbers = true)]
        line: i64,
    },

    /// Find occurrences of a symbol by USR
    Occurrences {
        /// Unified Symbol Resolution id
        usr: String,

        /// Roles to include (e.g. -r reference -r call)
        #[arg(short = 'r', long = "role", default_values = ["reference", "definition"])]
        roles: Vec<String>,
    },

    /// Search symbol names
    Search {
        /// Name pattern
        pattern: String,

        /// Match options: anchorStart, anchorEnd, subsequence, ignoreCase
        #[arg(short = 'o', long = "option")]
        options: Vec<String>,
    },

    /// List build cache entries and their index stores
    Stores {
        /// Only entries whose name contains this
        project: Option<String>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Text,
    /// Raw JSON responses
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(&cli)?;

    // Initialize logging
    let level = if std::env::var("INDEXQ_DEBUG").is_ok() {
        "debug"
    } else if cli.verbose || matches!(cli.command, Commands::Serve { .. }) {
        "info"
    } else {
        "warn"
    };
    logging::init(level, &config.log)?;
    tracing::debug!("Using config: {:?}", config);

    match cli.command {
        Commands::Serve { idle_timeout } => {
            let mut config = config;
            if let Some(idle_timeout) = idle_timeout {
                config.daemon.idle_timeout = idle_timeout;
            }
            commands::serve::run(config).await?;
        }
        Commands::Load { project } => {
            commands::query::run(&config, Method::IsAvailable, &[("projectName", project.as_str())], cli.format).await?;
        }
        Commands::Symbols { file, line } => {
            commands::query::symbols(&config, &file, line, cli.format).await?;
        }
        Commands::Occurrences { usr, roles } => {
            let roles = roles.join(",");
            commands::query::warn_unknown("role", &split_list(&roles), &SymbolRoles::all().names());
            commands::query::run(
                &config,
                Method::GetOccurrences,
                &[("usr", usr.as_str()), ("roles", roles.as_str())],
                cli.format,
            )
            .await?;
        }
        Commands::Search { pattern, options } => {
            let options = options.join(",");
            commands::query::warn_unknown("option", &split_list(&options), OPTION_NAMES);
            let mut params = vec![("pattern", pattern.as_str())];
            if !options.is_empty() {
                params.push(("options", options.as_str()));
            }
            commands::query::run(&config, Method::SearchPattern, &params, cli.format).await?;
        }
        Commands::Stores { project } => {
            commands::stores::list(&config, project.as_deref().unwrap_or(""))?;
        }
    }

    Ok(())
}

/// Config file plus command-line overrides
fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::load(),
    };

    if let Some(host) = &cli.host {
        config.daemon.host = host.clone();
    }
    if let Some(port) = cli.port {
        config.daemon.port = port;
    }
    if let Some(cache_root) = &cli.cache_root {
        config.store.cache_root = Some(cache_root.clone());
    }
    if let Some(log_file) = &cli.log_file {
        config.log.file = Some(log_file.clone());
    }

    Ok(config)
}
