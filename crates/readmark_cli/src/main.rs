//! Readmark CLI
//!
//! Command-line client for the Readmark read-later service.
//!
//! # Commands
//!
//! - `auth` - Log in (xAuth), inspect, or clear stored credentials
//! - `add` / `list` / `export` - Save and fetch bookmarks
//! - `progress`, `star`, `archive`, `move`, `delete`, `text` - Mutations
//! - `folders` / `highlights` - Folder and highlight management
//! - `config` - Inspect and edit the config file

mod commands;
mod config;
mod output;
mod report;

use clap::{Parser, Subcommand};
use config::{default_config_path, Config};
use output::Format;
use report::Reporter;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Largest list limit the server accepts.
pub const MAX_LIST_LIMIT: i64 = readmark_sync::MAX_PAGE_SIZE;

/// Readmark command-line client.
#[derive(Parser)]
#[command(name = "readmark")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the config file
    #[arg(global = true, long)]
    config: Option<PathBuf>,

    /// API base URL override
    #[arg(global = true, long)]
    api_base: Option<String>,

    /// Output format
    #[arg(global = true, short, long)]
    format: Option<Format>,

    /// HTTP timeout in seconds
    #[arg(global = true, long, default_value_t = 15)]
    timeout: u64,

    /// Retries for transient failures (0 disables)
    #[arg(global = true, long, default_value_t = 0)]
    retry: u32,

    /// Base backoff between retries, in milliseconds
    #[arg(global = true, long, default_value_t = 500)]
    retry_backoff_ms: u64,

    /// Suppress informational output
    #[arg(global = true, short, long)]
    quiet: bool,

    /// Enable verbose logging
    #[arg(global = true, short, long)]
    verbose: bool,

    /// Print what would happen without calling the server
    #[arg(global = true, long)]
    dry_run: bool,

    /// Emit errors on stderr as NDJSON
    #[arg(global = true, long)]
    json_errors: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage stored credentials
    Auth {
        #[command(subcommand)]
        command: commands::auth::AuthCommands,
    },

    /// Save a bookmark
    Add(commands::add::AddArgs),

    /// List bookmarks with optional incremental sync and filters
    List(commands::list::ListArgs),

    /// Walk everything and stream bookmarks as NDJSON
    Export(commands::export::ExportArgs),

    /// Record reading progress for a bookmark
    Progress {
        /// Bookmark id
        id: i64,
        /// Progress in 0..=1
        progress: f64,
        /// Unix timestamp of the update (defaults to now)
        #[arg(long)]
        timestamp: Option<i64>,
    },

    /// Star bookmarks
    Star(commands::bookmarks::IdsArgs),

    /// Remove the star from bookmarks
    Unstar(commands::bookmarks::IdsArgs),

    /// Archive bookmarks
    Archive(commands::bookmarks::IdsArgs),

    /// Move bookmarks back out of the archive
    Unarchive(commands::bookmarks::IdsArgs),

    /// Move a bookmark to a folder
    Move {
        /// Bookmark id
        id: i64,
        /// Destination folder (id or title)
        folder: String,
    },

    /// Permanently delete bookmarks
    Delete(commands::bookmarks::DeleteArgs),

    /// Fetch the processed article HTML
    Text {
        /// Bookmark id
        id: i64,
        /// Write HTML to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Manage folders
    Folders {
        #[command(subcommand)]
        command: commands::folders::FolderCommands,
    },

    /// Manage highlights
    Highlights {
        #[command(subcommand)]
        command: commands::highlights::HighlightCommands,
    },

    /// Inspect and edit the config file
    Config {
        #[command(subcommand)]
        command: commands::config_cmd::ConfigCommands,
    },
}

/// Resolved global options shared by every command.
pub struct Ctx {
    /// Output format.
    pub format: Format,
    /// Suppress informational output.
    pub quiet: bool,
    /// Print actions without calling the server.
    pub dry_run: bool,
    /// HTTP timeout.
    pub timeout: Duration,
    /// Extra attempts for transient failures.
    pub retry: u32,
    /// Base backoff between retries.
    pub retry_backoff: Duration,
    /// Resolved API base URL.
    pub api_base: String,
    /// Resolved config file path.
    pub config_path: PathBuf,
    /// Error reporter (structured-stderr toggle lives here).
    pub reporter: Reporter,
}

impl Ctx {
    /// Builds an API client from config plus global flags.
    ///
    /// With `require_auth` a stored token is mandatory; without it a
    /// token is attached only when present (bootstrap login runs
    /// unauthenticated).
    pub fn build_client(
        &self,
        config: &Config,
        require_auth: bool,
    ) -> Result<readmark_api::Client, report::CliError> {
        let (consumer_key, consumer_secret) = config.consumer_credentials();
        if consumer_key.is_empty() || consumer_secret.is_empty() {
            return Err(report::CliError::MissingConsumer);
        }
        if require_auth && !config.has_auth() {
            return Err(report::CliError::NotLoggedIn);
        }
        let token = if config.has_auth() {
            Some(readmark_api::Token::new(
                config.oauth_token.clone(),
                config.oauth_token_secret.clone(),
            ))
        } else {
            None
        };
        let mut client = readmark_api::Client::new(
            &self.api_base,
            consumer_key,
            consumer_secret,
            token,
            self.timeout,
        )?;
        if self.retry > 0 {
            client.set_retry(self.retry + 1, self.retry_backoff);
        }
        Ok(client)
    }
}

fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    std::process::exit(run(cli));
}

fn run(cli: Cli) -> i32 {
    let reporter = Reporter::new(cli.json_errors);

    let config_path = match cli.config.clone() {
        Some(path) => path,
        None => match default_config_path() {
            Ok(path) => path,
            Err(err) => return reporter.fail(&err),
        },
    };
    let mut config = match Config::load(&config_path) {
        Ok(config) => config,
        Err(err) => return reporter.fail(&err),
    };

    let format = match cli.format {
        Some(format) => format,
        None => match output::parse_format(&config.defaults.format) {
            Ok(format) => format,
            Err(_) => Format::Ndjson,
        },
    };
    let api_base = cli
        .api_base
        .clone()
        .unwrap_or_else(|| config.api_base.clone());

    let ctx = Ctx {
        format,
        quiet: cli.quiet,
        dry_run: cli.dry_run,
        timeout: Duration::from_secs(cli.timeout),
        retry: cli.retry,
        retry_backoff: Duration::from_millis(cli.retry_backoff_ms),
        api_base,
        config_path,
        reporter,
    };

    match cli.command {
        Commands::Auth { command } => commands::auth::run(&ctx, &mut config, command),
        Commands::Add(args) => commands::add::run(&ctx, &config, args),
        Commands::List(args) => commands::list::run(&ctx, &config, args),
        Commands::Export(args) => commands::export::run(&ctx, &config, args),
        Commands::Progress {
            id,
            progress,
            timestamp,
        } => commands::bookmarks::run_progress(&ctx, &config, id, progress, timestamp),
        Commands::Star(args) => {
            commands::bookmarks::run_mutation(&ctx, &config, commands::bookmarks::Action::Star, args)
        }
        Commands::Unstar(args) => commands::bookmarks::run_mutation(
            &ctx,
            &config,
            commands::bookmarks::Action::Unstar,
            args,
        ),
        Commands::Archive(args) => commands::bookmarks::run_mutation(
            &ctx,
            &config,
            commands::bookmarks::Action::Archive,
            args,
        ),
        Commands::Unarchive(args) => commands::bookmarks::run_mutation(
            &ctx,
            &config,
            commands::bookmarks::Action::Unarchive,
            args,
        ),
        Commands::Move { id, folder } => commands::bookmarks::run_move(&ctx, &config, id, &folder),
        Commands::Delete(args) => commands::bookmarks::run_delete(&ctx, &config, args),
        Commands::Text { id, output } => {
            commands::bookmarks::run_text(&ctx, &config, id, output.as_deref())
        }
        Commands::Folders { command } => commands::folders::run(&ctx, &config, command),
        Commands::Highlights { command } => commands::highlights::run(&ctx, &config, command),
        Commands::Config { command } => commands::config_cmd::run(&ctx, &mut config, command),
    }
}
