//! `config` subcommands.

use crate::config::Config;
use crate::output;
use crate::Ctx;
use clap::Subcommand;

/// Config file management.
#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the config with secrets masked
    Show,

    /// Print one config value
    Get {
        /// Key, e.g. defaults.list_limit
        key: String,
    },

    /// Set one config value
    Set {
        /// Key, e.g. defaults.format
        key: String,
        /// New value
        value: String,
    },

    /// Reset one config value to its default
    Unset {
        /// Key
        key: String,
    },
}

/// Dispatches a config subcommand.
pub fn run(ctx: &Ctx, config: &mut Config, command: ConfigCommands) -> i32 {
    let mut stdout = std::io::stdout();
    match command {
        ConfigCommands::Show => {
            match output::write_json(&mut stdout, &config.redacted()) {
                Ok(()) => 0,
                Err(err) => ctx.reporter.fail(&err),
            }
        }
        ConfigCommands::Get { key } => match config.get_key(&key) {
            Ok(value) => match output::write_json_line(&mut stdout, &value) {
                Ok(()) => 0,
                Err(err) => ctx.reporter.fail(&err),
            },
            Err(err) => ctx.reporter.fail(&err),
        },
        ConfigCommands::Set { key, value } => {
            if let Err(err) = config.set_key(&key, &value) {
                return ctx.reporter.fail(&err);
            }
            match config.save(&ctx.config_path) {
                Ok(()) => 0,
                Err(err) => ctx.reporter.fail(&err),
            }
        }
        ConfigCommands::Unset { key } => {
            if let Err(err) = config.unset_key(&key) {
                return ctx.reporter.fail(&err);
            }
            match config.save(&ctx.config_path) {
                Ok(()) => 0,
                Err(err) => ctx.reporter.fail(&err),
            }
        }
    }
}
