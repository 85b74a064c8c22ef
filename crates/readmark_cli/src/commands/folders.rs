//! `folders` subcommands.

use crate::config::Config;
use crate::output;
use crate::Ctx;
use clap::Subcommand;

/// Folder management.
#[derive(Subcommand)]
pub enum FolderCommands {
    /// List folders
    List,

    /// Create a folder
    Add {
        /// Folder title
        title: String,
    },

    /// Delete a folder (bookmarks move back to the default folder)
    Delete {
        /// Folder id
        id: i64,
    },

    /// Reorder folders; pairs of folder_id:position joined by commas
    SetOrder {
        /// Order spec, e.g. 100:1,200:2
        order: String,
    },
}

/// Dispatches a folders subcommand.
pub fn run(ctx: &Ctx, config: &Config, command: FolderCommands) -> i32 {
    let client = match ctx.build_client(config, true) {
        Ok(client) => client,
        Err(err) => return ctx.reporter.fail(&err),
    };
    let mut stdout = std::io::stdout();
    match command {
        FolderCommands::List => match client.list_folders() {
            Ok(folders) => match output::print_folders(&mut stdout, ctx.format, &folders) {
                Ok(()) => 0,
                Err(err) => ctx.reporter.fail(&err),
            },
            Err(err) => ctx.reporter.fail(&err.into()),
        },
        FolderCommands::Add { title } => match client.add_folder(&title) {
            Ok(folder) => match output::print_folders(&mut stdout, ctx.format, &[folder]) {
                Ok(()) => 0,
                Err(err) => ctx.reporter.fail(&err),
            },
            Err(err) => ctx.reporter.fail(&err.into()),
        },
        FolderCommands::Delete { id } => match client.delete_folder(id) {
            Ok(()) => {
                if !ctx.quiet {
                    println!("Deleted folder {id}");
                }
                0
            }
            Err(err) => ctx.reporter.fail(&err.into()),
        },
        FolderCommands::SetOrder { order } => match client.set_folder_order(&order) {
            Ok(folders) => match output::print_folders(&mut stdout, ctx.format, &folders) {
                Ok(()) => 0,
                Err(err) => ctx.reporter.fail(&err),
            },
            Err(err) => ctx.reporter.fail(&err.into()),
        },
    }
}
