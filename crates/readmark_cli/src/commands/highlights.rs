//! `highlights` subcommands.

use crate::config::Config;
use crate::output;
use crate::Ctx;
use clap::Subcommand;

/// Highlight management.
#[derive(Subcommand)]
pub enum HighlightCommands {
    /// List highlights for a bookmark
    List {
        /// Bookmark id
        bookmark_id: i64,
    },

    /// Create a highlight
    Add {
        /// Bookmark id
        bookmark_id: i64,
        /// Highlighted text
        text: String,
        /// Character position; omit to let the server place it
        #[arg(long)]
        position: Option<i64>,
    },

    /// Delete a highlight
    Delete {
        /// Highlight id
        id: i64,
    },
}

/// Dispatches a highlights subcommand.
pub fn run(ctx: &Ctx, config: &Config, command: HighlightCommands) -> i32 {
    let client = match ctx.build_client(config, true) {
        Ok(client) => client,
        Err(err) => return ctx.reporter.fail(&err),
    };
    let mut stdout = std::io::stdout();
    match command {
        HighlightCommands::List { bookmark_id } => match client.list_highlights(bookmark_id) {
            Ok(highlights) => {
                match output::print_highlights(&mut stdout, ctx.format, &highlights) {
                    Ok(()) => 0,
                    Err(err) => ctx.reporter.fail(&err),
                }
            }
            Err(err) => ctx.reporter.fail(&err.into()),
        },
        HighlightCommands::Add {
            bookmark_id,
            text,
            position,
        } => match client.create_highlight(bookmark_id, &text, position.unwrap_or(-1)) {
            Ok(highlight) => {
                match output::print_highlights(&mut stdout, ctx.format, &[highlight]) {
                    Ok(()) => 0,
                    Err(err) => ctx.reporter.fail(&err),
                }
            }
            Err(err) => ctx.reporter.fail(&err.into()),
        },
        HighlightCommands::Delete { id } => match client.delete_highlight(id) {
            Ok(()) => {
                if !ctx.quiet {
                    println!("Deleted highlight {id}");
                }
                0
            }
            Err(err) => ctx.reporter.fail(&err.into()),
        },
    }
}
