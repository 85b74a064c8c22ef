//! `export` command: full walk streamed as NDJSON, page by page.
//!
//! Unlike `list`, pages are written as they arrive and never accumulate
//! in memory; the cursor still sees every page, deletions included.

use crate::commands::resolve_folder_id;
use crate::config::Config;
use crate::Ctx;
use clap::Args;
use readmark_api::Bookmark;
use readmark_sync::{
    list_bookmarks, resolve_cursor_path, ListParams, SyncError, DEFAULT_MAX_PAGES,
};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

/// Flags for exporting bookmarks.
#[derive(Args)]
pub struct ExportArgs {
    /// Write NDJSON to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Folder: unread|starred|archive|<id>|"Title"
    #[arg(long, default_value = "unread")]
    pub folder: String,

    /// Tag name (when set, the folder is ignored)
    #[arg(long, default_value = "")]
    pub tag: String,

    /// Cursor file for incremental sync
    #[arg(long)]
    pub cursor: Option<PathBuf>,

    /// Directory for per-folder/tag cursor files
    #[arg(long)]
    pub cursor_dir: Option<PathBuf>,

    /// Safety cap on pages
    #[arg(long, default_value_t = DEFAULT_MAX_PAGES)]
    pub max_pages: u32,
}

/// Exports bookmarks as NDJSON.
pub fn run(ctx: &Ctx, config: &Config, args: ExportArgs) -> i32 {
    let client = match ctx.build_client(config, true) {
        Ok(client) => client,
        Err(err) => return ctx.reporter.fail(&err),
    };
    let folder_id = if args.tag.is_empty() {
        match resolve_folder_id(&client, &args.folder) {
            Ok(id) => id,
            Err(err) => return ctx.reporter.fail(&err),
        }
    } else {
        String::new()
    };

    let mut writer: Box<dyn Write> = match &args.output {
        Some(path) => match File::create(path) {
            Ok(file) => Box::new(BufWriter::new(file)),
            Err(err) => return ctx.reporter.fail(&err.into()),
        },
        None => Box::new(std::io::stdout()),
    };

    let cursor_path = args.cursor.clone().or_else(|| {
        args.cursor_dir
            .as_deref()
            .map(|dir| resolve_cursor_path(dir, &folder_id, &args.tag))
    });

    let params = ListParams {
        limit: 0,
        folder_id,
        tag: args.tag.clone(),
        have: String::new(),
        highlights: String::new(),
        cursor_path,
        max_pages: args.max_pages,
        discard_bookmarks: true,
    };

    let mut exported: u64 = 0;
    let mut on_page = |bookmarks: &[Bookmark], page: u32| {
        for bookmark in bookmarks {
            let line = serde_json::to_string(bookmark)
                .map_err(|e| SyncError::Io(std::io::Error::other(e)))?;
            writeln!(writer, "{line}").map_err(SyncError::Io)?;
        }
        exported += bookmarks.len() as u64;
        tracing::debug!(page, exported, "exported page");
        Ok(())
    };

    if let Err(err) = list_bookmarks(&client, &params, Some(&mut on_page)) {
        return ctx.reporter.fail(&err.into());
    }
    if let Err(err) = writer.flush() {
        return ctx.reporter.fail(&err.into());
    }
    if !ctx.quiet {
        eprintln!("exported {exported} bookmarks");
    }
    0
}
