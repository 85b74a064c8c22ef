//! `list` command: the incremental-sync walk plus client-side filters.

use crate::commands::resolve_folder_id;
use crate::config::Config;
use crate::output;
use crate::Ctx;
use clap::Args;
use readmark_sync::{
    filter_by_bounds, filter_by_select, list_bookmarks, parse_bound, parse_select_expr,
    parse_updated_bound, resolve_cursor_path, ListParams, DEFAULT_MAX_PAGES,
};
use std::path::PathBuf;

/// Flags for listing bookmarks.
#[derive(Args)]
pub struct ListArgs {
    /// Folder: unread|starred|archive|<id>|"Title"
    #[arg(long, default_value = "unread")]
    pub folder: String,

    /// Limit (0 = fetch everything, max 500)
    #[arg(short, long)]
    pub limit: Option<i64>,

    /// Tag name (when set, the folder is ignored)
    #[arg(long, default_value = "")]
    pub tag: String,

    /// Exclusion entries to merge in (id, id:hash, id:hash:progress:ts)
    #[arg(long, default_value = "")]
    pub have: String,

    /// Comma-separated bookmark ids to fetch highlights for
    #[arg(long, default_value = "")]
    pub highlights: String,

    /// Cursor file for incremental sync
    #[arg(long)]
    pub cursor: Option<PathBuf>,

    /// Directory for per-folder/tag cursor files
    #[arg(long)]
    pub cursor_dir: Option<PathBuf>,

    /// Keep bookmarks since a bound (e.g. 42, time:2024-01-02)
    #[arg(long, default_value = "")]
    pub since: String,

    /// Keep bookmarks up to a bound
    #[arg(long, default_value = "")]
    pub until: String,

    /// Keep bookmarks touched since a time (progress timestamp or creation)
    #[arg(long, default_value = "")]
    pub updated_since: String,

    /// Safety cap on pages when --limit is 0
    #[arg(long, default_value_t = DEFAULT_MAX_PAGES)]
    pub max_pages: u32,

    /// Client-side filter, e.g. starred=1,tag~news
    #[arg(long, default_value = "")]
    pub select: String,
}

/// Lists bookmarks.
pub fn run(ctx: &Ctx, config: &Config, args: ListArgs) -> i32 {
    let limit = args.limit.unwrap_or(config.defaults.list_limit);
    if !(0..=crate::MAX_LIST_LIMIT).contains(&limit) {
        return ctx.reporter.usage(&format!(
            "invalid --limit {limit} (expected 0..={})",
            crate::MAX_LIST_LIMIT
        ));
    }
    if !args.since.is_empty() && !args.updated_since.is_empty() {
        return ctx
            .reporter
            .usage("use only one of --since or --updated-since");
    }

    // Every filter parses before the first network call.
    let since = if args.updated_since.is_empty() {
        match parse_bound(&args.since, "bookmark_id") {
            Ok(bound) => bound,
            Err(err) => return ctx.reporter.fail(&err.into()),
        }
    } else {
        match parse_updated_bound(&args.updated_since) {
            Ok(bound) => bound,
            Err(err) => return ctx.reporter.fail(&err.into()),
        }
    };
    let until = match parse_bound(&args.until, "bookmark_id") {
        Ok(bound) => bound,
        Err(err) => return ctx.reporter.fail(&err.into()),
    };
    let select = match parse_select_expr(&args.select) {
        Ok(filters) => filters,
        Err(err) => return ctx.reporter.fail(&err.into()),
    };

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

    let cursor_path = args.cursor.clone().or_else(|| {
        args.cursor_dir
            .as_deref()
            .map(|dir| resolve_cursor_path(dir, &folder_id, &args.tag))
    });

    let params = ListParams {
        limit,
        folder_id,
        tag: args.tag.clone(),
        have: args.have.clone(),
        highlights: args.highlights.clone(),
        cursor_path,
        max_pages: args.max_pages,
        discard_bookmarks: false,
    };
    let response = match list_bookmarks(&client, &params, None) {
        Ok(response) => response,
        Err(err) => return ctx.reporter.fail(&err.into()),
    };

    let bookmarks = filter_by_bounds(response.bookmarks, since.as_ref(), until.as_ref());
    let bookmarks = filter_by_select(bookmarks, &select);
    tracing::debug!(bookmarks = bookmarks.len(), "list complete");

    let mut stdout = std::io::stdout();
    if let Err(err) = output::print_bookmarks(&mut stdout, ctx.format, &bookmarks) {
        return ctx.reporter.fail(&err);
    }
    if !response.highlights.is_empty() {
        if let Err(err) = output::print_highlights(&mut stdout, ctx.format, &response.highlights) {
            return ctx.reporter.fail(&err);
        }
    }
    0
}
