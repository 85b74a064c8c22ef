//! `add` command.

use crate::commands::resolve_folder_id;
use crate::config::Config;
use crate::output;
use crate::Ctx;
use clap::Args;
use readmark_api::AddBookmarkRequest;

/// Flags for saving a bookmark.
#[derive(Args)]
pub struct AddArgs {
    /// URL to save
    pub url: Option<String>,

    /// Title override
    #[arg(long)]
    pub title: Option<String>,

    /// Description
    #[arg(long)]
    pub description: Option<String>,

    /// Destination folder (id or title)
    #[arg(long)]
    pub folder: Option<String>,

    /// Comma-separated tag names
    #[arg(long)]
    pub tags: Option<String>,

    /// Supply the content instead of letting the server fetch it
    #[arg(long)]
    pub content: Option<String>,

    /// Private source label; requires --content
    #[arg(long)]
    pub private_source: Option<String>,

    /// Save straight to the archive
    #[arg(long)]
    pub archived: bool,

    /// Do not resolve redirects before saving
    #[arg(long)]
    pub no_resolve: bool,
}

/// Saves one bookmark.
pub fn run(ctx: &Ctx, config: &Config, args: AddArgs) -> i32 {
    let private_source = args.private_source.clone().unwrap_or_default();
    let url = args.url.clone().unwrap_or_default();
    if url.is_empty() && private_source.is_empty() {
        return ctx.reporter.usage("usage: readmark add <url>");
    }

    let tags: Vec<String> = args
        .tags
        .as_deref()
        .unwrap_or_default()
        .split(',')
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();

    if ctx.dry_run {
        let record = serde_json::json!({
            "action": "add",
            "url": url,
            "title": args.title.clone().unwrap_or_default(),
            "tags": tags,
            "archived": args.archived,
        });
        let mut stdout = std::io::stdout();
        let result = match ctx.format {
            output::Format::Json => output::write_json(&mut stdout, &record),
            _ => output::write_json_line(&mut stdout, &record),
        };
        return match result {
            Ok(()) => 0,
            Err(err) => ctx.reporter.fail(&err),
        };
    }

    let client = match ctx.build_client(config, true) {
        Ok(client) => client,
        Err(err) => return ctx.reporter.fail(&err),
    };
    let folder_id = match args.folder.as_deref() {
        Some(folder) => match resolve_folder_id(&client, folder) {
            Ok(id) => id,
            Err(err) => return ctx.reporter.fail(&err),
        },
        None => String::new(),
    };

    let request = AddBookmarkRequest {
        url,
        title: args.title.unwrap_or_default(),
        description: args.description.unwrap_or_default(),
        folder_id,
        resolve_final_url: !args.no_resolve,
        archived: args.archived,
        tags,
        content: args.content.unwrap_or_default(),
        private_source,
    };
    match client.add_bookmark(&request) {
        Ok(bookmark) => {
            let mut stdout = std::io::stdout();
            match output::print_bookmarks(&mut stdout, ctx.format, &[bookmark]) {
                Ok(()) => 0,
                Err(err) => ctx.reporter.fail(&err),
            }
        }
        Err(err) => ctx.reporter.fail(&err.into()),
    }
}
