//! Single-bookmark and batch mutations.
//!
//! Batch commands process ids sequentially, keep going past per-item
//! failures, and exit with the worst per-item code. An optional pause
//! every N items self-throttles against the remote rate limiter.

use crate::commands::resolve_folder_id;
use crate::config::Config;
use crate::output;
use crate::report::CliError;
use crate::Ctx;
use clap::Args;
use readmark_api::{ApiResult, Bookmark, Client};
use std::io::{BufRead, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

/// Id list flags shared by the batch mutations.
#[derive(Args)]
pub struct IdsArgs {
    /// Bookmark ids
    pub ids: Vec<String>,

    /// Comma-separated bookmark ids
    #[arg(long, default_value = "")]
    pub ids_csv: String,

    /// Read bookmark ids from stdin
    #[arg(long)]
    pub stdin: bool,

    /// Pause after every N items (0 = no pause)
    #[arg(long, default_value_t = 0)]
    pub batch: usize,
}

/// Flags for `delete`.
#[derive(Args)]
pub struct DeleteArgs {
    #[command(flatten)]
    pub ids: IdsArgs,

    /// Confirm permanent deletion
    #[arg(long)]
    pub yes_really_delete: bool,
}

/// A batch mutation the server knows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Star.
    Star,
    /// Unstar.
    Unstar,
    /// Archive.
    Archive,
    /// Unarchive.
    Unarchive,
}

impl Action {
    fn name(&self) -> &'static str {
        match self {
            Action::Star => "star",
            Action::Unstar => "unstar",
            Action::Archive => "archive",
            Action::Unarchive => "unarchive",
        }
    }

    fn call(&self, client: &Client, id: i64) -> ApiResult<Bookmark> {
        match self {
            Action::Star => client.star(id),
            Action::Unstar => client.unstar(id),
            Action::Archive => client.archive(id),
            Action::Unarchive => client.unarchive(id),
        }
    }
}

/// Runs one of the star/unstar/archive/unarchive batch mutations.
pub fn run_mutation(ctx: &Ctx, config: &Config, action: Action, args: IdsArgs) -> i32 {
    let ids = match collect_ids(&args) {
        Ok(ids) => ids,
        Err(err) => return ctx.reporter.fail(&err),
    };
    if ids.is_empty() {
        return ctx
            .reporter
            .usage(&format!("usage: readmark {} <bookmark_id>...", action.name()));
    }
    if ctx.dry_run {
        return emit_dry_run_ids(ctx, action.name(), &ids);
    }
    let client = match ctx.build_client(config, true) {
        Ok(client) => client,
        Err(err) => return ctx.reporter.fail(&err),
    };

    let mut exit = 0;
    for (index, id) in ids.iter().enumerate() {
        match action.call(&client, *id) {
            Ok(_) => {
                if !ctx.quiet {
                    println!("{} {}", capitalized(action.name()), id);
                }
            }
            Err(err) => {
                let err = CliError::from(err);
                exit = exit.max(err.exit_code());
                ctx.reporter.warn(&err);
            }
        }
        throttle(ctx, &args, index, ids.len());
    }
    exit
}

/// Deletes bookmarks; refuses without explicit confirmation.
pub fn run_delete(ctx: &Ctx, config: &Config, args: DeleteArgs) -> i32 {
    let ids = match collect_ids(&args.ids) {
        Ok(ids) => ids,
        Err(err) => return ctx.reporter.fail(&err),
    };
    if ids.is_empty() {
        return ctx
            .reporter
            .usage("usage: readmark delete <bookmark_id>... --yes-really-delete");
    }
    if ctx.dry_run {
        return emit_dry_run_ids(ctx, "delete", &ids);
    }
    if !args.yes_really_delete {
        return ctx
            .reporter
            .usage("refusing: permanent delete requires --yes-really-delete");
    }
    let client = match ctx.build_client(config, true) {
        Ok(client) => client,
        Err(err) => return ctx.reporter.fail(&err),
    };

    let mut exit = 0;
    for (index, id) in ids.iter().enumerate() {
        match client.delete_bookmark(*id) {
            Ok(()) => {
                if !ctx.quiet {
                    println!("Deleted {id}");
                }
            }
            Err(err) => {
                let err = CliError::from(err);
                exit = exit.max(err.exit_code());
                ctx.reporter.warn(&err);
            }
        }
        throttle(ctx, &args.ids, index, ids.len());
    }
    exit
}

/// Records reading progress.
pub fn run_progress(
    ctx: &Ctx,
    config: &Config,
    id: i64,
    progress: f64,
    timestamp: Option<i64>,
) -> i32 {
    if !(0.0..=1.0).contains(&progress) {
        return ctx
            .reporter
            .usage(&format!("invalid progress {progress} (expected 0..=1)"));
    }
    let timestamp = timestamp.unwrap_or_else(|| {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs() as i64
    });
    let client = match ctx.build_client(config, true) {
        Ok(client) => client,
        Err(err) => return ctx.reporter.fail(&err),
    };
    match client.update_read_progress(id, progress, timestamp) {
        Ok(bookmark) => print_one(ctx, bookmark),
        Err(err) => ctx.reporter.fail(&err.into()),
    }
}

/// Moves one bookmark into a folder.
pub fn run_move(ctx: &Ctx, config: &Config, id: i64, folder: &str) -> i32 {
    let client = match ctx.build_client(config, true) {
        Ok(client) => client,
        Err(err) => return ctx.reporter.fail(&err),
    };
    let folder_id = match resolve_folder_id(&client, folder) {
        Ok(folder_id) if !folder_id.is_empty() => folder_id,
        Ok(_) => return ctx.reporter.usage("move requires a concrete folder"),
        Err(err) => return ctx.reporter.fail(&err),
    };
    match client.move_bookmark(id, &folder_id) {
        Ok(bookmark) => print_one(ctx, bookmark),
        Err(err) => ctx.reporter.fail(&err.into()),
    }
}

/// Fetches the processed article HTML.
pub fn run_text(ctx: &Ctx, config: &Config, id: i64, output_path: Option<&Path>) -> i32 {
    let client = match ctx.build_client(config, true) {
        Ok(client) => client,
        Err(err) => return ctx.reporter.fail(&err),
    };
    let html = match client.get_text(id) {
        Ok(html) => html,
        Err(err) => return ctx.reporter.fail(&err.into()),
    };
    let written = match output_path {
        Some(path) => std::fs::write(path, &html).map_err(CliError::from),
        None => std::io::stdout()
            .write_all(&html)
            .map_err(CliError::from),
    };
    match written {
        Ok(()) => 0,
        Err(err) => ctx.reporter.fail(&err),
    }
}

fn print_one(ctx: &Ctx, bookmark: Bookmark) -> i32 {
    let mut stdout = std::io::stdout();
    match output::print_bookmarks(&mut stdout, ctx.format, &[bookmark]) {
        Ok(()) => 0,
        Err(err) => ctx.reporter.fail(&err),
    }
}

fn capitalized(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Pause between batches to stay under the remote rate limit.
fn throttle(ctx: &Ctx, args: &IdsArgs, index: usize, total: usize) {
    if args.batch > 0
        && (index + 1) % args.batch == 0
        && index + 1 < total
        && !ctx.retry_backoff.is_zero()
    {
        std::thread::sleep(ctx.retry_backoff);
    }
}

/// Gathers ids from positional args, the CSV flag, and stdin.
pub fn collect_ids(args: &IdsArgs) -> Result<Vec<i64>, CliError> {
    let mut ids = Vec::new();
    for raw in &args.ids {
        ids.extend(parse_id_list(raw)?);
    }
    if !args.ids_csv.is_empty() {
        ids.extend(parse_id_list(&args.ids_csv)?);
    }
    if args.stdin {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let line = line?;
            ids.extend(parse_id_list(&line)?);
        }
    }
    Ok(ids)
}

fn parse_id_list(value: &str) -> Result<Vec<i64>, CliError> {
    value
        .split(|c: char| c == ',' || c.is_whitespace())
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<i64>()
                .map_err(|_| CliError::usage(format!("invalid bookmark id: {part}")))
        })
        .collect()
}

fn emit_dry_run_ids(ctx: &Ctx, action: &str, ids: &[i64]) -> i32 {
    let mut stdout = std::io::stdout();
    let result = match ctx.format {
        output::Format::Json => {
            let records: Vec<serde_json::Value> = ids
                .iter()
                .map(|id| serde_json::json!({ "action": action, "bookmark_id": id }))
                .collect();
            output::write_json(&mut stdout, &records)
        }
        output::Format::Plain | output::Format::Table => {
            let mut result = Ok(());
            for id in ids {
                if let Err(err) = writeln!(stdout, "{action}\t{id}").map_err(CliError::from) {
                    result = Err(err);
                    break;
                }
            }
            result
        }
        output::Format::Ndjson => {
            let mut result = Ok(());
            for id in ids {
                let record = serde_json::json!({ "action": action, "bookmark_id": id });
                if let Err(err) = output::write_json_line(&mut stdout, &record) {
                    result = Err(err);
                    break;
                }
            }
            result
        }
    };
    match result {
        Ok(()) => 0,
        Err(err) => ctx.reporter.fail(&err),
    }
}
