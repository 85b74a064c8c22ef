//! # Readmark Sync
//!
//! Incremental synchronization for the Readmark CLI.
//!
//! This crate provides:
//! - `SyncCursor`: persisted per-bookmark fingerprints and the "have"
//!   exclusion-string protocol
//! - `list_bookmarks`: a paginated walker that converges on the
//!   exclusion set, with streaming and a max-pages safety cap
//! - Bound (since/until) and select-expression filters applied
//!   client-side after a walk
//!
//! ## Key invariants
//!
//! - Cursor entries never have an empty id; ids are unique
//! - A page only adds or removes entries, never resets the set
//! - The cursor file is written once, after a fully successful walk
//! - The "have" tokenization is a wire contract and is preserved exactly

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod bounds;
mod cursor;
mod error;
mod pager;
mod select;

pub use bounds::{
    filter_by_bounds, parse_bound, parse_time_value, parse_updated_bound, updated_value, Bound,
    BoundField,
};
pub use cursor::{resolve_cursor_path, Fingerprint, SyncCursor};
pub use error::{SyncError, SyncResult};
pub use pager::{
    list_bookmarks, ListParams, PageHandler, DEFAULT_MAX_PAGES, FULL_WALK_PAGE_SIZE, MAX_PAGE_SIZE,
};
pub use select::{
    filter_by_select, matches_all, parse_bool, parse_select_expr, SelectField, SelectFilter,
    SelectOp,
};
