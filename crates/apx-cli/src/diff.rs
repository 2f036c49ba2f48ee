//! # Diff Subcommand
//!
//! `apx diff <api-id> <entry-id>` compares the configuration snapshot of a
//! history entry with the latest active snapshot. The entry is looked up on
//! the page given by `--page`/`--size`; the latest active snapshot is found
//! by reading history from the newest page onward. With no successful
//! publish anywhere, the left side renders as the absent marker.

use anyhow::{Context as _, Result};
use clap::Args;
use serde::Serialize;

use apx_core::{HistoryEntryId, PageRequest, DEFAULT_PAGE_SIZE};
use apx_publish::ControllerError;

use crate::{print_json, render, report_notices, Context, EXIT_REJECTED};

/// Arguments for `apx diff`.
#[derive(Args, Debug)]
pub struct DiffArgs {
    /// API Definition identifier.
    pub api_definition_id: String,

    /// History entry to inspect.
    pub entry_id: String,

    /// History page holding the entry.
    #[arg(long, default_value_t = 1)]
    pub page: u32,

    /// Entries per page.
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
    pub size: u32,
}

#[derive(Serialize)]
struct DiffOutput<'a> {
    entry_id: &'a HistoryEntryId,
    changed: bool,
    latest_active: &'a str,
    selected: &'a str,
    inserted: usize,
    deleted: usize,
}

pub async fn run_diff(args: &DiffArgs, ctx: &Context) -> Result<u8> {
    let request = PageRequest::new(args.page, args.size).context("invalid page")?;
    let entry_id = HistoryEntryId::new(args.entry_id.as_str()).context("invalid entry id")?;
    let controller = ctx.controller(&args.api_definition_id)?;
    controller.history_page(request).await;
    let code = report_notices(&controller.take_notices());

    let diff = match controller.diff_entry(&entry_id).await {
        Ok(diff) => diff,
        Err(e @ ControllerError::EntryNotFound(_)) => {
            eprintln!("{e} (page {}, size {})", request.page(), request.size());
            return Ok(code.max(EXIT_REJECTED));
        }
        Err(e) => {
            report_notices(&controller.take_notices());
            return Err(e).context("diff failed");
        }
    };

    if ctx.json() {
        let stats = diff.stats();
        print_json(&DiffOutput {
            entry_id: &entry_id,
            changed: diff.has_changes(),
            latest_active: &diff.left,
            selected: &diff.right,
            inserted: stats.inserted,
            deleted: stats.deleted,
        })?;
    } else {
        print!("{}", render::diff_report(&diff));
    }
    Ok(code)
}
