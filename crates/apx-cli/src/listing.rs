//! # Listing Subcommands
//!
//! Read-only views: `apx gateways`, `apx records`, `apx history`.
//!
//! Record and history reads go through the controller, so a failed read
//! prints an error notice and exits 1 instead of aborting with a stack of
//! transport context.

use anyhow::{Context as _, Result};
use clap::Args;

use apx_core::{HistoryEntryId, PageRequest, DEFAULT_PAGE_SIZE};
use apx_publish::controller::GATEWAY_FETCH_SIZE;

use crate::{print_json, render, report_notices, Context};

/// Arguments for `apx gateways`.
#[derive(Args, Debug)]
pub struct GatewaysArgs {
    /// Maximum number of gateways to fetch.
    #[arg(long, default_value_t = GATEWAY_FETCH_SIZE)]
    pub size: u32,
}

/// Arguments for `apx records`.
#[derive(Args, Debug)]
pub struct RecordsArgs {
    /// API Definition identifier.
    pub api_definition_id: String,
}

/// Arguments for `apx history`.
#[derive(Args, Debug)]
pub struct HistoryArgs {
    /// API Definition identifier.
    pub api_definition_id: String,

    /// Page number, starting at 1.
    #[arg(long, default_value_t = 1)]
    pub page: u32,

    /// Entries per page.
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
    pub size: u32,

    /// Show the expanded detail of one entry on the page.
    #[arg(long, value_name = "ENTRY_ID")]
    pub expand: Option<String>,

    /// With --expand, print the error message without truncation.
    #[arg(long, requires = "expand")]
    pub full: bool,
}

pub async fn run_gateways(args: &GatewaysArgs, ctx: &Context) -> Result<u8> {
    let gateways = ctx
        .client()
        .gateways()
        .list(args.size.max(1))
        .await
        .context("listing gateways")?;
    tracing::info!(count = gateways.len(), "gateways loaded");

    if ctx.json() {
        print_json(&gateways)?;
    } else {
        print!("{}", render::gateway_table(&gateways));
    }
    Ok(0)
}

pub async fn run_records(args: &RecordsArgs, ctx: &Context) -> Result<u8> {
    let controller = ctx.controller(&args.api_definition_id)?;
    controller.refresh().await;
    let state = controller.state();
    let code = report_notices(&state.notices);

    if ctx.json() {
        print_json(&state.records)?;
    } else {
        print!("{}", render::record_table(&state.records));
        println!("{}", render::decision_line(&controller.decision()));
    }
    Ok(code)
}

pub async fn run_history(args: &HistoryArgs, ctx: &Context) -> Result<u8> {
    let request = PageRequest::new(args.page, args.size).context("invalid page")?;
    let controller = ctx.controller(&args.api_definition_id)?;
    let page = controller.history_page(request).await;
    let code = report_notices(&controller.take_notices());

    let Some(raw) = &args.expand else {
        if ctx.json() {
            print_json(&page)?;
        } else {
            print!("{}", render::history_table(&page));
        }
        return Ok(code);
    };

    let id = HistoryEntryId::new(raw.as_str()).context("invalid entry id")?;
    let entry = page
        .items
        .iter()
        .find(|e| e.record_id == id)
        .with_context(|| format!("history entry {id} is not on page {}", request.page()))?;
    if ctx.json() {
        print_json(entry)?;
    } else {
        print!("{}", render::entry_detail(entry, args.full));
    }
    Ok(code)
}
