//! # Publish Subcommands
//!
//! `apx publish` and `apx unpublish`. Both run through a
//! [`PublishController`](apx_publish::PublishController): the form is
//! validated, the gateway directory and records are re-read, and the
//! one-active-gateway rule is checked before anything is sent.
//!
//! Validation failures and policy refusals exit 2 with the reason on
//! stderr. Backend failures exit 1, as does an unreadable record list.

use anyhow::{Context as _, Result};
use clap::Args;

use apx_core::PublishRecordId;
use apx_publish::{ControllerError, PublishForm};

use crate::{print_json, render, report_notices, Context, EXIT_REJECTED};

/// Arguments for `apx publish`.
#[derive(Args, Debug)]
pub struct PublishArgs {
    /// API Definition identifier.
    pub api_definition_id: String,

    /// Target gateway identifier.
    #[arg(long = "gateway")]
    pub gateway_id: String,

    /// Base path the API is served under. Defaults to "/".
    #[arg(long)]
    pub base_path: Option<String>,

    /// Custom domains, comma-separated. Duplicates are dropped.
    #[arg(long)]
    pub domains: Option<String>,

    /// Free-text note recorded with the publish.
    #[arg(long)]
    pub comment: Option<String>,
}

impl PublishArgs {
    pub fn form(&self) -> PublishForm {
        PublishForm {
            gateway_id: Some(self.gateway_id.clone()),
            base_path: self.base_path.clone(),
            domains: self.domains.clone(),
            comment: self.comment.clone(),
        }
    }
}

/// Arguments for `apx unpublish`.
#[derive(Args, Debug)]
pub struct UnpublishArgs {
    /// API Definition identifier.
    pub api_definition_id: String,

    /// The ACTIVE publish record to take down.
    pub record_id: String,
}

pub async fn run_publish(args: &PublishArgs, ctx: &Context) -> Result<u8> {
    let controller = ctx.controller(&args.api_definition_id)?;
    let outcome = controller.publish(&args.form()).await;
    report_notices(&controller.take_notices());

    match outcome {
        Ok(()) => {}
        Err(ControllerError::Validation(errors)) => {
            for error in &errors.0 {
                eprintln!("{}: {}", error.field, error.message);
            }
            return Ok(EXIT_REJECTED);
        }
        Err(e @ (ControllerError::Policy(_) | ControllerError::Config(_) | ControllerError::Transition(_))) => {
            eprintln!("Publish refused: {e}");
            return Ok(EXIT_REJECTED);
        }
        Err(e) => return Err(e).context("publish failed"),
    }

    let records = controller.records();
    if ctx.json() {
        print_json(&records)?;
    } else {
        print!("{}", render::record_table(&records));
    }
    Ok(0)
}

pub async fn run_unpublish(args: &UnpublishArgs, ctx: &Context) -> Result<u8> {
    let record_id = PublishRecordId::new(args.record_id.as_str()).context("invalid record id")?;
    let controller = ctx.controller(&args.api_definition_id)?;
    let outcome = controller.unpublish(&record_id).await;
    report_notices(&controller.take_notices());

    match outcome {
        Ok(()) => {}
        Err(e @ (ControllerError::RecordNotFound(_) | ControllerError::RecordNotActive(_))) => {
            eprintln!("Unpublish refused: {e}");
            return Ok(EXIT_REJECTED);
        }
        Err(e) => return Err(e).context("unpublish failed"),
    }

    let records = controller.records();
    if ctx.json() {
        print_json(&records)?;
    } else {
        print!("{}", render::record_table(&records));
    }
    Ok(0)
}
