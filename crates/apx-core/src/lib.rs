//! # apx-core: Foundational Types for the APX Portal
//!
//! Every other `apx-*` crate depends on this one; it depends on nothing
//! internal.
//!
//! ## Contents
//!
//! - **Identifiers** (`identity.rs`): `ApiDefinitionId`, `GatewayId`,
//!   `PublishRecordId`, `HistoryEntryId`. The backend generates these and
//!   they are opaque to the client, so they are string newtypes with a
//!   non-blank constructor rather than UUIDs.
//!
//! - **Timestamps** (`temporal.rs`): a UTC-only `Timestamp` that accepts the
//!   several date formats the backend emits and always serializes as
//!   RFC 3339 with a `Z` suffix.
//!
//! - **Pagination** (`page.rs`): `PageRequest` carries the one-based page
//!   shown to operators and translates to the zero-based page on the wire.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `apx-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod error;
pub mod identity;
pub mod page;
pub mod temporal;

pub use error::CoreError;
pub use identity::{ApiDefinitionId, GatewayId, HistoryEntryId, PublishRecordId};
pub use page::{Page, PageRequest, DEFAULT_PAGE_SIZE};
pub use temporal::Timestamp;
