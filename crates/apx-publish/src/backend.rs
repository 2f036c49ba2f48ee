//! Abstract backend boundary the controller drives.
//!
//! The HTTP client implements this for the real portal; tests implement it
//! in memory.

use std::fmt;
use std::future::Future;

use apx_core::{ApiDefinitionId, Page, PageRequest, PublishRecordId};

use crate::config::PublishRequest;
use crate::gateway::Gateway;
use crate::history::PublishHistoryEntry;
use crate::record::PublishRecord;

/// Remote operations on publish state.
///
/// Mutations report success or failure only; callers re-read afterwards.
pub trait PublishBackend: Send + Sync {
    type Error: std::error::Error + fmt::Display + Send + Sync + 'static;

    fn list_records(
        &self,
        api: &ApiDefinitionId,
        page: PageRequest,
    ) -> impl Future<Output = Result<Page<PublishRecord>, Self::Error>> + Send;

    fn list_history(
        &self,
        api: &ApiDefinitionId,
        page: PageRequest,
    ) -> impl Future<Output = Result<Page<PublishHistoryEntry>, Self::Error>> + Send;

    fn list_gateways(&self, size: u32) -> impl Future<Output = Result<Vec<Gateway>, Self::Error>> + Send;

    fn publish(
        &self,
        api: &ApiDefinitionId,
        request: &PublishRequest,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    fn unpublish(
        &self,
        api: &ApiDefinitionId,
        record: &PublishRecordId,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;
}
