//! # Publish Controller
//!
//! Orchestrates publish and unpublish for one API Definition against a
//! [`PublishBackend`], and keeps the cached panel state (records, current
//! history page, transient notices) consistent with the backend.
//!
//! ## Rules
//!
//! - At most one action in flight per controller. A second trigger while
//!   one is pending is refused with [`ControllerError::ActionPending`].
//! - Before a publish is sent, the gateway directory and every page of the
//!   record list are re-fetched and the single-active rule is checked
//!   again. If the records cannot be read, nothing is sent.
//! - After every mutation, success or failure, records and history are
//!   re-read. The cache is never updated optimistically.
//! - Read failures render an empty state plus an error notice; they never
//!   surface as `Err`.
//! - A diff resolves the latest active snapshot from the newest history
//!   page onward, independent of the page on display.
//!
//! The cache lock is never held across an `.await`.

use std::sync::atomic::{AtomicBool, Ordering};

use apx_core::{ApiDefinitionId, GatewayId, HistoryEntryId, Page, PageRequest, PublishRecordId};
use parking_lot::Mutex;
use serde_json::Value;
use thiserror::Error;

use crate::backend::PublishBackend;
use crate::config::{ConfigError, FormErrors, PublishForm};
use crate::gateway::GatewayDirectory;
use crate::history::{PublishHistory, PublishHistoryEntry};
use crate::policy::{PolicyError, PublishConstraintPolicy, PublishDecision};
use crate::record::{BindingEvent, BindingState, PublishRecord, TransitionError};
use crate::snapshot::{SnapshotComparator, SnapshotDiff};

/// Records requested per page when reading every record.
pub const RECORD_FETCH_SIZE: u32 = 100;

/// History entries requested per page when looking for the latest active
/// snapshot.
pub const HISTORY_SCAN_SIZE: u32 = 50;

/// Gateways fetched for the directory at submission time.
pub const GATEWAY_FETCH_SIZE: u32 = 1000;

// ─── Notices ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Warning,
    Error,
}

/// A transient notification for the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

// ─── Panel state ─────────────────────────────────────────────────────

/// Cached view of one API Definition's publish state.
#[derive(Debug, Clone, Default)]
pub struct PanelState {
    pub records: Vec<PublishRecord>,
    pub history: PublishHistory,
    pub history_request: PageRequest,
    pub history_total: u64,
    pub notices: Vec<Notice>,
}

// ─── Errors ──────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ControllerError<E: std::error::Error + 'static> {
    #[error("another publish action is still in progress")]
    ActionPending,

    #[error(transparent)]
    Validation(#[from] FormErrors),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Policy(#[from] PolicyError),

    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error("publish record {0} not found")]
    RecordNotFound(PublishRecordId),

    #[error("publish record {0} is not ACTIVE")]
    RecordNotActive(PublishRecordId),

    #[error("history entry {0} not found on the loaded page")]
    EntryNotFound(HistoryEntryId),

    /// The record list could not be read, so the single-active rule could
    /// not be checked.
    #[error("publish records could not be verified: {0}")]
    RecordsUnverified(#[source] E),

    #[error("backend: {0}")]
    Backend(#[source] E),
}

// ─── In-flight guard ─────────────────────────────────────────────────

/// Holds the in-flight flag; releases it on drop.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn claim(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

// ─── Controller ──────────────────────────────────────────────────────

pub struct PublishController<B: PublishBackend> {
    backend: B,
    api_definition_id: ApiDefinitionId,
    state: Mutex<PanelState>,
    in_flight: AtomicBool,
}

impl<B: PublishBackend> PublishController<B> {
    pub fn new(backend: B, api_definition_id: ApiDefinitionId) -> Self {
        Self {
            backend,
            api_definition_id,
            state: Mutex::new(PanelState::default()),
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn api_definition_id(&self) -> &ApiDefinitionId {
        &self.api_definition_id
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Copy of the cached panel state.
    pub fn state(&self) -> PanelState {
        self.state.lock().clone()
    }

    pub fn records(&self) -> Vec<PublishRecord> {
        self.state.lock().records.clone()
    }

    pub fn history(&self) -> PublishHistory {
        self.state.lock().history.clone()
    }

    /// Whether an action is pending.
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Drain pending notices.
    pub fn take_notices(&self) -> Vec<Notice> {
        std::mem::take(&mut self.state.lock().notices)
    }

    pub fn can_publish(&self) -> bool {
        PublishConstraintPolicy::can_publish(&self.state.lock().records)
    }

    pub fn decision(&self) -> PublishDecision {
        PublishConstraintPolicy::decide(&self.state.lock().records)
    }

    /// Re-read records and the current history page.
    pub async fn refresh(&self) {
        self.reload_records().await;
        let request = self.state.lock().history_request;
        self.history_page(request).await;
    }

    /// Load one history page into the cache and return it.
    pub async fn history_page(&self, request: PageRequest) -> Page<PublishHistoryEntry> {
        match self.backend.list_history(&self.api_definition_id, request).await {
            Ok(page) => {
                let mut state = self.state.lock();
                state.history = PublishHistory::from_entries(page.items);
                state.history_request = request;
                state.history_total = page.total;
                Page {
                    items: state.history.entries().to_vec(),
                    total: page.total,
                    request,
                }
            }
            Err(e) => {
                tracing::warn!(api_definition_id = %self.api_definition_id, error = %e, "history read failed");
                let mut state = self.state.lock();
                state.history = PublishHistory::default();
                state.history_request = request;
                state.history_total = 0;
                state.notices.push(Notice::error(format!("Failed to load publish history: {e}")));
                Page::empty(request)
            }
        }
    }

    /// Validate `form` and publish it.
    pub async fn publish(&self, form: &PublishForm) -> Result<(), ControllerError<B::Error>> {
        let _guard = InFlight::claim(&self.in_flight).ok_or(ControllerError::<B::Error>::ActionPending)?;

        let config = form.parse()?;

        let gateways = self
            .backend
            .list_gateways(GATEWAY_FETCH_SIZE)
            .await
            .map_err(ControllerError::Backend)?;
        config.validate_gateway(&GatewayDirectory::new(gateways))?;

        let records = self.verified_records("publish").await?;
        PublishConstraintPolicy::ensure_can_publish(&records)?;
        BindingState::of(&records, &config.gateway_id).apply(&BindingEvent::PublishSucceeded)?;

        let gateway_id: GatewayId = config.gateway_id.clone();
        let request = config.into_request();
        tracing::info!(
            api_definition_id = %self.api_definition_id,
            gateway_id = %gateway_id,
            base_path = %request.publish_config.base_path,
            "submitting publish"
        );
        let outcome = self.backend.publish(&self.api_definition_id, &request).await;

        let notice = match &outcome {
            Ok(()) => Notice::success(format!("Published to gateway {gateway_id}")),
            Err(e) => {
                tracing::warn!(api_definition_id = %self.api_definition_id, gateway_id = %gateway_id, error = %e, "publish failed");
                Notice::error(e.to_string())
            }
        };
        self.state.lock().notices.push(notice);

        self.refresh().await;
        outcome.map_err(ControllerError::Backend)
    }

    /// Unpublish the ACTIVE record `record_id`.
    pub async fn unpublish(&self, record_id: &PublishRecordId) -> Result<(), ControllerError<B::Error>> {
        let _guard = InFlight::claim(&self.in_flight).ok_or(ControllerError::<B::Error>::ActionPending)?;

        let records = self.verified_records("unpublish").await?;
        let record = records
            .iter()
            .find(|r| &r.record_id == record_id)
            .ok_or_else(|| ControllerError::<B::Error>::RecordNotFound(record_id.clone()))?;
        if !BindingState::from(record.status).can_unpublish() {
            return Err(ControllerError::RecordNotActive(record_id.clone()));
        }
        let gateway = record.gateway_label().to_string();

        tracing::info!(api_definition_id = %self.api_definition_id, record_id = %record_id, "submitting unpublish");
        let outcome = self.backend.unpublish(&self.api_definition_id, record_id).await;

        let notice = match &outcome {
            Ok(()) => Notice::success(format!("Unpublished from gateway {gateway}")),
            Err(e) => {
                tracing::warn!(api_definition_id = %self.api_definition_id, record_id = %record_id, error = %e, "unpublish failed");
                Notice::error(e.to_string())
            }
        };
        self.state.lock().notices.push(notice);

        self.refresh().await;
        outcome.map_err(ControllerError::Backend)
    }

    /// Diff a history entry on the loaded page against the most recent
    /// successful publish, wherever that sits in the history.
    pub async fn diff_entry(&self, entry_id: &HistoryEntryId) -> Result<SnapshotDiff, ControllerError<B::Error>> {
        let entry = self
            .state
            .lock()
            .history
            .get(entry_id)
            .cloned()
            .ok_or_else(|| ControllerError::<B::Error>::EntryNotFound(entry_id.clone()))?;

        match self.latest_active_snapshot().await {
            Ok(latest) => Ok(SnapshotComparator::against(latest.as_ref(), &entry)),
            Err(e) => {
                tracing::warn!(api_definition_id = %self.api_definition_id, error = %e, "history scan failed");
                self.state
                    .lock()
                    .notices
                    .push(Notice::error(format!("Failed to load publish history: {e}")));
                Err(ControllerError::Backend(e))
            }
        }
    }

    /// Scan history newest page first until a page holds a successful
    /// publish. `None` when there is none at all.
    async fn latest_active_snapshot(&self) -> Result<Option<Value>, B::Error> {
        let mut request = Some(PageRequest::first(HISTORY_SCAN_SIZE));
        let mut seen = 0u64;
        while let Some(current) = request {
            let page = self.backend.list_history(&self.api_definition_id, current).await?;
            let fetched = page.items.len() as u64;
            seen += fetched;
            let history = PublishHistory::from_entries(page.items);
            if history.entries().iter().any(PublishHistoryEntry::is_successful_publish) {
                return Ok(history.latest_active_snapshot().cloned());
            }
            if fetched == 0 || seen >= page.total {
                break;
            }
            request = current.next();
        }
        Ok(None)
    }

    /// Records for a pre-submit check. A failed read refuses the action.
    async fn verified_records(&self, action: &str) -> Result<Vec<PublishRecord>, ControllerError<B::Error>> {
        match self.fetch_records().await {
            Ok(records) => Ok(records),
            Err(e) => {
                tracing::warn!(api_definition_id = %self.api_definition_id, error = %e, "record check failed; {action} not sent");
                self.state.lock().notices.push(Notice::error(format!(
                    "Cannot {action}: failed to verify publish records: {e}"
                )));
                Err(ControllerError::RecordsUnverified(e))
            }
        }
    }

    /// Every record of the definition, page by page until `total`.
    async fn fetch_records(&self) -> Result<Vec<PublishRecord>, B::Error> {
        let mut records = Vec::new();
        let mut request = Some(PageRequest::first(RECORD_FETCH_SIZE));
        while let Some(current) = request {
            let page = self.backend.list_records(&self.api_definition_id, current).await?;
            let fetched = page.items.len();
            records.extend(page.items);
            if fetched == 0 || records.len() as u64 >= page.total {
                break;
            }
            request = current.next();
        }
        Ok(records)
    }

    async fn reload_records(&self) {
        match self.fetch_records().await {
            Ok(records) => {
                let extra = PublishConstraintPolicy::anomalies(&records).len();
                let mut state = self.state.lock();
                state.records = records;
                if extra > 0 {
                    state.notices.push(Notice::warning(format!(
                        "{} ACTIVE publish records reported; showing the earliest",
                        extra + 1
                    )));
                }
            }
            Err(e) => {
                tracing::warn!(api_definition_id = %self.api_definition_id, error = %e, "record read failed");
                let mut state = self.state.lock();
                state.records.clear();
                state.notices.push(Notice::error(format!("Failed to load publish records: {e}")));
            }
        }
    }
}
