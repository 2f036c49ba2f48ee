//! In-memory publish backend state.
//!
//! Gateways, records and history each live in their own `DashMap`. The
//! stub is the authority for the publish state machine: every binding of an
//! API Definition to a gateway is a [`PublishBinding`], and a record's
//! status is always the binding's state.
//!
//! Mutations take a single write lock so the one-active-gateway check and
//! the state change happen atomically. Reads never take it.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use apx_core::{ApiDefinitionId, CoreError, GatewayId, HistoryEntryId, PublishRecordId, Timestamp};
use apx_publish::{
    BindingEvent, BindingState, Gateway, GatewayType, HistoryStatus, PublishAction, PublishBinding,
    PublishConstraintPolicy, PublishHistoryEntry, PublishRecord, PublishRequest, RecordStatus,
};
use dashmap::DashMap;
use parking_lot::Mutex;
use serde_json::{json, Value};
use uuid::Uuid;

/// Gateways whose id starts with this prefix reject every publish.
pub const FAILING_GATEWAY_PREFIX: &str = "fail-";

/// Errors surfaced to HTTP callers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StubError {
    #[error("gateway {0} does not exist")]
    UnknownGateway(GatewayId),
    #[error("publish record {0} does not exist")]
    UnknownRecord(String),
    #[error("{0}")]
    InvalidRequest(String),
    #[error("{0}")]
    Conflict(String),
    /// The gateway refused the route. The record is now FAILED.
    #[error("{0}")]
    GatewayFailure(String),
    #[error(transparent)]
    Core(#[from] CoreError),
}

type BindingKey = (ApiDefinitionId, GatewayId);

/// Binding plus the record id that tracks it.
struct Slot {
    record_id: PublishRecordId,
    binding: PublishBinding,
}

struct Inner {
    gateways: DashMap<GatewayId, Gateway>,
    records: DashMap<PublishRecordId, PublishRecord>,
    bindings: DashMap<BindingKey, Slot>,
    history: DashMap<ApiDefinitionId, Vec<PublishHistoryEntry>>,
    writes: Mutex<()>,
    clock: AtomicI64,
}

/// Shared application state.
///
/// Cheaply cloneable via `Arc`; all clones share the same data.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<Inner>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                gateways: DashMap::new(),
                records: DashMap::new(),
                bindings: DashMap::new(),
                history: DashMap::new(),
                writes: Mutex::new(()),
                clock: AtomicI64::new(0),
            }),
        }
    }

    /// State seeded with `gateways`.
    pub fn with_gateways(gateways: impl IntoIterator<Item = Gateway>) -> Self {
        let state = Self::new();
        for gateway in gateways {
            state.add_gateway(gateway);
        }
        state
    }

    pub fn add_gateway(&self, gateway: Gateway) {
        self.inner.gateways.insert(gateway.gateway_id.clone(), gateway);
    }

    /// All gateways ordered by id.
    pub fn gateways(&self) -> Vec<Gateway> {
        let mut all: Vec<Gateway> = self.inner.gateways.iter().map(|e| e.value().clone()).collect();
        all.sort_by(|a, b| a.gateway_id.cmp(&b.gateway_id));
        all
    }

    /// Records of `api`, oldest first.
    pub fn records(&self, api: &ApiDefinitionId) -> Vec<PublishRecord> {
        let mut records: Vec<PublishRecord> = self
            .inner
            .records
            .iter()
            .filter(|e| &e.value().api_definition_id == api)
            .map(|e| e.value().clone())
            .collect();
        records.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.record_id.cmp(&b.record_id)));
        records
    }

    /// History of `api`, newest first.
    pub fn history(&self, api: &ApiDefinitionId) -> Vec<PublishHistoryEntry> {
        self.inner
            .history
            .get(api)
            .map(|log| log.iter().rev().cloned().collect())
            .unwrap_or_default()
    }

    /// Apply a publish request.
    pub fn publish(&self, api: &ApiDefinitionId, request: PublishRequest) -> Result<PublishRecord, StubError> {
        let _write = self.inner.writes.lock();

        let gateway = self
            .inner
            .gateways
            .get(&request.gateway_id)
            .map(|g| g.value().clone())
            .ok_or_else(|| StubError::UnknownGateway(request.gateway_id.clone()))?;
        let config = &request.publish_config;
        if config.gateway_id != request.gateway_id {
            return Err(StubError::InvalidRequest(format!(
                "publishConfig.gatewayId {} does not match gatewayId {}",
                config.gateway_id, request.gateway_id
            )));
        }
        if !config.base_path.starts_with('/') {
            return Err(StubError::InvalidRequest(format!(
                "basePath must start with '/', got {:?}",
                config.base_path
            )));
        }

        let existing = self.records(api);
        if let Some(active) = PublishConstraintPolicy::active_record(&existing) {
            return Err(StubError::Conflict(format!(
                "API definition {api} is already published to {}; unpublish record {} first",
                active.gateway_label(),
                active.record_id
            )));
        }

        let now = self.tick();
        let fresh_record_id = PublishRecordId::new(Uuid::new_v4().to_string())?;
        let entry_id = HistoryEntryId::new(Uuid::new_v4().to_string())?;
        let key = (api.clone(), gateway.gateway_id.clone());
        let mut slot = self.inner.bindings.entry(key).or_insert_with(|| Slot {
            record_id: fresh_record_id,
            binding: PublishBinding::new(api.clone(), gateway.gateway_id.clone()),
        });

        let failure = gateway
            .gateway_id
            .as_str()
            .starts_with(FAILING_GATEWAY_PREFIX)
            .then(|| format!("gateway {} rejected the route: upstream unavailable", gateway.gateway_id));
        let event = match &failure {
            Some(error) => BindingEvent::PublishFailed { error: error.clone() },
            None => BindingEvent::PublishSucceeded,
        };
        let state = slot
            .binding
            .apply(event)
            .map_err(|e| StubError::Conflict(e.to_string()))?;

        let snapshot = serde_json::to_value(config).unwrap_or(Value::Null);
        let active = state == BindingState::Active;
        let route_id = format!("route-{api}-{}", gateway.gateway_id);

        let record = {
            let mut record = self
                .inner
                .records
                .entry(slot.record_id.clone())
                .or_insert_with(|| PublishRecord {
                    record_id: slot.record_id.clone(),
                    api_definition_id: api.clone(),
                    gateway_id: gateway.gateway_id.clone(),
                    gateway_name: None,
                    gateway_type: None,
                    status: RecordStatus::Unknown,
                    publish_config: None,
                    gateway_resource_id: None,
                    access_endpoint: None,
                    error_message: None,
                    published_at: None,
                    last_sync_at: None,
                    created_at: Some(now),
                    updated_at: None,
                });
            record.gateway_name = Some(gateway.gateway_name.clone()).filter(|n| !n.is_empty());
            record.gateway_type = Some(gateway.gateway_type);
            record.status = status_of(state);
            record.publish_config = Some(snapshot.clone());
            record.gateway_resource_id = active.then(|| route_id.clone());
            record.access_endpoint = active.then(|| endpoint_for(&gateway, &config.domains, &config.base_path));
            record.error_message = slot.binding.error_message().map(str::to_string);
            if active {
                record.published_at = Some(now);
            }
            record.last_sync_at = Some(now);
            record.updated_at = Some(now);
            record.clone()
        };
        let record_id = slot.record_id.clone();
        drop(slot);

        self.log(PublishHistoryEntry {
            record_id: entry_id,
            api_definition_id: api.clone(),
            gateway_id: Some(gateway.gateway_id.clone()),
            action: PublishAction::Publish,
            status: if active { HistoryStatus::Active } else { HistoryStatus::Failed },
            version: None,
            snapshot: Some(snapshot.clone()),
            publish_config: Some(snapshot),
            gateway_resource_config: active.then(|| {
                json!({
                    "routeId": route_id,
                    "basePath": config.base_path,
                    "domains": config.domains,
                })
            }),
            error_message: failure.clone(),
            publish_note: config.comment.clone(),
            operator: None,
            created_at: Some(now),
        });

        tracing::info!(api_definition_id = %api, record_id = %record_id, status = %record.status, "publish applied");
        match failure {
            Some(message) => Err(StubError::GatewayFailure(message)),
            None => Ok(record),
        }
    }

    /// Unpublish one ACTIVE record of `api`.
    pub fn unpublish(&self, api: &ApiDefinitionId, record_id: &str) -> Result<PublishRecord, StubError> {
        let _write = self.inner.writes.lock();

        let record_id = PublishRecordId::new(record_id).map_err(|_| StubError::UnknownRecord(record_id.to_string()))?;
        let gateway_id = self
            .inner
            .records
            .get(&record_id)
            .filter(|r| &r.api_definition_id == api)
            .map(|r| r.gateway_id.clone())
            .ok_or_else(|| StubError::UnknownRecord(record_id.to_string()))?;

        let now = self.tick();
        let entry_id = HistoryEntryId::new(Uuid::new_v4().to_string())?;
        let key = (api.clone(), gateway_id.clone());
        let snapshot = {
            let mut slot = self
                .inner
                .bindings
                .get_mut(&key)
                .ok_or_else(|| StubError::UnknownRecord(record_id.to_string()))?;
            if !slot.binding.state().can_unpublish() {
                return Err(StubError::Conflict(format!(
                    "publish record {record_id} is {}; only ACTIVE records can be unpublished",
                    slot.binding.state()
                )));
            }
            slot.binding
                .apply(BindingEvent::UnpublishSucceeded)
                .map_err(|e| StubError::Conflict(e.to_string()))?;

            let mut record = self
                .inner
                .records
                .get_mut(&record_id)
                .ok_or_else(|| StubError::UnknownRecord(record_id.to_string()))?;
            record.status = status_of(slot.binding.state());
            record.access_endpoint = None;
            record.gateway_resource_id = None;
            record.error_message = None;
            record.last_sync_at = Some(now);
            record.updated_at = Some(now);
            record.publish_config.clone()
        };

        self.log(PublishHistoryEntry {
            record_id: entry_id,
            api_definition_id: api.clone(),
            gateway_id: Some(gateway_id),
            action: PublishAction::Unpublish,
            status: HistoryStatus::Inactive,
            version: None,
            snapshot: None,
            publish_config: snapshot,
            gateway_resource_config: None,
            error_message: None,
            publish_note: None,
            operator: None,
            created_at: Some(now),
        });

        tracing::info!(api_definition_id = %api, record_id = %record_id, "unpublish applied");
        self.inner
            .records
            .get(&record_id)
            .map(|r| r.value().clone())
            .ok_or_else(|| StubError::UnknownRecord(record_id.to_string()))
    }

    fn log(&self, entry: PublishHistoryEntry) {
        self.inner
            .history
            .entry(entry.api_definition_id.clone())
            .or_default()
            .push(entry);
    }

    /// Strictly increasing wall-clock milliseconds, so history order is
    /// total even for back-to-back actions.
    fn tick(&self) -> Timestamp {
        let wall = Timestamp::now().epoch_millis();
        let previous = self
            .inner
            .clock
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |last| Some(wall.max(last + 1)))
            .unwrap_or(wall);
        Timestamp::from_epoch_millis(wall.max(previous + 1)).unwrap_or_else(|_| Timestamp::now())
    }
}

fn status_of(state: BindingState) -> RecordStatus {
    match state {
        BindingState::Active => RecordStatus::Active,
        BindingState::Inactive => RecordStatus::Inactive,
        BindingState::Failed => RecordStatus::Failed,
        BindingState::None | BindingState::Unconfirmed => RecordStatus::Unknown,
    }
}

fn endpoint_for(gateway: &Gateway, domains: &[String], base_path: &str) -> String {
    let host = domains
        .first()
        .cloned()
        .unwrap_or_else(|| format!("{}.gateway.local", gateway.gateway_id));
    format!("https://{host}{base_path}")
}

/// Directory the binary starts with.
pub fn default_gateways() -> Vec<Gateway> {
    [
        ("gw-higress", "Higress Edge", GatewayType::Higress),
        ("gw-apig", "APIG Shared", GatewayType::ApigApi),
        ("gw-apig-ai", "APIG AI", GatewayType::ApigAi),
        ("fail-gateway", "Broken Gateway", GatewayType::Higress),
    ]
    .into_iter()
    .filter_map(|(id, name, gateway_type)| {
        Some(Gateway {
            gateway_id: GatewayId::new(id).ok()?,
            gateway_name: name.to_string(),
            gateway_type,
        })
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use apx_publish::PublishForm;

    fn state() -> AppState {
        AppState::with_gateways(default_gateways())
    }

    fn api() -> ApiDefinitionId {
        ApiDefinitionId::new("api-1").unwrap()
    }

    fn request(gateway: &str) -> PublishRequest {
        PublishForm {
            gateway_id: Some(gateway.into()),
            base_path: Some("/v1".into()),
            domains: Some("api.example.com".into()),
            comment: Some("first".into()),
        }
        .parse()
        .unwrap()
        .into_request()
    }

    #[test]
    fn publish_creates_active_record_and_history() {
        let s = state();
        let record = s.publish(&api(), request("gw-higress")).unwrap();
        assert_eq!(record.status, RecordStatus::Active);
        assert_eq!(record.access_endpoint.as_deref(), Some("https://api.example.com/v1"));
        assert_eq!(record.gateway_name.as_deref(), Some("Higress Edge"));

        let history = s.history(&api());
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].action, PublishAction::Publish);
        assert_eq!(history[0].status, HistoryStatus::Active);
        assert_eq!(history[0].publish_note.as_deref(), Some("first"));
    }

    #[test]
    fn second_publish_conflicts() {
        let s = state();
        s.publish(&api(), request("gw-higress")).unwrap();
        let err = s.publish(&api(), request("gw-apig")).unwrap_err();
        assert!(matches!(err, StubError::Conflict(_)));
        assert_eq!(s.records(&api()).len(), 1);
        assert_eq!(s.history(&api()).len(), 1);
    }

    #[test]
    fn republish_after_unpublish_reuses_record() {
        let s = state();
        let first = s.publish(&api(), request("gw-higress")).unwrap();
        let inactive = s.unpublish(&api(), first.record_id.as_str()).unwrap();
        assert_eq!(inactive.status, RecordStatus::Inactive);
        assert!(inactive.access_endpoint.is_none());

        let again = s.publish(&api(), request("gw-higress")).unwrap();
        assert_eq!(again.record_id, first.record_id);
        assert_eq!(s.records(&api()).len(), 1);

        let history = s.history(&api());
        let actions: Vec<PublishAction> = history.iter().map(|e| e.action).collect();
        assert_eq!(actions, vec![PublishAction::Publish, PublishAction::Unpublish, PublishAction::Publish]);
        assert!(history[0].created_at > history[1].created_at);
    }

    #[test]
    fn failing_gateway_marks_record_failed() {
        let s = state();
        let err = s.publish(&api(), request("fail-gateway")).unwrap_err();
        assert!(matches!(err, StubError::GatewayFailure(_)));

        let records = s.records(&api());
        assert_eq!(records[0].status, RecordStatus::Failed);
        assert!(records[0].error_message.is_some());
        assert_eq!(s.history(&api())[0].status, HistoryStatus::Failed);

        // A failed binding does not block publishing elsewhere.
        assert!(s.publish(&api(), request("gw-apig")).is_ok());
    }

    #[test]
    fn unknown_gateway_and_record_rejected() {
        let s = state();
        assert!(matches!(
            s.publish(&api(), request("gw-nope")),
            Err(StubError::UnknownGateway(_))
        ));
        assert!(matches!(s.unpublish(&api(), "missing"), Err(StubError::UnknownRecord(_))));
    }

    #[test]
    fn unpublish_inactive_record_conflicts() {
        let s = state();
        let record = s.publish(&api(), request("gw-higress")).unwrap();
        s.unpublish(&api(), record.record_id.as_str()).unwrap();
        assert!(matches!(
            s.unpublish(&api(), record.record_id.as_str()),
            Err(StubError::Conflict(_))
        ));
    }

    #[test]
    fn relative_base_path_rejected() {
        let s = state();
        let mut req = request("gw-higress");
        req.publish_config.base_path = "v1".into();
        assert!(matches!(s.publish(&api(), req), Err(StubError::InvalidRequest(_))));
    }

    #[test]
    fn records_are_scoped_by_api_definition() {
        let s = state();
        s.publish(&api(), request("gw-higress")).unwrap();
        let other = ApiDefinitionId::new("api-2").unwrap();
        assert!(s.records(&other).is_empty());
        assert!(s.publish(&other, request("gw-higress")).is_ok());
    }
}
