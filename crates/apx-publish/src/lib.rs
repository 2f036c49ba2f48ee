//! # apx-publish: Publish Lifecycle Model
//!
//! Client-side model of publishing an API Definition to a gateway. The
//! backend owns every record; this crate decides what the operator may
//! request, validates what they submit, and reconciles with the backend by
//! re-reading after each action.
//!
//! ## Modules
//!
//! | Module | Concern |
//! |--------|---------|
//! | `gateway` | Gateway types and the directory used at submission time |
//! | `config` | `PublishConfig`, operator form parsing, request body |
//! | `record` | `PublishRecord`, binding state machine, transition log |
//! | `policy` | The one-active-gateway rule |
//! | `history` | Append-only publish history, message previews |
//! | `snapshot` | Snapshot normalisation and diffing |
//! | `envelope` | Tolerant unwrapping of backend list responses |
//! | `backend` | The `PublishBackend` boundary trait |
//! | `controller` | `PublishController`: action orchestration and cache |
//!
//! ## Crate Policy
//!
//! - No I/O. Network access goes through a `PublishBackend` implementation.
//! - No `.unwrap()` outside tests.

pub mod backend;
pub mod config;
pub mod controller;
pub mod envelope;
pub mod gateway;
pub mod history;
pub mod policy;
pub mod record;
pub mod snapshot;

pub use backend::PublishBackend;
pub use config::{
    parse_domains, ConfigError, FieldError, FormErrors, FormField, PublishConfig, PublishForm,
    PublishRequest, DEFAULT_BASE_PATH,
};
pub use controller::{ControllerError, Notice, NoticeLevel, PanelState, PublishController};
pub use envelope::{unwrap_list, unwrap_one, EmptyReason, Unwrapped};
pub use gateway::{Gateway, GatewayDirectory, GatewayType};
pub use history::{
    truncate_message, EntryDetail, HistoryError, HistoryStatus, MessagePreview, PublishAction,
    PublishHistory, PublishHistoryEntry, DETAIL_PREVIEW_CHARS, TABLE_PREVIEW_CHARS,
};
pub use policy::{PolicyError, PublishConstraintPolicy, PublishDecision};
pub use record::{
    BindingEvent, BindingState, BindingTransition, PublishBinding, PublishRecord, RecordIssue,
    RecordStatus, TransitionError,
};
pub use snapshot::{normalize, DiffStats, SnapshotComparator, SnapshotDiff, SnapshotInput, ABSENT_MARKER};
