//! Operator-facing control verbs
//!
//! A thin request/reply layer over the engine for embedding in whatever
//! front end a deployment uses (CLI, control socket, RPC). Requests and
//! replies serialize as JSON so front ends can stay protocol-agnostic.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::engine::ReconcileEngine;
use crate::error::Error;
use crate::record::{InterfaceRecord, Mode};

/// A control request against the engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verb", rename_all = "camelCase")]
pub enum ControlRequest {
    /// Report one interface's record, or all of them
    Status { interface: Option<String> },

    /// Redo the interface's current treatment: a fresh lease when dynamic,
    /// a re-apply when static
    Reload { interface: String },

    /// Request a fresh lease, switching the interface to dynamic mode
    Request { interface: String },

    /// Apply the record's stored address statically
    Assign { interface: String },

    /// Bring the link administratively up
    Up { interface: String },

    /// Take the link administratively down
    Down { interface: String },

    /// Remove every address from the interface
    Flush { interface: String },
}

/// Outcome classification for a control request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ControlStatus {
    /// The request was carried out
    Ok,
    /// The named interface is not in the registry
    NotFound,
    /// The request reached the engine but could not be carried out
    Failed,
}

/// Reply to a control request
///
/// `interfaces` is populated for status requests and empty otherwise.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlReply {
    pub status: ControlStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interfaces: Vec<InterfaceRecord>,
}

impl ControlReply {
    fn ok() -> Self {
        Self {
            status: ControlStatus::Ok,
            interfaces: Vec::new(),
        }
    }

    fn of(status: ControlStatus) -> Self {
        Self {
            status,
            interfaces: Vec::new(),
        }
    }
}

/// Run one control request against the engine
pub async fn dispatch(engine: &ReconcileEngine, request: ControlRequest) -> ControlReply {
    debug!("Control request: {:?}", request);
    match request {
        ControlRequest::Status { interface: None } => ControlReply {
            status: ControlStatus::Ok,
            interfaces: engine.snapshot().await,
        },
        ControlRequest::Status {
            interface: Some(name),
        } => match engine.snapshot_one(&name).await {
            Ok(record) => ControlReply {
                status: ControlStatus::Ok,
                interfaces: vec![record],
            },
            Err(e) => ControlReply::of(classify(&e)),
        },
        ControlRequest::Reload { interface } => match engine.snapshot_one(&interface).await {
            Ok(record) => {
                let dynamic = record.mode == Mode::Dynamic;
                run(engine.reconfigure(&interface, dynamic).await)
            }
            Err(e) => ControlReply::of(classify(&e)),
        },
        ControlRequest::Request { interface } => run(engine.reconfigure(&interface, true).await),
        ControlRequest::Assign { interface } => run(engine.reconfigure(&interface, false).await),
        ControlRequest::Up { interface } => run(engine.set_link(&interface, true).await),
        ControlRequest::Down { interface } => run(engine.set_link(&interface, false).await),
        ControlRequest::Flush { interface } => run(engine.flush(&interface).await),
    }
}

fn run(result: crate::error::Result<()>) -> ControlReply {
    match result {
        Ok(()) => ControlReply::ok(),
        Err(e) => ControlReply::of(classify(&e)),
    }
}

fn classify(error: &Error) -> ControlStatus {
    match error {
        Error::UnknownInterface(_) => ControlStatus::NotFound,
        _ => ControlStatus::Failed,
    }
}
