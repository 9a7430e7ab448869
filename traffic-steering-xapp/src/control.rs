//! Outbound E2 control requests.
//!
//! No E2 termination is reachable from this process; the default sink only
//! logs what would have been sent.

use crate::error::Cause;
use crate::models::{SteeringAction, SteeringDecision};
use crate::rmr::{RmrMessage, E2_CONTROL_REQUEST};
use async_trait::async_trait;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::info;

pub const CONTROL_SOURCE: &str = "traffic-steering-xapp";
pub const CONTROL_DESTINATION: &str = "e2term";

#[async_trait]
pub trait ControlSink: Send + Sync {
    async fn send(&self, message: &RmrMessage) -> Result<(), Cause>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingControlSink;

#[async_trait]
impl ControlSink for LoggingControlSink {
    async fn send(&self, message: &RmrMessage) -> Result<(), Cause> {
        info!(
            message_type = message.message_type,
            source = %message.source,
            destination = %message.destination,
            payload = %String::from_utf8_lossy(&message.payload),
            "control request sent"
        );
        Ok(())
    }
}

#[derive(Serialize)]
struct ControlPayload<'a> {
    action: SteeringAction,
    parameters: &'a BTreeMap<String, String>,
    priority: u8,
    confidence: f64,
}

pub fn build_control_request(decision: &SteeringDecision) -> Result<RmrMessage, Cause> {
    let payload = serde_json::to_vec(&ControlPayload {
        action: decision.action,
        parameters: &decision.parameters,
        priority: decision.priority,
        confidence: decision.confidence,
    })
    .map_err(Cause::Encode)?;

    Ok(RmrMessage::new(E2_CONTROL_REQUEST, payload, CONTROL_SOURCE, CONTROL_DESTINATION))
}
