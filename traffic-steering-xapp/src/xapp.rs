//! Traffic steering xApp core: message dispatch, indication and policy
//! handling.

use crate::a1::{self, PolicyDocument};
use crate::clock::{Clock, SystemClock};
use crate::config::{FeatureConf, TimeoutConf, XAppConfig};
use crate::control::{self, ControlSink, LoggingControlSink};
use crate::e2;
use crate::error::{Cause, ErrorCode, Severity, XAppError};
use crate::health::HealthTracker;
use crate::models::{A1Policy, CellMetrics, SteeringDecision};
use crate::retry::RetryPolicy;
use crate::rmr::{MessageKind, RmrMessage, A1_POLICY_REQUEST};
use crate::state::{MetricsStore, PolicyStore};
use crate::steering::{self, SteeringStrategy};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

pub const XAPP_NAME: &str = "traffic-steering-xapp";
pub const XAPP_VERSION: &str = "l-release-2.0.0";

/// Body of `POST /ric/v1/steering/decision`.
#[derive(Debug, Clone, Deserialize)]
pub struct DecisionRequest {
    pub cell_id: String,
    #[serde(default)]
    pub metrics: HashMap<String, f64>,
}

pub struct TrafficSteeringXApp {
    correlation_id: String,
    features: FeatureConf,
    timeouts: TimeoutConf,
    retry: RetryPolicy,
    metrics: MetricsStore,
    policies: PolicyStore,
    strategy: Arc<dyn SteeringStrategy>,
    control: Arc<dyn ControlSink>,
    clock: Arc<dyn Clock>,
    health: HealthTracker,
}

impl TrafficSteeringXApp {
    pub fn new(config: &XAppConfig, health: HealthTracker) -> Self {
        Self {
            correlation_id: Uuid::new_v4().to_string(),
            features: config.features.clone(),
            timeouts: config.timeouts.clone(),
            retry: config.retry.policy(),
            metrics: MetricsStore::new(),
            policies: PolicyStore::new(),
            strategy: steering::strategy_for(config.features.ai_ml_enabled),
            control: Arc::new(LoggingControlSink),
            clock: Arc::new(SystemClock),
            health,
        }
    }

    pub fn with_control_sink(mut self, sink: Arc<dyn ControlSink>) -> Self {
        self.control = sink;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }

    pub fn features(&self) -> &FeatureConf {
        &self.features
    }

    pub fn metrics(&self) -> &MetricsStore {
        &self.metrics
    }

    pub fn policies(&self) -> &PolicyStore {
        &self.policies
    }

    pub fn health(&self) -> &HealthTracker {
        &self.health
    }

    pub fn is_ready(&self) -> bool {
        self.features.is_ready()
    }

    fn wrap(&self, code: ErrorCode, message: &str, message_type: u32, cause: Cause) -> XAppError {
        XAppError::wrap(code, message, message_type, &self.correlation_id, cause)
    }

    /// Routes one inbound message. The whole handling runs under the
    /// processing deadline; errors are logged here and returned as is.
    pub async fn consume(&self, msg: &RmrMessage, cancel: &CancellationToken) -> Result<(), XAppError> {
        info!(
            message_type = msg.message_type,
            source = %msg.source,
            payload_length = msg.payload.len(),
            "processing RMR message"
        );

        let result = match MessageKind::try_from(msg.message_type) {
            Ok(kind) => {
                let deadline = self.timeouts.process();
                let handling = async {
                    match kind {
                        MessageKind::Indication => self.handle_indication(msg, cancel).await.map(|_| ()),
                        MessageKind::PolicyRequest => self.handle_policy_request(msg, cancel).await.map(|_| ()),
                    }
                };
                match tokio::time::timeout(deadline, handling).await {
                    Ok(result) => result,
                    Err(_) => Err(self.wrap(
                        ErrorCode::Cancelled,
                        "Message processing deadline exceeded",
                        msg.message_type,
                        Cause::DeadlineExceeded(deadline),
                    )),
                }
            }
            Err(unknown) => Err(self.wrap(
                ErrorCode::UnknownMessageType,
                "Unknown RMR message type received",
                unknown,
                Cause::UnknownMessageType(unknown),
            )),
        };

        match &result {
            Ok(()) => self.health.record_processed(),
            Err(e) => {
                self.health.record_failed();
                log_failure(e);
            }
        }
        result
    }

    /// Decode, cache, decide, send control. Returns the decision taken.
    pub async fn handle_indication(
        &self,
        msg: &RmrMessage,
        cancel: &CancellationToken,
    ) -> Result<SteeringDecision, XAppError> {
        debug!(payload_size = msg.payload.len(), "handling E2 indication");

        let payload = msg.payload.as_slice();
        let clock = &self.clock;
        let metrics = self
            .retry
            .run(cancel, "decode_indication", move || async move {
                e2::decode_indication(payload, clock.now())
            })
            .await
            .map_err(|c| self.wrap(ErrorCode::E2ParseFailed, "Failed to parse E2 indication", msg.message_type, c))?;

        debug!(
            cell_id = %metrics.cell_id,
            ue_count = metrics.ue_count,
            throughput = metrics.throughput_mbps,
            energy_efficiency = metrics.energy_efficiency,
            "E2 metrics decoded"
        );
        self.metrics.upsert(metrics.cell_id.clone(), metrics.clone());

        let decision = self.strategy.decide(&metrics, self.clock.now());
        debug!(cell_id = %metrics.cell_id, strategy = self.strategy.name(), action = decision.action.as_str(), "steering decision made");

        self.send_control_request(&decision, msg.message_type, cancel).await?;

        info!(
            cell_id = %metrics.cell_id,
            action = decision.action.as_str(),
            confidence = decision.confidence,
            "E2 indication processed"
        );
        Ok(decision)
    }

    async fn send_control_request(
        &self,
        decision: &SteeringDecision,
        message_type: u32,
        cancel: &CancellationToken,
    ) -> Result<(), XAppError> {
        let fail = |c: Cause| self.wrap(ErrorCode::ControlRequestFailed, "Failed to send E2 control request", message_type, c);

        let request = control::build_control_request(decision).map_err(fail)?;
        let sink = &self.control;
        let request = &request;
        let per_attempt = self.timeouts.control();

        self.retry
            .run(cancel, "send_control_request", move || async move {
                match tokio::time::timeout(per_attempt, sink.send(request)).await {
                    Ok(sent) => sent,
                    Err(_) => Err(Cause::Timeout(per_attempt)),
                }
            })
            .await
            .map_err(fail)?;

        debug!(action = decision.action.as_str(), reasoning = %decision.reasoning, "control request delivered");
        Ok(())
    }

    /// Decode, validate, store. Returns the stored policy.
    pub async fn handle_policy_request(
        &self,
        msg: &RmrMessage,
        cancel: &CancellationToken,
    ) -> Result<A1Policy, XAppError> {
        debug!(payload_size = msg.payload.len(), "handling A1 policy request");

        let payload = msg.payload.as_slice();
        let clock = &self.clock;
        let policy = self
            .retry
            .run(cancel, "decode_policy", move || async move { a1::decode_policy(payload, clock.now()) })
            .await
            .map_err(|c| self.wrap(ErrorCode::A1ParseFailed, "Failed to parse A1 policy", msg.message_type, c))?;

        self.store_policy(policy, msg.message_type)
    }

    /// Policy submitted over HTTP.
    pub fn submit_policy(&self, doc: PolicyDocument) -> Result<A1Policy, XAppError> {
        let policy = doc.into_policy(self.clock.now());
        self.store_policy(policy, A1_POLICY_REQUEST)
    }

    fn store_policy(&self, policy: A1Policy, message_type: u32) -> Result<A1Policy, XAppError> {
        a1::validate_policy(&policy, self.clock.now())
            .map_err(|c| self.wrap(ErrorCode::A1ValidationFailed, "A1 policy validation failed", message_type, c))?;

        if self.policies.upsert(policy.policy_id.clone(), policy.clone()).is_some() {
            debug!(policy_id = %policy.policy_id, "replacing existing policy");
        }
        info!(policy_id = %policy.policy_id, policy_type = %policy.policy_type, "A1 policy stored");
        Ok(policy)
    }

    /// Decision for ad hoc metric values. Nothing is cached.
    pub fn decide(&self, request: &DecisionRequest) -> SteeringDecision {
        let now = self.clock.now();
        let value = |key: &str| request.metrics.get(key).copied().unwrap_or_default();

        let metrics = CellMetrics {
            cell_id: request.cell_id.clone(),
            ue_count: value("ue_count").max(0.0) as u32,
            throughput_mbps: value("throughput"),
            latency_ms: value("latency"),
            packet_loss_percent: value("packet_loss"),
            prb_usage_dl: value("prb_usage_dl"),
            prb_usage_ul: value("prb_usage_ul"),
            rsrp_dbm: value("rsrp"),
            rsrq_db: value("rsrq"),
            energy_efficiency: value("energy_efficiency"),
            timestamp: now,
        };
        self.strategy.decide(&metrics, now)
    }
}

fn log_failure(e: &XAppError) {
    match e.severity {
        Severity::Critical => error!(code = %e.code, retryable = e.retryable, error = %e, "message handling failed"),
        Severity::Error | Severity::Warning => {
            warn!(code = %e.code, retryable = e.retryable, error = %e, "message handling failed")
        }
        Severity::Info => info!(code = %e.code, error = %e, "message handling failed"),
    }
}
