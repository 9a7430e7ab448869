use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use time::OffsetDateTime;

/// Last known measurements of one cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellMetrics {
    pub cell_id: String,
    pub ue_count: u32,
    pub throughput_mbps: f64,
    pub latency_ms: f64,
    pub packet_loss_percent: f64,
    pub prb_usage_dl: f64,
    pub prb_usage_ul: f64,
    pub rsrp_dbm: f64,
    pub rsrq_db: f64,
    pub energy_efficiency: f64,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SteeringAction {
    Optimize,
    EnergyOptimize,
    LoadBalance,
    PowerControl,
    Handover,
}

impl SteeringAction {
    pub const ALL: [SteeringAction; 5] = [
        SteeringAction::Optimize,
        SteeringAction::EnergyOptimize,
        SteeringAction::LoadBalance,
        SteeringAction::PowerControl,
        SteeringAction::Handover,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SteeringAction::Optimize => "optimize",
            SteeringAction::EnergyOptimize => "energy_optimize",
            SteeringAction::LoadBalance => "load_balance",
            SteeringAction::PowerControl => "power_control",
            SteeringAction::Handover => "handover",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SteeringDecision {
    pub action: SteeringAction,
    pub parameters: BTreeMap<String, String>,
    pub priority: u8,
    #[serde(with = "time::serde::rfc3339")]
    pub valid_until: OffsetDateTime,
    pub confidence: f64,
    pub reasoning: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct A1Policy {
    pub policy_id: String,
    #[serde(rename = "type")]
    pub policy_type: String,
    pub parameters: HashMap<String, serde_json::Value>,
    pub scope: Vec<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub valid_from: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub valid_until: OffsetDateTime,
}
