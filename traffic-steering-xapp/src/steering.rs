//! Steering decision strategies.
//!
//! Both strategies are threshold rules. The "model assisted" one carries the
//! AI/ML label of the feature flag but runs no model; its thresholds are
//! illustrative placeholders, not tuned radio parameters. A real model
//! serving integration would slot in as another [`SteeringStrategy`].

use crate::models::{CellMetrics, SteeringAction, SteeringDecision};
use std::collections::BTreeMap;
use std::sync::Arc;
use time::{Duration, OffsetDateTime};

const DECISION_TTL: Duration = Duration::minutes(5);

const LOW_THROUGHPUT_MBPS: f64 = 50.0;
const HIGH_PACKET_LOSS_PERCENT: f64 = 1.0;
const LOW_ENERGY_EFFICIENCY: f64 = 5.0;
const HIGH_PRB_USAGE_DL: f64 = 80.0;

pub const MODEL_NAME: &str = "traffic_steering_v2.0";

/// Feature vector in, decision out.
pub trait SteeringStrategy: Send + Sync {
    fn name(&self) -> &'static str;
    fn decide(&self, metrics: &CellMetrics, now: OffsetDateTime) -> SteeringDecision;
}

pub fn strategy_for(ai_ml_enabled: bool) -> Arc<dyn SteeringStrategy> {
    if ai_ml_enabled {
        Arc::new(ModelAssistedStrategy)
    } else {
        Arc::new(RuleBasedStrategy)
    }
}

/// Neighbour picked for handover / load balancing: `cell-1` ..= `cell-10`,
/// derived from the decision time.
fn target_cell(now: OffsetDateTime) -> String {
    format!("cell-{}", now.unix_timestamp().rem_euclid(10) + 1)
}

fn decision(action: SteeringAction, now: OffsetDateTime, confidence: f64, reasoning: &str) -> SteeringDecision {
    SteeringDecision {
        action,
        parameters: BTreeMap::new(),
        priority: 1,
        valid_until: now + DECISION_TTL,
        confidence,
        reasoning: reasoning.to_string(),
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RuleBasedStrategy;

impl SteeringStrategy for RuleBasedStrategy {
    fn name(&self) -> &'static str {
        "rule_based"
    }

    fn decide(&self, metrics: &CellMetrics, now: OffsetDateTime) -> SteeringDecision {
        let mut d = decision(
            SteeringAction::Optimize,
            now,
            0.75,
            "Rule-based decision using traditional thresholds",
        );

        if metrics.throughput_mbps < LOW_THROUGHPUT_MBPS {
            d.action = SteeringAction::Handover;
            d.parameters.insert("target_cell".into(), target_cell(now));
            d.priority = 2;
        } else if metrics.packet_loss_percent > HIGH_PACKET_LOSS_PERCENT {
            d.action = SteeringAction::PowerControl;
            d.parameters.insert("power_level".into(), "high".into());
        }

        d.parameters.insert("cell_id".into(), metrics.cell_id.clone());
        d
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ModelAssistedStrategy;

impl SteeringStrategy for ModelAssistedStrategy {
    fn name(&self) -> &'static str {
        "model_assisted"
    }

    fn decide(&self, metrics: &CellMetrics, now: OffsetDateTime) -> SteeringDecision {
        let mut d = if metrics.energy_efficiency < LOW_ENERGY_EFFICIENCY {
            let mut d = decision(
                SteeringAction::EnergyOptimize,
                now,
                0.92,
                "Energy efficiency below threshold, AI/ML recommends optimization",
            );
            d.parameters.insert("target_efficiency".into(), "7.5".into());
            d
        } else if metrics.throughput_mbps < LOW_THROUGHPUT_MBPS && metrics.prb_usage_dl > HIGH_PRB_USAGE_DL {
            let mut d = decision(
                SteeringAction::LoadBalance,
                now,
                0.88,
                "High PRB usage with low throughput, AI/ML suggests load balancing",
            );
            d.parameters.insert("target_cell".into(), target_cell(now));
            d.parameters.insert("load_distribution".into(), "60:40".into());
            d
        } else if metrics.packet_loss_percent > HIGH_PACKET_LOSS_PERCENT {
            let mut d = decision(
                SteeringAction::PowerControl,
                now,
                0.85,
                "Packet loss detected, AI/ML recommends power adjustment",
            );
            d.parameters.insert("power_level".into(), "high".into());
            d
        } else {
            decision(
                SteeringAction::Optimize,
                now,
                0.95,
                "AI/ML model prediction based on historical patterns",
            )
        };

        d.parameters.insert("cell_id".into(), metrics.cell_id.clone());
        d.parameters.insert("ai_ml_model".into(), MODEL_NAME.into());
        d
    }
}
