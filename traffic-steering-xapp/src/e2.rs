//! Simulated E2 indication decoding.
//!
//! The payload layout below is a placeholder, NOT E2AP: no ASN.1 schema is
//! involved and the offsets mean nothing to a real E2 node. Each of the first
//! ten bytes maps to one field through a fixed scaling:
//!
//! | byte | field                 | value                 |
//! |------|-----------------------|-----------------------|
//! | 0    | `ue_count`            | `b0`                  |
//! | 1    | `throughput_mbps`     | `b1 * 10.0`           |
//! | 2    | `latency_ms`          | `b2 * 0.5`            |
//! | 3    | `packet_loss_percent` | `b3 * 0.1`            |
//! | 4    | `cell_id`             | `"cell-{b4}"`         |
//! | 5    | `prb_usage_dl`        | `b5 * 1.5`            |
//! | 6    | `prb_usage_ul`        | `b6 * 1.2`            |
//! | 7    | `rsrp_dbm`            | `-70.0 - b7`          |
//! | 8    | `rsrq_db`             | `-10.0 - b8`          |
//! | 9    | `energy_efficiency`   | `b1 / (b9 + 1)`       |
//!
//! Bytes past offset 9 are ignored.

use crate::error::Cause;
use crate::models::CellMetrics;
use time::OffsetDateTime;

pub const MIN_INDICATION_LEN: usize = 10;

pub fn decode_indication(payload: &[u8], now: OffsetDateTime) -> Result<CellMetrics, Cause> {
    if payload.len() < MIN_INDICATION_LEN {
        return Err(Cause::PayloadTooShort {
            len: payload.len(),
            min: MIN_INDICATION_LEN,
        });
    }

    let b = |i: usize| f64::from(payload[i]);

    Ok(CellMetrics {
        cell_id: format!("cell-{}", payload[4]),
        ue_count: u32::from(payload[0]),
        throughput_mbps: b(1) * 10.0,
        latency_ms: b(2) * 0.5,
        packet_loss_percent: b(3) * 0.1,
        prb_usage_dl: b(5) * 1.5,
        prb_usage_ul: b(6) * 1.2,
        rsrp_dbm: -70.0 - b(7),
        rsrq_db: -10.0 - b(8),
        // throughput over power
        energy_efficiency: b(1) / (b(9) + 1.0),
        timestamp: now,
    })
}
