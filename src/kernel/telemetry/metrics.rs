use std::collections::{BTreeMap, VecDeque};

use serde::Serialize;

use super::event::TelemetryEvent;
use crate::kernel::scheduler::SuppressReason;
use crate::kernel::surface::{ClearReason, DeliveryOrigin, SurfaceId};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TelemetrySnapshot {
    pub emotions_ingested: u64,
    pub context_patches: u64,
    pub delivery_stats: DeliveryStats,
    pub suppression_stats: SuppressionStats,
    pub clear_stats: ClearStats,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DeliveryStats {
    pub proactive: u64,
    pub immediate: u64,
    pub per_surface: BTreeMap<SurfaceId, u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SuppressionStats {
    pub disposed: u64,
    pub busy: u64,
    pub cooldown: u64,
    pub global_cooldown: u64,
    pub no_candidates: u64,
    pub gated_out: u64,
    /// Share of gate-eligible ticks that were gated out.
    pub gate_rejection_ratio: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ClearStats {
    pub dismissed: u64,
    pub expired: u64,
    pub superseded: u64,
    pub disposed: u64,
}

pub fn compute_snapshot(events: &VecDeque<TelemetryEvent>) -> TelemetrySnapshot {
    let mut snap = TelemetrySnapshot::default();

    for event in events {
        match event {
            TelemetryEvent::EmotionIngested { .. } => snap.emotions_ingested += 1,
            TelemetryEvent::ContextPatched => snap.context_patches += 1,
            TelemetryEvent::Delivered { surface, origin, .. } => {
                match origin {
                    DeliveryOrigin::Proactive => snap.delivery_stats.proactive += 1,
                    DeliveryOrigin::Immediate => snap.delivery_stats.immediate += 1,
                }
                *snap.delivery_stats.per_surface.entry(surface.clone()).or_default() += 1;
            }
            TelemetryEvent::Suppressed { reason, .. } => {
                let s = &mut snap.suppression_stats;
                match reason {
                    SuppressReason::Disposed => s.disposed += 1,
                    SuppressReason::Busy => s.busy += 1,
                    SuppressReason::Cooldown => s.cooldown += 1,
                    SuppressReason::GlobalCooldown => s.global_cooldown += 1,
                    SuppressReason::NoCandidates => s.no_candidates += 1,
                    SuppressReason::GatedOut => s.gated_out += 1,
                }
            }
            TelemetryEvent::Cleared { reason, .. } => {
                let c = &mut snap.clear_stats;
                match reason {
                    ClearReason::Dismissed => c.dismissed += 1,
                    ClearReason::Expired => c.expired += 1,
                    ClearReason::Superseded => c.superseded += 1,
                    ClearReason::Disposed => c.disposed += 1,
                }
            }
        }
    }

    // Gate-eligible = reached the dice roll: either gated out or delivered proactively.
    let rolled = snap.suppression_stats.gated_out + snap.delivery_stats.proactive;
    if rolled > 0 {
        snap.suppression_stats.gate_rejection_ratio =
            snap.suppression_stats.gated_out as f64 / rolled as f64;
    }

    snap
}
