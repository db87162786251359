//! Domain events emitted by the simulation core.
//!
//! Downstream consumers (achievements, notifications, leaderboards, the
//! terrain renderer) subscribe to these through an event sink. The core
//! never knows who is listening.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::enums::{AccelerateReason, TrapPenalty};
use crate::ids::{CropId, PlayerId};
use crate::structs::{CropInstance, Plot, Region};

/// Something observable happened in the farm world.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FarmEvent {
    /// A new plot was allocated to a first-time player.
    PlotAllocated {
        /// The new owner.
        owner_id: PlayerId,
        /// The allocated plot.
        plot: Plot,
    },
    /// A plot's half-width grew.
    PlotExpanded {
        /// The plot after expansion.
        plot: Plot,
        /// Half-width before.
        old_size: i32,
        /// Half-width after.
        new_size: i32,
    },
    /// A plot was restored to its initial size.
    PlotReset {
        /// The plot after the reset.
        plot: Plot,
        /// Region whose terrain must be cleared by the world renderer.
        cleared: Region,
    },
    /// A plot was removed by an administrator.
    PlotDeleted {
        /// The plot as it was before deletion.
        plot: Plot,
    },
    /// A crop was planted.
    CropPlanted {
        /// The new crop.
        crop: CropInstance,
    },
    /// An owner harvested their own crop.
    CropHarvested {
        /// The crop as it was before removal.
        crop: CropInstance,
        /// Yield granted. Zero when harvested before maturity.
        amount: u32,
    },
    /// A crop's growth stage changed because its timestamp was moved back.
    CropGrowthAccelerated {
        /// The accelerated crop.
        crop_id: CropId,
        /// Stage before acceleration.
        old_stage: usize,
        /// Stage after acceleration.
        new_stage: usize,
        /// What caused it.
        reason: AccelerateReason,
    },
    /// A friend watered an owner's crop.
    CropWatered {
        /// The friend doing the watering.
        waterer_id: PlayerId,
        /// The plot owner.
        owner_id: PlayerId,
        /// The watered crop.
        crop_id: CropId,
        /// Stage after the watering.
        new_stage: usize,
    },
    /// A theft succeeded.
    CropStolen {
        /// The thief.
        thief_id: PlayerId,
        /// The victim.
        victim_id: PlayerId,
        /// Crop type taken.
        crop_type: String,
        /// Yield granted to the thief.
        amount: u32,
    },
    /// A thief reached the steal limit for a victim.
    StealCooldownStarted {
        /// The thief.
        thief_id: PlayerId,
        /// The victim.
        victim_id: PlayerId,
        /// When stealing from this victim becomes possible again.
        cooldown_end: i64,
    },
    /// A trap fired against a thief.
    TrapTriggered {
        /// The thief.
        thief_id: PlayerId,
        /// The plot owner.
        victim_id: PlayerId,
        /// Trap type that fired.
        trap_type: String,
        /// Penalty applied.
        penalty: TrapPenalty,
        /// Penalty magnitude.
        penalty_value: Decimal,
    },
    /// An owner placed a trap in a slot.
    TrapDeployed {
        /// The owner.
        owner_id: PlayerId,
        /// Trap type placed.
        trap_type: String,
        /// Slot used.
        slot_index: u32,
    },
    /// A thief was marked as the victim's enemy for the first time.
    EnemyMarked {
        /// The victim.
        victim_id: PlayerId,
        /// The thief.
        thief_id: PlayerId,
    },
    /// An owner upgraded their farm level.
    FarmUpgraded {
        /// The owner.
        owner_id: PlayerId,
        /// Level before.
        old_level: u32,
        /// Level after.
        new_level: u32,
    },
}

impl FarmEvent {
    /// Short machine name of the event, used as a log field.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::PlotAllocated { .. } => "plot_allocated",
            Self::PlotExpanded { .. } => "plot_expanded",
            Self::PlotReset { .. } => "plot_reset",
            Self::PlotDeleted { .. } => "plot_deleted",
            Self::CropPlanted { .. } => "crop_planted",
            Self::CropHarvested { .. } => "crop_harvested",
            Self::CropGrowthAccelerated { .. } => "crop_growth_accelerated",
            Self::CropWatered { .. } => "crop_watered",
            Self::CropStolen { .. } => "crop_stolen",
            Self::StealCooldownStarted { .. } => "steal_cooldown_started",
            Self::TrapTriggered { .. } => "trap_triggered",
            Self::TrapDeployed { .. } => "trap_deployed",
            Self::EnemyMarked { .. } => "enemy_marked",
            Self::FarmUpgraded { .. } => "farm_upgraded",
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_type_tag() {
        let event = FarmEvent::CropStolen {
            thief_id: PlayerId::new(),
            victim_id: PlayerId::new(),
            crop_type: "wheat".into(),
            amount: 2,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "crop_stolen");
        assert_eq!(json["amount"], 2);
        assert_eq!(event.name(), "crop_stolen");
    }

    #[test]
    fn trap_event_carries_decimal_value() {
        let event = FarmEvent::TrapTriggered {
            thief_id: PlayerId::new(),
            victim_id: PlayerId::new(),
            trap_type: "bear_trap".into(),
            penalty: TrapPenalty::MoneyDeduction,
            penalty_value: rust_decimal_macros::dec!(25.5),
        };
        let json = serde_json::to_string(&event).unwrap();
        let back: FarmEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}
