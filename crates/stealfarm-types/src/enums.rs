//! Enumeration types for the Stealfarm simulation core.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Traps
// ---------------------------------------------------------------------------

/// The effect a trap applies to a thief when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrapPenalty {
    /// Movement slowdown; `penalty_value` is the effect duration in seconds.
    Slowness,
    /// Currency is withdrawn from the thief; `penalty_value` is the amount.
    MoneyDeduction,
    /// The thief is moved away from the plot; `penalty_value` is unused.
    ForceTeleport,
}

impl TrapPenalty {
    /// Stable storage name for the penalty.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Slowness => "slowness",
            Self::MoneyDeduction => "money_deduction",
            Self::ForceTeleport => "force_teleport",
        }
    }

    /// Parse a storage name back into a penalty.
    pub fn parse(name: &str) -> Option<Self> {
        [Self::Slowness, Self::MoneyDeduction, Self::ForceTeleport]
            .into_iter()
            .find(|p| p.as_str() == name)
    }
}

// ---------------------------------------------------------------------------
// Statistics
// ---------------------------------------------------------------------------

/// Cumulative per-player counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatisticKind {
    /// Crops harvested from the player's own plot.
    TotalHarvest,
    /// Crops taken from other players.
    TotalSteal,
    /// Crops lost to other players.
    TotalStolen,
    /// Traps the player has set off while stealing.
    TrapTriggeredCount,
}

impl StatisticKind {
    /// Every statistic, in storage order.
    pub const ALL: [Self; 4] = [
        Self::TotalHarvest,
        Self::TotalSteal,
        Self::TotalStolen,
        Self::TrapTriggeredCount,
    ];

    /// Stable storage name for the statistic.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TotalHarvest => "total_harvest",
            Self::TotalSteal => "total_steal",
            Self::TotalStolen => "total_stolen",
            Self::TrapTriggeredCount => "trap_triggered_count",
        }
    }

    /// Parse a storage name back into a statistic.
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == name)
    }
}

// ---------------------------------------------------------------------------
// Crop lifecycle
// ---------------------------------------------------------------------------

/// Why a crop's planted timestamp was moved backwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccelerateReason {
    /// The owner applied fertilizer.
    Fertilizer,
    /// A friend watered the crop.
    Watering,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statistic_names_round_trip() {
        for kind in StatisticKind::ALL {
            assert_eq!(StatisticKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(StatisticKind::parse("coins"), None);
    }
}
