//! Error types for the farm services.
//!
//! Every failure carries its context as fields. Callers branch on
//! [`FarmError::kind`] rather than on messages.

use rust_decimal::Decimal;
use stealfarm_db::DbError;
use stealfarm_types::{CropId, PlayerId, PlotId};
use stealfarm_world::WorldError;

use crate::economy::EconomyError;

/// Coarse classification of a [`FarmError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A precondition was not met. Never retried.
    Validation,
    /// A concurrent writer got there first.
    Conflict,
    /// Bounded retries ran out.
    ResourceExhausted,
    /// The store failed. The operation did not happen.
    Persistence,
    /// The addressed record does not exist.
    NotFound,
    /// A collaborator or an invariant failed.
    Internal,
}

/// Errors returned by the farm services.
#[derive(Debug, thiserror::Error)]
pub enum FarmError {
    /// The player already has a plot.
    #[error("player {0} already owns a plot")]
    AlreadyOwnsPlot(PlayerId),

    /// The player has no plot.
    #[error("player {0} has no plot")]
    NoPlot(PlayerId),

    /// No plot with this id.
    #[error("plot not found: {0}")]
    PlotNotFound(PlotId),

    /// No crop with this id.
    #[error("crop not found: {0}")]
    CropNotFound(CropId),

    /// The crop type is not in the catalog.
    #[error("unknown crop type: {0}")]
    UnknownCropType(String),

    /// The trap type is not in the catalog.
    #[error("unknown trap type: {0}")]
    UnknownTrapType(String),

    /// The position lies outside the player's plot.
    #[error("position ({x}, {z}) in {world_id} is not on the plot of {owner}")]
    NotOnPlot {
        /// Acting player.
        owner: PlayerId,
        /// World of the position.
        world_id: String,
        /// Block X.
        x: i32,
        /// Block Z.
        z: i32,
    },

    /// Another crop already grows at the position.
    #[error("position ({x}, {y}, {z}) in {world_id} is occupied")]
    PositionOccupied {
        /// World of the position.
        world_id: String,
        /// Block X.
        x: i32,
        /// Block Y.
        y: i32,
        /// Block Z.
        z: i32,
    },

    /// The player acted on something they do not own.
    #[error("player {player} does not own crop {crop}")]
    NotOwner {
        /// Acting player.
        player: PlayerId,
        /// The crop.
        crop: CropId,
    },

    /// The action needs the player not to own the crop.
    #[error("player {0} cannot do this to their own crop")]
    OwnCrop(PlayerId),

    /// The crop has not reached its last stage.
    #[error("crop {0} is not mature")]
    NotMature(CropId),

    /// Acceleration on a crop that has nothing left to grow.
    #[error("crop {0} is already mature")]
    AlreadyMature(CropId),

    /// Watering requires friendship.
    #[error("players {a} and {b} are not friends")]
    NotFriends {
        /// First player.
        a: PlayerId,
        /// Second player.
        b: PlayerId,
    },

    /// A player cannot befriend themselves.
    #[error("player {0} cannot befriend themselves")]
    SelfFriendship(PlayerId),

    /// The waterer must wait.
    #[error("watering on cooldown for {remaining_ms} ms")]
    WaterOnCooldown {
        /// Time left.
        remaining_ms: i64,
    },

    /// The slot index is beyond the owner's capacity.
    #[error("trap slot {slot} out of range (capacity {capacity})")]
    SlotOutOfRange {
        /// Requested slot.
        slot: u32,
        /// Slots unlocked at the owner's level.
        capacity: u32,
    },

    /// The slot already holds a trap.
    #[error("trap slot {0} is occupied")]
    SlotOccupied(u32),

    /// The slot holds no trap.
    #[error("trap slot {0} is empty")]
    SlotEmpty(u32),

    /// The balance does not cover the cost.
    #[error("insufficient funds: need {needed}")]
    InsufficientFunds {
        /// Required amount.
        needed: Decimal,
    },

    /// The farm is at the highest configured level.
    #[error("farm already at max level {0}")]
    MaxLevel(u32),

    /// Bounded retries were used up.
    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),

    /// Persistence gateway failure.
    #[error("storage error: {source}")]
    Persistence {
        /// The underlying store error.
        #[from]
        source: DbError,
    },

    /// Geometry or catalog failure.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: WorldError,
    },

    /// Economy collaborator failure.
    #[error("economy error: {source}")]
    Economy {
        /// The underlying economy error.
        #[from]
        source: EconomyError,
    },
}

impl FarmError {
    /// Classify the error.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::AlreadyOwnsPlot(_)
            | Self::NoPlot(_)
            | Self::UnknownCropType(_)
            | Self::UnknownTrapType(_)
            | Self::NotOnPlot { .. }
            | Self::PositionOccupied { .. }
            | Self::NotOwner { .. }
            | Self::OwnCrop(_)
            | Self::NotMature(_)
            | Self::AlreadyMature(_)
            | Self::NotFriends { .. }
            | Self::SelfFriendship(_)
            | Self::WaterOnCooldown { .. }
            | Self::SlotOutOfRange { .. }
            | Self::SlotEmpty(_)
            | Self::InsufficientFunds { .. }
            | Self::MaxLevel(_) => ErrorKind::Validation,
            Self::SlotOccupied(_) => ErrorKind::Conflict,
            Self::PlotNotFound(_) | Self::CropNotFound(_) => ErrorKind::NotFound,
            Self::ResourceExhausted(_) => ErrorKind::ResourceExhausted,
            Self::Persistence { source } => match source {
                DbError::Conflict(_) => ErrorKind::Conflict,
                DbError::NotFound(_) => ErrorKind::NotFound,
                _ => ErrorKind::Persistence,
            },
            Self::World { source } => match source {
                WorldError::GridExhausted { .. } => ErrorKind::ResourceExhausted,
                WorldError::NegativeExpansion(_) | WorldError::PlotTooLarge { .. } => {
                    ErrorKind::Validation
                }
                _ => ErrorKind::Internal,
            },
            Self::Economy { .. } => ErrorKind::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_the_taxonomy() {
        assert_eq!(
            FarmError::AlreadyOwnsPlot(PlayerId::new()).kind(),
            ErrorKind::Validation
        );
        assert_eq!(FarmError::SlotOccupied(0).kind(), ErrorKind::Conflict);
        assert_eq!(
            FarmError::from(DbError::Unavailable("down".into())).kind(),
            ErrorKind::Persistence
        );
        assert_eq!(
            FarmError::from(DbError::Conflict("cell".into())).kind(),
            ErrorKind::Conflict
        );
        assert_eq!(
            FarmError::from(WorldError::GridExhausted { probes: 4 }).kind(),
            ErrorKind::ResourceExhausted
        );
        assert_eq!(
            FarmError::CropNotFound(CropId::new()).kind(),
            ErrorKind::NotFound
        );
    }
}
