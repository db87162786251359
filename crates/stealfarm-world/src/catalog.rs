//! Read-only catalogs of crop, trap, and farm level definitions.
//!
//! Catalogs validate their definitions once at construction and are
//! immutable afterwards. Reloading configuration builds a new catalog.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use stealfarm_types::{CropDefinition, FarmLevelDefinition, TrapDefinition};

use crate::error::WorldError;

// ---------------------------------------------------------------------------
// CropCatalog
// ---------------------------------------------------------------------------

/// Validated crop definitions keyed by crop type id.
#[derive(Debug, Clone, Default)]
pub struct CropCatalog {
    crops: BTreeMap<String, CropDefinition>,
    by_seed: BTreeMap<String, String>,
}

impl CropCatalog {
    /// Build a catalog, rejecting definitions that break the stage invariants.
    pub fn new(defs: impl IntoIterator<Item = CropDefinition>) -> Result<Self, WorldError> {
        let mut catalog = Self::default();
        for def in defs {
            validate_crop(&def)?;
            if catalog.crops.contains_key(&def.id) {
                return Err(WorldError::DuplicateDefinition {
                    kind: "crop",
                    id: def.id,
                });
            }
            catalog.by_seed.insert(def.seed_item.clone(), def.id.clone());
            catalog.crops.insert(def.id.clone(), def);
        }
        Ok(catalog)
    }

    /// Look up a crop type.
    pub fn get(&self, id: &str) -> Option<&CropDefinition> {
        self.crops.get(id)
    }

    /// Look up the crop type planted by a seed item.
    pub fn by_seed(&self, seed_item: &str) -> Option<&CropDefinition> {
        self.by_seed.get(seed_item).and_then(|id| self.crops.get(id))
    }

    /// All crop types, ordered by id.
    pub fn all(&self) -> impl Iterator<Item = &CropDefinition> {
        self.crops.values()
    }

    /// Number of crop types.
    pub fn len(&self) -> usize {
        self.crops.len()
    }

    /// `true` when no crop types are defined.
    pub fn is_empty(&self) -> bool {
        self.crops.is_empty()
    }
}

fn validate_crop(def: &CropDefinition) -> Result<(), WorldError> {
    if def.stages.is_empty() {
        return Err(WorldError::EmptyStages {
            crop: def.id.clone(),
        });
    }
    for (expected, stage) in (0_u32..).zip(&def.stages) {
        if stage.index != expected {
            return Err(WorldError::NonContiguousStage {
                crop: def.id.clone(),
                expected,
                found: stage.index,
            });
        }
        if stage.duration_ms < 0 {
            return Err(WorldError::NegativeDuration {
                crop: def.id.clone(),
                index: stage.index,
            });
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// TrapCatalog
// ---------------------------------------------------------------------------

/// Validated trap definitions keyed by trap type id.
#[derive(Debug, Clone, Default)]
pub struct TrapCatalog {
    traps: BTreeMap<String, TrapDefinition>,
}

impl TrapCatalog {
    /// Build a catalog, rejecting trigger chances outside `[0, 1]`.
    pub fn new(defs: impl IntoIterator<Item = TrapDefinition>) -> Result<Self, WorldError> {
        let mut traps = BTreeMap::new();
        for def in defs {
            if def.trigger_chance < Decimal::ZERO || def.trigger_chance > Decimal::ONE {
                return Err(WorldError::InvalidTriggerChance { trap: def.id });
            }
            if traps.contains_key(&def.id) {
                return Err(WorldError::DuplicateDefinition {
                    kind: "trap",
                    id: def.id,
                });
            }
            traps.insert(def.id.clone(), def);
        }
        Ok(Self { traps })
    }

    /// Look up a trap type.
    pub fn get(&self, id: &str) -> Option<&TrapDefinition> {
        self.traps.get(id)
    }

    /// All trap types, ordered by id.
    pub fn all(&self) -> impl Iterator<Item = &TrapDefinition> {
        self.traps.values()
    }
}

// ---------------------------------------------------------------------------
// LevelCatalog
// ---------------------------------------------------------------------------

/// Farm level definitions keyed by level number.
///
/// Unknown levels fall back to no protection and no trap slots.
#[derive(Debug, Clone, Default)]
pub struct LevelCatalog {
    levels: BTreeMap<u32, FarmLevelDefinition>,
}

impl LevelCatalog {
    /// Build a catalog, rejecting repeated level numbers.
    pub fn new(defs: impl IntoIterator<Item = FarmLevelDefinition>) -> Result<Self, WorldError> {
        let mut levels = BTreeMap::new();
        for def in defs {
            if levels.contains_key(&def.level) {
                return Err(WorldError::DuplicateDefinition {
                    kind: "level",
                    id: def.level.to_string(),
                });
            }
            levels.insert(def.level, def);
        }
        Ok(Self { levels })
    }

    /// Look up a level.
    pub fn get(&self, level: u32) -> Option<&FarmLevelDefinition> {
        self.levels.get(&level)
    }

    /// Highest defined level, or 1 when the catalog is empty.
    pub fn max_level(&self) -> u32 {
        self.levels.keys().next_back().copied().unwrap_or(1)
    }

    /// Steal ratio reduction granted by `level`.
    pub fn steal_ratio_reduction(&self, level: u32) -> Decimal {
        self.get(level)
            .map_or(Decimal::ZERO, |d| d.steal_ratio_reduction)
    }

    /// Trap slots unlocked at `level`.
    pub fn trap_slots(&self, level: u32) -> u32 {
        self.get(level).map_or(0, |d| d.trap_slots)
    }

    /// Whether automatic harvesting is unlocked at `level`.
    pub fn auto_harvest_unlocked(&self, level: u32) -> bool {
        self.get(level).is_some_and(|d| d.auto_harvest_unlocked)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal_macros::dec;
    use stealfarm_types::{CropStage, TrapPenalty};

    use super::*;

    fn crop(id: &str, indices: &[u32]) -> CropDefinition {
        CropDefinition {
            id: id.into(),
            name: id.into(),
            stages: indices
                .iter()
                .map(|&i| CropStage {
                    index: i,
                    duration_ms: 1_000,
                    marker: String::new(),
                })
                .collect(),
            harvest_min: 1,
            harvest_max: 2,
            seed_item: format!("{id}_seeds"),
            harvest_item: id.into(),
        }
    }

    fn level(n: u32, reduction: Decimal, slots: u32) -> FarmLevelDefinition {
        FarmLevelDefinition {
            level: n,
            plot_size_increase: 4,
            trap_slots: slots,
            protection_level: n,
            steal_ratio_reduction: reduction,
            auto_harvest_unlocked: n >= 3,
            upgrade_cost: dec!(100),
        }
    }

    #[test]
    fn crop_catalog_indexes_by_id_and_seed() {
        let catalog = CropCatalog::new([crop("wheat", &[0, 1, 2]), crop("carrot", &[0])]).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get("wheat").unwrap().stages.len(), 3);
        assert_eq!(catalog.by_seed("carrot_seeds").unwrap().id, "carrot");
        assert!(catalog.get("potato").is_none());
    }

    #[test]
    fn crop_catalog_rejects_broken_stages() {
        assert!(matches!(
            CropCatalog::new([crop("empty", &[])]),
            Err(WorldError::EmptyStages { .. })
        ));
        assert!(matches!(
            CropCatalog::new([crop("gap", &[0, 2])]),
            Err(WorldError::NonContiguousStage {
                expected: 1,
                found: 2,
                ..
            })
        ));
        assert!(matches!(
            CropCatalog::new([crop("wheat", &[0]), crop("wheat", &[0])]),
            Err(WorldError::DuplicateDefinition { kind: "crop", .. })
        ));
    }

    #[test]
    fn trap_catalog_rejects_out_of_range_chance() {
        let trap = TrapDefinition {
            id: "spikes".into(),
            name: "Spikes".into(),
            penalty: TrapPenalty::Slowness,
            trigger_chance: dec!(1.5),
            deploy_cost: dec!(10),
            penalty_value: dec!(5),
        };
        assert!(matches!(
            TrapCatalog::new([trap]),
            Err(WorldError::InvalidTriggerChance { .. })
        ));
    }

    #[test]
    fn level_catalog_falls_back_for_unknown_levels() {
        let catalog = LevelCatalog::new([level(1, dec!(0), 1), level(2, dec!(0.1), 2)]).unwrap();
        assert_eq!(catalog.max_level(), 2);
        assert_eq!(catalog.steal_ratio_reduction(2), dec!(0.1));
        assert_eq!(catalog.steal_ratio_reduction(9), Decimal::ZERO);
        assert_eq!(catalog.trap_slots(9), 0);
        assert!(!catalog.auto_harvest_unlocked(2));
        assert_eq!(LevelCatalog::default().max_level(), 1);
    }
}
