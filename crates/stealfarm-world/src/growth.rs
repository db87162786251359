//! Crop growth derived from wall-clock time.
//!
//! A crop stores only its planting timestamp. Its stage is recomputed from
//! `now - planted_at` against the definition's stage durations, so growth
//! continues while the service is offline. Acceleration moves the planting
//! timestamp backwards and needs no other state.

use rand::Rng;
use stealfarm_types::{CropDefinition, CropInstance};

/// Current growth stage of `crop` at `now`.
///
/// Zero when no time has elapsed. Otherwise the index of the first stage
/// whose cumulative duration exceeds the elapsed time, clamped to the
/// last stage.
pub fn stage(crop: &CropInstance, def: &CropDefinition, now: i64) -> usize {
    let elapsed = now.saturating_sub(crop.planted_at);
    if elapsed <= 0 {
        return 0;
    }
    let mut accumulated = 0_i64;
    for (index, s) in def.stages.iter().enumerate() {
        accumulated = accumulated.saturating_add(s.duration_ms);
        if elapsed < accumulated {
            return index;
        }
    }
    def.last_stage_index()
}

/// `true` once the crop has reached its final stage.
pub fn is_mature(crop: &CropInstance, def: &CropDefinition, now: i64) -> bool {
    stage(crop, def, now) == def.last_stage_index()
}

/// Milliseconds until the crop reaches its final stage, zero if mature.
///
/// The final stage is entered once every earlier stage has elapsed.
pub fn time_to_maturity_ms(crop: &CropInstance, def: &CropDefinition, now: i64) -> i64 {
    let before_last: i64 = def
        .stages
        .iter()
        .take(def.last_stage_index())
        .fold(0_i64, |acc, s| acc.saturating_add(s.duration_ms));
    let mature_at = crop.planted_at.saturating_add(before_last);
    mature_at.saturating_sub(now).max(0)
}

/// Yield for one harvest or theft, drawn fresh on every call.
///
/// Returns `harvest_min` when the range is empty or inverted.
pub fn harvest_amount<R: Rng + ?Sized>(def: &CropDefinition, rng: &mut R) -> u32 {
    if def.harvest_min >= def.harvest_max {
        return def.harvest_min;
    }
    rng.random_range(def.harvest_min..=def.harvest_max)
}

/// A copy of `crop` planted `delta_ms` earlier.
///
/// No clamping: over-acceleration saturates at the last stage through
/// [`stage`]. Negative deltas are treated as zero.
pub fn accelerate(crop: &CropInstance, delta_ms: i64) -> CropInstance {
    CropInstance {
        planted_at: crop.planted_at.saturating_sub(delta_ms.max(0)),
        ..crop.clone()
    }
}
