//! In-process [`FarmStore`] backed by hash maps.
//!
//! Used by tests and by deployments that do not need durability. All
//! state lives behind one [`RwLock`], so [`FarmStore::commit_theft`] is
//! atomic by construction.
//!
//! Writes can be switched off with [`MemoryStore::set_fail_writes`], and
//! theft commits alone with [`MemoryStore::set_fail_commits`], to exercise
//! the error paths of the services.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use stealfarm_types::{
    CropId, CropInstance, DeployedTrap, EnemyRecord, PendingNotice, PlayerId, PlayerStats, Plot,
    PlotId, StatisticKind, StealCooldown, StealRecord, TrapId, WaterCooldown,
};
use tokio::sync::RwLock;

use crate::error::DbError;
use crate::store::{FarmStore, TheftCommit, TheftCommitOutcome};

type Pair = (PlayerId, PlayerId);

#[derive(Debug, Default)]
struct State {
    plots: HashMap<PlotId, Plot>,
    crops: HashMap<CropId, CropInstance>,
    traps: HashMap<TrapId, DeployedTrap>,
    cooldowns: HashMap<Pair, StealCooldown>,
    records: Vec<StealRecord>,
    enemies: HashMap<Pair, EnemyRecord>,
    levels: HashMap<PlayerId, u32>,
    stats: HashMap<PlayerId, PlayerStats>,
    friends: HashSet<Pair>,
    water: HashMap<Pair, WaterCooldown>,
    notices: HashMap<PlayerId, Vec<PendingNotice>>,
}

impl State {
    fn add_stat(&mut self, player: PlayerId, kind: StatisticKind, amount: u64) {
        self.stats.entry(player).or_default().add(kind, amount);
    }

    fn mark_enemy(&mut self, victim: PlayerId, thief: PlayerId, marked_at: i64) -> bool {
        if self.enemies.contains_key(&(victim, thief)) {
            return false;
        }
        self.enemies.insert(
            (victim, thief),
            EnemyRecord {
                victim_id: victim,
                thief_id: thief,
                marked_at,
            },
        );
        true
    }

    fn recent_records(
        &self,
        limit: u32,
        filter: impl Fn(&StealRecord) -> bool,
    ) -> Vec<StealRecord> {
        let mut hits: Vec<StealRecord> = self.records.iter().filter(|r| filter(r)).cloned().collect();
        hits.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        hits.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        hits
    }
}

/// Hash-map backed store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<State>,
    fail_writes: AtomicBool,
    fail_commits: AtomicBool,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail with [`DbError::Unavailable`].
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent [`FarmStore::commit_theft`] fail while other
    /// writes keep working.
    pub fn set_fail_commits(&self, fail: bool) {
        self.fail_commits.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<(), DbError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(DbError::Unavailable("writes disabled".to_owned()));
        }
        Ok(())
    }
}

#[async_trait]
impl FarmStore for MemoryStore {
    async fn plot_by_owner(&self, owner: PlayerId) -> Result<Option<Plot>, DbError> {
        let state = self.state.read().await;
        Ok(state.plots.values().find(|p| p.owner_id == owner).cloned())
    }

    async fn plot_by_id(&self, id: PlotId) -> Result<Option<Plot>, DbError> {
        Ok(self.state.read().await.plots.get(&id).cloned())
    }

    async fn insert_plot(&self, plot: &Plot) -> Result<PlotId, DbError> {
        self.check_writable()?;
        let mut state = self.state.write().await;
        if state.plots.values().any(|p| p.owner_id == plot.owner_id) {
            return Err(DbError::Conflict(format!("owner {} already has a plot", plot.owner_id)));
        }
        if state.plots.values().any(|p| p.grid_cell() == plot.grid_cell()) {
            return Err(DbError::Conflict(format!(
                "grid cell ({}, {}) already taken",
                plot.grid_x, plot.grid_z
            )));
        }
        state.plots.insert(plot.id, plot.clone());
        Ok(plot.id)
    }

    async fn update_plot_bounds(&self, plot: &Plot) -> Result<(), DbError> {
        self.check_writable()?;
        let mut state = self.state.write().await;
        let stored = state
            .plots
            .get_mut(&plot.id)
            .ok_or_else(|| DbError::NotFound(format!("plot {}", plot.id)))?;
        stored.min_x = plot.min_x;
        stored.min_z = plot.min_z;
        stored.max_x = plot.max_x;
        stored.max_z = plot.max_z;
        stored.size = plot.size;
        Ok(())
    }

    async fn delete_plot(&self, id: PlotId) -> Result<(), DbError> {
        self.check_writable()?;
        let mut state = self.state.write().await;
        state.plots.remove(&id);
        state.crops.retain(|_, c| c.plot_id != id);
        state.traps.retain(|_, t| t.plot_id != id);
        Ok(())
    }

    async fn list_plots(&self) -> Result<Vec<Plot>, DbError> {
        Ok(self.state.read().await.plots.values().cloned().collect())
    }

    async fn insert_crop(&self, crop: &CropInstance) -> Result<CropId, DbError> {
        self.check_writable()?;
        let mut state = self.state.write().await;
        let taken = state.crops.values().any(|c| {
            c.world_id == crop.world_id && c.x == crop.x && c.y == crop.y && c.z == crop.z
        });
        if taken {
            return Err(DbError::Conflict(format!(
                "position ({}, {}, {}) already planted",
                crop.x, crop.y, crop.z
            )));
        }
        state.crops.insert(crop.id, crop.clone());
        Ok(crop.id)
    }

    async fn crops_on_plot(&self, plot: PlotId) -> Result<Vec<CropInstance>, DbError> {
        let state = self.state.read().await;
        Ok(state
            .crops
            .values()
            .filter(|c| c.plot_id == plot)
            .cloned()
            .collect())
    }

    async fn crop_by_id(&self, id: CropId) -> Result<Option<CropInstance>, DbError> {
        Ok(self.state.read().await.crops.get(&id).cloned())
    }

    async fn crop_at(
        &self,
        world_id: &str,
        x: i32,
        y: i32,
        z: i32,
    ) -> Result<Option<CropInstance>, DbError> {
        let state = self.state.read().await;
        Ok(state
            .crops
            .values()
            .find(|c| c.world_id == world_id && c.x == x && c.y == y && c.z == z)
            .cloned())
    }

    async fn delete_crop(&self, id: CropId) -> Result<bool, DbError> {
        self.check_writable()?;
        Ok(self.state.write().await.crops.remove(&id).is_some())
    }

    async fn update_planted_at(&self, id: CropId, planted_at: i64) -> Result<(), DbError> {
        self.check_writable()?;
        let mut state = self.state.write().await;
        let crop = state
            .crops
            .get_mut(&id)
            .ok_or_else(|| DbError::NotFound(format!("crop {id}")))?;
        crop.planted_at = planted_at;
        Ok(())
    }

    async fn cooldown(
        &self,
        thief: PlayerId,
        victim: PlayerId,
    ) -> Result<Option<StealCooldown>, DbError> {
        Ok(self.state.read().await.cooldowns.get(&(thief, victim)).copied())
    }

    async fn set_cooldown(&self, cooldown: &StealCooldown) -> Result<(), DbError> {
        self.check_writable()?;
        self.state
            .write()
            .await
            .cooldowns
            .insert((cooldown.thief_id, cooldown.victim_id), *cooldown);
        Ok(())
    }

    async fn remove_cooldown(&self, thief: PlayerId, victim: PlayerId) -> Result<(), DbError> {
        self.check_writable()?;
        self.state.write().await.cooldowns.remove(&(thief, victim));
        Ok(())
    }

    async fn deployed_traps(&self, plot: PlotId) -> Result<Vec<DeployedTrap>, DbError> {
        let state = self.state.read().await;
        let mut traps: Vec<DeployedTrap> = state
            .traps
            .values()
            .filter(|t| t.plot_id == plot)
            .cloned()
            .collect();
        traps.sort_by_key(|t| t.slot_index);
        Ok(traps)
    }

    async fn deploy_trap(&self, trap: &DeployedTrap) -> Result<(), DbError> {
        self.check_writable()?;
        let mut state = self.state.write().await;
        let taken = state
            .traps
            .values()
            .any(|t| t.plot_id == trap.plot_id && t.slot_index == trap.slot_index);
        if taken {
            return Err(DbError::Conflict(format!("slot {} occupied", trap.slot_index)));
        }
        state.traps.insert(trap.id, trap.clone());
        Ok(())
    }

    async fn remove_trap(&self, plot: PlotId, slot: u32) -> Result<bool, DbError> {
        self.check_writable()?;
        let mut state = self.state.write().await;
        let before = state.traps.len();
        state
            .traps
            .retain(|_, t| !(t.plot_id == plot && t.slot_index == slot));
        Ok(state.traps.len() < before)
    }

    async fn insert_steal_record(&self, record: &StealRecord) -> Result<(), DbError> {
        self.check_writable()?;
        self.state.write().await.records.push(record.clone());
        Ok(())
    }

    async fn steals_against(
        &self,
        victim: PlayerId,
        limit: u32,
    ) -> Result<Vec<StealRecord>, DbError> {
        let state = self.state.read().await;
        Ok(state.recent_records(limit, |r| r.victim_id == victim))
    }

    async fn steals_by(&self, thief: PlayerId, limit: u32) -> Result<Vec<StealRecord>, DbError> {
        let state = self.state.read().await;
        Ok(state.recent_records(limit, |r| r.thief_id == thief))
    }

    async fn is_enemy(&self, victim: PlayerId, thief: PlayerId) -> Result<bool, DbError> {
        Ok(self.state.read().await.enemies.contains_key(&(victim, thief)))
    }

    async fn mark_enemy(
        &self,
        victim: PlayerId,
        thief: PlayerId,
        marked_at: i64,
    ) -> Result<bool, DbError> {
        self.check_writable()?;
        Ok(self.state.write().await.mark_enemy(victim, thief, marked_at))
    }

    async fn enemies_of(&self, victim: PlayerId) -> Result<Vec<EnemyRecord>, DbError> {
        let state = self.state.read().await;
        let mut enemies: Vec<EnemyRecord> = state
            .enemies
            .values()
            .filter(|e| e.victim_id == victim)
            .copied()
            .collect();
        enemies.sort_by_key(|e| e.marked_at);
        Ok(enemies)
    }

    async fn remove_enemy(&self, victim: PlayerId, thief: PlayerId) -> Result<bool, DbError> {
        self.check_writable()?;
        Ok(self.state.write().await.enemies.remove(&(victim, thief)).is_some())
    }

    async fn farm_level(&self, player: PlayerId) -> Result<Option<u32>, DbError> {
        Ok(self.state.read().await.levels.get(&player).copied())
    }

    async fn set_farm_level(&self, player: PlayerId, level: u32) -> Result<(), DbError> {
        self.check_writable()?;
        self.state.write().await.levels.insert(player, level);
        Ok(())
    }

    async fn stats(&self, player: PlayerId) -> Result<PlayerStats, DbError> {
        Ok(self
            .state
            .read()
            .await
            .stats
            .get(&player)
            .copied()
            .unwrap_or_default())
    }

    async fn add_stat(
        &self,
        player: PlayerId,
        kind: StatisticKind,
        amount: u64,
    ) -> Result<(), DbError> {
        self.check_writable()?;
        self.state.write().await.add_stat(player, kind, amount);
        Ok(())
    }

    async fn add_friend(&self, a: PlayerId, b: PlayerId) -> Result<(), DbError> {
        self.check_writable()?;
        let mut state = self.state.write().await;
        state.friends.insert((a, b));
        state.friends.insert((b, a));
        Ok(())
    }

    async fn remove_friend(&self, a: PlayerId, b: PlayerId) -> Result<bool, DbError> {
        self.check_writable()?;
        let mut state = self.state.write().await;
        let existed = state.friends.remove(&(a, b));
        state.friends.remove(&(b, a));
        Ok(existed)
    }

    async fn are_friends(&self, a: PlayerId, b: PlayerId) -> Result<bool, DbError> {
        Ok(self.state.read().await.friends.contains(&(a, b)))
    }

    async fn water_cooldown(
        &self,
        waterer: PlayerId,
        owner: PlayerId,
    ) -> Result<Option<WaterCooldown>, DbError> {
        Ok(self.state.read().await.water.get(&(waterer, owner)).copied())
    }

    async fn set_water_cooldown(&self, cooldown: &WaterCooldown) -> Result<(), DbError> {
        self.check_writable()?;
        self.state
            .write()
            .await
            .water
            .insert((cooldown.waterer_id, cooldown.owner_id), *cooldown);
        Ok(())
    }

    async fn queue_notice(&self, notice: &PendingNotice) -> Result<(), DbError> {
        self.check_writable()?;
        self.state
            .write()
            .await
            .notices
            .entry(notice.recipient)
            .or_default()
            .push(notice.clone());
        Ok(())
    }

    async fn take_notices(&self, recipient: PlayerId) -> Result<Vec<PendingNotice>, DbError> {
        self.check_writable()?;
        let mut notices = self
            .state
            .write()
            .await
            .notices
            .remove(&recipient)
            .unwrap_or_default();
        notices.sort_by_key(|n| n.created_at);
        Ok(notices)
    }

    async fn commit_theft(&self, theft: &TheftCommit) -> Result<TheftCommitOutcome, DbError> {
        self.check_writable()?;
        if self.fail_commits.load(Ordering::SeqCst) {
            return Err(DbError::Unavailable("theft commits disabled".to_owned()));
        }
        let mut state = self.state.write().await;
        if state.crops.remove(&theft.crop_id).is_none() {
            return Ok(TheftCommitOutcome::CropGone);
        }
        let record = &theft.record;
        let amount = u64::from(record.amount);
        state.records.push(record.clone());
        state.add_stat(record.thief_id, StatisticKind::TotalSteal, amount);
        state.add_stat(record.victim_id, StatisticKind::TotalStolen, amount);
        let newly_marked_enemy = state.mark_enemy(record.victim_id, record.thief_id, record.timestamp);
        Ok(TheftCommitOutcome::Committed { newly_marked_enemy })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use stealfarm_types::StealRecordId;

    use super::*;

    fn plot(owner: PlayerId, x: i32, z: i32) -> Plot {
        Plot {
            id: PlotId::new(),
            owner_id: owner,
            grid_x: x,
            grid_z: z,
            world_id: "farm_world".into(),
            min_x: -16,
            min_z: -16,
            max_x: 16,
            max_z: 16,
            size: 16,
        }
    }

    fn crop(plot: &Plot, x: i32) -> CropInstance {
        CropInstance {
            id: CropId::new(),
            crop_type: "wheat".into(),
            plot_id: plot.id,
            owner_id: plot.owner_id,
            world_id: plot.world_id.clone(),
            x,
            y: 64,
            z: 0,
            planted_at: 0,
        }
    }

    #[tokio::test]
    async fn plot_uniqueness_is_enforced() {
        let store = MemoryStore::new();
        let owner = PlayerId::new();
        store.insert_plot(&plot(owner, 0, 0)).await.unwrap();

        let err = store.insert_plot(&plot(owner, 1, 0)).await.unwrap_err();
        assert!(err.is_conflict());
        let err = store.insert_plot(&plot(PlayerId::new(), 0, 0)).await.unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn deleting_a_plot_removes_its_crops_and_traps() {
        let store = MemoryStore::new();
        let p = plot(PlayerId::new(), 0, 0);
        store.insert_plot(&p).await.unwrap();
        let c = crop(&p, 1);
        store.insert_crop(&c).await.unwrap();
        store
            .deploy_trap(&DeployedTrap {
                id: TrapId::new(),
                plot_id: p.id,
                trap_type: "spikes".into(),
                slot_index: 0,
            })
            .await
            .unwrap();

        store.delete_plot(p.id).await.unwrap();
        assert!(store.crop_by_id(c.id).await.unwrap().is_none());
        assert!(store.deployed_traps(p.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn commit_theft_is_all_or_nothing() {
        let store = MemoryStore::new();
        let victim = PlayerId::new();
        let thief = PlayerId::new();
        let p = plot(victim, 0, 0);
        store.insert_plot(&p).await.unwrap();
        let c = crop(&p, 2);
        store.insert_crop(&c).await.unwrap();

        let theft = TheftCommit {
            crop_id: c.id,
            record: StealRecord {
                id: StealRecordId::new(),
                thief_id: thief,
                victim_id: victim,
                crop_type: "wheat".into(),
                amount: 3,
                timestamp: 1_000,
            },
        };
        let outcome = store.commit_theft(&theft).await.unwrap();
        assert_eq!(
            outcome,
            TheftCommitOutcome::Committed {
                newly_marked_enemy: true
            }
        );
        assert!(store.is_enemy(victim, thief).await.unwrap());
        assert!(!store.is_enemy(thief, victim).await.unwrap());
        assert_eq!(store.stats(thief).await.unwrap().total_steal, 3);
        assert_eq!(store.stats(victim).await.unwrap().total_stolen, 3);

        // Second commit for the same crop finds it gone and writes nothing.
        let again = store.commit_theft(&theft).await.unwrap();
        assert_eq!(again, TheftCommitOutcome::CropGone);
        assert_eq!(store.steals_against(victim, 10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn failed_writes_leave_state_untouched() {
        let store = MemoryStore::new();
        store.set_fail_writes(true);
        let err = store.insert_plot(&plot(PlayerId::new(), 0, 0)).await.unwrap_err();
        assert!(matches!(err, DbError::Unavailable(_)));
        assert!(store.list_plots().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn traps_come_back_in_slot_order() {
        let store = MemoryStore::new();
        let p = plot(PlayerId::new(), 0, 0);
        for slot in [2_u32, 0, 1] {
            store
                .deploy_trap(&DeployedTrap {
                    id: TrapId::new(),
                    plot_id: p.id,
                    trap_type: format!("trap_{slot}"),
                    slot_index: slot,
                })
                .await
                .unwrap();
        }
        let slots: Vec<u32> = store
            .deployed_traps(p.id)
            .await
            .unwrap()
            .iter()
            .map(|t| t.slot_index)
            .collect();
        assert_eq!(slots, vec![0, 1, 2]);
        assert!(store.remove_trap(p.id, 1).await.unwrap());
        assert!(!store.remove_trap(p.id, 1).await.unwrap());
    }

    #[tokio::test]
    async fn steal_records_are_newest_first_and_limited() {
        let store = MemoryStore::new();
        let victim = PlayerId::new();
        for ts in [10_i64, 30, 20] {
            store
                .insert_steal_record(&StealRecord {
                    id: StealRecordId::new(),
                    thief_id: PlayerId::new(),
                    victim_id: victim,
                    crop_type: "wheat".into(),
                    amount: 1,
                    timestamp: ts,
                })
                .await
                .unwrap();
        }
        let records = store.steals_against(victim, 2).await.unwrap();
        let stamps: Vec<i64> = records.iter().map(|r| r.timestamp).collect();
        assert_eq!(stamps, vec![30, 20]);
    }

    #[tokio::test]
    async fn notices_are_taken_once_in_order() {
        let store = MemoryStore::new();
        let player = PlayerId::new();
        for (message, created_at) in [("second", 20), ("first", 10), ("third", 20)] {
            store
                .queue_notice(&PendingNotice {
                    recipient: player,
                    message: message.into(),
                    created_at,
                })
                .await
                .unwrap();
        }

        let taken = store.take_notices(player).await.unwrap();
        let messages: Vec<&str> = taken.iter().map(|n| n.message.as_str()).collect();
        assert_eq!(messages, vec!["first", "second", "third"]);
        assert!(store.take_notices(player).await.unwrap().is_empty());
        assert!(store.take_notices(PlayerId::new()).await.unwrap().is_empty());
    }
}
