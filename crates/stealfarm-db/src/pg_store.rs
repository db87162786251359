//! `PostgreSQL` implementation of [`FarmStore`].
//!
//! Rows are read into `sqlx::FromRow` structs and converted into the
//! domain records; a value that does not fit its domain type surfaces as
//! [`DbError::Corrupt`]. Unique violations surface as
//! [`DbError::Conflict`].

use async_trait::async_trait;
use sqlx::PgPool;
use stealfarm_types::{
    CropId, CropInstance, DeployedTrap, EnemyRecord, PendingNotice, PlayerId, PlayerStats, Plot,
    PlotId, StatisticKind, StealCooldown, StealRecord, WaterCooldown,
};
use uuid::Uuid;

use crate::error::DbError;
use crate::postgres::PostgresPool;
use crate::store::{FarmStore, TheftCommit, TheftCommitOutcome};

const PLOT_COLUMNS: &str = "id, owner_id, grid_x, grid_z, world_id, min_x, min_z, max_x, max_z, size";
const CROP_COLUMNS: &str = "id, crop_type, plot_id, owner_id, world_id, x, y, z, planted_at";
const RECORD_COLUMNS: &str = "id, thief_id, victim_id, crop_type, amount, stolen_at";

/// Farm store over a `PostgreSQL` pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PostgresPool,
}

impl PgStore {
    /// Wrap a connected pool. Migrations must already have run.
    pub const fn new(pool: PostgresPool) -> Self {
        Self { pool }
    }

    const fn pg(&self) -> &PgPool {
        self.pool.pool()
    }
}

// ---------------------------------------------------------------------------
// Rows
// ---------------------------------------------------------------------------

#[derive(Debug, sqlx::FromRow)]
struct PlotRow {
    id: Uuid,
    owner_id: Uuid,
    grid_x: i32,
    grid_z: i32,
    world_id: String,
    min_x: i32,
    min_z: i32,
    max_x: i32,
    max_z: i32,
    size: i32,
}

impl From<PlotRow> for Plot {
    fn from(row: PlotRow) -> Self {
        Self {
            id: row.id.into(),
            owner_id: row.owner_id.into(),
            grid_x: row.grid_x,
            grid_z: row.grid_z,
            world_id: row.world_id,
            min_x: row.min_x,
            min_z: row.min_z,
            max_x: row.max_x,
            max_z: row.max_z,
            size: row.size,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CropRow {
    id: Uuid,
    crop_type: String,
    plot_id: Uuid,
    owner_id: Uuid,
    world_id: String,
    x: i32,
    y: i32,
    z: i32,
    planted_at: i64,
}

impl From<CropRow> for CropInstance {
    fn from(row: CropRow) -> Self {
        Self {
            id: row.id.into(),
            crop_type: row.crop_type,
            plot_id: row.plot_id.into(),
            owner_id: row.owner_id.into(),
            world_id: row.world_id,
            x: row.x,
            y: row.y,
            z: row.z,
            planted_at: row.planted_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct TrapRow {
    id: Uuid,
    plot_id: Uuid,
    trap_type: String,
    slot_index: i32,
}

impl TryFrom<TrapRow> for DeployedTrap {
    type Error = DbError;

    fn try_from(row: TrapRow) -> Result<Self, DbError> {
        Ok(Self {
            id: row.id.into(),
            plot_id: row.plot_id.into(),
            trap_type: row.trap_type,
            slot_index: to_u32(row.slot_index, "deployed_traps.slot_index")?,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct RecordRow {
    id: Uuid,
    thief_id: Uuid,
    victim_id: Uuid,
    crop_type: String,
    amount: i32,
    stolen_at: i64,
}

impl TryFrom<RecordRow> for StealRecord {
    type Error = DbError;

    fn try_from(row: RecordRow) -> Result<Self, DbError> {
        Ok(Self {
            id: row.id.into(),
            thief_id: row.thief_id.into(),
            victim_id: row.victim_id.into(),
            crop_type: row.crop_type,
            amount: to_u32(row.amount, "steal_records.amount")?,
            timestamp: row.stolen_at,
        })
    }
}

fn to_u32(value: i32, column: &str) -> Result<u32, DbError> {
    u32::try_from(value).map_err(|e| DbError::Corrupt(format!("{column} = {value}: {e}")))
}

fn to_i32(value: u32, what: &str) -> Result<i32, DbError> {
    i32::try_from(value).map_err(|e| DbError::Corrupt(format!("{what} = {value}: {e}")))
}

fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

// ---------------------------------------------------------------------------
// FarmStore
// ---------------------------------------------------------------------------

#[async_trait]
impl FarmStore for PgStore {
    async fn close(&self) {
        self.pool.close().await;
    }

    async fn plot_by_owner(&self, owner: PlayerId) -> Result<Option<Plot>, DbError> {
        let row = sqlx::query_as::<_, PlotRow>(&format!(
            "SELECT {PLOT_COLUMNS} FROM plots WHERE owner_id = $1"
        ))
        .bind(owner.into_inner())
        .fetch_optional(self.pg())
        .await?;
        Ok(row.map(Plot::from))
    }

    async fn plot_by_id(&self, id: PlotId) -> Result<Option<Plot>, DbError> {
        let row = sqlx::query_as::<_, PlotRow>(&format!(
            "SELECT {PLOT_COLUMNS} FROM plots WHERE id = $1"
        ))
        .bind(id.into_inner())
        .fetch_optional(self.pg())
        .await?;
        Ok(row.map(Plot::from))
    }

    async fn insert_plot(&self, plot: &Plot) -> Result<PlotId, DbError> {
        sqlx::query(
            r"INSERT INTO plots (id, owner_id, grid_x, grid_z, world_id, min_x, min_z, max_x, max_z, size)
              VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(plot.id.into_inner())
        .bind(plot.owner_id.into_inner())
        .bind(plot.grid_x)
        .bind(plot.grid_z)
        .bind(&plot.world_id)
        .bind(plot.min_x)
        .bind(plot.min_z)
        .bind(plot.max_x)
        .bind(plot.max_z)
        .bind(plot.size)
        .execute(self.pg())
        .await
        .map_err(|e| DbError::from_write(e, "insert plot"))?;
        Ok(plot.id)
    }

    async fn update_plot_bounds(&self, plot: &Plot) -> Result<(), DbError> {
        let result = sqlx::query(
            r"UPDATE plots SET min_x = $2, min_z = $3, max_x = $4, max_z = $5, size = $6
              WHERE id = $1",
        )
        .bind(plot.id.into_inner())
        .bind(plot.min_x)
        .bind(plot.min_z)
        .bind(plot.max_x)
        .bind(plot.max_z)
        .bind(plot.size)
        .execute(self.pg())
        .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::NotFound(format!("plot {}", plot.id)));
        }
        Ok(())
    }

    async fn delete_plot(&self, id: PlotId) -> Result<(), DbError> {
        sqlx::query("DELETE FROM plots WHERE id = $1")
            .bind(id.into_inner())
            .execute(self.pg())
            .await?;
        Ok(())
    }

    async fn list_plots(&self) -> Result<Vec<Plot>, DbError> {
        let rows = sqlx::query_as::<_, PlotRow>(&format!("SELECT {PLOT_COLUMNS} FROM plots"))
            .fetch_all(self.pg())
            .await?;
        Ok(rows.into_iter().map(Plot::from).collect())
    }

    async fn insert_crop(&self, crop: &CropInstance) -> Result<CropId, DbError> {
        sqlx::query(
            r"INSERT INTO crops (id, crop_type, plot_id, owner_id, world_id, x, y, z, planted_at)
              VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(crop.id.into_inner())
        .bind(&crop.crop_type)
        .bind(crop.plot_id.into_inner())
        .bind(crop.owner_id.into_inner())
        .bind(&crop.world_id)
        .bind(crop.x)
        .bind(crop.y)
        .bind(crop.z)
        .bind(crop.planted_at)
        .execute(self.pg())
        .await
        .map_err(|e| DbError::from_write(e, "insert crop"))?;
        Ok(crop.id)
    }

    async fn crops_on_plot(&self, plot: PlotId) -> Result<Vec<CropInstance>, DbError> {
        let rows = sqlx::query_as::<_, CropRow>(&format!(
            "SELECT {CROP_COLUMNS} FROM crops WHERE plot_id = $1"
        ))
        .bind(plot.into_inner())
        .fetch_all(self.pg())
        .await?;
        Ok(rows.into_iter().map(CropInstance::from).collect())
    }

    async fn crop_by_id(&self, id: CropId) -> Result<Option<CropInstance>, DbError> {
        let row = sqlx::query_as::<_, CropRow>(&format!(
            "SELECT {CROP_COLUMNS} FROM crops WHERE id = $1"
        ))
        .bind(id.into_inner())
        .fetch_optional(self.pg())
        .await?;
        Ok(row.map(CropInstance::from))
    }

    async fn crop_at(
        &self,
        world_id: &str,
        x: i32,
        y: i32,
        z: i32,
    ) -> Result<Option<CropInstance>, DbError> {
        let row = sqlx::query_as::<_, CropRow>(&format!(
            "SELECT {CROP_COLUMNS} FROM crops WHERE world_id = $1 AND x = $2 AND y = $3 AND z = $4"
        ))
        .bind(world_id)
        .bind(x)
        .bind(y)
        .bind(z)
        .fetch_optional(self.pg())
        .await?;
        Ok(row.map(CropInstance::from))
    }

    async fn delete_crop(&self, id: CropId) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM crops WHERE id = $1")
            .bind(id.into_inner())
            .execute(self.pg())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn update_planted_at(&self, id: CropId, planted_at: i64) -> Result<(), DbError> {
        let result = sqlx::query("UPDATE crops SET planted_at = $2 WHERE id = $1")
            .bind(id.into_inner())
            .bind(planted_at)
            .execute(self.pg())
            .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::NotFound(format!("crop {id}")));
        }
        Ok(())
    }

    async fn cooldown(
        &self,
        thief: PlayerId,
        victim: PlayerId,
    ) -> Result<Option<StealCooldown>, DbError> {
        let row: Option<(i64, i64)> = sqlx::query_as(
            "SELECT start_time, duration_ms FROM steal_cooldowns WHERE thief_id = $1 AND victim_id = $2",
        )
        .bind(thief.into_inner())
        .bind(victim.into_inner())
        .fetch_optional(self.pg())
        .await?;
        Ok(row.map(|(start_time, duration_ms)| StealCooldown {
            thief_id: thief,
            victim_id: victim,
            start_time,
            duration_ms,
        }))
    }

    async fn set_cooldown(&self, cooldown: &StealCooldown) -> Result<(), DbError> {
        sqlx::query(
            r"INSERT INTO steal_cooldowns (thief_id, victim_id, start_time, duration_ms)
              VALUES ($1, $2, $3, $4)
              ON CONFLICT (thief_id, victim_id)
              DO UPDATE SET start_time = EXCLUDED.start_time, duration_ms = EXCLUDED.duration_ms",
        )
        .bind(cooldown.thief_id.into_inner())
        .bind(cooldown.victim_id.into_inner())
        .bind(cooldown.start_time)
        .bind(cooldown.duration_ms)
        .execute(self.pg())
        .await?;
        Ok(())
    }

    async fn remove_cooldown(&self, thief: PlayerId, victim: PlayerId) -> Result<(), DbError> {
        sqlx::query("DELETE FROM steal_cooldowns WHERE thief_id = $1 AND victim_id = $2")
            .bind(thief.into_inner())
            .bind(victim.into_inner())
            .execute(self.pg())
            .await?;
        Ok(())
    }

    async fn deployed_traps(&self, plot: PlotId) -> Result<Vec<DeployedTrap>, DbError> {
        let rows = sqlx::query_as::<_, TrapRow>(
            r"SELECT id, plot_id, trap_type, slot_index FROM deployed_traps
              WHERE plot_id = $1 ORDER BY slot_index",
        )
        .bind(plot.into_inner())
        .fetch_all(self.pg())
        .await?;
        rows.into_iter().map(DeployedTrap::try_from).collect()
    }

    async fn deploy_trap(&self, trap: &DeployedTrap) -> Result<(), DbError> {
        sqlx::query(
            "INSERT INTO deployed_traps (id, plot_id, trap_type, slot_index) VALUES ($1, $2, $3, $4)",
        )
        .bind(trap.id.into_inner())
        .bind(trap.plot_id.into_inner())
        .bind(&trap.trap_type)
        .bind(to_i32(trap.slot_index, "slot_index")?)
        .execute(self.pg())
        .await
        .map_err(|e| DbError::from_write(e, "deploy trap"))?;
        Ok(())
    }

    async fn remove_trap(&self, plot: PlotId, slot: u32) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM deployed_traps WHERE plot_id = $1 AND slot_index = $2")
            .bind(plot.into_inner())
            .bind(to_i32(slot, "slot_index")?)
            .execute(self.pg())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_steal_record(&self, record: &StealRecord) -> Result<(), DbError> {
        sqlx::query(
            r"INSERT INTO steal_records (id, thief_id, victim_id, crop_type, amount, stolen_at)
              VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(record.id.into_inner())
        .bind(record.thief_id.into_inner())
        .bind(record.victim_id.into_inner())
        .bind(&record.crop_type)
        .bind(to_i32(record.amount, "amount")?)
        .bind(record.timestamp)
        .execute(self.pg())
        .await?;
        Ok(())
    }

    async fn steals_against(
        &self,
        victim: PlayerId,
        limit: u32,
    ) -> Result<Vec<StealRecord>, DbError> {
        let rows = sqlx::query_as::<_, RecordRow>(&format!(
            "SELECT {RECORD_COLUMNS} FROM steal_records WHERE victim_id = $1 ORDER BY stolen_at DESC LIMIT $2"
        ))
        .bind(victim.into_inner())
        .bind(i64::from(limit))
        .fetch_all(self.pg())
        .await?;
        rows.into_iter().map(StealRecord::try_from).collect()
    }

    async fn steals_by(&self, thief: PlayerId, limit: u32) -> Result<Vec<StealRecord>, DbError> {
        let rows = sqlx::query_as::<_, RecordRow>(&format!(
            "SELECT {RECORD_COLUMNS} FROM steal_records WHERE thief_id = $1 ORDER BY stolen_at DESC LIMIT $2"
        ))
        .bind(thief.into_inner())
        .bind(i64::from(limit))
        .fetch_all(self.pg())
        .await?;
        rows.into_iter().map(StealRecord::try_from).collect()
    }

    async fn is_enemy(&self, victim: PlayerId, thief: PlayerId) -> Result<bool, DbError> {
        let found: Option<(i64,)> = sqlx::query_as(
            "SELECT marked_at FROM enemies WHERE victim_id = $1 AND thief_id = $2",
        )
        .bind(victim.into_inner())
        .bind(thief.into_inner())
        .fetch_optional(self.pg())
        .await?;
        Ok(found.is_some())
    }

    async fn mark_enemy(
        &self,
        victim: PlayerId,
        thief: PlayerId,
        marked_at: i64,
    ) -> Result<bool, DbError> {
        let result = sqlx::query(
            r"INSERT INTO enemies (victim_id, thief_id, marked_at) VALUES ($1, $2, $3)
              ON CONFLICT (victim_id, thief_id) DO NOTHING",
        )
        .bind(victim.into_inner())
        .bind(thief.into_inner())
        .bind(marked_at)
        .execute(self.pg())
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn enemies_of(&self, victim: PlayerId) -> Result<Vec<EnemyRecord>, DbError> {
        let rows: Vec<(Uuid, i64)> = sqlx::query_as(
            "SELECT thief_id, marked_at FROM enemies WHERE victim_id = $1 ORDER BY marked_at",
        )
        .bind(victim.into_inner())
        .fetch_all(self.pg())
        .await?;
        Ok(rows
            .into_iter()
            .map(|(thief, marked_at)| EnemyRecord {
                victim_id: victim,
                thief_id: thief.into(),
                marked_at,
            })
            .collect())
    }

    async fn remove_enemy(&self, victim: PlayerId, thief: PlayerId) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM enemies WHERE victim_id = $1 AND thief_id = $2")
            .bind(victim.into_inner())
            .bind(thief.into_inner())
            .execute(self.pg())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn farm_level(&self, player: PlayerId) -> Result<Option<u32>, DbError> {
        let row: Option<(i32,)> = sqlx::query_as("SELECT level FROM farm_levels WHERE player_id = $1")
            .bind(player.into_inner())
            .fetch_optional(self.pg())
            .await?;
        row.map(|(level,)| to_u32(level, "farm_levels.level"))
            .transpose()
    }

    async fn set_farm_level(&self, player: PlayerId, level: u32) -> Result<(), DbError> {
        sqlx::query(
            r"INSERT INTO farm_levels (player_id, level) VALUES ($1, $2)
              ON CONFLICT (player_id) DO UPDATE SET level = EXCLUDED.level",
        )
        .bind(player.into_inner())
        .bind(to_i32(level, "level")?)
        .execute(self.pg())
        .await?;
        Ok(())
    }

    async fn stats(&self, player: PlayerId) -> Result<PlayerStats, DbError> {
        let rows: Vec<(String, i64)> =
            sqlx::query_as("SELECT stat, value FROM player_stats WHERE player_id = $1")
                .bind(player.into_inner())
                .fetch_all(self.pg())
                .await?;
        let mut stats = PlayerStats::default();
        for (name, value) in rows {
            let kind = StatisticKind::parse(&name)
                .ok_or_else(|| DbError::Corrupt(format!("unknown statistic {name}")))?;
            stats.add(kind, u64::try_from(value).unwrap_or(0));
        }
        Ok(stats)
    }

    async fn add_stat(
        &self,
        player: PlayerId,
        kind: StatisticKind,
        amount: u64,
    ) -> Result<(), DbError> {
        add_stat_with(self.pg(), player, kind, amount).await
    }

    async fn add_friend(&self, a: PlayerId, b: PlayerId) -> Result<(), DbError> {
        sqlx::query(
            r"INSERT INTO friends (player_id, friend_id) VALUES ($1, $2), ($2, $1)
              ON CONFLICT DO NOTHING",
        )
        .bind(a.into_inner())
        .bind(b.into_inner())
        .execute(self.pg())
        .await?;
        Ok(())
    }

    async fn remove_friend(&self, a: PlayerId, b: PlayerId) -> Result<bool, DbError> {
        let result = sqlx::query(
            r"DELETE FROM friends
              WHERE (player_id = $1 AND friend_id = $2) OR (player_id = $2 AND friend_id = $1)",
        )
        .bind(a.into_inner())
        .bind(b.into_inner())
        .execute(self.pg())
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn are_friends(&self, a: PlayerId, b: PlayerId) -> Result<bool, DbError> {
        let found: Option<(Uuid,)> = sqlx::query_as(
            "SELECT friend_id FROM friends WHERE player_id = $1 AND friend_id = $2",
        )
        .bind(a.into_inner())
        .bind(b.into_inner())
        .fetch_optional(self.pg())
        .await?;
        Ok(found.is_some())
    }

    async fn water_cooldown(
        &self,
        waterer: PlayerId,
        owner: PlayerId,
    ) -> Result<Option<WaterCooldown>, DbError> {
        let row: Option<(i64,)> = sqlx::query_as(
            "SELECT ends_at FROM water_cooldowns WHERE waterer_id = $1 AND owner_id = $2",
        )
        .bind(waterer.into_inner())
        .bind(owner.into_inner())
        .fetch_optional(self.pg())
        .await?;
        Ok(row.map(|(ends_at,)| WaterCooldown {
            waterer_id: waterer,
            owner_id: owner,
            ends_at,
        }))
    }

    async fn set_water_cooldown(&self, cooldown: &WaterCooldown) -> Result<(), DbError> {
        sqlx::query(
            r"INSERT INTO water_cooldowns (waterer_id, owner_id, ends_at) VALUES ($1, $2, $3)
              ON CONFLICT (waterer_id, owner_id) DO UPDATE SET ends_at = EXCLUDED.ends_at",
        )
        .bind(cooldown.waterer_id.into_inner())
        .bind(cooldown.owner_id.into_inner())
        .bind(cooldown.ends_at)
        .execute(self.pg())
        .await?;
        Ok(())
    }

    async fn queue_notice(&self, notice: &PendingNotice) -> Result<(), DbError> {
        sqlx::query(
            "INSERT INTO pending_notices (recipient_id, message, created_at) VALUES ($1, $2, $3)",
        )
        .bind(notice.recipient.into_inner())
        .bind(&notice.message)
        .bind(notice.created_at)
        .execute(self.pg())
        .await?;
        Ok(())
    }

    async fn take_notices(&self, recipient: PlayerId) -> Result<Vec<PendingNotice>, DbError> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            r"WITH taken AS (
                  DELETE FROM pending_notices WHERE recipient_id = $1
                  RETURNING seq, message, created_at
              )
              SELECT message, created_at FROM taken ORDER BY seq",
        )
        .bind(recipient.into_inner())
        .fetch_all(self.pg())
        .await?;
        Ok(rows
            .into_iter()
            .map(|(message, created_at)| PendingNotice {
                recipient,
                message,
                created_at,
            })
            .collect())
    }

    async fn commit_theft(&self, theft: &TheftCommit) -> Result<TheftCommitOutcome, DbError> {
        let record = &theft.record;
        let mut tx = self.pg().begin().await?;

        let deleted = sqlx::query("DELETE FROM crops WHERE id = $1")
            .bind(theft.crop_id.into_inner())
            .execute(&mut *tx)
            .await?;
        if deleted.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(TheftCommitOutcome::CropGone);
        }

        sqlx::query(
            r"INSERT INTO steal_records (id, thief_id, victim_id, crop_type, amount, stolen_at)
              VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(record.id.into_inner())
        .bind(record.thief_id.into_inner())
        .bind(record.victim_id.into_inner())
        .bind(&record.crop_type)
        .bind(to_i32(record.amount, "amount")?)
        .bind(record.timestamp)
        .execute(&mut *tx)
        .await?;

        let amount = u64::from(record.amount);
        add_stat_with(&mut *tx, record.thief_id, StatisticKind::TotalSteal, amount).await?;
        add_stat_with(&mut *tx, record.victim_id, StatisticKind::TotalStolen, amount).await?;

        let marked = sqlx::query(
            r"INSERT INTO enemies (victim_id, thief_id, marked_at) VALUES ($1, $2, $3)
              ON CONFLICT (victim_id, thief_id) DO NOTHING",
        )
        .bind(record.victim_id.into_inner())
        .bind(record.thief_id.into_inner())
        .bind(record.timestamp)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::debug!(
            thief = %record.thief_id,
            victim = %record.victim_id,
            amount = record.amount,
            "Committed theft"
        );
        Ok(TheftCommitOutcome::Committed {
            newly_marked_enemy: marked.rows_affected() > 0,
        })
    }
}

async fn add_stat_with<'e, E>(
    executor: E,
    player: PlayerId,
    kind: StatisticKind,
    amount: u64,
) -> Result<(), DbError>
where
    E: sqlx::PgExecutor<'e>,
{
    sqlx::query(
        r"INSERT INTO player_stats (player_id, stat, value) VALUES ($1, $2, $3)
          ON CONFLICT (player_id, stat) DO UPDATE SET value = player_stats.value + EXCLUDED.value",
    )
    .bind(player.into_inner())
    .bind(kind.as_str())
    .bind(to_i64(amount))
    .execute(executor)
    .await?;
    Ok(())
}
