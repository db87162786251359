//! Configuration loading and typed config structures for the farm core.
//!
//! The canonical configuration lives in `stealfarm-config.yaml` at the
//! project root. Keys are kebab-case. Every field has a default, so an
//! empty document yields a playable farm with a small built-in catalog.

use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;
use stealfarm_db::{StoreBackend, StoreSettings};
use stealfarm_types::{
    CropDefinition, CropStage, FarmLevelDefinition, TrapDefinition, TrapPenalty,
};

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// The document parsed but describes an unusable farm.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level farm configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FarmConfig {
    /// Plot allocation geometry.
    #[serde(default)]
    pub plot: PlotConfig,

    /// Steal economy tuning.
    #[serde(default)]
    pub steal: StealConfig,

    /// Growth acceleration amounts.
    #[serde(default)]
    pub growth: GrowthConfig,

    /// Persistence backend selection.
    #[serde(default)]
    pub store: StoreSettings,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Crop type catalog.
    #[serde(default = "default_crops")]
    pub crops: Vec<CropDefinition>,

    /// Trap type catalog.
    #[serde(default = "default_traps")]
    pub traps: Vec<TrapDefinition>,

    /// Farm level table.
    #[serde(default = "default_levels")]
    pub levels: Vec<FarmLevelDefinition>,
}

impl Default for FarmConfig {
    fn default() -> Self {
        Self {
            plot: PlotConfig::default(),
            steal: StealConfig::default(),
            growth: GrowthConfig::default(),
            store: StoreSettings::default(),
            logging: LoggingConfig::default(),
            crops: default_crops(),
            traps: default_traps(),
            levels: default_levels(),
        }
    }
}

impl FarmConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values for the store:
    /// - `DATABASE_URL` overrides `store.postgres-url`
    /// - `STEALFARM_STORE` overrides `store.backend`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if validation fails.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if validation fails.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides to the store section.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if `STEALFARM_STORE` names an
    /// unknown backend.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(val) = std::env::var("DATABASE_URL") {
            self.store.postgres_url = Some(val);
        }
        if let Ok(val) = std::env::var("STEALFARM_STORE") {
            self.store.backend = val.parse::<StoreBackend>().map_err(|e| ConfigError::Invalid {
                reason: e.to_string(),
            })?;
        }
        Ok(())
    }

    /// Reject configurations the services cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: &str| {
            Err(ConfigError::Invalid {
                reason: reason.to_owned(),
            })
        };

        if self.plot.initial_plot_size < 0 {
            return invalid("plot.initial-plot-size must not be negative");
        }
        if self.levels.iter().any(|l| l.plot_size_increase < 0) {
            return invalid("levels: plot-size-increase must not be negative");
        }
        // A fully upgraded plot must stay clear of the plot in the next cell.
        let largest = self
            .levels
            .iter()
            .try_fold(self.plot.initial_plot_size, |size, l| {
                size.checked_add(l.plot_size_increase)
            })
            .unwrap_or(i32::MAX);
        let min_spacing = largest.checked_mul(2).unwrap_or(i32::MAX);
        if self.plot.grid_spacing <= min_spacing {
            return invalid(
                "plot.grid-spacing must exceed twice the fully upgraded plot half-width",
            );
        }
        if self.plot.max_probe == 0 {
            return invalid("plot.max-probe must be at least 1");
        }
        let unit = Decimal::ZERO..=Decimal::ONE;
        if !unit.contains(&self.steal.base_steal_ratio) {
            return invalid("steal.base-steal-ratio must be within [0, 1]");
        }
        if !unit.contains(&self.steal.enemy_bonus_ratio) {
            return invalid("steal.enemy-bonus-ratio must be within [0, 1]");
        }
        if self.steal.steal_cooldown_duration_ms < 0 {
            return invalid("steal.steal-cooldown-duration-ms must not be negative");
        }
        if self.growth.fertilizer_acceleration_ms < 0
            || self.growth.water_acceleration_ms < 0
            || self.growth.water_cooldown_ms < 0
        {
            return invalid("growth durations must not be negative");
        }
        if self.crops.is_empty() {
            return invalid("at least one crop type must be configured");
        }
        Ok(())
    }
}

/// Plot allocation geometry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PlotConfig {
    /// World all plots are allocated in.
    #[serde(default = "default_world_id")]
    pub world_id: String,

    /// World blocks between adjacent grid cell centers.
    #[serde(default = "default_grid_spacing")]
    pub grid_spacing: i32,

    /// Half-width of new and reset plots.
    #[serde(default = "default_initial_plot_size")]
    pub initial_plot_size: i32,

    /// Spiral cells examined before allocation gives up.
    #[serde(default = "default_max_probe")]
    pub max_probe: usize,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            world_id: default_world_id(),
            grid_spacing: default_grid_spacing(),
            initial_plot_size: default_initial_plot_size(),
            max_probe: default_max_probe(),
        }
    }
}

/// Steal economy tuning.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct StealConfig {
    /// Share of a victim's mature crops a thief may take per period.
    #[serde(default = "default_base_steal_ratio")]
    pub base_steal_ratio: Decimal,

    /// Added to the ratio when the thief is already the victim's enemy.
    #[serde(default = "default_enemy_bonus_ratio")]
    pub enemy_bonus_ratio: Decimal,

    /// Cooldown started once a thief reaches the limit.
    #[serde(default = "default_steal_cooldown_duration_ms")]
    pub steal_cooldown_duration_ms: i64,

    /// Upper bound on steal record queries.
    #[serde(default = "default_max_records_per_query")]
    pub max_records_per_query: u32,

    /// Seed for yields and trap rolls. Random when absent.
    #[serde(default)]
    pub rng_seed: Option<u64>,
}

impl Default for StealConfig {
    fn default() -> Self {
        Self {
            base_steal_ratio: default_base_steal_ratio(),
            enemy_bonus_ratio: default_enemy_bonus_ratio(),
            steal_cooldown_duration_ms: default_steal_cooldown_duration_ms(),
            max_records_per_query: default_max_records_per_query(),
            rng_seed: None,
        }
    }
}

/// Growth acceleration amounts.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct GrowthConfig {
    /// Milliseconds one fertilizer application skips.
    #[serde(default = "default_fertilizer_acceleration_ms")]
    pub fertilizer_acceleration_ms: i64,

    /// Milliseconds one watering by a friend skips.
    #[serde(default = "default_water_acceleration_ms")]
    pub water_acceleration_ms: i64,

    /// Wait before the same friend may water the same owner again.
    #[serde(default = "default_water_cooldown_ms")]
    pub water_cooldown_ms: i64,
}

impl Default for GrowthConfig {
    fn default() -> Self {
        Self {
            fertilizer_acceleration_ms: default_fertilizer_acceleration_ms(),
            water_acceleration_ms: default_water_acceleration_ms(),
            water_cooldown_ms: default_water_cooldown_ms(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

fn default_world_id() -> String {
    "farm_world".to_owned()
}

const fn default_grid_spacing() -> i32 {
    64
}

const fn default_initial_plot_size() -> i32 {
    16
}

const fn default_max_probe() -> usize {
    4096
}

fn default_base_steal_ratio() -> Decimal {
    Decimal::new(3, 1)
}

fn default_enemy_bonus_ratio() -> Decimal {
    Decimal::new(1, 1)
}

const fn default_steal_cooldown_duration_ms() -> i64 {
    14_400_000
}

const fn default_max_records_per_query() -> u32 {
    50
}

const fn default_fertilizer_acceleration_ms() -> i64 {
    60_000
}

const fn default_water_acceleration_ms() -> i64 {
    120_000
}

const fn default_water_cooldown_ms() -> i64 {
    3_600_000
}

fn default_log_level() -> String {
    "info".to_owned()
}

fn stages(durations: &[i64], markers: &[&str]) -> Vec<CropStage> {
    durations
        .iter()
        .zip(markers)
        .zip(0_u32..)
        .map(|((duration_ms, marker), index)| CropStage {
            index,
            duration_ms: *duration_ms,
            marker: (*marker).to_owned(),
        })
        .collect()
}

fn default_crops() -> Vec<CropDefinition> {
    vec![
        CropDefinition {
            id: "wheat".to_owned(),
            name: "Wheat".to_owned(),
            stages: stages(&[60_000, 60_000, 60_000], &["sprout", "growing", "ripe"]),
            harvest_min: 1,
            harvest_max: 3,
            seed_item: "WHEAT_SEEDS".to_owned(),
            harvest_item: "WHEAT".to_owned(),
        },
        CropDefinition {
            id: "carrot".to_owned(),
            name: "Carrot".to_owned(),
            stages: stages(
                &[90_000, 90_000, 90_000, 90_000],
                &["sprout", "leaves", "root", "ripe"],
            ),
            harvest_min: 2,
            harvest_max: 4,
            seed_item: "CARROT".to_owned(),
            harvest_item: "CARROT".to_owned(),
        },
    ]
}

fn default_traps() -> Vec<TrapDefinition> {
    vec![
        TrapDefinition {
            id: "sticky_web".to_owned(),
            name: "Sticky Web".to_owned(),
            penalty: TrapPenalty::Slowness,
            trigger_chance: Decimal::new(30, 2),
            deploy_cost: Decimal::new(100, 0),
            penalty_value: Decimal::new(5, 0),
        },
        TrapDefinition {
            id: "fine_sign".to_owned(),
            name: "Fine Sign".to_owned(),
            penalty: TrapPenalty::MoneyDeduction,
            trigger_chance: Decimal::new(20, 2),
            deploy_cost: Decimal::new(250, 0),
            penalty_value: Decimal::new(50, 0),
        },
        TrapDefinition {
            id: "catapult".to_owned(),
            name: "Catapult".to_owned(),
            penalty: TrapPenalty::ForceTeleport,
            trigger_chance: Decimal::new(10, 2),
            deploy_cost: Decimal::new(500, 0),
            penalty_value: Decimal::ZERO,
        },
    ]
}

fn default_levels() -> Vec<FarmLevelDefinition> {
    (1_u32..=5)
        .map(|level| {
            let step = i64::from(level.saturating_sub(1));
            FarmLevelDefinition {
                level,
                plot_size_increase: match level {
                    1 => 0,
                    5 => 3,
                    _ => 4,
                },
                trap_slots: level.saturating_sub(1),
                protection_level: level.saturating_sub(1),
                steal_ratio_reduction: Decimal::new(step.saturating_mul(5), 2),
                auto_harvest_unlocked: level >= 4,
                upgrade_cost: Decimal::new(step.saturating_mul(1000), 0),
            }
        })
        .collect()
}
