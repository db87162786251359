//! Plot allocation, crop services, and the steal economy for Stealfarm.
//!
//! Every service is an explicit object built from a shared
//! [`FarmContext`]. There is no process-wide state: a test builds a fresh
//! context over in-memory collaborators and gets isolated services.
//!
//! # Modules
//!
//! - [`allocator`] -- Spiral plot allocation, expansion, reset and lookup.
//! - [`clock`] -- [`Clock`] trait with system and manual clocks.
//! - [`config`] -- Configuration loading from `stealfarm-config.yaml` into
//!   strongly-typed structs.
//! - [`context`] -- [`FarmContext`], the handles every service shares.
//! - [`crops`] -- Planting, harvesting, fertilizer and watering.
//! - [`economy`] -- [`Economy`] and [`Inventory`] collaborator contracts.
//! - [`error`] -- [`FarmError`] and its [`ErrorKind`] taxonomy.
//! - [`events`] -- [`EventSink`] trait and the tracing, broadcast and
//!   recording sinks.
//! - [`levels`] -- Farm levels and paid upgrades.
//! - [`locks`] -- Per-key async locks.
//! - [`presence`] -- Online players, for notice delivery.
//! - [`services`] -- [`FarmServices`], every service wired over one context.
//! - [`social`] -- Friendships and enemy marks.
//! - [`steal`] -- The steal economy: ceilings, cooldowns, traps, theft.
//! - [`traps`] -- Trap deployment into level-bound slots.
//!
//! [`Clock`]: clock::Clock
//! [`Economy`]: economy::Economy
//! [`Inventory`]: economy::Inventory
//! [`EventSink`]: events::EventSink
//! [`ErrorKind`]: error::ErrorKind

pub mod allocator;
pub mod clock;
pub mod config;
pub mod context;
pub mod crops;
pub mod economy;
pub mod error;
pub mod events;
pub mod levels;
pub mod locks;
pub mod presence;
pub mod services;
pub mod social;
pub mod steal;
pub mod traps;

pub use allocator::PlotAllocator;
pub use config::{ConfigError, FarmConfig};
pub use context::FarmContext;
pub use crops::{CropService, CropStatus, Harvest};
pub use error::{ErrorKind, FarmError};
pub use levels::LevelService;
pub use presence::Presence;
pub use services::FarmServices;
pub use social::SocialService;
pub use steal::{Actor, StealEconomy, StealOutcome, TrapHit, compute_steal_limit};
pub use traps::TrapService;
