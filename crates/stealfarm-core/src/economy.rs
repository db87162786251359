//! Currency and item collaborators.
//!
//! The farm core never owns a ledger or a player inventory. It checks and
//! moves balances through [`Economy`] and hands harvested items to
//! [`Inventory`]. In-memory implementations back tests and the default
//! engine wiring; [`TracingInventory`] logs deliveries without keeping them.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use rust_decimal::Decimal;
use stealfarm_types::PlayerId;
use tokio::sync::RwLock;
use tracing::info;

/// Errors reported by an [`Economy`] backend.
#[derive(Debug, thiserror::Error)]
pub enum EconomyError {
    /// Amounts must be positive.
    #[error("invalid amount: {0}")]
    InvalidAmount(Decimal),

    /// A balance would leave the representable range.
    #[error("balance overflow for player {0}")]
    Overflow(PlayerId),

    /// The backing ledger could not be reached.
    #[error("economy unavailable: {0}")]
    Unavailable(String),
}

/// Balance check, debit and credit contract.
#[async_trait]
pub trait Economy: Send + Sync {
    /// Current balance. Zero for unknown players.
    async fn balance(&self, player: PlayerId) -> Result<Decimal, EconomyError>;

    /// Debit `amount`. Returns `false` and changes nothing when the balance
    /// is insufficient.
    async fn withdraw(&self, player: PlayerId, amount: Decimal) -> Result<bool, EconomyError>;

    /// Credit `amount`.
    async fn deposit(&self, player: PlayerId, amount: Decimal) -> Result<(), EconomyError>;
}

/// Balances held in a map.
#[derive(Debug, Default)]
pub struct MemoryEconomy {
    balances: RwLock<HashMap<PlayerId, Decimal>>,
}

impl MemoryEconomy {
    /// Create a ledger where everyone starts at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite a balance.
    pub async fn set_balance(&self, player: PlayerId, amount: Decimal) {
        self.balances.write().await.insert(player, amount);
    }
}

#[async_trait]
impl Economy for MemoryEconomy {
    async fn balance(&self, player: PlayerId) -> Result<Decimal, EconomyError> {
        Ok(self
            .balances
            .read()
            .await
            .get(&player)
            .copied()
            .unwrap_or(Decimal::ZERO))
    }

    async fn withdraw(&self, player: PlayerId, amount: Decimal) -> Result<bool, EconomyError> {
        if amount.is_sign_negative() {
            return Err(EconomyError::InvalidAmount(amount));
        }
        let mut balances = self.balances.write().await;
        let current = balances.get(&player).copied().unwrap_or(Decimal::ZERO);
        if current < amount {
            return Ok(false);
        }
        let next = current
            .checked_sub(amount)
            .ok_or(EconomyError::Overflow(player))?;
        balances.insert(player, next);
        Ok(true)
    }

    async fn deposit(&self, player: PlayerId, amount: Decimal) -> Result<(), EconomyError> {
        if amount.is_sign_negative() {
            return Err(EconomyError::InvalidAmount(amount));
        }
        let mut balances = self.balances.write().await;
        let current = balances.get(&player).copied().unwrap_or(Decimal::ZERO);
        let next = current
            .checked_add(amount)
            .ok_or(EconomyError::Overflow(player))?;
        balances.insert(player, next);
        Ok(())
    }
}

/// Receives harvested and stolen items.
///
/// Delivery cannot fail from the core's point of view. Overflowing a full
/// inventory is the collaborator's concern.
pub trait Inventory: Send + Sync {
    /// Give `amount` of `item` to `player`.
    fn deliver(&self, player: PlayerId, item: &str, amount: u32);
}

/// Writes every delivery as one structured log line and keeps nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingInventory;

impl Inventory for TracingInventory {
    fn deliver(&self, player: PlayerId, item: &str, amount: u32) {
        info!(player = %player, item, amount, "Items delivered");
    }
}

/// One recorded delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    /// Recipient.
    pub player: PlayerId,
    /// Item identifier.
    pub item: String,
    /// Quantity.
    pub amount: u32,
}

/// Keeps every delivery in memory.
#[derive(Debug, Default)]
pub struct RecordingInventory {
    deliveries: Mutex<Vec<Delivery>>,
}

impl RecordingInventory {
    /// Create an empty inventory log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything delivered so far, in order.
    pub fn deliveries(&self) -> Vec<Delivery> {
        let Ok(deliveries) = self.deliveries.lock() else {
            return Vec::new();
        };
        deliveries.clone()
    }

    /// Total quantity of `item` delivered to `player`.
    pub fn total(&self, player: PlayerId, item: &str) -> u64 {
        self.deliveries()
            .iter()
            .filter(|d| d.player == player && d.item == item)
            .fold(0_u64, |acc, d| acc.saturating_add(u64::from(d.amount)))
    }
}

impl Inventory for RecordingInventory {
    fn deliver(&self, player: PlayerId, item: &str, amount: u32) {
        if let Ok(mut deliveries) = self.deliveries.lock() {
            deliveries.push(Delivery {
                player,
                item: item.to_owned(),
                amount,
            });
        }
    }
}
