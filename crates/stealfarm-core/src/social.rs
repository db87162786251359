//! Friendships and enemy marks.
//!
//! Friendship is mutual and gates watering. Enemy marks are one-directional
//! and are written by the steal economy; this service only reads and clears
//! them.

use stealfarm_types::{EnemyRecord, PlayerId};
use tracing::info;

use crate::context::FarmContext;
use crate::error::FarmError;

/// Friend list and enemy list access.
#[derive(Debug, Clone)]
pub struct SocialService {
    ctx: FarmContext,
}

impl SocialService {
    /// Create the service.
    pub const fn new(ctx: FarmContext) -> Self {
        Self { ctx }
    }

    /// Make `a` and `b` friends.
    pub async fn add_friend(&self, a: PlayerId, b: PlayerId) -> Result<(), FarmError> {
        if a == b {
            return Err(FarmError::SelfFriendship(a));
        }
        self.ctx.store.add_friend(a, b).await?;
        info!(a = %a, b = %b, "Friendship added");
        Ok(())
    }

    /// Dissolve a friendship. Returns `false` if there was none.
    pub async fn remove_friend(&self, a: PlayerId, b: PlayerId) -> Result<bool, FarmError> {
        let removed = self.ctx.store.remove_friend(a, b).await?;
        if removed {
            info!(a = %a, b = %b, "Friendship removed");
        }
        Ok(removed)
    }

    /// `true` if the two players are friends.
    pub async fn is_friend(&self, a: PlayerId, b: PlayerId) -> Result<bool, FarmError> {
        Ok(self.ctx.store.are_friends(a, b).await?)
    }

    /// Everyone who has stolen from `victim`.
    pub async fn enemies_of(&self, victim: PlayerId) -> Result<Vec<EnemyRecord>, FarmError> {
        Ok(self.ctx.store.enemies_of(victim).await?)
    }

    /// Administrative removal of an enemy mark.
    pub async fn remove_enemy(&self, victim: PlayerId, thief: PlayerId) -> Result<bool, FarmError> {
        let removed = self.ctx.store.remove_enemy(victim, thief).await?;
        if removed {
            info!(victim = %victim, thief = %thief, "Enemy mark cleared");
        }
        Ok(removed)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use stealfarm_db::FarmStore;

    use super::*;
    use crate::context::testing::harness;

    #[tokio::test]
    async fn friendship_is_mutual() {
        let h = harness();
        let social = SocialService::new(h.ctx.clone());
        let (a, b) = (PlayerId::new(), PlayerId::new());

        social.add_friend(a, b).await.unwrap();
        assert!(social.is_friend(b, a).await.unwrap());
        assert!(social.remove_friend(b, a).await.unwrap());
        assert!(!social.is_friend(a, b).await.unwrap());
        assert!(!social.remove_friend(a, b).await.unwrap());
        assert!(matches!(
            social.add_friend(a, a).await,
            Err(FarmError::SelfFriendship(_))
        ));
    }

    #[tokio::test]
    async fn enemy_marks_are_listed_and_cleared() {
        let h = harness();
        let social = SocialService::new(h.ctx.clone());
        let (victim, thief) = (PlayerId::new(), PlayerId::new());
        h.store.mark_enemy(victim, thief, 10).await.unwrap();

        let enemies = social.enemies_of(victim).await.unwrap();
        assert_eq!(enemies.len(), 1);
        assert!(social.enemies_of(thief).await.unwrap().is_empty());

        assert!(social.remove_enemy(victim, thief).await.unwrap());
        assert!(social.enemies_of(victim).await.unwrap().is_empty());
    }
}
