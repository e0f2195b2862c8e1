use crate::game::{Admission, Channel, ParticipantId, SessionCoordinator, SessionError};
use rand::Rng;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

/// Characters used in generated game ids (no 0/o, 1/l/i)
const GAME_ID_ALPHABET: &[u8] = b"abcdefghjkmnpqrstuvwxyz23456789";
const GAME_ID_LEN: usize = 6;

/// Registry mapping game id to its live session.
///
/// Sessions are created on first join and dropped when the last
/// participant leaves. Join and leave both hold the write lock across the
/// coordinator call, so a session can't be discarded while someone is
/// being seated in it.
pub struct SessionRegistry<C> {
    sessions: Arc<RwLock<HashMap<String, Arc<SessionCoordinator<C>>>>>,
}

impl<C> Clone for SessionRegistry<C> {
    fn clone(&self) -> Self {
        Self {
            sessions: self.sessions.clone(),
        }
    }
}

impl<C: Channel> SessionRegistry<C> {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Admit `channel` into the session for `game_id`, creating it if needed
    pub async fn join(
        &self,
        game_id: &str,
        channel: C,
    ) -> Result<(Arc<SessionCoordinator<C>>, Admission), SessionError> {
        let mut sessions = self.sessions.write().await;
        let coordinator = sessions
            .entry(game_id.to_string())
            .or_insert_with(|| {
                info!(game_id, "session created");
                Arc::new(SessionCoordinator::new())
            })
            .clone();

        match coordinator.admit(channel).await {
            Ok(admission) => Ok((coordinator, admission)),
            Err(error) => {
                // Don't leave behind a session that was only created for this attempt
                if coordinator.is_empty().await {
                    sessions.remove(game_id);
                }
                Err(error)
            }
        }
    }

    /// Disconnect a participant and discard the session once it's empty
    pub async fn leave(&self, game_id: &str, participant_id: &ParticipantId) {
        let mut sessions = self.sessions.write().await;
        let Some(coordinator) = sessions.get(game_id).cloned() else {
            return;
        };

        coordinator.disconnect(participant_id).await;
        if coordinator.is_empty().await {
            sessions.remove(game_id);
            info!(game_id, "session discarded");
        }
    }

    /// Get the live session for a game id
    pub async fn get(&self, game_id: &str) -> Option<Arc<SessionCoordinator<C>>> {
        self.sessions.read().await.get(game_id).cloned()
    }

    /// Get all live game ids
    pub async fn game_ids(&self) -> Vec<String> {
        self.sessions.read().await.keys().cloned().collect()
    }

    /// Get the number of live sessions
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

impl<C: Channel> Default for SessionRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}

/// Generate a short, human-shareable game id
pub fn generate_game_id() -> String {
    let mut rng = rand::thread_rng();
    (0..GAME_ID_LEN)
        .map(|_| GAME_ID_ALPHABET[rng.gen_range(0..GAME_ID_ALPHABET.len())] as char)
        .collect()
}
