use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Seats in a session
pub const MAX_PARTICIPANTS: usize = 2;

/// Opaque per-connection identifier, unique within a session
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(String);

impl ParticipantId {
    /// Generate a fresh random id (16 hex chars)
    pub fn generate() -> Self {
        Self(format!("{:016x}", rand::random::<u64>()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ParticipantId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ParticipantId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which half of the reveal a participant's text fills
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Prompter,
    Responder,
}

/// Session lifecycle stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// No participants
    Waiting,
    /// One participant
    Ready,
    /// Two participants, reveal still pending
    Active,
    /// Both texts disclosed; terminal for this round
    Revealed,
}

impl Phase {
    /// Phase implied by the participant count alone
    pub fn for_count(count: usize) -> Self {
        match count {
            0 => Phase::Waiting,
            1 => Phase::Ready,
            _ => Phase::Active,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A connected party and its outbound handle
#[derive(Debug)]
pub struct Participant<C> {
    pub id: ParticipantId,
    pub role: Role,
    pub submission: Option<String>,
    pub channel: C,
}

/// Authoritative state of one session
#[derive(Debug)]
pub struct Session<C> {
    pub phase: Phase,
    pub participants: HashMap<ParticipantId, Participant<C>>,
}

impl<C> Session<C> {
    pub fn new() -> Self {
        Self {
            phase: Phase::Waiting,
            participants: HashMap::new(),
        }
    }

    pub fn is_full(&self) -> bool {
        self.participants.len() >= MAX_PARTICIPANTS
    }

    /// Role for the next admission: Prompter unless someone already holds it
    pub fn open_role(&self) -> Role {
        if self.holder_of(Role::Prompter).is_some() {
            Role::Responder
        } else {
            Role::Prompter
        }
    }

    pub fn holder_of(&self, role: Role) -> Option<&Participant<C>> {
        self.participants.values().find(|p| p.role == role)
    }

    /// Fresh id that doesn't collide with anyone currently seated
    pub fn fresh_id(&self) -> ParticipantId {
        loop {
            let id = ParticipantId::generate();
            if !self.participants.contains_key(&id) {
                return id;
            }
        }
    }

    /// Re-derive phase from the participant count; Revealed never moves
    pub fn recompute_phase(&mut self) {
        if self.phase != Phase::Revealed {
            self.phase = Phase::for_count(self.participants.len());
        }
    }

    /// Prompt and response paired by role, once both seats have submitted
    pub fn reveal_pair(&self) -> Option<(String, String)> {
        if self.participants.len() < MAX_PARTICIPANTS {
            return None;
        }
        let prompt = self.holder_of(Role::Prompter)?.submission.clone()?;
        let response = self.holder_of(Role::Responder)?.submission.clone()?;
        Some((prompt, response))
    }

    pub fn submitted_count(&self) -> usize {
        self.participants
            .values()
            .filter(|p| p.submission.is_some())
            .count()
    }
}

impl<C> Default for Session<C> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seat(session: &mut Session<()>, id: &str, role: Role, submission: Option<&str>) {
        session.participants.insert(
            ParticipantId::from(id),
            Participant {
                id: ParticipantId::from(id),
                role,
                submission: submission.map(str::to_string),
                channel: (),
            },
        );
        session.recompute_phase();
    }

    #[test]
    fn test_phase_follows_count() {
        let mut session: Session<()> = Session::new();
        assert_eq!(session.phase, Phase::Waiting);

        seat(&mut session, "a", Role::Prompter, None);
        assert_eq!(session.phase, Phase::Ready);

        seat(&mut session, "b", Role::Responder, None);
        assert_eq!(session.phase, Phase::Active);
        assert!(session.is_full());

        session.participants.remove(&ParticipantId::from("a"));
        session.recompute_phase();
        assert_eq!(session.phase, Phase::Ready);
    }

    #[test]
    fn test_revealed_is_sticky() {
        let mut session: Session<()> = Session::new();
        seat(&mut session, "a", Role::Prompter, Some("p"));
        seat(&mut session, "b", Role::Responder, Some("r"));
        session.phase = Phase::Revealed;

        session.participants.clear();
        session.recompute_phase();
        assert_eq!(session.phase, Phase::Revealed);
    }

    #[test]
    fn test_open_role_fills_vacant_seat() {
        let mut session: Session<()> = Session::new();
        assert_eq!(session.open_role(), Role::Prompter);

        seat(&mut session, "b", Role::Responder, None);
        assert_eq!(session.open_role(), Role::Prompter);

        seat(&mut session, "a", Role::Prompter, None);
        assert_eq!(session.open_role(), Role::Responder);
    }

    #[test]
    fn test_reveal_pair_by_role() {
        let mut session: Session<()> = Session::new();
        seat(&mut session, "z", Role::Responder, Some("the answer"));
        assert_eq!(session.reveal_pair(), None);

        seat(&mut session, "a", Role::Prompter, None);
        assert_eq!(session.reveal_pair(), None);

        session
            .participants
            .get_mut(&ParticipantId::from("a"))
            .unwrap()
            .submission = Some("the question".to_string());
        assert_eq!(
            session.reveal_pair(),
            Some(("the question".to_string(), "the answer".to_string()))
        );
        assert_eq!(session.submitted_count(), 2);
    }

    #[test]
    fn test_generated_ids_are_hex() {
        let id = ParticipantId::generate();
        assert_eq!(id.as_str().len(), 16);
        assert!(id.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }
}
