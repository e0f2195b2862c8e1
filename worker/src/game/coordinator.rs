use super::channel::Channel;
use super::error::SessionError;
use super::events::{ClientMessage, ServerMessage};
use super::state::{Participant, ParticipantId, Phase, Role, Session};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Result of a successful admission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Admission {
    pub participant_id: ParticipantId,
    pub role: Role,
}

/// Read-only view of a session for status queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub phase: Phase,
    pub player_count: usize,
    pub submitted: usize,
}

/// Owns one session and serializes every mutation behind a single lock.
///
/// Outbound messages go through [`Channel::send`], which never blocks, so a
/// state change and the notifications it triggers happen under the same
/// lock acquisition.
pub struct SessionCoordinator<C> {
    session: Mutex<Session<C>>,
}

impl<C: Channel> SessionCoordinator<C> {
    pub fn new() -> Self {
        Self {
            session: Mutex::new(Session::new()),
        }
    }

    /// Seat a new participant on `channel`
    pub async fn admit(&self, channel: C) -> Result<Admission, SessionError> {
        let mut session = self.session.lock().await;
        if session.is_full() {
            return Err(SessionError::SessionFull);
        }

        let participant_id = session.fresh_id();
        let role = session.open_role();
        session.participants.insert(
            participant_id.clone(),
            Participant {
                id: participant_id.clone(),
                role,
                submission: None,
                channel,
            },
        );
        session.recompute_phase();

        let player_count = session.participants.len();
        let phase = session.phase;
        info!(participant_id = %participant_id, ?role, player_count, %phase, "participant admitted");

        if let Some(participant) = session.participants.get(&participant_id) {
            deliver(
                participant,
                &ServerMessage::Joined {
                    participant_id: participant_id.clone(),
                    role,
                    player_count,
                    phase,
                },
            );
        }
        broadcast_to(&session, &ServerMessage::State { player_count, phase });

        Ok(Admission {
            participant_id,
            role,
        })
    }

    /// Record a participant's text and reveal once both seats have submitted
    pub async fn submit(
        &self,
        participant_id: &ParticipantId,
        content: &str,
    ) -> Result<(), SessionError> {
        let mut session = self.session.lock().await;
        let phase = session.phase;

        let participant = session
            .participants
            .get_mut(participant_id)
            .ok_or(SessionError::UnknownParticipant)?;
        if phase != Phase::Active {
            return Err(SessionError::InvalidPhase(phase));
        }
        if content.trim().is_empty() {
            return Err(SessionError::EmptyContent);
        }
        if participant.submission.is_some() {
            return Err(SessionError::AlreadySubmitted);
        }

        participant.submission = Some(content.to_string());
        info!(participant_id = %participant_id, role = ?participant.role, "submission recorded");
        deliver(participant, &ServerMessage::Submitted);

        if let Some((prompt, response)) = session.reveal_pair() {
            session.phase = Phase::Revealed;
            info!("both submissions in, revealing");
            broadcast_to(&session, &ServerMessage::Reveal { prompt, response });
        }

        Ok(())
    }

    /// Remove a participant. Unknown ids are ignored.
    pub async fn disconnect(&self, participant_id: &ParticipantId) {
        let mut session = self.session.lock().await;
        let Some(participant) = session.participants.remove(participant_id) else {
            debug!(participant_id = %participant_id, "disconnect for unknown participant ignored");
            return;
        };
        participant.channel.close();
        session.recompute_phase();

        let player_count = session.participants.len();
        let phase = session.phase;
        info!(participant_id = %participant_id, role = ?participant.role, player_count, %phase, "participant left");

        broadcast_to(&session, &ServerMessage::State { player_count, phase });
    }

    /// Dispatch an inbound wire message, reporting rejections to the sender
    pub async fn handle_message(&self, participant_id: &ParticipantId, message: ClientMessage) {
        match message {
            ClientMessage::Join => {
                debug!(participant_id = %participant_id, "join received; already admitted on connect");
            }
            ClientMessage::Submit { content } => match self.submit(participant_id, &content).await {
                Ok(()) => {}
                Err(SessionError::UnknownParticipant) => {
                    debug!(participant_id = %participant_id, "submission from unknown participant dropped");
                }
                Err(error) => {
                    debug!(participant_id = %participant_id, %error, "submission rejected");
                    self.send_to(participant_id, &ServerMessage::error(error.to_string()))
                        .await;
                }
            },
        }
    }

    /// Send to every connected participant
    pub async fn broadcast(&self, message: &ServerMessage) {
        let session = self.session.lock().await;
        broadcast_to(&session, message);
    }

    /// Send to one participant, if still connected
    pub async fn send_to(&self, participant_id: &ParticipantId, message: &ServerMessage) {
        let session = self.session.lock().await;
        if let Some(participant) = session.participants.get(participant_id) {
            deliver(participant, message);
        }
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let session = self.session.lock().await;
        SessionSnapshot {
            phase: session.phase,
            player_count: session.participants.len(),
            submitted: session.submitted_count(),
        }
    }

    pub async fn phase(&self) -> Phase {
        self.session.lock().await.phase
    }

    pub async fn player_count(&self) -> usize {
        self.session.lock().await.participants.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.session.lock().await.participants.is_empty()
    }

    /// Stored submission of a connected participant
    pub async fn submission(&self, participant_id: &ParticipantId) -> Option<String> {
        let session = self.session.lock().await;
        session
            .participants
            .get(participant_id)
            .and_then(|p| p.submission.clone())
    }
}

impl<C: Channel> Default for SessionCoordinator<C> {
    fn default() -> Self {
        Self::new()
    }
}

fn deliver<C: Channel>(participant: &Participant<C>, message: &ServerMessage) {
    if let Err(error) = participant.channel.send(message) {
        debug!(participant_id = %participant.id, %error, "message not delivered");
    }
}

fn broadcast_to<C: Channel>(session: &Session<C>, message: &ServerMessage) {
    for participant in session.participants.values() {
        deliver(participant, message);
    }
}
