pub mod channel;
pub mod coordinator;
pub mod error;
pub mod events;
pub mod state;

pub use channel::{Channel, ChannelClosed, Outgoing, QueueChannel};
pub use coordinator::{Admission, SessionCoordinator, SessionSnapshot};
pub use error::SessionError;
pub use events::{ClientMessage, ServerMessage};
pub use state::{Participant, ParticipantId, Phase, Role, Session, MAX_PARTICIPANTS};
