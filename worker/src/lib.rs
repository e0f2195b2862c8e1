// Library interface for sharing the session core and wire protocol
// between the worker and client binaries

pub mod api;
pub mod config;
pub mod game;
pub mod registry;

// Re-export commonly used types for convenience
pub use config::ServerConfig;
pub use game::{ClientMessage, Phase, Role, ServerMessage, SessionCoordinator, SessionError};
pub use registry::SessionRegistry;
