// Public API - what other modules can use
pub use cleanup_task::SweepConfig;
pub use errors::SessionError;
pub use handlers::{
    abandon_session, create_session, end_session, get_active_session, join_session,
    pause_session, process_input, resume_session, session_history,
};
pub use models::SessionModel;
pub use registry::SessionRegistry;
pub use repository::{InMemorySessionRepository, PostgresSessionRepository, SessionRepository};
pub use types::{SessionHistoryEntry, SessionSummary};

// Internal modules
mod cleanup_task;
mod errors;
mod handlers;
pub mod models;
mod registry;
pub mod repository;
pub mod types;
