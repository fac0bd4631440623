pub use models::PlayerProfile;
pub use repository::{InMemoryPlayerRepository, PostgresPlayerRepository};

mod models;
mod repository;
