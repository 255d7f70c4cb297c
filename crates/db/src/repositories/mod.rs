//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod group_repo;
pub mod participant_repo;
pub mod user_repo;

pub use group_repo::GroupRepo;
pub use participant_repo::ParticipantRepo;
pub use user_repo::UserRepo;
