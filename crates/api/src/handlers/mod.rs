pub mod auth;
pub mod groups;
pub mod import;
pub mod participants;
