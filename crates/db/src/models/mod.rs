//! Row models and DTOs, one module per table.

pub mod group;
pub mod participant;
pub mod user;
