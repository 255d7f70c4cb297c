//! Domain types and pure logic for the group operations backend.
//!
//! Nothing in this crate talks to Postgres or HTTP. Persistence is reached
//! through the [`group_import::GroupImportStore`] trait, implemented by
//! `groupops-db`.

pub mod error;
pub mod group_import;
pub mod types;
